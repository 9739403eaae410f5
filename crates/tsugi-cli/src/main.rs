use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "tsugi")]
#[command(about = "Tsugi - one catalog and one playable location from many scraper sources")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured sources and why any were excluded
    Sources,
    /// Search every active source and print the merged catalog
    Search {
        /// Title to search for
        query: String,
    },
    /// List episodes/chapters for a search result
    Units {
        /// Title to search for
        query: String,
        /// Which search result to list (0-based)
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
    /// Race the result's sources for a playable location
    Resolve {
        /// Title to search for
        query: String,
        /// Which search result to resolve (0-based)
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Which unit to resolve (0-based)
        #[arg(long, default_value_t = 0)]
        unit: usize,
        /// Restrict the race to these sources (default: all contributing)
        #[arg(long, value_delimiter = ',')]
        sources: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet)?;
    let output = output::Output::new(cli.output);

    match cli.command {
        Commands::Sources => commands::sources(&output).await,
        Commands::Search { query } => commands::search(&output, &query).await,
        Commands::Units { query, index } => commands::units(&output, &query, index).await,
        Commands::Resolve {
            query,
            index,
            unit,
            sources,
        } => commands::resolve(&output, &query, index, unit, &sources).await,
    }
}
