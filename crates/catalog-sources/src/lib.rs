pub mod consumet;
pub mod error;
pub mod mangadex;
pub mod mock;
pub mod registry;
pub mod traits;

pub use consumet::ConsumetSource;
pub use error::SourceError;
pub use mangadex::MangadexSource;
pub use mock::MockSource;
pub use registry::{
    LoadReport, RegistryError, RejectedSource, SourceDescriptor, SourceFactory, SourceRegistry,
};
pub use traits::Source;
