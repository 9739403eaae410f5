//! The media race: one cancellable task per candidate source, first valid
//! artifact wins, losers get a best-effort abort signal.

use catalog_models::{ArtifactKind, MediaArtifact};
use catalog_sources::Source;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::RaceCause;

/// Per-task lifecycle. A task past its cancellable point is allowed to
/// finish; its result is discarded rather than preempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

pub(crate) struct RaceEntry {
    pub source_name: String,
    pub source: Arc<dyn Source>,
    pub locator: String,
}

pub(crate) enum RaceOutcome {
    Won {
        source: String,
        artifact: MediaArtifact,
    },
    AllFailed {
        causes: Vec<RaceCause>,
    },
    Cancelled,
}

/// Races `entries` against each other under one global deadline.
///
/// `causes` may arrive pre-populated with candidates that never made it to
/// the start line (no locator, unknown source); the race only appends.
/// A failing task is recorded and the race continues; the first task to
/// return a kind-valid artifact ends it and the rest are aborted.
pub(crate) async fn run_race(
    entries: Vec<RaceEntry>,
    mut causes: Vec<RaceCause>,
    timeout: Duration,
    cancel: CancellationToken,
) -> RaceOutcome {
    let mut tasks = FuturesUnordered::new();
    let mut abort_handles: Vec<(String, AbortHandle)> = Vec::with_capacity(entries.len());

    for entry in entries {
        let RaceEntry {
            source_name,
            source,
            locator,
        } = entry;
        debug!("Race task for '{}' starting", source_name);
        let name = source_name.clone();
        let handle =
            tokio::spawn(async move { source.resolve_media(&locator).await });
        abort_handles.push((source_name.clone(), handle.abort_handle()));
        tasks.push(async move { (name, handle.await) });
    }

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        if tasks.is_empty() {
            return RaceOutcome::AllFailed { causes };
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                abort_all(&abort_handles);
                debug!("Race cancelled by caller with {} tasks in flight", tasks.len());
                return RaceOutcome::Cancelled;
            }
            _ = &mut deadline => {
                abort_all(&abort_handles);
                let undecided = tasks_in_flight(&abort_handles, &causes);
                record_undecided(
                    &mut causes,
                    &undecided,
                    TaskState::TimedOut,
                    &format!("no result within {:?}", timeout),
                );
                return RaceOutcome::AllFailed { causes };
            }
            Some((name, joined)) = tasks.next() => {
                match joined {
                    Ok(Ok(mut artifact)) => match ArtifactKind::infer(&artifact.locator) {
                        Ok(kind) => {
                            artifact.kind = kind;
                            abort_all(&abort_handles);
                            debug!("Race won by '{}'", name);
                            return RaceOutcome::Won { source: name, artifact };
                        }
                        Err(e) => {
                            warn!("Source '{}' returned an invalid artifact: {}", name, e);
                            causes.push(RaceCause {
                                source: name,
                                state: TaskState::Failed,
                                message: e.to_string(),
                            });
                        }
                    },
                    Ok(Err(e)) => {
                        warn!("Source '{}' failed to resolve media: {}", name, e);
                        causes.push(RaceCause {
                            source: name,
                            state: TaskState::Failed,
                            message: e.to_string(),
                        });
                    }
                    Err(e) if e.is_cancelled() => {
                        causes.push(RaceCause {
                            source: name,
                            state: TaskState::Cancelled,
                            message: "cancelled".to_string(),
                        });
                    }
                    Err(e) => {
                        warn!("Race task for '{}' panicked: {}", name, e);
                        causes.push(RaceCause {
                            source: name,
                            state: TaskState::Failed,
                            message: format!("task panicked: {}", e),
                        });
                    }
                }
            }
        }
    }
}

fn abort_all(handles: &[(String, AbortHandle)]) {
    for (_, handle) in handles {
        handle.abort();
    }
}

/// Names of the tasks that never reached a recorded terminal state.
fn tasks_in_flight(
    handles: &[(String, AbortHandle)],
    causes: &[RaceCause],
) -> Vec<String> {
    handles
        .iter()
        .map(|(name, _)| name.clone())
        .filter(|name| !causes.iter().any(|c| &c.source == name))
        .collect()
}

fn record_undecided(
    causes: &mut Vec<RaceCause>,
    names: &[String],
    state: TaskState,
    message: &str,
) {
    for name in names {
        causes.push(RaceCause {
            source: name.clone(),
            state,
            message: message.to_string(),
        });
    }
}
