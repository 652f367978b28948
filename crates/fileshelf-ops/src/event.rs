//! Notifications emitted by the engine.

use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::mpsc;

/// An operation lifecycle event.
///
/// The operation is identified by name (`"paste"`, `"undo_move"`, ...);
/// failures carry a human-readable message only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OperationEvent {
    /// Validation passed and the filesystem is about to change.
    Started {
        operation: String,
        paths: Vec<PathBuf>,
    },
    /// The operation finished for every item.
    Completed {
        operation: String,
        source_paths: Vec<PathBuf>,
        target_path: Option<PathBuf>,
    },
    /// The operation was rejected or some items failed.
    Failed {
        operation: String,
        paths: Vec<PathBuf>,
        message: String,
    },
}

impl OperationEvent {
    /// Name of the operation this event belongs to.
    pub fn operation(&self) -> &str {
        match self {
            Self::Started { operation, .. }
            | Self::Completed { operation, .. }
            | Self::Failed { operation, .. } => operation,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl std::fmt::Display for OperationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started { operation, paths } => {
                write!(f, "{} started ({} items)", operation, paths.len())
            }
            Self::Completed {
                operation,
                source_paths,
                target_path,
            } => {
                write!(f, "{} completed ({} items)", operation, source_paths.len())?;
                if let Some(target) = target_path {
                    write!(f, " -> {}", target.display())?;
                }
                Ok(())
            }
            Self::Failed {
                operation, message, ..
            } => write!(f, "{} failed: {}", operation, message),
        }
    }
}

/// Fans events out to every subscriber.
///
/// Sending never blocks and needs no runtime. Subscribers whose receiver
/// was dropped are pruned on the next emit.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<OperationEvent>>,
}

impl EventBus {
    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<OperationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver an event to all live subscribers.
    pub fn emit(&mut self, event: OperationEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn started(&mut self, operation: impl Into<String>, paths: &[PathBuf]) {
        self.emit(OperationEvent::Started {
            operation: operation.into(),
            paths: paths.to_vec(),
        });
    }

    pub fn completed(
        &mut self,
        operation: impl Into<String>,
        source_paths: &[PathBuf],
        target_path: Option<PathBuf>,
    ) {
        self.emit(OperationEvent::Completed {
            operation: operation.into(),
            source_paths: source_paths.to_vec(),
            target_path,
        });
    }

    pub fn failed(
        &mut self,
        operation: impl Into<String>,
        paths: &[PathBuf],
        message: impl Into<String>,
    ) {
        self.emit(OperationEvent::Failed {
            operation: operation.into(),
            paths: paths.to_vec(),
            message: message.into(),
        });
    }
}
