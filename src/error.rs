use crate::message::AppId;
use std::path::PathBuf;
use thiserror::Error;

/// Why the hub dropped a single inbound message.
///
/// Rejections never escalate: they end processing of that one message and
/// leave every connection, including the sender's, as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("message does not have a valid envelope")]
    MalformedEnvelope,

    #[error("{kind} from a frame that never connected")]
    NotConnected { kind: String },

    #[error("chrome does not know the application in this frame")]
    UnknownApp,

    #[error("token missing or invalid")]
    BadToken,

    #[error("source and target are both {app_id}")]
    SelfAddressed { app_id: AppId },

    #[error("message incomplete for a PUBLISH command")]
    MalformedPublish,

    #[error("no frame to deliver to for target {target}")]
    UnresolvedTarget { target: String },
}

/// Failure to load a [`crate::config::HubConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid log filter {filter:?}: {reason}")]
    LogFilter { filter: String, reason: String },
}

/// The host loop has stopped and no longer accepts events.
#[cfg(feature = "tokio")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("hub host loop is closed")]
pub struct HostClosed;
