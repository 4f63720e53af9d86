use crate::graph::NodeId;

/// Result alias that carries the custom [`StageError`] type.
pub type Result<T> = std::result::Result<T, StageError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Free-form message for failures that have no dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// Audio data could not be probed or decoded.
    #[error("failed to decode `{asset}`: {reason}")]
    Decode { asset: String, reason: String },
    #[error("asset `{0}` could not be found")]
    AssetNotFound(String),
    #[error("node {0:?} does not exist in the scene graph")]
    UnknownNode(NodeId),
    /// Attaching or detaching would break the tree shape of the graph.
    #[error("invalid hierarchy change: {0}")]
    InvalidHierarchy(&'static str),
    #[error("surface {width}x{height} at resolution {resolution} exceeds the maximum frame size")]
    SurfaceTooLarge {
        width: u32,
        height: u32,
        resolution: f32,
    },
    #[error("volume must be within [0, 1], got {0}")]
    InvalidVolume(f32),
    /// The audio backend refused to start playback.
    #[error("audio output error: {0}")]
    Audio(String),
}

impl StageError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn decode(asset: &str, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            asset: asset.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<&str> for StageError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for StageError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
