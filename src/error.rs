use std::fmt::Display;

// ====================
// PUBLIC STRUCTS
// ====================

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum MosaicError {
    #[error("unreadable source {id}: {reason}")]
    UnreadableSource { id: String, reason: String },

    #[error("no tiles are available to build a mosaic")]
    EmptyPalette,

    #[error("tile {id} is {width}x{height}, expected a non-empty square")]
    DimensionMismatch { id: String, width: u32, height: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("could not start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError)
}

impl MosaicError {
    pub(crate) fn unreadable(id: impl Display, reason: impl Display) -> Self {
        MosaicError::UnreadableSource { id: id.to_string(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, MosaicError>;
