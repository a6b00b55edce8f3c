use thiserror::Error;

/// Errors surfaced while loading a score and selecting a track from it.
///
/// Nothing here is retried; the caller decides whether to fall back to another
/// file or track.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The source could not be opened or read.
    #[error("unable to read midi source: {0}")]
    Unreadable(#[from] std::io::Error),

    /// The bytes are not a well-formed midi file.
    #[error("malformed midi file: {0}")]
    Malformed(String),

    #[error("track index {index} out of range (file has {count} tracks)")]
    TrackIndexOutOfRange { index: usize, count: usize },
}
