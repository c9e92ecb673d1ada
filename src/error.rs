use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a single thumbnail generation.
///
/// Candidate assets that fail to decode are not errors; loaders signal them
/// with `None` and the selector moves on to the next name.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not create cache directory {path:?}: {source}")]
    CacheDir { path: PathBuf, source: io::Error },

    #[error("could not write thumbnail {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("could not encode thumbnail {path:?}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}
