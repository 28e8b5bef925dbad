use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building the inputs to a fill (reading files, parsing the grid structure,
/// loading the word list) or while writing out a grid image. Failing to find a fill is not an
/// error of this kind; see `FillFailure` in `backtracking_search.rs`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Can't read file “{}”: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Word list is empty")]
    EmptyWordList,

    #[error("Can't load font from “{}”", path.display())]
    InvalidFont { path: PathBuf },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
