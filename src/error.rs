use std::path::PathBuf;

/// Fatal errors surfaced to the CLI boundary.
///
/// `PartialHashCollision` is intentionally absent here — it is a
/// control-flow signal internal to [`crate::duplicate`], recovered locally
/// by the scanner and never returned from [`crate::scanner::Scanner::scan`].
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("symlink encountered at {0}")]
    SymlinkEncountered(PathBuf),

    #[error("no root directory set")]
    NoRootDir,

    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(PathBuf),

    #[error("unexpected traversal entry kind at {0}")]
    UnexpectedEntryKind(PathBuf),

    #[error(transparent)]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
