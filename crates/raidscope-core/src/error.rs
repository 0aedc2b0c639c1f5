use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Transport is shutting down")]
    TransportShutdown,

    #[error("Null pointer stored at address {address:#x}")]
    NullPointer { address: u64 },

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Read of {size} bytes at address {address:#x} is outside expected bounds")]
    ReadOutOfBounds { address: u64, size: usize },

    #[error("Pointer chain failed at hop {hop} (address {address:#x}): {source}")]
    ChainResolution {
        hop: usize,
        address: u64,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to reconstruct entity at {base:#x}: {source}")]
    Reconstruction {
        base: u64,
        #[source]
        source: Box<Error>,
    },

    #[error("Corrupt data at address {address:#x}: {message}")]
    Corrupt { address: u64, message: String },

    #[error("Unknown runtime class: {0}")]
    UnknownClass(String),

    #[error("Entity classification failed: {0}")]
    Classification(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Raid has ended")]
    RaidEnded,

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid memory map entry at line {line}: {message}")]
    InvalidMemoryMap { line: usize, message: String },

    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failure, so callers can branch on what
/// happened instead of matching individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The transport was intentionally detached.
    Shutdown,
    /// The object is legitimately absent right now.
    NotPresent,
    /// The read itself failed.
    Transport,
    /// Bytes were read but do not make sense.
    Corrupt,
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::TransportShutdown => FailureKind::Shutdown,
            Error::NullPointer { .. } | Error::ModuleNotFound(_) | Error::RaidEnded => {
                FailureKind::NotPresent
            }
            Error::ChainResolution { source, .. } | Error::Reconstruction { source, .. } => {
                source.kind()
            }
            Error::MemoryReadFailed { .. } | Error::Io(_) | Error::Watcher(_) => {
                FailureKind::Transport
            }
            Error::ReadOutOfBounds { .. }
            | Error::Corrupt { .. }
            | Error::UnknownClass(_)
            | Error::Classification(_)
            | Error::InvalidOffset(_)
            | Error::InvalidMemoryMap { .. }
            | Error::Json(_) => FailureKind::Corrupt,
        }
    }

    /// True when this error (or the error it wraps) is a transport shutdown.
    pub fn is_shutdown(&self) -> bool {
        self.kind() == FailureKind::Shutdown
    }

    pub fn is_not_present(&self) -> bool {
        self.kind() == FailureKind::NotPresent
    }

    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    pub(crate) fn corrupt(address: u64, message: impl Into<String>) -> Self {
        Error::Corrupt {
            address,
            message: message.into(),
        }
    }
}
