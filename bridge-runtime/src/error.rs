use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bridge runtime is not initialized; call `init` first")]
    NotInitialized,

    #[error("Failed to build the bridge runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure payload reported by the native side of the boundary.
///
/// The bridge routes this into the pending operation's failure arm without
/// interpreting it; `code` and `message` mean whatever the native library
/// says they mean.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("native operation failed with code {code}: {message}")]
pub struct NativeError {
    pub code: i32,
    pub message: String,
}
