use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while installing the output functions into a guest context.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("guest binding '{name}' is unavailable")]
    BindingUnavailable { name: String },

    #[error("script engine error: {0}")]
    Engine(String),
}

impl From<rquickjs::Error> for InstallError {
    fn from(err: rquickjs::Error) -> Self {
        InstallError::Engine(err.to_string())
    }
}

/// Errors surfaced by [`ScriptRuntime`](crate::ScriptRuntime).
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("uncaught exception: {message}")]
    Exception { message: String },

    #[error("script engine error: {0}")]
    Engine(String),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error("output handle is busy")]
    HandleBusy,
}
