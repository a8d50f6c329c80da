//! Herald Scripting Layer
//!
//! JavaScript execution via QuickJS with guest output routed through
//! `herald_core`.
//!
//! ## Architecture
//!
//! - **Runtime:** [`ScriptRuntime`] owns the QuickJS runtime and the shared output handle
//! - **Registrar:** [`io::install`] replaces `print`, `warn`, `error` and `io.write`
//! - **Arguments:** [`args::JsArgs`] renders values through the guest's own conversion hook

pub mod args;
pub mod error;
pub mod io;
pub mod runtime;

pub use error::{InstallError, ScriptError};
pub use io::{install, SharedHandle};
pub use runtime::{CapturedOutput, ScriptRuntime};

pub use rquickjs;
