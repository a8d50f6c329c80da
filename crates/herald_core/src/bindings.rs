//! Guest-side names the emitters are wired to

use serde::{Deserialize, Serialize};

/// Names of the guest globals the output layer reads or replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bindings {
    /// Global function used to render values as text.
    pub conversion_hook: String,
    /// Global holding the current script location, read by `error`.
    pub trace_global: String,
    /// Global namespace object whose `write` member is replaced.
    pub output_namespace: String,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            conversion_hook: "String".to_string(),
            trace_global: "__traceback".to_string(),
            output_namespace: "io".to_string(),
        }
    }
}
