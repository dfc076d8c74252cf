//! Resolution of the conversation workspace.
//!
//! The workspace id is looked up on every call rather than at start-up, so
//! an operator can fix a missing `WORKSPACE_ID` without restarting.

use std::env;

pub const WORKSPACE_ENV_VAR: &str = "WORKSPACE_ID";

/// Values left in sample `.env` files that mean "not configured".
pub const PLACEHOLDERS: [&str; 2] = ["<workspace-id>", "<workspace_id>"];

/// Returned in place of a service reply while no workspace is configured.
pub const CONFIGURATION_INSTRUCTIONS: &str = "The app has not been configured with a \
<b>WORKSPACE_ID</b> environment variable. Please refer to the \
<a href=\"https://github.com/watson-developer-cloud/conversation-simple\">README</a> \
documentation on how to set this variable. <br>Once a workspace has been defined the intents \
may be imported from \
<a href=\"https://github.com/watson-developer-cloud/conversation-simple/blob/master/training/car_workspace.json\">here</a> \
in order to get a working application.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkspaceSource {
    /// Read the named environment variable at call time.
    Env(String),
    Fixed(Option<String>),
}

impl Default for WorkspaceSource {
    fn default() -> Self {
        Self::Env(WORKSPACE_ENV_VAR.to_string())
    }
}

impl WorkspaceSource {
    pub fn fixed(workspace_id: impl Into<String>) -> Self {
        Self::Fixed(Some(workspace_id.into()))
    }

    pub fn unset() -> Self {
        Self::Fixed(None)
    }

    /// The usable workspace id, or `None` when it is unset, blank or a
    /// placeholder.
    pub fn resolve(&self) -> Option<String> {
        let raw = match self {
            Self::Env(var) => env::var(var).ok(),
            Self::Fixed(value) => value.clone(),
        };
        raw.map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty() && !is_placeholder(value))
    }
}

pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDERS.contains(&value.trim())
}
