use std::sync::Arc;

use parley_agent::{ConversationRuntime, HttpConversationService, WorkspaceSource};
use parley_core::config::{AppConfig, ConfigError, LoadOptions};
use thiserror::Error;

use crate::app::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("conversation client could not be built: {0}")]
    Client(#[source] reqwest::Error),
}

/// Load configuration and wire the conversation runtime into handler state.
///
/// Runs before logging is initialized, so it reports through its return
/// value only.
pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;

    let service =
        HttpConversationService::new(&config.conversation).map_err(BootstrapError::Client)?;
    let runtime = ConversationRuntime::new(Arc::new(service), WorkspaceSource::default());

    Ok(Application { config, state: AppState::new(runtime) })
}
