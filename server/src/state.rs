//! Application state

use relayctl_core::{
    CommandHandler, HetznerClient, MessageSender, Result, ServerDirectory, TwilioWhatsApp,
};
use std::sync::Arc;

use crate::config::Config;

/// Shared application state
///
/// This struct implements Clone to allow it to be used as Axum state.
/// All fields are wrapped in Arc for efficient cloning.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub commands: Arc<CommandHandler<Arc<dyn ServerDirectory>>>,
    pub sender: Arc<dyn MessageSender>,
}

impl AppState {
    /// Create application state with the Hetzner and Twilio clients
    ///
    /// Fails if either client rejects its credentials.
    pub fn new(config: Config) -> Result<Self> {
        let directory = HetznerClient::new(config.hetzner_config())?;
        let sender = TwilioWhatsApp::new(config.twilio_config())?;

        Ok(Self::with_parts(config, Arc::new(directory), Arc::new(sender)))
    }

    /// Assemble state from already constructed collaborators
    pub fn with_parts(
        config: Config,
        directory: Arc<dyn ServerDirectory>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            commands: Arc::new(CommandHandler::new(directory)),
            sender,
        }
    }
}
