use parley_persist::PersistenceClient;
use std::sync::Arc;

use crate::config::Config;
use crate::service::ChatService;

/// Shared application state passed to all handlers
///
/// All resources are wrapped in Arc for sharing across async tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persist: Arc<dyn PersistenceClient>,
    pub chats: Arc<ChatService>,
}

impl AppState {
    pub fn new(config: Config, persist: Arc<dyn PersistenceClient>, chats: ChatService) -> Self {
        Self {
            config: Arc::new(config),
            persist,
            chats: Arc::new(chats),
        }
    }
}
