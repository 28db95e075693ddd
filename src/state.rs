use crate::db::Database;
use crate::llm::kie::KieAiClient;
use crate::session::SessionCache;

/// Shared dependencies handed to every handler through the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionCache,
    pub kie: Option<KieAiClient>,
}

impl AppState {
    pub fn new(db: Option<Database>) -> Self {
        AppState {
            sessions: SessionCache::new(db),
            kie: KieAiClient::from_config(),
        }
    }
}
