use crate::config::AppConfig;
use crate::services::conversation::ConversationTracker;

pub struct AppState {
    pub config: AppConfig,
    pub tracker: ConversationTracker,
}
