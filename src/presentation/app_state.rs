// Application state for HTTP handlers
use crate::application::session_controller::SessionController;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
}
