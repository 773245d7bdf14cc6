// Presentation layer - HTTP surface consumed by the dashboard renderer
pub mod app_state;
pub mod handlers;
