pub mod app_state;
pub mod escalation;
pub mod handlers;
pub mod processors;
pub mod signals;
pub mod state;
pub mod utils;
