pub mod app_settings;
pub mod app_state;
pub mod live;
pub mod messages;
pub mod network;
