pub mod family_handlers;
pub mod watch_handlers;
