pub mod anthropic;
pub mod chat;
pub mod constants;
pub mod relay;
pub mod server;
pub mod session;
