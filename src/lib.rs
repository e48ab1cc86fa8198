pub mod client;
pub mod fetcher;
pub mod handlers;
pub mod notify;
pub mod registry;
pub mod session;
pub mod types;
