pub mod actions;
pub mod agent;
pub mod app;
pub mod audit;
pub mod config;
pub mod dispatch;
pub mod record;
pub mod runtime;
pub mod store;
pub mod watch;
