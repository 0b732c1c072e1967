pub mod cli;
pub mod client;
pub mod config;
pub mod dialog;
pub mod issues;
pub mod model;
pub mod server;
pub mod store;
pub mod watch;
