pub mod cli;
pub mod config;
pub mod messages;
pub mod publisher;
pub mod trex;
