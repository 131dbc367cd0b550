pub mod config;
pub mod debrid;
pub mod observability;
