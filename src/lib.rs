pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod process;
pub mod server;
pub mod state;
pub mod storage;

#[cfg(test)]
pub mod testing;
