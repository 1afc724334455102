//! Document session state, navigation, discovery and the collaborators behind them

pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod file_system;
pub mod history;
pub mod links;
pub mod markdown;
pub mod ports;
pub mod recent;
pub mod remote;
pub mod scroll_sync;
pub mod search;
pub mod session;
pub mod tasks;

#[cfg(test)]
pub mod testing;
