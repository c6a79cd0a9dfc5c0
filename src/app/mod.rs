pub mod adb;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod models;
pub mod prompt;
pub mod state;
pub mod store;
