pub mod client;
pub mod locator;
pub mod parse;
pub mod runner;
