pub mod core;
pub mod error;
pub mod inventory;
pub mod parse;
pub mod progress;
pub mod remote;
