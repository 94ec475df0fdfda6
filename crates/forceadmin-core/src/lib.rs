#![forbid(unsafe_code)]

pub mod address;
pub mod config;
pub mod errors;
pub mod events;
pub mod keys;
pub mod msg;
pub mod state;
pub mod traits;
