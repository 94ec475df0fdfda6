#![forbid(unsafe_code)]

pub mod audit;
pub mod executor;
pub mod genesis;
pub mod guard;
pub mod keeper;
pub mod registry;
pub mod store;
