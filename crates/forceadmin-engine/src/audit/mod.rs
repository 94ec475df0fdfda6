pub mod log;
pub mod sink;
