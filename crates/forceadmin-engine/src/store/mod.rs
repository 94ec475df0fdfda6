pub mod atomic;
pub mod file;
pub mod memory;
