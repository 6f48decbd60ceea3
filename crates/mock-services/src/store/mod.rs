//! 存储模块

pub mod memory_store;

pub use memory_store::{IdSequence, MemoryStore};
