//! Storage implementations for the data access trait

pub mod in_memory;

pub use in_memory::InMemoryDataAccess;
