pub mod entity;
pub mod json_file_store;
pub mod mapper;
pub mod memory_store;

pub use json_file_store::JsonFileStore;
pub use memory_store::InMemoryStore;
