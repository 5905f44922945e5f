pub mod file_store;
pub mod memory;
pub mod secret;

pub use file_store::FileSessionStore;
pub use memory::MemorySessionStore;
pub use secret::{load_or_create_secret, random_secret, MIN_SECRET_LEN};
