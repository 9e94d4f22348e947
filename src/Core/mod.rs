pub mod futex;
pub mod semaphore;
pub mod store;

pub use semaphore::Semaphore;
pub use store::{DirectoryStore, MemoryStore, PayloadStore};
