
pub mod engine;
pub mod memory;

pub use engine::PersonStore;
pub use memory::MemoryStore;
