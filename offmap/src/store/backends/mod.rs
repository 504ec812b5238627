//! Record backend implementations.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;
