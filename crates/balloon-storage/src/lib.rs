//! Store implementations for the balloon.
//!
//! - [`MemoryStore`]: ordered map behind a lock, for tests and ephemeral trees.
//! - [`SledStore`]: embedded on-disk engine.

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;
