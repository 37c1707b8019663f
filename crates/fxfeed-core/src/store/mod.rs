//! In-process implementation of the remote store port.

mod memory;
mod push_id;
pub mod tree;

pub use memory::InMemoryStore;
pub use push_id::PushIdGenerator;
