// ABOUTME: Store module - durable key-value collaborator for non-blocking modes.
// ABOUTME: Defines the store contract, the persisted entry, and two backends.

mod file;
mod memory;
mod traits;

pub use file::*;
pub use memory::*;
pub use traits::*;
