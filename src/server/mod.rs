// ABOUTME: Server module - the two-operation authorization-server collaborator.
// ABOUTME: Defines the trait, wire parsing, the reqwest client, and a scripted double.

mod http;
mod scripted;
mod traits;
mod types;

pub use http::*;
pub use scripted::*;
pub use traits::*;
pub use types::*;

#[cfg(test)]
mod types_test;
