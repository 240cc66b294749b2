// ABOUTME: Authorizer module - the public entry point that guards operations.
// ABOUTME: protect() wires a context getter and an operation into the flow.

mod authorizer;
mod guarded;

pub use authorizer::*;
pub use guarded::*;
