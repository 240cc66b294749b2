// ABOUTME: Config module - server identity, protection parameters, and modes.
// ABOUTME: Both are immutable once an authorizer has been built from them.

mod authorization;
mod protection;

pub use authorization::*;
pub use protection::*;

#[cfg(test)]
mod protection_test;
