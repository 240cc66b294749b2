// ABOUTME: Root module for ciba-guard - out-of-band approval gating for sensitive calls.
// ABOUTME: Re-exports all public types from submodules.

pub mod authorizer;
pub mod config;
pub mod credential;
pub mod error;
pub mod flow;
pub mod prelude;
pub mod server;
pub mod store;

pub use error::GuardError;
