// ABOUTME: Flow module - the request lifecycle from initiation to outcome.
// ABOUTME: Initiator starts, poller resolves, resolver maps the outcome to a result.

mod initiator;
mod outcome;
mod poller;
mod request;

pub use initiator::*;
pub use outcome::*;
pub use poller::*;
pub use request::*;
