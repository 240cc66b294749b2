// ABOUTME: Credential module - the approved token and its invocation-scoped carrier.
// ABOUTME: Only the guarded operation's own task chain can observe the credential.

mod context;

pub use context::*;
