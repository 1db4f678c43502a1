// Callbridge client library
// The dual-mode layer: promisify a callback-style instance into a wrapper
// exposing both the original callback contract and a future path, with
// nested capabilities patched recursively.

pub mod client;
pub mod promisifier;

pub use client::DualModeClient;
pub use promisifier::{promisify, Promisifier, PromisifyError, TreeCache};

// Re-export the core surface consumers need to implement targets.
pub use callbridge_core::{
    adapt, AdaptCallback, BehaviorDefinition, Callback, CallbackOp, CallbackTarget, ErrorCode,
    Member, MethodMode, OneshotAdapter, OpError, OpFuture,
};
