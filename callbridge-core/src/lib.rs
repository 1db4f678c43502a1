// Callbridge core library
// Primitives for dual-mode (callback/future) operation adaptation:
// - Behavior manifests declaring a type's operations and nested capabilities
// - Capability trees introspected from those manifests
// - A single-settlement callback-to-future adapter

pub mod adapter;
pub mod behavior;
pub mod error;
pub mod tree;

pub use adapter::{adapt, AdaptCallback, Callback, CallbackOp, OneshotAdapter, OpFuture};
pub use behavior::{BehaviorDefinition, Member, MethodMode};
pub use error::{ErrorCode, OpError};
pub use tree::{accessor_name, build, build_named, CapabilityTree, MethodDescriptor};

use serde_json::Value;
use std::sync::Arc;

/// A live instance adhering to a [`BehaviorDefinition`].
///
/// Implementors own runtime state and expose their operations in callback
/// style only; the client layer supplies the future path. `call` must report
/// operation failures through the callback (or its `Err` return for
/// synchronous failures), never by panicking.
pub trait CallbackTarget: Send + Sync + std::fmt::Debug {
    /// The manifest this instance adheres to.
    fn definition(&self) -> &BehaviorDefinition;

    /// Dispatch one callback-style operation by name.
    fn call(&self, operation: &str, args: Vec<Value>, callback: Callback) -> Result<(), OpError>;

    /// The live sub-instance at a lower-cased accessor, if addressable.
    /// The default surface has no nested capabilities.
    fn object(&self, _accessor: &str) -> Option<Arc<dyn CallbackTarget>> {
        None
    }
}
