use crate::client::DualModeClient;
use callbridge_core::{build, AdaptCallback, BehaviorDefinition, CallbackTarget, CapabilityTree, OneshotAdapter};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Failure raised by the strict patching path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromisifyError {
    /// A declared nested capability has no live sub-instance at its accessor.
    #[error("missing sub-instance for capability `{name}` at accessor `{accessor}`")]
    MissingObject { name: String, accessor: String },
}

/// Capability trees keyed by definition name, so each instance type is
/// introspected once per promisifier. Same-named definitions are assumed
/// structurally identical.
#[derive(Debug, Default)]
pub struct TreeCache {
    trees: DashMap<String, Arc<CapabilityTree>>,
}

impl TreeCache {
    pub fn new() -> Self {
        TreeCache {
            trees: DashMap::new(),
        }
    }

    pub fn get_or_build(&self, definition: &BehaviorDefinition) -> Arc<CapabilityTree> {
        if let Some(tree) = self.trees.get(definition.name()) {
            trace!(definition = %definition.name(), "capability tree cache hit");
            return Arc::clone(&*tree);
        }
        trace!(definition = %definition.name(), "capability tree cache miss");
        let tree = Arc::new(build(definition));
        self.trees
            .insert(definition.name().to_string(), Arc::clone(&tree));
        tree
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn clear(&self) {
        self.trees.clear();
    }
}

/// Turns callback-style instances into dual-mode wrappers.
///
/// Holds the adapter implementing the future path and a per-type tree cache.
/// Patching is synchronous and runs to completion before returning; the only
/// suspension a consumer ever sees is the future handed back on the
/// non-callback path.
#[derive(Debug)]
pub struct Promisifier {
    adapter: Arc<dyn AdaptCallback>,
    trees: TreeCache,
}

impl Promisifier {
    /// A promisifier using the default oneshot-backed adapter.
    pub fn new() -> Self {
        Self::with_adapter(Arc::new(OneshotAdapter))
    }

    /// A promisifier using a caller-supplied adapter.
    pub fn with_adapter(adapter: Arc<dyn AdaptCallback>) -> Self {
        Promisifier {
            adapter,
            trees: TreeCache::new(),
        }
    }

    /// Wrap `target` in a dual-mode layer, walking its capability tree and
    /// live sub-instances in tandem. A declared nested capability whose
    /// accessor is absent on the live instance is skipped silently; that
    /// subtree stays callback-only. Use [`Promisifier::promisify_strict`] to
    /// fail fast instead.
    pub fn promisify(&self, target: Arc<dyn CallbackTarget>) -> DualModeClient {
        let tree = self.trees.get_or_build(target.definition());
        DualModeClient::patch(&tree, target, Arc::clone(&self.adapter))
    }

    /// Like [`Promisifier::promisify`], but a declared nested capability with
    /// no live sub-instance is an error instead of a silent skip.
    pub fn promisify_strict(
        &self,
        target: Arc<dyn CallbackTarget>,
    ) -> Result<DualModeClient, PromisifyError> {
        let tree = self.trees.get_or_build(target.definition());
        DualModeClient::patch_strict(&tree, target, Arc::clone(&self.adapter))
    }

    /// Number of instance types introspected so far.
    pub fn cached_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Default for Promisifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap one instance with the default adapter. Convenience for consumers
/// without a long-lived [`Promisifier`]; no tree caching across calls.
pub fn promisify(target: Arc<dyn CallbackTarget>) -> DualModeClient {
    Promisifier::new().promisify(target)
}
