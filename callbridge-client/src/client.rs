use crate::promisifier::PromisifyError;
use callbridge_core::{
    accessor_name, AdaptCallback, Callback, CallbackTarget, CapabilityTree, MethodDescriptor,
    MethodMode, OpError, OpFuture,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Dual-mode layer over one live instance.
///
/// Composition stands in for the in-place mutation a reflective host would
/// perform: the wrapped target keeps its callback-only surface, and this
/// layer adds the future path on top. Nested capabilities found live during
/// patching get their own child wrappers, reachable through
/// [`DualModeClient::object`].
#[derive(Debug)]
pub struct DualModeClient {
    name: String,
    target: Arc<dyn CallbackTarget>,
    adapter: Arc<dyn AdaptCallback>,
    methods: IndexMap<String, MethodDescriptor>,
    objects: IndexMap<String, DualModeClient>,
}

impl DualModeClient {
    pub(crate) fn patch(
        tree: &CapabilityTree,
        target: Arc<dyn CallbackTarget>,
        adapter: Arc<dyn AdaptCallback>,
    ) -> Self {
        match Self::patch_walk(tree, target, adapter, false) {
            Ok(client) => client,
            // The lenient walk never reports missing objects.
            Err(PromisifyError::MissingObject { name, .. }) => {
                unreachable!("lenient patch reported missing object `{}`", name)
            }
        }
    }

    pub(crate) fn patch_strict(
        tree: &CapabilityTree,
        target: Arc<dyn CallbackTarget>,
        adapter: Arc<dyn AdaptCallback>,
    ) -> Result<Self, PromisifyError> {
        Self::patch_walk(tree, target, adapter, true)
    }

    fn patch_walk(
        tree: &CapabilityTree,
        target: Arc<dyn CallbackTarget>,
        adapter: Arc<dyn AdaptCallback>,
        strict: bool,
    ) -> Result<Self, PromisifyError> {
        let mut objects = IndexMap::new();
        for (name, subtree) in &tree.objects {
            let accessor = accessor_name(name);
            match target.object(&accessor) {
                Some(sub) => {
                    let child = Self::patch_walk(subtree, sub, Arc::clone(&adapter), strict)?;
                    objects.insert(name.clone(), child);
                }
                None if strict => {
                    return Err(PromisifyError::MissingObject {
                        name: name.clone(),
                        accessor,
                    });
                }
                None => {
                    // Compatibility lenience; can mask wiring mistakes.
                    debug!(
                        capability = %name,
                        %accessor,
                        "live sub-instance absent; leaving subtree unpatched"
                    );
                }
            }
        }
        for (name, descriptor) in &tree.methods {
            match descriptor.mode {
                MethodMode::Callback => trace!(method = %name, "wrapping as dual-mode"),
                MethodMode::Direct => trace!(method = %name, "leaving untouched"),
            }
        }
        debug!(
            instance = %tree.name,
            methods = tree.methods.len(),
            objects = objects.len(),
            "patched instance"
        );
        Ok(DualModeClient {
            name: tree.name.clone(),
            target,
            adapter,
            methods: tree.methods.clone(),
            objects,
        })
    }

    /// Callback path: pure pass-through to the wrapped instance, identical
    /// forwarding for every name, discovered or not.
    pub fn invoke(
        &self,
        operation: &str,
        args: Vec<Value>,
        callback: Callback,
    ) -> Result<(), OpError> {
        self.target.call(operation, args, callback)
    }

    /// Future path: drive the named operation through the adapter and return
    /// the future settling with its callback's outcome.
    ///
    /// Only discovered callback-mode operations have a future path. Unknown
    /// names reject with `not_found`; operations tagged
    /// [`MethodMode::Direct`] reject with `bad_request` and stay reachable
    /// through [`DualModeClient::invoke`].
    pub fn call(&self, operation: &str, args: Vec<Value>) -> OpFuture {
        match self.methods.get(operation) {
            Some(descriptor) if descriptor.mode == MethodMode::Callback => {
                let target = Arc::clone(&self.target);
                let name = operation.to_string();
                self.adapter
                    .adapt(Box::new(move |callback| target.call(&name, args, callback)))
            }
            Some(_) => OpFuture::rejected(OpError::bad_request(format!(
                "operation `{}` is not callback-mode; use the callback path",
                operation
            ))),
            None => OpFuture::rejected(OpError::not_found(format!(
                "unknown operation `{}`",
                operation
            ))),
        }
    }

    /// Child wrapper for a nested capability, if its live sub-instance was
    /// present at patch time.
    pub fn object(&self, name: &str) -> Option<&DualModeClient> {
        self.objects.get(name)
    }

    /// Label inherited from the capability tree node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Discovered operations on this surface.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.values()
    }

    /// Names of nested capabilities patched live.
    pub fn objects(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }
}
