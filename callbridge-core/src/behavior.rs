use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a declared operation expects to be driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodMode {
    /// Trailing-callback contract; eligible for dual-mode wrapping.
    #[default]
    Callback,
    /// Already synchronous or future-returning; left untouched by the patcher.
    Direct,
}

/// A declared member of a behavior surface.
#[derive(Debug, Clone)]
pub enum Member {
    /// A callback-style operation. Discovered only under a lowercase-leading name.
    Operation,
    /// A nested capability. Discovered only under an uppercase-leading name.
    Capability(BehaviorDefinition),
}

/// Declarative manifest of a type's behavior surface.
///
/// Enumerates the operations and nested capabilities a live instance exposes,
/// replacing the dynamic name inspection a reflective host would perform.
/// Identifier casing stays the discovery contract: operation names lead with a
/// lowercase letter, nested capability names with an uppercase one, and the
/// tree builder ignores members that break the convention.
///
/// Definitions are built once by the consumer and never mutated afterwards:
///
/// ```
/// use callbridge_core::{BehaviorDefinition, MethodMode};
///
/// let inner = BehaviorDefinition::new("Inner").operation("get");
/// let outer = BehaviorDefinition::new("Outer")
///     .operation("list")
///     .operation("stats")
///     .mode("stats", MethodMode::Direct)
///     .capability("Inner", inner);
/// assert_eq!(outer.name(), "Outer");
/// ```
#[derive(Debug, Clone)]
pub struct BehaviorDefinition {
    name: String,
    members: IndexMap<String, Member>,
    metadata: HashMap<String, MethodMode>,
}

impl BehaviorDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        BehaviorDefinition {
            name: name.into(),
            members: IndexMap::new(),
            metadata: HashMap::new(),
        }
    }

    /// Declare a callback-style operation. Redeclaring a name replaces the
    /// earlier member; keys stay unique per definition.
    pub fn operation(mut self, name: impl Into<String>) -> Self {
        self.members.insert(name.into(), Member::Operation);
        self
    }

    /// Declare a nested capability reachable from this surface.
    pub fn capability(mut self, name: impl Into<String>, definition: BehaviorDefinition) -> Self {
        self.members.insert(name.into(), Member::Capability(definition));
        self
    }

    /// Override the mode of a declared operation. Absent entries default to
    /// [`MethodMode::Callback`].
    pub fn mode(mut self, operation: impl Into<String>, mode: MethodMode) -> Self {
        self.metadata.insert(operation.into(), mode);
        self
    }

    /// The declared type name, used for tree labeling and cache keys.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(name, member)| (name.as_str(), member))
    }

    /// Mode of a declared operation, defaulting to callback.
    pub fn mode_of(&self, operation: &str) -> MethodMode {
        self.metadata.get(operation).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults_to_callback() {
        let def = BehaviorDefinition::new("Svc").operation("fetch");
        assert_eq!(def.mode_of("fetch"), MethodMode::Callback);
        assert_eq!(def.mode_of("unknown"), MethodMode::Callback);
    }

    #[test]
    fn test_mode_override() {
        let def = BehaviorDefinition::new("Svc")
            .operation("fetch")
            .mode("fetch", MethodMode::Direct);
        assert_eq!(def.mode_of("fetch"), MethodMode::Direct);
    }

    #[test]
    fn test_redeclaration_replaces_member() {
        let def = BehaviorDefinition::new("Svc")
            .operation("fetch")
            .capability("fetch", BehaviorDefinition::new("fetch"));
        let members: Vec<_> = def.members().collect();
        assert_eq!(members.len(), 1);
        assert!(matches!(members[0].1, Member::Capability(_)));
    }

    #[test]
    fn test_members_preserve_declaration_order() {
        let def = BehaviorDefinition::new("Svc")
            .operation("b")
            .operation("a")
            .capability("Z", BehaviorDefinition::new("Z"));
        let names: Vec<_> = def.members().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a", "Z"]);
    }
}
