use crate::behavior::{BehaviorDefinition, Member, MethodMode};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

/// One discovered operation on a behavior surface.
///
/// The dynamic original carried a direct reference to the operation; here the
/// name is the reference, resolved against the live target at call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub mode: MethodMode,
}

/// Read-only description of a behavior surface: discovered operations plus
/// one subtree per nested capability. Built per invocation of [`build`] and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityTree {
    pub name: String,
    pub methods: IndexMap<String, MethodDescriptor>,
    pub objects: IndexMap<String, CapabilityTree>,
}

impl CapabilityTree {
    fn new(name: impl Into<String>) -> Self {
        CapabilityTree {
            name: name.into(),
            methods: IndexMap::new(),
            objects: IndexMap::new(),
        }
    }
}

/// Build the capability tree for a definition, labeled with the definition's
/// declared name.
pub fn build(definition: &BehaviorDefinition) -> CapabilityTree {
    build_named(definition, definition.name())
}

/// Build the capability tree for a definition under an explicit label.
/// Nested subtrees are labeled with the member name they were declared
/// under, not the nested definition's own name.
pub fn build_named(definition: &BehaviorDefinition, name: &str) -> CapabilityTree {
    let mut tree = CapabilityTree::new(name);
    build_into(definition, &mut tree);
    debug!(
        tree = %tree.name,
        methods = tree.methods.len(),
        objects = tree.objects.len(),
        "built capability tree"
    );
    tree
}

fn build_into(definition: &BehaviorDefinition, tree: &mut CapabilityTree) {
    for (member_name, member) in definition.members() {
        match member {
            Member::Operation if leading_lowercase(member_name) => {
                let mode = definition.mode_of(member_name);
                trace!(method = %member_name, ?mode, "discovered operation");
                tree.methods.insert(
                    member_name.to_string(),
                    MethodDescriptor {
                        name: member_name.to_string(),
                        mode,
                    },
                );
            }
            Member::Capability(sub) if leading_uppercase(member_name) => {
                trace!(capability = %member_name, "descending into nested capability");
                tree.objects
                    .insert(member_name.to_string(), build_named(sub, member_name));
            }
            _ => {
                // Casing is the sole discovery signal; anything else is skipped.
                trace!(member = %member_name, "ignoring member with non-matching casing");
            }
        }
    }
}

/// Accessor for a nested capability: the capability name with its first
/// character lower-cased. `objects["Inner"]` is expected live at `inner`.
pub fn accessor_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn leading_lowercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_lowercase)
}

fn leading_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn outer_definition() -> BehaviorDefinition {
        let inner = BehaviorDefinition::new("Inner").operation("get");
        BehaviorDefinition::new("Outer")
            .operation("list")
            .operation("create")
            .capability("Inner", inner)
    }

    #[test]
    fn test_discovers_exact_member_sets() {
        let tree = build(&outer_definition());
        assert_eq!(tree.name, "Outer");
        let methods: Vec<_> = tree.methods.keys().map(String::as_str).collect();
        assert_eq!(methods, vec!["list", "create"]);
        let objects: Vec<_> = tree.objects.keys().map(String::as_str).collect();
        assert_eq!(objects, vec!["Inner"]);
        assert_eq!(
            tree.objects["Inner"]
                .methods
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>(),
            vec!["get"]
        );
    }

    #[test]
    fn test_build_named_overrides_label() {
        let tree = build_named(&outer_definition(), "Labeled");
        assert_eq!(tree.name, "Labeled");
        // Subtree labels come from the declaring member name.
        assert_eq!(tree.objects["Inner"].name, "Inner");
    }

    #[test]
    fn test_ignores_members_with_wrong_casing() {
        let def = BehaviorDefinition::new("Odd")
            .operation("Shout")
            .capability("quiet", BehaviorDefinition::new("quiet"))
            .operation("_hidden");
        let tree = build(&def);
        assert!(tree.methods.is_empty());
        assert!(tree.objects.is_empty());
    }

    #[test]
    fn test_metadata_overrides_mode() {
        let def = BehaviorDefinition::new("Svc")
            .operation("poll")
            .operation("snapshot")
            .mode("snapshot", MethodMode::Direct);
        let tree = build(&def);
        assert_eq!(tree.methods["poll"].mode, MethodMode::Callback);
        assert_eq!(tree.methods["snapshot"].mode, MethodMode::Direct);
    }

    #[test]
    fn test_accessor_name() {
        assert_eq!(accessor_name("Inner"), "inner");
        assert_eq!(accessor_name("HTTPPool"), "hTTPPool");
        assert_eq!(accessor_name(""), "");
    }

    #[test]
    fn test_tree_serializes_for_diagnostics() {
        let tree = build(&outer_definition());
        let json = serde_json::to_value(&tree).expect("serialize tree");
        assert_eq!(json["name"], "Outer");
        assert_eq!(json["methods"]["list"]["mode"], "callback");
        assert_eq!(json["objects"]["Inner"]["name"], "Inner");
    }

    proptest! {
        #[test]
        fn prop_partitions_members_by_casing(
            ops in prop::collection::hash_set("[a-z][a-zA-Z0-9]{0,8}", 0..8),
            caps in prop::collection::hash_set("[A-Z][a-zA-Z0-9]{0,8}", 0..8),
        ) {
            let mut def = BehaviorDefinition::new("Subject");
            for op in &ops {
                def = def.operation(op.clone());
            }
            for cap in &caps {
                def = def.capability(cap.clone(), BehaviorDefinition::new(cap.clone()));
            }
            let tree = build(&def);
            let method_keys: HashSet<String> = tree.methods.keys().cloned().collect();
            let object_keys: HashSet<String> = tree.objects.keys().cloned().collect();
            prop_assert_eq!(method_keys, ops);
            prop_assert_eq!(object_keys, caps);
        }
    }
}
