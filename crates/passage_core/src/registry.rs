//! Namespace registry
//!
//! The declarative table mapping page namespaces to the effect units that
//! run when the page becomes active. Built once at startup, consulted by the
//! coordinator at PreLeave, PreEnter, and Settled; never mutated at runtime.
//! Adding a page's effect set is a data change here, not a new branch in a
//! dispatcher.

use rustc_hash::FxHashMap;

use crate::effect::EffectUnit;
use crate::slots::SlotKey;

/// Page template identifier, read from the incoming page's metadata
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Namespace(s.to_string())
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-namespace effect lists
#[derive(Default)]
struct ViewSpec {
    on_enter: Vec<EffectUnit>,
    on_exit: Vec<EffectUnit>,
}

/// A reset applied when entering any namespace other than the owner
///
/// Covers globally-scoped elements one specific page leaves in a non-default
/// state (a shared nav a single namespace hides): every other namespace
/// entering must restore the default, because the coordinator cannot know
/// which namespace was previously active.
pub struct RestoreRule {
    pub except: Namespace,
    pub unit: EffectUnit,
}

/// The registry consulted by the coordinator
pub struct NamespaceRegistry {
    views: FxHashMap<Namespace, ViewSpec>,
    global: Vec<EffectUnit>,
    restores: Vec<RestoreRule>,
    intro: Option<EffectUnit>,
}

impl NamespaceRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            views: FxHashMap::default(),
            global: Vec::new(),
            restores: Vec::new(),
            intro: None,
        }
    }

    /// Units to run when a namespace becomes active, in declaration order
    pub fn enter_units(&self, namespace: &Namespace) -> &[EffectUnit] {
        self.views
            .get(namespace)
            .map(|v| v.on_enter.as_slice())
            .unwrap_or(&[])
    }

    /// Units to run when a namespace is left, in declaration order
    pub fn exit_units(&self, namespace: &Namespace) -> &[EffectUnit] {
        self.views
            .get(namespace)
            .map(|v| v.on_exit.as_slice())
            .unwrap_or(&[])
    }

    /// Always-on units run at every Settled phase
    pub fn global_units(&self) -> &[EffectUnit] {
        &self.global
    }

    pub fn restore_rules(&self) -> &[RestoreRule] {
        &self.restores
    }

    /// The one-time first-visit intro, if any
    pub fn intro_unit(&self) -> Option<&EffectUnit> {
        self.intro.as_ref()
    }

    /// Whether a namespace (or the global set) declares a unit owning a slot
    pub fn declares_slot(&self, namespace: &Namespace, key: SlotKey) -> bool {
        self.enter_units(namespace)
            .iter()
            .chain(self.global.iter())
            .any(|u| u.slot_key() == key)
    }

    pub fn namespace_count(&self) -> usize {
        self.views.len()
    }
}

/// Builder for [`NamespaceRegistry`]
pub struct RegistryBuilder {
    views: FxHashMap<Namespace, ViewSpec>,
    global: Vec<EffectUnit>,
    restores: Vec<RestoreRule>,
    intro: Option<EffectUnit>,
}

impl RegistryBuilder {
    /// Register a unit to run whenever `namespace` becomes active
    pub fn on_enter(mut self, namespace: &str, unit: EffectUnit) -> Self {
        self.views
            .entry(Namespace::from(namespace))
            .or_default()
            .on_enter
            .push(unit);
        self
    }

    /// Register a unit to run when `namespace` is left
    pub fn on_exit(mut self, namespace: &str, unit: EffectUnit) -> Self {
        self.views
            .entry(Namespace::from(namespace))
            .or_default()
            .on_exit
            .push(unit);
        self
    }

    /// Declare a namespace with no effects of its own
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.views.entry(Namespace::from(namespace)).or_default();
        self
    }

    /// Register a unit to run on every navigation regardless of destination
    pub fn global(mut self, unit: EffectUnit) -> Self {
        self.global.push(unit);
        self
    }

    /// Register a reset run when entering anything other than `owner`
    pub fn restore_unless(mut self, owner: &str, unit: EffectUnit) -> Self {
        self.restores.push(RestoreRule {
            except: Namespace::from(owner),
            unit,
        });
        self
    }

    /// Register the one-time first-visit intro
    pub fn intro(mut self, unit: EffectUnit) -> Self {
        self.intro = Some(unit);
        self
    }

    pub fn build(self) -> NamespaceRegistry {
        NamespaceRegistry {
            views: self.views,
            global: self.global,
            restores: self.restores,
            intro: self.intro,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &'static str) -> EffectUnit {
        EffectUnit::new(name, |_| None)
    }

    #[test]
    fn test_lookup_preserves_declaration_order() {
        let registry = NamespaceRegistry::builder()
            .on_enter("home", unit("first"))
            .on_enter("home", unit("second"))
            .namespace("skills")
            .build();

        let names: Vec<_> = registry
            .enter_units(&Namespace::from("home"))
            .iter()
            .map(|u| u.name())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(registry.enter_units(&Namespace::from("skills")).is_empty());
        assert!(registry.enter_units(&Namespace::from("unknown")).is_empty());
    }

    #[test]
    fn test_declares_slot_spans_namespace_and_globals() {
        let registry = NamespaceRegistry::builder()
            .on_enter("works", unit("hover").with_slot("worksMouse"))
            .global(unit("logo"))
            .build();

        let works = Namespace::from("works");
        let home = Namespace::from("home");
        assert!(registry.declares_slot(&works, "worksMouse"));
        assert!(!registry.declares_slot(&home, "worksMouse"));
        // Global slots count for every namespace
        assert!(registry.declares_slot(&home, "logo"));
    }
}
