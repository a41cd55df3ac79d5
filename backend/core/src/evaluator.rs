//! Dependency evaluator: decides whether a field is shown and whether it is
//! currently required.
//!
//! Everything here is recomputed from the value map on each call. A single
//! edit can change the visibility of many fields in the same render pass,
//! so nothing is cached.

use serde::Serialize;

use crate::field::FieldKind;
use crate::placeholder::PlaceholderName;
use crate::registry::Registry;
use crate::value::{FieldValue, ValueMap};

/// Whether a value counts as "filled in".
///
/// Absent, empty string, empty list and `false` are not truthy. Numeric zero
/// and the string `"0"` are.
pub fn is_truthy(value: Option<&FieldValue>) -> bool {
    match value {
        None => false,
        Some(FieldValue::Text(s)) => !s.is_empty(),
        Some(FieldValue::List(items)) => !items.is_empty(),
        Some(FieldValue::Bool(b)) => *b,
        Some(FieldValue::Number(_)) | Some(FieldValue::Date(_)) => true,
    }
}

/// A field is visible unless it is conditional and at least one of its
/// dependencies is not truthy. Unknown names are never visible.
pub fn is_visible(registry: &Registry, values: &ValueMap, name: &PlaceholderName) -> bool {
    let Some(config) = registry.get(name) else {
        return false;
    };
    config
        .active_dependencies()
        .iter()
        .all(|dep| is_truthy(values.get(dep)))
}

/// Required and currently visible.
pub fn is_effectively_required(registry: &Registry, values: &ValueMap, name: &PlaceholderName) -> bool {
    registry.get(name).is_some_and(|config| config.required) && is_visible(registry, values, name)
}

/// Render-time view of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldState {
    pub name: PlaceholderName,
    pub kind: FieldKind,
    pub visible: bool,
    pub required: bool,
    pub effectively_required: bool,
    pub filled: bool,
}

/// States for every field, in registry order.
pub fn field_states(registry: &Registry, values: &ValueMap) -> Vec<FieldState> {
    registry
        .iter()
        .map(|(name, config)| {
            let visible = is_visible(registry, values, name);
            FieldState {
                name: name.clone(),
                kind: config.kind,
                visible,
                required: config.required,
                effectively_required: config.required && visible,
                filled: is_truthy(values.get(name)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldConfig;

    fn name(s: &str) -> PlaceholderName {
        PlaceholderName::parse(s).unwrap()
    }

    fn conditional_pair() -> Registry {
        let mut reg = Registry::seed([name("parent"), name("child")]);
        reg.set_config(
            &name("child"),
            FieldConfig::new(FieldKind::Text)
                .required(true)
                .depends_on([name("parent")]),
        )
        .unwrap();
        reg
    }

    fn with_parent(value: Option<FieldValue>) -> ValueMap {
        let mut values = ValueMap::new();
        if let Some(v) = value {
            values.insert(name("parent"), v);
        }
        values
    }

    #[test]
    fn truthiness_table() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&FieldValue::Text(String::new()))));
        assert!(!is_truthy(Some(&FieldValue::List(vec![]))));
        assert!(!is_truthy(Some(&FieldValue::Bool(false))));

        assert!(is_truthy(Some(&FieldValue::Number(0.0))));
        assert!(is_truthy(Some(&FieldValue::Text("0".into()))));
        assert!(is_truthy(Some(&FieldValue::Bool(true))));
        assert!(is_truthy(Some(&FieldValue::Text(" ".into()))));
    }

    #[test]
    fn non_conditional_always_visible() {
        let mut reg = Registry::seed([name("a"), name("b")]);
        let mut stale = FieldConfig::default().depends_on([name("b")]);
        stale.is_conditional = false;
        reg.set_config(&name("a"), stale).unwrap();

        for values in [ValueMap::new(), with_parent(Some(FieldValue::Bool(false)))] {
            assert!(is_visible(&reg, &values, &name("a")));
        }
    }

    #[test]
    fn hidden_when_parent_not_truthy() {
        let reg = conditional_pair();
        let falsy = [
            None,
            Some(FieldValue::Text(String::new())),
            Some(FieldValue::List(vec![])),
            Some(FieldValue::Bool(false)),
        ];
        for value in falsy {
            let values = with_parent(value.clone());
            assert!(!is_visible(&reg, &values, &name("child")), "{value:?}");
            assert!(!is_effectively_required(&reg, &values, &name("child")));
        }
    }

    #[test]
    fn shown_when_parent_truthy_including_zero() {
        let reg = conditional_pair();
        let truthy = [
            FieldValue::Number(0.0),
            FieldValue::Text("0".into()),
            FieldValue::Bool(true),
            FieldValue::List(vec!["x".into()]),
        ];
        for value in truthy {
            let values = with_parent(Some(value.clone()));
            assert!(is_visible(&reg, &values, &name("child")), "{value:?}");
            assert!(is_effectively_required(&reg, &values, &name("child")));
        }
    }

    #[test]
    fn all_dependencies_must_be_truthy() {
        let mut reg = Registry::seed([name("a"), name("b"), name("c")]);
        reg.set_config(
            &name("c"),
            FieldConfig::default().depends_on([name("a"), name("b")]),
        )
        .unwrap();

        let mut values = ValueMap::new();
        values.insert(name("a"), FieldValue::Bool(true));
        assert!(!is_visible(&reg, &values, &name("c")));

        values.insert(name("b"), FieldValue::Text("yes".into()));
        assert!(is_visible(&reg, &values, &name("c")));
    }

    #[test]
    fn reevaluated_after_every_edit() {
        let reg = conditional_pair();
        let mut values = ValueMap::new();
        assert!(!is_visible(&reg, &values, &name("child")));
        values.insert(name("parent"), FieldValue::Text("x".into()));
        assert!(is_visible(&reg, &values, &name("child")));
        values.remove(&name("parent"));
        assert!(!is_visible(&reg, &values, &name("child")));
    }

    #[test]
    fn field_states_follow_registry_order() {
        let reg = conditional_pair();
        let values = with_parent(Some(FieldValue::Text("x".into())));
        let states = field_states(&reg, &values);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].name, name("parent"));
        assert!(states[0].filled);
        assert!(states[1].visible);
        assert!(states[1].effectively_required);
        assert!(!states[1].filled);
    }

    #[test]
    fn unknown_field_is_not_visible() {
        let reg = conditional_pair();
        assert!(!is_visible(&reg, &ValueMap::new(), &name("nope")));
        assert!(!is_effectively_required(&reg, &ValueMap::new(), &name("nope")));
    }
}
