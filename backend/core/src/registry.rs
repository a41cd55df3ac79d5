//! The placeholder registry: insertion-ordered field configurations with
//! dependency checking.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::enrichment::SuggestedPlaceholder;
use crate::error::{DocfillError, Result};
use crate::field::{dedup, FieldConfig, FieldKind};
use crate::placeholder::PlaceholderName;

/// DFS colors for cycle detection.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Mapping from placeholder name to its configuration, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    entries: Vec<(PlaceholderName, FieldConfig)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build default (Text, optional, unconditional) entries for each name.
    pub fn seed<I>(names: I) -> Self
    where
        I: IntoIterator<Item = PlaceholderName>,
    {
        let entries: Vec<_> = dedup(names)
            .into_iter()
            .map(|name| (name, FieldConfig::default()))
            .collect();
        info!(count = entries.len(), "Seeded placeholder registry");
        Self { entries }
    }

    pub(crate) fn from_entries(entries: Vec<(PlaceholderName, FieldConfig)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &PlaceholderName) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &PlaceholderName) -> Option<&FieldConfig> {
        self.position(name).map(|i| &self.entries[i].1)
    }

    pub fn names(&self) -> impl Iterator<Item = &PlaceholderName> {
        self.entries.iter().map(|(name, _)| name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlaceholderName, &FieldConfig)> {
        self.entries.iter().map(|(name, cfg)| (name, cfg))
    }

    fn position(&self, name: &PlaceholderName) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    /// Replace the configuration of an existing placeholder.
    ///
    /// On error the registry is left unchanged.
    pub fn set_config(&mut self, name: &PlaceholderName, config: FieldConfig) -> Result<()> {
        let idx = self
            .position(name)
            .ok_or_else(|| DocfillError::UnknownPlaceholder(name.clone()))?;

        let config = normalize(config);
        self.check_dependencies(name, &config)?;

        debug!(
            name = %name,
            kind = %config.kind,
            required = config.required,
            conditional = config.is_conditional,
            "Placeholder configured"
        );
        self.entries[idx].1 = config;
        Ok(())
    }

    /// Positional form of [`Registry::set_config`].
    pub fn configure(
        &mut self,
        name: &PlaceholderName,
        kind: FieldKind,
        required: bool,
        is_conditional: bool,
        dependency: Vec<PlaceholderName>,
    ) -> Result<()> {
        let config = FieldConfig {
            kind,
            required,
            is_conditional,
            dependent_on: dependency,
            options: self.get(name).map(|c| c.options.clone()).unwrap_or_default(),
        };
        self.set_config(name, config)
    }

    /// Insert a new placeholder.
    pub fn add(&mut self, name: PlaceholderName, config: FieldConfig) -> Result<()> {
        if self.contains(&name) {
            return Err(DocfillError::DuplicateName(name));
        }
        let config = normalize(config);
        self.check_dependencies(&name, &config)?;
        debug!(name = %name, "Placeholder added");
        self.entries.push((name, config));
        Ok(())
    }

    /// Promote an accepted suggestion into the registry with default settings.
    pub fn accept_suggestion(&mut self, suggestion: &SuggestedPlaceholder) -> Result<PlaceholderName> {
        self.add(suggestion.name.clone(), FieldConfig::default())?;
        info!(
            name = %suggestion.name,
            source = %suggestion.source_text,
            "Accepted suggested placeholder"
        );
        Ok(suggestion.name.clone())
    }

    /// Candidates offered when picking a dependency for `excluding`.
    ///
    /// Self is excluded; longer cycles are still rejected by `set_config`.
    pub fn dependency_targets(&self, excluding: &PlaceholderName) -> Vec<PlaceholderName> {
        self.names().filter(|n| *n != excluding).cloned().collect()
    }

    /// Check every conditional entry. Used when loading a persisted artifact.
    pub(crate) fn check_all(&self) -> Result<()> {
        for (name, config) in &self.entries {
            self.check_dependencies(name, config)?;
        }
        Ok(())
    }

    fn check_dependencies(&self, name: &PlaceholderName, config: &FieldConfig) -> Result<()> {
        if !config.is_conditional {
            return Ok(());
        }
        let invalid = |reason: String| DocfillError::InvalidDependency {
            name: name.clone(),
            reason,
        };

        if config.dependent_on.is_empty() {
            return Err(invalid("conditional field has no dependency".to_string()));
        }
        for dep in &config.dependent_on {
            if dep == name {
                return Err(invalid("field cannot depend on itself".to_string()));
            }
            if !self.contains(dep) {
                return Err(invalid(format!("unknown dependency '{dep}'")));
            }
        }

        if let Some(cycle) = self.find_cycle(name, config) {
            let path = cycle
                .iter()
                .map(PlaceholderName::as_str)
                .collect::<Vec<_>>()
                .join(" → ");
            return Err(invalid(format!("circular dependency: {path}")));
        }
        Ok(())
    }

    /// Look for a cycle through `name` as if it carried `candidate`.
    fn find_cycle(&self, name: &PlaceholderName, candidate: &FieldConfig) -> Option<Vec<PlaceholderName>> {
        let mut edges: HashMap<&PlaceholderName, &[PlaceholderName]> = self
            .entries
            .iter()
            .map(|(n, cfg)| (n, cfg.active_dependencies()))
            .collect();
        edges.insert(name, candidate.active_dependencies());

        let mut colors: HashMap<&PlaceholderName, Color> =
            edges.keys().map(|n| (*n, Color::White)).collect();
        let mut path = Vec::new();
        dfs_visit(name, &edges, &mut colors, &mut path)
    }
}

fn dfs_visit<'a>(
    node: &'a PlaceholderName,
    edges: &HashMap<&'a PlaceholderName, &'a [PlaceholderName]>,
    colors: &mut HashMap<&'a PlaceholderName, Color>,
    path: &mut Vec<&'a PlaceholderName>,
) -> Option<Vec<PlaceholderName>> {
    colors.insert(node, Color::Gray);
    path.push(node);

    for next in edges.get(node).copied().unwrap_or_default() {
        match colors.get(next).copied().unwrap_or(Color::Black) {
            Color::Gray => {
                let start = path.iter().position(|n| *n == next).unwrap_or(0);
                let mut cycle: Vec<PlaceholderName> =
                    path[start..].iter().map(|n| (*n).clone()).collect();
                cycle.push(next.clone());
                return Some(cycle);
            }
            Color::White => {
                if let Some(cycle) = dfs_visit(next, edges, colors, path) {
                    return Some(cycle);
                }
            }
            Color::Black => {}
        }
    }

    path.pop();
    colors.insert(node, Color::Black);
    None
}

fn normalize(mut config: FieldConfig) -> FieldConfig {
    config.dependent_on = dedup(config.dependent_on);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> PlaceholderName {
        PlaceholderName::parse(s).unwrap()
    }

    fn registry(names: &[&str]) -> Registry {
        Registry::seed(names.iter().map(|n| name(n)))
    }

    #[test]
    fn seed_uses_defaults_and_keeps_order() {
        let reg = registry(&["b", "a", "b"]);
        let names: Vec<_> = reg.names().map(PlaceholderName::as_str).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(reg.get(&name("a")), Some(&FieldConfig::default()));
    }

    #[test]
    fn set_config_on_unknown_fails() {
        let mut reg = registry(&["a"]);
        let err = reg.set_config(&name("zzz"), FieldConfig::default()).unwrap_err();
        assert!(matches!(err, DocfillError::UnknownPlaceholder(_)));
    }

    #[test]
    fn empty_dependency_rejected_and_registry_unchanged() {
        let mut reg = registry(&["a", "b"]);
        let before = reg.clone();
        let err = reg
            .configure(&name("a"), FieldKind::Text, true, true, vec![])
            .unwrap_err();
        assert!(matches!(err, DocfillError::InvalidDependency { .. }));
        assert_eq!(reg, before);
    }

    #[test]
    fn self_dependency_rejected_and_registry_unchanged() {
        let mut reg = registry(&["a", "b"]);
        let before = reg.clone();
        let err = reg
            .set_config(&name("a"), FieldConfig::default().depends_on([name("a")]))
            .unwrap_err();
        assert!(matches!(err, DocfillError::InvalidDependency { .. }));
        assert_eq!(reg, before);
    }

    #[test]
    fn unknown_dependency_rejected() {
        let mut reg = registry(&["a"]);
        let err = reg
            .set_config(&name("a"), FieldConfig::default().depends_on([name("ghost")]))
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn multi_hop_cycle_rejected() {
        let mut reg = registry(&["a", "b", "c"]);
        reg.set_config(&name("a"), FieldConfig::default().depends_on([name("b")]))
            .unwrap();
        reg.set_config(&name("b"), FieldConfig::default().depends_on([name("c")]))
            .unwrap();
        let before = reg.clone();
        let err = reg
            .set_config(&name("c"), FieldConfig::default().depends_on([name("a")]))
            .unwrap_err();
        assert!(err.to_string().contains("c → a → b → c"), "{err}");
        assert_eq!(reg, before);
    }

    #[test]
    fn non_conditional_edges_do_not_form_cycles() {
        let mut reg = registry(&["a", "b"]);
        reg.set_config(&name("a"), FieldConfig::default().depends_on([name("b")]))
            .unwrap();
        let mut stale = FieldConfig::default().depends_on([name("a")]);
        stale.is_conditional = false;
        assert!(reg.set_config(&name("b"), stale).is_ok());
    }

    #[test]
    fn add_rejects_duplicates() {
        let mut reg = registry(&["a"]);
        let err = reg.add(name("a"), FieldConfig::default()).unwrap_err();
        assert!(matches!(err, DocfillError::DuplicateName(_)));
    }

    #[test]
    fn accepted_suggestion_becomes_dependency_target() {
        let mut reg = registry(&["a"]);
        let suggestion = SuggestedPlaceholder::new("Acme Corp", name("company-name"));
        reg.accept_suggestion(&suggestion).unwrap();
        assert_eq!(reg.dependency_targets(&name("a")), vec![name("company-name")]);
        assert!(reg
            .set_config(&name("a"), FieldConfig::default().depends_on([name("company-name")]))
            .is_ok());
    }

    #[test]
    fn dependency_targets_exclude_self() {
        let reg = registry(&["a", "b", "c"]);
        assert_eq!(reg.dependency_targets(&name("b")), vec![name("a"), name("c")]);
    }
}
