//! Minimum-level resolution per source category.
//!
//! # Responsibilities
//! - Resolve the effective minimum level for a source category
//! - Support prefix rules overriding the global default for a subtree
//!
//! # Design Decisions
//! - Prefix matching is dot-bounded: a rule for "App" covers "App" and
//!   "App.Web" but not "Application"
//! - Most-specific (longest) matching prefix wins; rules are sorted once
//!   at construction so lookup is a linear scan over a short list
//! - A trailing ".*" or "*" in a configured prefix is accepted and stripped

use crate::logging::event::Level;

/// A minimum-level override for one category subtree.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub prefix: String,
    pub level: Level,
}

/// Resolves the effective minimum level for a source category:
/// first most-specific matching prefix rule, else the global default.
#[derive(Debug, Clone)]
pub struct LevelFilter {
    default: Level,
    rules: Vec<CategoryRule>,
}

impl LevelFilter {
    pub fn new(default: Level, rules: Vec<CategoryRule>) -> Self {
        let mut rules: Vec<CategoryRule> = rules
            .into_iter()
            .map(|mut rule| {
                rule.prefix = normalize_prefix(&rule.prefix);
                rule
            })
            .filter(|rule| !rule.prefix.is_empty())
            .collect();
        // Longest prefix first, so the first match is the most specific.
        rules.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { default, rules }
    }

    /// Minimum level applying to `source` when the sink has no override.
    pub fn category_minimum(&self, source: &str) -> Level {
        self.rules
            .iter()
            .find(|rule| prefix_matches(&rule.prefix, source))
            .map(|rule| rule.level)
            .unwrap_or(self.default)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    prefix
        .trim()
        .trim_end_matches('*')
        .trim_end_matches('.')
        .to_string()
}

fn prefix_matches(prefix: &str, source: &str) -> bool {
    source == prefix
        || (source.len() > prefix.len()
            && source.starts_with(prefix)
            && source.as_bytes()[prefix.len()] == b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(prefix: &str, level: Level) -> CategoryRule {
        CategoryRule {
            prefix: prefix.to_string(),
            level,
        }
    }

    #[test]
    fn falls_back_to_global_default() {
        let filter = LevelFilter::new(Level::Information, vec![]);
        assert_eq!(filter.category_minimum("App.Web"), Level::Information);
    }

    #[test]
    fn rule_overrides_default_for_subtree() {
        let filter = LevelFilter::new(Level::Information, vec![rule("Framework", Level::Error)]);
        assert_eq!(filter.category_minimum("Framework.Auth"), Level::Error);
        assert_eq!(filter.category_minimum("Framework"), Level::Error);
        assert_eq!(filter.category_minimum("App.Web"), Level::Information);
    }

    #[test]
    fn longest_prefix_wins() {
        let filter = LevelFilter::new(
            Level::Information,
            vec![
                rule("Framework", Level::Error),
                rule("Framework.Auth", Level::Trace),
            ],
        );
        assert_eq!(filter.category_minimum("Framework.Auth.Token"), Level::Trace);
        assert_eq!(filter.category_minimum("Framework.Hosting"), Level::Error);
    }

    #[test]
    fn prefix_is_dot_bounded() {
        let filter = LevelFilter::new(Level::Information, vec![rule("App", Level::Error)]);
        assert_eq!(filter.category_minimum("Application"), Level::Information);
        assert_eq!(filter.category_minimum("App.Web"), Level::Error);
    }

    #[test]
    fn wildcard_suffix_is_stripped() {
        let filter = LevelFilter::new(Level::Information, vec![rule("Framework.*", Level::Error)]);
        assert_eq!(filter.category_minimum("Framework.Auth"), Level::Error);
    }
}
