// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::rc::Rc;

use crate::config::Action;
use crate::config::ElementPath;
use crate::config::Pattern;

/// An insertion-ordered registry of rules binding patterns to actions.
///
/// Resolution is deterministic:
///
/// 1. a non-anchored pattern equal to the path wins;
/// 2. otherwise the anchored pattern matching the longest suffix of the path wins;
/// 3. ties go to the rule registered first.
///
/// Registering a non-anchored pattern that is already present replaces its action. Anchored
/// patterns are kept in registration order, so a duplicate anchored pattern never wins over the
/// first one.
#[derive(Debug, Default, Clone)]
pub struct RuleStore {
    rules: Vec<(Pattern, Rc<dyn Action>)>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an action to a pattern.
    pub fn register(&mut self, pattern: impl Into<Pattern>, action: Rc<dyn Action>) {
        let pattern = pattern.into();
        if !pattern.is_anchored_at_end() {
            if let Some(rule) = self.rules.iter_mut().find(|(p, _)| *p == pattern) {
                rule.1 = action;
                return;
            }
        }
        self.rules.push((pattern, action));
    }

    /// Binds an action to a pattern, returning the store for chaining.
    pub fn rule(mut self, pattern: impl Into<Pattern>, action: impl Action + 'static) -> Self {
        self.register(pattern, Rc::new(action));
        self
    }

    /// Returns the action bound to the given element path, if any.
    pub fn resolve(&self, path: &ElementPath) -> Option<Rc<dyn Action>> {
        let exact = self
            .rules
            .iter()
            .find(|(p, _)| !p.is_anchored_at_end() && p.matches(path));
        if let Some((_, action)) = exact {
            return Some(action.clone());
        }

        let mut best: Option<(usize, &Rc<dyn Action>)> = None;
        for (pattern, action) in &self.rules {
            if !pattern.is_anchored_at_end() || !pattern.matches(path) {
                continue;
            }
            // strictly longer only, so the earliest registration keeps ties
            if best.is_none_or(|(len, _)| pattern.len() > len) {
                best = Some((pattern.len(), action));
            }
        }
        best.map(|(_, action)| action.clone())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pattern, &Rc<dyn Action>)> {
        self.rules.iter().map(|(p, a)| (p, a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Attributes;
    use crate::config::ExecutionContext;

    #[derive(Debug)]
    struct Named(&'static str);

    impl Action for Named {
        fn begin(&self, _: &mut ExecutionContext, _: &str, _: &Attributes) -> anyhow::Result<()> {
            Ok(())
        }

        fn end(&self, _: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn named(store: &RuleStore, path: &[&str]) -> Option<String> {
        let action = store.resolve(&path.iter().copied().collect())?;
        let rendered = format!("{action:?}");
        let name = rendered.strip_prefix("Named(\"")?.strip_suffix("\")")?;
        Some(name.to_string())
    }

    #[test]
    fn test_exact_match_wins_over_anchored() {
        let store = RuleStore::new()
            .rule("*/b", Named("anchored"))
            .rule("a/b", Named("exact"))
            .rule("*/a/b", Named("longer"));
        assert_eq!(named(&store, &["a", "b"]).as_deref(), Some("exact"));
        assert_eq!(named(&store, &["x", "b"]).as_deref(), Some("anchored"));
    }

    #[test]
    fn test_longest_suffix_wins() {
        let store = RuleStore::new()
            .rule("*/b", Named("short"))
            .rule("*/a/b", Named("long"));
        assert_eq!(named(&store, &["x", "a", "b"]).as_deref(), Some("long"));
        assert_eq!(named(&store, &["x", "c", "b"]).as_deref(), Some("short"));
        assert_eq!(named(&store, &["a", "b", "c"]), None);
    }

    #[test]
    fn test_ties_go_to_first_registration() {
        let store = RuleStore::new()
            .rule("*/b", Named("first"))
            .rule("*/b", Named("second"));
        assert_eq!(store.len(), 2);
        assert_eq!(named(&store, &["b"]).as_deref(), Some("first"));
    }

    #[test]
    fn test_exact_duplicate_overwrites() {
        let store = RuleStore::new()
            .rule("a/b", Named("first"))
            .rule("/a/b", Named("second"));
        assert_eq!(store.len(), 1);
        assert_eq!(named(&store, &["a", "b"]).as_deref(), Some("second"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let store = RuleStore::new()
            .rule("configuration", Named("configuration"))
            .rule("*/param", Named("param"));
        let path = ElementPath::from(["configuration", "appender", "param"]);

        let first = store.resolve(&path).unwrap();
        let second = store.resolve(&path).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 2);
        assert!(store.resolve(&ElementPath::from(["other"])).is_none());
    }
}
