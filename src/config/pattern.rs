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

use std::fmt;

/// A structural path descriptor selecting the elements a rule applies to.
///
/// Patterns are written as `/`-separated element names. The pattern for a top level `<a>`
/// element is `"a"`, and the pattern for a `<b>` nested in it is `"a/b"`. A leading `*`
/// anchors the pattern at the end of the path: `"*/b"` matches a `<b>` element at any level
/// of nesting.
///
/// Empty components are ignored, so `"/a"`, `"a"` and `"a/"` are the same pattern.
///
/// # Examples
///
/// ```
/// use logwright::config::ElementPath;
/// use logwright::config::Pattern;
///
/// let exact = Pattern::new("configuration/appender");
/// let anchored = Pattern::new("*/param");
///
/// let path = ElementPath::from(["configuration", "appender", "param"]);
/// assert!(!exact.matches(&path));
/// assert!(anchored.matches(&path));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    components: Vec<String>,
    anchored_at_end: bool,
}

impl Pattern {
    /// Parses a pattern from its `/`-separated string form.
    pub fn new(pattern: &str) -> Self {
        let mut components = pattern
            .split('/')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        let anchored_at_end = components.first().is_some_and(|c| c == "*");
        if anchored_at_end {
            components.remove(0);
        }

        Self {
            components,
            anchored_at_end,
        }
    }

    /// Whether this pattern matches paths by their trailing components.
    pub fn is_anchored_at_end(&self) -> bool {
        self.anchored_at_end
    }

    /// The element names of this pattern, excluding the leading wildcard.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The number of element names of this pattern, excluding the leading wildcard.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether this pattern has no element names.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns `true` if this pattern selects the given element path.
    ///
    /// A non-anchored pattern matches only a path of identical length and components. An anchored
    /// pattern of `k` components matches any path whose trailing `k` components are equal.
    pub fn matches(&self, path: &ElementPath) -> bool {
        if self.anchored_at_end {
            self.tail_match(path) == self.components.len()
        } else {
            self.components == path.components
        }
    }

    /// Returns the number of trailing components this pattern has in common with the path.
    pub fn tail_match(&self, path: &ElementPath) -> usize {
        self.components
            .iter()
            .rev()
            .zip(path.components.iter().rev())
            .take_while(|(l, r)| l == r)
            .count()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.anchored_at_end {
            f.write_str("*")?;
            if !self.components.is_empty() {
                f.write_str("/")?;
            }
        }
        f.write_str(&self.components.join("/"))
    }
}

impl From<&str> for Pattern {
    fn from(pattern: &str) -> Self {
        Pattern::new(pattern)
    }
}

/// The names of the currently open elements, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ElementPath {
    components: Vec<String>,
}

impl ElementPath {
    /// Creates an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters an element.
    pub fn push(&mut self, name: impl Into<String>) {
        self.components.push(name.into());
    }

    /// Leaves the innermost element.
    pub fn pop(&mut self) -> Option<String> {
        self.components.pop()
    }

    /// The name of the innermost open element.
    pub fn last(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// The nesting depth; a top level element is at depth 1.
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    /// The element names, outermost first.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Removes every component.
    pub fn clear(&mut self) {
        self.components.clear();
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.components.join("/"))
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for ElementPath {
    fn from(components: [S; N]) -> Self {
        Self {
            components: components.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ElementPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            components: iter.into_iter().map(Into::into).collect(),
        }
    }
}
