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

/// A position in the source document. Lines and columns start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: u64,
    pub column: u64,
}

impl Location {
    pub fn new(line: u64, column: u64) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// The attributes of an element, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute. A later attribute with the same name shadows an earlier one.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the value of the named attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of the named attribute, treating a blank value as absent.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A structural event of a configuration document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaxEvent {
    /// An element is opened.
    Start {
        name: String,
        attributes: Attributes,
        location: Option<Location>,
    },
    /// Character content between the open and close of the innermost element.
    Text {
        text: String,
        location: Option<Location>,
    },
    /// An element is closed.
    End {
        name: String,
        location: Option<Location>,
    },
}

impl SaxEvent {
    /// Shorthand for a start event without location.
    pub fn start(name: impl Into<String>, attributes: Attributes) -> Self {
        SaxEvent::Start {
            name: name.into(),
            attributes,
            location: None,
        }
    }

    /// Shorthand for a text event without location.
    pub fn text(text: impl Into<String>) -> Self {
        SaxEvent::Text {
            text: text.into(),
            location: None,
        }
    }

    /// Shorthand for an end event without location.
    pub fn end(name: impl Into<String>) -> Self {
        SaxEvent::End {
            name: name.into(),
            location: None,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            SaxEvent::Start { location, .. }
            | SaxEvent::Text { location, .. }
            | SaxEvent::End { location, .. } => *location,
        }
    }
}

/// A consumer of document events, fed by the XML reader or by a recorded document.
pub trait EventHandler {
    fn handle_event(&mut self, event: &SaxEvent);
}

impl<F: FnMut(&SaxEvent)> EventHandler for F {
    fn handle_event(&mut self, event: &SaxEvent) {
        self(event)
    }
}
