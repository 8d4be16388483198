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

use std::io::BufRead;

use crate::config::EventHandler;
use crate::config::SaxEvent;
use crate::config::XmlReader;
use crate::error::ConfigError;

/// A captured copy of a document's event stream.
///
/// Recording separates reading the document from interpreting it: a document that cannot be
/// read fails before any action runs, and a recorded document can be replayed any number of
/// times without reading it again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedDocument {
    events: Vec<SaxEvent>,
}

impl RecordedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and records a whole document.
    pub fn record<R: BufRead>(reader: &XmlReader, source: R) -> Result<Self, ConfigError> {
        let mut document = Self::new();
        reader.read(source, &mut document)?;
        log::debug!(
            target: "logwright::config",
            "recorded {} events",
            document.events.len()
        );
        Ok(document)
    }

    /// Feeds every recorded event to the handler, in order.
    pub fn replay<H: EventHandler + ?Sized>(&self, handler: &mut H) {
        for event in &self.events {
            handler.handle_event(event);
        }
    }

    pub fn events(&self) -> &[SaxEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventHandler for RecordedDocument {
    fn handle_event(&mut self, event: &SaxEvent) {
        self.events.push(event.clone());
    }
}

impl FromIterator<SaxEvent> for RecordedDocument {
    fn from_iter<I: IntoIterator<Item = SaxEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}
