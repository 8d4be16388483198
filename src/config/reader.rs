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

use std::borrow::Cow;
use std::collections::HashMap;
use std::io;
use std::io::BufRead;
use std::io::Read;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;

use crate::config::Attributes;
use crate::config::EventHandler;
use crate::config::Location;
use crate::config::SaxEvent;
use crate::error::ConfigError;

/// A streaming XML reader feeding document events to an [`EventHandler`].
///
/// The reader never buffers the document. For every element it emits a start event, the
/// element's text content and an end event, in document order:
///
/// * tag and attribute names are local names, so `<log4j:configuration>` opens `configuration`;
/// * an empty element `<a/>` opens then immediately closes;
/// * entity and character references are resolved, CDATA sections are plain text;
/// * text made of whitespace only is dropped;
/// * `${name}` references in attribute values and text are replaced by the reader's properties,
///   then by environment variables. Unresolved references are kept as is.
///
/// Comments, processing instructions and the document type declaration are ignored.
///
/// Any syntax error aborts the read with a [`ConfigError`] carrying its location.
#[derive(Debug, Clone)]
pub struct XmlReader {
    properties: HashMap<String, String>,
    environment: bool,
}

impl Default for XmlReader {
    fn default() -> Self {
        Self {
            properties: HashMap::new(),
            environment: true,
        }
    }
}

impl XmlReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a property available to `${name}` references.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Sets whether `${name}` references fall back to environment variables.
    ///
    /// Default to `true`.
    pub fn environment(mut self, environment: bool) -> Self {
        self.environment = environment;
        self
    }

    /// Reads a whole document, feeding its events to the handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or is not a well-formed document. Events
    /// before the error have been delivered to the handler.
    pub fn read<R, H>(&self, source: R, handler: &mut H) -> Result<(), ConfigError>
    where
        R: BufRead,
        H: EventHandler + ?Sized,
    {
        let mut reader = Reader::from_reader(LineTracker::new(source));
        reader.config_mut().trim_text(false);

        let mut state = ReadState::default();
        let mut buf = Vec::new();
        loop {
            let offset = reader.buffer_position() as u64;
            let location = reader.get_ref().locate(offset);
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(source) => {
                    let offset = reader.error_position() as u64;
                    return Err(ConfigError::Xml {
                        location: reader.get_ref().locate(offset),
                        source,
                    });
                }
            };

            match event {
                Event::Start(start) => {
                    let event = self.start(&mut state, &start, location, handler)?;
                    handler.handle_event(&event);
                }
                Event::Empty(start) => {
                    let event = self.start(&mut state, &start, location, handler)?;
                    handler.handle_event(&event);
                    if let SaxEvent::Start { name, .. } = event {
                        state.depth -= 1;
                        handler.handle_event(&SaxEvent::End {
                            name,
                            location: Some(location),
                        });
                    }
                }
                Event::End(end) => {
                    state.flush_text(handler);
                    let name = decode(end.local_name().as_ref(), location)?.into_owned();
                    state.depth = state.depth.saturating_sub(1);
                    handler.handle_event(&SaxEvent::End {
                        name,
                        location: Some(location),
                    });
                }
                Event::Text(text) => {
                    let text = decode(text.as_ref(), location)?;
                    let text = unescape(&text)
                        .map_err(|source| ConfigError::Escape { location, source })?;
                    state.push_text(&self.substitute(&text), location);
                }
                Event::CData(cdata) => {
                    let text = decode(cdata.as_ref(), location)?;
                    state.push_text(&self.substitute(&text), location);
                }
                Event::GeneralRef(reference) => {
                    let name = decode(reference.as_ref(), location)?;
                    let raw = format!("&{name};");
                    let text = unescape(&raw)
                        .map_err(|source| ConfigError::Escape { location, source })?;
                    state.push_text(&text, location);
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
            buf.clear();
        }

        let location = reader.get_ref().locate(reader.buffer_position() as u64);
        if state.depth > 0 {
            return Err(ConfigError::IllFormed {
                location,
                message: format!("{} element(s) left unclosed", state.depth),
            });
        }
        if !state.seen_root {
            return Err(ConfigError::NoRootElement);
        }
        Ok(())
    }

    /// Reads a whole document held in memory.
    pub fn read_str<H>(&self, document: &str, handler: &mut H) -> Result<(), ConfigError>
    where
        H: EventHandler + ?Sized,
    {
        self.read(document.as_bytes(), handler)
    }

    fn start<H>(
        &self,
        state: &mut ReadState,
        start: &BytesStart,
        location: Location,
        handler: &mut H,
    ) -> Result<SaxEvent, ConfigError>
    where
        H: EventHandler + ?Sized,
    {
        state.flush_text(handler);
        if state.depth == 0 && state.seen_root {
            return Err(ConfigError::IllFormed {
                location,
                message: "content after the root element".to_string(),
            });
        }
        let (name, attributes) = self.element(start, location)?;
        state.depth += 1;
        state.seen_root = true;
        Ok(SaxEvent::Start {
            name,
            attributes,
            location: Some(location),
        })
    }

    fn element(
        &self,
        start: &BytesStart,
        location: Location,
    ) -> Result<(String, Attributes), ConfigError> {
        let name = decode(start.local_name().as_ref(), location)?.into_owned();
        let mut attributes = Attributes::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|source| ConfigError::Attribute { location, source })?;
            let qualified = attr.key.as_ref();
            if qualified == b"xmlns" || qualified.starts_with(b"xmlns:") {
                continue;
            }
            let local = attr.key.local_name();
            let key = decode(local.as_ref(), location)?;
            let value = decode(&attr.value, location)?;
            let value =
                unescape(&value).map_err(|source| ConfigError::Escape { location, source })?;
            attributes.push(key.into_owned(), self.substitute(&value).into_owned());
        }
        Ok((name, attributes))
    }

    /// Replaces `${name}` references in the input.
    pub fn substitute<'a>(&self, input: &'a str) -> Cow<'a, str> {
        if !input.contains("${") {
            return Cow::Borrowed(input);
        }

        let mut output = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                output.push_str(&rest[start..]);
                return Cow::Owned(output);
            };
            let name = &after[..end];
            match self.lookup(name) {
                Some(value) => output.push_str(&value),
                None => output.push_str(&rest[start..start + 2 + end + 1]),
            }
            rest = &after[end + 1..];
        }
        output.push_str(rest);
        Cow::Owned(output)
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if let Some(value) = self.properties.get(name) {
            return Some(value.clone());
        }
        if self.environment {
            return std::env::var(name).ok();
        }
        None
    }
}

#[derive(Debug, Default)]
struct ReadState {
    depth: usize,
    seen_root: bool,
    text: String,
    text_location: Option<Location>,
}

impl ReadState {
    fn push_text(&mut self, text: &str, location: Location) {
        if self.text.is_empty() {
            self.text_location = Some(location);
        }
        self.text.push_str(text);
    }

    fn flush_text<H: EventHandler + ?Sized>(&mut self, handler: &mut H) {
        let text = std::mem::take(&mut self.text);
        let location = self.text_location.take();
        if self.depth > 0 && !text.trim().is_empty() {
            handler.handle_event(&SaxEvent::Text { text, location });
        }
    }
}

fn decode(bytes: &[u8], location: Location) -> Result<Cow<'_, str>, ConfigError> {
    std::str::from_utf8(bytes)
        .map(Cow::Borrowed)
        .map_err(|source| ConfigError::Decode { location, source })
}

/// Remembers where lines start in the bytes consumed from the inner reader.
#[derive(Debug)]
struct LineTracker<R> {
    inner: R,
    consumed: u64,
    line_starts: Vec<u64>,
}

impl<R> LineTracker<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            consumed: 0,
            line_starts: vec![0],
        }
    }

    fn track(&mut self, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            if *b == b'\n' {
                self.line_starts.push(self.consumed + i as u64 + 1);
            }
        }
        self.consumed += bytes.len() as u64;
    }

    /// Converts a byte offset into a 1-based line and column.
    fn locate(&self, offset: u64) -> Location {
        let line = self.line_starts.partition_point(|start| *start <= offset);
        let start = self.line_starts[line.saturating_sub(1)];
        Location::new(line as u64, offset - start + 1)
    }
}

impl<R: Read> Read for LineTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.track(&buf[..n]);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for LineTracker<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        // the bytes being consumed are still at the front of the inner buffer
        let mut starts = Vec::new();
        if let Ok(buf) = self.inner.fill_buf() {
            let len = amt.min(buf.len());
            starts.extend(
                buf[..len]
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| **b == b'\n')
                    .map(|(i, _)| self.consumed + i as u64 + 1),
            );
        }
        self.line_starts.extend(starts);
        self.consumed += amt as u64;
        self.inner.consume(amt);
    }
}
