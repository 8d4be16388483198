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
use std::io;
use std::io::Write;
use std::rc::Rc;

use crate::config::Location;

/// An element-level problem recorded during a configuration pass.
///
/// Rendered as `Reported error: "<message>" at line L column C with exception E`, where the
/// location and exception parts only appear when known.
#[derive(Debug)]
pub struct ErrorItem {
    message: String,
    cause: Option<anyhow::Error>,
    location: Option<Location>,
}

impl ErrorItem {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            location: None,
        }
    }

    /// Attaches the error that caused this item.
    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Attaches a source location, if any.
    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Writes the rendered item followed by a newline.
    pub fn dump(&self, mut w: impl Write) -> io::Result<()> {
        writeln!(w, "{self}")
    }
}

impl fmt::Display for ErrorItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reported error: \"{}\"", self.message)?;
        if let Some(location) = self.location {
            write!(f, " at {location}")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, " with exception {cause:#}")?;
        }
        Ok(())
    }
}

/// A diagnostic sink observing error items as they are recorded.
pub trait Trap: fmt::Debug {
    fn trap(&self, item: &ErrorItem);
}

impl<T: Trap + ?Sized> Trap for Rc<T> {
    fn trap(&self, item: &ErrorItem) {
        (**self).trap(item);
    }
}

/// A trap that writes error items to standard error if possible.
///
/// If standard error is not available, it does nothing.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct DefaultTrap {}

impl Trap for DefaultTrap {
    fn trap(&self, item: &ErrorItem) {
        let _ = item.dump(io::stderr());
    }
}

/// A trap that forwards error items to the `log` facade at warn level.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct LogTrap {}

impl Trap for LogTrap {
    fn trap(&self, item: &ErrorItem) {
        log::warn!(target: "logwright::config", "{item}");
    }
}
