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

use std::path::PathBuf;

use log::SetLoggerError;

use crate::config::Location;

/// An error aborting a whole configuration pass.
///
/// Element-level problems never surface here; they are reported as
/// [`ErrorItem`](crate::config::ErrorItem)s of an otherwise successful pass.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to open configuration file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed XML at {location}: {source}")]
    Xml {
        location: Location,
        source: quick_xml::Error,
    },
    #[error("malformed attribute at {location}: {source}")]
    Attribute {
        location: Location,
        source: quick_xml::events::attributes::AttrError,
    },
    #[error("invalid escape sequence at {location}: {source}")]
    Escape {
        location: Location,
        source: quick_xml::escape::EscapeError,
    },
    #[error("text at {location} is not valid UTF-8: {source}")]
    Decode {
        location: Location,
        source: std::str::Utf8Error,
    },
    #[error("ill-formed document at {location}: {message}")]
    IllFormed { location: Location, message: String },
    #[error("document has no root element")]
    NoRootElement,
    #[error("failed to install logger: {0}")]
    SetLogger(SetLoggerError),
}

impl From<SetLoggerError> for ConfigError {
    fn from(value: SetLoggerError) -> Self {
        ConfigError::SetLogger(value)
    }
}

impl ConfigError {
    /// The location where the document stopped being readable, if known.
    pub fn location(&self) -> Option<Location> {
        match self {
            ConfigError::Xml { location, .. }
            | ConfigError::Attribute { location, .. }
            | ConfigError::Escape { location, .. }
            | ConfigError::Decode { location, .. }
            | ConfigError::IllFormed { location, .. } => Some(*location),
            _ => None,
        }
    }
}
