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

//! Filters for log records.

use std::str::FromStr;

pub use self::builder::FilterBuilder;
pub use self::env_filter::EnvFilter;
pub use self::env_filter::EnvFilterBuilder;
pub use self::level::LevelFilter;
pub use self::level_match::LevelMatchFilter;
pub use self::level_range::LevelRangeFilter;
pub use self::string_match::StringMatchFilter;

mod builder;
pub mod env_filter;
mod level;
mod level_match;
mod level_range;
mod string_match;

/// The result of a filter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// The record will be processed without further filtering.
    Accept,
    /// The record should not be processed.
    Reject,
    /// No decision could be made, further filtering should occur.
    Neutral,
}

/// Represents a filter that can be applied to log records.
#[derive(Debug)]
pub enum Filter {
    /// An env_logger filter.
    Env(EnvFilter),
    /// A maximum verbosity.
    Level(LevelFilter),
    /// A range of levels.
    LevelRange(LevelRangeFilter),
    /// A single level.
    LevelMatch(LevelMatchFilter),
    /// A string in the message.
    StringMatch(StringMatchFilter),
    /// Rejects every record.
    DenyAll,
}

impl Filter {
    pub(crate) fn enabled(&self, metadata: &log::Metadata) -> FilterResult {
        match self {
            Filter::Env(filter) => filter.enabled(metadata),
            Filter::Level(filter) => filter.enabled(metadata),
            Filter::LevelRange(filter) => filter.enabled(metadata),
            Filter::LevelMatch(filter) => filter.enabled(metadata),
            // the message is not known yet, so the record may pass
            Filter::StringMatch(_) => FilterResult::Accept,
            Filter::DenyAll => FilterResult::Reject,
        }
    }

    pub(crate) fn matches(&self, record: &log::Record) -> FilterResult {
        match self {
            Filter::Env(filter) => filter.matches(record),
            Filter::Level(filter) => filter.enabled(record.metadata()),
            Filter::LevelRange(filter) => filter.enabled(record.metadata()),
            Filter::LevelMatch(filter) => filter.enabled(record.metadata()),
            Filter::StringMatch(filter) => filter.matches(record),
            Filter::DenyAll => FilterResult::Reject,
        }
    }
}

impl From<log::LevelFilter> for Filter {
    fn from(filter: log::LevelFilter) -> Self {
        Filter::Level(LevelFilter::new(filter))
    }
}

impl<'a> From<&'a str> for Filter {
    fn from(filter: &'a str) -> Self {
        EnvFilter::from(filter).into()
    }
}

impl FromStr for Filter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvFilter::from_str(s).map(Into::into)
    }
}
