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

//! Directive filters in the [`env_filter`](https://crates.io/crates/env_filter) syntax.

use std::str::FromStr;

use log::LevelFilter;
use log::Metadata;

use crate::filter::Filter;
use crate::filter::FilterResult;

/// The environment variable consulted by [`EnvFilter::from_default_env`].
pub const DEFAULT_FILTER_ENV: &str = "LOGWRIGHT_FILTER";

/// A filter made of comma-separated `target=level` directives.
///
/// `info,my_app::db=trace` lets `info` and above through everywhere, and everything under
/// `my_app::db`. Records a directive rejects are dropped; the others are left to the next filter.
#[derive(Debug)]
pub struct EnvFilter(env_filter::Filter);

impl EnvFilter {
    pub fn new(mut builder: EnvFilterBuilder) -> Self {
        EnvFilter(builder.0.build())
    }

    /// Parses a directive string, failing on any invalid directive.
    pub fn parse(directives: &str) -> anyhow::Result<Self> {
        EnvFilterBuilder::new().try_parse(directives).map(EnvFilter::new)
    }

    /// Reads directives from [`DEFAULT_FILTER_ENV`], enabling nothing when it is unset.
    pub fn from_default_env() -> Self {
        EnvFilter::from_env(DEFAULT_FILTER_ENV)
    }

    /// Reads directives from the named environment variable.
    ///
    /// Invalid directives in the variable are skipped.
    pub fn from_env(name: &str) -> Self {
        let builder = EnvFilterBuilder::new();
        match std::env::var(name) {
            Ok(directives) => EnvFilter::new(builder.parse(&directives)),
            Err(_) => EnvFilter::new(builder),
        }
    }

    pub(crate) fn enabled(&self, metadata: &Metadata) -> FilterResult {
        if self.0.enabled(metadata) {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }

    pub(crate) fn matches(&self, record: &log::Record) -> FilterResult {
        if self.0.matches(record) {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}

impl From<EnvFilter> for Filter {
    fn from(filter: EnvFilter) -> Self {
        Filter::Env(filter)
    }
}

impl From<LevelFilter> for EnvFilter {
    fn from(filter: LevelFilter) -> Self {
        EnvFilter::new(EnvFilterBuilder::new().filter_level(filter))
    }
}

impl<'a> From<&'a str> for EnvFilter {
    fn from(filter: &'a str) -> Self {
        EnvFilter::new(EnvFilterBuilder::new().parse(filter))
    }
}

impl FromStr for EnvFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvFilter::parse(s)
    }
}

/// Accumulates directives before building an [`EnvFilter`].
#[derive(Default, Debug)]
pub struct EnvFilterBuilder(env_filter::Builder);

impl EnvFilterBuilder {
    pub fn new() -> Self {
        EnvFilterBuilder(env_filter::Builder::new())
    }

    /// Adds a directive for one module path.
    pub fn filter_module(mut self, module: &str, level: LevelFilter) -> Self {
        self.0.filter_module(module, level);
        self
    }

    /// Adds a directive for every module.
    pub fn filter_level(mut self, level: LevelFilter) -> Self {
        self.0.filter_level(level);
        self
    }

    pub fn try_parse(mut self, directives: &str) -> anyhow::Result<Self> {
        self.0.try_parse(directives)?;
        Ok(self)
    }

    pub fn parse(mut self, directives: &str) -> Self {
        self.0.parse(directives);
        self
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    fn metadata(target: &str, level: Level) -> Metadata<'_> {
        Metadata::builder().target(target).level(level).build()
    }

    #[test]
    fn test_directives() {
        let filter = EnvFilter::parse("warn,app::db=trace").unwrap();
        assert_eq!(
            filter.enabled(&metadata("app::db::pool", Level::Trace)),
            FilterResult::Neutral
        );
        assert_eq!(
            filter.enabled(&metadata("app::http", Level::Info)),
            FilterResult::Reject
        );
        assert_eq!(
            filter.enabled(&metadata("app::http", Level::Error)),
            FilterResult::Neutral
        );
    }

    #[test]
    fn test_invalid_directive() {
        assert!(EnvFilter::parse("app=loud").is_err());
    }
}
