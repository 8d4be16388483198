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

use anyhow::bail;

use crate::config::Configurable;
use crate::config::parse_bool;
use crate::config::parse_level;
use crate::filter::EnvFilter;
use crate::filter::Filter;
use crate::filter::LevelFilter;
use crate::filter::LevelMatchFilter;
use crate::filter::LevelRangeFilter;
use crate::filter::StringMatchFilter;

/// A filter being configured from a document.
///
/// | class | filter | properties |
/// |---|---|---|
/// | `env` | [`EnvFilter`] | `directives` in the `target=level` syntax |
/// | `level` | [`LevelFilter`] | `level` |
/// | `level_range` | [`LevelRangeFilter`] | `level_min`, `level_max`, `accept_on_match` |
/// | `level_match` | [`LevelMatchFilter`] | `level_to_match`, `accept_on_match` |
/// | `string_match` | [`StringMatchFilter`] | `string_to_match`, `accept_on_match` |
/// | `deny_all` | [`Filter::DenyAll`] | |
///
/// Classes are matched like layout classes: `level_range`, `LevelRangeFilter` and
/// `org.apache.log4j.varia.LevelRangeFilter` all create a level range filter.
#[derive(Debug)]
pub enum FilterBuilder {
    /// An unset filter lets everything through.
    Env(Option<EnvFilter>),
    Level(log::LevelFilter),
    LevelRange(LevelRangeFilter),
    LevelMatch(LevelMatchFilter),
    StringMatch(StringMatchFilter),
    DenyAll,
}

impl FilterBuilder {
    pub fn from_class(class: &str) -> anyhow::Result<Self> {
        let short = class.rsplit('.').next().unwrap_or(class);
        let short = short.strip_suffix("Filter").unwrap_or(short);
        match short.replace(['_', '-'], "").to_ascii_lowercase().as_str() {
            "env" => Ok(FilterBuilder::Env(None)),
            "level" => Ok(FilterBuilder::Level(log::LevelFilter::Trace)),
            "levelrange" => Ok(FilterBuilder::LevelRange(LevelRangeFilter::default())),
            "levelmatch" => Ok(FilterBuilder::LevelMatch(LevelMatchFilter::default())),
            "stringmatch" => Ok(FilterBuilder::StringMatch(StringMatchFilter::default())),
            "denyall" => Ok(FilterBuilder::DenyAll),
            _ => bail!("unknown filter class '{class}'"),
        }
    }

    pub fn build(self) -> Filter {
        match self {
            FilterBuilder::Env(Some(filter)) => filter.into(),
            FilterBuilder::Env(None) => log::LevelFilter::Trace.into(),
            FilterBuilder::Level(level) => LevelFilter::new(level).into(),
            FilterBuilder::LevelRange(filter) => filter.into(),
            FilterBuilder::LevelMatch(filter) => filter.into(),
            FilterBuilder::StringMatch(filter) => filter.into(),
            FilterBuilder::DenyAll => Filter::DenyAll,
        }
    }
}

fn record_level(value: &str) -> anyhow::Result<log::Level> {
    match parse_level(value)?.to_level() {
        Some(level) => Ok(level),
        None => bail!("'{value}' is not the level of a record"),
    }
}

impl Configurable for FilterBuilder {
    fn properties(&self) -> &[&'static str] {
        match self {
            FilterBuilder::Env(_) => &["directives"],
            FilterBuilder::Level(_) => &["level"],
            FilterBuilder::LevelRange(_) => &["level_min", "level_max", "accept_on_match"],
            FilterBuilder::LevelMatch(_) => &["level_to_match", "accept_on_match"],
            FilterBuilder::StringMatch(_) => &["string_to_match", "accept_on_match"],
            FilterBuilder::DenyAll => &[],
        }
    }

    fn set_property(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        match (self, name) {
            (FilterBuilder::Env(filter), "directives") => *filter = Some(EnvFilter::parse(value)?),
            (FilterBuilder::Level(level), "level") => *level = parse_level(value)?,
            (FilterBuilder::LevelRange(filter), "level_min") => {
                filter.min = Some(record_level(value)?);
            }
            (FilterBuilder::LevelRange(filter), "level_max") => {
                filter.max = Some(record_level(value)?);
            }
            (FilterBuilder::LevelMatch(filter), "level_to_match") => {
                filter.level = Some(record_level(value)?);
            }
            (FilterBuilder::StringMatch(filter), "string_to_match") => {
                filter.needle = value.to_string();
            }
            (FilterBuilder::LevelRange(filter), "accept_on_match") => {
                filter.accept_on_match = parse_bool(value)?;
            }
            (FilterBuilder::LevelMatch(filter), "accept_on_match") => {
                filter.accept_on_match = parse_bool(value)?;
            }
            (FilterBuilder::StringMatch(filter), "accept_on_match") => {
                filter.accept_on_match = parse_bool(value)?;
            }
            (builder, name) => bail!("{} has no property named '{name}'", builder.type_label()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use log::Level;
    use log::Metadata;

    use super::*;
    use crate::filter::FilterResult;

    #[test]
    fn test_level_filter_class() {
        let mut builder = FilterBuilder::from_class("org.example.LevelFilter").unwrap();
        builder.set_property("level", "warn").unwrap();
        assert!(builder.set_property("directives", "info").is_err());

        let filter = builder.build();
        let metadata = Metadata::builder().level(Level::Info).build();
        assert_eq!(filter.enabled(&metadata), FilterResult::Reject);
    }

    #[test]
    fn test_env_filter_class() {
        let mut builder = FilterBuilder::from_class("env").unwrap();
        assert!(builder.set_property("directives", "app=nope").is_err());
        builder.set_property("directives", "app=debug").unwrap();

        let filter = builder.build();
        let metadata = Metadata::builder().target("app").level(Level::Debug).build();
        assert_eq!(filter.enabled(&metadata), FilterResult::Neutral);
    }

    #[test]
    fn test_level_range_class() {
        let mut builder = FilterBuilder::from_class("org.apache.log4j.varia.LevelRangeFilter")
            .unwrap();
        builder.set_property("level_min", "debug").unwrap();
        builder.set_property("level_max", "warn").unwrap();
        builder.set_property("accept_on_match", "true").unwrap();
        assert!(builder.set_property("level_max", "off").is_err());

        let filter = builder.build();
        let metadata = |level| Metadata::builder().level(level).build();
        assert_eq!(filter.enabled(&metadata(Level::Info)), FilterResult::Accept);
        assert_eq!(filter.enabled(&metadata(Level::Error)), FilterResult::Reject);
    }

    #[test]
    fn test_match_classes() {
        let mut builder = FilterBuilder::from_class("LevelMatchFilter").unwrap();
        builder.set_property("level_to_match", "error").unwrap();
        builder.set_property("accept_on_match", "false").unwrap();
        let filter = builder.build();
        let metadata = Metadata::builder().level(Level::Error).build();
        assert_eq!(filter.enabled(&metadata), FilterResult::Reject);

        let mut builder = FilterBuilder::from_class("string_match").unwrap();
        builder.set_property("string_to_match", "secret").unwrap();
        let filter = builder.build();
        let record = log::Record::builder().args(format_args!("a secret")).build();
        assert_eq!(filter.matches(&record), FilterResult::Accept);

        let filter = FilterBuilder::from_class("DenyAllFilter").unwrap().build();
        assert_eq!(filter.matches(&record), FilterResult::Reject);
    }

    #[test]
    fn test_unknown_class() {
        assert!(FilterBuilder::from_class("regex").is_err());
    }
}
