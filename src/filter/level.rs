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

use log::Metadata;

use crate::filter::Filter;
use crate::filter::FilterResult;

/// A filter rejecting records more verbose than a maximum level.
///
/// From least to most verbose, the levels are `Error`, `Warn`, `Info`, `Debug` and `Trace`. If
/// the filter is set to `Info`, it lets `Error`, `Warn`, and `Info` records through. If it is
/// set to `Off`, it rejects all records.
///
/// Records within the level are left to the next filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelFilter(log::LevelFilter);

impl LevelFilter {
    pub fn new(level: log::LevelFilter) -> Self {
        LevelFilter(level)
    }

    pub fn level(&self) -> log::LevelFilter {
        self.0
    }

    pub(crate) fn enabled(&self, metadata: &Metadata) -> FilterResult {
        if metadata.level() <= self.0 {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}

impl From<LevelFilter> for Filter {
    fn from(filter: LevelFilter) -> Self {
        Filter::Level(filter)
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    #[test]
    fn test_level_filter() {
        let filter = LevelFilter::new(log::LevelFilter::Info);
        let metadata = |level| Metadata::builder().level(level).build();
        assert_eq!(filter.enabled(&metadata(Level::Warn)), FilterResult::Neutral);
        assert_eq!(filter.enabled(&metadata(Level::Info)), FilterResult::Neutral);
        assert_eq!(filter.enabled(&metadata(Level::Debug)), FilterResult::Reject);

        let off = LevelFilter::new(log::LevelFilter::Off);
        assert_eq!(off.enabled(&metadata(Level::Error)), FilterResult::Reject);
    }
}
