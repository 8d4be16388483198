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

use log::Level;
use log::Metadata;

use crate::filter::Filter;
use crate::filter::FilterResult;

/// A filter deciding on records of exactly one level.
///
/// Records of that level are accepted, or rejected if `accept_on_match` is unset. Other records
/// are left to the next filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelMatchFilter {
    pub(crate) level: Option<Level>,
    pub(crate) accept_on_match: bool,
}

impl Default for LevelMatchFilter {
    fn default() -> Self {
        Self {
            level: None,
            accept_on_match: true,
        }
    }
}

impl LevelMatchFilter {
    pub fn new(level: Level) -> Self {
        Self {
            level: Some(level),
            accept_on_match: true,
        }
    }

    pub fn accept_on_match(mut self, accept_on_match: bool) -> Self {
        self.accept_on_match = accept_on_match;
        self
    }

    pub(crate) fn enabled(&self, metadata: &Metadata) -> FilterResult {
        match self.level {
            Some(level) if level == metadata.level() => {
                if self.accept_on_match {
                    FilterResult::Accept
                } else {
                    FilterResult::Reject
                }
            }
            _ => FilterResult::Neutral,
        }
    }
}

impl From<LevelMatchFilter> for Filter {
    fn from(filter: LevelMatchFilter) -> Self {
        Filter::LevelMatch(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_match() {
        let metadata = |level| Metadata::builder().level(level).build();
        let filter = LevelMatchFilter::new(Level::Warn);
        assert_eq!(filter.enabled(&metadata(Level::Warn)), FilterResult::Accept);
        assert_eq!(filter.enabled(&metadata(Level::Error)), FilterResult::Neutral);

        let filter = filter.accept_on_match(false);
        assert_eq!(filter.enabled(&metadata(Level::Warn)), FilterResult::Reject);
        assert_eq!(
            LevelMatchFilter::default().enabled(&metadata(Level::Warn)),
            FilterResult::Neutral
        );
    }
}
