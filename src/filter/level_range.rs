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

/// A filter rejecting records outside a range of levels.
///
/// `min` is the most verbose level let through and `max` the least verbose, so a range from
/// `Debug` to `Warn` rejects `Trace` and `Error` records. An unset bound is open.
///
/// Records within the range are accepted if `accept_on_match` is set, and left to the next
/// filter otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelRangeFilter {
    pub(crate) min: Option<Level>,
    pub(crate) max: Option<Level>,
    pub(crate) accept_on_match: bool,
}

impl LevelRangeFilter {
    pub fn new(min: Option<Level>, max: Option<Level>) -> Self {
        Self {
            min,
            max,
            accept_on_match: false,
        }
    }

    /// Accepts records within the range instead of leaving them to the next filter.
    pub fn accept_on_match(mut self, accept_on_match: bool) -> Self {
        self.accept_on_match = accept_on_match;
        self
    }

    pub(crate) fn enabled(&self, metadata: &Metadata) -> FilterResult {
        let level = metadata.level();
        if self.min.is_some_and(|min| level > min) || self.max.is_some_and(|max| level < max) {
            FilterResult::Reject
        } else if self.accept_on_match {
            FilterResult::Accept
        } else {
            FilterResult::Neutral
        }
    }
}

impl From<LevelRangeFilter> for Filter {
    fn from(filter: LevelRangeFilter) -> Self {
        Filter::LevelRange(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_range() {
        let metadata = |level| Metadata::builder().level(level).build();
        let filter = LevelRangeFilter::new(Some(Level::Debug), Some(Level::Warn));
        assert_eq!(filter.enabled(&metadata(Level::Trace)), FilterResult::Reject);
        assert_eq!(filter.enabled(&metadata(Level::Debug)), FilterResult::Neutral);
        assert_eq!(filter.enabled(&metadata(Level::Warn)), FilterResult::Neutral);
        assert_eq!(filter.enabled(&metadata(Level::Error)), FilterResult::Reject);

        let filter = LevelRangeFilter::new(None, Some(Level::Info)).accept_on_match(true);
        assert_eq!(filter.enabled(&metadata(Level::Trace)), FilterResult::Accept);
        assert_eq!(filter.enabled(&metadata(Level::Debug)), FilterResult::Accept);
        assert_eq!(filter.enabled(&metadata(Level::Warn)), FilterResult::Reject);
    }
}
