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

use crate::filter::Filter;
use crate::filter::FilterResult;

/// A filter deciding on records whose message contains a string.
///
/// Matching records are accepted, or rejected if `accept_on_match` is unset. Other records are
/// left to the next filter. An empty string matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringMatchFilter {
    pub(crate) needle: String,
    pub(crate) accept_on_match: bool,
}

impl Default for StringMatchFilter {
    fn default() -> Self {
        Self {
            needle: String::new(),
            accept_on_match: true,
        }
    }
}

impl StringMatchFilter {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            accept_on_match: true,
        }
    }

    pub fn accept_on_match(mut self, accept_on_match: bool) -> Self {
        self.accept_on_match = accept_on_match;
        self
    }

    pub(crate) fn matches(&self, record: &log::Record) -> FilterResult {
        if self.needle.is_empty() {
            return FilterResult::Neutral;
        }
        let matched = match record.args().as_str() {
            Some(message) => message.contains(&self.needle),
            None => record.args().to_string().contains(&self.needle),
        };
        match (matched, self.accept_on_match) {
            (false, _) => FilterResult::Neutral,
            (true, true) => FilterResult::Accept,
            (true, false) => FilterResult::Reject,
        }
    }
}

impl From<StringMatchFilter> for Filter {
    fn from(filter: StringMatchFilter) -> Self {
        Filter::StringMatch(filter)
    }
}
