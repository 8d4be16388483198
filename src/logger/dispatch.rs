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
use log::Record;

use crate::append::Append;
use crate::filter::Filter;
use crate::filter::FilterResult;

/// A named appender together with the filters guarding it.
///
/// `filters` decide whether a record reaches the appender: the first filter returning a
/// non-neutral result wins, and a record no filter decides on is appended.
#[derive(Debug)]
pub struct Dispatch {
    name: String,
    filters: Vec<Filter>,
    append: Box<dyn Append>,
}

impl Dispatch {
    pub fn new(name: impl Into<String>, append: impl Into<Box<dyn Append>>) -> Self {
        Self {
            name: name.into(),
            filters: vec![],
            append: append.into(),
        }
    }

    /// Adds a [`Filter`] after the existing ones.
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn enabled(&self, metadata: &Metadata) -> bool {
        for filter in &self.filters {
            match filter.enabled(metadata) {
                FilterResult::Reject => return false,
                FilterResult::Accept => return true,
                FilterResult::Neutral => {}
            }
        }

        true
    }

    pub(crate) fn log(&self, record: &Record) -> anyhow::Result<()> {
        for filter in &self.filters {
            match filter.matches(record) {
                FilterResult::Reject => return Ok(()),
                FilterResult::Accept => break,
                FilterResult::Neutral => {}
            }
        }

        self.append.append(record)
    }

    pub(crate) fn flush(&self) {
        self.append.flush();
    }
}
