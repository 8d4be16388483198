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

use std::sync::Arc;

use anyhow::bail;
use log::LevelFilter;

use crate::config::Configurable;
use crate::config::parse_bool;
use crate::config::parse_level;
use crate::logger::Dispatch;
use crate::logger::LoggerRepository;

/// A logger of a [`LoggerRepository`] being configured.
#[derive(Debug, Clone)]
pub struct LoggerHandle {
    repository: LoggerRepository,
    name: Option<String>,
}

impl LoggerHandle {
    pub(crate) fn new(repository: LoggerRepository, name: Option<String>) -> Self {
        Self { repository, name }
    }

    /// The logger name, `None` for the root logger.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.name.is_none()
    }

    pub fn repository(&self) -> &LoggerRepository {
        &self.repository
    }

    /// Sets the level from its name.
    ///
    /// `inherited` and `null` clear the level so that the parent's applies. The root logger has
    /// no parent and rejects them.
    pub fn set_level_value(&self, value: &str) -> anyhow::Result<()> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("inherited") || value.eq_ignore_ascii_case("null") {
            if self.is_root() {
                bail!("the root logger cannot inherit its level");
            }
            self.repository.set_level(self.name(), None);
            return Ok(());
        }
        self.set_level(parse_level(value)?);
        Ok(())
    }

    pub fn set_level(&self, level: LevelFilter) {
        self.repository.set_level(self.name(), Some(level));
    }

    pub fn set_additivity(&self, additive: bool) -> anyhow::Result<()> {
        match self.name() {
            Some(name) => self.repository.set_additivity(name, additive),
            None => bail!("the root logger has no additivity"),
        }
        Ok(())
    }

    pub fn add_dispatch(&self, dispatch: Arc<Dispatch>) {
        self.repository.add_dispatch(self.name(), dispatch);
    }

    pub fn clear_dispatches(&self) {
        self.repository.clear_dispatches(self.name());
    }
}

impl Configurable for LoggerHandle {
    fn properties(&self) -> &[&'static str] {
        &["level", "additivity"]
    }

    fn set_property(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        match name {
            "level" => self.set_level_value(value),
            "additivity" => self.set_additivity(parse_bool(value)?),
            _ => bail!("{} has no property named '{name}'", self.type_label()),
        }
    }
}
