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

use anyhow::Context;

use crate::config::Action;
use crate::config::Attributes;
use crate::config::ExecutionContext;
use crate::config::parse_bool;
use crate::config::parse_level;
use crate::logger::LoggerRepository;

/// Handles the document root.
///
/// `reset="true"` clears the repository before anything else is configured, and
/// `threshold="<level>"` caps the verbosity of every logger.
#[derive(Debug)]
pub struct ConfigurationAction;

impl Action for ConfigurationAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        _: &str,
        attributes: &Attributes,
    ) -> anyhow::Result<()> {
        let repository = ctx
            .find_object_as::<LoggerRepository>()
            .context("no logger repository to configure")?;

        if let Some(reset) = attributes.get_non_empty("reset") {
            if parse_bool(reset)? {
                log::debug!(target: "logwright::config", "resetting the logger repository");
                repository.reset();
            }
        }
        if let Some(threshold) = attributes.get_non_empty("threshold") {
            repository.set_threshold(parse_level(threshold)?);
        }
        Ok(())
    }

    fn end(&self, _: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
        log::debug!(target: "logwright::config", "end of configuration");
        Ok(())
    }
}
