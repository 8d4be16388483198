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

use anyhow::Context;

use crate::append::AppenderBuilder;
use crate::config::Action;
use crate::config::Attributes;
use crate::config::ExecutionContext;
use crate::config::actions::APPENDER_BAG;
use crate::config::actions::AppenderBag;
use crate::config::actions::required;

/// Builds a named appender and adds it to the [`AppenderBag`].
///
/// The appender is opened when its element closes, once its properties, layout and filters are
/// set. Appenders must be defined before they are referenced.
#[derive(Debug)]
pub struct AppenderAction;

impl Action for AppenderAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        element: &str,
        attributes: &Attributes,
    ) -> anyhow::Result<()> {
        let name = required(attributes, "name", element)?;
        let class = required(attributes, "class", element)?;
        let builder = AppenderBuilder::from_class(name, class)?;
        log::debug!(target: "logwright::config", "configuring appender '{name}' of class {class}");
        ctx.push_object(builder);
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
        let builder = ctx.pop_object_as::<AppenderBuilder>()?;
        let name = builder.name().to_string();
        let dispatch = builder
            .build()
            .with_context(|| format!("failed to build appender '{name}'"))?;
        let bag = ctx.get_or_default::<AppenderBag>(APPENDER_BAG)?;
        if bag.insert(name.clone(), Arc::new(dispatch)).is_some() {
            log::warn!(target: "logwright::config", "appender '{name}' is defined twice");
        }
        Ok(())
    }
}
