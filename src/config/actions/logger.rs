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
use anyhow::bail;

use crate::append::AppenderBuilder;
use crate::config::Action;
use crate::config::Attributes;
use crate::config::ExecutionContext;
use crate::config::actions::APPENDER_BAG;
use crate::config::actions::AppenderBag;
use crate::config::actions::required;
use crate::config::parse_bool;
use crate::logger::LoggerHandle;
use crate::logger::LoggerRepository;

fn repository(ctx: &ExecutionContext) -> anyhow::Result<LoggerRepository> {
    ctx.find_object_as::<LoggerRepository>()
        .cloned()
        .context("no logger repository to configure")
}

/// Configures a named logger, which stays on the object stack while its children run.
///
/// The logger loses the appenders of any earlier configuration, so that its `appender-ref`
/// children replace them. Additivity defaults to `true` when the attribute is absent.
#[derive(Debug)]
pub struct LoggerAction;

impl Action for LoggerAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        element: &str,
        attributes: &Attributes,
    ) -> anyhow::Result<()> {
        let name = required(attributes, "name", element)?;
        let additivity = attributes
            .get_non_empty("additivity")
            .map(parse_bool)
            .transpose()?
            .unwrap_or(true);
        let logger = repository(ctx)?.logger(name);
        logger.set_additivity(additivity)?;
        logger.clear_dispatches();
        ctx.push_object(logger);
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
        ctx.pop_object_as::<LoggerHandle>()?;
        Ok(())
    }
}

/// Configures the root logger, replacing the appenders of any earlier configuration.
#[derive(Debug)]
pub struct RootLoggerAction;

impl Action for RootLoggerAction {
    fn begin(&self, ctx: &mut ExecutionContext, _: &str, _: &Attributes) -> anyhow::Result<()> {
        let root = repository(ctx)?.root();
        root.clear_dispatches();
        ctx.push_object(root);
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
        ctx.pop_object_as::<LoggerHandle>()?;
        Ok(())
    }
}

/// Sets the level from the `value` attribute.
///
/// Inside a logger this is the logger level. Elsewhere it sets the `level` property of the
/// enclosing object, such as a level filter.
#[derive(Debug)]
pub struct LevelAction;

impl Action for LevelAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        element: &str,
        attributes: &Attributes,
    ) -> anyhow::Result<()> {
        let value = required(attributes, "value", element)?;
        let top = ctx
            .peek_object_mut()
            .with_context(|| format!("no object to set the level of in <{element}>"))?;
        if let Some(logger) = top.downcast_ref::<LoggerHandle>() {
            log::debug!(
                target: "logwright::config",
                "setting the level of {} to {value}",
                logger.name().unwrap_or("root")
            );
            return logger.set_level_value(value);
        }
        match top.find_property("level") {
            Some(property) => top.set_property(property, value),
            None => bail!("{} has no level", top.type_label()),
        }
    }

    fn end(&self, _: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Attaches an appender from the [`AppenderBag`] to the enclosing logger, or to the enclosing
/// appender when that appender holds others, like `async`.
#[derive(Debug)]
pub struct AppenderRefAction;

impl Action for AppenderRefAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        element: &str,
        attributes: &Attributes,
    ) -> anyhow::Result<()> {
        let name = required(attributes, "ref", element)?;
        let dispatch = ctx
            .get::<AppenderBag>(APPENDER_BAG)
            .and_then(|bag| bag.get(name))
            .cloned()
            .with_context(|| format!("appender named '{name}' is not defined"))?;
        let top = ctx
            .peek_object_mut()
            .with_context(|| format!("<{element}> is not inside a logger or an appender"))?;
        if let Some(logger) = top.downcast_ref::<LoggerHandle>() {
            logger.add_dispatch(dispatch);
            return Ok(());
        }
        match top.downcast_mut::<AppenderBuilder>() {
            Some(appender) => appender.add_appender(dispatch),
            None => bail!("<{element}> is not inside a logger or an appender"),
        }
    }

    fn end(&self, _: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
