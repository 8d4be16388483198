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

use crate::config::Action;
use crate::config::Attributes;
use crate::config::ExecutionContext;
use crate::config::actions::required;

/// Sets the property `name` of the enclosing object to `value`.
#[derive(Debug)]
pub struct ParamAction;

impl Action for ParamAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        element: &str,
        attributes: &Attributes,
    ) -> anyhow::Result<()> {
        let name = required(attributes, "name", element)?;
        let value = attributes
            .get("value")
            .with_context(|| format!("missing attribute 'value' in <{element}>"))?;
        let Some(top) = ctx.peek_object_mut() else {
            bail!("no object to set '{name}' on");
        };
        match top.find_property(name) {
            Some(property) => top.set_property(property, value.trim()),
            None => bail!("{} has no property named '{name}'", top.type_label()),
        }
    }

    fn end(&self, _: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
