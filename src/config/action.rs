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

use std::fmt;

use crate::config::Attributes;
use crate::config::ExecutionContext;

/// A unit of behavior bound to elements selected by a pattern.
///
/// The interpreter calls [`Action::begin`] when a matching element opens, [`Action::text`] for
/// its character content and [`Action::end`] when it closes. Nested elements are interpreted
/// between `begin` and `end`, so an action typically pushes the object it builds on the
/// context's object stack in `begin` and pops it in `end`.
///
/// Actions are shared by every element they match and may be invoked re-entrantly for nested
/// elements of the same name. Keep per-element state on the object stack rather than in the
/// action.
///
/// An error returned from `begin` makes the interpreter skip the element's subtree, and `end` is
/// not called for it. An error returned from `end` makes the interpreter skip the remaining
/// siblings of the element. Either way the error is recorded on the context and interpretation
/// continues.
pub trait Action: fmt::Debug {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        attributes: &Attributes,
    ) -> anyhow::Result<()>;

    fn text(&self, ctx: &mut ExecutionContext, text: &str) -> anyhow::Result<()> {
        let _ = (ctx, text);
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, name: &str) -> anyhow::Result<()>;
}
