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

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use anyhow::Context;
use anyhow::anyhow;

use crate::config::Action;
use crate::config::Attributes;
use crate::config::ElementPath;
use crate::config::ExecutionContext;

/// A fallback resolver consulted when no rule matches an element.
pub trait ImplicitAction: fmt::Debug {
    /// Returns an action for the innermost element of `path` if this resolver applies to it.
    fn resolve(
        &self,
        ctx: &ExecutionContext,
        path: &ElementPath,
        attributes: &Attributes,
    ) -> Option<Rc<dyn Action>>;
}

/// Wires unmatched elements into the object on top of the object stack.
///
/// An element whose name matches one of the object's
/// [properties](crate::config::Configurable::properties) sets that property from its `value`
/// attribute, or from its trimmed text content when the attribute is absent. The attribute wins
/// when both are given, and the text is ignored:
///
/// ```xml
/// <file>logs/app.log</file>
/// <append value="false"/>
/// ```
///
/// An element whose name matches one of the object's
/// [components](crate::config::Configurable::components) creates a nested component from its
/// `class` attribute. The component sits on the object stack while the element's children are
/// interpreted, so they can configure it in turn, and is attached to its parent on close:
///
/// ```xml
/// <layout class="pattern">
///   <conversionPattern>%d %p %c - %m</conversionPattern>
/// </layout>
/// ```
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct PropertyWiring {}

impl ImplicitAction for PropertyWiring {
    fn resolve(
        &self,
        ctx: &ExecutionContext,
        path: &ElementPath,
        _: &Attributes,
    ) -> Option<Rc<dyn Action>> {
        let name = path.last()?;
        let top = ctx.peek_object()?;
        if let Some(property) = top.find_property(name) {
            return Some(Rc::new(SetPropertyAction {
                property,
                value: RefCell::new(None),
                text: RefCell::new(String::new()),
            }));
        }
        if let Some(component) = top.find_component(name) {
            return Some(Rc::new(NestComponentAction { component }));
        }
        None
    }
}

/// Sets a simple property on the enclosing object when the element closes.
///
/// One instance is created per element, so accumulating text here is safe.
#[derive(Debug)]
struct SetPropertyAction {
    property: &'static str,
    value: RefCell<Option<String>>,
    text: RefCell<String>,
}

impl Action for SetPropertyAction {
    fn begin(
        &self,
        _: &mut ExecutionContext,
        _: &str,
        attributes: &Attributes,
    ) -> anyhow::Result<()> {
        self.value.replace(attributes.get("value").map(str::to_string));
        Ok(())
    }

    fn text(&self, _: &mut ExecutionContext, text: &str) -> anyhow::Result<()> {
        self.text.borrow_mut().push_str(text);
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
        let text = self.text.take();
        let value = self.value.take().unwrap_or(text);
        let top = ctx
            .peek_object_mut()
            .ok_or_else(|| anyhow!("no object to set property '{}' on", self.property))?;
        log::debug!(
            target: "logwright::config",
            "setting {}.{} to '{}'",
            top.type_label(),
            self.property,
            value.trim()
        );
        top.set_property(self.property, value.trim())
            .with_context(|| format!("failed to set property '{}'", self.property))
    }
}

/// Creates, configures then attaches a nested component.
#[derive(Debug)]
struct NestComponentAction {
    component: &'static str,
}

impl Action for NestComponentAction {
    fn begin(
        &self,
        ctx: &mut ExecutionContext,
        _: &str,
        attributes: &Attributes,
    ) -> anyhow::Result<()> {
        let parent = ctx
            .peek_object_mut()
            .ok_or_else(|| anyhow!("no object to hold component '{}'", self.component))?;
        let nested = parent.create_component(self.component, attributes.get_non_empty("class"))?;
        log::debug!(
            target: "logwright::config",
            "created {} for {}.{}",
            nested.type_label(),
            parent.type_label(),
            self.component
        );
        ctx.push_boxed(nested);
        Ok(())
    }

    fn end(&self, ctx: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
        let nested = ctx
            .pop_object()
            .ok_or_else(|| anyhow!("component '{}' is missing", self.component))?;
        let parent = ctx
            .peek_object_mut()
            .ok_or_else(|| anyhow!("no object to attach component '{}' to", self.component))?;
        parent.attach_component(self.component, nested)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;
    use crate::config::Configurable;

    #[derive(Debug, Default)]
    struct Parent {
        suffix: String,
        child: Option<Child>,
    }

    impl Configurable for Parent {
        fn properties(&self) -> &[&'static str] {
            &["suffix"]
        }

        fn set_property(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
            match name {
                "suffix" => self.suffix = value.to_string(),
                _ => bail!("unknown property {name}"),
            }
            Ok(())
        }

        fn components(&self) -> &[&'static str] {
            &["child"]
        }

        fn create_component(
            &mut self,
            _: &str,
            class: Option<&str>,
        ) -> anyhow::Result<Box<dyn Configurable>> {
            match class {
                Some("child") | None => Ok(Box::new(Child::default())),
                Some(class) => bail!("unknown class '{class}'"),
            }
        }

        fn attach_component(
            &mut self,
            _: &str,
            component: Box<dyn Configurable>,
        ) -> anyhow::Result<()> {
            let child = component
                .downcast::<Child>()
                .ok_or_else(|| anyhow!("not a child"))?;
            self.child = Some(*child);
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Child {
        size: u32,
    }

    impl Configurable for Child {
        fn properties(&self) -> &[&'static str] {
            &["size"]
        }

        fn set_property(&mut self, _: &str, value: &str) -> anyhow::Result<()> {
            self.size = value.parse()?;
            Ok(())
        }
    }

    fn resolve(ctx: &ExecutionContext, name: &str) -> Option<Rc<dyn Action>> {
        PropertyWiring::default().resolve(ctx, &ElementPath::from([name]), &Attributes::new())
    }

    #[test]
    fn test_no_object_no_action() {
        let ctx = ExecutionContext::new();
        assert!(resolve(&ctx, "suffix").is_none());
    }

    #[test]
    fn test_set_property_from_text() {
        let mut ctx = ExecutionContext::new();
        ctx.push_object(Parent::default());
        assert!(resolve(&ctx, "prefix").is_none());

        let action = resolve(&ctx, "Suffix").unwrap();
        action.begin(&mut ctx, "Suffix", &Attributes::new()).unwrap();
        action.text(&mut ctx, "  hel").unwrap();
        action.text(&mut ctx, "lo\n").unwrap();
        action.end(&mut ctx, "Suffix").unwrap();
        assert_eq!(ctx.peek_object_as::<Parent>().unwrap().suffix, "hello");
    }

    #[test]
    fn test_set_property_from_value_attribute() {
        let mut ctx = ExecutionContext::new();
        ctx.push_object(Parent::default());

        let action = resolve(&ctx, "suffix").unwrap();
        let attributes = Attributes::from_iter([("value", "world")]);
        action.begin(&mut ctx, "suffix", &attributes).unwrap();
        action.end(&mut ctx, "suffix").unwrap();
        assert_eq!(ctx.peek_object_as::<Parent>().unwrap().suffix, "world");
    }

    #[test]
    fn test_value_attribute_wins_over_text() {
        let mut ctx = ExecutionContext::new();
        ctx.push_object(Parent::default());

        let action = resolve(&ctx, "suffix").unwrap();
        let attributes = Attributes::from_iter([("value", "a")]);
        action.begin(&mut ctx, "suffix", &attributes).unwrap();
        action.text(&mut ctx, "b").unwrap();
        action.end(&mut ctx, "suffix").unwrap();
        assert_eq!(ctx.peek_object_as::<Parent>().unwrap().suffix, "a");
    }

    #[test]
    fn test_nest_component() {
        let mut ctx = ExecutionContext::new();
        ctx.push_object(Parent::default());

        let nest = resolve(&ctx, "child").unwrap();
        let attributes = Attributes::from_iter([("class", "child")]);
        nest.begin(&mut ctx, "child", &attributes).unwrap();
        assert_eq!(ctx.object_stack_len(), 2);

        let size = resolve(&ctx, "size").unwrap();
        size.begin(&mut ctx, "size", &Attributes::new()).unwrap();
        size.text(&mut ctx, "42").unwrap();
        size.end(&mut ctx, "size").unwrap();

        nest.end(&mut ctx, "child").unwrap();
        assert_eq!(ctx.object_stack_len(), 1);
        let parent = ctx.peek_object_as::<Parent>().unwrap();
        assert_eq!(parent.child.as_ref().unwrap().size, 42);
    }

    #[test]
    fn test_nest_component_unknown_class() {
        let mut ctx = ExecutionContext::new();
        ctx.push_object(Parent::default());

        let nest = resolve(&ctx, "child").unwrap();
        let attributes = Attributes::from_iter([("class", "stranger")]);
        let err = nest.begin(&mut ctx, "child", &attributes).unwrap_err();
        assert_eq!(err.to_string(), "unknown class 'stranger'");
        assert_eq!(ctx.object_stack_len(), 1);
    }
}
