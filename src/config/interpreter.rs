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

use std::rc::Rc;

use crate::config::Action;
use crate::config::Attributes;
use crate::config::ElementPath;
use crate::config::ErrorItem;
use crate::config::EventHandler;
use crate::config::ExecutionContext;
use crate::config::ImplicitAction;
use crate::config::Location;
use crate::config::RuleStore;
use crate::config::SaxEvent;

const TARGET: &str = "logwright::config";

/// The recovery mode of the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    None,
    /// An element at this depth failed to open; its subtree is ignored.
    Descendants(usize),
    /// An element failed to close; the remaining children of the parent at this depth are
    /// ignored.
    Siblings(usize),
}

/// A streaming interpreter turning document events into action invocations.
///
/// The interpreter tracks the path of open elements and, in parallel, the action bound to each
/// of them. Element-level failures never abort the pass:
///
/// * when no action applies to an element, or its action fails to begin, the failure is
///   recorded and the element's whole subtree is skipped;
/// * when an action fails to end, the failure is recorded and the element's remaining siblings
///   are skipped until their parent closes. The parent itself ends normally.
///
/// An interpreter is good for a single configuration pass.
#[derive(Debug)]
pub struct Interpreter {
    rules: RuleStore,
    implicit_actions: Vec<Box<dyn ImplicitAction>>,
    context: ExecutionContext,
    path: ElementPath,
    // `None` marks an element that is skipped or has no action
    actions: Vec<Option<Rc<dyn Action>>>,
    skip: Skip,
}

impl Interpreter {
    pub fn new(rules: RuleStore) -> Self {
        Self::with_context(rules, ExecutionContext::new())
    }

    /// Creates an interpreter continuing from an already populated context.
    pub fn with_context(rules: RuleStore, context: ExecutionContext) -> Self {
        Self {
            rules,
            implicit_actions: Vec::new(),
            context,
            path: ElementPath::new(),
            actions: Vec::new(),
            skip: Skip::None,
        }
    }

    /// Adds a fallback resolver, consulted after the ones added before it.
    pub fn add_implicit_action(&mut self, implicit: impl ImplicitAction + 'static) {
        self.implicit_actions.push(Box::new(implicit));
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    pub fn into_context(self) -> ExecutionContext {
        self.context
    }

    /// The path of currently open elements.
    pub fn path(&self) -> &ElementPath {
        &self.path
    }

    /// Interprets a single event.
    pub fn handle_event(&mut self, event: &SaxEvent) {
        self.context.set_location(event.location());
        match event {
            SaxEvent::Start {
                name,
                attributes,
                location,
            } => self.start_element(name, attributes, *location),
            SaxEvent::Text { text, location } => self.characters(text, *location),
            SaxEvent::End { name, location } => self.end_element(name, *location),
        }
    }

    fn start_element(&mut self, name: &str, attributes: &Attributes, location: Option<Location>) {
        self.path.push(name);

        if self.skip != Skip::None {
            self.actions.push(None);
            return;
        }

        let Some(action) = self.lookup(attributes) else {
            log::warn!(
                target: TARGET,
                "no applicable action for <{name}>, current pattern is {}",
                self.path
            );
            self.context.add_error(
                ErrorItem::new(format!(
                    "no applicable action for <{name}>, current pattern is {}",
                    self.path
                ))
                .with_location(location),
            );
            self.skip_descendants();
            return;
        };

        match action.begin(&mut self.context, name, attributes) {
            Ok(()) => self.actions.push(Some(action)),
            Err(err) => {
                self.context.add_error(
                    ErrorItem::new(format!("exception in action for element <{name}>"))
                        .with_cause(err)
                        .with_location(location),
                );
                self.skip_descendants();
            }
        }
    }

    fn characters(&mut self, text: &str, location: Option<Location>) {
        if self.skip != Skip::None {
            return;
        }
        let Some(Some(action)) = self.actions.last() else {
            return;
        };
        if let Err(err) = action.text(&mut self.context, text) {
            let name = self.path.last().unwrap_or_default();
            self.context.add_error(
                ErrorItem::new(format!("exception in action for text of element <{name}>"))
                    .with_cause(err)
                    .with_location(location),
            );
        }
    }

    fn end_element(&mut self, name: &str, location: Option<Location>) {
        let depth = self.path.depth();
        let action = self.actions.pop().flatten();

        match self.skip {
            Skip::Descendants(anchor) => {
                if depth == anchor {
                    log::debug!(target: TARGET, "leaving skipped element <{name}>");
                    self.skip = Skip::None;
                }
            }
            Skip::Siblings(anchor) if depth > anchor => {}
            Skip::Siblings(_) | Skip::None => {
                if self.skip != Skip::None {
                    log::debug!(target: TARGET, "resuming at the close of <{name}>");
                    self.skip = Skip::None;
                }
                if let Some(action) = action {
                    if let Err(err) = action.end(&mut self.context, name) {
                        self.context.add_error(
                            ErrorItem::new(format!("exception in action for element <{name}>"))
                                .with_cause(err)
                                .with_location(location),
                        );
                        let parent = depth.saturating_sub(1);
                        log::debug!(
                            target: TARGET,
                            "skipping the remaining siblings of <{name}> at depth {parent}"
                        );
                        self.skip = Skip::Siblings(parent);
                    }
                }
            }
        }

        self.path.pop();
    }

    fn lookup(&self, attributes: &Attributes) -> Option<Rc<dyn Action>> {
        if let Some(action) = self.rules.resolve(&self.path) {
            return Some(action);
        }
        self.implicit_actions
            .iter()
            .find_map(|implicit| implicit.resolve(&self.context, &self.path, attributes))
    }

    fn skip_descendants(&mut self) {
        let depth = self.path.depth();
        log::debug!(target: TARGET, "skipping the subtree of {}", self.path);
        self.actions.push(None);
        self.skip = Skip::Descendants(depth);
    }
}

impl EventHandler for Interpreter {
    fn handle_event(&mut self, event: &SaxEvent) {
        Interpreter::handle_event(self, event);
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;
    use crate::config::Configurable;
    use crate::config::PropertyWiring;

    #[derive(Debug)]
    struct Noop;

    impl Action for Noop {
        fn begin(&self, _: &mut ExecutionContext, _: &str, _: &Attributes) -> anyhow::Result<()> {
            Ok(())
        }

        fn end(&self, _: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Stores a greeting under the "hello" key.
    #[derive(Debug)]
    struct Hello;

    impl Action for Hello {
        fn begin(&self, _: &mut ExecutionContext, _: &str, _: &Attributes) -> anyhow::Result<()> {
            Ok(())
        }

        fn end(&self, ctx: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
            ctx.insert("hello", "Hello John Doe.".to_string());
            Ok(())
        }
    }

    /// Counts its invocations under the "touch" key.
    #[derive(Debug)]
    struct Touch;

    impl Action for Touch {
        fn begin(&self, _: &mut ExecutionContext, _: &str, _: &Attributes) -> anyhow::Result<()> {
            Ok(())
        }

        fn end(&self, ctx: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
            *ctx.get_or_default::<u32>("touch")? += 1;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct BadBegin;

    impl Action for BadBegin {
        fn begin(&self, _: &mut ExecutionContext, _: &str, _: &Attributes) -> anyhow::Result<()> {
            bail!("bad begin")
        }

        fn end(&self, _: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
            panic!("end must not be called after a failed begin")
        }
    }

    #[derive(Debug)]
    struct BadEnd;

    impl Action for BadEnd {
        fn begin(&self, _: &mut ExecutionContext, _: &str, _: &Attributes) -> anyhow::Result<()> {
            Ok(())
        }

        fn end(&self, _: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
            bail!("bad end")
        }
    }

    /// Collects the text of its element under the "text" key.
    #[derive(Debug)]
    struct CollectText;

    impl Action for CollectText {
        fn begin(&self, _: &mut ExecutionContext, _: &str, _: &Attributes) -> anyhow::Result<()> {
            Ok(())
        }

        fn text(&self, ctx: &mut ExecutionContext, text: &str) -> anyhow::Result<()> {
            ctx.get_or_default::<String>("text")?.push_str(text);
            Ok(())
        }

        fn end(&self, _: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Records the element names it ends, in order, under the "ended" key.
    #[derive(Debug)]
    struct Trace;

    impl Action for Trace {
        fn begin(&self, _: &mut ExecutionContext, _: &str, _: &Attributes) -> anyhow::Result<()> {
            Ok(())
        }

        fn end(&self, ctx: &mut ExecutionContext, name: &str) -> anyhow::Result<()> {
            ctx.get_or_default::<Vec<String>>("ended")?
                .push(name.to_string());
            Ok(())
        }
    }

    /// Feeds a compact document description to the interpreter.
    ///
    /// `<a>` opens, `</a>` closes and `<a/>` opens then closes an element. Anything else is text.
    fn run(interpreter: &mut Interpreter, doc: &str) {
        for token in tokenize(doc) {
            interpreter.handle_event(&token);
        }
    }

    fn tokenize(doc: &str) -> Vec<SaxEvent> {
        let mut events = Vec::new();
        let mut rest = doc;
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix('<') {
                let close = tail.find('>').unwrap();
                let tag = &tail[..close];
                if let Some(name) = tag.strip_prefix('/') {
                    events.push(SaxEvent::end(name));
                } else if let Some(name) = tag.strip_suffix('/') {
                    events.push(SaxEvent::start(name, Attributes::new()));
                    events.push(SaxEvent::end(name));
                } else {
                    events.push(SaxEvent::start(tag, Attributes::new()));
                }
                rest = &tail[close + 1..];
            } else {
                let next = rest.find('<').unwrap_or(rest.len());
                events.push(SaxEvent::text(&rest[..next]));
                rest = &rest[next..];
            }
        }
        events
    }

    fn touches(interpreter: &Interpreter) -> u32 {
        interpreter
            .context()
            .get::<u32>("touch")
            .copied()
            .unwrap_or(0)
    }

    fn ended(interpreter: &Interpreter) -> Vec<String> {
        interpreter
            .context()
            .get::<Vec<String>>("ended")
            .cloned()
            .unwrap_or_default()
    }

    #[test]
    fn test_begin_failure_skips_subtree() {
        let rules = RuleStore::new()
            .rule("test", Noop)
            .rule("test/badBegin", BadBegin)
            .rule("test/badBegin/touch", Touch)
            .rule("test/hello", Hello);
        let mut interpreter = Interpreter::new(rules);
        run(
            &mut interpreter,
            "<test><badBegin><touch/></badBegin><hello/></test>",
        );

        let ctx = interpreter.context();
        assert_eq!(ctx.get::<String>("hello").unwrap(), "Hello John Doe.");
        assert_eq!(touches(&interpreter), 0);
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(
            ctx.errors()[0].to_string(),
            r#"Reported error: "exception in action for element <badBegin>" with exception bad begin"#
        );
        assert_eq!(interpreter.path().depth(), 0);
    }

    #[test]
    fn test_end_failure_skips_later_siblings() {
        let rules = RuleStore::new()
            .rule("test", Noop)
            .rule("test/badEnd", BadEnd)
            .rule("test/badEnd/touch", Touch)
            .rule("test/hello", Hello);
        let mut interpreter = Interpreter::new(rules);
        run(
            &mut interpreter,
            "<test><badEnd><touch/><touch/></badEnd><hello/></test>",
        );

        let ctx = interpreter.context();
        assert_eq!(touches(&interpreter), 2);
        assert!(ctx.get::<String>("hello").is_none());
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.errors()[0].message(), "exception in action for element <badEnd>");
    }

    #[test]
    fn test_text_is_ignored_while_siblings_are_skipped() {
        let rules = RuleStore::new()
            .rule("a", CollectText)
            .rule("a/badEnd", BadEnd);
        let mut interpreter = Interpreter::new(rules);
        run(&mut interpreter, "<a>one<badEnd/>two</a>");

        let ctx = interpreter.context();
        assert_eq!(ctx.get::<String>("text").unwrap(), "one");
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(interpreter.path().depth(), 0);
    }

    #[test]
    fn test_unmatched_element_skips_subtree() {
        let rules = RuleStore::new()
            .rule("test", Noop)
            .rule("*/touch", Touch)
            .rule("test/hello", Hello);
        let mut interpreter = Interpreter::new(rules);
        run(
            &mut interpreter,
            "<test><unknown><touch/></unknown><hello/></test>",
        );

        let ctx = interpreter.context();
        assert_eq!(touches(&interpreter), 0);
        assert!(ctx.get::<String>("hello").is_some());
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(
            ctx.errors()[0].message(),
            "no applicable action for <unknown>, current pattern is [test/unknown]"
        );
    }

    #[test]
    fn test_failure_does_not_leak_into_other_branches() {
        let rules = RuleStore::new()
            .rule("root", Noop)
            .rule("root/a", Noop)
            .rule("root/a/badEnd", BadEnd)
            .rule("root/a/hello", Hello)
            .rule("root/b", Noop)
            .rule("*/touch", Touch);
        let mut interpreter = Interpreter::new(rules);
        run(
            &mut interpreter,
            "<root><a><badEnd/><hello/></a><b><touch/><touch/></b><touch/></root>",
        );

        let ctx = interpreter.context();
        assert!(ctx.get::<String>("hello").is_none());
        assert_eq!(touches(&interpreter), 3);
        assert_eq!(ctx.errors().len(), 1);
    }

    #[test]
    fn test_begin_failure_does_not_leak_into_siblings() {
        let rules = RuleStore::new()
            .rule("root", Noop)
            .rule("root/bad", BadBegin)
            .rule("*/touch", Touch);
        let mut interpreter = Interpreter::new(rules);
        run(
            &mut interpreter,
            "<root><bad><touch/><bad><touch/></bad></bad><touch/><bad/><touch/></root>",
        );

        assert_eq!(touches(&interpreter), 2);
        assert_eq!(interpreter.context().errors().len(), 2);
    }

    /// Both shapes of sibling skipping: which elements end, in order, and how many errors.
    #[test]
    fn test_skip_siblings_boundaries() {
        struct Case {
            doc: &'static str,
            ended: &'static [&'static str],
            errors: usize,
        }

        let cases = [
            // a later sibling of the failing element is skipped, the parent still ends
            Case {
                doc: "<x><badEnd/><y/></x>",
                ended: &["x"],
                errors: 1,
            },
            // an earlier sibling is unaffected
            Case {
                doc: "<x><y/><badEnd/></x>",
                ended: &["y", "x"],
                errors: 1,
            },
            // children of the failing element already ran, nested later siblings are skipped
            Case {
                doc: "<x><y/><badEnd><y/></badEnd><y><y/></y></x>",
                ended: &["y", "y", "x"],
                errors: 1,
            },
            // the skip ends with the parent, so the parent's own later siblings run
            Case {
                doc: "<r><x><badEnd/><y/></x><y/></r>",
                ended: &["x", "y", "r"],
                errors: 1,
            },
            // a failure nested deeper only affects its own parent
            Case {
                doc: "<r><x><y><badEnd/><y/></y><y/></x></r>",
                ended: &["y", "y", "x", "r"],
                errors: 1,
            },
            // a second failure after the skip ends is contained the same way
            Case {
                doc: "<r><x><badEnd/></x><x><badEnd/><y/></x><y/></r>",
                ended: &["x", "x", "y", "r"],
                errors: 2,
            },
        ];

        for case in cases {
            let rules = RuleStore::new()
                .rule("*/badEnd", BadEnd)
                .rule("*/x", Trace)
                .rule("*/y", Trace)
                .rule("r", Trace);
            let mut interpreter = Interpreter::new(rules);
            run(&mut interpreter, case.doc);

            assert_eq!(ended(&interpreter), case.ended, "ended for {}", case.doc);
            assert_eq!(
                interpreter.context().errors().len(),
                case.errors,
                "errors for {}",
                case.doc
            );
        }
    }

    #[derive(Debug, Default)]
    struct Greeter {
        suffix: String,
    }

    impl Configurable for Greeter {
        fn properties(&self) -> &[&'static str] {
            &["suffix"]
        }

        fn set_property(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
            match name {
                "suffix" => self.suffix = value.to_string(),
                _ => bail!("no property {name}"),
            }
            Ok(())
        }
    }

    /// Pushes a greeter on begin and stores its suffix under "suffix" on end.
    #[derive(Debug)]
    struct GreeterAction;

    impl Action for GreeterAction {
        fn begin(&self, ctx: &mut ExecutionContext, _: &str, _: &Attributes) -> anyhow::Result<()> {
            ctx.push_object(Greeter::default());
            Ok(())
        }

        fn end(&self, ctx: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
            let greeter = ctx.pop_object_as::<Greeter>()?;
            ctx.insert("suffix", greeter.suffix);
            Ok(())
        }
    }

    #[test]
    fn test_implicit_property_wiring() {
        let rules = RuleStore::new().rule("greeter", GreeterAction);
        let mut interpreter = Interpreter::new(rules);
        interpreter.add_implicit_action(PropertyWiring::default());
        run(&mut interpreter, "<greeter><suffix>hello</suffix></greeter>");

        let ctx = interpreter.context();
        assert!(ctx.errors().is_empty());
        assert_eq!(ctx.get::<String>("suffix").unwrap(), "hello");
        assert_eq!(ctx.object_stack_len(), 0);
    }

    #[test]
    fn test_implicit_unknown_property() {
        let rules = RuleStore::new().rule("greeter", GreeterAction);
        let mut interpreter = Interpreter::new(rules);
        interpreter.add_implicit_action(PropertyWiring::default());
        run(
            &mut interpreter,
            "<greeter><prefix>oops</prefix><suffix>hello</suffix></greeter>",
        );

        let ctx = interpreter.context();
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.get::<String>("suffix").unwrap(), "hello");
    }

    #[test]
    fn test_text_only_reaches_active_action() {
        #[derive(Debug)]
        struct Collect;

        impl Action for Collect {
            fn begin(&self, _: &mut ExecutionContext, _: &str, _: &Attributes) -> anyhow::Result<()> {
                Ok(())
            }

            fn text(&self, ctx: &mut ExecutionContext, text: &str) -> anyhow::Result<()> {
                ctx.get_or_default::<String>("text")?.push_str(text);
                Ok(())
            }

            fn end(&self, _: &mut ExecutionContext, _: &str) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let rules = RuleStore::new()
            .rule("a", Collect)
            .rule("a/bad", BadBegin);
        let mut interpreter = Interpreter::new(rules);
        run(&mut interpreter, "<a>one<bad>two</bad>three</a>");

        let ctx = interpreter.context();
        assert_eq!(ctx.get::<String>("text").unwrap(), "onethree");
    }
}
