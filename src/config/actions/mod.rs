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

//! The actions of the default rule set.
//!
//! ```xml
//! <configuration threshold="debug">
//!   <appender name="file" class="file">
//!     <file>${log.dir}/app.log</file>
//!     <layout class="pattern">
//!       <param name="conversionPattern" value="%d %-5p %c - %m%n"/>
//!     </layout>
//!   </appender>
//!   <appender name="background" class="async">
//!     <appender-ref ref="file"/>
//!   </appender>
//!   <logger name="app.db" additivity="false">
//!     <level value="trace"/>
//!     <appender-ref ref="file"/>
//!   </logger>
//!   <root>
//!     <priority value="info"/>
//!     <appender-ref ref="background"/>
//!   </root>
//! </configuration>
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;

use crate::config::Attributes;
use crate::config::RuleStore;
use crate::logger::Dispatch;

pub use self::appender::AppenderAction;
pub use self::configuration::ConfigurationAction;
pub use self::logger::AppenderRefAction;
pub use self::logger::LevelAction;
pub use self::logger::LoggerAction;
pub use self::logger::RootLoggerAction;
pub use self::param::ParamAction;

mod appender;
mod configuration;
mod logger;
mod param;

/// The registry key of the [`AppenderBag`].
pub const APPENDER_BAG: &str = "APPENDER_BAG";

/// The appenders built so far, by name.
pub type AppenderBag = HashMap<String, Arc<Dispatch>>;

/// The rules configuring a [`LoggerRepository`](crate::LoggerRepository).
///
/// Everything else, such as appender properties and layouts, is reached through
/// [`PropertyWiring`](crate::config::PropertyWiring).
pub fn default_rules() -> RuleStore {
    RuleStore::new()
        .rule("configuration", ConfigurationAction)
        .rule("configuration/appender", AppenderAction)
        .rule("configuration/appender/appender-ref", AppenderRefAction)
        .rule("configuration/logger", LoggerAction)
        .rule("configuration/category", LoggerAction)
        .rule("configuration/root", RootLoggerAction)
        .rule("*/level", LevelAction)
        .rule("*/priority", LevelAction)
        .rule("*/appender-ref", AppenderRefAction)
        .rule("*/param", ParamAction)
}

fn required<'a>(attributes: &'a Attributes, name: &str, element: &str) -> anyhow::Result<&'a str> {
    attributes
        .get_non_empty(name)
        .with_context(|| format!("missing attribute '{name}' in <{element}>"))
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;

    use super::*;
    use crate::config::ExecutionContext;
    use crate::config::Interpreter;
    use crate::config::PropertyWiring;
    use crate::config::XmlReader;
    use crate::logger::DEFAULT_ROOT_LEVEL;
    use crate::logger::LoggerRepository;

    fn interpret(repository: &LoggerRepository, document: &str) -> ExecutionContext {
        let mut context = ExecutionContext::new();
        context.push_object(repository.clone());
        context.insert(APPENDER_BAG, AppenderBag::new());
        let mut interpreter = Interpreter::with_context(default_rules(), context);
        interpreter.add_implicit_action(PropertyWiring::default());
        XmlReader::new().read_str(document, &mut interpreter).unwrap();
        interpreter.into_context()
    }

    fn messages(context: &ExecutionContext) -> Vec<&str> {
        context.errors().iter().map(|item| item.message()).collect()
    }

    #[test]
    fn test_full_document() {
        let repository = LoggerRepository::new();
        let context = interpret(
            &repository,
            r#"
            <configuration threshold="info">
              <appender name="out" class="testing">
                <layout class="pattern">
                  <param name="conversionPattern" value="%p %m"/>
                </layout>
                <filter class="level"><level value="warn"/></filter>
              </appender>
              <category name="app.db" additivity="false">
                <priority value="trace"/>
                <appender-ref ref="out"/>
              </category>
              <root>
                <level value="error"/>
                <appender-ref ref="out"/>
              </root>
            </configuration>
            "#,
        );

        assert!(context.errors().is_empty(), "{:?}", context.errors());
        assert_eq!(context.object_stack_len(), 1);
        assert_eq!(repository.threshold(), LevelFilter::Info);
        assert_eq!(repository.level(Some("app::db")), Some(LevelFilter::Trace));
        assert!(!repository.additivity("app::db"));
        assert_eq!(repository.level(None), Some(LevelFilter::Error));
        assert_eq!(repository.dispatch_names(Some("app::db")), ["out"]);
        assert_eq!(repository.dispatch_names(None), ["out"]);
        assert!(context.get::<AppenderBag>(APPENDER_BAG).unwrap().contains_key("out"));
    }

    #[test]
    fn test_configure_twice_replaces_appenders() {
        let repository = LoggerRepository::new();
        let document = |additivity: &str| {
            format!(
                r#"<configuration>
                     <appender name="out" class="testing"/>
                     <logger name="app" {additivity}><appender-ref ref="out"/></logger>
                     <root><appender-ref ref="out"/></root>
                   </configuration>"#
            )
        };

        let context = interpret(&repository, &document(r#"additivity="false""#));
        assert!(context.errors().is_empty(), "{:?}", context.errors());
        assert!(!repository.additivity("app"));

        let context = interpret(&repository, &document(""));
        assert!(context.errors().is_empty(), "{:?}", context.errors());
        assert_eq!(repository.dispatch_names(None), ["out"]);
        assert_eq!(repository.dispatch_names(Some("app")), ["out"]);
        assert!(repository.additivity("app"));
    }

    #[test]
    fn test_async_appender_holds_appender_refs() {
        let repository = LoggerRepository::new();
        let context = interpret(
            &repository,
            r#"
            <configuration>
              <appender name="out" class="testing">
                <filter class="LevelRangeFilter">
                  <param name="LevelMin" value="info"/>
                  <param name="LevelMax" value="warn"/>
                </filter>
              </appender>
              <appender name="background" class="org.apache.log4j.AsyncAppender">
                <param name="BufferSize" value="16"/>
                <appender-ref ref="out"/>
              </appender>
              <root><appender-ref ref="background"/></root>
              <appender name="lonely" class="async"/>
            </configuration>
            "#,
        );

        assert_eq!(messages(&context), ["exception in action for element <appender>"]);
        let cause = format!("{:#}", context.errors()[0].cause().unwrap());
        assert!(cause.ends_with("appender 'lonely' has no appender to forward to"), "{cause}");
        assert_eq!(repository.dispatch_names(None), ["background"]);
    }

    #[test]
    fn test_appender_ref_in_plain_appender() {
        let repository = LoggerRepository::new();
        let context = interpret(
            &repository,
            r#"
            <configuration>
              <appender name="out" class="testing"/>
              <appender name="other" class="testing">
                <appender-ref ref="out"/>
              </appender>
            </configuration>
            "#,
        );

        assert_eq!(messages(&context), ["exception in action for element <appender-ref>"]);
        let cause = context.errors()[0].cause().unwrap().to_string();
        assert_eq!(cause, "appender 'other' cannot hold other appenders");
    }

    #[test]
    fn test_pattern_width_overflow_is_an_error_item() {
        let repository = LoggerRepository::new();
        let context = interpret(
            &repository,
            r#"
            <configuration>
              <appender name="out" class="testing">
                <layout class="pattern">
                  <conversionPattern>%99999999999999999999999p %m</conversionPattern>
                </layout>
              </appender>
            </configuration>
            "#,
        );

        assert!(!context.errors().is_empty());
        let rendered = format!("{:#}", context.errors()[0].cause().unwrap());
        assert!(rendered.contains("width too large"), "{rendered}");
    }

    #[test]
    fn test_missing_attributes() {
        let repository = LoggerRepository::new();
        let context = interpret(
            &repository,
            r#"
            <configuration>
              <appender class="testing"/>
              <logger><level value="info"/></logger>
              <root><level/></root>
            </configuration>
            "#,
        );

        assert_eq!(
            messages(&context),
            [
                "exception in action for element <appender>",
                "exception in action for element <logger>",
                "exception in action for element <level>",
            ]
        );
        let cause = context.errors()[0].cause().unwrap().to_string();
        assert_eq!(cause, "missing attribute 'name' in <appender>");
        assert_eq!(repository.level(None), Some(LevelFilter::Debug));
    }

    #[test]
    fn test_undefined_appender_ref() {
        let repository = LoggerRepository::new();
        let context = interpret(
            &repository,
            r#"
            <configuration>
              <root>
                <appender-ref ref="missing"/>
                <level value="warn"/>
              </root>
            </configuration>
            "#,
        );

        assert_eq!(messages(&context), ["exception in action for element <appender-ref>"]);
        let cause = context.errors()[0].cause().unwrap().to_string();
        assert_eq!(cause, "appender named 'missing' is not defined");
        assert_eq!(repository.level(None), Some(LevelFilter::Warn));
    }

    #[test]
    fn test_broken_appender_skips_remaining_siblings() {
        let repository = LoggerRepository::new();
        let context = interpret(
            &repository,
            r#"
            <configuration>
              <appender name="file" class="file"/>
              <root><level value="warn"/></root>
            </configuration>
            "#,
        );

        assert_eq!(messages(&context), ["exception in action for element <appender>"]);
        assert_eq!(repository.level(None), Some(DEFAULT_ROOT_LEVEL));
        assert!(context.get::<AppenderBag>(APPENDER_BAG).unwrap().is_empty());
    }

    #[test]
    fn test_reset() {
        let repository = LoggerRepository::new();
        repository.set_level(Some("old"), Some(LevelFilter::Off));
        let context = interpret(&repository, r#"<configuration reset="true"/>"#);
        assert!(context.errors().is_empty());
        assert_eq!(repository.level(Some("old")), None);
    }

    #[test]
    fn test_param_on_layout_and_unknown_param() {
        let repository = LoggerRepository::new();
        let context = interpret(
            &repository,
            r#"
            <configuration>
              <appender name="out" class="console">
                <param name="target" value="System.err"/>
                <param name="color" value="false"/>
              </appender>
            </configuration>
            "#,
        );

        assert_eq!(messages(&context), ["exception in action for element <param>"]);
        let cause = context.errors()[0].cause().unwrap().to_string();
        assert_eq!(cause, "AppenderBuilder has no property named 'color'");
        assert!(context.get::<AppenderBag>(APPENDER_BAG).unwrap().contains_key("out"));
    }
}
