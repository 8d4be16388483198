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

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::rc::Rc;

use crate::config::ErrorItem;
use crate::config::ExecutionContext;
use crate::config::Interpreter;
use crate::config::PropertyWiring;
use crate::config::RecordedDocument;
use crate::config::RuleStore;
use crate::config::Trap;
use crate::config::XmlReader;
use crate::config::actions::APPENDER_BAG;
use crate::config::actions::AppenderBag;
use crate::config::actions::default_rules;
use crate::error::ConfigError;
use crate::logger::LoggerRepository;

/// Configures a [`LoggerRepository`] from an XML document.
///
/// By default the document is read and recorded in full before any action runs, so that a
/// malformed document leaves the repository untouched. With [`XmlConfigurator::two_phase`] set
/// to `false` actions run while the document streams in, and a syntax error stops the pass
/// midway.
///
/// # Examples
///
/// ```
/// use logwright::LoggerRepository;
/// use logwright::config::XmlConfigurator;
///
/// let repository = LoggerRepository::new();
/// let errors = XmlConfigurator::new()
///     .property("level", "warn")
///     .configure_str(
///         r#"<configuration><root><level value="${level}"/></root></configuration>"#,
///         &repository,
///     )
///     .unwrap();
/// assert!(errors.is_empty());
/// assert_eq!(repository.level(None), Some(log::LevelFilter::Warn));
/// ```
#[derive(Debug, Clone)]
pub struct XmlConfigurator {
    reader: XmlReader,
    two_phase: bool,
    traps: Vec<Rc<dyn Trap>>,
    rules: Option<RuleStore>,
}

impl Default for XmlConfigurator {
    fn default() -> Self {
        Self {
            reader: XmlReader::new(),
            two_phase: true,
            traps: vec![],
            rules: None,
        }
    }
}

impl XmlConfigurator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a property available to `${name}` references.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.reader = self.reader.property(name, value);
        self
    }

    /// Sets whether `${name}` references fall back to environment variables. Default to `true`.
    pub fn environment(mut self, environment: bool) -> Self {
        self.reader = self.reader.environment(environment);
        self
    }

    /// Sets whether the document is recorded before being interpreted. Default to `true`.
    pub fn two_phase(mut self, two_phase: bool) -> Self {
        self.two_phase = two_phase;
        self
    }

    /// Adds a trap observing the error items of each pass.
    pub fn trap(mut self, trap: impl Trap + 'static) -> Self {
        self.traps.push(Rc::new(trap));
        self
    }

    /// Replaces the [default rules](crate::config::default_rules).
    pub fn rules(mut self, rules: RuleStore) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Configures the repository from a document held in memory.
    pub fn configure_str(
        &self,
        document: &str,
        repository: &LoggerRepository,
    ) -> Result<Vec<ErrorItem>, ConfigError> {
        self.configure_reader(document.as_bytes(), repository)
    }

    pub fn configure_bytes(
        &self,
        document: &[u8],
        repository: &LoggerRepository,
    ) -> Result<Vec<ErrorItem>, ConfigError> {
        self.configure_reader(document, repository)
    }

    pub fn configure_path(
        &self,
        path: impl AsRef<Path>,
        repository: &LoggerRepository,
    ) -> Result<Vec<ErrorItem>, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(target: "logwright::config", "configuring from {}", path.display());
        self.configure_reader(BufReader::new(file), repository)
    }

    /// Runs a configuration pass.
    ///
    /// # Errors
    ///
    /// Returns an error only when the document cannot be read or is malformed. Element-level
    /// problems are returned as the error items of the pass, in document order.
    pub fn configure_reader(
        &self,
        source: impl BufRead,
        repository: &LoggerRepository,
    ) -> Result<Vec<ErrorItem>, ConfigError> {
        let mut context = ExecutionContext::new();
        context.push_object(repository.clone());
        context.insert(APPENDER_BAG, AppenderBag::new());

        let rules = self.rules.clone().unwrap_or_else(default_rules);
        let mut interpreter = Interpreter::with_context(rules, context);
        interpreter.add_implicit_action(PropertyWiring::default());

        if self.two_phase {
            let document = RecordedDocument::record(&self.reader, source)?;
            self.attach_traps(&mut interpreter);
            document.replay(&mut interpreter);
        } else {
            self.attach_traps(&mut interpreter);
            self.reader.read(source, &mut interpreter)?;
        }

        let mut context = interpreter.into_context();
        context.take_traps();
        let errors = context.take_errors();
        log::debug!(
            target: "logwright::config",
            "configuration pass finished with {} error(s)",
            errors.len()
        );
        Ok(errors)
    }

    fn attach_traps(&self, interpreter: &mut Interpreter) {
        for trap in &self.traps {
            interpreter.context_mut().add_trap(Box::new(trap.clone()));
        }
    }
}
