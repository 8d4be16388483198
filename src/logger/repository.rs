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

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use anyhow::bail;
use log::LevelFilter;
use log::Metadata;
use log::Record;

use crate::config::Configurable;
use crate::config::parse_level;
use crate::logger::Dispatch;
use crate::logger::LoggerHandle;

/// The level of the root logger until configured otherwise.
pub const DEFAULT_ROOT_LEVEL: LevelFilter = LevelFilter::Debug;

/// A hierarchy of named loggers, each with an optional level and its own dispatches.
///
/// Logger names are paths separated by `::` or `.`, so `app.db` and `app::db` name the same
/// logger, a child of `app`. A record logged with target `app::db::pool` is:
///
/// * dropped if its level is more verbose than the level of the nearest of `app::db::pool`,
///   `app::db`, `app` and the root logger having one, or than the repository threshold;
/// * otherwise sent to the dispatches of each of these loggers in turn, stopping after the
///   first one that is not additive.
///
/// Clones share the same hierarchy, so a repository can be reconfigured after it was installed
/// with [`LoggerRepository::apply`].
#[derive(Debug, Clone, Default)]
pub struct LoggerRepository {
    inner: Arc<RwLock<Hierarchy>>,
}

#[derive(Debug)]
struct Hierarchy {
    threshold: LevelFilter,
    root: LoggerConfig,
    loggers: HashMap<String, LoggerConfig>,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self {
            threshold: LevelFilter::Trace,
            root: LoggerConfig {
                level: Some(DEFAULT_ROOT_LEVEL),
                ..LoggerConfig::default()
            },
            loggers: HashMap::new(),
        }
    }
}

#[derive(Debug)]
struct LoggerConfig {
    level: Option<LevelFilter>,
    additive: bool,
    dispatches: Vec<Arc<Dispatch>>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: None,
            additive: true,
            dispatches: vec![],
        }
    }
}

impl Hierarchy {
    fn logger(&self, name: Option<&str>) -> Option<&LoggerConfig> {
        match name {
            None => Some(&self.root),
            Some(name) => self.loggers.get(&*normalize(name)),
        }
    }

    fn logger_mut(&mut self, name: Option<&str>) -> &mut LoggerConfig {
        match name {
            None => &mut self.root,
            Some(name) => self.loggers.entry(normalize(name).into_owned()).or_default(),
        }
    }

    fn effective_level(&self, target: &str) -> LevelFilter {
        let level = ancestors(target)
            .find_map(|name| self.loggers.get(name).and_then(|logger| logger.level))
            .or(self.root.level)
            .unwrap_or(DEFAULT_ROOT_LEVEL);
        level.min(self.threshold)
    }

    fn dispatches(&self, target: &str) -> Vec<Arc<Dispatch>> {
        let mut dispatches = vec![];
        for name in ancestors(target) {
            if let Some(logger) = self.loggers.get(name) {
                dispatches.extend(logger.dispatches.iter().cloned());
                if !logger.additive {
                    return dispatches;
                }
            }
        }
        dispatches.extend(self.root.dispatches.iter().cloned());
        dispatches
    }

    fn all_dispatches(&self) -> Vec<Arc<Dispatch>> {
        self.loggers
            .values()
            .chain(std::iter::once(&self.root))
            .flat_map(|logger| logger.dispatches.iter().cloned())
            .collect()
    }
}

fn normalize(name: &str) -> Cow<'_, str> {
    if name.contains('.') {
        Cow::Owned(name.replace('.', "::"))
    } else {
        Cow::Borrowed(name)
    }
}

/// `a::b::c`, `a::b`, `a`.
fn ancestors(name: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(name), |name| name.rfind("::").map(|at| &name[..at]))
}

impl LoggerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Hierarchy> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Hierarchy> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A handle on the root logger.
    pub fn root(&self) -> LoggerHandle {
        LoggerHandle::new(self.clone(), None)
    }

    /// A handle on the named logger. The logger is created on first modification.
    pub fn logger(&self, name: &str) -> LoggerHandle {
        LoggerHandle::new(self.clone(), Some(normalize(name).into_owned()))
    }

    /// Caps the verbosity of every logger.
    pub fn set_threshold(&self, threshold: LevelFilter) {
        self.write().threshold = threshold;
    }

    pub fn threshold(&self) -> LevelFilter {
        self.read().threshold
    }

    /// Sets the level of a logger, `None` naming the root logger.
    ///
    /// Clearing the level of a named logger makes it inherit its parent's. Clearing the level of
    /// the root logger restores [`DEFAULT_ROOT_LEVEL`].
    pub fn set_level(&self, name: Option<&str>, level: Option<LevelFilter>) {
        let mut hierarchy = self.write();
        let logger = hierarchy.logger_mut(name);
        logger.level = match name {
            None => Some(level.unwrap_or(DEFAULT_ROOT_LEVEL)),
            Some(_) => level,
        };
    }

    /// The level explicitly set on a logger, `None` naming the root logger.
    pub fn level(&self, name: Option<&str>) -> Option<LevelFilter> {
        self.read().logger(name).and_then(|logger| logger.level)
    }

    /// The level records of `target` are checked against, threshold included.
    pub fn effective_level(&self, target: &str) -> LevelFilter {
        self.read().effective_level(&normalize(target))
    }

    /// Sets whether the named logger forwards records to its parent's dispatches.
    pub fn set_additivity(&self, name: &str, additive: bool) {
        self.write().logger_mut(Some(name)).additive = additive;
    }

    pub fn additivity(&self, name: &str) -> bool {
        self.read()
            .logger(Some(name))
            .is_none_or(|logger| logger.additive)
    }

    /// Attaches a dispatch to a logger, `None` naming the root logger.
    pub fn add_dispatch(&self, name: Option<&str>, dispatch: Arc<Dispatch>) {
        self.write().logger_mut(name).dispatches.push(dispatch);
    }

    /// Flushes and detaches every dispatch of a logger, `None` naming the root logger.
    pub fn clear_dispatches(&self, name: Option<&str>) {
        let removed = std::mem::take(&mut self.write().logger_mut(name).dispatches);
        for dispatch in removed {
            dispatch.flush();
        }
    }

    /// The names of the dispatches attached to a logger, in attachment order.
    pub fn dispatch_names(&self, name: Option<&str>) -> Vec<String> {
        self.read()
            .logger(name)
            .map(|logger| {
                logger
                    .dispatches
                    .iter()
                    .map(|dispatch| dispatch.name().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Flushes and removes every dispatch, and restores default levels and additivity.
    pub fn reset(&self) {
        let previous = std::mem::take(&mut *self.write());
        for dispatch in previous.all_dispatches() {
            dispatch.flush();
        }
    }

    /// Installs a clone of this repository as the global logger.
    ///
    /// # Errors
    ///
    /// An error is returned if the global logger has already been set.
    pub fn apply(&self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(LevelFilter::Trace);
        Ok(())
    }
}

impl log::Log for LoggerRepository {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let target = normalize(metadata.target());
        let dispatches = {
            let hierarchy = self.read();
            if metadata.level() > hierarchy.effective_level(&target) {
                return false;
            }
            hierarchy.dispatches(&target)
        };
        dispatches.iter().any(|dispatch| dispatch.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        let target = normalize(record.target());
        let dispatches = {
            let hierarchy = self.read();
            if record.level() > hierarchy.effective_level(&target) {
                return;
            }
            hierarchy.dispatches(&target)
        };
        for dispatch in dispatches {
            if let Err(err) = dispatch.log(record) {
                handle_error(record, err);
            }
        }
    }

    fn flush(&self) {
        let dispatches = self.read().all_dispatches();
        for dispatch in dispatches {
            dispatch.flush();
        }
    }
}

impl Configurable for LoggerRepository {
    fn properties(&self) -> &[&'static str] {
        &["threshold"]
    }

    fn set_property(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        match name {
            "threshold" => self.set_threshold(parse_level(value)?),
            _ => bail!("{} has no property named '{name}'", self.type_label()),
        }
        Ok(())
    }
}

fn handle_error(record: &Record, error: anyhow::Error) {
    let Err(fallback_error) = write!(
        std::io::stderr(),
        r###"
Error perform logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error:#}
"###,
        args = record.args(),
        record = record,
        error = error,
    ) else {
        return;
    };

    panic!(
        r###"
Error performing stderr logging after error occurred during regular logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error:#}
    Fallback error: {fallback_error}
"###,
        args = record.args(),
        record = record,
        error = error,
        fallback_error = fallback_error,
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use log::Log;

    use super::*;
    use crate::append::Append;
    use crate::filter::LevelFilter as MaxLevel;

    #[derive(Debug, Clone, Default)]
    struct Collect(Arc<Mutex<Vec<String>>>);

    impl Collect {
        fn lines(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Append for Collect {
        fn append(&self, record: &Record) -> anyhow::Result<()> {
            self.0
                .lock()
                .unwrap()
                .push(format!("{} {}", record.target(), record.args()));
            Ok(())
        }
    }

    fn log(repo: &LoggerRepository, target: &str, level: log::Level, message: &str) {
        repo.log(
            &Record::builder()
                .args(format_args!("{message}"))
                .target(target)
                .level(level)
                .build(),
        );
    }

    fn collecting(repo: &LoggerRepository, name: Option<&str>, dispatch: &str) -> Collect {
        let collect = Collect::default();
        repo.add_dispatch(name, Arc::new(Dispatch::new(dispatch, collect.clone())));
        collect
    }

    #[test]
    fn test_effective_level() {
        let repo = LoggerRepository::new();
        assert_eq!(repo.effective_level("app"), DEFAULT_ROOT_LEVEL);

        repo.set_level(Some("app"), Some(LevelFilter::Warn));
        repo.set_level(Some("app.db"), Some(LevelFilter::Trace));
        assert_eq!(repo.effective_level("app::http"), LevelFilter::Warn);
        assert_eq!(repo.effective_level("app::db::pool"), LevelFilter::Trace);
        assert_eq!(repo.effective_level("application"), DEFAULT_ROOT_LEVEL);

        repo.set_threshold(LevelFilter::Info);
        assert_eq!(repo.effective_level("app::db::pool"), LevelFilter::Info);

        repo.set_level(Some("app::db"), None);
        repo.set_threshold(LevelFilter::Trace);
        assert_eq!(repo.effective_level("app::db::pool"), LevelFilter::Warn);
    }

    #[test]
    fn test_root_level_cannot_be_cleared() {
        let repo = LoggerRepository::new();
        repo.set_level(None, Some(LevelFilter::Error));
        assert_eq!(repo.level(None), Some(LevelFilter::Error));
        repo.set_level(None, None);
        assert_eq!(repo.level(None), Some(DEFAULT_ROOT_LEVEL));
    }

    #[test]
    fn test_additivity() {
        let repo = LoggerRepository::new();
        let root = collecting(&repo, None, "root");
        let app = collecting(&repo, Some("app"), "app");
        let db = collecting(&repo, Some("app::db"), "db");

        log(&repo, "app::db::pool", log::Level::Info, "one");
        assert_eq!(root.lines(), ["app::db::pool one"]);
        assert_eq!(app.lines(), ["app::db::pool one"]);
        assert_eq!(db.lines(), ["app::db::pool one"]);

        repo.set_additivity("app", false);
        assert!(!repo.additivity("app"));
        assert!(repo.additivity("app::db"));
        log(&repo, "app::db", log::Level::Info, "two");
        assert_eq!(root.lines().len(), 1);
        assert_eq!(app.lines().len(), 2);
        assert_eq!(db.lines().len(), 2);
    }

    #[test]
    fn test_level_gates_dispatches() {
        let repo = LoggerRepository::new();
        let root = collecting(&repo, None, "root");
        repo.set_level(Some("noisy"), Some(LevelFilter::Error));

        log(&repo, "noisy::module", log::Level::Warn, "dropped");
        log(&repo, "quiet", log::Level::Trace, "dropped");
        log(&repo, "quiet", log::Level::Debug, "kept");
        assert_eq!(root.lines(), ["quiet kept"]);

        let metadata = Metadata::builder()
            .target("noisy")
            .level(log::Level::Error)
            .build();
        assert!(repo.enabled(&metadata));
    }

    #[test]
    fn test_dispatch_filters() {
        let repo = LoggerRepository::new();
        let collect = Collect::default();
        let dispatch = Dispatch::new("filtered", collect.clone())
            .filter(MaxLevel::new(LevelFilter::Warn));
        repo.add_dispatch(None, Arc::new(dispatch));

        log(&repo, "app", log::Level::Info, "dropped");
        log(&repo, "app", log::Level::Warn, "kept");
        assert_eq!(collect.lines(), ["app kept"]);
    }

    #[test]
    fn test_clear_dispatches() {
        let repo = LoggerRepository::new();
        let root = collecting(&repo, None, "root");
        collecting(&repo, Some("app"), "app");
        repo.clear_dispatches(Some("app"));
        assert!(repo.dispatch_names(Some("app")).is_empty());
        assert_eq!(repo.dispatch_names(None), ["root"]);

        repo.clear_dispatches(None);
        log(&repo, "app", log::Level::Info, "dropped");
        assert!(root.lines().is_empty());
    }

    #[test]
    fn test_reset() {
        let repo = LoggerRepository::new();
        let root = collecting(&repo, None, "root");
        repo.set_level(Some("app"), Some(LevelFilter::Off));
        repo.set_threshold(LevelFilter::Error);
        assert_eq!(repo.dispatch_names(None), ["root"]);

        repo.reset();
        assert!(repo.dispatch_names(None).is_empty());
        assert_eq!(repo.level(Some("app")), None);
        assert_eq!(repo.threshold(), LevelFilter::Trace);

        log(&repo, "app", log::Level::Info, "lost");
        assert!(root.lines().is_empty());
    }

    #[test]
    fn test_threshold_property() {
        let mut repo = LoggerRepository::new();
        repo.set_property("threshold", "warn").unwrap();
        assert_eq!(repo.threshold(), LevelFilter::Warn);
        assert!(repo.set_property("threshold", "loud").is_err());
    }
}
