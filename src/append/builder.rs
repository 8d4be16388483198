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

use std::num::NonZeroU64;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::anyhow;
use anyhow::bail;

use crate::append::Append;
use crate::append::AsyncBuilder;
use crate::append::FileBuilder;
use crate::append::Overflow;
use crate::append::rolling_file::RollingFileBuilder;
use crate::append::rolling_file::Rotation;
use crate::append::Stderr;
use crate::append::Stdout;
use crate::append::Testing;
use crate::config::Configurable;
use crate::config::parse_bool;
use crate::filter::Filter;
use crate::filter::FilterBuilder;
use crate::layout::Layout;
use crate::layout::LayoutBuilder;
use crate::layout::TextLayout;
use crate::logger::Dispatch;

/// An appender being configured from a document.
///
/// | class | appender | properties |
/// |---|---|---|
/// | `console`, `stdout` | [`Stdout`], or [`Stderr`] with `target` set to `stderr` or `System.err` | `target` |
/// | `stderr` | [`Stderr`] | `target` |
/// | `file` | [`File`](crate::append::File) | `file` (required), `append`, `immediate_flush` |
/// | `rolling_file`, `rolling` | [`RollingFile`](crate::append::rolling_file::RollingFile) rolling over at 10MB with one backup | `file` (required), `append`, `rotation`, `date_pattern`, `max_file_size`, `max_backup_index` |
/// | `daily_rolling_file` | [`RollingFile`](crate::append::rolling_file::RollingFile) rolling over daily | same as `rolling_file` |
/// | `async` | [`Async`](crate::append::Async) forwarding to the appenders of its `appender-ref` children | `buffer_size`, `blocking` |
/// | `testing` | [`Testing`] | |
///
/// Classes are matched ignoring case, `_`, `-`, an optional package prefix and an optional
/// `Appender` suffix. Every appender holds any number of `filter` components, and all but `async`
/// an optional `layout`.
#[derive(Debug)]
pub struct AppenderBuilder {
    name: String,
    kind: AppenderKind,
    layout: Option<LayoutBuilder>,
    filters: Vec<Filter>,
}

#[derive(Debug)]
enum AppenderKind {
    Console {
        stderr: bool,
    },
    File {
        path: Option<PathBuf>,
        append: bool,
        immediate_flush: bool,
    },
    RollingFile {
        path: Option<PathBuf>,
        append: bool,
        rotation: Rotation,
        max_file_size: Option<NonZeroU64>,
        max_backup_index: Option<usize>,
    },
    Async {
        dispatches: Vec<Arc<Dispatch>>,
        buffer_size: usize,
        blocking: bool,
    },
    Testing,
}

const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_BUFFER_SIZE: usize = 128;

impl AppenderBuilder {
    pub fn from_class(name: impl Into<String>, class: &str) -> anyhow::Result<Self> {
        let short = class.rsplit('.').next().unwrap_or(class);
        let short = short.strip_suffix("Appender").unwrap_or(short);
        let kind = match short.replace(['_', '-'], "").to_ascii_lowercase().as_str() {
            "console" | "stdout" => AppenderKind::Console { stderr: false },
            "stderr" => AppenderKind::Console { stderr: true },
            "file" => AppenderKind::File {
                path: None,
                append: true,
                immediate_flush: true,
            },
            "rollingfile" | "rolling" => AppenderKind::RollingFile {
                path: None,
                append: true,
                rotation: Rotation::Never,
                max_file_size: NonZeroU64::new(DEFAULT_MAX_FILE_SIZE),
                max_backup_index: Some(1),
            },
            "dailyrollingfile" => AppenderKind::RollingFile {
                path: None,
                append: true,
                rotation: Rotation::Daily,
                max_file_size: None,
                max_backup_index: None,
            },
            "async" => AppenderKind::Async {
                dispatches: vec![],
                buffer_size: DEFAULT_BUFFER_SIZE,
                blocking: true,
            },
            "testing" => AppenderKind::Testing,
            _ => bail!("unknown appender class '{class}'"),
        };
        Ok(Self {
            name: name.into(),
            kind,
            layout: None,
            filters: vec![],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds an appender an `async` appender forwards records to.
    pub fn add_appender(&mut self, dispatch: Arc<Dispatch>) -> anyhow::Result<()> {
        match &mut self.kind {
            AppenderKind::Async { dispatches, .. } => {
                dispatches.push(dispatch);
                Ok(())
            }
            _ => bail!("appender '{}' cannot hold other appenders", self.name),
        }
    }

    /// Opens the appender.
    ///
    /// # Errors
    ///
    /// Fails when a file appender has no file or the file cannot be opened, and when an `async`
    /// appender has no appender to forward to.
    pub fn build(self) -> anyhow::Result<Dispatch> {
        let AppenderBuilder {
            name,
            kind,
            layout,
            filters,
        } = self;
        let layout = layout.map(LayoutBuilder::build);
        let append: Box<dyn Append> = match kind {
            AppenderKind::Console { stderr: false } => {
                Stdout::default().with_layout(layout.unwrap_or_else(plain_text)).into()
            }
            AppenderKind::Console { stderr: true } => {
                Stderr::default().with_layout(layout.unwrap_or_else(plain_text)).into()
            }
            AppenderKind::File {
                path,
                append,
                immediate_flush,
            } => {
                let path = path.ok_or_else(|| anyhow!("appender '{name}' has no file"))?;
                let mut builder = FileBuilder::new(path)
                    .append(append)
                    .immediate_flush(immediate_flush);
                if let Some(layout) = layout {
                    builder = builder.layout(layout);
                }
                builder.build()?.into()
            }
            AppenderKind::RollingFile {
                path,
                append,
                rotation,
                max_file_size,
                max_backup_index,
            } => {
                let path = path.ok_or_else(|| anyhow!("appender '{name}' has no file"))?;
                let mut builder = RollingFileBuilder::new(path)
                    .append(append)
                    .rotation(rotation);
                if let Some(max_file_size) = max_file_size {
                    builder = builder.max_file_size(max_file_size);
                }
                if let Some(max_backup_index) = max_backup_index {
                    builder = builder.max_backups(max_backup_index);
                }
                if let Some(layout) = layout {
                    builder = builder.layout(layout);
                }
                builder.build()?.into()
            }
            AppenderKind::Async {
                dispatches,
                buffer_size,
                blocking,
            } => {
                if dispatches.is_empty() {
                    bail!("appender '{name}' has no appender to forward to");
                }
                let overflow = if blocking {
                    Overflow::Block
                } else {
                    Overflow::DropIncoming
                };
                dispatches
                    .into_iter()
                    .fold(
                        AsyncBuilder::new(format!("logwright-async-{name}")),
                        AsyncBuilder::dispatch,
                    )
                    .buffered_lines_limit(Some(buffer_size))
                    .overflow(overflow)
                    .build()?
                    .into()
            }
            AppenderKind::Testing => match layout {
                Some(layout) => Testing::default().with_layout(layout).into(),
                None => Testing::default().into(),
            },
        };

        Ok(filters
            .into_iter()
            .fold(Dispatch::new(name, append), Dispatch::filter))
    }
}

fn plain_text() -> Box<dyn Layout> {
    Box::new(TextLayout::default())
}

/// Parses a size in bytes, with an optional `KB`, `MB` or `GB` suffix.
fn parse_file_size(value: &str) -> anyhow::Result<NonZeroU64> {
    let trimmed = value.trim();
    let upper = trimmed.to_ascii_uppercase();
    let (digits, unit) = if let Some(digits) = upper.strip_suffix("KB") {
        (digits, 1024)
    } else if let Some(digits) = upper.strip_suffix("MB") {
        (digits, 1024 * 1024)
    } else if let Some(digits) = upper.strip_suffix("GB") {
        (digits, 1024 * 1024 * 1024)
    } else {
        (upper.as_str(), 1)
    };
    digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(unit))
        .and_then(NonZeroU64::new)
        .with_context(|| format!("'{value}' is not a file size"))
}

impl Configurable for AppenderBuilder {
    fn properties(&self) -> &[&'static str] {
        match self.kind {
            AppenderKind::Console { .. } => &["target"],
            AppenderKind::File { .. } => &["file", "append", "immediate_flush"],
            AppenderKind::RollingFile { .. } => &[
                "file",
                "append",
                "rotation",
                "date_pattern",
                "max_file_size",
                "max_backup_index",
            ],
            AppenderKind::Async { .. } => &["buffer_size", "blocking"],
            AppenderKind::Testing => &[],
        }
    }

    fn set_property(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        let label = self.type_label();
        match (&mut self.kind, name) {
            (AppenderKind::Console { stderr }, "target") => {
                *stderr = match value.to_ascii_lowercase().as_str() {
                    "system.out" | "stdout" => false,
                    "system.err" | "stderr" => true,
                    _ => bail!("unknown console target '{value}'"),
                };
            }
            (AppenderKind::File { path, .. } | AppenderKind::RollingFile { path, .. }, "file") => {
                if value.is_empty() {
                    bail!("the file name is empty");
                }
                *path = Some(PathBuf::from(value));
            }
            (
                AppenderKind::File { append, .. } | AppenderKind::RollingFile { append, .. },
                "append",
            ) => *append = parse_bool(value)?,
            (
                AppenderKind::File {
                    immediate_flush, ..
                },
                "immediate_flush",
            ) => *immediate_flush = parse_bool(value)?,
            (AppenderKind::RollingFile { rotation, .. }, "rotation") => *rotation = value.parse()?,
            (AppenderKind::RollingFile { rotation, .. }, "date_pattern") => {
                *rotation = Rotation::from_date_pattern(value)?;
            }
            (AppenderKind::RollingFile { max_file_size, .. }, "max_file_size") => {
                *max_file_size = Some(parse_file_size(value)?);
            }
            (
                AppenderKind::RollingFile {
                    max_backup_index, ..
                },
                "max_backup_index",
            ) => {
                let index = value
                    .trim()
                    .parse()
                    .with_context(|| format!("'{value}' is not a backup count"))?;
                *max_backup_index = Some(index);
            }
            (AppenderKind::Async { buffer_size, .. }, "buffer_size") => {
                *buffer_size = value
                    .trim()
                    .parse()
                    .with_context(|| format!("'{value}' is not a buffer size"))?;
            }
            (AppenderKind::Async { blocking, .. }, "blocking") => *blocking = parse_bool(value)?,
            _ => bail!("{label} has no property named '{name}'"),
        }
        Ok(())
    }

    fn components(&self) -> &[&'static str] {
        match self.kind {
            AppenderKind::Async { .. } => &["filter"],
            _ => &["layout", "filter"],
        }
    }

    fn create_component(
        &mut self,
        name: &str,
        class: Option<&str>,
    ) -> anyhow::Result<Box<dyn Configurable>> {
        let class = class.with_context(|| format!("a {name} needs a class"))?;
        match name {
            "layout" => Ok(Box::new(LayoutBuilder::from_class(class)?)),
            "filter" => Ok(Box::new(FilterBuilder::from_class(class)?)),
            _ => bail!("{} cannot hold a component named '{name}'", self.type_label()),
        }
    }

    fn attach_component(
        &mut self,
        name: &str,
        component: Box<dyn Configurable>,
    ) -> anyhow::Result<()> {
        match name {
            "layout" => {
                let layout = component
                    .downcast::<LayoutBuilder>()
                    .ok_or_else(|| anyhow!("the layout of '{}' is not a layout", self.name))?;
                self.layout = Some(*layout);
            }
            "filter" => {
                let filter = component
                    .downcast::<FilterBuilder>()
                    .ok_or_else(|| anyhow!("the filter of '{}' is not a filter", self.name))?;
                self.filters.push(filter.build());
            }
            _ => bail!("{} cannot hold a component named '{name}'", self.type_label()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        for class in ["console", "ConsoleAppender", "org.apache.log4j.ConsoleAppender"] {
            let builder = AppenderBuilder::from_class("out", class).unwrap();
            assert!(matches!(builder.kind, AppenderKind::Console { stderr: false }));
        }
        assert!(matches!(
            AppenderBuilder::from_class("err", "stderr").unwrap().kind,
            AppenderKind::Console { stderr: true }
        ));
        assert!(AppenderBuilder::from_class("x", "socket").is_err());
    }

    #[test]
    fn test_console_target() {
        let mut builder = AppenderBuilder::from_class("out", "console").unwrap();
        builder.set_property("target", "System.err").unwrap();
        assert!(matches!(builder.kind, AppenderKind::Console { stderr: true }));
        assert!(builder.set_property("target", "printer").is_err());
        assert!(builder.set_property("file", "app.log").is_err());
    }

    #[test]
    fn test_file_requires_path() {
        let builder = AppenderBuilder::from_class("file", "file").unwrap();
        let err = builder.build().unwrap_err();
        assert_eq!(err.to_string(), "appender 'file' has no file");
    }

    #[test]
    fn test_components() {
        let mut builder = AppenderBuilder::from_class("out", "testing").unwrap();
        let layout = builder.create_component("layout", Some("pattern")).unwrap();
        builder.attach_component("layout", layout).unwrap();
        assert!(builder.layout.is_some());

        let filter = builder.create_component("filter", Some("level")).unwrap();
        assert!(builder.attach_component("layout", filter).is_err());
        assert!(builder.create_component("layout", None).is_err());

        let dispatch = builder.build().unwrap();
        assert_eq!(dispatch.name(), "out");
    }

    #[test]
    fn test_rolling_file_classes() {
        let mut builder = AppenderBuilder::from_class("roll", "RollingFileAppender").unwrap();
        builder.set_property("max_file_size", "5MB").unwrap();
        builder.set_property("max_backup_index", "3").unwrap();
        assert!(builder.set_property("max_backup_index", "many").is_err());
        assert!(matches!(
            builder.kind,
            AppenderKind::RollingFile {
                rotation: Rotation::Never,
                max_file_size: Some(size),
                max_backup_index: Some(3),
                ..
            } if size.get() == 5 * 1024 * 1024
        ));

        let mut builder = AppenderBuilder::from_class("daily", "daily_rolling_file").unwrap();
        assert!(matches!(
            builder.kind,
            AppenderKind::RollingFile {
                rotation: Rotation::Daily,
                ..
            }
        ));
        builder.set_property("date_pattern", "'.'yyyy-MM-dd-HH").unwrap();
        assert!(matches!(
            builder.kind,
            AppenderKind::RollingFile {
                rotation: Rotation::Hourly,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_file_size() {
        assert_eq!(parse_file_size("1024").unwrap().get(), 1024);
        assert_eq!(parse_file_size("10kb").unwrap().get(), 10 * 1024);
        assert_eq!(parse_file_size(" 2 GB ").unwrap().get(), 2 * 1024 * 1024 * 1024);
        assert!(parse_file_size("0").is_err());
        assert!(parse_file_size("big").is_err());
        assert!(parse_file_size("99999999999999999999GB").is_err());
    }

    #[test]
    fn test_async_holds_appenders() {
        let mut builder = AppenderBuilder::from_class("async", "org.apache.log4j.AsyncAppender")
            .unwrap();
        assert_eq!(builder.components(), ["filter"]);
        builder.set_property("buffer_size", "16").unwrap();
        builder.set_property("blocking", "false").unwrap();
        let err = AppenderBuilder::from_class("async", "async")
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "appender 'async' has no appender to forward to");

        let inner = Arc::new(Dispatch::new("inner", Testing::default()));
        builder.add_appender(inner.clone()).unwrap();
        assert_eq!(builder.build().unwrap().name(), "async");

        let mut console = AppenderBuilder::from_class("out", "console").unwrap();
        let err = console.add_appender(inner).unwrap_err();
        assert_eq!(err.to_string(), "appender 'out' cannot hold other appenders");
    }
}
