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

use std::fs;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;

use crate::append::Append;
use crate::append::terminate_line;
use crate::layout::Layout;
use crate::layout::TextLayout;

/// A builder to configure and create a [`File`] appender.
#[derive(Debug)]
pub struct FileBuilder {
    path: PathBuf,
    append: bool,
    immediate_flush: bool,
    layout: Box<dyn Layout>,
}

impl FileBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: true,
            immediate_flush: true,
            layout: Box::new(TextLayout::default().no_color()),
        }
    }

    /// Appends to an existing file instead of truncating it. Defaults to `true`.
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Flushes after every record. Defaults to `true`.
    ///
    /// Otherwise records are buffered until [`Append::flush`] or the buffer fills up.
    pub fn immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    /// Sets the layout. Defaults to [`TextLayout`] without colors.
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Opens the file, creating it and its parent directories if needed.
    pub fn build(self) -> anyhow::Result<File> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(&self.path)
            .with_context(|| format!("failed to open log file {}", self.path.display()))?;
        Ok(File {
            path: self.path,
            immediate_flush: self.immediate_flush,
            layout: self.layout,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

/// An appender that writes log records to a file.
#[derive(Debug)]
pub struct File {
    path: PathBuf,
    immediate_flush: bool,
    layout: Box<dyn Layout>,
    writer: Mutex<BufWriter<fs::File>>,
}

impl File {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Append for File {
    fn append(&self, record: &log::Record) -> anyhow::Result<()> {
        let bytes = terminate_line(self.layout.format(record)?);
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("log file {} is poisoned", self.path.display()))?;
        writer.write_all(&bytes)?;
        if self.immediate_flush {
            writer.flush()?;
        }
        Ok(())
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
