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

//! Appender for writing log records to rolling files.
//!
//! # Example
//!
//! ```no_run
//! use std::num::NonZeroU64;
//!
//! use logwright::append::rolling_file::RollingFileBuilder;
//! use logwright::append::rolling_file::Rotation;
//!
//! let rolling = RollingFileBuilder::new("logs/app.log")
//!     .rotation(Rotation::Daily)
//!     .max_file_size(NonZeroU64::new(10 * 1024 * 1024).unwrap())
//!     .max_backups(7)
//!     .build()
//!     .unwrap();
//! ```

use std::io::Write;
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

pub use self::rolling::RollingFileWriter;
pub use self::rolling::RollingFileWriterBuilder;
pub use self::rotation::Rotation;
use crate::append::Append;
use crate::append::terminate_line;
use crate::layout::Layout;
use crate::layout::TextLayout;

mod clock;
mod rolling;
mod rotation;

/// A builder to configure and create a [`RollingFile`] appender.
#[derive(Debug)]
pub struct RollingFileBuilder {
    builder: RollingFileWriterBuilder,
    layout: Box<dyn Layout>,
}

impl RollingFileBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            builder: RollingFileWriterBuilder::new(path),
            layout: Box::new(TextLayout::default().no_color()),
        }
    }

    /// Appends to an existing file instead of truncating it. Defaults to `true`.
    pub fn append(mut self, append: bool) -> Self {
        self.builder = self.builder.append(append);
        self
    }

    /// Sets the time-based rotation. Defaults to [`Rotation::Never`].
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.builder = self.builder.rotation(rotation);
        self
    }

    /// Rolls over when the current file reaches the given size.
    ///
    /// With a time-based rotation, the size is checked after the time.
    pub fn max_file_size(mut self, n: NonZeroU64) -> Self {
        self.builder = self.builder.max_file_size(n);
        self
    }

    /// Sets the maximum number of archives to keep.
    pub fn max_backups(mut self, n: usize) -> Self {
        self.builder = self.builder.max_backups(n);
        self
    }

    /// Sets the layout. Defaults to [`TextLayout`] without colors.
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Opens the current file, creating it and its directory if needed.
    pub fn build(self) -> anyhow::Result<RollingFile> {
        let RollingFileBuilder { builder, layout } = self;
        let writer = builder.build()?;
        Ok(RollingFile {
            writer: Mutex::new(writer),
            layout,
        })
    }
}

/// An appender that writes log records to rolling files.
#[derive(Debug)]
pub struct RollingFile {
    writer: Mutex<RollingFileWriter>,
    layout: Box<dyn Layout>,
}

impl RollingFile {
    fn writer(&self) -> MutexGuard<'_, RollingFileWriter> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Append for RollingFile {
    fn append(&self, record: &log::Record) -> anyhow::Result<()> {
        let bytes = terminate_line(self.layout.format(record)?);
        self.writer().write_all(&bytes)?;
        Ok(())
    }

    fn flush(&self) {
        let _ = self.writer().flush();
    }
}

impl Drop for RollingFile {
    fn drop(&mut self) {
        let writer = self.writer.get_mut().unwrap_or_else(PoisonError::into_inner);
        let _ = writer.flush();
    }
}
