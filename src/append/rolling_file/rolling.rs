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

use std::cmp::Ordering;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::num::NonZeroU64;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::anyhow;
use jiff::Zoned;
use jiff::civil::DateTime;

use crate::append::rolling_file::Rotation;
use crate::append::rolling_file::clock::Clock;

/// A writer for rolling files.
///
/// Records go to the configured file. On rollover the file is archived next to it and a fresh
/// one is started:
///
/// * size-based archives are named `app.log.1`, `app.log.2` and so on, `1` being the newest;
/// * with a time-based rotation, archives carry the period they cover, as in
///   `app.log.2024-08-10.1`.
#[derive(Debug)]
pub struct RollingFileWriter {
    state: State,
    writer: File,
}

impl RollingFileWriter {
    pub fn builder(path: impl Into<PathBuf>) -> RollingFileWriterBuilder {
        RollingFileWriterBuilder::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.state.path
    }
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let now = self.state.clock.now();
        let writer = &mut self.writer;

        if self.state.should_rollover_on_date(&now) {
            self.state.current_filesize = 0;
            self.state.next_date_timestamp = self.state.rotation.next_date_timestamp(&now);
            let period = self.state.this_date_timestamp.clone();
            self.state.refresh_writer(&period, writer);
        }

        if self.state.should_rollover_on_size() {
            self.state.current_filesize = 0;
            self.state.refresh_writer(&now, writer);
        }

        self.state.this_date_timestamp = now;

        writer
            .write(buf)
            .inspect(|&n| self.state.current_filesize += n as u64)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// A builder for configuring [`RollingFileWriter`].
#[derive(Debug)]
pub struct RollingFileWriterBuilder {
    path: PathBuf,
    append: bool,
    rotation: Rotation,
    max_size: Option<NonZeroU64>,
    max_backups: Option<usize>,
    clock: Clock,
}

impl RollingFileWriterBuilder {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: true,
            rotation: Rotation::Never,
            max_size: None,
            max_backups: None,
            clock: Clock::DefaultClock,
        }
    }

    /// Appends to an existing file instead of truncating it. Defaults to `true`.
    #[must_use]
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Sets the rotation policy.
    #[must_use]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the maximum size of a log file in bytes.
    #[must_use]
    pub fn max_file_size(mut self, n: NonZeroU64) -> Self {
        self.max_size = Some(n);
        self
    }

    /// Sets the maximum number of archives to keep. Unlimited by default.
    #[must_use]
    pub fn max_backups(mut self, n: usize) -> Self {
        self.max_backups = Some(n);
        self
    }

    #[cfg(test)]
    fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the [`RollingFileWriter`], opening the current file.
    pub fn build(self) -> anyhow::Result<RollingFileWriter> {
        let Self {
            path,
            append,
            rotation,
            max_size,
            max_backups,
            clock,
        } = self;

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("log file path {} has no file name", path.display()))?
            .to_string();
        let log_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&log_dir)
            .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

        let now = clock.now();
        let mut state = State {
            path: log_dir.join(&filename),
            log_dir,
            filename,
            date_format: rotation.date_format(),
            current_filesize: 0,
            this_date_timestamp: now.clone(),
            next_date_timestamp: rotation.next_date_timestamp(&now),
            rotation,
            max_size,
            max_backups,
            clock,
        };

        let writer = state.open(append)?;
        if append {
            let metadata = writer.metadata().context("failed to read log file metadata")?;
            state.current_filesize = metadata.len();
            let mtime = metadata
                .modified()
                .ok()
                .and_then(|mtime| Zoned::try_from(mtime).ok());
            if let Some(mtime) = mtime.filter(|_| metadata.len() > 0) {
                state.next_date_timestamp = state.rotation.next_date_timestamp(&mtime);
                state.this_date_timestamp = mtime;
            }
        }

        Ok(RollingFileWriter { state, writer })
    }
}

#[derive(Debug)]
struct Archive {
    path: PathBuf,
    datetime: DateTime,
    count: usize,
}

// oldest is the least
fn compare_archive(a: &Archive, b: &Archive) -> Ordering {
    a.datetime
        .cmp(&b.datetime)
        .then_with(|| b.count.cmp(&a.count))
}

#[derive(Debug)]
struct State {
    path: PathBuf,
    log_dir: PathBuf,
    filename: String,
    date_format: &'static str,
    rotation: Rotation,
    current_filesize: u64,
    this_date_timestamp: Zoned,
    next_date_timestamp: Option<i64>,
    max_size: Option<NonZeroU64>,
    max_backups: Option<usize>,
    clock: Clock,
}

impl State {
    fn open(&self, append: bool) -> anyhow::Result<File> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&self.path)
            .with_context(|| format!("failed to open log file {}", self.path.display()))
    }

    fn archive_path(&self, period: &Zoned, count: usize) -> PathBuf {
        let filename = &self.filename;
        let archive = match self.rotation {
            Rotation::Never => format!("{filename}.{count}"),
            _ => format!("{filename}.{}.{count}", period.strftime(self.date_format)),
        };
        self.log_dir.join(archive)
    }

    fn list_archives(&self) -> anyhow::Result<Vec<Archive>> {
        let read_dir = fs::read_dir(&self.log_dir)
            .with_context(|| format!("failed to read log dir {}", self.log_dir.display()))?;

        let archives = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                if !entry.metadata().ok()?.is_file() {
                    return None;
                }

                let name = entry.file_name();
                let rest = name
                    .to_str()?
                    .strip_prefix(self.filename.as_str())?
                    .strip_prefix('.')?;
                let (datetime, count) = match self.rotation {
                    Rotation::Never => (DateTime::MIN, rest),
                    _ => {
                        let (date, count) = rest.rsplit_once('.')?;
                        (DateTime::strptime(self.date_format, date).ok()?, count)
                    }
                };
                let count = count.parse().ok()?;

                Some(Archive {
                    path: entry.path(),
                    datetime,
                    count,
                })
            })
            .collect();

        Ok(archives)
    }

    fn delete_oldest_archives(&self, max_backups: usize) -> anyhow::Result<()> {
        let mut archives = self.list_archives()?;
        if archives.len() <= max_backups {
            return Ok(());
        }

        archives.sort_by(compare_archive);
        for archive in archives.iter().take(archives.len() - max_backups) {
            fs::remove_file(&archive.path).with_context(|| {
                format!("failed to remove old log {}", archive.path.display())
            })?;
        }

        Ok(())
    }

    fn rotate_log_writer(&self, period: &Zoned) -> anyhow::Result<File> {
        let mut renames = vec![];
        let mut count = 1;
        loop {
            let archive = self.archive_path(period, count);
            if !archive.exists() {
                break;
            }
            renames.push((archive, self.archive_path(period, count + 1)));
            count += 1;
        }

        for (old, new) in renames.iter().rev() {
            fs::rename(old, new)
                .with_context(|| format!("failed to rotate log {}", old.display()))?;
        }

        let archive = self.archive_path(period, 1);
        fs::rename(&self.path, &archive)
            .with_context(|| format!("failed to archive log {}", self.path.display()))?;

        if let Some(max_backups) = self.max_backups {
            if let Err(err) = self.delete_oldest_archives(max_backups) {
                eprintln!("failed to delete oldest logs: {err:#}");
            }
        }

        self.open(true)
    }

    fn refresh_writer(&self, period: &Zoned, file: &mut File) {
        if let Err(err) = file.flush() {
            eprintln!("failed to flush previous writer: {err}");
        }
        match self.rotate_log_writer(period) {
            Ok(new_file) => *file = new_file,
            Err(err) => eprintln!("failed to rotate log writer: {err:#}"),
        }
    }

    fn should_rollover_on_date(&self, date: &Zoned) -> bool {
        self.next_date_timestamp
            .is_some_and(|ts| date.timestamp().as_millisecond() >= ts)
    }

    fn should_rollover_on_size(&self) -> bool {
        self.max_size
            .is_some_and(|n| self.current_filesize >= n.get())
    }
}
