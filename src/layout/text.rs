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

#[cfg(feature = "colored")]
use colored::Color;
#[cfg(feature = "colored")]
use colored::Colorize;
use jiff::Timestamp;
use jiff::tz::TimeZone;
use log::Level;

use crate::layout::KvDisplay;
use crate::layout::Layout;

/// A layout that formats log record as text.
///
/// Output format:
///
/// ```text
/// 2024-08-11T22:44:57.172105+08:00 ERROR app::db: src/db.rs:51 Hello error!
/// 2024-08-11T22:44:57.172219+08:00  WARN app::db: src/db.rs:52 Hello warn!
/// 2024-08-11T22:44:57.172276+08:00  INFO app::db: src/db.rs:53 Hello info!
/// ```
///
/// With the `colored` feature, log levels are colored unless [`TextLayout::no_color`] is set.
///
/// You can customize the timezone of the timestamp with [`TextLayout::timezone`]. Otherwise, the
/// system timezone is used.
#[derive(Debug, Clone)]
pub struct TextLayout {
    #[cfg(feature = "colored")]
    colors: LevelColor,
    no_color: bool,
    timezone: TimeZone,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            #[cfg(feature = "colored")]
            colors: LevelColor::default(),
            no_color: false,
            timezone: TimeZone::system(),
        }
    }
}

impl TextLayout {
    /// Disable colored output.
    pub fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }

    pub(crate) fn set_no_color(&mut self, no_color: bool) {
        self.no_color = no_color;
    }

    /// Set the timezone for timestamps.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use logwright::layout::TextLayout;
    ///
    /// let layout = TextLayout::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = tz;
        self
    }

    #[cfg(feature = "colored")]
    fn format_level(&self, level: Level) -> String {
        if self.no_color {
            return level.to_string();
        }
        let color = match level {
            Level::Error => self.colors.error,
            Level::Warn => self.colors.warn,
            Level::Info => self.colors.info,
            Level::Debug => self.colors.debug,
            Level::Trace => self.colors.trace,
        };
        level.as_str().color(color).to_string()
    }

    #[cfg(not(feature = "colored"))]
    fn format_level(&self, level: Level) -> String {
        level.to_string()
    }
}

impl Layout for TextLayout {
    fn format(&self, record: &log::Record) -> anyhow::Result<Vec<u8>> {
        let ts = Timestamp::now();
        let time = format!("{:.6}", ts.display_with_offset(self.timezone.to_offset(ts)));
        let level = self.format_level(record.level());
        let target = record.target();
        let file = record.file().unwrap_or_default();
        let line = record.line().unwrap_or_default();
        let message = record.args();
        let kvs = KvDisplay::new(record.key_values());

        let text = format!("{time} {level:>5} {target}: {file}:{line} {message}{kvs}");
        Ok(text.into_bytes())
    }
}

#[cfg(feature = "colored")]
#[derive(Debug, Clone)]
struct LevelColor {
    error: Color,
    warn: Color,
    info: Color,
    debug: Color,
    trace: Color,
}

#[cfg(feature = "colored")]
impl Default for LevelColor {
    fn default() -> Self {
        Self {
            error: Color::Red,
            warn: Color::Yellow,
            info: Color::Green,
            debug: Color::Blue,
            trace: Color::Magenta,
        }
    }
}
