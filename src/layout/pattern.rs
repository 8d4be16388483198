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

use std::fmt::Write;
use std::str::FromStr;

use anyhow::bail;
use jiff::Zoned;
use jiff::tz::TimeZone;

use crate::layout::Layout;

const DEFAULT_CONVERSION_PATTERN: &str = "%m%n";
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// A layout driven by a conversion pattern.
///
/// The pattern is literal text mixed with conversion specifiers:
///
/// | Specifier       | Output                                                          |
/// |-----------------|-----------------------------------------------------------------|
/// | `%d`, `%d{fmt}` | the current time, formatted with a `strftime` format            |
/// | `%p`            | the level                                                       |
/// | `%c`, `%c{n}`   | the target, or its last `n` segments separated by `::` or `.`   |
/// | `%M`            | the module path                                                 |
/// | `%F`            | the file name                                                   |
/// | `%L`            | the line number                                                 |
/// | `%m`            | the message                                                     |
/// | `%t`            | the name of the current thread                                  |
/// | `%n`            | a newline                                                       |
/// | `%%`            | a percent sign                                                  |
///
/// Between `%` and the specifier, an optional format modifier controls the width of the field:
/// `-` aligns to the left, a number sets the minimum width and `.` followed by a number sets the
/// maximum width. Overlong values are truncated from the left.
///
/// # Examples
///
/// ```
/// use logwright::layout::PatternLayout;
///
/// let layout: PatternLayout = "%-5p [%c{1}] %m".parse().unwrap();
/// assert!("%q".parse::<PatternLayout>().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct PatternLayout {
    pattern: String,
    pieces: Vec<Piece>,
    timezone: TimeZone,
}

impl Default for PatternLayout {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_CONVERSION_PATTERN.to_string(),
            pieces: vec![Piece::Field(Spec::new(Field::Message)), Piece::Newline],
            timezone: TimeZone::system(),
        }
    }
}

impl PatternLayout {
    /// Creates a layout from a conversion pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern contains an unknown or incomplete specifier.
    pub fn new(pattern: impl Into<String>) -> anyhow::Result<Self> {
        let pattern = pattern.into();
        let pieces = parse(&pattern)?;
        Ok(Self {
            pattern,
            pieces,
            timezone: TimeZone::system(),
        })
    }

    /// Set the timezone for `%d`.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = tz;
        self
    }

    /// The conversion pattern in use.
    pub fn conversion_pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn set_conversion_pattern(&mut self, pattern: &str) -> anyhow::Result<()> {
        self.pieces = parse(pattern)?;
        self.pattern = pattern.to_string();
        Ok(())
    }

    pub(crate) fn set_timezone(&mut self, tz: TimeZone) {
        self.timezone = tz;
    }
}

impl FromStr for PatternLayout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatternLayout::new(s)
    }
}

impl Layout for PatternLayout {
    fn format(&self, record: &log::Record) -> anyhow::Result<Vec<u8>> {
        let mut out = String::new();
        let mut value = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Newline => out.push('\n'),
                Piece::Field(spec) => {
                    value.clear();
                    self.render(&spec.field, record, &mut value)?;
                    spec.pad(&value, &mut out);
                }
            }
        }
        Ok(out.into_bytes())
    }
}

impl PatternLayout {
    fn render(&self, field: &Field, record: &log::Record, out: &mut String) -> anyhow::Result<()> {
        match field {
            Field::Date(format) => {
                let now = Zoned::now().with_time_zone(self.timezone.clone());
                out.push_str(&jiff::fmt::strtime::format(format.as_str(), &now)?);
            }
            Field::Level => out.push_str(record.level().as_str()),
            Field::Target(None) => out.push_str(record.target()),
            Field::Target(Some(n)) => out.push_str(last_segments(record.target(), *n)),
            Field::Module => out.push_str(record.module_path().unwrap_or_default()),
            Field::File => out.push_str(record.file().unwrap_or_default()),
            Field::Line => {
                if let Some(line) = record.line() {
                    write!(out, "{line}")?;
                }
            }
            Field::Message => write!(out, "{}", record.args())?,
            Field::Thread => {
                let thread = std::thread::current();
                match thread.name() {
                    Some(name) => out.push_str(name),
                    None => write!(out, "{:?}", thread.id())?,
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Newline,
    Field(Spec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Spec {
    field: Field,
    left_align: bool,
    min_width: usize,
    max_width: Option<usize>,
}

impl Spec {
    fn new(field: Field) -> Self {
        Self {
            field,
            left_align: false,
            min_width: 0,
            max_width: None,
        }
    }

    fn pad(&self, value: &str, out: &mut String) {
        let mut value = value;
        let len = value.chars().count();
        if let Some(max) = self.max_width {
            if len > max {
                let skip = len - max;
                let start = value.char_indices().nth(skip).map_or(value.len(), |(i, _)| i);
                value = &value[start..];
            }
        }

        let len = value.chars().count();
        let fill = self.min_width.saturating_sub(len);
        if !self.left_align {
            out.extend(std::iter::repeat_n(' ', fill));
        }
        out.push_str(value);
        if self.left_align {
            out.extend(std::iter::repeat_n(' ', fill));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Date(String),
    Level,
    Target(Option<usize>),
    Module,
    File,
    Line,
    Message,
    Thread,
}

fn parse(pattern: &str) -> anyhow::Result<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }

        if chars.peek() == Some(&'%') {
            chars.next();
            literal.push('%');
            continue;
        }

        let mut spec = Spec::new(Field::Message);
        if chars.peek() == Some(&'-') {
            chars.next();
            spec.left_align = true;
        }
        spec.min_width = take_number(&mut chars, pattern)?.unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            match take_number(&mut chars, pattern)? {
                Some(max) => spec.max_width = Some(max),
                None => bail!("missing maximum width after '.' in pattern '{pattern}'"),
            }
        }

        let Some(conversion) = chars.next() else {
            bail!("pattern '{pattern}' ends with an incomplete specifier");
        };
        let option = if chars.peek() == Some(&'{') {
            chars.next();
            let mut option = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => option.push(c),
                    None => bail!("unclosed '{{' in pattern '{pattern}'"),
                }
            }
            Some(option)
        } else {
            None
        };

        spec.field = match conversion {
            'd' => {
                let format = option.unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
                jiff::fmt::strtime::format(format.as_str(), &Zoned::now())
                    .map_err(|err| anyhow::anyhow!("invalid date format '{format}': {err}"))?;
                Field::Date(format)
            }
            'p' => Field::Level,
            'c' => match option {
                None => Field::Target(None),
                Some(n) => match n.trim().parse::<usize>() {
                    Ok(n) if n > 0 => Field::Target(Some(n)),
                    _ => bail!("invalid precision '{n}' for %c in pattern '{pattern}'"),
                },
            },
            'M' => Field::Module,
            'F' => Field::File,
            'L' => Field::Line,
            'm' => Field::Message,
            't' => Field::Thread,
            'n' => {
                flush_literal(&mut literal, &mut pieces);
                pieces.push(Piece::Newline);
                continue;
            }
            other => bail!("unknown conversion specifier '%{other}' in pattern '{pattern}'"),
        };

        flush_literal(&mut literal, &mut pieces);
        pieces.push(Piece::Field(spec));
    }

    flush_literal(&mut literal, &mut pieces);
    Ok(pieces)
}

fn flush_literal(literal: &mut String, pieces: &mut Vec<Piece>) {
    if !literal.is_empty() {
        pieces.push(Piece::Literal(std::mem::take(literal)));
    }
}

fn take_number(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    pattern: &str,
) -> anyhow::Result<Option<usize>> {
    let mut number = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        let Some(next) = number
            .unwrap_or(0usize)
            .checked_mul(10)
            .and_then(|n| n.checked_add(digit as usize))
        else {
            bail!("width too large in pattern '{pattern}'");
        };
        number = Some(next);
    }
    Ok(number)
}

/// Returns the last `n` segments of a `::` or `.` separated name.
fn last_segments(name: &str, n: usize) -> &str {
    let bytes = name.as_bytes();
    let mut seen = 0;
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        let separator = if bytes[i] == b'.' {
            1
        } else if bytes[i] == b':' && i > 0 && bytes[i - 1] == b':' {
            2
        } else {
            continue;
        };
        seen += 1;
        if seen == n {
            return &name[i + 1..];
        }
        i = i + 1 - separator;
    }
    name
}
