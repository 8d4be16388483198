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

//! Appenders writing formatted records to their destination.

use std::fmt;

pub use self::asynchronous::Async;
pub use self::asynchronous::AsyncBuilder;
pub use self::asynchronous::Overflow;
pub use self::builder::AppenderBuilder;
pub use self::file::File;
pub use self::file::FileBuilder;
pub use self::stdio::Stderr;
pub use self::stdio::Stdout;
pub use self::testing::Testing;

mod asynchronous;
mod builder;
mod file;
pub mod rolling_file;
mod stdio;
mod testing;

/// A trait representing an appender that can process log records.
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Processes a log record.
    fn append(&self, record: &log::Record) -> anyhow::Result<()>;

    /// Flushes any buffered records.
    fn flush(&self) {}
}

impl<T: Append> From<T> for Box<dyn Append> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// Terminates a formatted record with a newline unless the layout already did.
pub(crate) fn terminate_line(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.last() != Some(&b'\n') {
        bytes.push(b'\n');
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminate_line() {
        assert_eq!(terminate_line(b"a".to_vec()), b"a\n");
        assert_eq!(terminate_line(b"a\n".to_vec()), b"a\n");
        assert_eq!(terminate_line(Vec::new()), b"\n");
    }
}
