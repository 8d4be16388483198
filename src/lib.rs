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

//! Logwright is a hierarchical logging framework for the [`log`] facade, configured from XML
//! documents.
//!
//! Loggers form a tree by name: `app::db` is a child of `app`, itself a child of the root logger.
//! Each logger may set a level and attach appenders, and records flow up the tree to the
//! appenders of every ancestor unless a logger is marked non-additive.
//!
//! # Examples
//!
//! Configure and install from a document:
//!
//! ```no_run
//! logwright::configure_path("logwright.xml").unwrap();
//!
//! log::info!("This is an info message.");
//! ```
//!
//! Where `logwright.xml` reads:
//!
//! ```xml
//! <configuration>
//!   <appender name="console" class="console">
//!     <layout class="pattern">
//!       <conversionPattern>%d %-5p [%t] %c{2} - %m%n</conversionPattern>
//!     </layout>
//!   </appender>
//!   <logger name="hyper" additivity="false">
//!     <level value="warn"/>
//!   </logger>
//!   <root>
//!     <level value="info"/>
//!     <appender-ref ref="console"/>
//!   </root>
//! </configuration>
//! ```
//!
//! The same setup in code:
//!
//! ```
//! use std::sync::Arc;
//!
//! use log::LevelFilter;
//! use logwright::Dispatch;
//! use logwright::LoggerRepository;
//! use logwright::append::Stdout;
//! use logwright::layout::PatternLayout;
//!
//! let repository = LoggerRepository::new();
//! let layout = PatternLayout::new("%d %-5p [%t] %c{2} - %m%n").unwrap();
//! let console = Dispatch::new("console", Stdout::default().with_layout(layout));
//! repository.root().add_dispatch(Arc::new(console));
//! repository.root().set_level(LevelFilter::Info);
//! repository.set_level(Some("hyper"), Some(LevelFilter::Warn));
//! repository.set_additivity("hyper", false);
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

use std::path::Path;

pub mod append;
pub mod config;
pub mod filter;
pub mod layout;

mod error;
mod logger;

pub use append::Append;
pub use error::ConfigError;
pub use filter::Filter;
pub use layout::Layout;
pub use logger::*;

use crate::config::DefaultTrap;
use crate::config::XmlConfigurator;

/// Configures a new repository from an XML file and installs it as the global logger.
///
/// Element-level problems are written to stderr and do not fail the call.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is malformed, in which case nothing is
/// installed, or if the global logger has already been set.
pub fn configure_path(path: impl AsRef<Path>) -> Result<LoggerRepository, ConfigError> {
    let repository = LoggerRepository::new();
    XmlConfigurator::new()
        .trap(DefaultTrap::default())
        .configure_path(path, &repository)?;
    repository.apply()?;
    Ok(repository)
}
