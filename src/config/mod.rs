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

//! Declarative configuration from XML documents.
//!
//! A document is read as a stream of [`SaxEvent`]s and handed to an [`Interpreter`], which
//! matches the path of each open element against the patterns of a [`RuleStore`] and runs the
//! bound [`Action`]s. Actions build components on the object stack of an [`ExecutionContext`];
//! elements no rule matches are wired into the component under construction by
//! [`PropertyWiring`] when their name is one of its properties or nested components.
//!
//! Element-level problems never abort a pass. They are collected as [`ErrorItem`]s and the
//! interpreter recovers by skipping the affected part of the document.

pub use self::action::Action;
pub use self::actions::APPENDER_BAG;
pub use self::actions::AppenderBag;
pub use self::actions::default_rules;
pub use self::component::AsAny;
pub use self::component::Configurable;
pub use self::component::names_match;
pub use self::component::parse_bool;
pub use self::component::parse_level;
pub use self::configurator::XmlConfigurator;
pub use self::context::ExecutionContext;
pub use self::document::RecordedDocument;
pub use self::error_item::DefaultTrap;
pub use self::error_item::ErrorItem;
pub use self::error_item::LogTrap;
pub use self::error_item::Trap;
pub use self::event::Attributes;
pub use self::event::EventHandler;
pub use self::event::Location;
pub use self::event::SaxEvent;
pub use self::implicit::ImplicitAction;
pub use self::implicit::PropertyWiring;
pub use self::interpreter::Interpreter;
pub use self::pattern::ElementPath;
pub use self::pattern::Pattern;
pub use self::reader::XmlReader;
pub use self::rule_store::RuleStore;

mod action;
pub mod actions;
mod component;
mod configurator;
mod context;
mod document;
mod error_item;
mod event;
mod implicit;
mod interpreter;
mod pattern;
mod reader;
mod rule_store;
