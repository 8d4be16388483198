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

//! Capabilities of the objects built during a configuration pass.

use std::any::Any;
use std::fmt;

use anyhow::bail;

/// Conversion to [`Any`] for downcasting trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// An object living on the execution context's object stack.
///
/// Every method has a default describing an object with nothing to configure. Components that
/// expose properties or nested components override the relevant methods, which makes them
/// reachable from generic elements like `<param name=".." value=".."/>` or `<file>app.log</file>`
/// without a dedicated rule per property.
///
/// Property and component names are listed in `snake_case`. Element and attribute names are
/// compared to them ignoring case, `_` and `-`, so `conversionPattern`, `conversion-pattern` and
/// `conversion_pattern` all name the same property.
pub trait Configurable: AsAny + fmt::Debug {
    /// The simple properties that can be set from a string value.
    fn properties(&self) -> &[&'static str] {
        &[]
    }

    /// Sets the named property, converting the string value to the property's type.
    ///
    /// `name` is one of the names returned by [`Configurable::properties`].
    fn set_property(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        let _ = value;
        bail!("{} has no property named '{name}'", self.type_label())
    }

    /// The nested components this object can hold.
    fn components(&self) -> &[&'static str] {
        &[]
    }

    /// Creates a new nested component of the given class, to be configured then attached.
    fn create_component(
        &mut self,
        name: &str,
        class: Option<&str>,
    ) -> anyhow::Result<Box<dyn Configurable>> {
        let _ = class;
        bail!("{} cannot hold a component named '{name}'", self.type_label())
    }

    /// Attaches a configured component previously created by [`Configurable::create_component`].
    fn attach_component(
        &mut self,
        name: &str,
        component: Box<dyn Configurable>,
    ) -> anyhow::Result<()> {
        let _ = component;
        bail!("{} cannot hold a component named '{name}'", self.type_label())
    }

    /// A short human readable name used in error messages.
    fn type_label(&self) -> &'static str {
        let name = std::any::type_name::<Self>();
        name.rsplit("::").next().unwrap_or(name)
    }
}

impl dyn Configurable {
    /// Returns the property matching the given element or attribute name.
    pub fn find_property(&self, name: &str) -> Option<&'static str> {
        find_name(self.properties(), name)
    }

    /// Returns the nested component matching the given element name.
    pub fn find_component(&self, name: &str) -> Option<&'static str> {
        find_name(self.components(), name)
    }

    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Downcasts a boxed component, dropping it on mismatch.
    pub fn downcast<T: Any>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

fn find_name(candidates: &[&'static str], name: &str) -> Option<&'static str> {
    candidates
        .iter()
        .copied()
        .find(|candidate| names_match(candidate, name))
}

/// Compares two names ignoring ASCII case and the `_` and `-` separators.
pub fn names_match(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        s.chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect::<String>()
    };
    normalize(a) == normalize(b)
}

/// Parses a boolean property value. Accepts `true`/`false`, `yes`/`no`, `on`/`off` and `1`/`0`.
pub fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => bail!("'{value}' is not a boolean"),
    }
}

/// Parses a level name ignoring case.
///
/// `all` is the same as `trace`, and `fatal` the same as `error`.
pub fn parse_level(value: &str) -> anyhow::Result<log::LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "all" | "trace" => Ok(log::LevelFilter::Trace),
        "debug" => Ok(log::LevelFilter::Debug),
        "info" => Ok(log::LevelFilter::Info),
        "warn" | "warning" => Ok(log::LevelFilter::Warn),
        "error" | "fatal" => Ok(log::LevelFilter::Error),
        "off" => Ok(log::LevelFilter::Off),
        _ => bail!("'{value}' is not a level"),
    }
}
