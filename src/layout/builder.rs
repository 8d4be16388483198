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

use anyhow::Context;
use anyhow::bail;
use jiff::tz::TimeZone;

use crate::config::Configurable;
use crate::config::parse_bool;
#[cfg(feature = "layout-json")]
use crate::layout::JsonLayout;
use crate::layout::Layout;
use crate::layout::PatternLayout;
use crate::layout::TextLayout;

/// A layout being configured from a document.
///
/// The class is matched ignoring case, an optional package prefix and an optional `Layout`
/// suffix, so `pattern`, `PatternLayout` and `org.apache.log4j.PatternLayout` all create a
/// [`PatternLayout`].
#[derive(Debug, Clone)]
pub enum LayoutBuilder {
    Text(TextLayout),
    Pattern(PatternLayout),
    #[cfg(feature = "layout-json")]
    Json(JsonLayout),
}

impl LayoutBuilder {
    /// Creates the builder for a layout class.
    pub fn from_class(class: &str) -> anyhow::Result<Self> {
        let short = class.rsplit('.').next().unwrap_or(class);
        let short = short.strip_suffix("Layout").unwrap_or(short);
        match short.to_ascii_lowercase().as_str() {
            "text" | "simple" => Ok(LayoutBuilder::Text(TextLayout::default().no_color())),
            "pattern" => Ok(LayoutBuilder::Pattern(PatternLayout::default())),
            #[cfg(feature = "layout-json")]
            "json" => Ok(LayoutBuilder::Json(JsonLayout::default())),
            _ => bail!("unknown layout class '{class}'"),
        }
    }

    pub fn build(self) -> Box<dyn Layout> {
        match self {
            LayoutBuilder::Text(layout) => Box::new(layout),
            LayoutBuilder::Pattern(layout) => Box::new(layout),
            #[cfg(feature = "layout-json")]
            LayoutBuilder::Json(layout) => Box::new(layout),
        }
    }
}

impl Configurable for LayoutBuilder {
    fn properties(&self) -> &[&'static str] {
        match self {
            LayoutBuilder::Text(_) => &["color", "timezone"],
            LayoutBuilder::Pattern(_) => &["conversion_pattern", "pattern", "timezone"],
            #[cfg(feature = "layout-json")]
            LayoutBuilder::Json(_) => &["timezone"],
        }
    }

    fn set_property(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        if name == "timezone" {
            let tz = TimeZone::get(value).with_context(|| format!("unknown time zone '{value}'"))?;
            match self {
                LayoutBuilder::Text(layout) => *layout = layout.clone().timezone(tz),
                LayoutBuilder::Pattern(layout) => layout.set_timezone(tz),
                #[cfg(feature = "layout-json")]
                LayoutBuilder::Json(layout) => *layout = layout.clone().timezone(tz),
            }
            return Ok(());
        }

        match (self, name) {
            (LayoutBuilder::Text(layout), "color") => {
                layout.set_no_color(!parse_bool(value)?);
            }
            (LayoutBuilder::Pattern(layout), "conversion_pattern" | "pattern") => {
                layout.set_conversion_pattern(value)?;
            }
            (builder, name) => bail!("{} has no property named '{name}'", builder.type_label()),
        }
        Ok(())
    }
}
