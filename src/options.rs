use serde::Deserialize;

use crate::error::Result;
use crate::style::{StyleOverrides, StyleRecord};

/// Moving time excludes inter-point gaps of this many milliseconds or more.
pub const DEFAULT_MAX_POINT_INTERVAL_MS: u64 = 15_000;

/// Options for parsing a GPX document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    /// Which GPX element kinds to parse (default: all)
    #[serde(default = "default_element_kinds")]
    pub element_kinds: Vec<ElementKind>,

    /// Concatenate all segments of a track into one layer (default: true)
    #[serde(default = "default_true")]
    pub join_track_segments: bool,

    /// Gap threshold excluded from moving time (default: 15000)
    #[serde(default = "default_max_point_interval_ms")]
    pub max_point_interval_ms: u64,

    /// Base line style merged over the fixed default (default: `{color: "blue"}`)
    #[serde(default = "StyleRecord::default_line")]
    pub default_style: StyleRecord,

    /// Caller styles that win over everything else (default: none)
    #[serde(default)]
    pub style_overrides: Option<StyleOverrides>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            element_kinds: default_element_kinds(),
            join_track_segments: true,
            max_point_interval_ms: DEFAULT_MAX_POINT_INTERVAL_MS,
            default_style: StyleRecord::default_line(),
            style_overrides: None,
        }
    }
}

impl ParseOptions {
    /// Read options from a JSON object; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn should_include(&self, kind: ElementKind) -> bool {
        self.element_kinds.contains(&kind)
    }

    /// Whether an empty layer list is an error for these options.
    pub fn expects_layers(&self) -> bool {
        self.should_include(ElementKind::Track) || self.should_include(ElementKind::Route)
    }

    pub fn override_for(&self, index: usize) -> Option<&StyleRecord> {
        self.style_overrides
            .as_ref()
            .and_then(|overrides| overrides.for_index(index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Waypoint,
    Route,
    Track,
}

fn default_element_kinds() -> Vec<ElementKind> {
    vec![ElementKind::Track, ElementKind::Route, ElementKind::Waypoint]
}

fn default_true() -> bool {
    true
}

fn default_max_point_interval_ms() -> u64 {
    DEFAULT_MAX_POINT_INTERVAL_MS
}
