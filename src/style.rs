use serde::{Deserialize, Serialize};

/// Namespace of the `<line>` style extension block.
pub const GPX_STYLE_NS: &[u8] = b"http://www.topografix.com/GPX/gpx_style/0/2";

/// Line style attributes of a track layer. Every field is optional so that
/// records can be merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_cap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_join: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_offset: Option<String>,
}

impl StyleRecord {
    /// The fixed default every resolution starts from: `{color: "blue"}`.
    pub fn default_line() -> Self {
        Self {
            color: Some("blue".to_string()),
            ..Default::default()
        }
    }

    /// Overwrite each field of `self` that is set in `other`.
    pub fn merge(&mut self, other: &StyleRecord) {
        fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if src.is_some() {
                dst.clone_from(src);
            }
        }
        take(&mut self.color, &other.color);
        take(&mut self.opacity, &other.opacity);
        take(&mut self.weight, &other.weight);
        take(&mut self.line_cap, &other.line_cap);
        take(&mut self.line_join, &other.line_join);
        take(&mut self.dash_array, &other.dash_array);
        take(&mut self.dash_offset, &other.dash_offset);
    }

    /// Build a record from the children of a `<line>` style extension block,
    /// given as `(local name, text)` pairs. The first occurrence of a field wins.
    pub fn from_extension(entries: &[(String, String)]) -> Self {
        let mut style = StyleRecord::default();
        for (name, text) in entries {
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            match name.as_str() {
                "color" if style.color.is_none() => style.color = Some(css_color(text)),
                "opacity" if style.opacity.is_none() => style.opacity = text.parse().ok(),
                "width" | "weight" if style.weight.is_none() => {
                    style.weight = text.parse().ok()
                }
                "linecap" if style.line_cap.is_none() => style.line_cap = Some(text.to_string()),
                "linejoin" if style.line_join.is_none() => {
                    style.line_join = Some(text.to_string())
                }
                "dasharray" if style.dash_array.is_none() => {
                    style.dash_array = Some(text.to_string())
                }
                "dashoffset" if style.dash_offset.is_none() => {
                    style.dash_offset = Some(text.to_string())
                }
                _ => {}
            }
        }
        style
    }
}

/// gpx_style colors are bare hex (`FF0000`); anything else is passed through.
fn css_color(text: &str) -> String {
    let is_hex = matches!(text.len(), 3 | 6 | 8) && text.bytes().all(|b| b.is_ascii_hexdigit());
    if is_hex {
        format!("#{text}")
    } else {
        text.to_string()
    }
}

/// Caller-supplied styles with the highest precedence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StyleOverrides {
    /// Applied to every track and route.
    Uniform(StyleRecord),
    /// Indexed by the ordinal of the `<trk>` (or `<rte>`) within its kind.
    PerLayer(Vec<StyleRecord>),
}

impl StyleOverrides {
    pub fn for_index(&self, index: usize) -> Option<&StyleRecord> {
        match self {
            Self::Uniform(style) => Some(style),
            Self::PerLayer(styles) => styles.get(index),
        }
    }
}

/// Resolve the style of one track or route.
///
/// Precedence, lowest first: the fixed default, `base`, the style extension
/// embedded in the element, `overrides`.
pub fn resolve(
    embedded: Option<&StyleRecord>,
    base: &StyleRecord,
    overrides: Option<&StyleRecord>,
) -> StyleRecord {
    let mut style = StyleRecord::default_line();
    style.merge(base);
    if let Some(embedded) = embedded {
        style.merge(embedded);
    }
    if let Some(overrides) = overrides {
        style.merge(overrides);
    }
    style
}
