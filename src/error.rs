use wasm_bindgen::JsValue;

/// Errors raised while parsing a GPX document.
///
/// Only [`GpxError::MalformedDocument`], [`GpxError::NoLayersFound`] and
/// [`GpxError::InvalidOptions`] ever escape [`crate::parse`]. The point-level
/// variants are produced by the point extractor and cause the offending point
/// to be skipped.
#[derive(Debug, thiserror::Error)]
pub enum GpxError {
    #[error("malformed GPX document: {message}")]
    MalformedDocument { message: String },

    #[error("no track or route layers found in GPX document")]
    NoLayersFound,

    #[error("missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("invalid coordinate '{value}' for attribute '{attribute}'")]
    InvalidCoordinate {
        attribute: &'static str,
        value: String,
    },

    #[error("invalid parse options: {message}")]
    InvalidOptions { message: String },
}

impl GpxError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    pub(crate) fn unexpected_eof(element: &[u8]) -> Self {
        Self::malformed(format!(
            "unexpected end of input inside <{}>",
            String::from_utf8_lossy(element)
        ))
    }

    /// Whether this error only concerns a single point.
    pub fn is_point_level(&self) -> bool {
        matches!(
            self,
            Self::MissingAttribute { .. } | Self::InvalidCoordinate { .. }
        )
    }
}

impl From<quick_xml::Error> for GpxError {
    fn from(e: quick_xml::Error) -> Self {
        Self::malformed(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for GpxError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::malformed(e.to_string())
    }
}

impl From<serde_json::Error> for GpxError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidOptions {
            message: e.to_string(),
        }
    }
}

impl From<GpxError> for JsValue {
    fn from(e: GpxError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}

pub type Result<T> = std::result::Result<T, GpxError>;
