//! Shape model and the `{shape}` payload codec.
//!
//! A drawing event carries exactly one [`Shape`], wrapped as `{"shape": ...}`
//! and string-encoded into the `message` field of a `chat` message. Shapes
//! are stored in world coordinates and never mutated after commit; erasing is
//! drawing over with the background color.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use serde::{Deserialize, Serialize};

use crate::consts::{BACKGROUND_COLOR, DEFAULT_FONT_SIZE, FOREGROUND_COLOR};

/// One committed drawing primitive. The `type` tag fully determines the field
/// set; unknown fields are rejected at decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum Shape {
    /// Axis-aligned rectangle. `(x, y)` is the drag start corner; width and
    /// height keep the drag direction and may be negative.
    #[serde(rename_all = "camelCase")]
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    /// Circle. Rendered with `|radius|`.
    #[serde(rename_all = "camelCase")]
    Circle {
        center_x: f64,
        center_y: f64,
        radius: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    /// One straight segment. Freehand strokes are sequences of these.
    #[serde(rename_all = "camelCase")]
    Pencil {
        start_x: f64,
        start_y: f64,
        end_x: f64,
        end_y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    /// Text anchored at its baseline start.
    #[serde(rename_all = "camelCase")]
    Text {
        x: f64,
        y: f64,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_size: Option<f64>,
    },
}

impl Shape {
    /// The color stored on the shape, if any.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        match self {
            Self::Rect { color, .. } | Self::Circle { color, .. } | Self::Pencil { color, .. } | Self::Text { color, .. } => {
                color.as_deref()
            }
        }
    }

    /// Color to draw with: the stored color, or the foreground default.
    #[must_use]
    pub fn resolved_color(&self) -> &str {
        self.color().unwrap_or(FOREGROUND_COLOR)
    }

    /// Whether this shape paints with the background color (an eraser mark).
    #[must_use]
    pub fn is_background_colored(&self) -> bool {
        self.color() == Some(BACKGROUND_COLOR)
    }

    /// Whether every number on the shape is finite. JSON has no encoding for
    /// NaN or infinity, so only finite shapes can be sent.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Rect { x, y, width, height, .. } => [x, y, width, height].iter().all(|n| n.is_finite()),
            Self::Circle { center_x, center_y, radius, .. } => [center_x, center_y, radius].iter().all(|n| n.is_finite()),
            Self::Pencil { start_x, start_y, end_x, end_y, .. } => {
                [start_x, start_y, end_x, end_y].iter().all(|n| n.is_finite())
            }
            Self::Text { x, y, font_size, .. } => {
                x.is_finite() && y.is_finite() && font_size.is_none_or(f64::is_finite)
            }
        }
    }

    /// Font size for text shapes, defaulted. `None` for other shapes.
    #[must_use]
    pub fn font_size(&self) -> Option<f64> {
        match self {
            Self::Text { font_size, .. } => Some(font_size.unwrap_or(DEFAULT_FONT_SIZE)),
            Self::Rect { .. } | Self::Circle { .. } | Self::Pencil { .. } => None,
        }
    }
}

/// Errors from the payload codec.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("invalid shape payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("shape has a non-finite coordinate")]
    NonFinite,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    shape: &'a Shape,
}

#[derive(Deserialize)]
struct Envelope {
    shape: Shape,
}

/// Encode a shape as the string carried in a `chat` message.
///
/// # Errors
///
/// Returns [`ShapeError::NonFinite`] for NaN or infinite numbers, which JSON
/// would otherwise write as `null`, or [`ShapeError::Json`] if serialization
/// fails.
pub fn encode_payload(shape: &Shape) -> Result<String, ShapeError> {
    if !shape.is_finite() {
        return Err(ShapeError::NonFinite);
    }
    Ok(serde_json::to_string(&EnvelopeRef { shape })?)
}

/// Decode the string carried in a `chat` message.
///
/// # Errors
///
/// Returns [`ShapeError::Json`] if the text is not a `{shape}` envelope or the
/// shape is not a known variant with exactly its own fields.
pub fn decode_payload(payload: &str) -> Result<Shape, ShapeError> {
    let envelope: Envelope = serde_json::from_str(payload)?;
    Ok(envelope.shape)
}
