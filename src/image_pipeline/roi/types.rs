//! ROI definition types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a ROI entry is rejected at load time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoiValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    #[error("point {0} is not an [x, y] pair")]
    InvalidPoint(usize),

    #[error("color must be 3 values in 0..=255, got {0:?}")]
    InvalidColor(Vec<i64>),

    #[error("thickness must be positive, got {0}")]
    InvalidThickness(i64),

    #[error("alpha must be within [0, 1], got {0}")]
    InvalidAlpha(f64),

    #[error("malformed entry: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Stroke color stored in blue, green, red order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgrColor(pub [u8; 3]);

impl BgrColor {
    pub fn to_rgb(self) -> [u8; 3] {
        let [b, g, r] = self.0;
        [r, g, b]
    }
}

/// A named polygon with its rendering attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiDefinition {
    pub name: String,
    pub points: Vec<Point>,
    pub color: BgrColor,
    pub thickness: u32,
    /// Fill opacity; `None` or `0.0` disables fill
    pub alpha: Option<f64>,
    pub updated: Option<String>,
    pub comment: Option<String>,
}

impl RoiDefinition {
    pub fn new(
        name: impl Into<String>,
        points: Vec<Point>,
        color: BgrColor,
        thickness: u32,
    ) -> Result<Self, RoiValidationError> {
        if points.len() < 3 {
            return Err(RoiValidationError::TooFewPoints(points.len()));
        }
        if thickness == 0 {
            return Err(RoiValidationError::InvalidThickness(0));
        }
        Ok(Self {
            name: name.into(),
            points,
            color,
            thickness,
            alpha: None,
            updated: None,
            comment: None,
        })
    }

    pub fn with_alpha(mut self, alpha: f64) -> Result<Self, RoiValidationError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(RoiValidationError::InvalidAlpha(alpha));
        }
        self.alpha = Some(alpha);
        Ok(self)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn fill_alpha(&self) -> f64 {
        self.alpha.unwrap_or(0.0)
    }

    /// Copy with every vertex multiplied by `factor` and rounded.
    pub fn scaled(&self, factor: f64) -> Self {
        if factor == 1.0 {
            return self.clone();
        }
        let points = self
            .points
            .iter()
            .map(|p| Point::new(
                (p.x as f64 * factor).round() as i32,
                (p.y as f64 * factor).round() as i32,
            ))
            .collect();
        Self { points, ..self.clone() }
    }

    /// Validates a loosely-typed entry as found in ROI source files.
    pub(crate) fn from_entry(name: &str, entry: RoiEntry) -> Result<Self, RoiValidationError> {
        let raw_points = entry.points.ok_or(RoiValidationError::MissingField("points"))?;
        let raw_color = entry.color.ok_or(RoiValidationError::MissingField("color"))?;
        let raw_thickness = entry.thickness.ok_or(RoiValidationError::MissingField("thickness"))?;

        let points = raw_points
            .iter()
            .enumerate()
            .map(|(i, pair)| match pair.as_slice() {
                [x, y] if x.is_finite() && y.is_finite() => {
                    Ok(Point::new(x.round() as i32, y.round() as i32))
                }
                _ => Err(RoiValidationError::InvalidPoint(i)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let color = match raw_color.as_slice() {
            [b, g, r] if [b, g, r].iter().all(|c| (0..=255).contains(*c)) => {
                BgrColor([*b as u8, *g as u8, *r as u8])
            }
            _ => return Err(RoiValidationError::InvalidColor(raw_color.clone())),
        };

        if raw_thickness <= 0 || raw_thickness > u32::MAX as i64 {
            return Err(RoiValidationError::InvalidThickness(raw_thickness));
        }

        let mut roi = Self::new(name, points, color, raw_thickness as u32)?;
        if let Some(alpha) = entry.alpha {
            roi = roi.with_alpha(alpha)?;
        }
        roi.updated = entry.updated.as_ref().and_then(scalar_to_string);
        roi.comment = entry.comment.as_ref().and_then(scalar_to_string);
        Ok(roi)
    }

    pub(crate) fn to_entry(&self) -> RoiEntry {
        RoiEntry {
            points: Some(
                self.points
                    .iter()
                    .map(|p| vec![p.x as f64, p.y as f64])
                    .collect(),
            ),
            color: Some(self.color.0.iter().map(|&c| c as i64).collect()),
            thickness: Some(self.thickness as i64),
            alpha: self.alpha,
            updated: self.updated.clone().map(serde_yaml::Value::String),
            comment: self.comment.clone().map(serde_yaml::Value::String),
        }
    }
}

/// On-disk shape of one ROI entry. Every field is optional so that missing
/// keys surface as validation errors instead of parse failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RoiEntry {
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "serialize_points")]
    pub points: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<serde_yaml::Value>,
}

// points are integral once validated; write them back as integers
fn serialize_points<S: serde::Serializer>(
    points: &Option<Vec<Vec<f64>>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let as_ints: Option<Vec<Vec<i64>>> = points.as_ref().map(|pts| {
        pts.iter()
            .map(|pair| pair.iter().map(|v| v.round() as i64).collect())
            .collect()
    });
    as_ints.serialize(serializer)
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        other => serde_yaml::to_string(other).ok().map(|s| s.trim_end().to_string()),
    }
}
