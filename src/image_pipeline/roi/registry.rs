use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::{info, warn};

use crate::image_pipeline::common::error::{AnalysisError, Result};
use crate::image_pipeline::roi::types::{RoiDefinition, RoiEntry};

/// Named ROI definitions in source order.
///
/// Shared read-only across every image of a batch; per-image state such as
/// masks lives with the image, not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoiRegistry {
    rois: Vec<RoiDefinition>,
    warnings: Vec<String>,
}

impl RoiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a mapping of ROI name to entry.
    ///
    /// Entries that fail validation are skipped and recorded in
    /// [`RoiRegistry::warnings`]; only a source that is not a mapping at all
    /// is an error.
    pub fn load_from_source(source: &Value) -> Result<Self> {
        let mapping = match source {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(Self::new()),
            other => {
                return Err(AnalysisError::RoiSource(format!(
                    "expected a mapping of ROI name to definition, found {}",
                    value_kind(other)
                )));
            }
        };

        let mut registry = Self::new();
        for (key, value) in mapping {
            let Some(name) = key_to_name(key) else {
                registry.skip("<non-scalar key>", "ROI name must be a string");
                continue;
            };

            let entry: RoiEntry = match serde_yaml::from_value(value.clone()) {
                Ok(entry) => entry,
                Err(e) => {
                    registry.skip(&name, &e.to_string());
                    continue;
                }
            };

            match RoiDefinition::from_entry(&name, entry) {
                Ok(roi) => registry.insert(roi),
                Err(e) => registry.skip(&name, &e.to_string()),
            }
        }

        info!(
            loaded = registry.len(),
            skipped = registry.warnings.len(),
            "ROI registry loaded"
        );
        Ok(registry)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let source: Value = serde_yaml::from_str(yaml)
            .map_err(|e| AnalysisError::RoiSource(e.to_string()))?;
        Self::load_from_source(&source)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::RoiSource(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
            .map_err(|e| AnalysisError::RoiSource(format!("{}: {}", path.display(), e)))
    }

    /// Adds a definition, replacing any existing ROI with the same name.
    pub fn insert(&mut self, roi: RoiDefinition) {
        match self.rois.iter_mut().find(|r| r.name == roi.name) {
            Some(existing) => *existing = roi,
            None => self.rois.push(roi),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RoiDefinition> {
        self.rois.iter().find(|r| r.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&RoiDefinition> {
        self.get(name).ok_or_else(|| AnalysisError::UnknownRoi(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoiDefinition> {
        self.rois.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rois.iter().map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    /// Messages for entries skipped during loading.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Same mapping shape accepted by [`RoiRegistry::load_from_source`].
    pub fn serialize(&self) -> Result<Mapping> {
        let mut mapping = Mapping::new();
        for roi in &self.rois {
            let value = serde_yaml::to_value(roi.to_entry())
                .map_err(|e| AnalysisError::RoiSource(format!("{}: {}", roi.name, e)))?;
            mapping.insert(Value::String(roi.name.clone()), value);
        }
        Ok(mapping)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.serialize()?)
            .map_err(|e| AnalysisError::RoiSource(e.to_string()))
    }

    fn skip(&mut self, name: &str, reason: &str) {
        warn!("Skipping ROI {}: {}", name, reason);
        self.warnings.push(format!("{name}: {reason}"));
    }
}

fn key_to_name(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
