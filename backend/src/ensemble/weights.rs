use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use shared::ModelWeight;
use std::fmt;

use super::EnsembleError;

/// A deepfake detector known to the pipeline, with its default ensemble weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub name: String,
    pub base_weight: f64,
}

impl RegisteredModel {
    pub fn new(name: impl Into<String>, base_weight: f64) -> Self {
        Self {
            name: name.into(),
            base_weight,
        }
    }
}

/// Fixed set of deepfake detectors a request may select from.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRegistry {
    models: Vec<RegisteredModel>,
}

impl ModelRegistry {
    pub fn new(models: Vec<RegisteredModel>) -> Result<Self, EnsembleError> {
        for (i, model) in models.iter().enumerate() {
            if model.name.trim().is_empty() {
                return Err(EnsembleError::InvalidRegistry(
                    "model name must not be empty".to_string(),
                ));
            }
            if !model.base_weight.is_finite() || model.base_weight <= 0.0 {
                return Err(EnsembleError::InvalidRegistry(format!(
                    "base weight of '{}' must be a positive number, got {}",
                    model.name, model.base_weight
                )));
            }
            if models[..i].iter().any(|m| m.name == model.name) {
                return Err(EnsembleError::InvalidRegistry(format!(
                    "model '{}' is registered twice",
                    model.name
                )));
            }
        }
        Ok(Self { models })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.base_weight(name).is_some()
    }

    pub fn base_weight(&self, name: &str) -> Option<f64> {
        self.models
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.base_weight)
    }

    pub fn models(&self) -> &[RegisteredModel] {
        &self.models
    }
}

/// Normalized ensemble weights, in selection order. Never empty; weights sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelWeightMap {
    entries: Vec<(String, f64)>,
}

impl ModelWeightMap {
    #[cfg(test)]
    pub fn get(&self, model: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == model)
            .map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, w)| (name.as_str(), *w))
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn to_model_weights(&self) -> Vec<ModelWeight> {
        self.iter()
            .map(|(model, weight)| ModelWeight {
                model: model.to_string(),
                weight,
            })
            .collect()
    }
}

impl Serialize for ModelWeightMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, weight) in &self.entries {
            map.serialize_entry(name, weight)?;
        }
        map.end()
    }
}

impl fmt::Display for ModelWeightMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .iter()
            .map(|(name, weight)| format!("{}={:.4}", name, weight))
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}

/// Turns the user's selection into ensemble weights.
///
/// Unregistered identifiers and repeats are dropped, every remaining model gets
/// its registry base weight, and the result is rescaled so the weights sum to 1.
pub fn normalize_weights<S: AsRef<str>>(
    requested: &[S],
    registry: &ModelRegistry,
) -> Result<ModelWeightMap, EnsembleError> {
    let mut entries: Vec<(String, f64)> = Vec::new();
    for name in requested {
        let name: &str = name.as_ref();
        if entries.iter().any(|(existing, _)| existing == name) {
            continue;
        }
        if let Some(base) = registry.base_weight(name) {
            entries.push((name.to_string(), base));
        }
    }

    // checked before dividing
    if entries.is_empty() {
        return Err(EnsembleError::NoModelsSelected);
    }

    let total: f64 = entries.iter().map(|(_, w)| w).sum();
    for (_, weight) in entries.iter_mut() {
        *weight /= total;
    }

    Ok(ModelWeightMap { entries })
}
