use crate::models::PredictionFeatures;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Fitted label encoder for one categorical feature.
#[derive(Debug, Deserialize, Clone)]
pub struct LabelEncoder {
    /// Category -> encoded index, as fitted at training time.
    pub classes: HashMap<String, usize>,
    /// Fallback class substituted for categories the model never saw.
    pub most_frequent: String,
}

impl LabelEncoder {
    fn encode(&self, raw: &str) -> f64 {
        let key = raw.trim().to_lowercase();
        match self.classes.get(&key) {
            Some(idx) => *idx as f64,
            // Unseen category: substitute the most frequent training class
            None => self
                .classes
                .get(&self.most_frequent)
                .copied()
                .unwrap_or(0) as f64,
        }
    }
}

/// Serialized regression artifact: encoders + scaler + linear weights.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelArtifact {
    pub feature_order: Vec<String>,
    pub encoders: HashMap<String, LabelEncoder>,
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl ModelArtifact {
    fn validate(&self) -> Result<()> {
        let n = self.feature_order.len();
        if self.means.len() != n || self.stds.len() != n || self.weights.len() != n {
            return Err(anyhow!(
                "Model artifact shape mismatch: {} features, {} means, {} stds, {} weights",
                n,
                self.means.len(),
                self.stds.len(),
                self.weights.len()
            ));
        }
        for feature in &self.feature_order {
            if !self.encoders.contains_key(feature) {
                return Err(anyhow!("Model artifact missing encoder for '{}'", feature));
            }
        }
        Ok(())
    }
}

/// Thin wrapper around a pre-trained price regression model. Prediction
/// availability is explicit in the type: `None` means "no model loaded" or
/// "cannot encode", never a 0.0 that could be mistaken for a real estimate.
pub struct PricePredictor {
    model: Option<ModelArtifact>,
}

impl PricePredictor {
    /// A predictor with no model: every `predict` returns `None`.
    pub fn unavailable() -> Self {
        Self { model: None }
    }

    /// Loads the artifact from a JSON file. A missing or malformed file
    /// degrades to the unavailable predictor rather than failing startup —
    /// price prediction is an optional feature.
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path.as_ref()) {
            Ok(model) => {
                println!(
                    "Predictor: loaded model with {} features",
                    model.feature_order.len()
                );
                Self { model: Some(model) }
            }
            Err(e) => {
                eprintln!("Predictor: model unavailable ({})", e);
                Self::unavailable()
            }
        }
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        artifact.validate()?;
        Ok(Self {
            model: Some(artifact),
        })
    }

    fn try_load(path: &Path) -> Result<ModelArtifact> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading model artifact {:?}", path))?;
        let artifact: ModelArtifact =
            serde_json::from_str(&raw).context("parsing model artifact")?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Encode -> scale -> dot product. The estimate is clamped non-negative;
    /// a negative extrapolation is meaningless for a price.
    pub fn predict(&self, features: &PredictionFeatures) -> Option<f64> {
        let model = self.model.as_ref()?;

        let mut estimate = model.intercept;

        for (i, feature) in model.feature_order.iter().enumerate() {
            let raw = match feature.as_str() {
                "state" => &features.state,
                "district" => &features.district,
                "market" => &features.market,
                "commodity" => &features.commodity,
                "variety" => &features.variety,
                "grade" => &features.grade,
                _ => return None,
            };

            let encoded = model.encoders.get(feature)?.encode(raw);
            let std = model.stds[i];
            let scaled = if std > 0.0 {
                (encoded - model.means[i]) / std
            } else {
                0.0
            };
            estimate += model.weights[i] * scaled;
        }

        Some(estimate.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(pairs: &[(&str, usize)], most_frequent: &str) -> LabelEncoder {
        LabelEncoder {
            classes: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            most_frequent: most_frequent.to_string(),
        }
    }

    fn test_artifact() -> ModelArtifact {
        ModelArtifact {
            feature_order: vec!["state".to_string(), "commodity".to_string()],
            encoders: HashMap::from([
                (
                    "state".to_string(),
                    encoder(&[("punjab", 0), ("telangana", 1)], "punjab"),
                ),
                (
                    "commodity".to_string(),
                    encoder(&[("rice", 0), ("wheat", 1)], "rice"),
                ),
            ]),
            means: vec![0.5, 0.5],
            stds: vec![0.5, 0.5],
            weights: vec![100.0, 200.0],
            intercept: 2000.0,
        }
    }

    fn features(state: &str, commodity: &str) -> PredictionFeatures {
        PredictionFeatures {
            state: state.to_string(),
            district: "Any".to_string(),
            market: "Any".to_string(),
            commodity: commodity.to_string(),
            variety: "Common".to_string(),
            grade: "FAQ".to_string(),
        }
    }

    #[test]
    fn test_unavailable_returns_none() {
        let p = PricePredictor::unavailable();
        assert_eq!(p.predict(&features("punjab", "rice")), None);
        assert!(!p.is_available());
    }

    #[test]
    fn test_known_categories_predict() {
        let p = PricePredictor::from_artifact(test_artifact()).unwrap();
        // telangana=1, wheat=1: both scale to +1.0
        // 2000 + 100*1 + 200*1 = 2300
        let est = p.predict(&features("Telangana", "Wheat")).unwrap();
        assert!((est - 2300.0).abs() < 1e-9);
    }

    #[test]
    fn test_unseen_category_uses_most_frequent() {
        let p = PricePredictor::from_artifact(test_artifact()).unwrap();
        let unseen = p.predict(&features("atlantis", "rice")).unwrap();
        let frequent = p.predict(&features("punjab", "rice")).unwrap();
        assert_eq!(unseen, frequent);
    }

    #[test]
    fn test_negative_estimate_clamped() {
        let mut artifact = test_artifact();
        artifact.intercept = -5000.0;
        let p = PricePredictor::from_artifact(artifact).unwrap();
        assert_eq!(p.predict(&features("punjab", "rice")), Some(0.0));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut artifact = test_artifact();
        artifact.weights.pop();
        assert!(PricePredictor::from_artifact(artifact).is_err());
    }

    #[test]
    fn test_load_missing_file_degrades() {
        let p = PricePredictor::load("/definitely/not/a/model.json");
        assert!(!p.is_available());
    }
}
