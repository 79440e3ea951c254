//! Detection service response types.

use serde::Deserialize;

/// Response body of a hosted detection call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

impl DetectionResponse {
    /// Number of detected subjects.
    pub fn count(&self) -> u32 {
        u32::try_from(self.predictions.len()).unwrap_or(u32::MAX)
    }
}

/// A single detected object. Only the fields used for logging are typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_predictions() {
        let response: DetectionResponse = serde_json::from_str(
            r#"{"time":0.1,"image":{"width":640,"height":360},
                "predictions":[{"class":"person","confidence":0.9,"x":1,"y":2},
                               {"class":"person","confidence":0.8}]}"#,
        )
        .unwrap();
        assert_eq!(response.count(), 2);
        assert_eq!(response.predictions[0].class.as_deref(), Some("person"));
    }

    #[test]
    fn test_missing_predictions_is_zero() {
        let response: DetectionResponse = serde_json::from_str(r#"{"time":0.1}"#).unwrap();
        assert_eq!(response.count(), 0);
    }
}
