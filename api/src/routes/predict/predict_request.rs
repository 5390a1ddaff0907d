use serde::{Deserialize, Serialize};

/// Request payload for /predict.
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    /// User message; absent or null counts as empty.
    #[serde(default)]
    pub text: Option<String>,
}

/// Response payload for /predict (also used for error bodies).
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Assistant answer (plain text).
    pub reply: String,
    /// Category of the best matching record, or empty.
    pub tag: String,
}
