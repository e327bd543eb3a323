use serde::{Deserialize, Serialize};
use serde_json::Number;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EvaluationPayload {
    /// Whole number from 1 to 5. Kept loose here so out-of-range and
    /// fractional values surface as `invalid_rating` rather than a parse error.
    pub rating: Option<Number>,
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub comments: String,
    pub expected_version: Option<u64>,
}

impl EvaluationPayload {
    pub fn new(rating: i64, comments: &str) -> Self {
        Self {
            rating: Some(Number::from(rating)),
            comments: comments.to_string(),
            expected_version: None,
        }
    }
}
