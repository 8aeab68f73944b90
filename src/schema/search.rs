use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::Conform;
use crate::error::SchemaError;
use crate::inputs::RunInputs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SingleSearchResult {
    pub title: String,
    /// the page url
    pub url: String,
    pub content: String,
    pub score: f64,
    pub rating: f64,
    pub search_query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AllSearchResults {
    pub results: Vec<SingleSearchResult>,
}

impl SingleSearchResult {
    fn passes(&self, inputs: &RunInputs) -> bool {
        self.score.is_finite()
            && self.rating.is_finite()
            && self.score >= inputs.score_threshold
            && self.rating >= inputs.rating_threshold
    }
}

impl Conform for AllSearchResults {
    /// Drops results under either threshold. An empty list is a valid outcome.
    fn conform(mut self, inputs: &RunInputs) -> Result<Self, SchemaError> {
        let before = self.results.len();
        self.results.retain(|r| r.passes(inputs));
        if self.results.len() < before {
            log::info!(
                "Filtered {} of {} search results below score {} / rating {}",
                before - self.results.len(),
                before,
                inputs.score_threshold,
                inputs.rating_threshold
            );
        }
        Ok(self)
    }
}
