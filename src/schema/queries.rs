use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::Conform;
use crate::error::SchemaError;
use crate::inputs::RunInputs;
use crate::schema::check_cardinality;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SuggestedSearchQueries {
    /// Suggested search queries to be passed to the search engine
    pub queries: Vec<String>,
}

impl Conform for SuggestedSearchQueries {
    fn conform(mut self, inputs: &RunInputs) -> Result<Self, SchemaError> {
        self.queries.retain(|q| !q.trim().is_empty());
        check_cardinality("queries", self.queries.len(), 1, inputs.max_queries)?;
        Ok(self)
    }
}
