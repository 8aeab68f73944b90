//! Typed records each stage must produce, and the run-dependent rules they
//! are conformed to.

pub mod products;
pub mod queries;
pub mod report;
pub mod search;

pub use products::{AllExtractedProducts, ProductSpec, SingleExtractedProduct};
pub use queries::SuggestedSearchQueries;
pub use report::{report_contract, REPORT_SECTIONS};
pub use search::{AllSearchResults, SingleSearchResult};

use crate::error::SchemaError;

pub(crate) fn check_cardinality(
    field: &str,
    actual: usize,
    min: usize,
    max: usize,
) -> Result<(), SchemaError> {
    if actual < min || actual > max {
        return Err(SchemaError::Cardinality {
            field: field.to_string(),
            actual,
            min,
            max,
        });
    }
    Ok(())
}
