use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The six parameters of one procurement run.
///
/// They are substituted into task descriptions as `{product_name}`,
/// `{websites_list}`, `{country_name}`, `{no_keywords}`, `{score_th}` and
/// `{score_ra}`, and the numeric ones also drive output conformance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInputs {
    pub product_name: String,
    pub websites: Vec<String>,
    pub country: String,
    pub max_queries: usize,
    pub score_threshold: f64,
    pub rating_threshold: f64,
}

impl Default for RunInputs {
    fn default() -> Self {
        Self {
            product_name: "Coffee Machine for the Office".to_string(),
            websites: vec![
                "www.amazon.eg".to_string(),
                "www.jumia.com.eg".to_string(),
                "www.noon.com/saudi-en".to_string(),
            ],
            country: "Saudi".to_string(),
            max_queries: 10,
            score_threshold: 0.10,
            rating_threshold: 3.5,
        }
    }
}

impl RunInputs {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.product_name.trim().is_empty() {
            return Err(ConfigError::Invalid("product name is empty".to_string()));
        }
        if self.websites.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one website is required".to_string(),
            ));
        }
        if self.max_queries == 0 {
            return Err(ConfigError::Invalid(
                "max_queries must be at least 1".to_string(),
            ));
        }
        if !self.score_threshold.is_finite() || !self.rating_threshold.is_finite() {
            return Err(ConfigError::Invalid(
                "thresholds must be finite numbers".to_string(),
            ));
        }
        Ok(())
    }

    pub fn template_vars(&self) -> HashMap<String, String> {
        HashMap::from([
            ("product_name".to_string(), self.product_name.clone()),
            ("websites_list".to_string(), self.websites.join(", ")),
            ("country_name".to_string(), self.country.clone()),
            ("no_keywords".to_string(), self.max_queries.to_string()),
            ("score_th".to_string(), self.score_threshold.to_string()),
            ("score_ra".to_string(), self.rating_threshold.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_vars() {
        let vars = RunInputs::default().template_vars();
        assert_eq!(vars["no_keywords"], "10");
        assert_eq!(vars["score_th"], "0.1");
        assert_eq!(vars["score_ra"], "3.5");
        assert_eq!(
            vars["websites_list"],
            "www.amazon.eg, www.jumia.com.eg, www.noon.com/saudi-en"
        );
    }

    #[test]
    fn test_validate() {
        assert!(RunInputs::default().validate().is_ok());

        let inputs = RunInputs {
            max_queries: 0,
            ..RunInputs::default()
        };
        assert!(inputs.validate().is_err());

        let inputs = RunInputs {
            websites: vec![],
            ..RunInputs::default()
        };
        assert!(inputs.validate().is_err());
    }
}
