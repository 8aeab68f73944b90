use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::Conform;
use crate::error::SchemaError;
use crate::inputs::RunInputs;
use crate::schema::check_cardinality;

pub const MIN_SPECS: usize = 1;
pub const MAX_SPECS: usize = 5;
pub const MIN_RANK: u8 = 1;
pub const MAX_RANK: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductSpec {
    pub specification_name: String,
    pub specification_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SingleExtractedProduct {
    /// The original url of the product page
    pub page_url: String,
    /// The title of the product
    pub product_title: String,
    /// The url of the product image
    pub product_image_url: String,
    /// The url of the product
    pub product_url: String,
    /// The current price of the product
    pub product_current_price: f64,
    /// The original price of the product before discount. Set to null if no discount
    #[serde(default)]
    pub product_original_price: Option<f64>,
    /// The discount percentage of the product. Set to null if no discount
    #[serde(default)]
    pub product_discount_percentage: Option<f64>,
    /// The specifications of the product. Focus on the most important specs to compare.
    #[schemars(length(min = 1, max = 5))]
    pub product_specs: Vec<ProductSpec>,
    /// The rank of the product to be considered in the final procurement report
    /// (out of 5, higher is better).
    #[schemars(range(min = 1, max = 5))]
    pub agent_recommendation_rank: u8,
    /// Notes on why this product is or is not recommended compared to the others.
    pub agent_recommendation_notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AllExtractedProducts {
    pub products: Vec<SingleExtractedProduct>,
}

fn check_price(field: &str, value: f64) -> Result<(), SchemaError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SchemaError::OutOfRange {
            field: field.to_string(),
            detail: format!("{value} is not a finite non-negative price"),
        });
    }
    Ok(())
}

impl SingleExtractedProduct {
    pub fn validate(&self) -> Result<(), SchemaError> {
        check_cardinality(
            "product_specs",
            self.product_specs.len(),
            MIN_SPECS,
            MAX_SPECS,
        )?;
        if !(MIN_RANK..=MAX_RANK).contains(&self.agent_recommendation_rank) {
            return Err(SchemaError::OutOfRange {
                field: "agent_recommendation_rank".to_string(),
                detail: format!(
                    "{} is outside {}..={}",
                    self.agent_recommendation_rank, MIN_RANK, MAX_RANK
                ),
            });
        }
        check_price("product_current_price", self.product_current_price)?;
        if let Some(price) = self.product_original_price {
            check_price("product_original_price", price)?;
        }
        if let Some(discount) = self.product_discount_percentage {
            if !discount.is_finite() || !(0.0..=100.0).contains(&discount) {
                return Err(SchemaError::OutOfRange {
                    field: "product_discount_percentage".to_string(),
                    detail: format!("{discount} is not a percentage"),
                });
            }
        }
        Ok(())
    }
}

impl Conform for AllExtractedProducts {
    fn conform(self, _inputs: &RunInputs) -> Result<Self, SchemaError> {
        for product in &self.products {
            product.validate()?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(specs: usize, rank: u8, price: f64) -> SingleExtractedProduct {
        SingleExtractedProduct {
            page_url: "https://www.noon.com/saudi-en/p/1".to_string(),
            product_title: "De'Longhi Magnifica".to_string(),
            product_image_url: "https://img/1.jpg".to_string(),
            product_url: "https://www.noon.com/saudi-en/p/1".to_string(),
            product_current_price: price,
            product_original_price: None,
            product_discount_percentage: None,
            product_specs: (0..specs)
                .map(|i| ProductSpec {
                    specification_name: format!("spec {i}"),
                    specification_value: "x".to_string(),
                })
                .collect(),
            agent_recommendation_rank: rank,
            agent_recommendation_notes: vec!["good value".to_string()],
        }
    }

    #[test]
    fn test_valid_product() {
        assert!(product(1, 1, 0.0).validate().is_ok());
        assert!(product(5, 5, 1299.0).validate().is_ok());
    }

    #[test]
    fn test_spec_bounds() {
        assert!(matches!(
            product(0, 3, 10.0).validate(),
            Err(SchemaError::Cardinality { actual: 0, .. })
        ));
        assert!(matches!(
            product(6, 3, 10.0).validate(),
            Err(SchemaError::Cardinality { actual: 6, .. })
        ));
    }

    #[test]
    fn test_rank_and_price_bounds() {
        assert!(matches!(
            product(2, 0, 10.0).validate(),
            Err(SchemaError::OutOfRange { .. })
        ));
        assert!(matches!(
            product(2, 6, 10.0).validate(),
            Err(SchemaError::OutOfRange { .. })
        ));
        assert!(product(2, 3, -1.0).validate().is_err());
        assert!(product(2, 3, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_missing_optional_prices_deserialize() {
        let raw = r#"{
            "page_url": "u", "product_title": "t", "product_image_url": "i",
            "product_url": "u", "product_current_price": 499.0,
            "product_specs": [{"specification_name": "Power", "specification_value": "1450W"}],
            "agent_recommendation_rank": 4,
            "agent_recommendation_notes": []
        }"#;
        let parsed: SingleExtractedProduct = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.product_original_price, None);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_one_bad_product_fails_the_set() {
        let all = AllExtractedProducts {
            products: vec![product(2, 3, 10.0), product(2, 9, 10.0)],
        };
        assert!(all.conform(&RunInputs::default()).is_err());
    }
}
