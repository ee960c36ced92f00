//! Catalog entity structures

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ProductId;

/// Aggregate rating attached to a product by the catalog service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Average score, 0.0 to 5.0.
    pub rate: f64,
    /// Number of ratings contributing to the average.
    pub count: u32,
}

/// A single catalog record as served by the remote catalog service.
///
/// Products are immutable from the client's perspective: only the server
/// mutates them, the client reads them or proposes new ones via
/// [`CreateProductRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    pub description: String,
    /// Free-form label. Matched exactly (case-sensitive) by the
    /// category aggregation.
    pub category: String,
    pub image: String,
    pub rating: Rating,
}

/// A client-proposed new product. The server assigns the id.
///
/// Constructed by the form collaborator, submitted once, and discarded
/// after a result is observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image: String,
}

impl CreateProductRequest {
    /// Check the required field set before any network call.
    ///
    /// Title, price, and category are required; description and image may be
    /// empty. A zero price is treated as missing since that is the untouched
    /// form default.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "title".to_string(),
            });
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "price".to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }
        if self.price == 0.0 {
            return Err(ValidationError::RequiredFieldMissing {
                field: "price".to_string(),
            });
        }
        if self.category.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "category".to_string(),
            });
        }
        Ok(())
    }
}

/// Server echo of a created record. Shape mirrors [`Product`] minus the
/// rating aggregate, which the service computes later.
///
/// Never merged into cached lists; its only cache effect is invalidation
/// of the product-list key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProductResponse {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateProductRequest {
        CreateProductRequest {
            title: "Mechanical keyboard".to_string(),
            price: 89.99,
            description: "Tenkeyless, brown switches".to_string(),
            category: "electronics".to_string(),
            image: "https://example.com/kb.png".to_string(),
        }
    }

    #[test]
    fn validate_accepts_complete_request() {
        assert_eq!(valid_request().validate(), Ok(()));
    }

    #[test]
    fn validate_allows_empty_description_and_image() {
        let mut request = valid_request();
        request.description = String::new();
        request.image = String::new();
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_missing_title() {
        let mut request = valid_request();
        request.title = "   ".to_string();
        assert_eq!(
            request.validate(),
            Err(ValidationError::RequiredFieldMissing {
                field: "title".to_string()
            })
        );
    }

    #[test]
    fn validate_rejects_missing_category() {
        let mut request = valid_request();
        request.category = String::new();
        assert_eq!(
            request.validate(),
            Err(ValidationError::RequiredFieldMissing {
                field: "category".to_string()
            })
        );
    }

    #[test]
    fn validate_rejects_zero_price_as_missing() {
        let mut request = valid_request();
        request.price = 0.0;
        assert_eq!(
            request.validate(),
            Err(ValidationError::RequiredFieldMissing {
                field: "price".to_string()
            })
        );
    }

    #[test]
    fn validate_rejects_negative_price() {
        let mut request = valid_request();
        request.price = -1.0;
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidValue { field, .. }) if field == "price"
        ));
    }

    #[test]
    fn product_round_trips_through_json() {
        let product = Product {
            id: 7,
            title: "Backpack".to_string(),
            price: 109.95,
            description: "Fits 15 inch laptops".to_string(),
            category: "men's clothing".to_string(),
            image: "https://example.com/bag.jpg".to_string(),
            rating: Rating {
                rate: 3.9,
                count: 120,
            },
        };
        let json = serde_json::to_value(&product).expect("serialize");
        let back: Product = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, product);
    }
}
