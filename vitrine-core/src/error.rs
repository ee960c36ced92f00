//! Error types for catalog operations

use thiserror::Error;

use crate::query::QueryKey;

/// Remote catalog client errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Any non-success response status, or a transport-level failure, from
    /// the catalog service. `status` is `None` when the failure happened
    /// before an HTTP response existed.
    #[error("request to {endpoint} failed: {reason}")]
    RequestFailed {
        endpoint: String,
        status: Option<u16>,
        reason: String,
    },

    /// A success response whose body did not match the expected payload
    /// shape.
    #[error("failed to decode response from {endpoint}: {reason}")]
    DecodeFailed { endpoint: String, reason: String },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {reason}")]
    BuildFailed { reason: String },
}

/// Validation errors raised before any network call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Cache layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// A cached value could not be decoded into the requested type.
    #[error("failed to decode cached value for {key}: {reason}")]
    Decode { key: QueryKey, reason: String },

    /// A fetched value could not be re-encoded for the cache.
    #[error("failed to encode value for {key}: {reason}")]
    Encode { key: QueryKey, reason: String },
}

/// Top-level error type aggregating all catalog failure modes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result alias used throughout the workspace.
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_display_names_the_endpoint() {
        let err = ClientError::RequestFailed {
            endpoint: "/products".to_string(),
            status: Some(500),
            reason: "status 500".to_string(),
        };
        assert_eq!(err.to_string(), "request to /products failed: status 500");
    }

    #[test]
    fn catalog_error_is_transparent_over_validation() {
        let err: CatalogError = ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Required field missing: title");
    }
}
