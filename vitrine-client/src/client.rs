//! HTTP client for the remote catalog service.

use std::time::Duration;

use serde::de::DeserializeOwned;
use vitrine_core::{ClientError, CreateProductRequest, CreateProductResponse, Product, ProductId};

use crate::config::CatalogConfig;

/// Client for the four catalog operations.
///
/// Each call either returns the decoded payload or fails with a
/// [`ClientError`]; there are no automatic retries and no side effects
/// beyond the network call itself.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|err| ClientError::BuildFailed {
                reason: err.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /products`
    pub async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        self.get_json("/products").await
    }

    /// `GET /products/{id}`
    ///
    /// Only meaningful for a positive, known id; the subscription layer
    /// guards against id 0 ever reaching this call.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ClientError> {
        if id == 0 {
            tracing::warn!("get_product called with id 0, bypassing the subscription guard");
        }
        self.get_json(&format!("/products/{id}")).await
    }

    /// `GET /products/categories`
    pub async fn list_categories(&self) -> Result<Vec<String>, ClientError> {
        self.get_json("/products/categories").await
    }

    /// `POST /products`
    ///
    /// The request is borrowed so a failed submission leaves the caller's
    /// form state intact.
    pub async fn create_product(
        &self,
        request: &CreateProductRequest,
    ) -> Result<CreateProductResponse, ClientError> {
        self.post_json("/products", request).await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| transport_error(endpoint, err))?;
        parse_response(endpoint, response).await
    }

    async fn post_json<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| transport_error(endpoint, err))?;
        parse_response(endpoint, response).await
    }
}

fn transport_error(endpoint: &str, err: reqwest::Error) -> ClientError {
    ClientError::RequestFailed {
        endpoint: endpoint.to_string(),
        status: err.status().map(|status| status.as_u16()),
        reason: err.to_string(),
    }
}

async fn parse_response<T: DeserializeOwned>(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(endpoint, status = status.as_u16(), "catalog request failed");
        return Err(ClientError::RequestFailed {
            endpoint: endpoint.to_string(),
            status: Some(status.as_u16()),
            reason: format!("status {}", status.as_u16()),
        });
    }

    response.json::<T>().await.map_err(|err| {
        if err.is_decode() {
            ClientError::DecodeFailed {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        } else {
            transport_error(endpoint, err)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> CatalogConfig {
        CatalogConfig {
            base_url: base_url.to_string(),
            ..CatalogConfig::default()
        }
    }

    #[test]
    fn trailing_slash_is_trimmed_from_the_base_url() {
        let client = CatalogClient::new(&config("https://catalog.example.com/")).expect("client");
        assert_eq!(client.base_url(), "https://catalog.example.com");
    }

    #[tokio::test]
    async fn unreachable_host_surfaces_as_request_failed_without_status() {
        let client = CatalogClient::new(&config("http://127.0.0.1:1")).expect("client");

        let err = client.list_products().await.expect_err("must fail");
        match err {
            ClientError::RequestFailed {
                endpoint, status, ..
            } => {
                assert_eq!(endpoint, "/products");
                assert_eq!(status, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_product_builds_the_id_path() {
        // The request fails (no server), but the error carries the endpoint
        // the client actually constructed.
        let client = CatalogClient::new(&config("http://127.0.0.1:1")).expect("client");

        let err = client.get_product(7).await.expect_err("must fail");
        match err {
            ClientError::RequestFailed { endpoint, .. } => {
                assert_eq!(endpoint, "/products/7");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
