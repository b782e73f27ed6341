// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;

/// Default bound for every network call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP response with status and fully buffered body
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
}

impl HttpResponse {
    /// True for 2xx status codes
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction for testability
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL and buffer the body
    async fn get_bytes(&self, url: &str) -> Result<HttpResponse, reqwest::Error>;

    /// GET a URL with an `Authorization: Bearer` header
    async fn get_bytes_with_bearer(
        &self,
        url: &str,
        token: &str,
    ) -> Result<HttpResponse, reqwest::Error>;

    /// POST an urlencoded form body using HTTP basic authentication
    async fn post_form(
        &self,
        url: &str,
        basic_auth: (&str, &str),
        form_body: &str,
    ) -> Result<HttpResponse, reqwest::Error>;
}

/// Default HTTP client implementation using reqwest
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Create a new ReqwestClient with the default timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new ReqwestClient bounding every request by `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn buffer(response: reqwest::Response) -> Result<HttpResponse, reqwest::Error> {
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_bytes(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        Self::buffer(response).await
    }

    async fn get_bytes_with_bearer(
        &self,
        url: &str,
        token: &str,
    ) -> Result<HttpResponse, reqwest::Error> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::buffer(response).await
    }

    async fn post_form(
        &self,
        url: &str,
        basic_auth: (&str, &str),
        form_body: &str,
    ) -> Result<HttpResponse, reqwest::Error> {
        let (user, password) = basic_auth;
        let response = self
            .client
            .post(url)
            .basic_auth(user, Some(password))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form_body.to_string())
            .timeout(self.timeout)
            .send()
            .await?;
        Self::buffer(response).await
    }
}
