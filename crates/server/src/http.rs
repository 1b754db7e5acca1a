//! Thin wrapper around a shared `reqwest::Client`.
//!
//! Every outgoing call is logged with its method, URL, status, content type and
//! elapsed time. Connection level failures are returned as
//! [`IdentityError::Transport`] instead of a half-formed response.

use crate::error::IdentityError;
use reqwest::{Client, Method, RequestBuilder, Response, header::CONTENT_TYPE};
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct RequestHelper {
    client: Client,
}

impl RequestHelper {
    pub fn new(timeout: Duration) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IdentityError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Issue a request. `configure` adds headers, query and body to the builder.
    pub async fn request<F>(
        &self,
        method: Method,
        url: &str,
        configure: F,
    ) -> Result<Response, IdentityError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        tracing::debug!(
            name = "http.request",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            method = %method,
            url = %url,
            message = "Sending request"
        );
        let started = Instant::now();
        let response = configure(self.client.request(method.clone(), url))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    name = "http.request.failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    method = %method,
                    url = %url,
                    error = %e,
                    message = "Request failed before a response was received"
                );
                IdentityError::Transport(e.to_string())
            })?;

        tracing::debug!(
            name = "http.response",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            method = %method,
            url = %url,
            status = %response.status(),
            content_type = ?response.headers().get(CONTENT_TYPE),
            elapsed_ms = started.elapsed().as_millis() as u64,
            message = "Received response"
        );
        Ok(response)
    }

    pub async fn get<F>(&self, url: &str, configure: F) -> Result<Response, IdentityError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        self.request(Method::GET, url, configure).await
    }

    pub async fn post<F>(&self, url: &str, configure: F) -> Result<Response, IdentityError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        self.request(Method::POST, url, configure).await
    }

    pub async fn put<F>(&self, url: &str, configure: F) -> Result<Response, IdentityError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        self.request(Method::PUT, url, configure).await
    }

    pub async fn delete<F>(&self, url: &str, configure: F) -> Result<Response, IdentityError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        self.request(Method::DELETE, url, configure).await
    }

    pub async fn patch<F>(&self, url: &str, configure: F) -> Result<Response, IdentityError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        self.request(Method::PATCH, url, configure).await
    }

    pub async fn options<F>(&self, url: &str, configure: F) -> Result<Response, IdentityError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        self.request(Method::OPTIONS, url, configure).await
    }
}

/// True when the identity provider rejected a call.
///
/// Redirects, client errors and server errors all count, so an error page is never
/// decoded as data.
pub fn is_failure(status: reqwest::StatusCode) -> bool {
    !status.is_success()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn success_statuses_are_not_failures() {
        assert!(!is_failure(StatusCode::OK));
        assert!(!is_failure(StatusCode::CREATED));
        assert!(!is_failure(StatusCode::NO_CONTENT));
    }

    #[test]
    fn client_and_server_errors_are_failures() {
        assert!(is_failure(StatusCode::UNAUTHORIZED));
        assert!(is_failure(StatusCode::CONFLICT));
        assert!(is_failure(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_failure(StatusCode::FOUND));
    }

    #[tokio::test]
    async fn every_verb_reaches_the_server() {
        use wiremock::{Mock, MockServer, ResponseTemplate, matchers::path};

        let server = MockServer::start().await;
        Mock::given(path("/admin"))
            .respond_with(ResponseTemplate::new(204))
            .expect(6)
            .mount(&server)
            .await;

        let helper = RequestHelper::new(Duration::from_secs(2)).unwrap();
        let url = format!("{}/admin", server.uri());
        for response in [
            helper.get(&url, |b| b).await,
            helper.post(&url, |b| b.body("{}")).await,
            helper.put(&url, |b| b.body("{}")).await,
            helper.delete(&url, |b| b).await,
            helper.patch(&url, |b| b.body("{}")).await,
            helper.options(&url, |b| b).await,
        ] {
            assert_eq!(response.unwrap().status(), StatusCode::NO_CONTENT);
        }

        let methods: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.method.to_string())
            .collect();
        assert_eq!(methods, ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"]);
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let helper = RequestHelper::new(Duration::from_secs(2)).unwrap();
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let err = helper
            .get(&format!("http://{addr}/"), |b| b)
            .await
            .expect_err("request should fail");
        assert!(matches!(err, IdentityError::Transport(_)));
    }
}
