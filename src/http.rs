//! Minimal blocking HTTP client for fetching the responses to be checked.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{DriftError, Result};

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(format!(
                "Invalid method '{s}'. Expected one of: GET, POST, PUT, PATCH, DELETE"
            )),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub expect_status: Option<u16>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            expect_status: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, url).body(body)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expect_status = Some(status);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub text: String,
}

impl HttpResponse {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.text).map_err(|error| DriftError::BadInput {
            detail: format!("response body is not JSON: {error}"),
        })
    }
}

/// Perform `request`. Transport failures and a status other than
/// `expect_status` are errors; any other status is returned as-is.
pub fn fetch(request: &HttpRequest) -> Result<HttpResponse> {
    let agent = ureq::AgentBuilder::new().timeout(request.timeout).build();
    let mut call = agent
        .request(request.method.as_str(), &request.url)
        .set("Accept", "application/json");
    for (name, value) in &request.headers {
        call = call.set(name, value);
    }

    tracing::debug!(method = %request.method, url = %request.url, "fetching");
    let sent = match &request.body {
        Some(body) => call.send_json(body),
        None => call.call(),
    };
    let response = match sent {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(transport)) => {
            return Err(DriftError::Network {
                url: request.url.clone(),
                detail: transport.to_string(),
            });
        }
    };

    let status = response.status();
    if let Some(expected) = request.expect_status
        && status != expected
    {
        return Err(DriftError::UnexpectedStatus {
            url: request.url.clone(),
            status,
            expected,
        });
    }

    let text = response.into_string().map_err(|error| DriftError::Network {
        url: request.url.clone(),
        detail: error.to_string(),
    })?;
    tracing::debug!(status, bytes = text.len(), "fetched");

    Ok(HttpResponse { status, text })
}

/// Fetch and decode a JSON response body.
pub fn fetch_json(request: &HttpRequest) -> Result<Value> {
    fetch(request)?.json()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_methods_case_insensitively() {
        assert_eq!(Method::from_str("get").expect("get"), Method::Get);
        assert_eq!(Method::from_str("Post").expect("post"), Method::Post);
        assert!(Method::from_str("TRACE").is_err());
    }

    #[test]
    fn post_builder_carries_body() {
        let request = HttpRequest::post(
            "https://api.example.com/v2/orders",
            serde_json::json!({ "product": "Widget", "quantity": 5 }),
        )
        .expect_status(201);

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body.as_ref().map(|body| &body["quantity"]), Some(&serde_json::json!(5)));
        assert_eq!(request.expect_status, Some(201));
    }

    #[test]
    fn non_json_body_is_bad_input() {
        let response = HttpResponse {
            status: 200,
            text: "<html></html>".to_owned(),
        };
        assert!(matches!(response.json(), Err(DriftError::BadInput { .. })));
    }
}
