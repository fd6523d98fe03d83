use std::cell::{Cell, RefCell};

use async_trait::async_trait;

use crate::error::ApiError;
use crate::request::{ApiRequest, ApiTransport, HttpMethod, RawResponse};

#[derive(Debug, Clone)]
struct ScriptedRoute {
    method: HttpMethod,
    path: String,
    response: RawResponse,
}

/// In-process transport answering from canned responses.
///
/// Routes match on method and path (query ignored); the most recently
/// registered route wins. Unmatched requests get a plain-text 404. Every
/// request is recorded in send order.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: RefCell<Vec<ScriptedRoute>>,
    requests: RefCell<Vec<ApiRequest>>,
    offline: Cell<bool>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: HttpMethod, path: impl Into<String>, response: RawResponse) {
        self.routes.borrow_mut().push(ScriptedRoute {
            method,
            path: path.into(),
            response,
        });
    }

    /// Makes every following request fail at the transport level.
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    #[must_use]
    pub fn request_urls(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|request| format!("{} {}", request.method, request.url))
            .collect()
    }
}

#[async_trait(?Send)]
impl ApiTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        self.requests.borrow_mut().push(request.clone());
        if self.offline.get() {
            return Err(ApiError::transport("Failed to fetch"));
        }

        let path = request.path();
        let response = self
            .routes
            .borrow()
            .iter()
            .rev()
            .find(|route| route.method == request.method && route.path == path)
            .map(|route| route.response.clone());
        Ok(response.unwrap_or_else(|| RawResponse::text(404, format!("no route for {path}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn latest_route_wins_and_query_is_ignored() {
        let transport = ScriptedTransport::new();
        transport.respond(HttpMethod::Get, "/api/status", RawResponse::text(200, "old"));
        transport.respond(HttpMethod::Get, "/api/status", RawResponse::text(200, "new"));

        let request = ApiRequest {
            method: HttpMethod::Get,
            url: "/api/status?verbose=true".to_string(),
        };
        let response = transport.send(&request).await.expect("scripted response");

        assert_eq!(response.body, "new");
        assert_eq!(transport.request_urls(), vec!["GET /api/status?verbose=true"]);
    }

    #[tokio::test]
    async fn unmatched_and_offline_requests_are_still_recorded() {
        let transport = ScriptedTransport::new();
        let request = ApiRequest {
            method: HttpMethod::Post,
            url: "/api/mode/AWAY".to_string(),
        };

        let missing = transport.send(&request).await.expect("404 response");
        assert_eq!(missing.status, 404);

        transport.set_offline(true);
        assert_eq!(
            transport.send(&request).await,
            Err(ApiError::transport("Failed to fetch"))
        );
        assert_eq!(transport.requests().len(), 2);
    }
}
