use async_trait::async_trait;
use gloo_net::http::Request;
use smarthome_panel_core::{ApiError, ApiRequest, ApiTransport, HttpMethod, RawResponse};

/// Same-origin fetch transport. Request urls are already rooted at the api
/// base path.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct GlooTransport;

#[async_trait(?Send)]
impl ApiTransport for GlooTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        let builder = match request.method {
            HttpMethod::Get => Request::get(&request.url),
            HttpMethod::Post => Request::post(&request.url),
            HttpMethod::Put => Request::put(&request.url),
            HttpMethod::Patch => Request::patch(&request.url),
            HttpMethod::Delete => Request::delete(&request.url),
        };
        let response = builder.send().await.map_err(map_network_error)?;

        let status = response.status();
        let content_type = response.headers().get("content-type");
        let body = response.text().await.map_err(map_network_error)?;
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

fn map_network_error(error: gloo_net::Error) -> ApiError {
    ApiError::transport(format!("network request failed: {error}"))
}
