//! Backend provider implementation.
//!
//! This module implements the [`BackendProvider`] trait for [`ReqwestClient`].

use docqa_core::{BackendProvider, EncodedRequest, Envelope, Method, RequestBody};
use reqwest::multipart::{Form, Part};

use crate::connect::{ReqwestClient, TRACING_TARGET};
use crate::error::Error;

#[async_trait::async_trait]
impl BackendProvider for ReqwestClient {
    async fn send(&self, request: EncodedRequest) -> docqa_core::Result<Envelope> {
        let url = self.url_for(&request.path)?;

        tracing::trace!(
            target: TRACING_TARGET,
            method = %request.method,
            url = %url,
            query_params = request.query.len(),
            "Sending HTTP request"
        );

        let mut http_request = match request.method {
            Method::Get => self.http().get(url),
            Method::Post => self.http().post(url),
        };

        if !request.query.is_empty() {
            http_request = http_request.query(&request.query);
        }

        http_request = match request.body {
            RequestBody::Empty => http_request,
            RequestBody::Json(value) => http_request.json(&value),
            RequestBody::Multipart { field, document } => {
                let part = Part::bytes(document.bytes.to_vec()).file_name(document.file_name);
                http_request.multipart(Form::new().part(field, part))
            }
        };

        let http_response = http_request.send().await.map_err(Error::from)?;

        let status = http_response.status();
        let reason = status.canonical_reason().unwrap_or_default();
        let body = http_response.bytes().await.map_err(Error::from)?;

        tracing::trace!(
            target: TRACING_TARGET,
            status = status.as_u16(),
            body_len = body.len(),
            "Received HTTP response"
        );

        Ok(Envelope::new(status.as_u16(), reason, body))
    }
}
