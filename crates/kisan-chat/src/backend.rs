//! Transport to the inference backend.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};

use crate::error::ChatError;
use crate::request::{BackendInfo, ChatReply, ImageChatForm, OutboundRequest, CONFIG_PATH};

/// Request/response service behind the dispatcher.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch the backend's public configuration.
    async fn fetch_info(&self) -> Result<BackendInfo, ChatError>;

    /// Perform exactly one call for `request`.
    async fn send(&self, request: &OutboundRequest) -> Result<ChatReply, ChatError>;
}

/// reqwest-backed [`Backend`].
///
/// There is no client-side timeout and no retry.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn image_form(form: &ImageChatForm) -> Result<Form, ChatError> {
        let image = Part::bytes(form.image.bytes().to_vec())
            .file_name(form.image.name().to_string())
            .mime_str(form.image.media_type())
            .map_err(|_| ChatError::InvalidAttachmentType(form.image.media_type().to_string()))?;

        let mut multipart = Form::new()
            .text("message", form.message.clone())
            .part("image", image);
        if let Some(location) = &form.location {
            multipart = multipart.text("location", location.clone());
        }
        if let Some(session_id) = &form.session_id {
            multipart = multipart.text("session_id", session_id.clone());
        }
        if let Some(api_key) = &form.api_key {
            multipart = multipart.text("api_key", api_key.clone());
        }
        Ok(multipart)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    result: reqwest::Result<Response>,
) -> Result<T, ChatError> {
    let response = result.map_err(|err| {
        tracing::warn!(endpoint, error = %err, "Backend request failed");
        ChatError::BackendUnavailable(format!("{endpoint}: {err}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(endpoint, status = %status, "Backend returned an error status");
        return Err(ChatError::BackendUnavailable(format!("{endpoint}: status {status}")));
    }

    response.json::<T>().await.map_err(|err| {
        tracing::warn!(endpoint, error = %err, "Backend response was not valid JSON");
        ChatError::BackendUnavailable(format!("{endpoint}: malformed response: {err}"))
    })
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_info(&self) -> Result<BackendInfo, ChatError> {
        let result = self.client.get(self.url(CONFIG_PATH)).send().await;
        read_json(CONFIG_PATH, result).await
    }

    async fn send(&self, request: &OutboundRequest) -> Result<ChatReply, ChatError> {
        let endpoint = request.endpoint();
        let builder = self.client.post(self.url(endpoint));
        let builder = match request {
            OutboundRequest::Text(body) => builder.json(body),
            OutboundRequest::Voice(body) => builder.json(body),
            OutboundRequest::Image(form) => builder.multipart(Self::image_form(form)?),
        };

        tracing::debug!(endpoint, "Sending turn to backend");
        read_json(endpoint, builder.send().await).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:8000/");
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url("/api/chat"), "http://localhost:8000/api/chat");
    }

    #[test]
    fn test_image_form_rejects_unparseable_media_type() {
        let form = ImageChatForm {
            message: "what is this".into(),
            image: crate::attachment::AttachmentFile::new("x", "not a mime", vec![1]),
            attachment_id: uuid::Uuid::new_v4(),
            location: None,
            session_id: None,
            api_key: None,
        };
        let err = HttpBackend::image_form(&form).unwrap_err();
        assert!(matches!(err, ChatError::InvalidAttachmentType(_)));
    }
}
