//! Client for the external ASCII-art rendering endpoint.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::RenderError;

lazy_static! {
    static ref PRE_BLOCK: Regex = Regex::new(r"(?is)<pre[^>]*>(.*?)</pre>").unwrap();
    static ref INNER_TAG: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
}

/// Turns user text into ASCII art.
#[async_trait]
pub trait AsciiRenderer: Send + Sync {
    async fn render(&self, text: &str) -> Result<String, RenderError>;
}

/// Pull the text content of the first `<pre>` block out of an HTML document.
///
/// Returns `None` when there is no block or it is empty.
pub fn extract_preformatted(html: &str) -> Option<String> {
    let inner = PRE_BLOCK.captures(html)?.get(1)?.as_str();
    let stripped = INNER_TAG.replace_all(inner, "");
    let text = html_escape::decode_html_entities(&stripped).into_owned();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Posts the `UserInput` form field to the ASCII endpoint.
#[derive(Debug, Clone)]
pub struct HttpAsciiRenderer {
    client: reqwest::Client,
    endpoint: String,
    max_input_len: usize,
}

impl HttpAsciiRenderer {
    pub const FORM_FIELD: &'static str = "UserInput";

    pub fn new(endpoint: impl Into<String>, max_input_len: usize) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, max_input_len)
    }

    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        max_input_len: usize,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            max_input_len,
        }
    }
}

#[async_trait]
impl AsciiRenderer for HttpAsciiRenderer {
    async fn render(&self, text: &str) -> Result<String, RenderError> {
        let len = text.chars().count();
        if len > self.max_input_len {
            return Err(RenderError::InputTooLong {
                len,
                max: self.max_input_len,
            });
        }

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[(Self::FORM_FIELD, text)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        extract_preformatted(&body).ok_or(RenderError::MissingPreBlock)
    }
}
