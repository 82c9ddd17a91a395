use std::borrow::Cow;

/// One fetch result as handed over by the fetcher.
///
/// `body` is `None` when the fetcher got no response object at all; an
/// empty vector means a response arrived without content.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub requested_url: String,
    /// URL after redirects; falls back to `requested_url` when empty
    pub final_url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl FetchedPage {
    pub fn new(requested_url: impl Into<String>, status: u16) -> Self {
        Self {
            requested_url: requested_url.into(),
            status,
            ..Default::default()
        }
    }

    pub fn with_final_url(mut self, final_url: impl Into<String>) -> Self {
        self.final_url = final_url.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn resolved_url(&self) -> &str {
        if self.final_url.trim().is_empty() {
            &self.requested_url
        } else {
            &self.final_url
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// MIME type from the `content-type` header, without parameters.
    pub fn mime(&self) -> Option<String> {
        self.header("content-type")
            .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
    }

    /// False only when a content type is declared and it is not HTML.
    pub fn declares_html_or_unknown(&self) -> bool {
        self.mime().is_none_or(|mime| mime.contains("html"))
    }

    /// Body decoded as UTF-8, dropping invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        match &self.body {
            Some(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Cow::Borrowed(text),
                Err(_) => Cow::Owned(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()),
            },
            None => Cow::Borrowed(""),
        }
    }
}
