use super::ScrapeError;
use crate::config::ScraperConfig;
use reqwest::{Response, StatusCode};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// One logged-in browsing session. The cookie store carries the
/// authentication from the login form to every later page fetch.
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .cookie_store(true);

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }

    /// Submit a urlencoded form. The status is returned, not checked.
    pub async fn post_form(&self, url: &Url, fields: &[(&str, &str)]) -> reqwest::Result<StatusCode> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();

        debug!("POST {}", url);
        let resp = self
            .inner
            .post(url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        Ok(resp.status())
    }

    async fn get(&self, url: &Url) -> reqwest::Result<Response> {
        debug!("GET {}", url);
        let resp = self.inner.get(url.clone()).send().await?;
        if !resp.status().is_success() {
            debug!("GET {} answered {}", url, resp.status());
        }
        Ok(resp)
    }

    /// Fetch a page body as text, decoded with the charset the server declares.
    pub async fn get_text(&self, url: &Url) -> reqwest::Result<String> {
        self.get(url).await?.text().await
    }

    /// Fetch a page body that is always UTF-8, whatever its Content-Type says.
    pub async fn get_utf8(&self, url: &Url) -> Result<String, ScrapeError> {
        let bytes = self.get(url).await?.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|source| ScrapeError::Encoding {
            url: url.to_string(),
            source,
        })
    }
}
