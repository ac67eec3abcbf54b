use reqwest::{
    header::{HeaderMap, HeaderValue, InvalidHeaderValue},
    Client, StatusCode,
};
use snafu::{OptionExt, ResultExt, Snafu};
use std::{fmt, sync::Arc};
use tracing::debug;
use url::Url;

use crate::generation::{ContentBuilder, GenerateContentRequest, GenerationResponse};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Environment variables consulted for the API key, in order of precedence.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];
/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV_VAR: &str = "GOOGLE_GEMINI_BASE_URL";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "no API key found; set {} or {}",
        API_KEY_ENV_VARS[0],
        API_KEY_ENV_VARS[1]
    ))]
    MissingApiKey,

    #[snafu(display("API key is not a valid header value"))]
    InvalidApiKey { source: InvalidHeaderValue },

    #[snafu(display("invalid base URL '{url}'"))]
    InvalidBaseUrl { source: url::ParseError, url: String },

    #[snafu(display("failed to build the HTTP client"))]
    BuildHttpClient { source: reqwest::Error },

    #[snafu(display("failed to construct URL (probably incorrect model name): {suffix}"))]
    ConstructUrl {
        source: url::ParseError,
        suffix: String,
    },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// HTTP error description
        description: Option<String>,
    },

    #[snafu(display("failed to read response body"))]
    ReadBody { source: reqwest::Error },

    #[snafu(display("failed to deserialize JSON response"))]
    Deserialize { source: serde_json::Error },
}

/// Gemini model identifiers
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Model {
    #[default]
    Gemini25Flash,
    Gemini25FlashLite,
    Gemini25Pro,
    /// Any other model, with or without the `models/` prefix
    Custom(String),
}

impl Model {
    /// The API resource name, always prefixed with `models/`.
    pub fn as_resource_name(&self) -> String {
        match self {
            Model::Gemini25Flash => "models/gemini-2.5-flash".to_string(),
            Model::Gemini25FlashLite => "models/gemini-2.5-flash-lite".to_string(),
            Model::Gemini25Pro => "models/gemini-2.5-pro".to_string(),
            Model::Custom(name) if name.starts_with("models/") => name.clone(),
            Model::Custom(name) => format!("models/{name}"),
        }
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::Custom(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::Custom(model.to_string())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_resource_name())
    }
}

/// Internal client for making requests to the Gemini API
pub(crate) struct GeminiClient {
    http_client: Client,
    base_url: Url,
}

impl GeminiClient {
    fn new(api_key: &str, base_url: Url) -> Result<Self, Error> {
        let mut api_key = HeaderValue::from_str(api_key).context(InvalidApiKeySnafu)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let http_client = Client::builder()
            .default_headers(headers)
            .build()
            .context(BuildHttpClientSnafu)?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Generate content
    pub(crate) async fn generate_content_raw(
        &self,
        model: &Model,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        let url = self.build_url(model, "generateContent")?;
        debug!(%url, "sending generateContent request");

        let response = self
            .http_client
            .post(url.clone())
            .json(&request)
            .send()
            .await
            .context(PerformRequestSnafu { url })?;

        let status = response.status();
        let body = response.bytes().await.context(ReadBodySnafu)?;
        check_status(status, &body)?;

        serde_json::from_slice(&body).context(DeserializeSnafu)
    }

    /// Build a URL for the API
    fn build_url(&self, model: &Model, endpoint: &str) -> Result<Url, Error> {
        let suffix = format!("{}:{endpoint}", model.as_resource_name());
        self.base_url
            .join(&suffix)
            .context(ConstructUrlSnafu { suffix })
    }
}

fn check_status(status: StatusCode, body: &[u8]) -> Result<(), Error> {
    if status.is_success() {
        return Ok(());
    }
    let description = String::from_utf8_lossy(body).trim().to_string();
    BadResponseSnafu {
        code: status.as_u16(),
        description: (!description.is_empty()).then_some(description),
    }
    .fail()
}

/// Parses a base URL, making sure relative endpoint paths are appended to it.
fn parse_base_url(url: &str) -> Result<Url, Error> {
    let normalized = if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    };
    Url::parse(&normalized).context(InvalidBaseUrlSnafu { url })
}

/// Client for the Gemini API
#[derive(Clone)]
pub struct Gemini {
    client: Arc<GeminiClient>,
}

impl Gemini {
    /// Create a new client with the specified API key
    pub fn new(api_key: impl AsRef<str>) -> Result<Self, Error> {
        Self::with_base_url(api_key, parse_base_url(DEFAULT_BASE_URL)?)
    }

    /// Create a new client with custom base URL
    pub fn with_base_url(api_key: impl AsRef<str>, base_url: Url) -> Result<Self, Error> {
        let client = GeminiClient::new(api_key.as_ref(), base_url)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Create a new client from the ambient environment.
    ///
    /// The API key comes from `GOOGLE_API_KEY`, then `GEMINI_API_KEY`; the first
    /// non-empty one wins. `GOOGLE_GEMINI_BASE_URL` overrides the base URL.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
            .context(MissingApiKeySnafu)?;

        let base_url = match std::env::var(BASE_URL_ENV_VAR) {
            Ok(url) if !url.trim().is_empty() => parse_base_url(url.trim())?,
            _ => parse_base_url(DEFAULT_BASE_URL)?,
        };

        Self::with_base_url(api_key, base_url)
    }

    /// Start building a content generation request
    pub fn generate_content(&self) -> ContentBuilder {
        ContentBuilder::new(self.client.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap();
        let backup: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, _)| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        for (key, value) in vars {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
        f();
        for (key, value) in backup {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_model_resource_names() {
        assert_eq!(Model::default().to_string(), "models/gemini-2.5-flash");
        assert_eq!(Model::Gemini25Pro.to_string(), "models/gemini-2.5-pro");
        assert_eq!(
            Model::from("gemini-2.0-flash").as_resource_name(),
            "models/gemini-2.0-flash"
        );
        assert_eq!(
            Model::from("models/gemini-2.0-flash").as_resource_name(),
            "models/gemini-2.0-flash"
        );
    }

    #[test]
    fn test_build_url_appends_model_and_endpoint() {
        let client = GeminiClient::new(
            "test-key",
            parse_base_url("http://localhost:8080/v1beta").unwrap(),
        )
        .unwrap();

        let url = client
            .build_url(&Model::Gemini25Flash, "generateContent")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(url.query().is_none(), "API key must not leak into the URL");
    }

    #[test]
    fn test_check_status_keeps_body_verbatim() {
        let err = check_status(StatusCode::FORBIDDEN, br#"{"error":{"code":403}}"#).unwrap_err();
        match err {
            Error::BadResponse { code, description } => {
                assert_eq!(code, 403);
                assert_eq!(description.as_deref(), Some(r#"{"error":{"code":403}}"#));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(check_status(StatusCode::OK, b"").is_ok());
    }

    #[test]
    fn test_invalid_api_key_is_rejected() {
        assert!(matches!(
            Gemini::new("bad\nkey"),
            Err(Error::InvalidApiKey { .. })
        ));
    }

    #[test]
    fn test_from_env_without_key_fails() {
        with_env(
            &[
                ("GOOGLE_API_KEY", None),
                ("GEMINI_API_KEY", Some("  ")),
                (BASE_URL_ENV_VAR, None),
            ],
            || {
                assert!(matches!(Gemini::from_env(), Err(Error::MissingApiKey)));
            },
        );
    }

    #[test]
    fn test_from_env_falls_back_to_gemini_key() {
        with_env(
            &[
                ("GOOGLE_API_KEY", None),
                ("GEMINI_API_KEY", Some("test-key")),
                (BASE_URL_ENV_VAR, Some("http://localhost:9999/v1beta")),
            ],
            || {
                let gemini = Gemini::from_env().unwrap();
                assert_eq!(
                    gemini.client.base_url.as_str(),
                    "http://localhost:9999/v1beta/"
                );
            },
        );
    }

    #[test]
    fn test_from_env_rejects_bad_base_url() {
        with_env(
            &[
                ("GOOGLE_API_KEY", Some("test-key")),
                (BASE_URL_ENV_VAR, Some("not a url")),
            ],
            || {
                assert!(matches!(
                    Gemini::from_env(),
                    Err(Error::InvalidBaseUrl { .. })
                ));
            },
        );
    }
}
