use thiserror::Error;

/// Transport-level failure while fetching one page.
///
/// Missing markup is never reported through this type; extraction resolves
/// absent elements to empty fields instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to `{url}` failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected HTTP status {status} from `{url}`")]
    HttpStatus { url: String, status: u16 },
    #[error("failed to read body of `{url}`: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ScrapeError {
    pub fn request(url: &str, source: reqwest::Error) -> Self {
        Self::Request {
            url: url.to_string(),
            source,
        }
    }

    pub fn body(url: &str, source: reqwest::Error) -> Self {
        Self::Body {
            url: url.to_string(),
            source,
        }
    }
}
