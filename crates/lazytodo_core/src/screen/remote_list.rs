//! Remote posts list (display-only demo screen).
//!
//! # Responsibility
//! - Fetch the fixed posts endpoint and expose loading/loaded/failed state.
//!
//! # Invariants
//! - A new `RemoteList` starts in `Loading`.
//! - Every refresh ends in `Loaded` or `Failed`; the user-facing failure
//!   message is fixed, the underlying error only goes to the log.

use log::{error, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

pub const POSTS_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch data";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// One row of the posts list; extra JSON fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
}

#[derive(Debug)]
pub enum RemoteError {
    Http(reqwest::Error),
    Status(u16),
    Decode(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "http request failed: {err}"),
            Self::Status(code) => write!(f, "unexpected http status {code}"),
            Self::Decode(message) => write!(f, "invalid posts payload: {message}"),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Source of posts for the remote list.
pub trait PostSource {
    fn fetch_posts(&self) -> Result<Vec<Post>, RemoteError>;
}

/// Blocking HTTP source for `POSTS_ENDPOINT`.
pub struct HttpPostSource {
    client: Client,
    url: String,
}

impl HttpPostSource {
    pub fn new() -> Result<Self, RemoteError> {
        Self::with_url(POSTS_ENDPOINT)
    }

    pub fn with_url(url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(concat!("lazytodo/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl PostSource for HttpPostSource {
    fn fetch_posts(&self) -> Result<Vec<Post>, RemoteError> {
        let response = self.client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        response.json::<Vec<Post>>().map_err(|err| {
            if err.is_decode() {
                RemoteError::Decode(err.to_string())
            } else {
                RemoteError::Http(err)
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteListState {
    Loading,
    Loaded(Vec<Post>),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RemoteList {
    state: RemoteListState,
}

impl RemoteList {
    pub fn new() -> Self {
        Self {
            state: RemoteListState::Loading,
        }
    }

    pub fn state(&self) -> &RemoteListState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == RemoteListState::Loading
    }

    /// Fetches from `source` and settles the state.
    pub fn refresh(&mut self, source: &dyn PostSource) -> &RemoteListState {
        self.state = RemoteListState::Loading;
        let started_at = Instant::now();
        self.state = match source.fetch_posts() {
            Ok(posts) => {
                info!(
                    "event=posts_fetch module=screen status=ok count={} duration_ms={}",
                    posts.len(),
                    started_at.elapsed().as_millis()
                );
                RemoteListState::Loaded(posts)
            }
            Err(err) => {
                error!(
                    "event=posts_fetch module=screen status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                RemoteListState::Failed(FETCH_FAILED_MESSAGE.to_string())
            }
        };
        &self.state
    }
}

impl Default for RemoteList {
    fn default() -> Self {
        Self::new()
    }
}
