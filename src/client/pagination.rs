//! Link-header driven pagination for GitHub REST list endpoints

use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{api::GithubApi, error::Result};

/// Links extracted from GitHub's `Link` response header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// URL of the next page (`rel="next"`)
    pub next: Option<String>,
    /// URL of the last page (`rel="last"`)
    pub last: Option<String>,
}

/// Parse the Link header.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/repositories/1/issues?page=2>; rel="next", <...?page=5>; rel="last"`
pub fn parse_link_header(link_header: &str) -> PageLinks {
    let mut links = PageLinks::default();

    for part in link_header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(value) = segment.strip_prefix("rel=") {
                rel = Some(value.trim_matches('"'));
            }
        }

        if let (Some(url), Some(rel)) = (url, rel) {
            match rel {
                "next" => links.next = Some(url.to_string()),
                "last" => links.last = Some(url.to_string()),
                _ => {},
            }
        }
    }

    links
}

pub(crate) fn links_from_headers(headers: &HeaderMap) -> PageLinks {
    headers
        .get(LINK)
        .and_then(|v| v.to_str().ok())
        .map(parse_link_header)
        .unwrap_or_default()
}

/// Lazy cursor over a paginated list endpoint.
///
/// Each call to [`Pages::next_page`] performs at most one request; nothing is
/// fetched until the caller asks for it.
#[derive(Debug)]
pub struct Pages<'a, T> {
    api: &'a GithubApi,
    next_url: Option<String>,
    fetched: u32,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> Pages<'a, T> {
    pub(crate) fn new(api: &'a GithubApi, first_url: String) -> Self {
        Self {
            api,
            next_url: Some(first_url),
            fetched: 0,
            _marker: std::marker::PhantomData,
        }
    }

    /// Fetch the next page, or `None` once the `rel="next"` chain ends.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };

        let (items, links): (Vec<T>, PageLinks) = self.api.get_page(&url).await?;
        self.fetched += 1;
        debug!(
            page = self.fetched,
            items = items.len(),
            has_next = links.next.is_some(),
            last = links.last.as_deref().unwrap_or("-"),
            "Fetched page"
        );
        self.next_url = links.next;
        Ok(Some(items))
    }

    /// Number of pages fetched so far
    pub fn pages_fetched(&self) -> u32 {
        self.fetched
    }
}
