//! Core HTTP client for GitHub API

use compact_str::{CompactString, format_compact};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::{
    config::ClientConfig,
    error::{ClientError, Result},
    pagination::{PageLinks, Pages, links_from_headers},
};
use crate::{
    domain::{DiscussionsData, GraphqlResponse, IssueDto, PullDto, RepositoryDto, UserDto},
    id::RepoName,
};

const DISCUSSIONS_QUERY: &str = r#"
query ($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    discussions(first: 100) {
      nodes {
        id
        title
        createdAt
        url
        upvoteCount
        answerChosenAt
        author {
          login
        }
        category {
          name
        }
        comments {
          totalCount
        }
      }
    }
  }
}
"#;

/// Pure HTTP client for GitHub API
#[derive(Debug)]
pub struct GithubApi {
    client: Client,
    config: ClientConfig,
}

/// GitHub API error response format
#[derive(Debug, Deserialize)]
struct GithubApiError {
    message: CompactString,
}

/// Outcome of the discussions query. A non-success status is reported, not
/// raised, so callers can decide how loud to be about it.
#[derive(Debug)]
pub enum DiscussionsResponse {
    Success(GraphqlResponse<DiscussionsData>),
    Failed { status: StatusCode, body: String },
}

impl GithubApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(config.request.user_agent.as_str())
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { client, config })
    }

    /// The user owning the token
    #[instrument(skip(self))]
    pub async fn get_authenticated_user(&self) -> Result<UserDto> {
        let url = format_compact!("{}/user", self.config.base_url);
        self.get_json(&url).await
    }

    #[instrument(skip(self), fields(repo = %repo))]
    pub async fn get_repository(&self, repo: &RepoName) -> Result<RepositoryDto> {
        let url = format_compact!("{}/repos/{}", self.config.base_url, repo);
        self.get_json(&url).await.map_err(|e| match e {
            ClientError::NotFound { .. } => ClientError::not_found(format_compact!("Repository {repo}")),
            e => e,
        })
    }

    /// All issues regardless of state. The endpoint also returns pull requests.
    pub fn issues(&self, repo: &RepoName) -> Pages<'_, IssueDto> {
        Pages::new(self, self.list_url(repo, "issues"))
    }

    #[instrument(skip(self), fields(repo = %repo, number = number))]
    pub async fn get_issue(&self, repo: &RepoName, number: u64) -> Result<IssueDto> {
        let url = format_compact!("{}/repos/{}/issues/{}", self.config.base_url, repo, number);
        self.get_json(&url).await
    }

    /// All pull requests regardless of state
    pub fn pulls(&self, repo: &RepoName) -> Pages<'_, PullDto> {
        Pages::new(self, self.list_url(repo, "pulls"))
    }

    #[instrument(skip(self), fields(repo = %repo, number = number))]
    pub async fn get_pull(&self, repo: &RepoName, number: u64) -> Result<PullDto> {
        let url = format_compact!("{}/repos/{}/pulls/{}", self.config.base_url, repo, number);
        self.get_json(&url).await
    }

    /// First 100 discussions of a repository via GraphQL
    #[instrument(skip(self), fields(repo = %repo))]
    pub async fn get_discussions(&self, repo: &RepoName) -> Result<DiscussionsResponse> {
        let payload = json!({
            "query": DISCUSSIONS_QUERY,
            "variables": { "owner": repo.owner(), "repo": repo.name() },
        });

        let response = self
            .authenticated(self.client.post(self.config.graphql_url.as_str()))
            .header("Content-Type", "application/json")
            .body(payload.to_string())
            .send()
            .await?;

        let status = response.status();
        let path = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            return Ok(DiscussionsResponse::Failed { status, body });
        }

        let parsed: GraphqlResponse<DiscussionsData> = serde_json::from_str(&body)
            .map_err(|e| ClientError::json_parse(path, "Failed to parse GraphQL response", e))?;
        for error in &parsed.errors {
            warn!(message = %error.message, "GraphQL query reported an error");
        }
        Ok(DiscussionsResponse::Success(parsed))
    }

    pub(crate) async fn get_page<T>(&self, url: &str) -> Result<(Vec<T>, PageLinks)>
    where
        T: DeserializeOwned,
    {
        let response = self.authenticated(self.client.get(url)).send().await?;
        let links = links_from_headers(response.headers());
        let items = self.handle_response(response).await?;
        Ok((items, links))
    }

    fn list_url(&self, repo: &RepoName, resource: &str) -> String {
        format!(
            "{}/repos/{}/{}?state=all&per_page={}",
            self.config.base_url, repo, resource, self.config.request.per_page
        )
    }

    /// Perform authenticated GET request and deserialize JSON response
    async fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.authenticated(self.client.get(url)).send().await?;
        self.handle_response(response).await
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(self.config.token.as_str())
            .header("Accept", "application/vnd.github+json")
    }

    /// Handle HTTP response and deserialize JSON
    async fn handle_response<T>(&self, response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url_path = response.url().path().to_string();
        let status = response.status();
        let rate_limit_reset = response
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .map(CompactString::from);
        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                debug!(path = %url_path, body = %body, "Unparsable response body");
                ClientError::json_parse(url_path, "Failed to parse response", e)
            })
        } else {
            Err(handle_error_response(status.as_u16(), &body, rate_limit_reset))
        }
    }
}

/// Map error responses from GitHub API
fn handle_error_response(status: u16, body: &str, reset: Option<CompactString>) -> ClientError {
    let message = serde_json::from_str::<GithubApiError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.into());

    match status {
        401 => ClientError::Authentication,
        403 | 429 if message.to_lowercase().contains("rate limit") => ClientError::rate_limit(reset),
        404 => ClientError::not_found("Resource"),
        _ => ClientError::github_api(format_compact!("HTTP {}: {}", status, message)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path, query_param},
    };

    use super::*;

    async fn api_for(server: &MockServer) -> GithubApi {
        GithubApi::new(ClientConfig::new("ghp_testtoken").with_base_url(server.uri())).unwrap()
    }

    fn repo() -> RepoName {
        RepoName::new("acme", "widgets")
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", "Bearer ghp_testtoken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "octocat" })))
            .expect(1)
            .mount(&server)
            .await;

        let user = api_for(&server).await.get_authenticated_user().await.unwrap();
        assert_eq!(user.login, "octocat");
    }

    #[tokio::test]
    async fn slow_responses_are_not_cut_off() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "login": "octocat" }))
                    .set_delay(std::time::Duration::from_secs(31)),
            )
            .mount(&server)
            .await;

        let user = api_for(&server).await.get_authenticated_user().await.unwrap();
        assert_eq!(user.login, "octocat");
    }

    #[tokio::test]
    async fn maps_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        assert!(matches!(
            api.get_authenticated_user().await,
            Err(ClientError::Authentication)
        ));
        let err = api.get_repository(&repo()).await.unwrap_err();
        assert_eq!(err.to_string(), "Repository acme/widgets not found");
    }

    #[test]
    fn rate_limit_needs_matching_message() {
        let err = handle_error_response(
            403,
            r#"{"message":"API rate limit exceeded for user ID 1."}"#,
            Some("1700000000".into()),
        );
        assert!(matches!(err, ClientError::RateLimit { reset: Some(_) }));

        let err = handle_error_response(403, r#"{"message":"Resource not accessible"}"#, None);
        assert_eq!(
            err.to_string(),
            "GitHub API error: HTTP 403: Resource not accessible"
        );
    }

    #[tokio::test]
    async fn follows_next_links_lazily() {
        let server = MockServer::start().await;
        let next = format!("{}/repositories/1/pulls?state=all&page=2", server.uri());
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls"))
            .and(query_param("state", "all"))
            .and(query_param("per_page", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", format!(r#"<{next}>; rel="next""#).as_str())
                    .set_body_json(json!([{
                        "number": 1,
                        "html_url": "https://github.com/acme/widgets/pull/1",
                        "state": "open",
                        "created_at": "2024-01-01T00:00:00Z",
                        "closed_at": null
                    }])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repositories/1/pulls"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "number": 2,
                "html_url": "https://github.com/acme/widgets/pull/2",
                "state": "closed",
                "created_at": "2024-01-01T00:00:00Z",
                "closed_at": "2024-01-02T00:00:00Z"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let mut pages = api.pulls(&repo());
        assert_eq!(pages.pages_fetched(), 0);

        let first = pages.next_page().await.unwrap().unwrap();
        assert_eq!(first[0].number, 1);
        let second = pages.next_page().await.unwrap().unwrap();
        assert_eq!(second[0].number, 2);
        assert!(pages.next_page().await.unwrap().is_none());
        assert_eq!(pages.pages_fetched(), 2);
    }

    #[tokio::test]
    async fn discussions_query_carries_owner_and_repo() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("authorization", "Bearer ghp_testtoken"))
            .and(body_partial_json(json!({
                "variables": { "owner": "acme", "repo": "widgets" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "repository": { "discussions": { "nodes": [] } } },
                "errors": [{ "message": "partial failure" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = api_for(&server).await.get_discussions(&repo()).await.unwrap();
        match response {
            DiscussionsResponse::Success(parsed) => {
                assert_eq!(parsed.errors.len(), 1);
                assert!(parsed.into_discussions().is_empty());
            },
            DiscussionsResponse::Failed { status, .. } => panic!("unexpected status {status}"),
        }
    }

    #[tokio::test]
    async fn discussions_failure_is_reported_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(502).set_body_json(json!({ "message": "Bad gateway" })),
            )
            .mount(&server)
            .await;

        let response = api_for(&server).await.get_discussions(&repo()).await.unwrap();
        assert!(matches!(
            response,
            DiscussionsResponse::Failed { status, ref body }
                if status == StatusCode::BAD_GATEWAY && body.contains("Bad gateway")
        ));
    }
}
