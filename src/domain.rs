use chrono::{DateTime, Utc};
use compact_str::{CompactString, ToCompactString, format_compact};
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};

use crate::id::RepoName;

pub const NOT_AVAILABLE: &str = "N/A";
pub const STILL_OPEN: &str = "Still Open";
pub const UNKNOWN_AUTHOR: &str = "Unknown";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SECONDS_PER_DAY: i64 = 86_400;

/// Distinguishes a missing key from an explicit `null`, so records from list
/// endpoints (which omit some keys) can be told apart from complete ones.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDto {
    pub login: CompactString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelDto {
    pub name: CompactString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryDto {
    pub full_name: CompactString,
    pub html_url: CompactString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueDto {
    pub number: u64,
    pub html_url: CompactString,
    pub state: CompactString,
    pub body: Option<String>,
    pub user: Option<UserDto>,
    #[serde(default)]
    pub labels: Vec<LabelDto>,
    #[serde(default)]
    pub comments: u32,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Only the single-issue endpoint carries this key
    #[serde(default, deserialize_with = "present")]
    pub closed_by: Option<Option<UserDto>>,
}

impl IssueDto {
    /// Closed issues from the list endpoint lack `closed_by` and have to be
    /// fetched individually.
    pub fn needs_details(&self) -> bool {
        self.closed_at.is_some() && self.closed_by.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullDto {
    pub number: u64,
    pub html_url: CompactString,
    pub state: CompactString,
    pub body: Option<String>,
    pub user: Option<UserDto>,
    #[serde(default)]
    pub labels: Vec<LabelDto>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Only the single-pull endpoint carries this key
    #[serde(default, deserialize_with = "present")]
    pub merged_by: Option<Option<UserDto>>,
    /// Only the single-pull endpoint carries this key
    #[serde(default)]
    pub comments: Option<u32>,
}

impl PullDto {
    pub fn needs_details(&self) -> bool {
        self.merged_by.is_none() || self.comments.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphqlErrorDto {
    pub message: CompactString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscussionsData {
    pub repository: Option<RepositoryDiscussions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryDiscussions {
    pub discussions: Option<DiscussionConnection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscussionConnection {
    pub nodes: Option<Vec<Option<DiscussionNode>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionNode {
    pub id: CompactString,
    pub title: String,
    pub created_at: CompactString,
    pub url: CompactString,
    #[serde(default)]
    pub upvote_count: u32,
    pub answer_chosen_at: Option<CompactString>,
    pub author: Option<UserDto>,
    pub category: Option<CategoryDto>,
    pub comments: Option<TotalCountDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryDto {
    pub name: CompactString,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCountDto {
    pub total_count: u32,
}

impl GraphqlResponse<DiscussionsData> {
    /// Discussion nodes, treating any missing or null level as empty
    pub fn into_discussions(self) -> Vec<DiscussionNode> {
        self.data
            .and_then(|d| d.repository)
            .and_then(|r| r.discussions)
            .and_then(|d| d.nodes)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .collect()
    }
}

/// A flat record with a fixed CSV header
pub trait CsvRecord: Serialize {
    const HEADERS: &'static [&'static str];
}

/// Whether an item from the issues endpoint is a true issue or a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Issue,
    Pull,
}

impl IssueKind {
    /// Classifies by URL: issues live under `{repo}/issues`, pulls do not.
    pub fn from_url(repo: &RepoName, html_url: &str) -> Self {
        if is_issue_url(repo, html_url) {
            IssueKind::Issue
        } else {
            IssueKind::Pull
        }
    }
}

pub fn is_issue_url(repo: &RepoName, html_url: &str) -> bool {
    html_url.contains(format_compact!("{repo}/issues").as_str())
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> CompactString {
    timestamp.format(TIMESTAMP_FORMAT).to_compact_string()
}

pub fn format_close_date(closed_at: Option<&DateTime<Utc>>) -> CompactString {
    closed_at.map_or_else(|| NOT_AVAILABLE.into(), format_timestamp)
}

/// Whole days between opening and closing, or `Still Open`
pub fn days_open(created_at: &DateTime<Utc>, closed_at: Option<&DateTime<Utc>>) -> CompactString {
    match closed_at {
        Some(closed_at) => closed_at
            .signed_duration_since(created_at)
            .num_seconds()
            .div_euclid(SECONDS_PER_DAY)
            .to_compact_string(),
        None => STILL_OPEN.into(),
    }
}

pub fn flatten_body(body: Option<&str>) -> String {
    body.map(|b| b.replace('\n', " ")).unwrap_or_default()
}

pub fn join_labels(labels: &[LabelDto]) -> String {
    labels.iter().map(|l| l.name.as_str()).join(", ")
}

fn login_or(user: Option<&UserDto>, fallback: &str) -> CompactString {
    user.map_or_else(|| fallback.into(), |u| u.login.clone())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRow {
    pub kind: IssueKind,
    pub number: u64,
    pub opened_at: CompactString,
    pub closed_at: CompactString,
    pub days_open: CompactString,
    pub opened_by: CompactString,
    pub closed_by: CompactString,
    pub url: CompactString,
    pub body: String,
    pub state: CompactString,
    pub labels: String,
    pub comments: u32,
}

impl CsvRecord for IssueRow {
    const HEADERS: &'static [&'static str] = &[
        "Issue or Pull",
        "Issue Number",
        "Issue Open Date",
        "Issue Close Date",
        "Total Days Open",
        "Opened By",
        "Closed By",
        "Issue URL",
        "Body",
        "State",
        "Labels",
        "Comments Count",
    ];
}

impl IssueRow {
    pub fn project(repo: &RepoName, issue: &IssueDto) -> Self {
        Self {
            kind: IssueKind::from_url(repo, &issue.html_url),
            number: issue.number,
            opened_at: format_timestamp(&issue.created_at),
            closed_at: format_close_date(issue.closed_at.as_ref()),
            days_open: days_open(&issue.created_at, issue.closed_at.as_ref()),
            opened_by: login_or(issue.user.as_ref(), UNKNOWN_AUTHOR),
            closed_by: login_or(issue.closed_by.as_ref().and_then(Option::as_ref), NOT_AVAILABLE),
            url: issue.html_url.clone(),
            body: flatten_body(issue.body.as_deref()),
            state: issue.state.clone(),
            labels: join_labels(&issue.labels),
            comments: issue.comments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRow {
    pub number: u64,
    pub opened_at: CompactString,
    pub closed_at: CompactString,
    pub days_open: CompactString,
    pub opened_by: CompactString,
    pub merged_by: CompactString,
    pub url: CompactString,
    pub body: String,
    pub state: CompactString,
    pub labels: String,
    pub comments: u32,
}

impl CsvRecord for PullRow {
    const HEADERS: &'static [&'static str] = &[
        "PR Number",
        "PR Open Date",
        "PR Close Date",
        "Total Days Open",
        "Opened By",
        "Merged By",
        "PR URL",
        "Body",
        "State",
        "Labels",
        "Comments Count",
    ];
}

impl From<&PullDto> for PullRow {
    fn from(pr: &PullDto) -> Self {
        Self {
            number: pr.number,
            opened_at: format_timestamp(&pr.created_at),
            closed_at: format_close_date(pr.closed_at.as_ref()),
            days_open: days_open(&pr.created_at, pr.closed_at.as_ref()),
            opened_by: login_or(pr.user.as_ref(), UNKNOWN_AUTHOR),
            merged_by: login_or(pr.merged_by.as_ref().and_then(Option::as_ref), NOT_AVAILABLE),
            url: pr.html_url.clone(),
            body: flatten_body(pr.body.as_deref()),
            state: pr.state.clone(),
            labels: join_labels(&pr.labels),
            comments: pr.comments.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscussionRow {
    pub id: CompactString,
    pub title: String,
    pub created_at: CompactString,
    pub upvotes: u32,
    pub answer_chosen_at: CompactString,
    pub author: CompactString,
    pub category: CompactString,
    pub comments: u32,
    pub url: CompactString,
}

impl CsvRecord for DiscussionRow {
    const HEADERS: &'static [&'static str] = &[
        "Discussion ID",
        "Title",
        "Created At",
        "Upvote Count",
        "Answer Chosen At",
        "Author",
        "Category",
        "Comments Count",
        "Discussion URL",
    ];
}

impl From<DiscussionNode> for DiscussionRow {
    fn from(d: DiscussionNode) -> Self {
        Self {
            id: d.id,
            title: d.title,
            created_at: d.created_at,
            upvotes: d.upvote_count,
            answer_chosen_at: d
                .answer_chosen_at
                .unwrap_or_else(|| NOT_AVAILABLE.into()),
            author: login_or(d.author.as_ref(), UNKNOWN_AUTHOR),
            category: d.category.map(|c| c.name).unwrap_or_default(),
            comments: d.comments.map(|c| c.total_count).unwrap_or_default(),
            url: d.url,
        }
    }
}
