//! CSV export of issues, pull requests and discussions

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use compact_str::CompactString;
use csv::{Terminator, Writer, WriterBuilder};
use tracing::{debug, error, info, instrument};

use crate::{
    client::{DiscussionsResponse, GithubApi},
    config::ExporterConfig,
    domain::{CsvRecord, DiscussionRow, IssueKind, IssueRow, PullRow},
    id::RepoName,
    result::{ExportError, Result},
};

pub const DEFAULT_ISSUES_FILE: &str = "issues.csv";
pub const DEFAULT_PULLS_FILE: &str = "pulls.csv";
pub const DEFAULT_DISCUSSIONS_FILE: &str = "discussions.csv";

/// What a finished export wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub repo: RepoName,
    pub rows: usize,
}

/// Holds the authenticated client and runs the exports
#[derive(Debug)]
pub struct Exporter {
    api: GithubApi,
    login: CompactString,
}

impl Exporter {
    /// Build the client and check that the token is accepted.
    pub async fn new(config: ExporterConfig) -> Result<Self> {
        let api = GithubApi::new(config.client_config()?)?;
        let user = api
            .get_authenticated_user()
            .await
            .map_err(ExportError::InvalidToken)?;
        info!(login = %user.login, "GitHub token is valid");

        Ok(Self { api, login: user.login })
    }

    /// Login of the token owner
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Export true issues. Pull requests returned by the issues endpoint are
    /// skipped.
    #[instrument(skip(self, output), fields(repo = %repo, output = %output.as_ref().display()))]
    pub async fn issues(&self, repo: &RepoName, output: impl AsRef<Path>) -> Result<ExportSummary> {
        let path = output.as_ref();
        let repository = self.api.get_repository(repo).await?;
        debug!(full_name = %repository.full_name, url = %repository.html_url, "Repository found");

        let mut writer = CsvFile::create::<IssueRow>(path)?;
        let mut pages = self.api.issues(repo);
        let mut skipped = 0usize;

        while let Some(page) = pages.next_page().await? {
            for mut issue in page {
                if IssueKind::from_url(repo, &issue.html_url) == IssueKind::Pull {
                    skipped += 1;
                    continue;
                }
                if issue.needs_details() {
                    issue = self.api.get_issue(repo, issue.number).await?;
                }
                writer.write(&IssueRow::project(repo, &issue))?;
            }
        }

        debug!(skipped_pulls = skipped, pages = pages.pages_fetched(), "Issues exhausted");
        writer.finish(repo)
    }

    #[instrument(skip(self, output), fields(repo = %repo, output = %output.as_ref().display()))]
    pub async fn pulls(&self, repo: &RepoName, output: impl AsRef<Path>) -> Result<ExportSummary> {
        let path = output.as_ref();
        let repository = self.api.get_repository(repo).await?;
        debug!(full_name = %repository.full_name, url = %repository.html_url, "Repository found");

        let mut writer = CsvFile::create::<PullRow>(path)?;
        let mut pages = self.api.pulls(repo);

        while let Some(page) = pages.next_page().await? {
            for mut pr in page {
                if pr.needs_details() {
                    pr = self.api.get_pull(repo, pr.number).await?;
                }
                writer.write(&PullRow::from(&pr))?;
            }
        }

        debug!(pages = pages.pages_fetched(), "Pull requests exhausted");
        writer.finish(repo)
    }

    /// Export the first 100 discussions.
    ///
    /// A non-success HTTP status is logged and yields `Ok(None)` without
    /// creating the output file.
    #[instrument(skip(self, output), fields(repo = %repo, output = %output.as_ref().display()))]
    pub async fn discussions(
        &self,
        repo: &RepoName,
        output: impl AsRef<Path>,
    ) -> Result<Option<ExportSummary>> {
        let path = output.as_ref();

        let response = match self.api.get_discussions(repo).await? {
            DiscussionsResponse::Success(response) => response,
            DiscussionsResponse::Failed { status, body } => {
                error!(status = %status, body = %body, "Error fetching discussions");
                return Ok(None);
            },
        };

        let mut writer = CsvFile::create::<DiscussionRow>(path)?;
        for discussion in response.into_discussions() {
            writer.write(&DiscussionRow::from(discussion))?;
        }

        writer.finish(repo).map(Some)
    }
}

/// CSV output file, header already written
struct CsvFile {
    path: PathBuf,
    writer: Writer<File>,
    rows: usize,
}

impl CsvFile {
    fn create<R: CsvRecord>(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::CRLF)
            .from_writer(file);
        writer
            .write_record(R::HEADERS)
            .map_err(|e| ExportError::csv(path, e))?;

        Ok(Self { path: path.to_path_buf(), writer, rows: 0 })
    }

    fn write<R: CsvRecord>(&mut self, record: &R) -> Result<()> {
        self.writer
            .serialize(record)
            .map_err(|e| ExportError::csv(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self, repo: &RepoName) -> Result<ExportSummary> {
        self.writer
            .flush()
            .map_err(|e| ExportError::io(&self.path, e))?;
        info!(path = %self.path.display(), repo = %repo, rows = self.rows, "CSV file created");

        Ok(ExportSummary { path: self.path, repo: repo.clone(), rows: self.rows })
    }
}
