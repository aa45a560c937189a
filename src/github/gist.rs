use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{GitHubClient, ensure_success};
use crate::error::StatsError;
use crate::history::HistoryDocument;

/// Name of the file inside the gist that holds the serialized history.
pub const HISTORY_FILE: &str = "stats_history.json";

#[derive(Deserialize)]
struct Gist {
    id: String,
    #[serde(default)]
    files: HashMap<String, Option<GistFile>>,
}

#[derive(Deserialize)]
struct GistFile {
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    raw_url: Option<String>,
}

#[derive(Serialize)]
struct GistWrite<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public: Option<bool>,
    files: HashMap<&'a str, GistFileWrite>,
}

#[derive(Serialize)]
struct GistFileWrite {
    content: String,
}

/// Where the history handed to the merge step came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySource {
    /// Read from the configured gist.
    Remote,
    /// No gist configured; first run.
    NotConfigured,
    /// A gist is configured but could not be read; starting from empty.
    FellBack,
}

#[derive(Debug)]
pub struct RemoteHistory {
    pub document: HistoryDocument,
    pub source: HistorySource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Updated { id: String },
    /// A fresh gist was created; its id must be stored as `GIST_ID`.
    Created { id: String },
}

impl PersistOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Updated { id } | Self::Created { id } => id,
        }
    }
}

impl GitHubClient {
    /// Load the accumulated history from the gist.
    ///
    /// Without a gist id this is an empty history. Transport failures, error
    /// statuses and unreadable content also degrade to an empty history.
    pub async fn fetch_remote_history(
        &self,
        gist_id: Option<&str>,
    ) -> Result<RemoteHistory, StatsError> {
        let Some(id) = gist_id else {
            return Ok(RemoteHistory {
                document: HistoryDocument::default(),
                source: HistorySource::NotConfigured,
            });
        };

        match self.read_gist_history(id).await {
            Ok(document) => Ok(RemoteHistory {
                document,
                source: HistorySource::Remote,
            }),
            Err(e) if e.is_expected_absence() => {
                tracing::warn!("could not read history from gist {id}, starting empty: {e}");
                Ok(RemoteHistory {
                    document: HistoryDocument::default(),
                    source: HistorySource::FellBack,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn read_gist_history(&self, id: &str) -> Result<HistoryDocument, StatsError> {
        let url = self.url(&format!("gists/{id}"));
        let response = ensure_success(self.get(&url).send().await?, "gists").await?;
        let mut gist: Gist = response.json().await?;

        let file = gist
            .files
            .remove(HISTORY_FILE)
            .flatten()
            .ok_or_else(|| StatsError::GistContent(format!("{HISTORY_FILE} missing from gist")))?;

        // Large files come back truncated; the full text lives at raw_url.
        let content = match (file.truncated, file.raw_url) {
            (true, Some(raw_url)) => {
                tracing::debug!("{HISTORY_FILE} truncated, fetching raw content");
                let raw = ensure_success(self.get(&raw_url).send().await?, "gists").await?;
                raw.text().await?
            }
            _ => file
                .content
                .ok_or_else(|| StatsError::GistContent(format!("{HISTORY_FILE} has no content")))?,
        };

        Ok(serde_json::from_str(&content)?)
    }

    /// Overwrite the gist with `document`, or create a private gist when no
    /// id is configured yet.
    pub async fn persist_remote(
        &self,
        gist_id: Option<&str>,
        document: &HistoryDocument,
    ) -> Result<PersistOutcome, StatsError> {
        let content = serde_json::to_string_pretty(document)?;
        let files = HashMap::from([(HISTORY_FILE, GistFileWrite { content })]);

        match gist_id {
            Some(id) => {
                let payload = GistWrite {
                    description: None,
                    public: None,
                    files,
                };
                let url = self.url(&format!("gists/{id}"));
                ensure_success(self.patch(&url).json(&payload).send().await?, "gists").await?;
                Ok(PersistOutcome::Updated { id: id.to_string() })
            }
            None => {
                let payload = GistWrite {
                    description: Some(format!("Traffic stats for {}", self.repository)),
                    public: Some(false),
                    files,
                };
                let url = self.url("gists");
                let response =
                    ensure_success(self.post(&url).json(&payload).send().await?, "gists").await?;
                let created: Gist = response.json().await?;

                tracing::info!("Created new Gist: {}", created.id);
                tracing::info!(
                    "Please add this to your workflow as GIST_ID secret: {}",
                    created.id
                );
                Ok(PersistOutcome::Created { id: created.id })
            }
        }
    }
}
