use std::path::Path;

use crate::error::StatsError;
use crate::history::HistoryDocument;

/// Write the history as pretty-printed JSON, replacing any previous snapshot.
pub async fn write_snapshot(path: &Path, doc: &HistoryDocument) -> Result<(), StatsError> {
    let json = serde_json::to_string_pretty(doc)?;
    atomic_write(path, &json).await?;
    tracing::debug!("snapshot written to {}", path.display());
    Ok(())
}

pub async fn load_snapshot(path: &Path) -> Result<HistoryDocument, StatsError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        StatsError::Snapshot(format!("failed to read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&text)
        .map_err(|e| StatsError::Snapshot(format!("failed to parse {}: {e}", path.display())))
}

/// Write via temp file + rename so readers never observe a half-written file.
pub(crate) async fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension(format!("tmp.{}", std::process::id()));
    tokio::fs::write(&tmp_path, content.as_bytes()).await?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    Ok(())
}
