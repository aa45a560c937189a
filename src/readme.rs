use std::path::Path;
use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::config::Config;
use crate::error::StatsError;
use crate::format;
use crate::history::HistoryDocument;
use crate::snapshot;

pub const START_MARKER: &str = "<!-- STATS_START -->";
pub const END_MARKER: &str = "<!-- STATS_END -->";

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "(?s){}.*?{}",
        regex::escape(START_MARKER),
        regex::escape(END_MARKER)
    ))
    .expect("static regex")
});

/// How the stats block landed in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Replaced,
    InsertedBeforeAnchor,
    Appended,
}

/// Build the marker-delimited stats block.
pub fn render_section(doc: &HistoryDocument, daily_graph: &Path, cumulative_graph: &Path) -> String {
    let last_updated = doc
        .last_updated
        .as_ref()
        .map(format::utc_minutes)
        .unwrap_or_else(|| "never".to_string());

    format!(
        "{START_MARKER}
## 📊 Repository Statistics

<div align=\"center\">

### 📈 Daily Traffic

![Daily Traffic Stats]({daily})

### 📊 Cumulative Traffic

![Cumulative Traffic Stats]({cumulative})

| Metric | Count |
|--------|-------|
| 👁️ **Total Views** | **{views}** |
| 📦 **Total Clones** | **{clones}** |

*Last Updated: {last_updated}*

</div>
{END_MARKER}",
        daily = markdown_path(daily_graph),
        cumulative = markdown_path(cumulative_graph),
        views = format::thousands(doc.total_views),
        clones = format::thousands(doc.total_clones),
    )
}

/// Forward slashes regardless of platform, so links work on the web.
fn markdown_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Put `section` into `content`: over an existing marker pair, else before the
/// first line starting with `anchor`, else at the end.
pub fn apply_section(content: &str, section: &str, anchor: &str) -> (String, Placement) {
    if SECTION_RE.is_match(content) {
        let replaced = SECTION_RE.replace(content, NoExpand(section));
        return (replaced.into_owned(), Placement::Replaced);
    }

    if let Some(pos) = find_anchor(content, anchor) {
        let mut out = String::with_capacity(content.len() + section.len() + 8);
        out.push_str(&content[..pos]);
        out.push_str(section);
        out.push_str("\n\n---\n\n");
        out.push_str(&content[pos..]);
        return (out, Placement::InsertedBeforeAnchor);
    }

    (format!("{content}\n\n{section}\n"), Placement::Appended)
}

/// Byte offset of the first line that starts with `anchor`.
fn find_anchor(content: &str, anchor: &str) -> Option<usize> {
    if anchor.is_empty() {
        return None;
    }
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.starts_with(anchor) {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

/// Rewrite the configured readme with the totals from the local snapshot.
pub async fn run(config: &Config) -> Result<Placement, StatsError> {
    let doc = snapshot::load_snapshot(&config.paths.snapshot).await?;
    let path = &config.paths.readme;
    let content = tokio::fs::read_to_string(path).await?;

    let section = render_section(&doc, &config.paths.daily_graph, &config.paths.cumulative_graph);
    let (updated, placement) = apply_section(&content, &section, &config.readme.anchor);

    snapshot::atomic_write(path, &updated).await?;
    tracing::info!("{} updated with stats ({placement:?})", path.display());
    Ok(placement)
}
