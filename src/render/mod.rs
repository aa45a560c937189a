mod chart;

use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};

use crate::config::Config;
use crate::error::StatsError;
use crate::format;
use crate::history::{HistoryDocument, TrafficMetric, TrafficSample};
use crate::snapshot;

pub use chart::draw_chart;

/// Days shown on each chart, ending at the newest sample.
pub const WINDOW_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Daily,
    Cumulative,
}

impl ChartKind {
    pub fn caption(self) -> &'static str {
        match self {
            Self::Daily => "Daily Repository Traffic",
            Self::Cumulative => "Cumulative Repository Traffic",
        }
    }

    fn y_label(self, metric: TrafficMetric) -> &'static str {
        match (self, metric) {
            (Self::Daily, TrafficMetric::Views) => "Daily Views",
            (Self::Daily, TrafficMetric::Clones) => "Daily Clones",
            (Self::Cumulative, TrafficMetric::Views) => "Cumulative Views",
            (Self::Cumulative, TrafficMetric::Clones) => "Cumulative Clones",
        }
    }
}

/// One stacked panel of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub metric: TrafficMetric,
    /// Carries the all-time total, not the windowed one.
    pub title: String,
    pub y_label: &'static str,
    pub points: Vec<(NaiveDate, u64)>,
}

impl Panel {
    /// Upper bound of the y axis with a little headroom; never zero.
    pub fn y_max(&self) -> u64 {
        let max = self.points.iter().map(|(_, v)| *v).max().unwrap_or(0);
        max + max / 10 + 1
    }
}

/// Everything needed to draw one image, computed without touching a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPlan {
    pub kind: ChartKind,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub panels: Vec<Panel>,
}

impl ChartPlan {
    /// Window both series to the trailing [`WINDOW_DAYS`] ending at the newest
    /// sample of either series. With no samples at all the window ends at
    /// the document's update date, or `today`.
    pub fn build(doc: &HistoryDocument, kind: ChartKind, today: NaiveDate) -> Self {
        let window_end = newest_date(doc)
            .or_else(|| doc.last_updated.map(|ts| ts.date_naive()))
            .unwrap_or(today);
        let window_start = window_end - Duration::days(WINDOW_DAYS - 1);

        let panels = [TrafficMetric::Views, TrafficMetric::Clones]
            .into_iter()
            .map(|metric| {
                let windowed = window(doc.series(metric), window_start, window_end);
                let points = match kind {
                    ChartKind::Daily => windowed,
                    // Restarts at the window edge; the title holds the true total.
                    ChartKind::Cumulative => running_sum(windowed),
                };
                let label = match metric {
                    TrafficMetric::Views => "Views",
                    TrafficMetric::Clones => "Clones",
                };
                Panel {
                    metric,
                    title: format!("Total {label}: {}", format::thousands(doc.total(metric))),
                    y_label: kind.y_label(metric),
                    points,
                }
            })
            .collect();

        Self {
            kind,
            window_start,
            window_end,
            panels,
        }
    }

    /// X axis bounds: the window padded by one day on each side.
    pub fn x_domain(&self) -> (NaiveDate, NaiveDate) {
        (
            self.window_start - Duration::days(1),
            self.window_end + Duration::days(1),
        )
    }

    /// Day offset from the window start, the x coordinate used for drawing.
    pub fn offset(&self, date: NaiveDate) -> i32 {
        (date - self.window_start).num_days() as i32
    }

    /// One label per day; the padding days stay blank so edge labels don't clip.
    pub fn tick_label(&self, offset: i32) -> String {
        let date = self.window_start + Duration::days(i64::from(offset));
        if date < self.window_start || date > self.window_end {
            return String::new();
        }
        date.format("%m-%d").to_string()
    }
}

fn newest_date(doc: &HistoryDocument) -> Option<NaiveDate> {
    doc.views
        .iter()
        .chain(doc.clones.iter())
        .map(|s| s.timestamp.date_naive())
        .max()
}

/// Samples whose day falls in `start..=end`, as `(day, count)` in date order.
pub fn window(series: &[TrafficSample], start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, u64)> {
    let mut points: Vec<_> = series
        .iter()
        .map(|s| (s.timestamp.date_naive(), s.count))
        .filter(|(d, _)| *d >= start && *d <= end)
        .collect();
    points.sort_by_key(|(d, _)| *d);
    points
}

pub fn running_sum(points: Vec<(NaiveDate, u64)>) -> Vec<(NaiveDate, u64)> {
    let mut acc = 0u64;
    points
        .into_iter()
        .map(|(d, v)| {
            acc += v;
            (d, acc)
        })
        .collect()
}

/// Load the snapshot and write the daily and cumulative images.
pub async fn run(config: &Config) -> Result<Vec<PathBuf>, StatsError> {
    let doc = snapshot::load_snapshot(&config.paths.snapshot).await?;
    if doc.is_empty() {
        tracing::warn!("No data to plot; rendering empty charts");
    }

    let today = Utc::now().date_naive();
    let targets = [
        (ChartKind::Daily, &config.paths.daily_graph),
        (ChartKind::Cumulative, &config.paths.cumulative_graph),
    ];

    let mut written = Vec::with_capacity(targets.len());
    for (kind, path) in targets {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let plan = ChartPlan::build(&doc, kind, today);
        draw_chart(&plan, path)?;
        tracing::info!("{} saved to {}", kind.caption(), path.display());
        written.push(path.clone());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn sample(m: u32, d: u32, count: u64) -> TrafficSample {
        TrafficSample::new(Utc.with_ymd_and_hms(2026, m, d, 0, 0, 0).unwrap(), count)
    }

    fn twenty_days() -> HistoryDocument {
        let mut doc = HistoryDocument {
            views: (1..=20).map(|d| sample(4, d, u64::from(d))).collect(),
            clones: (1..=18).map(|d| sample(4, d, 1)).collect(),
            ..Default::default()
        };
        doc.recompute_totals();
        doc
    }

    #[test]
    fn window_covers_last_fourteen_days_with_padding() {
        let plan = ChartPlan::build(&twenty_days(), ChartKind::Daily, date(1, 1));

        assert_eq!(plan.window_end, date(4, 20));
        assert_eq!(plan.window_start, date(4, 7));
        assert_eq!(plan.x_domain(), (date(4, 6), date(4, 21)));

        let views = &plan.panels[0].points;
        assert_eq!(views.len(), 14);
        assert_eq!(views.first(), Some(&(date(4, 7), 7)));
        assert_eq!(views.last(), Some(&(date(4, 20), 20)));

        // Clones stop two days earlier but share the same window.
        let clones = &plan.panels[1].points;
        assert_eq!(clones.len(), 12);
        assert_eq!(clones.first().map(|p| p.0), Some(date(4, 7)));
    }

    #[test]
    fn titles_use_all_time_totals() {
        let plan = ChartPlan::build(&twenty_days(), ChartKind::Daily, date(1, 1));
        // 1 + 2 + ... + 20
        assert_eq!(plan.panels[0].title, "Total Views: 210");
        assert_eq!(plan.panels[1].title, "Total Clones: 18");
    }

    #[test]
    fn cumulative_restarts_at_window_start() {
        let plan = ChartPlan::build(&twenty_days(), ChartKind::Cumulative, date(1, 1));
        let views = &plan.panels[0].points;
        assert_eq!(views[0], (date(4, 7), 7));
        assert_eq!(views[1], (date(4, 8), 15));
        // 7 + 8 + ... + 20
        assert_eq!(views.last().map(|p| p.1), Some(189));
        assert_eq!(plan.panels[1].y_label, "Cumulative Clones");
    }

    #[test]
    fn empty_document_still_plans_a_window() {
        let doc = HistoryDocument::default();
        let plan = ChartPlan::build(&doc, ChartKind::Daily, date(6, 30));
        assert_eq!(plan.window_end, date(6, 30));
        assert!(plan.panels.iter().all(|p| p.points.is_empty()));
        assert_eq!(plan.panels[0].y_max(), 1);
    }

    #[test]
    fn empty_series_falls_back_to_last_updated() {
        let doc = HistoryDocument {
            last_updated: Some(Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap()),
            ..Default::default()
        };
        let plan = ChartPlan::build(&doc, ChartKind::Cumulative, date(9, 9));
        assert_eq!(plan.window_end, date(2, 3));
    }

    #[test]
    fn one_empty_series_uses_the_other_for_the_window() {
        let doc = HistoryDocument {
            clones: vec![sample(5, 10, 3)],
            ..Default::default()
        };
        let plan = ChartPlan::build(&doc, ChartKind::Daily, date(1, 1));
        assert_eq!(plan.window_end, date(5, 10));
        assert!(plan.panels[0].points.is_empty());
        assert_eq!(plan.panels[1].points, vec![(date(5, 10), 3)]);
    }

    #[test]
    fn edge_tick_labels_are_blank() {
        let plan = ChartPlan::build(&twenty_days(), ChartKind::Daily, date(1, 1));
        assert_eq!(plan.tick_label(-1), "");
        assert_eq!(plan.tick_label(14), "");
        assert_eq!(plan.tick_label(0), "04-07");
        assert_eq!(plan.tick_label(13), "04-20");
        assert_eq!(plan.offset(date(4, 20)), 13);
    }

    #[test]
    fn y_max_leaves_headroom() {
        let panel = Panel {
            metric: TrafficMetric::Views,
            title: String::new(),
            y_label: "Daily Views",
            points: vec![(date(1, 1), 50), (date(1, 2), 100)],
        };
        assert_eq!(panel.y_max(), 111);
    }
}
