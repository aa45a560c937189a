use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use super::{ChartPlan, Panel};
use crate::error::StatsError;
use crate::history::TrafficMetric;

/// 12 x 5.5 inches at 150 dpi.
const IMAGE_SIZE: (u32, u32) = (1800, 825);

const VIEWS_COLOR: RGBColor = RGBColor(0x21, 0x96, 0xF3);
const CLONES_COLOR: RGBColor = RGBColor(0x4C, 0xAF, 0x50);

const FONT: &str = "sans-serif";

fn render_err<E: std::fmt::Display>(e: E) -> StatsError {
    StatsError::Render(e.to_string())
}

/// Draw `plan` as a PNG at `path`, overwriting any existing file.
pub fn draw_chart(plan: &ChartPlan, path: &Path) -> Result<(), StatsError> {
    let root = BitMapBackend::new(path, IMAGE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let root = root
        .titled(plan.kind.caption(), (FONT, 32).into_font().style(FontStyle::Bold))
        .map_err(render_err)?;

    let areas = root.split_evenly((plan.panels.len(), 1));
    let last = areas.len().saturating_sub(1);
    for (i, (area, panel)) in areas.iter().zip(&plan.panels).enumerate() {
        draw_panel(area, plan, panel, i == last)?;
    }

    root.present().map_err(render_err)?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    plan: &ChartPlan,
    panel: &Panel,
    is_bottom: bool,
) -> Result<(), StatsError> {
    let (first, last) = plan.x_domain();
    let x_range = plan.offset(first)..plan.offset(last);
    let color = match panel.metric {
        TrafficMetric::Views => VIEWS_COLOR,
        TrafficMetric::Clones => CLONES_COLOR,
    };

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, (FONT, 22))
        .margin(12)
        .x_label_area_size(if is_bottom { 60 } else { 35 })
        .y_label_area_size(80)
        .build_cartesian_2d(x_range.clone(), 0u64..panel.y_max())
        .map_err(render_err)?;

    let label_for = |x: &i32| plan.tick_label(*x);
    let x_ticks = usize::try_from(x_range.end - x_range.start + 1).unwrap_or(0);

    let mut mesh = chart.configure_mesh();
    mesh.x_labels(x_ticks)
        .x_label_formatter(&label_for)
        .y_desc(panel.y_label)
        .axis_desc_style((FONT, 18))
        .bold_line_style(BLACK.mix(0.15))
        .light_line_style(BLACK.mix(0.05));
    if is_bottom {
        mesh.x_desc("Date");
    }
    mesh.draw().map_err(render_err)?;

    if panel.points.is_empty() {
        return Ok(());
    }

    let points: Vec<(i32, u64)> = panel
        .points
        .iter()
        .map(|(date, value)| (plan.offset(*date), *value))
        .collect();

    chart
        .draw_series(
            AreaSeries::new(points.iter().copied(), 0u64, color.mix(0.3))
                .border_style(color.stroke_width(2)),
        )
        .map_err(render_err)?;

    match panel.metric {
        TrafficMetric::Views => chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
            )
            .map_err(render_err)?,
        TrafficMetric::Clones => chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| TriangleMarker::new((x, y), 5, color.filled())),
            )
            .map_err(render_err)?,
    };

    Ok(())
}
