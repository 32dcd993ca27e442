use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::info;
use plotters::prelude::*;

use crate::color::{GUIDE, GUIDE_TEXT};

// ---------------------------------------------------------------------------
// Scatter description
// ---------------------------------------------------------------------------

/// How one series is drawn.
#[derive(Debug, Clone, Copy)]
pub struct SeriesStyle {
    pub color: RGBColor,
    pub size: u32,
    /// Hollow circles when false.
    pub filled: bool,
}

#[derive(Debug, Clone)]
pub struct ScatterSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
}

/// A labelled reference line across the chart.
#[derive(Debug, Clone)]
pub enum Guide {
    Horizontal { y: f64, label: String },
    Vertical { x: f64, label: String },
}

impl Guide {
    /// Guides at ±inf or NaN cannot be placed and are not drawn.
    fn is_drawable(&self) -> bool {
        match self {
            Guide::Horizontal { y, .. } => y.is_finite(),
            Guide::Vertical { x, .. } => x.is_finite(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScatterChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ScatterSeries>,
    pub guides: Vec<Guide>,
}

impl ScatterChart {
    /// Bounding box of every finite point and guide, padded by 5 %.
    fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        let mut xs = (f64::INFINITY, f64::NEG_INFINITY);
        let mut ys = (f64::INFINITY, f64::NEG_INFINITY);
        let points = self
            .series
            .iter()
            .flat_map(|s| s.points.iter())
            .filter(|(x, y)| x.is_finite() && y.is_finite());
        for &(x, y) in points {
            xs = (xs.0.min(x), xs.1.max(x));
            ys = (ys.0.min(y), ys.1.max(y));
        }
        for g in self.guides.iter().filter(|g| g.is_drawable()) {
            match g {
                Guide::Horizontal { y, .. } => ys = (ys.0.min(*y), ys.1.max(*y)),
                Guide::Vertical { x, .. } => xs = (xs.0.min(*x), xs.1.max(*x)),
            }
        }
        // Always show the origin so the volcano is anchored on x = 0, y = 0.
        xs = (xs.0.min(0.0), xs.1.max(0.0));
        ys = (ys.0.min(0.0), ys.1.max(0.0));
        (pad(xs), pad(ys))
    }
}

fn pad((lo, hi): (f64, f64)) -> (f64, f64) {
    let span = if hi > lo { hi - lo } else { 1.0 };
    (lo - span * 0.05, hi + span * 0.05)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Draw `chart` as a PNG at `path`. Returns the path written.
pub fn render_scatter(chart: &ScatterChart, path: &Path, size: (u32, u32)) -> Result<PathBuf> {
    draw(chart, path, size)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("rendering {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(path.to_path_buf())
}

fn draw(
    chart: &ScatterChart,
    path: &Path,
    size: (u32, u32),
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let ((x0, x1), (y0, y1)) = chart.bounds();
    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 18))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .light_line_style(&GUIDE.mix(0.3))
        .bold_line_style(&GUIDE.mix(0.5))
        .draw()?;

    for guide in chart.guides.iter().filter(|g| g.is_drawable()) {
        let text_style = ("sans-serif", 12).into_font().color(&GUIDE_TEXT);
        match guide {
            Guide::Horizontal { y, label } => {
                ctx.draw_series(LineSeries::new(
                    vec![(x0, *y), (x1, *y)],
                    GUIDE.stroke_width(2),
                ))?;
                ctx.draw_series(std::iter::once(Text::new(
                    label.clone(),
                    (x1 - (x1 - x0) * 0.15, *y),
                    text_style,
                )))?;
            }
            Guide::Vertical { x, label } => {
                ctx.draw_series(LineSeries::new(
                    vec![(*x, y0), (*x, y1)],
                    GUIDE.stroke_width(2),
                ))?;
                ctx.draw_series(std::iter::once(Text::new(
                    label.clone(),
                    (*x + (x1 - x0) * 0.01, y0 + (y1 - y0) * 0.03),
                    text_style,
                )))?;
            }
        }
    }

    for series in &chart.series {
        let style = series.style;
        let shape = if style.filled {
            style.color.filled()
        } else {
            style.color.stroke_width(1)
        };
        let points = series
            .points
            .iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(move |&(x, y)| Circle::new((x, y), style.size, shape));
        ctx.draw_series(points)?
            .label(series.label.as_str())
            .legend(move |(x, y)| Circle::new((x, y), style.size, shape));
    }

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&GUIDE)
        .draw()?;

    root.present()?;
    Ok(())
}
