//! Report assembly: result workbooks and volcano plots.

pub mod plot;
pub mod workbook;

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::warn;

use crate::analysis::BandsOutcome;
use crate::analysis::pulldown::{NEG_LOG10_P, P_VALUE, PulldownOutcome, RATIO, RATIO_LOG2};
use crate::color::{self, ALL_PROTEINS, HIGHLIGHT};
use crate::config::Settings;
use crate::data::model::{CellValue, ProteinTable};
use plot::{Guide, ScatterChart, ScatterSeries, SeriesStyle, render_scatter};
use workbook::write_workbook;

pub const BANDS_WORKBOOK: &str = "Bands analysis results.xlsx";
pub const PULLDOWN_WORKBOOK: &str = "Pulldown-bands cross results.xlsx";
pub const TOP_WORKBOOK: &str = "Top 15 Ratio.xlsx";
pub const VOLCANO_PLOT: &str = "Volcano plot.png";
pub const TOP_VOLCANO_PLOT: &str = "Volcano plot - 15 best ratio.png";

/// `input` with its file name replaced by `file_name`.
pub fn sibling_path(input: &Path, file_name: &str) -> PathBuf {
    input.with_file_name(file_name)
}

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

/// One sheet per filtered band, then the common / specific tables of every
/// pair that shares proteins.
pub fn bands_sheets(outcome: &BandsOutcome) -> Vec<&ProteinTable> {
    let mut sheets: Vec<&ProteinTable> = outcome.bands.iter().map(|b| &b.table).collect();
    for tables in outcome.comparisons.iter().filter_map(|c| c.tables.as_ref()) {
        sheets.push(&tables.common);
        sheets.push(&tables.first_specific);
        sheets.push(&tables.second_specific);
    }
    sheets
}

/// One sheet per band with pull-down matches.
pub fn pulldown_sheets(outcome: &PulldownOutcome) -> Vec<&ProteinTable> {
    outcome.band_matches.iter().map(|m| &m.table).collect()
}

/// The `n` significant rows with the highest ratio. Ties keep input order.
pub fn top_ratio(significant: &ProteinTable, n: usize) -> Result<ProteinTable> {
    let ratio = significant.require_column(RATIO)?;
    let mut keyed = Vec::with_capacity(significant.len());
    for row in 0..significant.len() {
        keyed.push((significant.numeric(row, ratio)?, row));
    }
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut top = ProteinTable::new(format!("Top {n}"), significant.columns.clone());
    for (_, row) in keyed.into_iter().take(n) {
        top.rows.push(significant.rows[row].clone());
    }
    Ok(top)
}

// ---------------------------------------------------------------------------
// Display projection
// ---------------------------------------------------------------------------

/// Columns shown to the operator, in order, with the decimals kept
/// (`None` = unrounded). Absent optional columns are skipped.
fn display_columns(settings: &Settings) -> Vec<(String, Option<i32>)> {
    vec![
        (settings.columns.accession.clone(), None),
        ("gene_name".into(), None),
        ("description".into(), None),
        ("protein_set_score".into(), Some(2)),
        ("coverage".into(), None),
        (settings.columns.molecular_weight.clone(), None),
        (RATIO.into(), None),
        (P_VALUE.into(), None),
        (RATIO_LOG2.into(), Some(2)),
        (NEG_LOG10_P.into(), Some(2)),
    ]
}

/// Trimmed, rounded copy of a pull-down table for reading by eye: organism
/// suffix (`OS=…`) cut from descriptions, headers capitalised.
pub fn display_projection(table: &ProteinTable, settings: &Settings) -> ProteinTable {
    let picked: Vec<(usize, &str, Option<i32>)> = display_columns(settings)
        .into_iter()
        .filter_map(|(name, digits)| {
            table
                .column_index(&name)
                .map(|i| (i, table.columns[i].as_str(), digits))
        })
        .collect();

    let headers = picked
        .iter()
        .map(|(_, name, _)| display_header(name, settings))
        .collect();
    let mut out = ProteinTable::new(table.name.clone(), headers);
    for row in &table.rows {
        let cells = picked
            .iter()
            .map(|&(i, name, digits)| {
                let cell = &row[i];
                match (cell, digits) {
                    (CellValue::Text(s), _) if name == "description" => {
                        CellValue::Text(cut_organism(s).to_string())
                    }
                    (CellValue::Float(v), Some(d)) => CellValue::Float(round(*v, d)),
                    _ => cell.clone(),
                }
            })
            .collect();
        out.rows.push(cells);
    }
    out
}

fn display_header(name: &str, settings: &Settings) -> String {
    if name == settings.columns.molecular_weight {
        return name.to_string();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn cut_organism(description: &str) -> &str {
    description
        .split("OS=")
        .next()
        .unwrap_or(description)
        .trim_end()
}

fn round(v: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (v * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Volcano plots
// ---------------------------------------------------------------------------

fn volcano_points(table: &ProteinTable) -> Result<Vec<(f64, f64)>> {
    let x = table.require_column(RATIO_LOG2)?;
    let y = table.require_column(NEG_LOG10_P)?;
    (0..table.len())
        .map(|row| -> Result<(f64, f64)> {
            Ok((table.numeric(row, x)?, table.numeric(row, y)?))
        })
        .collect()
}

fn band_series(outcome: &PulldownOutcome) -> Result<Vec<ScatterSeries>> {
    let colors = color::band_colors(outcome.band_matches.len());
    outcome
        .band_matches
        .iter()
        .zip(colors)
        .map(|(m, color)| -> Result<ScatterSeries> {
            Ok(ScatterSeries {
                label: m.band.clone(),
                points: volcano_points(&m.table)?,
                style: SeriesStyle {
                    color,
                    size: 5,
                    filled: true,
                },
            })
        })
        .collect()
}

fn axes(title: &str) -> ScatterChart {
    ScatterChart {
        title: title.to_string(),
        x_label: "Ratio (Log2)".into(),
        y_label: "p-value (-Log10)".into(),
        series: Vec::new(),
        guides: Vec::new(),
    }
}

/// All proteins, significant ones highlighted, band matches on top.
pub fn volcano_chart(outcome: &PulldownOutcome, settings: &Settings) -> Result<ScatterChart> {
    let t = settings.threshold;
    let mut chart = axes(
        "Volcano plot of identified proteins in pull down, cross resulted with identified proteins in bands",
    );
    chart.series.push(ScatterSeries {
        label: "All proteins identified in pulldown".into(),
        points: volcano_points(&outcome.transformed)?,
        style: SeriesStyle {
            color: ALL_PROTEINS,
            size: 3,
            filled: true,
        },
    });
    chart.series.push(ScatterSeries {
        label: format!("p-value ≤ {} and ratio > {}", t.max_p_value, t.min_ratio),
        points: volcano_points(&outcome.significant)?,
        style: SeriesStyle {
            color: HIGHLIGHT,
            size: 3,
            filled: true,
        },
    });
    chart.series.extend(band_series(outcome)?);
    chart.guides = vec![
        Guide::Horizontal {
            y: -t.max_p_value.log10(),
            label: format!("p-val. ≤ {}", t.max_p_value),
        },
        Guide::Vertical {
            x: t.min_ratio.log2(),
            label: format!("ratio > {}", t.min_ratio),
        },
    ];
    Ok(chart)
}

/// All proteins hollow, the best ratios highlighted, band matches on top.
pub fn top_volcano_chart(
    outcome: &PulldownOutcome,
    top: &ProteinTable,
    settings: &Settings,
) -> Result<ScatterChart> {
    let mut chart = axes(&format!(
        "Volcano plot of identified proteins in pull down, {} best ratio with p-value ≤ {}",
        settings.top_n, settings.threshold.max_p_value
    ));
    chart.series.push(ScatterSeries {
        label: "All proteins identified in pulldown".into(),
        points: volcano_points(&outcome.transformed)?,
        style: SeriesStyle {
            color: ALL_PROTEINS,
            size: 3,
            filled: false,
        },
    });
    chart.series.push(ScatterSeries {
        label: format!(
            "{} best ratio with p-value ≤ {}",
            settings.top_n, settings.threshold.max_p_value
        ),
        points: volcano_points(top)?,
        style: SeriesStyle {
            color: HIGHLIGHT,
            size: 4,
            filled: true,
        },
    });
    chart.series.extend(band_series(outcome)?);
    Ok(chart)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Where a run's outputs go: beside an input file, or a fixed directory.
#[derive(Debug, Clone)]
pub enum OutputLocation {
    BesideInput,
    Directory(PathBuf),
}

impl OutputLocation {
    pub fn resolve(&self, input: &Path, file_name: &str) -> PathBuf {
        match self {
            OutputLocation::BesideInput => sibling_path(input, file_name),
            OutputLocation::Directory(dir) => dir.join(file_name),
        }
    }
}

/// Write the bands workbook beside `last_band`. Returns the path written.
pub fn write_bands_report(
    outcome: &BandsOutcome,
    last_band: &Path,
    location: &OutputLocation,
) -> Result<PathBuf> {
    let path = location.resolve(last_band, BANDS_WORKBOOK);
    write_workbook(&path, &bands_sheets(outcome))?;
    Ok(path)
}

/// Write the pull-down workbook, the top-ratio workbook and both volcano
/// plots beside `pulldown_path`. Returns every path written.
pub fn write_pulldown_report(
    outcome: &PulldownOutcome,
    pulldown_path: &Path,
    location: &OutputLocation,
    settings: &Settings,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let size = (settings.plot.width, settings.plot.height);

    let sheets = pulldown_sheets(outcome);
    if sheets.is_empty() {
        warn!("no band shares significant proteins; {PULLDOWN_WORKBOOK} not written");
    } else {
        let path = location.resolve(pulldown_path, PULLDOWN_WORKBOOK);
        write_workbook(&path, &sheets)?;
        written.push(path);
    }

    let volcano = location.resolve(pulldown_path, VOLCANO_PLOT);
    written.push(render_scatter(&volcano_chart(outcome, settings)?, &volcano, size)?);

    let top = top_ratio(&outcome.significant, settings.top_n)?;
    let path = location.resolve(pulldown_path, TOP_WORKBOOK);
    write_workbook(&path, &[&display_projection(&top, settings)])?;
    written.push(path);

    let top_volcano = location.resolve(pulldown_path, TOP_VOLCANO_PLOT);
    written.push(render_scatter(
        &top_volcano_chart(outcome, &top, settings)?,
        &top_volcano,
        size,
    )?);

    Ok(written)
}
