use std::collections::BTreeSet;
use std::path::PathBuf;

use log::info;

use crate::config::Settings;
use crate::data::filter::{
    ContaminantReport, MwRange, filter_molecular_weight, remove_contaminants,
};
use crate::data::model::{CellValue, ProteinTable};
use crate::error::Result;

/// Column added to the "common" table to say which band a row came from.
pub const BAND_COLUMN: &str = "band";

// ---------------------------------------------------------------------------
// Band entries
// ---------------------------------------------------------------------------

/// One gel band: its table and the MW window the operator gave for it.
#[derive(Debug, Clone)]
pub struct BandEntry {
    /// `B1`, `B2`, … from the intake order.
    pub label: String,
    pub source: PathBuf,
    pub range: MwRange,
    pub table: ProteinTable,
}

impl BandEntry {
    /// `index` is the 0-based intake position.
    pub fn new(index: usize, source: PathBuf, range: MwRange, table: ProteinTable) -> Self {
        let label = band_label(index);
        BandEntry {
            table: table.renamed(label.clone()),
            label,
            source,
            range,
        }
    }
}

pub fn band_label(index: usize) -> String {
    format!("B{}", index + 1)
}

/// A band after contaminant removal and the MW cut-off.
#[derive(Debug, Clone)]
pub struct FilteredBand {
    pub label: String,
    pub table: ProteinTable,
    pub contaminants: ContaminantReport,
    pub outside_range: usize,
}

/// Run both row filters on a band.
pub fn filter_band(band: &BandEntry, settings: &Settings) -> Result<FilteredBand> {
    let (clean, contaminants) = remove_contaminants(
        &band.table,
        &settings.columns.accession,
        &settings.contaminants,
    )?;
    let (table, outside_range) =
        filter_molecular_weight(&clean, &settings.columns.molecular_weight, band.range)?;
    info!(
        "{}: {} target proteins within {} ({} removed by the cut-off)",
        band.label,
        table.len(),
        band.range,
        outside_range
    );
    Ok(FilteredBand {
        label: band.label.clone(),
        table,
        contaminants,
        outside_range,
    })
}

// ---------------------------------------------------------------------------
// Pairwise comparison
// ---------------------------------------------------------------------------

/// Tables derived from a pair of bands sharing at least one accession.
#[derive(Debug, Clone)]
pub struct ComparisonTables {
    /// Shared rows from both bands, tagged in [`BAND_COLUMN`], sorted by
    /// accession with the first band's rows ahead of the second's.
    pub common: ProteinTable,
    pub first_specific: ProteinTable,
    pub second_specific: ProteinTable,
}

#[derive(Debug, Clone)]
pub struct Comparison {
    pub first: String,
    pub second: String,
    pub shared: BTreeSet<String>,
    /// `None` when the bands share nothing.
    pub tables: Option<ComparisonTables>,
}

impl Comparison {
    pub fn note(&self) -> String {
        if self.shared.is_empty() {
            format!(
                "There is no protein in common between {} and {}.",
                self.first, self.second
            )
        } else {
            format!(
                "There are {} proteins in common between {} and {}.",
                self.shared.len(),
                self.first,
                self.second
            )
        }
    }
}

/// Compare every unordered pair of bands, in intake order: (B1,B2), (B1,B3),
/// …, (B2,B3), …
pub fn compare_bands(bands: &[FilteredBand], accession_column: &str) -> Result<Vec<Comparison>> {
    let sets = bands
        .iter()
        .map(|b| b.table.accession_set(accession_column))
        .collect::<Result<Vec<_>>>()?;

    let mut out = Vec::new();
    for i in 0..bands.len() {
        for j in (i + 1)..bands.len() {
            out.push(compare_pair(
                &bands[i],
                &sets[i],
                &bands[j],
                &sets[j],
                accession_column,
            )?);
        }
    }
    Ok(out)
}

fn compare_pair(
    a: &FilteredBand,
    a_set: &BTreeSet<String>,
    b: &FilteredBand,
    b_set: &BTreeSet<String>,
    accession_column: &str,
) -> Result<Comparison> {
    let shared: BTreeSet<String> = a_set.intersection(b_set).cloned().collect();
    if shared.is_empty() {
        return Ok(Comparison {
            first: a.label.clone(),
            second: b.label.clone(),
            shared,
            tables: None,
        });
    }

    let a_idx = a.table.require_column(accession_column)?;
    let b_idx = b.table.require_column(accession_column)?;

    let a_common = tagged(
        a.table.filtered(a.label.clone(), |r| shared.contains(&r[a_idx].key())),
        &a.label,
    );
    let b_common = tagged(
        b.table.filtered(b.label.clone(), |r| shared.contains(&r[b_idx].key())),
        &b.label,
    );

    let mut common = ProteinTable::concat(
        format!("common {} {}", a.label, b.label),
        &[&a_common, &b_common],
    );
    // Stable: within an accession the first band's rows stay ahead.
    let acc = common.require_column(accession_column)?;
    common.rows.sort_by_cached_key(|r| r[acc].key());

    let first_specific = a.table.filtered(
        format!("specific {} vs {}", a.label, b.label),
        |r| !shared.contains(&r[a_idx].key()),
    );
    let second_specific = b.table.filtered(
        format!("specific {} vs {}", b.label, a.label),
        |r| !shared.contains(&r[b_idx].key()),
    );

    Ok(Comparison {
        first: a.label.clone(),
        second: b.label.clone(),
        shared,
        tables: Some(ComparisonTables {
            common,
            first_specific,
            second_specific,
        }),
    })
}

fn tagged(mut table: ProteinTable, label: &str) -> ProteinTable {
    let tags = vec![CellValue::Text(label.to_string()); table.len()];
    table.push_column(BAND_COLUMN, tags);
    table
}
