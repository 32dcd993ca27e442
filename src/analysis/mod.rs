//! Analysis layer: band and pull-down stages, sequenced by [`Pipeline`].
//!
//! ```text
//!  BandEntry × N                 pull-down table
//!        │                              │
//!        ▼                              ▼
//!   ┌─────────────┐             ┌────────────────┐
//!   │ filter_band │             │ contaminants   │
//!   └─────────────┘             │ log2 / -log10  │
//!        │                      │ threshold      │
//!        ▼                      └────────────────┘
//!   ┌───────────────┐                   │
//!   │ compare_bands │                   ▼
//!   └───────────────┘   FilteredBand ─► cross-reference per band
//! ```

pub mod bands;
pub mod pulldown;

use log::info;

use crate::config::Settings;
use crate::data::model::ProteinTable;
use crate::error::Result;
use bands::{BandEntry, Comparison, FilteredBand, compare_bands, filter_band};
use pulldown::{PulldownOutcome, classify_pulldown};

/// Result of the band stage.
#[derive(Debug, Clone)]
pub struct BandsOutcome {
    pub bands: Vec<FilteredBand>,
    pub comparisons: Vec<Comparison>,
    pub notes: Vec<String>,
}

/// Runs the stages on already-validated inputs. Holds no state besides the
/// settings, so one instance can serve any number of runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: Settings,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        Pipeline { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Intake summary, filtering and pairwise comparison of the bands.
    pub fn run_bands(&self, entries: &[BandEntry]) -> Result<BandsOutcome> {
        let mut notes = vec!["You have given the following data:".to_string()];
        for e in entries {
            notes.push(format!(
                "{} ({}): {} identified proteins, minimal molecular weight {}, maximal {}",
                e.label,
                e.source.display(),
                e.table.len(),
                e.range.min(),
                e.range.max()
            ));
        }

        let mut bands = Vec::with_capacity(entries.len());
        for entry in entries {
            let band = filter_band(entry, &self.settings)?;
            notes.push(band.contaminants.summary(&band.label));
            bands.push(band);
        }
        for band in &bands {
            notes.push(format!(
                "{} target proteins in {} after the molecular-weight cut-off ({} outside the range).",
                band.table.len(),
                band.label,
                band.outside_range
            ));
        }

        let comparisons = compare_bands(&bands, &self.settings.columns.accession)?;
        notes.extend(comparisons.iter().map(Comparison::note));
        info!(
            "{} bands filtered, {} of {} pairs share proteins",
            bands.len(),
            comparisons.iter().filter(|c| c.tables.is_some()).count(),
            comparisons.len()
        );

        Ok(BandsOutcome {
            bands,
            comparisons,
            notes,
        })
    }

    /// Classify a pull-down export and cross it with the filtered bands.
    pub fn run_pulldown(
        &self,
        pulldown: &ProteinTable,
        bands: &BandsOutcome,
    ) -> Result<PulldownOutcome> {
        let outcome = classify_pulldown(pulldown, &bands.bands, &self.settings)?;
        info!(
            "{}: {} contaminants removed, {} bands with matches",
            pulldown.name,
            outcome.contaminants.removed(),
            outcome.band_matches.len()
        );
        Ok(outcome)
    }
}
