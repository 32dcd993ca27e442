use std::fmt;

use log::debug;

use super::model::ProteinTable;
use crate::config::ContaminantTags;
use crate::error::{ProteoError, Result};

// ---------------------------------------------------------------------------
// Contaminant filter
// ---------------------------------------------------------------------------

/// Organism class of a row, read from its accession.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Human,
    Mouse,
    Target,
    Other,
}

/// Classify an accession. First match wins, in the order human, mouse,
/// target: `"P1_HUMAN_MYC"` is human.
pub fn classify(accession: &str, tags: &ContaminantTags) -> Origin {
    if accession.contains(&tags.human) {
        Origin::Human
    } else if accession.contains(&tags.mouse) {
        Origin::Mouse
    } else if accession.contains(&tags.target) {
        Origin::Target
    } else {
        Origin::Other
    }
}

/// What the contaminant filter removed from one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContaminantReport {
    pub total: usize,
    pub human: usize,
    pub mouse: usize,
    pub other: usize,
    pub retained: usize,
}

impl ContaminantReport {
    pub fn removed(&self) -> usize {
        self.human + self.mouse + self.other
    }

    pub fn summary(&self, table: &str) -> String {
        format!(
            "On {} proteins identified in {table}, there are {} from contaminants \
             ({} human, {} mouse, {} other) and {} target proteins.",
            self.total,
            self.removed(),
            self.human,
            self.mouse,
            self.other,
            self.retained
        )
    }
}

/// Keep only target rows. The input table is left untouched.
pub fn remove_contaminants(
    table: &ProteinTable,
    accession_column: &str,
    tags: &ContaminantTags,
) -> Result<(ProteinTable, ContaminantReport)> {
    let idx = table.require_column(accession_column)?;
    let mut report = ContaminantReport {
        total: table.len(),
        ..Default::default()
    };

    let kept = table.filtered(table.name.clone(), |row| {
        match classify(&row[idx].key(), tags) {
            Origin::Human => report.human += 1,
            Origin::Mouse => report.mouse += 1,
            Origin::Other => report.other += 1,
            Origin::Target => return true,
        }
        false
    });
    report.retained = kept.len();

    debug!(
        "{}: {} rows, {} contaminants removed",
        table.name,
        report.total,
        report.removed()
    );
    Ok((kept, report))
}

// ---------------------------------------------------------------------------
// Molecular-weight filter
// ---------------------------------------------------------------------------

/// Operator-given molecular-weight window, in Dalton. Both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MwRange {
    min: f64,
    max: f64,
}

impl MwRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ProteoError::InvalidRange(format!(
                "bounds must be finite numbers, got {min} and {max}"
            )));
        }
        if min >= max {
            return Err(ProteoError::InvalidRange(format!(
                "minimum ({min}) must be lower than maximum ({max})"
            )));
        }
        Ok(MwRange { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, mw: f64) -> bool {
        self.min <= mw && mw <= self.max
    }
}

impl fmt::Display for MwRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{} Da", self.min, self.max)
    }
}

/// Keep rows whose MW lies in `range`. Returns the new table and the number
/// of dropped rows. Empty or non-numeric MW cells are an error.
pub fn filter_molecular_weight(
    table: &ProteinTable,
    mw_column: &str,
    range: MwRange,
) -> Result<(ProteinTable, usize)> {
    let idx = table.require_column(mw_column)?;

    let mut keep = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        keep.push(range.contains(table.numeric(row, idx)?));
    }

    let mut flags = keep.into_iter();
    let kept = table.filtered(table.name.clone(), |_| flags.next().unwrap_or(false));
    let dropped = table.len() - kept.len();
    debug!("{}: {dropped} rows outside {range}", table.name);
    Ok((kept, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{band, table};
    use crate::error::ErrorKind;

    fn tags() -> ContaminantTags {
        ContaminantTags::default()
    }

    #[test]
    fn classification_priority() {
        let t = tags();
        assert_eq!(classify("P1_HUMAN", &t), Origin::Human);
        assert_eq!(classify("P1_MOUSE", &t), Origin::Mouse);
        assert_eq!(classify("P1_MYCTU", &t), Origin::Target);
        assert_eq!(classify("P1_ECOLI", &t), Origin::Other);
        assert_eq!(classify("P1_HUMAN_MYC", &t), Origin::Human);
        assert_eq!(classify("MOUSE_MYC", &t), Origin::Mouse);
    }

    #[test]
    fn removes_contaminants_and_counts_them() {
        let t = band(
            "B1",
            &[
                ("A_HUMAN", 1.0),
                ("B_MYCTU", 2.0),
                ("C_MOUSE", 3.0),
                ("D_BOVIN", 4.0),
                ("E_MYCTU", 5.0),
                ("F_HUMAN", 6.0),
            ],
        );
        let (kept, report) = remove_contaminants(&t, "accession", &tags()).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(
            report,
            ContaminantReport {
                total: 6,
                human: 2,
                mouse: 1,
                other: 1,
                retained: 2
            }
        );
        assert_eq!(report.removed() + report.retained, report.total);
        // input is not mutated
        assert_eq!(t.len(), 6);
    }

    #[test]
    fn repeated_accessions_are_classified_per_row() {
        let t = band("B1", &[("X_HUMAN", 1.0), ("X_HUMAN", 2.0), ("Y_MYCTU", 3.0)]);
        let (kept, report) = remove_contaminants(&t, "accession", &tags()).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(report.human, 2);
    }

    #[test]
    fn contaminant_filter_is_idempotent() {
        let t = band(
            "B1",
            &[("A_HUMAN", 1.0), ("B_MYCTU", 2.0), ("C_ECOLI", 3.0), ("D_MYCTU", 4.0)],
        );
        let (once, _) = remove_contaminants(&t, "accession", &tags()).unwrap();
        let (twice, report) = remove_contaminants(&once, "accession", &tags()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(report.removed(), 0);
    }

    #[test]
    fn empty_table_gives_zero_counts() {
        let t = band("B1", &[]);
        let (kept, report) = remove_contaminants(&t, "accession", &tags()).unwrap();
        assert!(kept.is_empty());
        assert_eq!(report, ContaminantReport::default());
    }

    #[test]
    fn missing_accession_column_is_data_format_error() {
        let t = table("B1", &["MW"], &[&["10"]]);
        let err = remove_contaminants(&t, "accession", &tags()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn nan_molecular_weight_is_an_error() {
        let t = table("B1", &["accession", "MW"], &[&["a", "12"], &["b", "NaN"]]);
        let range = MwRange::new(10.0, 20.0).unwrap();
        let err = filter_molecular_weight(&t, "MW", range).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn range_requires_min_below_max() {
        assert!(MwRange::new(10.0, 20.0).is_ok());
        assert_eq!(
            MwRange::new(20.0, 10.0).unwrap_err().kind(),
            ErrorKind::InputValidation
        );
        assert!(MwRange::new(10.0, 10.0).is_err());
        assert!(MwRange::new(f64::NAN, 10.0).is_err());
    }

    #[test]
    fn weight_bounds_are_inclusive() {
        let t = band(
            "B1",
            &[
                ("a", 9_999.0),
                ("b", 10_000.0),
                ("c", 25_000.0),
                ("d", 50_000.0),
                ("e", 50_001.0),
            ],
        );
        let range = MwRange::new(10_000.0, 50_000.0).unwrap();
        let (kept, dropped) = filter_molecular_weight(&t, "MW", range).unwrap();
        let accs: Vec<String> = kept.rows.iter().map(|r| r[0].key()).collect();
        assert_eq!(accs, vec!["b", "c", "d"]);
        assert_eq!(dropped, 2);
        assert_eq!(kept.len() + dropped, t.len());
        for row in 0..kept.len() {
            assert!(range.contains(kept.numeric(row, 1).unwrap()));
        }
    }

    #[test]
    fn repeated_weights_are_handled_row_by_row() {
        let t = band("B1", &[("a", 5.0), ("b", 5.0), ("c", 15.0), ("d", 5.0)]);
        let range = MwRange::new(10.0, 20.0).unwrap();
        let (kept, dropped) = filter_molecular_weight(&t, "MW", range).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 3);
    }

    #[test]
    fn non_numeric_weight_fails() {
        let t = table("B1", &["accession", "MW"], &[&["a", "12"], &["b", "heavy"]]);
        let range = MwRange::new(10.0, 20.0).unwrap();
        let err = filter_molecular_weight(&t, "MW", range).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn missing_weight_cell_fails() {
        let t = table("B1", &["accession", "MW"], &[&["a", ""]]);
        let range = MwRange::new(10.0, 20.0).unwrap();
        assert!(filter_molecular_weight(&t, "MW", range).is_err());
    }
}
