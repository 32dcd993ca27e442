use log::{info, warn};

use super::bands::FilteredBand;
use crate::config::{Sentinels, Settings};
use crate::data::filter::{ContaminantReport, remove_contaminants};
use crate::data::model::{CellValue, ProteinTable};
use crate::error::Result;

// Canonical column names of a classified pull-down table.
pub const RATIO: &str = "ratio";
pub const P_VALUE: &str = "p_value";
pub const RATIO_LOG2: &str = "ratio_log2";
pub const NEG_LOG10_P: &str = "neg_log10_p";

/// Pull-down hits that were also identified in one band.
#[derive(Debug, Clone)]
pub struct BandMatch {
    pub band: String,
    pub table: ProteinTable,
}

#[derive(Debug, Clone)]
pub struct PulldownOutcome {
    pub contaminants: ContaminantReport,
    /// Every target row, with canonical names and the two log columns.
    pub transformed: ProteinTable,
    /// Rows passing the significance / effect-size threshold.
    pub significant: ProteinTable,
    /// One entry per band sharing at least one significant accession.
    pub band_matches: Vec<BandMatch>,
    pub notes: Vec<String>,
}

/// `log2(ratio)` with the plot floor for a zero ratio.
pub fn ratio_log2(ratio: f64, sentinels: &Sentinels) -> f64 {
    substitute(ratio.log2(), sentinels)
}

/// `-log10(p)` with the plot ceiling for a zero p-value.
pub fn neg_log10_p(p_value: f64, sentinels: &Sentinels) -> f64 {
    substitute(-p_value.log10(), sentinels)
}

fn substitute(v: f64, sentinels: &Sentinels) -> f64 {
    if v == f64::INFINITY {
        sentinels.neg_log10_p_ceiling
    } else if v == f64::NEG_INFINITY {
        sentinels.ratio_log2_floor
    } else {
        v
    }
}

/// Classify a pull-down export against the filtered bands.
pub fn classify_pulldown(
    raw: &ProteinTable,
    bands: &[FilteredBand],
    settings: &Settings,
) -> Result<PulldownOutcome> {
    let cols = &settings.columns;
    let mut notes = Vec::new();

    let (mut table, contaminants) =
        remove_contaminants(raw, &cols.accession, &settings.contaminants)?;
    notes.push(contaminants.summary(&raw.name));

    table.rename_column(&cols.ratio, RATIO)?;
    table.rename_column(&cols.p_value, P_VALUE)?;
    let acc = table.require_column(&cols.accession)?;
    let ratio_idx = table.require_column(RATIO)?;
    let p_idx = table.require_column(P_VALUE)?;

    let mut ratios = Vec::with_capacity(table.len());
    let mut p_values = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        ratios.push(table.numeric(row, ratio_idx)?);
        p_values.push(table.numeric(row, p_idx)?);
    }

    let zero_p = accessions_where(&table, acc, &p_values, |p| p == 0.0);
    if !zero_p.is_empty() {
        notes.push(format!(
            "{} show a p-value of exactly 0; -log10 is set to {} (highest).",
            zero_p.join(" "),
            settings.sentinels.neg_log10_p_ceiling
        ));
    }
    let zero_ratio = accessions_where(&table, acc, &ratios, |r| r == 0.0);
    if !zero_ratio.is_empty() {
        notes.push(format!(
            "{} show a ratio of exactly 0; log2 is set to {} (lowest).",
            zero_ratio.join(" "),
            settings.sentinels.ratio_log2_floor
        ));
    }
    let negative = accessions_where(&table, acc, &ratios, |r| r < 0.0);
    if !negative.is_empty() {
        warn!("negative ratio for {}; left out of the plots", negative.join(" "));
        notes.push(format!(
            "{} show a negative ratio; their log2 is undefined.",
            negative.join(" ")
        ));
    }

    let log_ratio = ratios
        .iter()
        .map(|&r| CellValue::Float(ratio_log2(r, &settings.sentinels)))
        .collect();
    let log_p = p_values
        .iter()
        .map(|&p| CellValue::Float(neg_log10_p(p, &settings.sentinels)))
        .collect();
    table.push_column(RATIO_LOG2, log_ratio);
    table.push_column(NEG_LOG10_P, log_p);
    let transformed = table;

    let mut pass = ratios
        .iter()
        .zip(&p_values)
        .map(|(&r, &p)| settings.threshold.passes(r, p));
    let significant = transformed.filtered(format!("{} significant", raw.name), |_| {
        pass.next().unwrap_or(false)
    });
    info!(
        "{}: {} of {} target proteins pass p ≤ {} and ratio > {}",
        raw.name,
        significant.len(),
        transformed.len(),
        settings.threshold.max_p_value,
        settings.threshold.min_ratio
    );
    notes.push(format!(
        "There are {} proteins identified with a p-value ≤ {} and a ratio > {}.",
        significant.len(),
        settings.threshold.max_p_value,
        settings.threshold.min_ratio
    ));

    let mut band_matches = Vec::new();
    for band in bands {
        let accessions = band.table.accession_set(&cols.accession)?;
        let matched = significant.filtered(format!("pull {}", band.label), |r| {
            accessions.contains(&r[acc].key())
        });
        if matched.is_empty() {
            notes.push(format!(
                "No proteins identified in band {} were recovered in pulldown.",
                band.label
            ));
        } else {
            notes.push(format!(
                "{} proteins from {} found enriched in pulldown.",
                matched.len(),
                band.label
            ));
            band_matches.push(BandMatch {
                band: band.label.clone(),
                table: matched,
            });
        }
    }

    Ok(PulldownOutcome {
        contaminants,
        transformed,
        significant,
        band_matches,
        notes,
    })
}

fn accessions_where<F>(table: &ProteinTable, acc: usize, values: &[f64], pred: F) -> Vec<String>
where
    F: Fn(f64) -> bool,
{
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| pred(**v))
        .map(|(row, _)| table.rows[row][acc].key())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Threshold;
    use crate::data::model::fixtures::{band, table};
    use crate::error::ErrorKind;

    const COLS: &[&str] = &["accession", "ratio_g1_vs_g2", "t-test_g1_vs_g2"];

    fn filtered(label: &str, accs: &[&str]) -> FilteredBand {
        let rows: Vec<(&str, f64)> = accs.iter().map(|a| (*a, 10.0)).collect();
        FilteredBand {
            label: label.to_string(),
            table: band(label, &rows),
            contaminants: ContaminantReport::default(),
            outside_range: 0,
        }
    }

    fn column(t: &ProteinTable, name: &str) -> Vec<f64> {
        let idx = t.column_index(name).unwrap();
        t.rows.iter().map(|r| r[idx].as_f64().unwrap()).collect()
    }

    #[test]
    fn sentinels_are_exact() {
        let s = Sentinels::default();
        assert_eq!(ratio_log2(0.0, &s), -7.78);
        assert_eq!(neg_log10_p(0.0, &s), 6.0);
        assert_eq!(ratio_log2(4.0, &s), 2.0);
        assert!((neg_log10_p(0.01, &s) - 2.0).abs() < 1e-12);
        assert!(ratio_log2(-1.0, &s).is_nan());
    }

    #[test]
    fn infinite_inputs_get_sentinels() {
        let s = Sentinels::default();
        // log2(inf) = +inf is replaced by the ceiling, -log10(inf) = -inf by the floor.
        assert_eq!(ratio_log2(f64::INFINITY, &s), 6.0);
        assert_eq!(neg_log10_p(f64::INFINITY, &s), -7.78);
        assert!(ratio_log2(1e300, &s).is_finite());
    }

    #[test]
    fn threshold_defaults() {
        let t = Threshold::default();
        assert!(t.passes(4.0, 0.01));
        assert!(!t.passes(1.5, 0.01));
        assert!(t.passes(2.5, 0.05));
        assert!(!t.passes(2.0, 0.01));
        assert!(!t.passes(10.0, 0.051));
    }

    #[test]
    fn classifies_and_cross_references() {
        let raw = table(
            "pulldown",
            COLS,
            &[
                &["P1_MYCTU", "4", "0.01"],
                &["P2_MYCTU", "1.5", "0.01"],
                &["P3_HUMAN", "8", "0.001"],
                &["P4_MYCTU", "0", "0"],
                &["P5_MYCTU", "3", "0"],
            ],
        );
        let bands = vec![
            filtered("B1", &["P1_MYCTU", "P2_MYCTU"]),
            filtered("B2", &["P9_MYCTU"]),
            filtered("B3", &["P5_MYCTU", "P1_MYCTU"]),
        ];
        let out = classify_pulldown(&raw, &bands, &Settings::default()).unwrap();

        assert_eq!(out.contaminants.human, 1);
        assert_eq!(out.transformed.len(), 4);
        assert!(out.transformed.column_index(RATIO).is_some());
        assert!(out.transformed.column_index(P_VALUE).is_some());
        assert!(out.transformed.column_index("ratio_g1_vs_g2").is_none());

        assert_eq!(column(&out.transformed, RATIO_LOG2)[2], -7.78);
        assert_eq!(column(&out.transformed, NEG_LOG10_P)[2], 6.0);
        assert_eq!(column(&out.transformed, NEG_LOG10_P)[3], 6.0);

        let sig: Vec<String> = out.significant.rows.iter().map(|r| r[0].key()).collect();
        assert_eq!(sig, vec!["P1_MYCTU", "P5_MYCTU"]);

        let matched: Vec<(&str, usize)> = out
            .band_matches
            .iter()
            .map(|m| (m.band.as_str(), m.table.len()))
            .collect();
        assert_eq!(matched, vec![("B1", 1), ("B3", 2)]);
        assert_eq!(out.band_matches[0].table.name, "pull B1");
        assert!(out
            .notes
            .iter()
            .any(|n| n == "No proteins identified in band B2 were recovered in pulldown."));
        assert!(out.notes.iter().any(|n| n.starts_with("P4_MYCTU P5_MYCTU show a p-value")));
    }

    #[test]
    fn missing_ratio_column_is_named() {
        let raw = table("pulldown", &["accession", "t-test_g1_vs_g2"], &[&["P1_MYCTU", "0.1"]]);
        let err = classify_pulldown(&raw, &[], &Settings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
        assert!(err.to_string().contains("ratio_g1_vs_g2"));
    }

    #[test]
    fn non_numeric_p_value_is_rejected() {
        let raw = table("pulldown", COLS, &[&["P1_MYCTU", "3", "n.s."]]);
        let err = classify_pulldown(&raw, &[], &Settings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn nan_p_value_is_rejected() {
        let raw = table(
            "pulldown",
            COLS,
            &[&["P1_MYCTU", "4", "0.01"], &["P2_MYCTU", "4", "NaN"]],
        );
        let err = classify_pulldown(&raw, &[], &Settings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
        assert!(err.to_string().contains("p_value"));
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let raw = table(
            "pulldown",
            COLS,
            &[&["P1_MYCTU", "4", "0.01"], &["P2_MYCTU", "1.5", "0.01"]],
        );
        let mut settings = Settings::default();
        settings.threshold.min_ratio = 1.0;
        let out = classify_pulldown(&raw, &[], &settings).unwrap();
        assert_eq!(out.significant.len(), 2);
    }
}
