use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::data::model::{CellValue, ProteinTable};

/// Excel refuses longer sheet names.
const MAX_SHEET_NAME: usize = 31;

/// Replace characters Excel forbids in sheet names and cut to 31 characters.
pub fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    cleaned.chars().take(MAX_SHEET_NAME).collect()
}

/// Write `tables` to `path`, one sheet per table named after the table.
pub fn write_workbook(path: &Path, tables: &[&ProteinTable]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for table in tables {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet_name(&table.name))
            .with_context(|| format!("naming sheet '{}'", table.name))?;
        write_table(ws, table, &header)
            .with_context(|| format!("writing sheet '{}'", table.name))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("saving {}", path.display()))?;
    info!("wrote {} sheet(s) to {}", tables.len(), path.display());
    Ok(())
}

fn write_table(ws: &mut Worksheet, table: &ProteinTable, header: &Format) -> Result<()> {
    for (col, name) in table.columns.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, name, header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Text(s) => {
                    ws.write_string(r, col, s)?;
                }
                CellValue::Integer(i) => {
                    ws.write_number(r, col, *i as f64)?;
                }
                CellValue::Float(v) if v.is_finite() => {
                    ws.write_number(r, col, *v)?;
                }
                CellValue::Bool(b) => {
                    ws.write_boolean(r, col, *b)?;
                }
                // NaN / ±inf and empty cells stay blank.
                CellValue::Float(_) | CellValue::Null => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_table;
    use crate::data::model::fixtures::table;

    #[test]
    fn sheet_names_are_sanitised() {
        assert_eq!(sheet_name("common B1 B2"), "common B1 B2");
        assert_eq!(sheet_name("a/b:c"), "a_b_c");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
    }

    #[test]
    fn written_sheets_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let b1 = table("B1", &["accession", "MW"], &[&["P1_MYCTU", "15000"]]);
        let mut b2 = table("B2", &["accession", "MW"], &[&["P2_MYCTU", ""]]);
        b2.rows.push(vec![
            CellValue::Text("P3_MYCTU".into()),
            CellValue::Float(f64::NAN),
        ]);
        write_workbook(&path, &[&b1, &b2]).unwrap();

        let back = load_table(&path, "B1", "B1").unwrap();
        assert_eq!(back.columns, vec!["accession", "MW"]);
        assert_eq!(back.rows[0][1].as_f64(), Some(15000.0));

        let back = load_table(&path, "B2", "B2").unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.rows[1][1], CellValue::Null);
    }
}
