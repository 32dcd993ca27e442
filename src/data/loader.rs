use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use calamine::{Data, Reader, open_workbook_auto};
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, ProteinTable, guess_cell_type};
use crate::error::ProteoError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Input formats `load_table` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Workbook,
    Csv,
    Json,
    Parquet,
}

impl TableFormat {
    /// Format for a lower-case file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(TableFormat::Workbook),
            "csv" => Some(TableFormat::Csv),
            "json" => Some(TableFormat::Json),
            "parquet" | "pq" => Some(TableFormat::Parquet),
            _ => None,
        }
    }
}

/// Load a protein table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – the sheet named `sheet`
///   (exports put the protein list in "Protein sets"), first row is the header
/// * `.csv`     – header row with column names
/// * `.json`    – `[{ "accession": "...", "MW": 12345, ... }, ...]`
/// * `.parquet` – one scalar column per attribute
///
/// The table is named `name`.
pub fn load_table(path: &Path, sheet: &str, name: &str) -> Result<ProteinTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let Some(format) = TableFormat::from_extension(&ext) else {
        bail!("Unsupported file extension: .{ext}");
    };
    let table = match format {
        TableFormat::Workbook => load_workbook(path, sheet, name),
        TableFormat::Csv => load_csv(path, name),
        TableFormat::Json => load_json(path, name),
        TableFormat::Parquet => load_parquet(path, name),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!(
        "{name}: loaded {} rows × {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Workbook loader
// ---------------------------------------------------------------------------

fn load_workbook(path: &Path, sheet: &str, name: &str) -> Result<ProteinTable> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;

    if !workbook.sheet_names().iter().any(|s| s == sheet) {
        return Err(ProteoError::MissingSheet {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
        }
        .into());
    }
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("reading sheet '{sheet}'"))?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string()).collect(),
        None => Vec::new(),
    };

    let mut table = ProteinTable::new(name, columns);
    for row in rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        table.push_row(row.iter().map(workbook_cell).collect());
    }
    Ok(table)
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => guess_cell_type(s.trim()),
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, name: &str) -> Result<ProteinTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = ProteinTable::new(name, columns);
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        table.push_row(record.iter().map(|v| guess_cell_type(v.trim())).collect());
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). Columns are
/// collected in first-seen order across all records.
fn load_json(path: &Path, name: &str) -> Result<ProteinTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = ProteinTable::new(name, columns);
    for rec in records {
        // Checked above.
        let Some(obj) = rec.as_object() else { continue };
        let row = table
            .columns
            .iter()
            .map(|c| obj.get(c).map(json_to_cell).unwrap_or(CellValue::Null))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas (`df.to_parquet()`) or Polars.
/// Every column becomes a table column; list / struct columns are rendered
/// as their type name.
fn load_parquet(path: &Path, name: &str) -> Result<ProteinTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = ProteinTable::new(name, columns);
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            table.push_row(cells);
        }
    }
    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            CellValue::Text(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            CellValue::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            CellValue::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            CellValue::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            CellValue::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            CellValue::Bool(arr.value(row))
        }
        other => CellValue::Text(format!("{other:?}")),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_csv_with_typed_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "band.csv",
            "accession,MW,description\nP1_MYCTU,15000,Protein one\nP2_HUMAN,22000.5,\n",
        );
        let t = load_table(&path, "Protein sets", "B1").unwrap();
        assert_eq!(t.name, "B1");
        assert_eq!(t.columns, vec!["accession", "MW", "description"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows[0][1], CellValue::Integer(15000));
        assert_eq!(t.rows[1][1], CellValue::Float(22000.5));
        assert_eq!(t.rows[1][2], CellValue::Null);
    }

    #[test]
    fn loads_json_records_with_column_union() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "pulldown.json",
            r#"[{"accession": "P1", "ratio_g1_vs_g2": 4.0},
                {"accession": "P2", "t-test_g1_vs_g2": 0.01}]"#,
        );
        let t = load_table(&path, "ignored", "pulldown").unwrap();
        assert_eq!(t.columns, vec!["accession", "ratio_g1_vs_g2", "t-test_g1_vs_g2"]);
        assert_eq!(t.rows[0][2], CellValue::Null);
        assert_eq!(t.rows[1][2], CellValue::Float(0.01));
    }

    #[test]
    fn loads_parquet_with_nulls() {
        use arrow::array::ArrayRef;
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("accession", DataType::Utf8, false),
            Field::new("MW", DataType::Int64, true),
            Field::new("ratio_g1_vs_g2", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["P1_MYCTU", "P2_HUMAN"])) as ArrayRef,
                Arc::new(Int64Array::from(vec![Some(15_000), None])) as ArrayRef,
                Arc::new(Float64Array::from(vec![Some(4.5), Some(0.0)])) as ArrayRef,
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulldown.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let t = load_table(&path, "Protein sets", "pulldown").unwrap();
        assert_eq!(t.columns, vec!["accession", "MW", "ratio_g1_vs_g2"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows[0][0], CellValue::Text("P1_MYCTU".into()));
        assert_eq!(t.rows[0][1], CellValue::Integer(15_000));
        assert_eq!(t.rows[0][2], CellValue::Float(4.5));
        assert_eq!(t.rows[1][1], CellValue::Null);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "band.txt", "accession\n");
        let err = load_table(&path, "Protein sets", "B1").unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    #[test]
    fn missing_sheet_is_data_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("band.xlsx");
        let mut wb = rust_xlsxwriter::Workbook::new();
        let ws = wb.add_worksheet();
        ws.set_name("Other").unwrap();
        ws.write_string(0, 0, "accession").unwrap();
        wb.save(&path).unwrap();

        let err = load_table(&path, "Protein sets", "B1").unwrap_err();
        let core = err
            .chain()
            .find_map(|e| e.downcast_ref::<ProteoError>())
            .expect("typed error in chain");
        assert_eq!(core.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn reads_protein_sets_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("band.xlsx");
        let mut wb = rust_xlsxwriter::Workbook::new();
        let ws = wb.add_worksheet();
        ws.set_name("Protein sets").unwrap();
        ws.write_string(0, 0, "accession").unwrap();
        ws.write_string(0, 1, "MW").unwrap();
        ws.write_string(1, 0, "P1_MYCTU").unwrap();
        ws.write_number(1, 1, 15000.0).unwrap();
        wb.save(&path).unwrap();

        let t = load_table(&path, "Protein sets", "B1").unwrap();
        assert_eq!(t.columns, vec!["accession", "MW"]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.rows[0][1].as_f64(), Some(15000.0));
    }
}
