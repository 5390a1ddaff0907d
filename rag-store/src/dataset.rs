//! Dataset readers: CSV (default) and JSONL.
//!
//! Both formats must expose the `pattern`, `tag` and `response` columns
//! (case-sensitive). Extra columns are ignored, missing cells become `""`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::errors::{RagError, SchemaError};
use crate::record::Record;

pub const COLUMNS: [&str; 3] = ["pattern", "tag", "response"];

/// Reads `path` as JSONL when the extension is `.jsonl`, as CSV otherwise.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>, RagError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("jsonl") => read_jsonl(path),
        Some("csv") | None => read_csv(path),
        Some(_) => Err(SchemaError::UnsupportedFormat(path.to_path_buf()).into()),
    }
}

/// Reads a headed CSV file.
pub fn read_csv(path: &Path) -> Result<Vec<Record>, RagError> {
    info!("Reading CSV dataset: {:?}", path);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_path(path)?;

    let headers = rdr.headers()?.clone();
    let mut idx = [0usize; 3];
    for (slot, column) in idx.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == column)
            .ok_or_else(|| SchemaError::MissingColumn {
                column,
                path: path.to_path_buf(),
            })?;
    }

    let mut out = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or_default().to_string();
        out.push(Record {
            pattern: field(idx[0]),
            tag: field(idx[1]),
            response: field(idx[2]),
        });
    }

    debug!("Loaded {} CSV rows", out.len());
    Ok(out)
}

/// Reads one JSON object per line. Blank lines are skipped.
///
/// A column that no row carries is a schema error; a key missing from a
/// single row is an empty cell.
pub fn read_jsonl(path: &Path) -> Result<Vec<Record>, RagError> {
    info!("Reading JSONL dataset: {:?}", path);

    let reader = BufReader::new(File::open(path)?);
    let mut seen = [false; 3];
    let mut out = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let obj: Map<String, Value> = match serde_json::from_str(&line) {
            Ok(o) => o,
            Err(e) => {
                warn!("JSONL line {} is not an object: {}", i + 1, e);
                return Err(e.into());
            }
        };

        for (flag, column) in seen.iter_mut().zip(COLUMNS) {
            *flag |= obj.contains_key(column);
        }
        out.push(Record {
            pattern: cell(&obj, "pattern"),
            tag: cell(&obj, "tag"),
            response: cell(&obj, "response"),
        });
    }

    if !out.is_empty() {
        if let Some((_, column)) = seen.iter().zip(COLUMNS).find(|(s, _)| !**s) {
            return Err(SchemaError::MissingColumn {
                column,
                path: path.to_path_buf(),
            }
            .into());
        }
    }

    debug!("Loaded {} JSONL rows", out.len());
    Ok(out)
}

fn cell(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let p = dir.path().join(name);
        let mut f = File::create(&p).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        p
    }

    #[test]
    fn reads_csv_with_extra_columns_and_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            &dir,
            "data.csv",
            "id,pattern,tag,response\n1,\"frais, svp\",FEES,3000 DH\n2,مرحبا,GREETING,أهلا\n",
        );
        let rows = read_records(&p).unwrap();
        assert_eq!(
            rows,
            vec![
                Record::new("frais, svp", "FEES", "3000 DH"),
                Record::new("مرحبا", "GREETING", "أهلا"),
            ]
        );
    }

    #[test]
    fn csv_missing_cells_become_empty() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(&dir, "data.csv", "pattern,tag,response\nbonjour,,\nsalut\n");
        let rows = read_records(&p).unwrap();
        assert_eq!(rows[0], Record::new("bonjour", "", ""));
        assert_eq!(rows[1], Record::new("salut", "", ""));
    }

    #[test]
    fn csv_column_names_are_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(&dir, "data.csv", "Pattern,tag,response\nx,y,z\n");
        match read_records(&p) {
            Err(RagError::Schema(SchemaError::MissingColumn { column, .. })) => {
                assert_eq!(column, "pattern")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn csv_header_only_yields_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(&dir, "data.csv", "pattern,tag,response\n");
        assert!(read_records(&p).unwrap().is_empty());
    }

    #[test]
    fn reads_jsonl_and_fills_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            &dir,
            "data.jsonl",
            "{\"pattern\":\"a\",\"tag\":\"T\",\"response\":\"r\"}\n\n{\"pattern\":\"b\",\"tag\":null}\n",
        );
        let rows = read_records(&p).unwrap();
        assert_eq!(rows, vec![Record::new("a", "T", "r"), Record::new("b", "", "")]);
    }

    #[test]
    fn jsonl_without_a_column_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(&dir, "data.jsonl", "{\"pattern\":\"a\",\"tag\":\"T\"}\n");
        assert!(matches!(
            read_records(&p),
            Err(RagError::Schema(SchemaError::MissingColumn {
                column: "response",
                ..
            }))
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(&dir, "data.xlsx", "");
        assert!(matches!(
            read_records(&p),
            Err(RagError::Schema(SchemaError::UnsupportedFormat(_)))
        ));
    }
}
