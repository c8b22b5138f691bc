// Delimited-text loading: first row is the header, every later row a record.
// Pure parsing plus thin file helpers; no clap, no formatting.

use std::path::{Path, PathBuf};

use matchbook_recon::{Record, ReconError, Value};

/// Delimiter implied by a file extension: `.tsv` / `.tab` → tab, else comma.
pub fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}

/// Parse delimited text into records of text values, in header order.
///
/// Rows where every cell is empty are skipped. Short rows leave the trailing
/// fields absent; cells beyond the header are dropped.
pub fn load_csv_records(data: &str, delimiter: u8) -> Result<Vec<Record>, ReconError> {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ReconError::Io(e.to_string()))?;
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(h, cell)| (h.clone(), Value::from(cell)))
            .collect();
        records.push(record);
    }

    Ok(records)
}

/// Read and parse one file. `delimiter` overrides the extension default.
pub fn load_csv_file(path: &Path, delimiter: Option<u8>) -> Result<Vec<Record>, ReconError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
    let delimiter = delimiter.unwrap_or_else(|| delimiter_for(path));
    load_csv_records(&data, delimiter).map_err(|e| match e {
        ReconError::Io(msg) => ReconError::Io(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Concatenate several files into one source, in argument order.
pub fn load_source(paths: &[PathBuf], delimiter: Option<u8>) -> Result<Vec<Record>, ReconError> {
    let mut records = Vec::new();
    for path in paths {
        let rows = load_csv_file(path, delimiter)?;
        log::info!("loaded {} rows from {}", rows.len(), path.display());
        records.extend(rows);
    }
    Ok(records)
}
