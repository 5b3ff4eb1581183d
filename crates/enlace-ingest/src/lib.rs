// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use enlace_app::TableSource;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Header plus this many sample rows are kept per table; the tool is an
/// annotator, not a data viewer, so a small preview is enough.
pub const DEFAULT_PREVIEW_ROWS: usize = 2;

/// Reads one CSV file into a preview-limited `TableSource`. The table name
/// is the file name; the first record supplies the headers and at most
/// `preview_rows` further records the sample data.
pub fn read_csv_file(path: &Path, preview_rows: usize) -> Result<TableSource> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file =
        File::open(path).with_context(|| format!("open CSV file {}", path.display()))?;
    read_csv(BufReader::new(file), name, preview_rows)
}

/// Reader-based variant of [`read_csv_file`]. Rows may be ragged; headers
/// may contain duplicates or blanks. An input without a single record is an
/// error.
pub fn read_csv<R: Read>(reader: R, name: String, preview_rows: usize) -> Result<TableSource> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result.with_context(|| format!("read CSV record in {name}"))?;
        let fields: Vec<String> = record.iter().map(str::to_owned).collect();
        match headers {
            None => headers = Some(fields),
            Some(_) => {
                rows.push(fields);
                if rows.len() >= preview_rows {
                    break;
                }
            }
        }
    }

    let Some(headers) = headers else {
        bail!("{name} is empty; expected a header row");
    };

    Ok(TableSource {
        name,
        headers,
        rows,
    })
}

/// The outcome of one file in a batch.
#[derive(Debug)]
pub struct IngestOutcome {
    pub name: String,
    pub result: Result<TableSource>,
}

/// Parses each file independently; one malformed file never aborts the
/// rest of the batch.
pub fn read_csv_files<P: AsRef<Path>>(paths: &[P], preview_rows: usize) -> Vec<IngestOutcome> {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            IngestOutcome {
                name,
                result: read_csv_file(path, preview_rows),
            }
        })
        .collect()
}
