// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use enlace_app::TableSource;
use enlace_tui::AppRuntime;
use std::path::Path;

/// The production runtime: loads tables from CSV files on disk.
pub struct CsvRuntime {
    preview_rows: usize,
}

impl CsvRuntime {
    pub fn new(preview_rows: usize) -> Self {
        Self { preview_rows }
    }
}

impl AppRuntime for CsvRuntime {
    fn load_table(&mut self, path: &Path) -> Result<TableSource> {
        enlace_ingest::read_csv_file(path, self.preview_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::CsvRuntime;
    use anyhow::Result;
    use enlace_tui::AppRuntime;

    #[test]
    fn loads_a_csv_file_with_the_configured_preview() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("orders.csv");
        std::fs::write(&path, "id,name\n1,alice\n2,bob\n3,carol\n")?;

        let mut runtime = CsvRuntime::new(1);
        let table = runtime.load_table(&path)?;
        assert_eq!(table.name, "orders.csv");
        assert_eq!(table.headers, vec!["id", "name"]);
        assert_eq!(table.rows.len(), 1);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut runtime = CsvRuntime::new(2);
        let error = runtime
            .load_table(std::path::Path::new("/nonexistent/missing.csv"))
            .expect_err("missing file should fail");
        assert!(error.to_string().contains("missing.csv"));
    }
}
