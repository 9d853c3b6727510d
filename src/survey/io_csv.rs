// Primitives for reading the raw survey CSV export.

use std::collections::HashMap;

use log::{debug, warn};
use snafu::prelude::*;

use crate::survey::{CsvLineParseSnafu, CsvOpenSnafu, ParsedResponse, SurveyResult};

/// Reads the survey file and renames its columns through the configured
/// header mapping. Unmapped headers are dropped; mapped headers missing
/// from the file are reported once and read as empty fields.
pub fn read_survey_csv(
    path: &str,
    columns: &HashMap<String, String>,
) -> SurveyResult<Vec<ParsedResponse>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();

    let header = match records.next() {
        Some(r) => r.context(CsvLineParseSnafu { lineno: 1usize })?,
        None => {
            whatever!("Survey file {} is empty", path)
        }
    };

    // Column position -> renamed field, in header order.
    let mut field_by_index: Vec<Option<String>> = Vec::new();
    for h in header.iter() {
        let key = h.trim();
        match columns.get(key) {
            Some(field) => field_by_index.push(Some(field.clone())),
            None => {
                debug!("read_survey_csv: ignoring unmapped column {:?}", key);
                field_by_index.push(None);
            }
        }
    }
    for (original, field) in columns.iter() {
        if !field_by_index.iter().flatten().any(|f| f == field) {
            warn!(
                "read_survey_csv: configured column {:?} ({:?}) not present in {:?}",
                original, field, path
            );
        }
    }

    let mut res: Vec<ParsedResponse> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_survey_csv: lineno: {:?} row: {:?}", lineno, line);

        let mut fields: HashMap<String, String> = HashMap::new();
        for (cell, field) in line.iter().zip(field_by_index.iter()) {
            if let Some(f) = field {
                fields.insert(f.clone(), cell.trim().to_string());
            }
        }
        res.push(ParsedResponse { lineno, fields });
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn mapping() -> HashMap<String, String> {
        [
            ("Name?", "nome_completo"),
            ("Main group?", "grupo_principal"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn renames_mapped_columns_and_drops_the_rest() {
        let mut f = tempfile_path("leadfit_io_csv_rename");
        writeln!(f.1, "Name?,Timestamp,Main group?").unwrap();
        writeln!(f.1, "Alex, 2024-01-01 ,G1").unwrap();
        f.1.flush().unwrap();

        let rows = read_survey_csv(&f.0, &mapping()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].lineno, 2);
        assert_eq!(rows[0].field("nome_completo"), "Alex");
        assert_eq!(rows[0].field("grupo_principal"), "G1");
        assert_eq!(rows[0].field("timestamp"), "");
    }

    #[test]
    fn short_rows_read_missing_cells_as_empty() {
        let mut f = tempfile_path("leadfit_io_csv_short");
        writeln!(f.1, "Name?,Main group?").unwrap();
        writeln!(f.1, "Sam").unwrap();
        f.1.flush().unwrap();

        let rows = read_survey_csv(&f.0, &mapping()).unwrap();
        assert_eq!(rows[0].field("grupo_principal"), "");
    }

    fn tempfile_path(tag: &str) -> (String, std::fs::File) {
        let path = std::env::temp_dir().join(format!("{}_{}.csv", tag, std::process::id()));
        let p = path.display().to_string();
        (p.clone(), std::fs::File::create(p).unwrap())
    }
}
