//! # Report Input and Output
//!
//! Tab-separated tables in and out of the simulator. Single runs are written as
//! one row per age; batch runs read one patient per row and write a long table
//! keyed by `sample_id`.
//!
//! - Patient TSV columns: `sample_id` (optional), `threshold`, `age`, `genotype`,
//!   `gender`. Blank or absent columns surface as `MissingField` for that row.
//! - Percentile TSV columns: `age`, `P10` .. `P90`, preceded by `sample_id` in
//!   batch output.

use crate::patient::PatientInput;
use crate::percentile::PercentileRecord;
use crate::simulate::SimulationError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Error reading or writing TSV: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Invalid patient row '{sample_id}': {source}")]
    InvalidRow {
        sample_id: String,
        #[source]
        source: SimulationError,
    },
}

/// A patient row as read from disk, before validation.
#[derive(Debug, Deserialize)]
struct PatientRow {
    #[serde(default)]
    sample_id: Option<String>,
    #[serde(default)]
    threshold: String,
    #[serde(default)]
    age: String,
    #[serde(default)]
    genotype: String,
    #[serde(default)]
    gender: String,
}

/// One line of the batch table. The csv serializer does not accept flattened
/// structs, so the percentile columns are spelled out alongside `sample_id`.
#[derive(Debug, Serialize)]
struct BatchRow<'a> {
    sample_id: &'a str,
    age: u32,
    #[serde(rename = "P10")]
    p10: f64,
    #[serde(rename = "P20")]
    p20: f64,
    #[serde(rename = "P30")]
    p30: f64,
    #[serde(rename = "P40")]
    p40: f64,
    #[serde(rename = "P50")]
    p50: f64,
    #[serde(rename = "P60")]
    p60: f64,
    #[serde(rename = "P70")]
    p70: f64,
    #[serde(rename = "P80")]
    p80: f64,
    #[serde(rename = "P90")]
    p90: f64,
}

impl<'a> BatchRow<'a> {
    fn new(sample_id: &'a str, record: &PercentileRecord) -> Self {
        Self {
            sample_id,
            age: record.age,
            p10: record.p10,
            p20: record.p20,
            p30: record.p30,
            p40: record.p40,
            p50: record.p50,
            p60: record.p60,
            p70: record.p70,
            p80: record.p80,
            p90: record.p90,
        }
    }
}

/// A validated patient from a batch file.
#[derive(Debug, Clone)]
pub struct BatchPatient {
    pub sample_id: String,
    pub input: PatientInput,
}

/// Simulated percentiles for one batch patient.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub sample_id: String,
    pub records: Vec<PercentileRecord>,
}

/// Writes one simulation as `age  P10 .. P90`.
pub fn write_percentiles_tsv(path: &Path, records: &[PercentileRecord]) -> Result<(), ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    log::info!("Wrote {} percentile rows to {}", records.len(), path.display());
    Ok(())
}

/// Reads a patient TSV. Rows without a `sample_id` get sequential 1-based ids.
pub fn read_patients(path: &Path) -> Result<Vec<BatchPatient>, ReportError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut patients = Vec::new();
    for (index, row) in reader.deserialize::<PatientRow>().enumerate() {
        let row = row?;
        let sample_id = row
            .sample_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| (index + 1).to_string());
        let input = PatientInput::from_fields(&row.threshold, &row.age, &row.genotype, &row.gender)
            .map_err(|source| ReportError::InvalidRow {
                sample_id: sample_id.clone(),
                source,
            })?;
        patients.push(BatchPatient { sample_id, input });
    }
    log::info!("Read {} patients from {}", patients.len(), path.display());
    Ok(patients)
}

/// Writes batch results as `sample_id  age  P10 .. P90`, one row per patient and age.
pub fn write_batch_tsv(path: &Path, results: &[BatchResult]) -> Result<(), ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;

    for result in results {
        for record in &result.records {
            writer.serialize(BatchRow::new(&result.sample_id, record))?;
        }
    }
    writer.flush()?;
    log::info!("Wrote batch results for {} patients to {}", results.len(), path.display());
    Ok(())
}

/// Console table of the P10, median, and P90 bands at one decimal.
pub fn format_summary(records: &[PercentileRecord]) -> String {
    let mut out = format!("{:>5} {:>7} {:>7} {:>7}\n", "Age", "P10", "P50", "P90");
    for record in records {
        out.push_str(&format!(
            "{:>5} {:>7.1} {:>7.1} {:>7.1}\n",
            record.age, record.p10, record.p50, record.p90
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::{Gender, Genotype};
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    const PERCENTILE_HEADER: [&str; 10] = [
        "age", "P10", "P20", "P30", "P40", "P50", "P60", "P70", "P80", "P90",
    ];

    fn record(age: u32, base: f64) -> PercentileRecord {
        PercentileRecord {
            age,
            p10: base,
            p20: base + 1.0,
            p30: base + 2.0,
            p40: base + 3.0,
            p50: base + 4.0,
            p60: base + 5.0,
            p70: base + 6.0,
            p80: base + 7.0,
            p90: base + 8.0,
        }
    }

    fn patient_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn percentile_tsv_has_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        write_percentiles_tsv(&path, &[record(0, 10.0), record(1, 12.5)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], PERCENTILE_HEADER.join("\t"));
        assert_eq!(lines[1], "0\t10.0\t11.0\t12.0\t13.0\t14.0\t15.0\t16.0\t17.0\t18.0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn reads_patients_and_generates_missing_ids() {
        let file = patient_file(
            "sample_id\tthreshold\tage\tgenotype\tgender\n\
             child_a\t20\t10\tG00\tFemale\n\
             \t45.5\t3\tG11\tmale\n",
        );
        let patients = read_patients(file.path()).unwrap();
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0].sample_id, "child_a");
        assert_eq!(patients[0].input.genotype, Genotype::G00);
        assert_eq!(patients[1].sample_id, "2");
        assert_eq!(patients[1].input.baseline_threshold, 45.5);
        assert_eq!(patients[1].input.gender, Gender::Male);
    }

    #[test]
    fn bad_row_reports_its_sample_id() {
        let file = patient_file(
            "sample_id\tthreshold\tage\tgenotype\tgender\n\
             ok\t20\t10\tG00\tFemale\n\
             broken\t20\t10\tG42\tFemale\n",
        );
        match read_patients(file.path()) {
            Err(ReportError::InvalidRow { sample_id, source }) => {
                assert_eq!(sample_id, "broken");
                assert_eq!(source, SimulationError::UnknownGenotype("G42".to_string()));
            }
            other => panic!("expected InvalidRow, got {other:?}"),
        }
    }

    #[test]
    fn absent_column_is_a_missing_field() {
        let file = patient_file("threshold\tage\tgenotype\n20\t10\tG00\n");
        match read_patients(file.path()) {
            Err(ReportError::InvalidRow { sample_id, source }) => {
                assert_eq!(sample_id, "1");
                assert_eq!(source, SimulationError::MissingField("gender"));
            }
            other => panic!("expected InvalidRow, got {other:?}"),
        }
    }

    #[test]
    fn batch_tsv_is_long_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.tsv");
        let results = vec![
            BatchResult {
                sample_id: "a".to_string(),
                records: vec![record(0, 1.0), record(1, 2.0)],
            },
            BatchResult {
                sample_id: "b".to_string(),
                records: vec![record(0, 3.0)],
            },
        ];
        write_batch_tsv(&path, &results).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        let mut header = vec!["sample_id"];
        header.extend(PERCENTILE_HEADER);
        assert_eq!(lines[0], header.join("\t"));
        assert_eq!(lines[2], "a\t1\t2.0\t3.0\t4.0\t5.0\t6.0\t7.0\t8.0\t9.0\t10.0");
        assert!(lines[3].starts_with("b\t0\t3.0\t4.0"));
    }

    #[test]
    fn summary_rounds_to_one_decimal() {
        let summary = format_summary(&[record(4, 20.04)]);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 2);
        let fields: Vec<&str> = lines[1].split_whitespace().collect();
        assert_eq!(fields, vec!["4", "20.0", "24.0", "28.0"]);
    }
}
