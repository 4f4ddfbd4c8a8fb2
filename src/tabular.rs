//! Tabular I/O
//!
//! Reads student rows from CSV, writes batch results back out with the
//! prediction columns appended, and generates a fill-in template.

use crate::error::ComputeError;
use crate::pipeline::SpatialPipeline;
use crate::schema::{RawFields, RawFieldsAdapter, FIELDS};
use crate::types::{BatchResult, RowOutcome};
use std::io;

/// Columns appended to every exported row, in order
pub const OUTPUT_COLUMNS: [&str; 6] = [
    "predicted_class",
    "confidence",
    "study_efficiency",
    "gaming_engagement",
    "spatial_score",
    "digital_lifestyle",
];

/// Decimal places used for numeric output cells
pub const OUTPUT_PRECISION: usize = 4;

/// Parsed CSV: header row plus data rows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabularInput {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularInput {
    /// Raw field mappings, one per row; empty cells are left out
    pub fn raw_rows(&self) -> Vec<RawFields> {
        self.rows
            .iter()
            .map(|row| {
                RawFieldsAdapter::from_cells(
                    self.headers
                        .iter()
                        .zip(row.iter())
                        .filter(|(_, cell)| !cell.trim().is_empty())
                        .map(|(name, cell)| (name.as_str(), cell.as_str())),
                )
            })
            .collect()
    }

    /// Positions of original columns kept in the export
    fn kept_columns(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, name)| !OUTPUT_COLUMNS.iter().any(|col| *col == name.trim()))
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Read a CSV with a header row
pub fn read_csv<R: io::Read>(reader: R) -> Result<TabularInput, ComputeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ComputeError::ParseError(
            "CSV input has no header row".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    log::debug!("read {} CSV rows with {} columns", rows.len(), headers.len());
    Ok(TabularInput { headers, rows })
}

/// Write a batch result alongside the original cells.
///
/// Original columns named like an output column are replaced by it. Failed
/// rows keep their original cells with the appended cells left empty.
pub fn write_batch_csv<W: io::Write>(
    writer: W,
    input: &TabularInput,
    batch: &BatchResult,
) -> Result<(), ComputeError> {
    if input.rows.len() != batch.rows.len() {
        return Err(ComputeError::EncodingError(format!(
            "batch has {} rows but the input has {}",
            batch.rows.len(),
            input.rows.len()
        )));
    }

    let kept = input.kept_columns();
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    let header: Vec<&str> = kept
        .iter()
        .map(|idx| input.headers[*idx].as_str())
        .chain(OUTPUT_COLUMNS)
        .collect();
    writer.write_record(&header)?;

    for (cells, row) in input.rows.iter().zip(&batch.rows) {
        let mut out: Vec<String> = kept
            .iter()
            .map(|idx| cells.get(*idx).cloned().unwrap_or_default())
            .collect();

        match &row.outcome {
            RowOutcome::Success(prediction) => {
                let indices = &prediction.indices;
                out.push(prediction.prediction.predicted_class.label().to_string());
                out.extend(
                    [
                        prediction.prediction.confidence,
                        indices.study_efficiency,
                        indices.gaming_engagement,
                        indices.spatial_score,
                        indices.digital_lifestyle,
                    ]
                    .iter()
                    .map(|value| format!("{:.*}", OUTPUT_PRECISION, value)),
                );
            }
            RowOutcome::Failure(_) => {
                out.extend(OUTPUT_COLUMNS.iter().map(|_| String::new()));
            }
        }

        writer.write_record(&out)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a template with every known field and three example rows
pub fn write_template<W: io::Write>(writer: W) -> Result<(), ComputeError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(FIELDS.iter().map(|spec| spec.name))?;
    for example in 0..3 {
        writer.write_record(FIELDS.iter().map(|spec| spec.examples[example]))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read CSV, predict every row and write the annotated CSV
pub fn process_csv<R: io::Read, W: io::Write>(
    pipeline: &SpatialPipeline,
    reader: R,
    writer: W,
) -> Result<BatchResult, ComputeError> {
    let input = read_csv(reader)?;
    let batch = pipeline.run_batch(&input.raw_rows());
    write_batch_csv(writer, &input, &batch)?;
    Ok(batch)
}

/// In-memory variant of [`process_csv`]
pub fn process_csv_str(
    pipeline: &SpatialPipeline,
    csv_text: &str,
) -> Result<(String, BatchResult), ComputeError> {
    let mut out = Vec::new();
    let batch = process_csv(pipeline, csv_text.as_bytes(), &mut out)?;
    let text = String::from_utf8(out).map_err(|e| ComputeError::EncodingError(e.to_string()))?;
    Ok((text, batch))
}
