// src/sheets/writer.rs
use crate::config::CellRef;
use crate::extractors::ExtractionResult;
use crate::sheets::value::CellValue;
use crate::utils::error::SheetsError;

/// Destination for single-cell writes.
#[allow(async_fn_in_trait)]
pub trait CellSink {
    async fn write_cell(&mut self, cell: &CellRef, value: &CellValue) -> Result<(), SheetsError>;
}

/// Counts reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub misses: usize,
}

/// Turns the extraction result into final cell values. Misses become `not_found_text`.
pub fn render_results(results: &ExtractionResult, not_found_text: &str) -> Vec<(CellRef, CellValue)> {
    results
        .iter()
        .map(|(cell, raw)| {
            let value = match raw {
                Some(raw) => CellValue::Text(raw.clone()).normalize(),
                None => CellValue::Text(not_found_text.to_string()),
            };
            (cell.clone(), value)
        })
        .collect()
}

/// Writes the identifier, then every extracted value, one call per cell.
/// Stops at the first failed write; cells already written stay written.
pub async fn write_results<S: CellSink>(
    sink: &mut S,
    identifier_cell: &CellRef,
    identifier: Option<&str>,
    results: &ExtractionResult,
    not_found_text: &str,
) -> Result<WriteSummary, SheetsError> {
    let identifier_value = CellValue::Text(identifier.unwrap_or(not_found_text).to_string());
    sink.write_cell(identifier_cell, &identifier_value).await?;

    let mut summary = WriteSummary {
        written: 1,
        misses: usize::from(identifier.is_none()),
    };

    for (cell, value) in render_results(results, not_found_text) {
        sink.write_cell(&cell, &value).await?;
        summary.written += 1;
        if results.is_miss(&cell) {
            summary.misses += 1;
        }
    }

    tracing::info!(
        "Wrote {} cells ({} not found)",
        summary.written,
        summary.misses
    );
    Ok(summary)
}
