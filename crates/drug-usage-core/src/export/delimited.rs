//! Delimited-text export of aggregate views for spreadsheet download.

use crate::models::{DetailView, RollupView};

use super::{ExportError, ExportResult};

/// UTF-8 signature so spreadsheet tools detect the encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A view that can be written as a table.
pub trait ExportView {
    /// Column names, without the sequence column.
    fn headers(&self) -> Vec<&'static str>;

    /// Cell values in row order.
    fn records(&self) -> Vec<Vec<String>>;
}

impl ExportView for DetailView {
    fn headers(&self) -> Vec<&'static str> {
        vec![
            "code",
            "name",
            "manufacturer",
            "quantity",
            "unit_price",
            "total",
            "quantity_share",
            "cost_share",
        ]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                vec![
                    row.code.clone(),
                    row.name.clone(),
                    row.manufacturer.clone(),
                    format_decimal(row.quantity),
                    row.unit_price.map(format_price).unwrap_or_default(),
                    row.total.map(format_decimal).unwrap_or_default(),
                    format_decimal(row.quantity_share),
                    row.cost_share.map(format_decimal).unwrap_or_default(),
                ]
            })
            .collect()
    }
}

impl ExportView for RollupView {
    fn headers(&self) -> Vec<&'static str> {
        vec![
            self.grouping.key_label(),
            "row_count",
            "quantity",
            "total",
            "unknown_price_rows",
            "quantity_share",
            "cost_share",
        ]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                vec![
                    row.key.clone(),
                    row.row_count.to_string(),
                    format_decimal(row.quantity),
                    format_decimal(row.total),
                    row.unknown_price_rows.to_string(),
                    format_decimal(row.quantity_share),
                    format_decimal(row.cost_share),
                ]
            })
            .collect()
    }
}

/// Write a view as UTF-8-with-signature CSV, prefixed with a 1-based `seq` column.
///
/// The header row is always written, so an empty view yields a header-only file.
pub fn export_csv<V: ExportView + ?Sized>(view: &V) -> ExportResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.extend_from_slice(UTF8_BOM);

    let mut writer = csv::Writer::from_writer(buf);

    let mut header = vec!["seq"];
    header.extend(view.headers());
    writer.write_record(&header)?;

    for (index, record) in view.records().into_iter().enumerate() {
        let mut line = Vec::with_capacity(record.len() + 1);
        line.push((index + 1).to_string());
        line.extend(record);
        writer.write_record(&line)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))
}

/// One-decimal formatting used for quantities, totals and shares.
pub fn format_decimal(value: f64) -> String {
    format!("{:.1}", value)
}

/// Unit prices are source values, written without rounding.
fn format_price(value: f64) -> String {
    value.to_string()
}
