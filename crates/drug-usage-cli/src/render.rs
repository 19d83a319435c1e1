//! Plain-text table rendering.

use drug_usage_core::export::ExportView;
use unicode_width::UnicodeWidthStr;

/// Render a view as an aligned text table with a leading `#` sequence column.
pub fn render_table(view: &dyn ExportView) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();

    let mut header = vec!["#".to_string()];
    header.extend(view.headers().into_iter().map(str::to_string));
    rows.push(header);

    for (index, record) in view.records().into_iter().enumerate() {
        let mut line = vec![(index + 1).to_string()];
        line.extend(record);
        rows.push(line);
    }

    let columns = rows[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            rows.iter()
                .map(|r| r.get(col).map(|c| display_width(c)).unwrap_or(0))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(display_width(cell));
                format!("{}{}", cell, " ".repeat(pad))
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

/// Terminal column width: East Asian wide and fullwidth characters take two cells.
fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}
