//! Minimal CSV writer for spreadsheet downloads.

/// UTF-8 byte-order mark; lets spreadsheet tools detect the encoding.
pub const BOM: char = '\u{feff}';

/// Wraps a value in double quotes, doubling embedded quotes.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Renders a header line and quoted data rows, prefixed with [`BOM`].
pub fn render<I, R>(headers: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut out = String::new();
    out.push(BOM);
    out.push_str(&headers.join(","));

    for row in rows {
        out.push('\n');
        let line: Vec<String> = row.into_iter().map(|v| quote(&v)).collect();
        out.push_str(&line.join(","));
    }

    out
}
