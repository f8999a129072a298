//! Single-row comma-delimited export

use std::io::Write;

use anyhow::Result;

/// Format `values` as one comma-delimited line (with trailing newline)
///
/// Floats use Rust's shortest round-trip representation, so parsing the row
/// back yields the exact same values.
pub fn format_row(values: &[f64]) -> String {
    let mut row = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
    row.push('\n');
    row
}

/// Write one row to `writer`
pub fn write_row<W: Write>(writer: &mut W, values: &[f64]) -> Result<()> {
    writer.write_all(format_row(values).as_bytes())?;
    Ok(())
}

/// Parse a row written by [`format_row`]
pub fn parse_row(row: &str) -> Result<Vec<f64>> {
    let row = row.trim_end();
    if row.is_empty() {
        return Ok(Vec::new());
    }
    row.split(',')
        .map(|field| {
            field
                .trim()
                .parse::<f64>()
                .map_err(|e| anyhow::anyhow!("invalid value '{}': {}", field, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_is_comma_delimited() {
        assert_eq!(format_row(&[1.0, -0.5, 0.1]), "1,-0.5,0.1\n");
        assert_eq!(format_row(&[]), "\n");
    }

    #[test]
    fn test_parse_recovers_exact_values() {
        let values = vec![-1.0 / 3.0, 1e-12, 100.0, 0.1 + 0.2];
        assert_eq!(parse_row(&format_row(&values)).unwrap(), values);
    }

    #[test]
    fn test_write_row_to_buffer() {
        let mut buffer = Vec::new();
        write_row(&mut buffer, &[2.0, 3.5]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "2,3.5\n");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_row("1.0,abc").is_err());
    }
}
