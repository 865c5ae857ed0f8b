//! Small formatting helpers shared by the fetch boundary.

/// Round a numeric string for display.
///
/// Returns `""` when the input does not parse as a number (callers treat an
/// empty result as "no usable value"). Integral values render without a
/// fractional part; others round to two decimals with trailing zeros
/// trimmed.
pub fn round_value(text: &str) -> String {
    let value: f64 = match text.trim().parse() {
        Ok(v) => v,
        Err(_) => return String::new(),
    };
    if value.fract() == 0.0 {
        return format!("{}", value as i64);
    }
    let rounded = format!("{value:.2}");
    rounded.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Parse one CSV line into cells, honoring double-quoted cells with embedded
/// commas and `""` escapes. The statistics API emits simple CSV; a full
/// parser dependency is not warranted for this shape.
pub fn parse_csv_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut cell));
            }
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}
