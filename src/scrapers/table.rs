//! Shared HTML table helpers
//!
//! Source pages move columns around between redesigns, so fields are located
//! by header-name synonyms rather than fixed positions. Cell parsing strips
//! currency symbols, thousands separators and K/M/B magnitude suffixes;
//! placeholder cells ("-", "N/A", empty) read as absent, never as zero.

use scraper::{ElementRef, Selector};

/// Parse a selector known to be valid at compile time.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Collapsed text content of an element.
pub fn cell_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased header texts of a table (`thead th`, falling back to any `th`).
pub fn header_texts(table: &ElementRef<'_>) -> Vec<String> {
    let head_sel = selector("thead th");
    let mut headers: Vec<String> = table
        .select(&head_sel)
        .map(|th| cell_text(&th).to_lowercase())
        .collect();
    if headers.is_empty() {
        let any_th = selector("th");
        headers = table.select(&any_th).map(|th| cell_text(&th).to_lowercase()).collect();
    }
    headers
}

/// Texts of a row's `td` cells.
pub fn row_texts(row: &ElementRef<'_>) -> Vec<String> {
    let td_sel = selector("td");
    row.select(&td_sel).map(|td| cell_text(&td)).collect()
}

/// Index of the first header containing any of the synonyms
/// (case-insensitive substring match). `None` means the field is absent for
/// every row of this table.
pub fn column_index(headers: &[String], synonyms: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.to_lowercase();
        synonyms.iter().any(|syn| header.contains(&syn.to_lowercase()))
    })
}

/// Cell text at an optional column index, if the cell is present.
pub fn get_cell<'a>(cells: &'a [String], idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| cells.get(i)).map(String::as_str)
}

fn is_placeholder(text: &str) -> bool {
    matches!(text, "" | "-" | "--" | "N/A" | "n/a" | "NA")
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if is_placeholder(trimmed) {
        return None;
    }

    let mut stripped = trimmed.replace('%', "");
    let mut scale = 1.0;
    match stripped.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('K') => {
            scale = 1e3;
            stripped.pop();
        }
        Some('M') => {
            scale = 1e6;
            stripped.pop();
        }
        Some('B') => {
            scale = 1e9;
            stripped.pop();
        }
        _ => {}
    }

    // Drop currency symbols, thousands separators and any other noise.
    let cleaned: String = stripped
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().map(|v| v * scale)
}

/// Parse a float out of a price/percent cell.
pub fn parse_float(text: &str) -> Option<f64> {
    parse_number(text)
}

/// Parse an integer out of a volume-style cell.
pub fn parse_int(text: &str) -> Option<i64> {
    parse_number(text).map(|v| v.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_parse_float_strips_noise() {
        assert_eq!(parse_float("1,234.56"), Some(1234.56));
        assert_eq!(parse_float("R 45.00"), Some(45.0));
        assert_eq!(parse_float("₦ 12.30"), Some(12.3));
        assert_eq!(parse_float("-2.41%"), Some(-2.41));
        assert_eq!(parse_float("-"), None);
        assert_eq!(parse_float("N/A"), None);
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("R"), None);
    }

    #[test]
    fn test_parse_int_magnitude_suffixes() {
        assert_eq!(parse_int("2.5K"), Some(2500));
        assert_eq!(parse_int("1.2M"), Some(1_200_000));
        assert_eq!(parse_int("3B"), Some(3_000_000_000));
        assert_eq!(parse_int("12,500"), Some(12_500));
        assert_eq!(parse_int("-"), None);
    }

    #[test]
    fn test_column_index_synonyms() {
        let headers: Vec<String> =
            ["Security Code", "Company Name", "Close Price", "Chg %"]
                .iter()
                .map(|h| h.to_lowercase())
                .collect();
        assert_eq!(column_index(&headers, &["code", "ticker"]), Some(0));
        assert_eq!(column_index(&headers, &["close", "price"]), Some(2));
        assert_eq!(column_index(&headers, &["change", "%"]), Some(3));
        assert_eq!(column_index(&headers, &["volume"]), None);
    }

    #[test]
    fn test_header_texts_falls_back_without_thead() {
        let html = Html::parse_document(
            "<table><tr><th>Symbol</th><th>Price</th></tr><tr><td>ABC</td><td>1</td></tr></table>",
        );
        let table_sel = selector("table");
        let table = html.select(&table_sel).next().unwrap();
        assert_eq!(header_texts(&table), vec!["symbol", "price"]);
    }

    #[test]
    fn test_cell_text_collapses_whitespace() {
        let html = Html::parse_document("<table><tr><td>  ABC \n Ltd </td></tr></table>");
        let td_sel = selector("td");
        let td = html.select(&td_sel).next().unwrap();
        assert_eq!(cell_text(&td), "ABC Ltd");
    }
}
