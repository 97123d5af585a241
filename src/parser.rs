//! Delimited-text parsing for sheet exports.
//!
//! The whole payload is tokenised in one pass, so a quoted field may span several
//! physical lines. The first non-blank line is the header row; every later line becomes
//! a [`Record`] keyed positionally by those headers.

/// One data row: ordered `(column, value)` pairs in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    columns: Vec<(String, String)>,
}

impl Record {
    pub fn new(columns: Vec<(String, String)>) -> Self {
        Record { columns }
    }

    /// Value of the first column whose header equals `column` exactly.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate `(column, value)` pairs in header order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Values in header order.
    #[cfg(test)]
    pub fn values(&self) -> Vec<&str> {
        self.columns.iter().map(|(_, v)| v.as_str()).collect()
    }
}

/// A tokenised physical record before headers are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawLine {
    fields: Vec<String>,
    quoted: bool,
}

impl RawLine {
    /// A line holding nothing but whitespace.
    fn is_blank(&self) -> bool {
        !self.quoted && self.fields.len() == 1 && self.fields[0].is_empty()
    }
}

/// Parse CSV text into records keyed by the header row.
///
/// Blank lines are skipped, rows whose every value is empty are dropped and short rows
/// are padded with empty strings. Columns beyond the header width are ignored.
pub fn parse(text: &str) -> Vec<Record> {
    let mut lines = tokenize(text).into_iter().filter(|line| !line.is_blank());

    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let headers = header.fields;

    lines
        .filter_map(|line| {
            let mut values = line.fields.into_iter();
            let columns: Vec<(String, String)> = headers
                .iter()
                .map(|h| (h.clone(), values.next().unwrap_or_default()))
                .collect();
            if columns.iter().all(|(_, v)| v.is_empty()) {
                None
            } else {
                Some(Record::new(columns))
            }
        })
        .collect()
}

fn tokenize(text: &str) -> Vec<RawLine> {
    let mut lines = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Escaped quote
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                    quoted = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
                lines.push(RawLine {
                    fields: std::mem::take(&mut fields),
                    quoted,
                });
                quoted = false;
            }
            _ => current.push(ch),
        }
    }

    // Last line without a trailing newline
    if !current.is_empty() || !fields.is_empty() || quoted {
        fields.push(current.trim().to_string());
        lines.push(RawLine { fields, quoted });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_header_keys_rows_positionally() {
        let rows = parse("Platform,Task,Dev\nWebsite,Fix bug,Alice\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Platform"), Some("Website"));
        assert_eq!(rows[0].get("Task"), Some("Fix bug"));
        assert_eq!(rows[0].get("Dev"), Some("Alice"));
    }

    #[test]
    fn test_quoted_delimiters_and_escaped_quotes() {
        let rows = parse("Task,Impact\n\"Ship, then test\",\"Say \"\"hi\"\"\"\n");
        assert_eq!(rows[0].values(), vec!["Ship, then test", "Say \"hi\""]);
    }

    #[test]
    fn test_blank_lines_and_empty_rows_are_dropped() {
        let text = "\n  \nA,B\n\n1,2\n , \n   \n3,4";
        let rows = parse(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values(), vec!["1", "2"]);
        assert_eq!(rows[1].values(), vec!["3", "4"]);
    }

    #[test]
    fn test_short_rows_are_padded_and_long_rows_truncated() {
        let rows = parse("A,B,C\nx\n1,2,3,4\n");
        assert_eq!(rows[0].values(), vec!["x", "", ""]);
        assert_eq!(rows[1].values(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let rows = parse(" A , B \r\n  one  ,\" two \"\r\n");
        assert_eq!(rows[0].get("A"), Some("one"));
        assert_eq!(rows[0].get("B"), Some("two"));
    }

    #[test]
    fn test_quoted_field_may_contain_newline() {
        let rows = parse("Task,Blocker\nDeploy,\"waiting on ops\nand legal\"\nNext,\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Blocker"), Some("waiting on ops\nand legal"));
        assert_eq!(rows[1].get("Task"), Some("Next"));
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("   \n\n").is_empty());
        assert!(parse("Only,Header\n").is_empty());
    }

    /// Cell text with separators, quotes and line breaks but no edge whitespace, which
    /// the parser trims.
    fn value_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ,\"\n]{0,12}".prop_map(|s| s.trim().to_string())
    }

    fn render_row(values: &[String]) -> String {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(Vec::new());
        writer.write_record(values).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_standard_quoting_examples() {
        let values: Vec<String> = ["a,b", "say \"hi\"", "x\ny", "\""].iter().map(|s| s.to_string()).collect();
        let text = format!("{}{}", render_row(&["A", "B", "C", "D"].map(String::from)), render_row(&values));
        let rows = parse(&text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values(), vec!["a,b", "say \"hi\"", "x\ny", "\""]);
    }

    proptest! {
        #[test]
        fn prop_standard_quoting_round_trips(values in prop::collection::vec(value_strategy(), 1..6)) {
            prop_assume!(values.iter().any(|v| !v.is_empty()));
            let headers: Vec<String> = (0..values.len()).map(|i| format!("c{i}")).collect();
            let text = format!("{}{}", render_row(&headers), render_row(&values));

            let rows = parse(&text);
            prop_assert_eq!(rows.len(), 1);
            let parsed: Vec<String> = rows[0].values().into_iter().map(String::from).collect();
            prop_assert_eq!(parsed, values);
        }
    }
}
