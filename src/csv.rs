//! Delimited text reading and writing.
//!
//! Fields containing the delimiter, a quote or a line break are quoted, with
//! embedded quotes doubled. The reader accepts both LF and CRLF line endings
//! and quoted fields spanning several lines.

use std::io::{self, Write};
use std::mem::take;

/// Field separator of the exported table.
pub const DELIMITER: char = ',';

/// Splits delimited text into rows of fields. Blank lines are skipped.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            c if c == sep && !in_quotes => row.push(take(&mut field)),
            '\r' | '\n' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() == 1 && row[0].is_empty() {
                    row.clear();
                } else {
                    rows.push(take(&mut row));
                }
            }
            c => field.push(c),
        }
    }

    // last line without a trailing newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains(['"', '\n', '\r'])
}

/// Writes one row followed by a newline.
pub fn write_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S], sep: char) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{}", sep)?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell, sep) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    writeln!(w)
}

/// Renders a header row plus data rows into a string.
pub fn to_string<S: AsRef<str>>(header: &[S], rows: &[Vec<String>], sep: char) -> String {
    let mut buf: Vec<u8> = Vec::new();
    // writes into a Vec<u8> cannot fail
    let _ = write_row(&mut buf, header, sep);
    for row in rows {
        let _ = write_row(&mut buf, row, sep);
    }
    String::from_utf8(buf).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_rows() {
        let rows = parse_rows("a,b,c\n1,2,3\n", ',');
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_quoted_fields_with_delimiter_and_quotes() {
        let rows = parse_rows("\"a,b\",\"say \"\"hi\"\"\",c\r\n", ',');
        assert_eq!(rows, vec![vec!["a,b", "say \"hi\"", "c"]]);
    }

    #[test]
    fn test_multiline_quoted_field() {
        let rows = parse_rows("x,\"line1\nline2\"\ny,z", ',');
        assert_eq!(rows, vec![vec!["x", "line1\nline2"], vec!["y", "z"]]);
    }

    #[test]
    fn test_empty_fields_and_blank_lines() {
        let rows = parse_rows("tags,Title\n\n,Untagged\n", ',');
        assert_eq!(rows, vec![vec!["tags", "Title"], vec!["", "Untagged"]]);
    }

    #[test]
    fn test_bom_is_ignored() {
        let rows = parse_rows("\u{FEFF}tags,Title\n", ',');
        assert_eq!(rows[0][0], "tags");
    }

    #[test]
    fn test_write_quotes_only_when_needed() {
        let mut buf = Vec::new();
        write_row(&mut buf, &["plain", "a,b", "he said \"x\""], ',').unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "plain,\"a,b\",\"he said \"\"x\"\"\"\n"
        );
    }

    #[test]
    fn test_written_text_parses_back() {
        let rows = vec![
            vec!["rust web".to_string(), "Axum, a framework".to_string()],
            vec!["".to_string(), "Quote \"this\"".to_string()],
        ];
        let text = to_string(&["tags", "Title"], &rows, ',');
        let parsed = parse_rows(&text, ',');
        assert_eq!(parsed[0], vec!["tags", "Title"]);
        assert_eq!(&parsed[1..], &rows[..]);
    }
}
