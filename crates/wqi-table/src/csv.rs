//! Minimal comma-separated reader and writer: double-quoted fields with `""`
//! escapes, embedded newlines, CRLF or LF line endings.

use crate::error::TableError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// Parses a whole document. Blank lines are skipped; short rows are padded
/// with empty cells, rows longer than the header are rejected.
pub fn parse_csv(text: &str) -> Result<CsvTable, TableError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = parse_records(text)?.into_iter();

    let Some((_, headers)) = records.next() else {
        return Err(TableError::Empty);
    };
    let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for (line, mut record) in records {
        if record.len() > headers.len() {
            return Err(TableError::RaggedRow {
                line,
                expected: headers.len(),
                found: record.len(),
            });
        }
        record.resize(headers.len(), String::new());
        rows.push(record);
    }

    Ok(CsvTable { headers, rows })
}

fn parse_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, TableError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut dirty = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' => {
                in_quotes = true;
                dirty = true;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                dirty = true;
            }
            '\r' => {}
            '\n' => {
                if dirty || !field.is_empty() {
                    record.push(std::mem::take(&mut field));
                    records.push((record_line, std::mem::take(&mut record)));
                }
                dirty = false;
                line += 1;
                record_line = line;
            }
            _ => {
                field.push(ch);
                dirty = true;
            }
        }
    }

    if in_quotes {
        return Err(TableError::UnterminatedQuote { line: record_line });
    }
    if dirty || !field.is_empty() {
        record.push(field);
        records.push((record_line, record));
    }
    Ok(records)
}

/// Appends one record terminated by `\n`, quoting fields that need it.
pub fn write_csv_record<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let field = field.as_ref();
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}
