//! Field-level splitting and quoting for one record line.

/// Field separator.
pub const SEPARATOR: char = ',';

const QUOTE: char = '"';

/// Wrap a text field in quotes, doubling embedded quotes.
///
/// Line breaks are replaced with spaces so that a record never spans lines.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(QUOTE);
    for c in s.chars() {
        match c {
            '\r' | '\n' => out.push(' '),
            QUOTE => {
                out.push(QUOTE);
                out.push(QUOTE);
            }
            _ => out.push(c),
        }
    }
    out.push(QUOTE);
    out
}

/// Split a line into raw field values, honouring quoting.
///
/// A field that starts with a quote runs until the matching closing quote and
/// may contain separators and doubled quotes. Anything after the closing
/// quote, up to the next separator, is appended as-is. An unterminated quote
/// swallows the rest of the line.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    chars.next();
                    field.push(QUOTE);
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            SEPARATOR => fields.push(std::mem::take(&mut field)),
            QUOTE if field.is_empty() => in_quotes = true,
            _ => field.push(c),
        }
    }

    fields.push(field);
    fields
}
