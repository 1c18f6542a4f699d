use crate::store::{Explanation, ExplanationDetail};

pub fn explanation_line(row: &Explanation) -> String {
    format!("{} — {}", row.term, row.explanation)
}

pub fn detail_line(row: &ExplanationDetail) -> String {
    format!(
        "{}: {} — {} (by {})",
        row.id, row.term, row.explanation, row.author
    )
}

pub fn not_found_line(term: &str) -> String {
    format!("{} not found.", quote_term(term))
}

/// Quote a term for display: single quotes unless the term contains a single
/// quote and no double quote. Unprintable characters are shown as `\xNN`,
/// `\uNNNN` or `\UNNNNNNNN` escapes.
pub fn quote_term(term: &str) -> String {
    let quote = if term.contains('\'') && !term.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(term.len() + 2);
    out.push(quote);
    for c in term.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => out.push_str(&escape_unprintable(c)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    // Format characters that render as nothing.
    let invisible = matches!(
        c,
        '\u{ad}'
            | '\u{200b}'..='\u{200f}'
            | '\u{2060}'..='\u{2064}'
            | '\u{feff}'
            | '\u{e0000}'..='\u{e007f}'
    );
    !(c.is_control() || c.is_whitespace() || invisible)
}

fn escape_unprintable(c: char) -> String {
    match c as u32 {
        n if n < 0x100 => format!("\\x{:02x}", n),
        n if n < 0x10000 => format!("\\u{:04x}", n),
        n => format!("\\U{:08x}", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_term() {
        assert_eq!(quote_term("XYZ"), "'XYZ'");
        assert_eq!(quote_term("don't"), "\"don't\"");
        assert_eq!(quote_term("it's \"x\""), "'it\\'s \"x\"'");
        assert_eq!(quote_term("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_quote_term_escapes_unprintable() {
        assert_eq!(quote_term("a\x01"), "'a\\x01'");
        assert_eq!(quote_term("cr\r"), "'cr\\r'");
        assert_eq!(quote_term("nb\u{a0}sp"), "'nb\\xa0sp'");
        assert_eq!(quote_term("zw\u{200b}"), "'zw\\u200b'");
        assert_eq!(quote_term("\u{e0001}"), "'\\U000e0001'");
        assert_eq!(quote_term("café ünï"), "'café ünï'");
    }

    #[test]
    fn test_detail_line() {
        let row = ExplanationDetail {
            id: 3,
            term: "BRB".to_string(),
            explanation: "be right back".to_string(),
            author: "alice".to_string(),
        };
        assert_eq!(detail_line(&row), "3: BRB — be right back (by alice)");
    }
}
