#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    /// Every delimiter byte counts, even inside string literals.
    Literal,
    /// Single, double and backtick quoted spans are skipped while counting.
    SkipStrings,
}

/// Returns the index of the delimiter closing the one at `open_index`.
///
/// Nested occurrences of the same pair are counted. Returns `None` when the
/// byte at `open_index` is not `open` or when the text ends before the depth
/// returns to zero. For identical delimiters use [`find_closing_quote`].
pub fn find_matching(
    text: &str,
    open_index: usize,
    open: u8,
    close: u8,
    quoting: Quoting,
) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open_index) != Some(&open) {
        return None;
    }
    if open == close {
        return find_closing_quote(text, open_index);
    }

    let mut depth = 0usize;
    let mut index = open_index;
    while index < bytes.len() {
        let byte = bytes[index];

        if quoting == Quoting::SkipStrings && is_quote_byte(byte) {
            index = find_closing_quote(text, index)? + 1;
            continue;
        }

        if byte == open {
            depth += 1;
        } else if byte == close {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
        index += 1;
    }

    None
}

/// Returns the index of the next unescaped occurrence of the quote byte found
/// at `open_index`. A backslash always escapes the byte after it.
pub fn find_closing_quote(text: &str, open_index: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let quote = *bytes.get(open_index)?;
    let mut index = open_index + 1;
    while index < bytes.len() {
        match bytes[index] {
            b'\\' => index += 2,
            byte if byte == quote => return Some(index),
            _ => index += 1,
        }
    }

    None
}

/// Extracts every single- or double-quoted literal from the inside of an
/// array literal, in order of appearance. Escapes are not processed.
pub fn parse_token_array(inner: &str) -> Vec<String> {
    let bytes = inner.as_bytes();
    let mut tokens = Vec::new();
    let mut index = 0usize;

    while index < bytes.len() {
        let quote = bytes[index];
        if quote != b'\'' && quote != b'"' {
            index += 1;
            continue;
        }

        let start = index + 1;
        let Some(length) = bytes[start..].iter().position(|byte| *byte == quote) else {
            break;
        };
        tokens.push(inner[start..start + length].to_string());
        index = start + length + 1;
    }

    tokens
}

pub fn net_brace_count(line: &str) -> isize {
    line.bytes().fold(0isize, |depth, byte| match byte {
        b'{' => depth + 1,
        b'}' => depth - 1,
        _ => depth,
    })
}

fn is_quote_byte(byte: u8) -> bool {
    matches!(byte, b'\'' | b'"' | b'`')
}
