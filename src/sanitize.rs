use std::sync::OnceLock;

use regex::Regex;

use crate::scan::{Quoting, find_matching};

fn reference_block_start() -> &'static Regex {
    static START: OnceLock<Regex> = OnceLock::new();
    START.get_or_init(|| {
        Regex::new(r"(?m)@layer\s+properties\b|@property\b|@supports\b|^[ \t]*:root\b")
            .expect("reference block regex should compile")
    })
}

/// Markers of an `@supports` prelude that only probes engine capabilities.
/// Other `@supports` blocks are real output and are kept.
const CAPABILITY_PROBES: [&str; 3] = ["-webkit-hyphens", "-moz-orient", "color-mix("];

/// Prepares an inline snapshot body for comparison: drops the outer string
/// quotes and every block describing reference-only environment setup
/// (property registrations, root variables, `@property`, capability-probing
/// `@supports`).
pub fn sanitize_snapshot(raw: &str) -> String {
    strip_reference_blocks(unquote_snapshot(raw))
        .trim()
        .to_string()
}

/// Resolves template-literal escapes (`\\`, `` \` ``, `\${`). Any other
/// backslash is kept as written.
pub fn unescape_template_literal(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(current) = chars.next() {
        if current == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, '\\' | '`' | '$') {
                    output.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        output.push(current);
    }
    output
}

pub fn unquote_snapshot(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
}

fn strip_reference_blocks(css: &str) -> String {
    let mut text = css.to_string();
    let mut search_from = 0usize;

    while let Some(found) = reference_block_start().find_at(&text, search_from) {
        let (found_start, prelude_end) = (found.start(), found.end());
        let is_supports = found.as_str() == "@supports";
        let Some(open) = text[prelude_end..].find('{').map(|offset| prelude_end + offset) else {
            break;
        };
        let prelude = &text[prelude_end..open];
        if prelude.contains([';', '}'])
            || (is_supports && !CAPABILITY_PROBES.iter().any(|probe| prelude.contains(probe)))
        {
            search_from = prelude_end;
            continue;
        }
        let Some(close) = find_matching(&text, open, b'{', b'}', Quoting::Literal) else {
            search_from = prelude_end;
            continue;
        };

        let trailing_whitespace = text[close + 1..]
            .bytes()
            .take_while(u8::is_ascii_whitespace)
            .count();
        let end = close + 1 + trailing_whitespace;
        tracing::trace!(prelude = text[found_start..open].trim(), "stripping reference block");
        text.replace_range(found_start..end, "");
        search_from = found_start;
    }

    text
}
