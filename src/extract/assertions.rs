use std::sync::OnceLock;

use regex::{Match, Regex};

use super::blocks::TestBlock;
use super::{Expectation, ExtractOptions, TestCase};
use crate::sanitize::{sanitize_snapshot, unescape_template_literal, unquote_snapshot};
use crate::scan::{Quoting, find_closing_quote, find_matching, parse_token_array};

fn regex_cell(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("assertion regex should compile"))
}

fn assertion_anchor() -> &'static Regex {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    regex_cell(&ANCHOR, r"\bexpect\(")
}

fn token_array_call() -> &'static Regex {
    static CALL: OnceLock<Regex> = OnceLock::new();
    regex_cell(&CALL, r"\brun\(\s*\[")
}

fn themed_compile_call() -> &'static Regex {
    static CALL: OnceLock<Regex> = OnceLock::new();
    regex_cell(&CALL, r"\bcompileCss\(")
}

fn inline_snapshot_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    regex_cell(&MARKER, r"\.toMatchInlineSnapshot\(\s*`")
}

fn empty_result_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    regex_cell(
        &MARKER,
        r#"\.(?:toEqual|toBe|toStrictEqual)\(\s*(?:''|""|``)\s*\)"#,
    )
}

/// The call feeding an assertion. Positions are byte offsets into the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Invocation {
    /// `run([...])`; `array_open` points at the `[`.
    TokenArray { array_open: usize },
    /// `compileCss(...)`; `paren_open` points at the `(`.
    ThemedCompile { paren_open: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    /// `snapshot_open` points at the opening backtick.
    InlineSnapshot { snapshot_open: usize },
    EmptyResult { end: usize },
}

/// Picks the invocation closest to the anchor within `window` bytes. Equal
/// offsets resolve to the token-array form.
fn choose_invocation(block: &str, anchor: usize, window: usize) -> Option<Invocation> {
    let within_window = |found: &Match<'_>| found.start() - anchor <= window;
    let token_array = token_array_call()
        .find_at(block, anchor)
        .filter(within_window);
    let themed = themed_compile_call()
        .find_at(block, anchor)
        .filter(within_window);

    match (token_array, themed) {
        (Some(array), Some(compile)) if compile.start() < array.start() => {
            Some(Invocation::ThemedCompile {
                paren_open: compile.end() - 1,
            })
        }
        (Some(array), _) => Some(Invocation::TokenArray {
            array_open: array.end() - 1,
        }),
        (None, Some(compile)) => Some(Invocation::ThemedCompile {
            paren_open: compile.end() - 1,
        }),
        (None, None) => None,
    }
}

/// Looks for the expectation marker after an invocation. The window never
/// reaches into the next assertion.
fn find_marker(block: &str, from: usize, lookahead: usize) -> Option<Marker> {
    let mut window_end = (from + lookahead).min(block.len());
    if let Some(next_anchor) = assertion_anchor().find_at(block, from) {
        window_end = window_end.min(next_anchor.start());
    }
    while !block.is_char_boundary(window_end) {
        window_end -= 1;
    }
    let window = block.get(from..window_end)?;

    let snapshot = inline_snapshot_marker().find(window);
    let empty = empty_result_marker().find(window);

    match (snapshot, empty) {
        (Some(snapshot), Some(empty)) if empty.start() < snapshot.start() => {
            Some(Marker::EmptyResult {
                end: from + empty.end(),
            })
        }
        (Some(snapshot), _) => Some(Marker::InlineSnapshot {
            snapshot_open: from + snapshot.end() - 1,
        }),
        (None, Some(empty)) => Some(Marker::EmptyResult {
            end: from + empty.end(),
        }),
        (None, None) => None,
    }
}

/// Tokens of the last array argument of a themed compile call, if any.
fn themed_call_tokens(block: &str, paren_open: usize) -> Vec<String> {
    let Some(paren_close) = find_matching(block, paren_open, b'(', b')', Quoting::SkipStrings)
    else {
        return Vec::new();
    };
    let arguments = &block[paren_open + 1..paren_close];
    let tail = arguments.trim_end().trim_end_matches(',').trim_end();
    if !tail.ends_with(']') {
        return Vec::new();
    }
    let array_close = tail.len() - 1;

    arguments
        .match_indices('[')
        .map(|(index, _)| index)
        .find(|index| {
            find_matching(arguments, *index, b'[', b']', Quoting::SkipStrings)
                == Some(array_close)
        })
        .map(|array_open| parse_token_array(&arguments[array_open + 1..array_close]))
        .unwrap_or_default()
}

struct Extracted {
    expectation: Expectation,
    tokens: Vec<String>,
    resume_at: usize,
}

fn extract_at_anchor(
    block: &str,
    anchor_start: usize,
    options: &ExtractOptions,
) -> Option<Extracted> {
    match choose_invocation(block, anchor_start, options.proximity_window)? {
        Invocation::ThemedCompile { paren_open } => Some(Extracted {
            expectation: Expectation::Deferred,
            tokens: themed_call_tokens(block, paren_open),
            resume_at: paren_open + 1,
        }),
        Invocation::TokenArray { array_open } => {
            let array_close =
                find_matching(block, array_open, b'[', b']', Quoting::SkipStrings)?;
            let tokens = parse_token_array(&block[array_open + 1..array_close]);
            if tokens.is_empty() {
                tracing::trace!(anchor_start, "skipping assertion with empty token array");
                return None;
            }

            match find_marker(block, array_close + 1, options.lookahead_window)? {
                Marker::EmptyResult { end } => Some(Extracted {
                    expectation: Expectation::Empty,
                    tokens,
                    resume_at: end,
                }),
                Marker::InlineSnapshot { snapshot_open } => {
                    let snapshot_close = find_closing_quote(block, snapshot_open)?;
                    let body =
                        unescape_template_literal(&block[snapshot_open + 1..snapshot_close]);
                    let expectation = if unquote_snapshot(&body).trim().is_empty() {
                        Expectation::Empty
                    } else {
                        Expectation::Match {
                            expected_css: sanitize_snapshot(&body),
                        }
                    };
                    Some(Extracted {
                        expectation,
                        tokens,
                        resume_at: snapshot_close + 1,
                    })
                }
            }
        }
    }
}

/// Walks every `expect(` anchor in a block and pairs it with its invocation
/// and expectation. Anchors that cannot be paired confidently are skipped.
pub fn extract_assertions(block: &TestBlock<'_>, options: &ExtractOptions) -> Vec<TestCase> {
    let text = block.text;
    let mut cases = Vec::new();
    let mut cursor = 0usize;

    while let Some(anchor) = assertion_anchor().find_at(text, cursor) {
        let Some(extracted) = extract_at_anchor(text, anchor.start(), options) else {
            tracing::debug!(
                group = %block.name,
                offset = anchor.start(),
                "no test case extracted for assertion"
            );
            cursor = anchor.end();
            continue;
        };

        let line = block.start_line + text[..anchor.start()].matches('\n').count();
        cases.push(TestCase {
            group_name: block.name.clone(),
            ordinal: cases.len(),
            line,
            input_tokens: extracted.tokens,
            expectation: extracted.expectation,
        });
        cursor = extracted.resume_at.max(anchor.end());
    }

    cases
}
