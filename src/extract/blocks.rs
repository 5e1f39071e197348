use std::sync::OnceLock;

use regex::Regex;

use crate::scan::net_brace_count;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBlock<'a> {
    pub name: String,
    /// 1-based line of the declaring `test(` line.
    pub start_line: usize,
    pub text: &'a str,
}

enum ScanState {
    Idle,
    InBlock {
        name: String,
        start_line: usize,
        start_offset: usize,
        depth: isize,
    },
}

fn test_declaration() -> &'static Regex {
    static DECLARATION: OnceLock<Regex> = OnceLock::new();
    DECLARATION.get_or_init(|| {
        Regex::new(
            r#"^\s*(?:test|it)(?:\.(?:only|skip|concurrent|todo))*\(\s*(?:'([^']*)'|"([^"]*)"|`([^`]*)`)\s*,.*\{"#,
        )
        .expect("test declaration regex should compile")
    })
}

fn declared_name(line: &str) -> Option<String> {
    let captures = test_declaration().captures(line)?;
    (1..=3)
        .find_map(|group| captures.get(group))
        .map(|name| name.as_str().to_string())
}

fn is_block_close(trimmed: &str) -> bool {
    trimmed.starts_with("})")
}

/// Splits fixture text into named test blocks by tracking brace depth line by
/// line. A block still open at end of input is dropped.
pub fn extract_blocks(source: &str) -> Vec<TestBlock<'_>> {
    let mut blocks = Vec::new();
    let mut state = ScanState::Idle;
    let mut offset = 0usize;

    for (line_index, raw_line) in source.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += raw_line.len();
        let line = raw_line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim();

        state = match state {
            ScanState::Idle => match declared_name(line) {
                Some(name) => {
                    let depth = net_brace_count(line);
                    if depth <= 0 && trimmed.trim_end_matches(';').ends_with("})") {
                        blocks.push(TestBlock {
                            name,
                            start_line: line_index + 1,
                            text: &source[line_start..offset],
                        });
                        ScanState::Idle
                    } else {
                        ScanState::InBlock {
                            name,
                            start_line: line_index + 1,
                            start_offset: line_start,
                            depth,
                        }
                    }
                }
                None => ScanState::Idle,
            },
            ScanState::InBlock {
                name,
                start_line,
                start_offset,
                depth,
            } => {
                let depth = depth + net_brace_count(line);
                if depth <= 0 && is_block_close(trimmed) {
                    blocks.push(TestBlock {
                        name,
                        start_line,
                        text: &source[start_offset..offset],
                    });
                    ScanState::Idle
                } else {
                    ScanState::InBlock {
                        name,
                        start_line,
                        start_offset,
                        depth,
                    }
                }
            }
        };
    }

    if let ScanState::InBlock {
        name, start_line, ..
    } = state
    {
        tracing::debug!(%name, start_line, "discarding unterminated test block");
    }

    blocks
}
