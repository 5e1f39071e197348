use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::compare::ComparisonResult;
use crate::corpus::FixtureFile;
use crate::css::collapse_whitespace;
use crate::extract::TestCase;

const OUTPUT_PREVIEW_CHARS: usize = 160;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    CssMismatch { comparison: ComparisonResult },
    UnexpectedOutput { actual_css: String },
    CompilerError { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Failed { reason: FailureReason },
    Skipped { reason: String },
}

impl CaseOutcome {
    pub fn glyph(&self) -> char {
        match self {
            Self::Passed => '.',
            Self::Failed { .. } => 'F',
            Self::Skipped { .. } => 's',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseFailure {
    pub file: PathBuf,
    pub group_name: String,
    pub ordinal: usize,
    pub line: usize,
    pub input_tokens: Vec<String>,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub path: PathBuf,
    pub fingerprint: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub files: Vec<FileSummary>,
    pub failures: Vec<CaseFailure>,
    pub skip_reasons: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unreadable_files: Vec<PathBuf>,
}

impl VerificationReport {
    /// An empty partial report for one fixture file.
    pub fn for_file(fixture: &FixtureFile) -> Self {
        Self {
            files: vec![FileSummary {
                path: fixture.path.clone(),
                fingerprint: fixture.fingerprint.clone(),
                ..FileSummary::default()
            }],
            ..Self::default()
        }
    }

    /// Folds one case outcome into the report. Counts for the current file
    /// accumulate on the last file summary.
    pub fn record(mut self, file: &Path, case: &TestCase, outcome: CaseOutcome) -> Self {
        self.total += 1;
        let summary = self.files.last_mut();
        match outcome {
            CaseOutcome::Passed => {
                self.passed += 1;
                if let Some(summary) = summary {
                    summary.passed += 1;
                    summary.total += 1;
                }
            }
            CaseOutcome::Skipped { reason } => {
                self.skipped += 1;
                if let Some(summary) = summary {
                    summary.skipped += 1;
                    summary.total += 1;
                }
                *self.skip_reasons.entry(reason).or_default() += 1;
            }
            CaseOutcome::Failed { reason } => {
                self.failed += 1;
                if let Some(summary) = summary {
                    summary.failed += 1;
                    summary.total += 1;
                }
                self.failures.push(CaseFailure {
                    file: file.to_path_buf(),
                    group_name: case.group_name.clone(),
                    ordinal: case.ordinal,
                    line: case.line,
                    input_tokens: case.input_tokens.clone(),
                    reason,
                });
            }
        }
        self
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.files.extend(other.files);
        self.failures.extend(other.failures);
        for (reason, count) in other.skip_reasons {
            *self.skip_reasons.entry(reason).or_default() += count;
        }
        self.unreadable_files.extend(other.unreadable_files);
        self
    }

    pub fn with_unreadable(mut self, path: &Path) -> Self {
        self.unreadable_files.push(path.to_path_buf());
        self
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Share of evaluated cases that passed; skipped cases are excluded.
    pub fn pass_rate(&self) -> Option<f64> {
        let evaluated = self.passed + self.failed;
        (evaluated > 0).then(|| self.passed as f64 * 100.0 / evaluated as f64)
    }

    pub fn render_text(&self, failure_limit: usize) -> String {
        let mut output = String::new();

        if !self.failures.is_empty() {
            output.push_str(&format!("\n{} failure(s):\n", self.failures.len()));
            for failure in self.failures.iter().take(failure_limit) {
                render_failure(&mut output, failure);
            }
            let remainder = self.failures.len().saturating_sub(failure_limit);
            if remainder > 0 {
                output.push_str(&format!("... and {remainder} more failure(s)\n"));
            }
        }

        for path in &self.unreadable_files {
            output.push_str(&format!("unreadable fixture: {}\n", path.display()));
        }

        output.push_str(&format!(
            "\ntotal: {}, passed: {}, failed: {}, skipped: {}\n",
            self.total, self.passed, self.failed, self.skipped
        ));
        for (reason, count) in &self.skip_reasons {
            output.push_str(&format!("skipped ({reason}): {count}\n"));
        }
        match self.pass_rate() {
            Some(rate) => output.push_str(&format!("pass rate: {rate:.1}%")),
            None => output.push_str("pass rate: n/a"),
        }

        output
    }
}

fn render_failure(output: &mut String, failure: &CaseFailure) {
    output.push_str(&format!(
        "FAIL {}:{} {} #{} [{}]\n",
        failure.file.display(),
        failure.line,
        failure.group_name,
        failure.ordinal,
        failure.input_tokens.join(", ")
    ));

    match &failure.reason {
        FailureReason::CssMismatch { comparison } => {
            for (selector, declarations) in &comparison.missing_selectors {
                output.push_str(&format!(
                    "  missing selector {selector} ({} declaration(s))\n",
                    declarations.len()
                ));
            }
            for (selector, property, difference) in comparison.failing_differences() {
                output.push_str(&format!(
                    "  {selector} {{ {property} }}: expected {:?}, got {:?}\n",
                    difference.expected, difference.actual
                ));
            }
        }
        FailureReason::UnexpectedOutput { actual_css } => {
            let preview = collapse_whitespace(actual_css)
                .chars()
                .take(OUTPUT_PREVIEW_CHARS)
                .collect::<String>();
            output.push_str(&format!("  expected empty output, got: {preview}\n"));
        }
        FailureReason::CompilerError { message } => {
            output.push_str(&format!("  compiler error: {message}\n"));
        }
    }
}
