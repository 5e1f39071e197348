use std::io::Write;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::compare::compare_models;
use crate::compiler::CompilerUnderTest;
use crate::config::Settings;
use crate::corpus::FixtureFile;
use crate::css::{CssModel, DuplicateSelectorPolicy};
use crate::error::SnapverifyError;
use crate::extract::{Expectation, ExtractOptions, TestCase, extract_cases};
use crate::report::{CaseOutcome, FailureReason, FileSummary, VerificationReport};

pub const DEFERRED_SKIP_REASON: &str = "auxiliary configuration required";
pub const NO_COMPARABLE_RULES_SKIP_REASON: &str = "expected snapshot has no comparable rules";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub extract: ExtractOptions,
    pub duplicate_selectors: DuplicateSelectorPolicy,
    /// Only groups whose name matches are extracted and verified.
    pub group_filter: Option<Pattern>,
}

impl RunOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self, SnapverifyError> {
        Ok(Self {
            extract: settings.extract,
            duplicate_selectors: settings.duplicate_selectors,
            group_filter: settings.group_pattern()?,
        })
    }
}

/// Receives per-case and per-file progress while a corpus is verified.
pub trait ProgressSink {
    fn file_started(&mut self, _path: &Path) {}
    fn case_finished(&mut self, _outcome: &CaseOutcome) {}
    fn file_finished(&mut self, _summary: &FileSummary) {}
}

#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {}

/// Prints one glyph per case and a count line per file.
#[derive(Debug)]
pub struct ConsoleProgress<W: Write> {
    writer: W,
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

// Progress output is best effort; a closed stream must not abort verification.
impl<W: Write> ProgressSink for ConsoleProgress<W> {
    fn file_started(&mut self, path: &Path) {
        let _ = write!(self.writer, "{} ", path.display());
        let _ = self.writer.flush();
    }

    fn case_finished(&mut self, outcome: &CaseOutcome) {
        let _ = write!(self.writer, "{}", outcome.glyph());
        let _ = self.writer.flush();
    }

    fn file_finished(&mut self, summary: &FileSummary) {
        let _ = writeln!(
            self.writer,
            " {} passed, {} failed, {} skipped",
            summary.passed, summary.failed, summary.skipped
        );
    }
}

pub fn verify_case(
    case: &TestCase,
    compiler: &dyn CompilerUnderTest,
    policy: DuplicateSelectorPolicy,
) -> CaseOutcome {
    let expected = match &case.expectation {
        Expectation::Deferred => {
            return CaseOutcome::Skipped {
                reason: DEFERRED_SKIP_REASON.to_string(),
            };
        }
        Expectation::Empty => None,
        Expectation::Match { expected_css } => {
            let model = CssModel::parse(expected_css, policy);
            // Only nested or at-rule output remains; nothing could ever be missing.
            if model.rules.is_empty() {
                tracing::debug!(
                    group = %case.group_name,
                    ordinal = case.ordinal,
                    unparsed = model.unparsed.len(),
                    "expected snapshot has no flat rules"
                );
                return CaseOutcome::Skipped {
                    reason: NO_COMPARABLE_RULES_SKIP_REASON.to_string(),
                };
            }
            Some(model)
        }
    };

    let actual_css = match compiler.compile(&case.input_tokens) {
        Ok(css) => css,
        Err(error) => {
            tracing::debug!(
                group = %case.group_name,
                ordinal = case.ordinal,
                %error,
                "compiler rejected case"
            );
            return CaseOutcome::Failed {
                reason: FailureReason::CompilerError {
                    message: error.to_string(),
                },
            };
        }
    };

    let Some(expected) = expected else {
        return if actual_css.trim().is_empty() {
            CaseOutcome::Passed
        } else {
            CaseOutcome::Failed {
                reason: FailureReason::UnexpectedOutput { actual_css },
            }
        };
    };

    let comparison = compare_models(&expected, &CssModel::parse(&actual_css, policy));
    if comparison.passed {
        CaseOutcome::Passed
    } else {
        CaseOutcome::Failed {
            reason: FailureReason::CssMismatch { comparison },
        }
    }
}

/// Extracts the cases of one fixture, honoring the group filter.
pub fn select_cases(fixture: &FixtureFile, options: &RunOptions) -> Vec<TestCase> {
    let cases = extract_cases(&fixture.raw_text, &options.extract);
    match &options.group_filter {
        None => cases,
        Some(pattern) => cases
            .into_iter()
            .filter(|case| pattern.matches(&case.group_name))
            .collect(),
    }
}

pub fn verify_fixture(
    fixture: &FixtureFile,
    compiler: &dyn CompilerUnderTest,
    options: &RunOptions,
    progress: &mut dyn ProgressSink,
) -> VerificationReport {
    progress.file_started(&fixture.path);
    let cases = select_cases(fixture, options);
    tracing::debug!(path = %fixture.path.display(), cases = cases.len(), "verifying fixture");

    let report = cases
        .iter()
        .fold(VerificationReport::for_file(fixture), |report, case| {
            let outcome = verify_case(case, compiler, options.duplicate_selectors);
            progress.case_finished(&outcome);
            report.record(&fixture.path, case, outcome)
        });

    if let Some(summary) = report.files.last() {
        progress.file_finished(summary);
    }
    report
}

/// Verifies every fixture in order. Unreadable files are recorded on the
/// report and do not stop the run.
pub fn verify_corpus(
    paths: &[PathBuf],
    compiler: &dyn CompilerUnderTest,
    options: &RunOptions,
    progress: &mut dyn ProgressSink,
) -> VerificationReport {
    tracing::info!(files = paths.len(), compiler = compiler.name(), "verifying corpus");

    let report = paths
        .iter()
        .fold(VerificationReport::default(), |report, path| {
            match FixtureFile::read(path) {
                Ok(fixture) => report.merge(verify_fixture(&fixture, compiler, options, progress)),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable fixture");
                    report.with_unreadable(path)
                }
            }
        });

    tracing::info!(
        total = report.total,
        passed = report.passed,
        failed = report.failed,
        skipped = report.skipped,
        "verification finished"
    );
    report
}
