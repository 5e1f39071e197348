use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::CorpusArgs;
use crate::config::Settings;
use crate::corpus::{FixtureFile, discover_fixtures};
use crate::error::SnapverifyError;
use crate::extract::{Expectation, TestCase};
use crate::runner::{RunOptions, select_cases};

#[derive(Debug, Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,
    #[arg(long, help = "Emit structured JSON output")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub files: Vec<ExtractedFile>,
    pub summary: ExtractSummary,
}

#[derive(Debug, Serialize)]
pub struct ExtractedFile {
    pub path: PathBuf,
    pub fingerprint: String,
    pub cases: Vec<TestCase>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExtractSummary {
    pub files_scanned: usize,
    pub cases: usize,
    pub matches: usize,
    pub empty: usize,
    pub deferred: usize,
}

impl ExtractSummary {
    fn count(mut self, case: &TestCase) -> Self {
        self.cases += 1;
        match case.expectation {
            Expectation::Match { .. } => self.matches += 1,
            Expectation::Empty => self.empty += 1,
            Expectation::Deferred => self.deferred += 1,
        }
        self
    }
}

pub enum ExtractCommandOutput {
    Text(String),
    Json(ExtractResponse),
}

pub fn run_extract(args: ExtractArgs) -> Result<ExtractCommandOutput, SnapverifyError> {
    let settings = Settings::resolve(args.corpus.load_config()?, args.corpus.overrides());
    let options = RunOptions::from_settings(&settings)?;
    let paths = discover_fixtures(&settings.fixture_dir, &settings.fixture_glob)?;

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let fixture = FixtureFile::read(path)?;
        let cases = select_cases(&fixture, &options);
        files.push(ExtractedFile {
            path: fixture.path,
            fingerprint: fixture.fingerprint,
            cases,
        });
    }

    let summary = files.iter().flat_map(|file| &file.cases).fold(
        ExtractSummary {
            files_scanned: files.len(),
            ..ExtractSummary::default()
        },
        ExtractSummary::count,
    );
    let response = ExtractResponse { files, summary };

    if args.json {
        return Ok(ExtractCommandOutput::Json(response));
    }
    Ok(ExtractCommandOutput::Text(render_text(&response)))
}

fn render_text(response: &ExtractResponse) -> String {
    let mut output = String::new();
    for file in &response.files {
        for case in &file.cases {
            output.push_str(&format!(
                "{}:{} {} #{} {} [{}]\n",
                file.path.display(),
                case.line,
                case.group_name,
                case.ordinal,
                case.expectation.label(),
                case.input_tokens.join(", ")
            ));
        }
    }

    let summary = &response.summary;
    output.push_str(&format!(
        "{} case(s) in {} file(s): {} match, {} empty, {} deferred",
        summary.cases, summary.files_scanned, summary.matches, summary.empty, summary.deferred
    ));
    output
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ExtractResponse, ExtractSummary, ExtractedFile, render_text};
    use crate::extract::{Expectation, TestCase};

    #[test]
    fn text_listing_names_location_and_expectation() {
        let cases = vec![
            TestCase {
                group_name: "flex".to_string(),
                ordinal: 0,
                line: 4,
                input_tokens: vec!["flex".to_string(), "flex-1".to_string()],
                expectation: Expectation::Match {
                    expected_css: ".flex { display: flex; }".to_string(),
                },
            },
            TestCase {
                group_name: "flex".to_string(),
                ordinal: 1,
                line: 9,
                input_tokens: vec!["-flex".to_string()],
                expectation: Expectation::Empty,
            },
        ];
        let summary = cases.iter().fold(
            ExtractSummary {
                files_scanned: 1,
                ..ExtractSummary::default()
            },
            ExtractSummary::count,
        );
        let text = render_text(&ExtractResponse {
            files: vec![ExtractedFile {
                path: PathBuf::from("flex.test.ts"),
                fingerprint: "0123456789abcdef".to_string(),
                cases,
            }],
            summary,
        });

        assert_eq!(
            text,
            "flex.test.ts:4 flex #0 match [flex, flex-1]\n\
             flex.test.ts:9 flex #1 empty [-flex]\n\
             2 case(s) in 1 file(s): 1 match, 1 empty, 0 deferred"
        );
    }
}
