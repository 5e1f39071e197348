use std::io;

use clap::Args;
use serde::Serialize;

use crate::cli::CorpusArgs;
use crate::compiler::{CommandCompiler, CompilerUnderTest};
use crate::config::{CompilerCommand, Overrides, Settings};
use crate::corpus::discover_fixtures;
use crate::css::DuplicateSelectorPolicy;
use crate::error::SnapverifyError;
use crate::report::VerificationReport;
use crate::runner::{ConsoleProgress, ProgressSink, RunOptions, SilentProgress, verify_corpus};

#[derive(Debug, Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,
    #[arg(
        long,
        value_name = "PROGRAM",
        help = "Compiler under test; receives a JSON token array on stdin and prints CSS"
    )]
    pub compiler: Option<String>,
    #[arg(
        long = "compiler-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        help = "Argument passed to the compiler program (repeatable)"
    )]
    pub compiler_args: Vec<String>,
    #[arg(
        long,
        value_name = "N",
        help = "Maximum number of detailed failures in text output (default 20)"
    )]
    pub failure_limit: Option<usize>,
    #[arg(
        long,
        value_enum,
        value_name = "POLICY",
        help = "How repeated selectors in one stylesheet combine (merge|last-wins)"
    )]
    pub duplicate_selectors: Option<DuplicateSelectorPolicy>,
    #[arg(long, help = "Emit the full report as JSON instead of progress text")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub compiler: String,
    pub success: bool,
    pub pass_rate: Option<f64>,
    #[serde(flatten)]
    pub report: VerificationReport,
}

pub enum VerifyCommandOutput {
    Text(String),
    Json(Box<VerifyResponse>),
}

pub struct VerifyRun {
    pub output: VerifyCommandOutput,
    pub success: bool,
}

pub fn run_verify(args: VerifyArgs) -> Result<VerifyRun, SnapverifyError> {
    let compiler = match args.compiler {
        Some(program) => Some(CompilerCommand {
            program,
            args: args.compiler_args,
        }),
        None if !args.compiler_args.is_empty() => {
            return Err(SnapverifyError::InvalidRequest {
                message: "--compiler-arg requires --compiler".to_string(),
            });
        }
        None => None,
    };

    let file = args.corpus.load_config()?;
    let settings = Settings::resolve(
        file,
        Overrides {
            failure_limit: args.failure_limit,
            duplicate_selectors: args.duplicate_selectors,
            compiler,
            ..args.corpus.overrides()
        },
    );
    let options = RunOptions::from_settings(&settings)?;
    let command = settings
        .compiler
        .clone()
        .ok_or(SnapverifyError::CompilerMissing)?;
    let compiler = CommandCompiler::new(command);

    let paths = discover_fixtures(&settings.fixture_dir, &settings.fixture_glob)?;

    let mut console;
    let mut silent = SilentProgress;
    let progress: &mut dyn ProgressSink = if args.json {
        &mut silent
    } else {
        console = ConsoleProgress::new(io::stdout());
        &mut console
    };

    let report = verify_corpus(&paths, &compiler, &options, progress);
    let success = report.is_success();

    let output = if args.json {
        VerifyCommandOutput::Json(Box::new(VerifyResponse {
            compiler: compiler.name().to_string(),
            success,
            pass_rate: report.pass_rate(),
            report,
        }))
    } else {
        VerifyCommandOutput::Text(report.render_text(settings.failure_limit))
    };

    Ok(VerifyRun { output, success })
}
