use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use crate::config::CompilerCommand;
use crate::error::SnapverifyError;

/// The compiler being verified: tokens in, CSS out.
pub trait CompilerUnderTest {
    fn compile(&self, tokens: &[String]) -> Result<String, SnapverifyError>;
    fn name(&self) -> &str;
}

impl<F> CompilerUnderTest for F
where
    F: Fn(&[String]) -> Result<String, SnapverifyError>,
{
    fn compile(&self, tokens: &[String]) -> Result<String, SnapverifyError> {
        self(tokens)
    }

    fn name(&self) -> &str {
        "in-process"
    }
}

/// Runs an external program once per case. The tokens are written to stdin as
/// a JSON array of strings and the CSS is read back from stdout.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    command: CompilerCommand,
}

impl CommandCompiler {
    pub fn new(command: CompilerCommand) -> Self {
        Self { command }
    }

    fn failed(&self, message: String) -> SnapverifyError {
        SnapverifyError::CompilerFailed {
            program: self.command.program.clone(),
            message,
        }
    }
}

impl CompilerUnderTest for CommandCompiler {
    fn compile(&self, tokens: &[String]) -> Result<String, SnapverifyError> {
        let payload = serde_json::to_string(tokens)
            .map_err(|source| SnapverifyError::ResponseSerialization { source })?;

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SnapverifyError::CompilerSpawn {
                program: self.command.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(payload.as_bytes()) {
                Ok(()) => {}
                // The program may exit without reading its input.
                Err(error) if error.kind() == ErrorKind::BrokenPipe => {}
                Err(error) => return Err(self.failed(format!("failed to write tokens: {error}"))),
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|error| self.failed(format!("failed to collect output: {error}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            return Err(self.failed(if detail.is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {detail}", output.status)
            }));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| self.failed("stdout is not valid UTF-8".to_string()))
    }

    fn name(&self) -> &str {
        &self.command.program
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandCompiler, CompilerUnderTest};
    use crate::config::CompilerCommand;
    use crate::error::SnapverifyError;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn closure_compiler_receives_tokens_in_order() {
        let compiler = |tokens: &[String]| -> Result<String, SnapverifyError> { Ok(tokens.join(",")) };

        assert_eq!(
            compiler
                .compile(&tokens(&["b", "a"]))
                .expect("closure compile should succeed"),
            "b,a"
        );
        assert_eq!(compiler.name(), "in-process");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let compiler = CommandCompiler::new(CompilerCommand {
            program: "snapverify-definitely-not-installed".to_string(),
            args: Vec::new(),
        });

        let error = compiler
            .compile(&tokens(&["flex"]))
            .expect_err("spawn should fail");
        assert!(matches!(error, SnapverifyError::CompilerSpawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn command_compiler_pipes_json_tokens_through_stdin() {
        let compiler = CommandCompiler::new(CompilerCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "cat".to_string()],
        });

        let output = compiler
            .compile(&tokens(&["-box-border", "p-4"]))
            .expect("cat should echo stdin");
        assert_eq!(output, r#"["-box-border","p-4"]"#);
        assert_eq!(compiler.name(), "sh");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_reports_stderr() {
        let compiler = CommandCompiler::new(CompilerCommand {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "echo 'unknown utility' >&2; exit 3".to_string(),
            ],
        });

        let error = compiler
            .compile(&tokens(&["nope"]))
            .expect_err("non-zero exit should fail");
        assert!(matches!(error, SnapverifyError::CompilerFailed { .. }));
        assert!(error.to_string().contains("unknown utility"));
    }
}
