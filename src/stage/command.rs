//! Stage backed by an external program.
//!
//! The document is written to the program's stdin and stdout becomes the
//! revised document. A `{prompt}` argument is replaced by the pass prompt,
//! which is also exported as `REDLINE_PROMPT`.

use std::io::Write;
use std::process::{Command, Stdio};

use log::debug;

use super::{StageError, TransformationStage};

/// Argument placeholder replaced by the prompt text
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Environment variable carrying the prompt text
pub const PROMPT_ENV: &str = "REDLINE_PROMPT";

/// Runs a command once per pass.
#[derive(Debug, Clone)]
pub struct CommandStage {
    argv: Vec<String>,
}

impl CommandStage {
    /// Create a stage from a program and its arguments
    pub fn new(argv: Vec<String>) -> Result<Self, StageError> {
        if argv.is_empty() || argv[0].trim().is_empty() {
            return Err(StageError::Backend("command is empty".to_string()));
        }
        Ok(Self { argv })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    fn build_command(&self, prompt: &str) -> Command {
        let args = self.argv[1..].iter().map(|arg| {
            if arg == PROMPT_PLACEHOLDER {
                prompt.to_string()
            } else {
                arg.clone()
            }
        });

        let mut command = Command::new(self.program());
        command
            .args(args)
            .env(PROMPT_ENV, prompt)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

impl TransformationStage for CommandStage {
    fn name(&self) -> &str {
        "command"
    }

    fn apply(&self, prompt: &str, document: String) -> Result<String, StageError> {
        debug!("Running {} on {} chars", self.program(), document.len());

        let mut child = self.build_command(prompt).spawn()?;

        // stdin is fed from its own thread; both pipes must drain together.
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || -> std::io::Result<()> {
                match stdin.write_all(document.as_bytes()) {
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            })
        });
        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| StageError::Backend("stdin writer thread panicked".to_string()))??;
        }

        if !output.status.success() {
            return Err(StageError::CommandFailed {
                program: self.program().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let revised = String::from_utf8(output.stdout)?;
        if revised.trim().is_empty() {
            return Err(StageError::EmptyOutput);
        }
        Ok(revised)
    }
}
