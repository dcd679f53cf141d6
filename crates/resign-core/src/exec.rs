//! External tool execution
//!
//! Every Android SDK / JDK tool is driven through a [`CommandRunner`]. The
//! runner logs the invocation in its redacted printable form before running
//! it, so passwords passed on the command line never reach the logs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::ToolError;

/// Flags whose following argument is a secret
pub const SECRET_FLAGS: &[&str] = &["--ks-pass", "--key-pass", "-storepass", "-keypass"];

/// Replacement printed in place of a secret value
pub const REDACTED: &str = "***";

/// A fully built external tool invocation
#[derive(Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    stdin: Option<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Path argument, converted lossily
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    /// Data written to the tool's standard input
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Bare executable name, e.g. `zipalign` for `/sdk/build-tools/34.0.0/zipalign`
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// Arguments with every value following a secret flag masked
    pub fn redacted_args(&self) -> Vec<String> {
        let mut redacted = Vec::with_capacity(self.args.len());
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                redacted.push(REDACTED.to_string());
            } else {
                redacted.push(arg.clone());
            }
            mask_next = SECRET_FLAGS.contains(&arg.as_str());
        }
        redacted
    }

    /// Shell-like rendering for logs, with secrets masked
    pub fn printable(&self) -> String {
        std::iter::once(self.program.to_string_lossy().to_string())
            .chain(self.redacted_args())
            .map(|part| quote(&part))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote(part: &str) -> String {
    if part.is_empty() {
        "\"\"".to_string()
    } else if part.chars().any(|c| c.is_whitespace() || c == '"') {
        format!("\"{}\"", part.replace('"', "\\\""))
    } else {
        part.to_string()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.printable())
    }
}

// Debug goes through the redacted form so `{:?}` in error chains is safe too.
impl fmt::Debug for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCommand")
            .field("command", &self.printable())
            .finish()
    }
}

/// Exit status and combined stdout + stderr of a finished tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    /// Standard output followed by standard error
    pub output: String,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            output: output.into(),
        }
    }

    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            output: output.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Output trimmed of surrounding whitespace
    pub fn trimmed(&self) -> &str {
        self.output.trim()
    }
}

/// Runs external tools
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion and capture its output.
    ///
    /// Only a failure to launch the process is an error; a non-zero exit is
    /// reported through [`ToolOutput::code`].
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError>;
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        info!("=> {}", command.printable());

        let spawn_error = |source: std::io::Error| ToolError::Spawn {
            program: command.program_name(),
            source,
        };

        let mut cmd = Command::new(command.program());
        // a cancelled run must not leave a tool writing to its output
        cmd.args(command.get_args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match command.get_stdin() {
            Some(input) => {
                cmd.stdin(Stdio::piped());
                let mut child = cmd.spawn().map_err(spawn_error)?;
                if let Some(mut stdin) = child.stdin.take() {
                    stdin.write_all(input.as_bytes()).await.map_err(spawn_error)?;
                }
                child.wait_with_output().await.map_err(spawn_error)?
            }
            None => {
                cmd.stdin(Stdio::null());
                cmd.output().await.map_err(spawn_error)?
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        let result = ToolOutput {
            code: output.status.code(),
            output: combined,
        };
        debug!(
            program = %command.program_name(),
            code = ?result.code,
            output = %result.trimmed(),
            "tool finished"
        );
        Ok(result)
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    //! Scripted runner used by unit tests across the workspace

    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use super::{CommandRunner, ToolCommand, ToolOutput};
    use crate::error::ToolError;

    type Responder = Arc<dyn Fn(&ToolCommand) -> Result<ToolOutput, ToolError> + Send + Sync>;

    /// Returns canned outputs keyed by program name and records every call.
    ///
    /// Replies for a program are consumed in order; the last one repeats.
    /// Programs without a script exit with 127.
    #[derive(Default)]
    pub struct ScriptedRunner {
        scripts: Mutex<HashMap<String, VecDeque<Responder>>>,
        calls: Mutex<Vec<ToolCommand>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a fixed reply for `program`
        pub fn on(self, program: &str, output: ToolOutput) -> Self {
            self.on_with(program, move |_| output.clone())
        }

        /// Queue a reply computed from the invocation (may touch the filesystem)
        pub fn on_with<F>(self, program: &str, reply: F) -> Self
        where
            F: Fn(&ToolCommand) -> ToolOutput + Send + Sync + 'static,
        {
            self.push(program, Arc::new(move |cmd: &ToolCommand| Ok(reply(cmd))))
        }

        /// Make `program` fail to launch
        pub fn fail_spawn(self, program: &str) -> Self {
            let name = program.to_string();
            self.push(
                program,
                Arc::new(move |_: &ToolCommand| {
                    Err(ToolError::Spawn {
                        program: name.clone(),
                        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
                    })
                }),
            )
        }

        fn push(self, program: &str, responder: Responder) -> Self {
            if let Ok(mut scripts) = self.scripts.lock() {
                scripts
                    .entry(program.to_string())
                    .or_default()
                    .push_back(responder);
            }
            self
        }

        /// Every recorded invocation, in order
        pub fn calls(&self) -> Vec<ToolCommand> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        /// Recorded invocations of one program
        pub fn calls_to(&self, program: &str) -> Vec<ToolCommand> {
            self.calls()
                .into_iter()
                .filter(|c| c.program_name() == program)
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(command.clone());
            }

            let responder = {
                let mut scripts = match self.scripts.lock() {
                    Ok(scripts) => scripts,
                    Err(poisoned) => poisoned.into_inner(),
                };
                scripts.get_mut(&command.program_name()).and_then(|queue| {
                    if queue.len() > 1 {
                        queue.pop_front()
                    } else {
                        queue.front().cloned()
                    }
                })
            };

            match responder {
                Some(reply) => reply(command),
                None => Ok(ToolOutput::failure(
                    127,
                    format!("no scripted response for {}", command.program_name()),
                )),
            }
        }
    }
}
