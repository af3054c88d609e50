use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::error::DeployError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: vec![],
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
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        CommandOutput {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        CommandOutput {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Executes external tools on behalf of the pipeline stages.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, DeployError>;

    /// Like `run`, but echoes stdout line by line while the command runs.
    async fn run_streaming(&self, spec: &CommandSpec) -> Result<CommandOutput, DeployError> {
        self.run(spec).await
    }

    async fn is_available(&self, program: &str) -> bool;
}

/// Spawns real processes and waits for each to exit.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, DeployError> {
        log::debug!("Running {}", spec);
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .output()
            .await?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn run_streaming(&self, spec: &CommandSpec) -> Result<CommandOutput, DeployError> {
        log::debug!("Running {}", spec);
        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Both pipes are drained together so a chatty stderr can't block the child.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout, stderr) = tokio::try_join!(
            collect_lines(stdout, true),
            collect_lines(stderr, false)
        )?;
        let status = child.wait().await?;

        Ok(CommandOutput {
            success: status.success(),
            stdout,
            stderr,
        })
    }

    async fn is_available(&self, program: &str) -> bool {
        match Command::new("which").arg(program).output().await {
            Ok(output) => output.status.success(),
            Err(e) => {
                log::debug!("Couldn't look up {}: {}", program, e);
                false
            }
        }
    }
}

async fn collect_lines<R>(pipe: Option<R>, echo: bool) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut collected = String::new();
    let Some(pipe) = pipe else {
        return Ok(collected);
    };

    let mut lines = BufReader::new(pipe).lines();
    while let Some(line) = lines.next_line().await? {
        if echo {
            log::info!("    {}", line);
        }
        collected.push_str(&line);
        collected.push('\n');
    }

    Ok(collected)
}

const STDOUT_TAIL_LINES: usize = 20;

/// Runs `spec` and returns its stdout, turning a non-zero exit into an error.
pub async fn run_checked(
    runner: &dyn CommandRunner,
    spec: &CommandSpec,
) -> Result<String, DeployError> {
    let output = runner.run(spec).await?;
    checked(spec, output)
}

/// `run_checked` for long-running tools whose progress should be visible.
pub async fn run_streamed_checked(
    runner: &dyn CommandRunner,
    spec: &CommandSpec,
) -> Result<String, DeployError> {
    let output = runner.run_streaming(spec).await?;
    checked(spec, output)
}

fn checked(spec: &CommandSpec, output: CommandOutput) -> Result<String, DeployError> {
    if !output.success {
        return Err(DeployError::CommandFailed {
            command: spec.to_string(),
            message: failure_message(&output),
        });
    }

    Ok(output.stdout)
}

/// Stderr followed by the last lines of stdout. Test runners report failing
/// cases on stdout.
fn failure_message(output: &CommandOutput) -> String {
    let lines: Vec<&str> = output.stdout.trim_end().lines().collect();
    let tail = lines[lines.len().saturating_sub(STDOUT_TAIL_LINES)..].join("\n");

    match (output.stderr.trim(), tail.trim()) {
        (stderr, "") => stderr.to_string(),
        ("", tail) => tail.to_string(),
        (stderr, tail) => format!("{}\n{}", stderr, tail),
    }
}
