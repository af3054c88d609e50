//! In-memory `CommandRunner` used by the stage tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::error::DeployError;

enum Reply {
    Output(CommandOutput),
    /// Writes the body to the command's last argument, like `aws lambda invoke`.
    WriteOutfile { body: String, metadata: String },
    Installs(String),
}

struct Rule {
    prefix: String,
    reply: Reply,
}

/// Answers commands by prefix match and records every call. Unmatched
/// commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<CommandSpec>>,
    streamed: Mutex<Vec<String>>,
    available: Mutex<HashSet<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, prefix: &str, output: CommandOutput) -> Self {
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            reply: Reply::Output(output),
        });
        self
    }

    pub fn on_invoke(self, body: &str) -> Self {
        self.on_invoke_with(body, r#"{"StatusCode": 200, "ExecutedVersion": "$LATEST"}"#)
    }

    /// Like `on_invoke`, with the invocation metadata the CLI prints on stdout.
    pub fn on_invoke_with(mut self, body: &str, metadata: &str) -> Self {
        self.rules.push(Rule {
            prefix: "aws lambda invoke".to_string(),
            reply: Reply::WriteOutfile {
                body: body.to_string(),
                metadata: metadata.to_string(),
            },
        });
        self
    }

    pub fn installs(mut self, prefix: &str, tool: &str) -> Self {
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            reply: Reply::Installs(tool.to_string()),
        });
        self
    }

    pub fn with_tool(self, tool: &str) -> Self {
        self.available.lock().unwrap().insert(tool.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Calls that went through `run_streaming`.
    pub fn streamed(&self) -> Vec<String> {
        self.streamed.lock().unwrap().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.calls().iter().any(|call| call.starts_with(prefix))
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, DeployError> {
        self.calls.lock().unwrap().push(spec.clone());
        let line = spec.to_string();

        let Some(rule) = self.rules.iter().find(|rule| line.starts_with(&rule.prefix)) else {
            return Ok(CommandOutput::ok(""));
        };

        match &rule.reply {
            Reply::Output(output) => Ok(output.clone()),
            Reply::WriteOutfile { body, metadata } => {
                if let Some(path) = spec.args.last() {
                    std::fs::write(path, body)?;
                }
                Ok(CommandOutput::ok(metadata.as_str()))
            }
            Reply::Installs(tool) => {
                self.available.lock().unwrap().insert(tool.clone());
                Ok(CommandOutput::ok(""))
            }
        }
    }

    async fn run_streaming(&self, spec: &CommandSpec) -> Result<CommandOutput, DeployError> {
        self.streamed.lock().unwrap().push(spec.to_string());
        self.run(spec).await
    }

    async fn is_available(&self, program: &str) -> bool {
        self.available.lock().unwrap().contains(program)
    }
}
