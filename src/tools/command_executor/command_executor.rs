use async_trait::async_trait;

use crate::tools::{Tool, ToolError};

/// Runs a shell command line and reports its standard output.
pub struct CommandExecutor {
    platform: String,
}

impl CommandExecutor {
    /// Create a new CommandExecutor instance
    /// # Example
    /// ```rust,ignore
    /// let tool = CommandExecutor::new("linux");
    /// ```
    pub fn new<S: Into<String>>(platform: S) -> Self {
        Self {
            platform: platform.into(),
        }
    }

    fn shell(&self) -> (&'static str, &'static str) {
        if self.platform.eq_ignore_ascii_case("windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        }
    }

    fn format_output(
        command: &str,
        status: std::process::ExitStatus,
        stdout: &[u8],
        stderr: &[u8],
    ) -> Result<String, ToolError> {
        if !status.success() {
            return Err(ToolError::ExecutionError(
                format!(
                    "Command {} failed with status: {}\n{}",
                    command,
                    status,
                    String::from_utf8_lossy(stderr)
                )
                .into(),
            ));
        }

        Ok(format!(
            "Command: {}\nOutput: {}",
            command,
            String::from_utf8_lossy(stdout)
        ))
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new("linux")
    }
}

#[async_trait]
impl Tool for CommandExecutor {
    fn name(&self) -> String {
        "Terminal".into()
    }

    fn description(&self) -> String {
        format!(
            "This tool let you run commands on the terminal. The input should be a single command line for the following platform: {}",
            self.platform
        )
    }

    fn run(&self, input: &str) -> Result<String, ToolError> {
        let command = input.trim();
        if command.is_empty() {
            return Err(ToolError::InvalidInput("empty command".into()));
        }

        let (shell, flag) = self.shell();
        let output = std::process::Command::new(shell)
            .arg(flag)
            .arg(command)
            .output()?;

        Self::format_output(command, output.status, &output.stdout, &output.stderr)
    }

    fn is_async(&self) -> bool {
        true
    }

    async fn arun(&self, input: &str) -> Result<String, ToolError> {
        let command = input.trim();
        if command.is_empty() {
            return Err(ToolError::InvalidInput("empty command".into()));
        }

        let (shell, flag) = self.shell();
        let output = tokio::process::Command::new(shell)
            .arg(flag)
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await?;

        Self::format_output(command, output.status, &output.stdout, &output.stderr)
    }
}
