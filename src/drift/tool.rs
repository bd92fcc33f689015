use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_RUNNER: &str = "npx";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The external drift detector to invoke.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Differentiator,
    Sentinel,
    /// Any other executable honoring the same `check` contract.
    Custom(String),
}

impl Tool {
    pub fn name(&self) -> &str {
        match self {
            Self::Differentiator => "api-schema-differentiator",
            Self::Sentinel => "schema-sentinel",
            Self::Custom(name) => name,
        }
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err("Tool name must not be empty. Expected api-schema-differentiator, schema-sentinel, or a program path".to_owned())
        } else if trimmed.eq_ignore_ascii_case("api-schema-differentiator") {
            Ok(Self::Differentiator)
        } else if trimmed.eq_ignore_ascii_case("schema-sentinel") {
            Ok(Self::Sentinel)
        } else {
            Ok(Self::Custom(trimmed.to_owned()))
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How the tool is launched: which package runner (if any), which tool,
/// and how long it may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Package runner placed in front of the tool, `npx` by default.
    /// `None` spawns the tool executable directly.
    pub runner: Option<String>,
    pub tool: Tool,
    pub timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            runner: Some(DEFAULT_RUNNER.to_owned()),
            tool: Tool::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ToolConfig {
    /// Spawn `tool` directly with no package runner.
    pub fn direct(tool: Tool) -> Self {
        Self {
            runner: None,
            tool,
            ..Self::default()
        }
    }

    pub fn with_runner(mut self, runner: Option<String>) -> Self {
        self.runner = runner.filter(|runner| !runner.trim().is_empty());
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = tool;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and argument vector for one `check` invocation.
    pub fn check_command(
        &self,
        key: &str,
        data_path: &Path,
        store: &str,
        fail_on: &str,
    ) -> (String, Vec<String>) {
        let mut args = Vec::with_capacity(12);
        let program = match &self.runner {
            Some(runner) => {
                args.push(self.tool.name().to_owned());
                runner.clone()
            }
            None => self.tool.name().to_owned(),
        };

        args.extend([
            "check".to_owned(),
            "-k".to_owned(),
            key.to_owned(),
            "-d".to_owned(),
            data_path.display().to_string(),
            "-s".to_owned(),
            store.to_owned(),
            "-f".to_owned(),
            "json".to_owned(),
            "--fail-on".to_owned(),
            fail_on.to_owned(),
        ]);

        (program, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tools_case_insensitively() {
        assert_eq!(
            Tool::from_str("api-schema-differentiator").expect("parse differentiator"),
            Tool::Differentiator
        );
        assert_eq!(
            Tool::from_str("Schema-Sentinel").expect("parse sentinel"),
            Tool::Sentinel
        );
    }

    #[test]
    fn unknown_names_become_custom_programs() {
        assert_eq!(
            Tool::from_str("./bin/drift-tool").expect("parse custom"),
            Tool::Custom("./bin/drift-tool".to_owned())
        );
    }

    #[test]
    fn rejects_blank_tool_name() {
        let error = Tool::from_str("   ").expect_err("blank must be rejected");
        assert!(error.contains("api-schema-differentiator"));
    }

    #[test]
    fn default_command_goes_through_npx() {
        let (program, args) = ToolConfig::default().check_command(
            "GET /api/v2/users/:id",
            Path::new("/tmp/payload.json"),
            "./schemas",
            "breaking",
        );

        assert_eq!(program, "npx");
        assert_eq!(
            args,
            [
                "api-schema-differentiator",
                "check",
                "-k",
                "GET /api/v2/users/:id",
                "-d",
                "/tmp/payload.json",
                "-s",
                "./schemas",
                "-f",
                "json",
                "--fail-on",
                "breaking",
            ]
        );
    }

    #[test]
    fn direct_command_spawns_the_tool_itself() {
        let (program, args) = ToolConfig::direct(Tool::Sentinel).check_command(
            "GET /api/v2/products",
            Path::new("p.json"),
            "/srv/schemas",
            "warning",
        );

        assert_eq!(program, "schema-sentinel");
        assert_eq!(args[0], "check");
        assert_eq!(args.last().map(String::as_str), Some("warning"));
    }

    #[test]
    fn blank_runner_means_direct() {
        let config = ToolConfig::default().with_runner(Some(String::new()));
        assert_eq!(config.runner, None);
    }
}
