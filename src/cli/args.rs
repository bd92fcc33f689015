use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::drift::{DEFAULT_FAIL_ON, DEFAULT_RUNNER, DEFAULT_STORE, Expectations, Tool, ToolConfig};

#[derive(Parser, Debug)]
#[command(name = "driftcheck")]
#[command(about = "Check API responses for schema drift with an external detector")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Print operator.json and exit
    #[arg(long)]
    pub describe: bool,

    /// Print JSON Schema and exit
    #[arg(long)]
    pub schema: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a response payload read from a file or stdin
    Check(CheckArgs),
    /// Fetch an endpoint over HTTP, then check its response
    Probe(ProbeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Response payload file (default: stdin, also `-`)
    #[arg(short = 'd', long = "data")]
    pub data: Option<PathBuf>,

    /// Hand the payload to the tool byte-for-byte instead of re-serializing it
    #[arg(long)]
    pub raw: bool,

    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub tool: ToolArgs,

    #[command(flatten)]
    pub expect: ExpectArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// URL to fetch
    #[arg(long)]
    pub url: String,

    /// HTTP method
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,

    /// Extra request header as `Name: value` (repeatable)
    #[arg(long = "header")]
    pub headers: Vec<String>,

    /// Refuse unless the response has this status
    #[arg(long)]
    pub expect_status: Option<u16>,

    /// Hand the response body to the tool byte-for-byte
    #[arg(long)]
    pub raw: bool,

    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub tool: ToolArgs,

    #[command(flatten)]
    pub expect: ExpectArgs,
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Logical endpoint key, e.g. "GET /api/v2/users/:id"
    #[arg(short = 'k', long)]
    pub key: String,

    /// Baseline schema store
    #[arg(short = 's', long, default_value = DEFAULT_STORE)]
    pub store: String,

    /// Lowest severity that makes the tool exit non-zero
    #[arg(long, default_value = DEFAULT_FAIL_ON)]
    pub fail_on: String,
}

#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// Drift tool: api-schema-differentiator, schema-sentinel, or a program path
    #[arg(long, default_value = "api-schema-differentiator")]
    pub tool: String,

    /// Package runner placed in front of the tool
    #[arg(long, default_value = DEFAULT_RUNNER)]
    pub runner: String,

    /// Spawn the tool directly, without a package runner
    #[arg(long)]
    pub direct: bool,

    /// Seconds before the tool is killed
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ToolArgs {
    pub fn to_config(&self) -> Result<ToolConfig, String> {
        let tool = self.tool.parse::<Tool>()?;
        if self.timeout_secs == 0 {
            return Err("--timeout-secs must be at least 1".to_owned());
        }
        let runner = (!self.direct).then(|| self.runner.clone());

        Ok(ToolConfig::default()
            .with_tool(tool)
            .with_runner(runner)
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExpectArgs {
    /// Do not fail on a non-zero tool exit alone
    #[arg(long)]
    pub allow_drift: bool,

    /// Do not fail when the report flags breaking changes
    #[arg(long)]
    pub allow_breaking: bool,

    /// Fail when more breaking changes than this are reported
    #[arg(long)]
    pub max_breaking: Option<u64>,

    /// Fail when the compatibility score is below this
    #[arg(long)]
    pub min_compatibility: Option<f64>,
}

impl ExpectArgs {
    pub fn to_expectations(&self) -> Expectations {
        Expectations {
            allow_drift: self.allow_drift,
            allow_breaking: self.allow_breaking,
            max_breaking: self.max_breaking,
            min_compatibility: self.min_compatibility,
        }
    }
}

/// Split a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    let Some((name, value)) = raw.split_once(':') else {
        return Err(format!("Invalid header '{raw}'. Expected `Name: value`"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Invalid header '{raw}'. Header name is empty"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}
