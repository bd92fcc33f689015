#![forbid(unsafe_code)]

use clap::Parser;
use serde_json::Value;
use std::io;

pub mod cli;
pub mod drift;
pub mod error;
pub mod http;
pub mod input;
pub mod logging;
pub mod output;
pub mod refusal;
pub mod runner;

pub use drift::{
    DriftCheck, DriftResult, Expectations, Tool, ToolConfig, Violation, check_schema_drift,
    check_schema_drift_raw,
};
pub use error::DriftError;
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};

use cli::{Command, ExpectArgs, Outcome, TargetArgs};
use error::Result;
use refusal::{RefusalCode, RefusalEnvelope};

/// Main entry point that handles all errors internally and returns exit code
pub fn run() -> u8 {
    logging::init_tracing();
    let cli = cli::Cli::parse();
    run_with_cli(cli)
}

pub fn run_with_cli(cli: cli::Cli) -> u8 {
    run_with_runner(cli, &ProcessRunner::new())
}

/// Like [`run_with_cli`] with the tool invocation routed through `runner`.
pub fn run_with_runner<R: CommandRunner + ?Sized>(cli: cli::Cli, runner: &R) -> u8 {
    // Handle immediate flags that don't require a tool run
    if cli.describe {
        return emit_pretty(&operator_manifest());
    }

    if cli.schema {
        return emit_pretty(&record_schema());
    }

    match cli.command {
        Some(Command::Check(args)) => {
            let tool = match args.tool.to_config() {
                Ok(tool) => tool,
                Err(message) => return refuse_bad_args(message, "tool"),
            };
            let outcome = input::PayloadSource::from_arg(args.data.as_deref())
                .read_text()
                .and_then(|text| {
                    let check = build_check(&args.target, tool);
                    if args.raw {
                        check.run_raw_with(runner, &text)
                    } else {
                        let payload = input::parse_payload(&text)?;
                        check.run_with(runner, &payload)
                    }
                });
            finish(&args.target, &args.expect, outcome)
        }
        Some(Command::Probe(args)) => {
            let tool = match args.tool.to_config() {
                Ok(tool) => tool,
                Err(message) => return refuse_bad_args(message, "tool"),
            };
            let request = match probe_request(&args) {
                Ok(request) => request,
                Err(error) => return refuse(&error),
            };
            let outcome = http::fetch(&request).and_then(|response| {
                let check = build_check(&args.target, tool);
                if args.raw {
                    check.run_raw_with(runner, &response.text)
                } else {
                    check.run_with(runner, &response.json()?)
                }
            });
            finish(&args.target, &args.expect, outcome)
        }
        None => refuse_bad_args(
            "No command given. Use `driftcheck check` or `driftcheck probe`".to_owned(),
            "command",
        ),
    }
}

fn build_check(target: &TargetArgs, tool: ToolConfig) -> DriftCheck {
    DriftCheck::new(target.key.clone())
        .store(target.store.clone())
        .fail_on(target.fail_on.clone())
        .tool(tool)
}

fn probe_request(args: &cli::ProbeArgs) -> Result<http::HttpRequest> {
    let method = args
        .method
        .parse::<http::Method>()
        .map_err(|detail| DriftError::BadInput { detail })?;
    let mut request = http::HttpRequest::new(method, args.url.clone());
    for raw in &args.headers {
        let (name, value) =
            cli::args::parse_header(raw).map_err(|detail| DriftError::BadInput { detail })?;
        request = request.header(name, value);
    }
    if let Some(body) = &args.body {
        request = request.body(input::parse_payload(body)?);
    }
    if let Some(status) = args.expect_status {
        request = request.expect_status(status);
    }
    Ok(request)
}

fn finish(target: &TargetArgs, expect: &ExpectArgs, outcome: Result<DriftResult>) -> u8 {
    let result = match outcome {
        Ok(result) => result,
        Err(error) => return refuse(&error),
    };

    let violations = expect.to_expectations().evaluate(&result);
    let outcome = if violations.is_empty() {
        Outcome::Clean
    } else {
        Outcome::Drift
    };
    for violation in &violations {
        tracing::warn!(key = %target.key, %violation, "expectation failed");
    }

    let record = output::CheckRecord::new(&target.key, outcome.as_str(), result, &violations);
    match output::write_json_line(&mut io::stdout().lock(), &record) {
        Ok(()) => cli::exit_code(outcome),
        Err(error) => {
            tracing::error!(%error, "cannot write record to stdout");
            cli::exit_code(Outcome::Refusal)
        }
    }
}

fn refuse(error: &DriftError) -> u8 {
    tracing::error!(%error, code = %RefusalCode::for_error(error), "refusing");
    emit_refusal(&RefusalEnvelope::from_error(error))
}

fn refuse_bad_args(message: String, field: &str) -> u8 {
    emit_refusal(&RefusalEnvelope::new(
        RefusalCode::BadInput,
        message,
        serde_json::json!({ "argument": field }),
    ))
}

fn emit_refusal(envelope: &RefusalEnvelope) -> u8 {
    emit_refusal_to(&mut io::stdout().lock(), envelope)
}

fn emit_refusal_to<W: io::Write>(writer: &mut W, envelope: &RefusalEnvelope) -> u8 {
    if let Err(error) = output::write_json_line(writer, envelope) {
        tracing::error!(%error, code = %envelope.refusal.code, "cannot write refusal to stdout");
    }
    cli::exit_code(Outcome::Refusal)
}

fn emit_pretty(value: &Value) -> u8 {
    let mut stdout = io::stdout().lock();
    match output::write_pretty(&mut stdout, value) {
        Ok(()) => 0,
        Err(_) => cli::exit_code(Outcome::Refusal),
    }
}

pub fn operator_manifest() -> Value {
    let refusals: Vec<Value> = [
        RefusalCode::BadInput,
        RefusalCode::Io,
        RefusalCode::Tool,
        RefusalCode::Timeout,
        RefusalCode::BadReport,
        RefusalCode::Network,
    ]
    .iter()
    .map(|code| {
        serde_json::json!({
            "code": code.as_str(),
            "message": code.default_message(),
            "action": "escalate"
        })
    })
    .collect();

    serde_json::json!({
        "schema_version": "operator.v0",
        "name": "driftcheck",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Runs an external API schema-drift detector against a response payload and normalizes its report",
        "license": "MIT",
        "invocation": {
            "binary": "driftcheck",
            "output_mode": "record",
            "output_schema": output::RECORD_VERSION,
            "json_flag": null
        },
        "subcommands": [
            {
                "name": "check",
                "description": "Check a payload read from --data or stdin"
            },
            {
                "name": "probe",
                "description": "Fetch --url over HTTP, then check the response"
            }
        ],
        "options": [
            { "name": "key", "flag": "--key", "type": "string", "required": true,
              "description": "Logical endpoint key" },
            { "name": "store", "flag": "--store", "type": "string", "default": drift::DEFAULT_STORE,
              "description": "Baseline schema store" },
            { "name": "fail_on", "flag": "--fail-on", "type": "string", "default": drift::DEFAULT_FAIL_ON,
              "description": "Lowest severity that counts as drift" },
            { "name": "tool", "flag": "--tool", "type": "string", "default": "api-schema-differentiator",
              "description": "Drift tool to run" },
            { "name": "runner", "flag": "--runner", "type": "string", "default": drift::DEFAULT_RUNNER,
              "description": "Package runner in front of the tool" },
            { "name": "timeout_secs", "flag": "--timeout-secs", "type": "integer", "default": drift::DEFAULT_TIMEOUT.as_secs(),
              "description": "Seconds before the tool is killed" }
        ],
        "exit_codes": {
            "0": { "meaning": "CLEAN", "domain": "positive" },
            "1": { "meaning": "DRIFT", "domain": "negative" },
            "2": { "meaning": "REFUSAL", "domain": "error" }
        },
        "refusals": refusals
    })
}

pub fn record_schema() -> Value {
    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": output::RECORD_VERSION,
        "type": "object",
        "properties": {
            "version": { "type": "string", "const": output::RECORD_VERSION },
            "key": { "type": "string", "minLength": 1 },
            "outcome": { "type": "string", "enum": ["CLEAN", "DRIFT"] },
            "exit_code": { "type": "integer" },
            "has_drift": {
                "type": "boolean",
                "description": "True iff the tool exited non-zero"
            },
            "has_breaking": { "type": "boolean" },
            "breaking_count": { "type": "integer", "minimum": 0 },
            "warning_count": { "type": "integer", "minimum": 0 },
            "compatibility_score": { "type": "number", "minimum": 0, "maximum": 100 },
            "report": {
                "type": "object",
                "description": "Tool report as printed, empty when the tool printed nothing"
            },
            "violations": { "type": "array", "items": { "type": "string" } },
            "tool_versions": {
                "type": "object",
                "additionalProperties": { "type": "string" }
            }
        },
        "required": [
            "version", "key", "outcome", "exit_code", "has_drift", "has_breaking",
            "breaking_count", "warning_count", "compatibility_score", "report", "violations"
        ]
    })
}
