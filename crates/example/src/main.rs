//! Agent definition checker.
//!
//! Validates an agent file and reports, per MCP server, whether it is
//! provisioned statically or per invocation and which placeholders the
//! environment still has to bind. Placeholder `NAME` is bound by the
//! environment variable `LODESTAR_NAME`; a `.env` file is loaded first.
//!
//! # Usage
//!
//! ```bash
//! lodestar-check <agent.json>
//! ```
//!
//! Exits with status 1 if the file is invalid and 2 if placeholders are left
//! unbound.

#![expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "the report is the program's output"
)]

use example::{CheckReport, ENV_PREFIX};
use lodestar_core::TracingConfig;
use lodestar_mcp::{AgentConfig, SubstitutionContext};
use std::process::ExitCode;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    TracingConfig::from_env().init();

    let args: Vec<String> = std::env::args().collect();
    let [_, path] = args.as_slice() else {
        eprintln!("Usage: lodestar-check <agent.json>");
        return ExitCode::FAILURE;
    };

    let config = match AgentConfig::from_path(path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let bindings = SubstitutionContext::from_env(ENV_PREFIX);
    tracing::debug!(bound = bindings.len(), "loaded substitutions from environment");

    let report = CheckReport::new(&config, &bindings);
    print!("{report}");

    if report.is_ready() {
        ExitCode::SUCCESS
    } else {
        eprintln!("some placeholders are unbound; set {ENV_PREFIX}<NAME> for each");
        ExitCode::from(2)
    }
}
