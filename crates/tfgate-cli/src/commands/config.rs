//! Effective configuration

use std::process::ExitCode;

use tfgate::GateConfig;

use crate::output::{print_structured, OutputFormat};

/// Print the configuration after defaults, file and environment are layered.
pub fn execute(config: &GateConfig, format: OutputFormat) -> anyhow::Result<ExitCode> {
    print_structured(config, format)?;
    Ok(ExitCode::SUCCESS)
}
