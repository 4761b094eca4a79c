//! Rule set listing

use std::process::ExitCode;

use colored::*;
use tfgate::GateConfig;

use crate::output::{colorize_severity, print_structured, OutputFormat};

/// List every loaded rule, built-in and custom.
pub fn execute(config: &GateConfig, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let rules = config.rule_set()?;

    match format {
        OutputFormat::Text => {
            let width = rules.rules().iter().map(|r| r.id.len()).max().unwrap_or(0);
            for rule in rules.rules() {
                println!(
                    "{:<width$}  {}  {:<9}  {}",
                    rule.id,
                    colorize_severity(rule.severity),
                    rule.scope.name(),
                    rule.description.dimmed(),
                    width = width
                );
            }
            println!("{} rules", rules.len());
        }
        OutputFormat::Json | OutputFormat::Yaml => print_structured(rules.rules(), format)?,
    }
    Ok(ExitCode::SUCCESS)
}
