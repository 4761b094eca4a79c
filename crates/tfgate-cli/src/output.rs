//! Output formatting utilities

use colored::*;
use serde::Serialize;
use tfgate::{BlastRadiusTier, Decision, ExitClass, Finding, IntentVerdict, Severity};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Print a serializable value as JSON or YAML.
///
/// Text falls back to YAML, which reads well for nested data.
pub fn print_structured<T: Serialize + ?Sized>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text | OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
    }
    Ok(())
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a decision for humans.
pub fn print_decision(decision: &Decision, shadow_mode: bool) {
    let verdict = match decision.exit_class() {
        ExitClass::Ok => "GO".green().bold(),
        ExitClass::BreakGlass => "GO (break-glass)".yellow().bold(),
        _ => "NO-GO".red().bold(),
    };
    println!(
        "{} {} ({}, exit {})",
        "Decision:".bold(),
        verdict,
        decision.exit_class(),
        decision.exit_code()
    );
    if shadow_mode {
        println!("  {}", "shadow mode: the decision is reported but not enforced".dimmed());
    }
    if let Some(reason) = decision.override_reason() {
        println!("  Override reason: {}", reason);
    }

    let tier = colorize_tier(decision.tier());
    if decision.tier() == decision.classified_tier() {
        println!("Blast radius: {} (score {})", tier, decision.score());
    } else {
        println!(
            "Blast radius: {} (classified {}, score {})",
            tier,
            colorize_tier(decision.classified_tier()),
            decision.score()
        );
    }
    for reason in decision.escalation_reasons() {
        println!("  escalated: {}", reason);
    }

    let breakdown = decision.breakdown();
    println!(
        "Changes: {} (create {}, update {}, replace {}, delete {})",
        breakdown.total, breakdown.create, breakdown.update, breakdown.replace, breakdown.delete
    );
    if !breakdown.critical_addresses.is_empty() {
        println!("  critical: {}", breakdown.critical_addresses.join(", "));
    }

    let intent = decision.intent();
    print!(
        "Intent: {} (confidence {:.2})",
        colorize_verdict(intent.verdict),
        intent.confidence
    );
    match &intent.explanation {
        Some(explanation) => println!(" {}", explanation.dimmed()),
        None => println!(),
    }

    if decision.findings().is_empty() {
        println!("Findings: {}", "none".dimmed());
    } else {
        println!("Findings:");
        for finding in decision.findings() {
            print_finding(finding);
        }
    }

    if decision.is_degraded() {
        let signals: Vec<String> = decision
            .degraded_signals()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("{} {}", "Degraded signals:".yellow(), signals.join(", "));
    }
}

fn print_finding(finding: &Finding) {
    let severity = match finding.severity {
        Severity::Deny => "DENY".red().bold(),
        Severity::Warn => "WARN".yellow().bold(),
        Severity::Info => "INFO".blue(),
    };
    print!("  {} {} {}", severity, finding.rule_id.bold(), finding.message);
    if let Some(address) = &finding.subject_address {
        print!(" {}", format!("[{}]", address).dimmed());
    }
    println!();
}

pub fn colorize_severity(severity: Severity) -> ColoredString {
    match severity {
        Severity::Deny => severity.as_str().red(),
        Severity::Warn => severity.as_str().yellow(),
        Severity::Info => severity.as_str().blue(),
    }
}

fn colorize_tier(tier: BlastRadiusTier) -> ColoredString {
    match tier {
        BlastRadiusTier::Green => tier.as_str().green().bold(),
        BlastRadiusTier::Yellow => tier.as_str().yellow().bold(),
        BlastRadiusTier::Red => tier.as_str().red().bold(),
    }
}

fn colorize_verdict(verdict: IntentVerdict) -> ColoredString {
    match verdict {
        IntentVerdict::Aligned => verdict.as_str().green(),
        IntentVerdict::Mismatch => verdict.as_str().red(),
        IntentVerdict::Indeterminate => verdict.as_str().dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }
}
