//! Plan validation

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Args;
use tfgate::{
    ContextSources, Decision, DriftSource, ExitClass, FileDocumentProvider, FileDriftSource,
    GateConfig, Gatekeeper, NoDriftSource,
};
use tracing::warn;

use crate::output::{print_decision, print_structured, OutputFormat};

/// Arguments of `tf-gate validate`
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Plan document (JSON) to evaluate
    pub plan: PathBuf,

    /// Drift scan document (JSON); a missing file means no scan
    #[arg(long)]
    pub drift: Option<PathBuf>,

    /// Declared intent, usually the commit message
    #[arg(long)]
    pub intent: Option<String>,

    /// Emergency override with an incident reference
    #[arg(long, value_name = "INCIDENT", env = "TFGATE_BREAK_GLASS")]
    pub break_glass: Option<String>,

    /// Report the decision but exit 0 unless break-glass was used
    #[arg(long)]
    pub shadow_mode: bool,

    /// Evaluation time (RFC 3339), defaults to now
    #[arg(long, value_name = "RFC3339")]
    pub at: Option<DateTime<Utc>>,
}

/// Evaluate the plan and map the decision to an exit code.
pub async fn execute(
    args: ValidateArgs,
    config: GateConfig,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let gate = Gatekeeper::new(Arc::new(config))?;

    let mut sources = ContextSources::at(args.at.unwrap_or_else(Utc::now));
    if let Some(intent) = args.intent {
        sources = sources.with_declared_intent(intent);
    }
    if let Some(incident) = args.break_glass {
        warn!(incident = %incident, "Break-glass override requested");
        let reason = Some(incident).filter(|r| !r.trim().is_empty());
        sources = sources.with_emergency_override(reason);
    }

    let documents = FileDocumentProvider::new(&args.plan);
    let drift: Box<dyn DriftSource> = match &args.drift {
        Some(path) => Box::new(FileDriftSource::new(path)),
        None => Box::new(NoDriftSource),
    };
    let decision = gate.run(&documents, drift.as_ref(), sources).await?;

    match format {
        OutputFormat::Text => print_decision(&decision, args.shadow_mode),
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&decision, format)?,
    }

    Ok(ExitCode::from(exit_code(&decision, args.shadow_mode)))
}

/// Shadow mode only lets break-glass through as a non-zero code.
fn exit_code(decision: &Decision, shadow_mode: bool) -> u8 {
    let code = if shadow_mode && decision.exit_class() != ExitClass::BreakGlass {
        0
    } else {
        decision.exit_code()
    };
    u8::try_from(code).unwrap_or(1)
}
