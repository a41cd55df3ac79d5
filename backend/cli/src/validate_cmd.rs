//! `docfill validate`: check a values file against a template.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::{Map, Value};

use docfill_core::{FormSession, Template};
use docfill_logging::{FormEvent, FormEventLogger};

use crate::terminal_output::{field_state_table, note_success, report_notes};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Template artifact
    pub template: PathBuf,

    /// JSON object of `name: value` pairs
    #[arg(long)]
    pub values: PathBuf,
}

/// Read a values file: a JSON object keyed by placeholder name.
pub(crate) async fn read_values(path: &Path) -> Result<Map<String, Value>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read values file: {}", path.display()))?;
    match serde_json::from_str(&raw)
        .with_context(|| format!("Values file is not valid JSON: {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => bail!("Values file must contain a JSON object: {}", path.display()),
    }
}

/// Load the template and fill a session from the values file.
pub(crate) async fn load_session(template: &Path, values: &Path) -> Result<FormSession> {
    let template = Arc::new(Template::load(template).await?);
    let values = read_values(values).await?;
    let mut session = FormSession::new(template);
    session.apply_json(&values)?;
    Ok(session)
}

pub async fn run(args: ValidateArgs) -> Result<()> {
    let session = load_session(&args.template, &args.values).await?;

    print!("{}", field_state_table(&session.field_states()));
    let report = session.validate();
    report_notes(&report);

    if !report.is_ok() {
        FormEventLogger::log_event(
            "cli",
            FormEvent::ValidationFailed {
                missing: report.missing.iter().map(|n| n.to_string()).collect(),
            },
        );
    }
    report.into_result()?;

    note_success("All required fields are filled");
    Ok(())
}
