//! `docfill generate`: produce the final document from a template, the
//! source document and a values file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use docfill_core::{
    load_document, write_document, DocfillError, Document, GenerationPolicy, GenerationWarning,
    Generator, Proceed,
};
use docfill_logging::{FormEvent, FormEventLogger};

use crate::config::Config;
use crate::terminal_output::{note_success, note_warn};
use crate::validate_cmd::load_session;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Template artifact
    pub template: PathBuf,

    /// Source document containing `${name}` placeholders
    pub document: PathBuf,

    /// JSON object of `name: value` pairs
    #[arg(long)]
    pub values: PathBuf,

    /// Output path; prints to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// literal or cleanup (defaults to generation.policy in docfill.yaml)
    #[arg(long)]
    pub policy: Option<GenerationPolicy>,

    /// Generate even if optional fields are empty
    #[arg(short, long)]
    pub yes: bool,
}

pub async fn run(args: GenerateArgs, config: &Config) -> Result<()> {
    let generator = config.generator(args.policy)?;
    generate(args, &generator).await
}

pub(crate) async fn generate(args: GenerateArgs, generator: &Generator) -> Result<()> {
    let session = load_session(&args.template, &args.values).await?;
    let document = load_document(&args.document).await?;

    let proceed = if args.yes {
        Proceed::WithEmptyFields
    } else {
        Proceed::RequireConfirmation
    };

    let generated = match generator
        .generate(&document, session.template().registry(), session.values(), proceed)
        .await
    {
        Ok(generated) => generated,
        Err(DocfillError::ValidationFailed { missing }) => {
            FormEventLogger::log_event(
                "cli",
                FormEvent::ValidationFailed {
                    missing: missing.iter().map(|n| n.to_string()).collect(),
                },
            );
            return Err(DocfillError::ValidationFailed { missing }.into());
        }
        Err(DocfillError::EmptyFieldsUnconfirmed { fields }) => {
            note_warn("Some optional fields are empty; rerun with --yes to generate anyway");
            return Err(DocfillError::EmptyFieldsUnconfirmed { fields }.into());
        }
        Err(e) => return Err(e.into()),
    };

    for warning in &generated.warnings {
        match warning {
            GenerationWarning::EnrichmentFallback { message } => {
                note_warn("Cleanup unavailable; placeholders were substituted literally");
                FormEventLogger::log_event(
                    "cli",
                    FormEvent::EnrichmentFallback {
                        operation: "cleanup".to_string(),
                        error: message.clone(),
                    },
                );
            }
        }
    }

    FormEventLogger::log_event(
        "cli",
        FormEvent::DocumentGenerated {
            policy: generated.policy_used.to_string(),
            length: generated.content.len(),
            warnings: generated.warnings.len(),
        },
    );

    match &args.output {
        Some(path) => {
            write_document(path, &Document::new(generated.content)).await?;
            note_success(&format!("Wrote {}", path.display()));
        }
        None => println!("{}", generated.content),
    }
    Ok(())
}
