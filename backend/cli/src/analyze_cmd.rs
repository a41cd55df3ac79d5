//! `docfill analyze`: extract placeholders from a document and write the
//! initial template artifact.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use docfill_core::{
    extract, load_document, write_document, DocfillError, Document, EnrichmentService,
    PlaceholderName, Registry, SuggestedPlaceholder,
};
use docfill_logging::{FormEvent, FormEventLogger};

use crate::config::Config;
use crate::terminal_output::{
    note_info, note_success, note_warn, registry_table, render_table, Column,
};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Document text (paragraphs separated by blank lines)
    pub document: PathBuf,

    /// Where to write the template artifact
    #[arg(short, long, default_value = "template.json")]
    pub output: PathBuf,

    /// Ask the enrichment service for additional placeholders
    #[arg(long)]
    pub suggest: bool,

    /// Accept the suggested placeholder with this name (repeatable)
    #[arg(long = "accept", value_name = "NAME")]
    pub accept: Vec<String>,

    /// Accept every suggestion
    #[arg(long)]
    pub accept_all: bool,

    /// Write the document with accepted placeholders inserted to this path
    #[arg(long, value_name = "OUT")]
    pub rewrite: Option<PathBuf>,
}

pub async fn run(args: AnalyzeArgs, config: &Config) -> Result<()> {
    let enrichment = if args.suggest { config.enrichment() } else { None };
    analyze(args, enrichment).await
}

pub(crate) async fn analyze(
    args: AnalyzeArgs,
    enrichment: Option<Arc<dyn EnrichmentService>>,
) -> Result<()> {
    let document = load_document(&args.document).await?;
    let names = extract(Some(document.content()));
    if names.is_empty() {
        note_warn("No ${...} placeholders found in the document");
    }

    let mut registry = Registry::seed(names);
    FormEventLogger::log_event(
        "cli",
        FormEvent::TemplateSeeded {
            source: args.document.display().to_string(),
            placeholder_count: registry.len(),
        },
    );

    let mut accepted: Vec<PlaceholderName> = Vec::new();
    if args.suggest {
        match &enrichment {
            Some(service) => {
                let suggestions = suggest(service.as_ref(), &document).await;
                accepted = accept(&mut registry, &suggestions, &args)?;
            }
            None => note_warn("No enrichment provider configured; skipping suggestions"),
        }
    }

    if let Some(out) = &args.rewrite {
        match (&enrichment, accepted.is_empty()) {
            (Some(service), false) => {
                let text = rewrite(service.as_ref(), &document, &accepted).await;
                write_document(out, &Document::new(text)).await?;
                note_success(&format!("Rewrote document to {}", out.display()));
            }
            _ => note_info("No accepted suggestions; document not rewritten"),
        }
    }

    let template = registry.finalize();
    template.save(&args.output).await?;

    print!("{}", registry_table(template.registry()));
    note_success(&format!(
        "Wrote {} placeholder(s) to {}",
        template.registry().len(),
        args.output.display()
    ));
    Ok(())
}

/// Enrichment failures degrade to no suggestions.
async fn suggest(service: &dyn EnrichmentService, document: &Document) -> Vec<SuggestedPlaceholder> {
    match service.suggest_placeholders(document.content()).await {
        Ok(suggestions) => {
            if suggestions.is_empty() {
                note_info("No additional placeholders suggested");
            } else {
                let rows: Vec<Vec<String>> = suggestions
                    .iter()
                    .map(|s| vec![s.name.delimited(), s.source_text.clone()])
                    .collect();
                println!("Suggested placeholders:");
                print!(
                    "{}",
                    render_table(&[Column::left("Name"), Column::left("Replaces")], &rows)
                );
            }
            suggestions
        }
        Err(e) => {
            warn!(error = %e, "Placeholder suggestion failed");
            FormEventLogger::log_event(
                "cli",
                FormEvent::EnrichmentFallback {
                    operation: "suggest_placeholders".to_string(),
                    error: format!("{e:#}"),
                },
            );
            note_warn("Suggestion service unavailable; continuing with extracted placeholders");
            Vec::new()
        }
    }
}

fn accept(
    registry: &mut Registry,
    suggestions: &[SuggestedPlaceholder],
    args: &AnalyzeArgs,
) -> Result<Vec<PlaceholderName>> {
    let wanted: Vec<PlaceholderName> = args
        .accept
        .iter()
        .map(|raw| PlaceholderName::parse(raw))
        .collect::<docfill_core::Result<_>>()?;

    for name in &wanted {
        if !suggestions.iter().any(|s| &s.name == name) {
            note_warn(&format!("'{name}' was not suggested; ignoring"));
        }
    }

    let mut accepted = Vec::new();
    for suggestion in suggestions {
        if !args.accept_all && !wanted.contains(&suggestion.name) {
            continue;
        }
        match registry.accept_suggestion(suggestion) {
            Ok(name) => {
                FormEventLogger::log_event(
                    "cli",
                    FormEvent::SuggestionAccepted {
                        name: name.to_string(),
                        source_text: suggestion.source_text.clone(),
                    },
                );
                accepted.push(name);
            }
            Err(DocfillError::DuplicateName(name)) => {
                note_info(&format!("'{name}' is already a placeholder"));
            }
            Err(e) => return Err(e.into()),
        }
    }
    info!(count = accepted.len(), "Suggestions accepted");
    Ok(accepted)
}

/// Falls back to the unmodified text when the service fails.
async fn rewrite(
    service: &dyn EnrichmentService,
    document: &Document,
    accepted: &[PlaceholderName],
) -> String {
    match service.insert_placeholders(document.content(), accepted).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Placeholder insertion failed; keeping original text");
            FormEventLogger::log_event(
                "cli",
                FormEvent::EnrichmentFallback {
                    operation: "insert_placeholders".to_string(),
                    error: format!("{e:#}"),
                },
            );
            note_warn("Could not insert placeholders; the original text was kept");
            document.content().to_string()
        }
    }
}
