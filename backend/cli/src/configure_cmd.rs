//! `docfill configure`: set one placeholder's type, requiredness and
//! dependencies in an existing template.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use docfill_core::{FieldConfig, FieldKind, PlaceholderName, Template};
use docfill_logging::{FormEvent, FormEventLogger};

use crate::terminal_output::{note_info, note_success, registry_table};

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Template artifact to edit in place
    pub template: PathBuf,

    /// Placeholder name, with or without `${}`
    pub name: String,

    /// Field type: Text, Number, Date, Dropdown, Checkbox (keeps the current type if omitted)
    #[arg(long = "type", value_name = "KIND")]
    pub kind: Option<FieldKind>,

    #[arg(long)]
    pub required: bool,

    /// Show the field only when its dependencies are filled
    #[arg(long)]
    pub conditional: bool,

    /// Parent placeholder (repeatable; all must be filled). Implies --conditional
    #[arg(long = "depends-on", value_name = "NAME")]
    pub depends_on: Vec<String>,

    /// Allowed Dropdown choice (repeatable; keeps current options if omitted)
    #[arg(long = "option", value_name = "OPTION")]
    pub options: Vec<String>,

    /// Add the placeholder if it is not in the template yet
    #[arg(long)]
    pub add: bool,
}

pub async fn run(args: ConfigureArgs) -> Result<()> {
    let template = Template::load(&args.template).await?;
    let mut registry = template.into_registry();

    let name = PlaceholderName::parse(&args.name)?;
    let parents = args
        .depends_on
        .iter()
        .map(|raw| PlaceholderName::parse(raw))
        .collect::<docfill_core::Result<Vec<_>>>()?;

    let current = registry.get(&name).cloned();
    let mut config = FieldConfig::new(
        args.kind
            .or(current.as_ref().map(|c| c.kind))
            .unwrap_or_default(),
    )
    .required(args.required);
    if args.conditional || !parents.is_empty() {
        config = config.depends_on(parents);
    }
    config.options = if args.options.is_empty() {
        current.map(|c| c.options).unwrap_or_default()
    } else {
        args.options.clone()
    };

    if args.add && !registry.contains(&name) {
        registry.add(name.clone(), config.clone())?;
        note_info(&format!("Added placeholder {}", name.delimited()));
    } else {
        registry.set_config(&name, config.clone())?;
    }

    FormEventLogger::log_event(
        "cli",
        FormEvent::FieldConfigured {
            name: name.to_string(),
            kind: config.kind.to_string(),
            required: config.required,
            conditional: config.is_conditional,
            depends_on: config.dependent_on.iter().map(|d| d.to_string()).collect(),
        },
    );

    let template = registry.finalize();
    template.save(&args.template).await?;

    print!("{}", registry_table(template.registry()));
    note_success(&format!("Updated {} in {}", name.delimited(), args.template.display()));
    Ok(())
}
