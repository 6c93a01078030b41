//! `alertql` - convert, render and validate alert condition trees.

use std::path::PathBuf;

use alertql_cli::EditAction;
use alertql_core::{AlertqlConfig, Conjunction};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// AlertQL - alert condition trees from the command line
#[derive(Parser, Debug)]
#[command(name = "alertql")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file; missing files fall back to defaults
    #[arg(short, long, default_value = "alertql.toml", env = "ALERTQL_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a UI condition tree to the backend form
    ToBackend {
        /// JSON file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Convert a backend condition tree to the UI form
    FromBackend {
        /// JSON file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Use `<prefix>-1`, `<prefix>-2`, ... instead of random UUIDs
        #[arg(long)]
        id_prefix: Option<String>,
    },
    /// Print a blank alert form
    NewForm {
        /// Use `<prefix>-1`, `<prefix>-2`, ... instead of random UUIDs
        #[arg(long)]
        id_prefix: Option<String>,
    },
    /// Apply one edit to a UI condition tree
    Edit {
        /// What to do
        #[arg(long, value_enum)]
        action: ActionArg,
        /// Id of the group (or, for `remove`, the item) to edit
        #[arg(long)]
        target: String,
        /// Label of a group added with `add-group`
        #[arg(long, default_value = "and", value_parser = parse_label)]
        label: Conjunction,
        /// Use `<prefix>-1`, `<prefix>-2`, ... instead of random UUIDs
        #[arg(long)]
        id_prefix: Option<String>,
        /// JSON file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Render a UI condition tree as a WHERE clause
    Where {
        /// JSON file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Column schema JSON (`{"column": {"type": "Int64"}}`)
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Build the preview query of an alert form
    Sql {
        /// Alert form JSON file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Column schema JSON
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Validate an alert form and print the payload to submit
    Validate {
        /// Alert form JSON file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Recorded as the last editor
        #[arg(long, default_value = "")]
        editor: String,
    },
    /// Check a cron expression and print it normalized
    Cron {
        /// Six or seven field expression
        expression: String,
    },
    /// Print the effective configuration
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    AddCondition,
    AddGroup,
    Toggle,
    Remove,
}

fn parse_label(label: &str) -> Result<Conjunction, String> {
    Conjunction::parse(label).ok_or_else(|| format!("expected `and` or `or`, got `{label}`"))
}

fn init_tracing(config: &AlertqlConfig) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AlertqlConfig::load_from(&args.config)?;
    init_tracing(&config);
    tracing::debug!(command = ?args.command, "Running command");

    let output = match args.command {
        Command::ToBackend { input } => alertql_cli::to_backend(&alertql_cli::read_json(&input)?)?,
        Command::FromBackend { input, id_prefix } => alertql_cli::from_backend(
            &alertql_cli::read_json(&input)?,
            id_prefix.as_deref(),
        )?,
        Command::NewForm { id_prefix } => alertql_cli::new_form(&config, id_prefix.as_deref())?,
        Command::Edit {
            action,
            target,
            label,
            id_prefix,
            input,
        } => {
            let action = match action {
                ActionArg::AddCondition => EditAction::AddCondition,
                ActionArg::AddGroup => EditAction::AddGroup(label),
                ActionArg::Toggle => EditAction::Toggle,
                ActionArg::Remove => EditAction::Remove,
            };
            alertql_cli::edit(
                &alertql_cli::read_json(&input)?,
                action,
                &target,
                &config,
                id_prefix.as_deref(),
            )?
        }
        Command::Where { input, schema } => {
            let column_types = alertql_cli::read_schema(schema.as_deref())?;
            alertql_cli::where_clause(&alertql_cli::read_json(&input)?, &column_types)
        }
        Command::Sql { input, schema } => {
            let column_types = alertql_cli::read_schema(schema.as_deref())?;
            alertql_cli::sql(&alertql_cli::read_json(&input)?, &column_types, &config)?
        }
        Command::Validate { input, editor } => {
            alertql_cli::validate(&alertql_cli::read_json(&input)?, &editor)?
        }
        Command::Cron { expression } => alertql_cli::cron(&expression)?,
        Command::Config => alertql_cli::show_config(&config)?,
    };

    println!("{output}");
    Ok(())
}
