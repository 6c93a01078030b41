//! Command implementations behind the `alertql` binary.
//!
//! Every command reads its input (a file path, or `-` for stdin) and
//! returns the text to print, so the binary only handles arguments and
//! exit codes.

use std::io::Read;
use std::path::Path;

use alertql_core::{
    backend_json_to_ui, ui_json_to_backend, where_clause_from_json, AlertForm, AlertqlConfig,
    ColumnTypes, Conjunction, CronExpression, GroupNode, IdGenerator, SequentialIds, SqlPreview,
    UiId, UuidGenerator,
};
use anyhow::{Context, Result};
use serde_json::Value;

/// Reads `path`, or stdin when `path` is `-`.
pub fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
    }
}

/// Reads and parses a JSON document.
pub fn read_json(path: &str) -> Result<Value> {
    let text = read_input(path)?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {path}"))
}

/// Reads a column schema (`{"column": {"type": "Int64"}}`), or an empty
/// one when no path is given.
pub fn read_schema(path: Option<&Path>) -> Result<ColumnTypes> {
    let Some(path) = path else {
        return Ok(ColumnTypes::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid schema in {}", path.display()))
}

/// Edit applied to a UI tree by [`edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    /// Append a blank condition to the target group.
    AddCondition,
    /// Append a nested group with the given label to the target group.
    AddGroup(Conjunction),
    /// Flip the target group between AND and OR.
    Toggle,
    /// Remove the target leaf or group.
    Remove,
}

/// Runs `f` with random UUIDs, or sequential ids when `id_prefix` is given.
fn with_ids<T>(id_prefix: Option<&str>, f: impl FnOnce(&mut dyn IdGenerator) -> T) -> T {
    match id_prefix {
        Some(prefix) => f(&mut SequentialIds::new(prefix)),
        None => f(&mut UuidGenerator),
    }
}

/// A blank alert form whose root group uses the configured label.
pub fn new_form(config: &AlertqlConfig, id_prefix: Option<&str>) -> Result<String> {
    let form = with_ids(id_prefix, |ids| AlertForm::new(config.editor.root_label, ids));
    Ok(serde_json::to_string_pretty(&form)?)
}

/// Applies one edit to a UI tree and prints the result.
///
/// New groups are limited to the configured nesting depth.
pub fn edit(
    ui: &Value,
    action: EditAction,
    target: &str,
    config: &AlertqlConfig,
    id_prefix: Option<&str>,
) -> Result<String> {
    let mut tree = GroupNode::from_json(ui).context("Input is not a valid condition tree")?;
    let target = UiId::new(target);

    with_ids(id_prefix, |ids| -> Result<()> {
        match action {
            EditAction::AddCondition => {
                let id = tree
                    .add_condition(&target, ids)
                    .map_err(alertql_core::Error::from)?;
                tracing::debug!(%id, "Added condition");
            }
            EditAction::AddGroup(label) => {
                let id = tree
                    .add_group(&target, label, config.editor.max_group_depth, ids)
                    .map_err(alertql_core::Error::from)?;
                tracing::debug!(%id, "Added group");
            }
            EditAction::Toggle => {
                tree.toggle_label(&target)
                    .map_err(alertql_core::Error::from)?;
            }
            EditAction::Remove => {
                anyhow::ensure!(tree.remove_item(&target), "No item with id `{target}`");
            }
        }
        Ok(())
    })?;

    Ok(serde_json::to_string_pretty(&tree)?)
}

/// UI tree to backend tree. Malformed trees print `{}`.
pub fn to_backend(ui: &Value) -> Result<String> {
    let backend = ui_json_to_backend(ui);
    if backend.as_object().is_some_and(serde_json::Map::is_empty) {
        tracing::warn!("Condition tree is malformed or empty");
    }
    Ok(serde_json::to_string_pretty(&backend)?)
}

/// Backend tree to UI tree. Ids are random UUIDs unless `id_prefix` is
/// given. Anything other than a single `and`/`or` root prints `null`.
pub fn from_backend(backend: &Value, id_prefix: Option<&str>) -> Result<String> {
    let tree = with_ids(id_prefix, |ids| backend_json_to_ui(backend, ids));
    if tree.is_none() {
        tracing::warn!("Backend tree must have exactly one `and` or `or` key");
    }
    Ok(serde_json::to_string_pretty(&tree)?)
}

/// WHERE clause of a UI tree; empty when the tree is incomplete.
#[must_use]
pub fn where_clause(ui: &Value, column_types: &ColumnTypes) -> String {
    where_clause_from_json(ui, column_types)
}

/// Preview query of an alert form.
pub fn sql(form: &Value, column_types: &ColumnTypes, config: &AlertqlConfig) -> Result<String> {
    let form = AlertForm::from_json(form)
        .map_err(alertql_core::Error::from)
        .context("Input is not an alert form")?;
    Ok(SqlPreview::new(config.sql.clone()).query(&form, column_types))
}

/// Validates an alert form and prints the payload it submits.
pub fn validate(form: &Value, editor: &str) -> Result<String> {
    let payload = AlertForm::from_json(form)
        .and_then(|form| form.into_payload(editor))
        .map_err(alertql_core::Error::from)
        .map_err(|err| anyhow::anyhow!(err.user_message()))?;
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Normalized form of a cron expression.
pub fn cron(expression: &str) -> Result<String> {
    let parsed = CronExpression::parse(expression)?;
    Ok(parsed.to_string())
}

/// Effective configuration as TOML.
pub fn show_config(config: &AlertqlConfig) -> Result<String> {
    Ok(config.to_toml()?)
}
