//! # `AlertQL` Core
//!
//! Condition trees for alert editors: the nested AND/OR tree a user builds,
//! its backend wire form, and the SQL preview derived from it.
//!
//! ## Features
//!
//! - **Two tree shapes**: UI groups carrying client ids, and the backend's
//!   `{"and": [...]}` / `{"or": [...]}` form, converted both ways
//! - **Fail-closed rendering**: malformed trees produce `{}` or an empty
//!   `WHERE` clause instead of a partial one
//! - **SQL preview**: histogram query with `COUNT(*)`, plain aggregates or
//!   `approx_percentile_cont` for `pNN` functions
//! - **Alert forms**: submission checks, trigger coercion and cron parsing
//!
//! ## Quick Start
//!
//! ```rust
//! use alertql_core::{backend_json_to_ui, ui_json_to_backend, where_clause_from_json};
//! use alertql_core::{ColumnTypes, SequentialIds};
//! use serde_json::json;
//!
//! let ui = json!({
//!     "groupId": "root",
//!     "label": "and",
//!     "items": [{"id": "c1", "column": "age", "operator": ">", "value": 30}]
//! });
//!
//! let backend = ui_json_to_backend(&ui);
//! assert_eq!(backend["and"][0]["column"], "age");
//!
//! let tree = backend_json_to_ui(&backend, &mut SequentialIds::default()).unwrap();
//! assert_eq!(tree.leaf_count(), 1);
//!
//! let clause = where_clause_from_json(&ui, &ColumnTypes::new());
//! assert_eq!(clause, "WHERE age > '30'");
//! ```

#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::float_cmp,
        clippy::manual_assert
    )
)]

pub mod alert;
pub mod condition;
pub mod config;
pub mod cron;
pub mod error;
pub mod sql;

pub use alert::{
    Aggregation, Alert, AlertForm, FormNumber, FrequencyType, HistoryHit, HistoryQuery,
    HistoryResponse, QueryCondition, QueryType, StreamType, TriggerCondition, TriggerForm,
    ValidationError, ValueCondition,
};
pub use condition::{
    backend_json_to_ui, ui_json_to_backend, BackendGroup, BackendNode, ConditionItem,
    Conjunction, EditError, GroupNode, IdGenerator, LeafCondition, Operator, Predicate,
    SequentialIds, UiId, UuidGenerator,
};
pub use config::{AlertqlConfig, ConfigError, EditorConfig, LoggingConfig, SqlConfig};
pub use cron::{validate_cron, CronError, CronExpression};
pub use error::{Error, Result};
pub use sql::{
    generate_sql_query, generate_where_clause, where_clause_from_json, ColumnTypes, FieldSchema,
    SqlPreview,
};
