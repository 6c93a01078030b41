//! SQL preview generation from the UI condition tree.
//!
//! The generated text is opaque to this crate: it is handed to the search
//! service as-is. Values are always rendered as single-quoted literals,
//! including for numeric columns, which the target engine accepts.

mod query;
mod where_clause;

#[cfg(test)]
mod query_tests;
#[cfg(test)]
mod where_clause_tests;

pub use query::{generate_sql_query, SqlPreview};
pub use where_clause::{
    generate_where_clause, render_predicate, where_clause_from_json, ColumnTypes, FieldSchema,
};
