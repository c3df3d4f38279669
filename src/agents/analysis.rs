//! Question analysis against the schema graph.
//!
//! Matching is plain substring search on lowercase text: a table matches when
//! its name, its name without trailing `s`, or its name plus `s` appears in
//! the question. Columns of a matched table match when their name appears.

use crate::schema::SchemaGraph;
use serde::Serialize;

/// A column named in the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMatch {
    pub name: String,
    pub column_type: String,
}

/// A table named in the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMatch {
    pub name: String,
    pub columns: Vec<ColumnMatch>,
}

/// Structural hints for one question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphAnalysis {
    pub tables: Vec<TableMatch>,

    /// Foreign keys leaving matched tables, as `owner.column -> target.column`
    pub relationships: Vec<String>,
}

impl GraphAnalysis {
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

fn mentions_table(question: &str, table_name: &str) -> bool {
    let name = table_name.to_lowercase();
    let stem = name.trim_end_matches('s');

    question.contains(&name)
        || (!stem.is_empty() && question.contains(stem))
        || question.contains(&format!("{}s", name))
}

/// Find tables, columns and relationships the question refers to.
pub fn analyze_question(graph: &SchemaGraph, question: &str) -> GraphAnalysis {
    let question = question.to_lowercase();
    let mut analysis = GraphAnalysis::default();

    for table in graph.tables() {
        if !mentions_table(&question, &table.table_name) {
            continue;
        }
        tracing::debug!(table = %table.table_name, "Found relevant table");

        let mut matched = TableMatch {
            name: table.table_name.clone(),
            columns: Vec::new(),
        };

        for column in graph.columns_of(table.id) {
            if question.contains(&column.column_name.to_lowercase()) {
                tracing::debug!(table = %table.table_name, column = %column.column_name, "Found relevant column");
                matched.columns.push(ColumnMatch {
                    name: column.column_name.clone(),
                    column_type: column.column_type.clone(),
                });
            }

            for target in graph.foreign_keys_of(column.id) {
                if let Some(referenced) = graph.owning_table(target.id) {
                    analysis.relationships.push(format!(
                        "{}.{} -> {}.{}",
                        table.table_name, column.column_name, referenced.table_name, target.column_name
                    ));
                }
            }
        }

        analysis.tables.push(matched);
    }

    analysis
}

/// Prompt carrying the analysis ahead of the question.
pub fn enhanced_prompt(analysis: &GraphAnalysis, question: &str) -> String {
    let relationships = if analysis.relationships.is_empty() {
        "none found".to_string()
    } else {
        analysis.relationships.join(", ")
    };

    format!(
        "Database Structure Analysis:\n- Available Tables: {:?}\n- Table Relationships: {}\n\nUser Question: {}\n\nUse this structural information to form an accurate query.",
        analysis.table_names(),
        relationships,
        question
    )
}
