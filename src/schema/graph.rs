//! Schema graph: tables and columns as an undirected graph.
//!
//! ```text
//!   [1 customers]           [2 orders]
//!        |  contains            |  contains
//!   (3 id) ---- references ---- (5 customer_id)
//!   (4 name)                    (6 total)
//! ```
//!
//! Node identities are plain integers. Tables take `1..=N` in input order,
//! columns continue from `N + 1` in table-then-column order, so a rebuild from
//! the same facts yields the same identities and the same edge sets.

use crate::schema::facts::TableFact;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;

/// Node identity.
pub type NodeId = u32;

/// A table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableNode {
    pub id: NodeId,
    pub table_name: String,
}

/// A column, owned by exactly one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnNode {
    pub id: NodeId,
    pub column_name: String,
    pub column_type: String,
    pub is_optional: bool,
}

/// Graph node weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaNode {
    Table(TableNode),
    Column(ColumnNode),
}

impl SchemaNode {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Table(table) => table.id,
            Self::Column(column) => column.id,
        }
    }

    pub fn as_table(&self) -> Option<&TableNode> {
        match self {
            Self::Table(table) => Some(table),
            Self::Column(_) => None,
        }
    }

    pub fn as_column(&self) -> Option<&ColumnNode> {
        match self {
            Self::Column(column) => Some(column),
            Self::Table(_) => None,
        }
    }
}

/// Graph edge weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaEdge {
    /// Table -> one of its columns
    Contains,
    /// Column <-> column it references (foreign key)
    References,
}

/// Edge in the exported form.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: SchemaEdge,
}

/// Serializable snapshot of a schema graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphExport {
    pub tables: usize,
    pub columns: usize,
    pub nodes: Vec<SchemaNode>,
    pub edges: Vec<ExportedEdge>,
}

/// Discovered database structure.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    graph: UnGraph<SchemaNode, SchemaEdge>,

    /// NodeId -> petgraph index
    nodes: HashMap<NodeId, NodeIndex>,

    /// First table registered under each name
    tables_by_name: HashMap<String, NodeId>,

    /// Canonical `(table, column) -> column id` index
    columns_by_key: HashMap<(String, String), NodeId>,

    /// Resolved foreign keys as `(owning column, referenced column)`
    foreign_keys: BTreeSet<(NodeId, NodeId)>,

    table_count: usize,
}

impl SchemaGraph {
    /// Build a graph from table facts.
    ///
    /// # Algorithm
    ///
    /// 1. Table nodes get identities `1..=N` in input order
    /// 2. Column identities start at `N + 1`
    /// 3. Each column gets a containment edge to its table and an entry in
    ///    the canonical `(table, column)` index
    /// 4. Second pass: every foreign key resolved through the index on both
    ///    sides becomes a reference edge; unresolved ones are dropped
    pub fn from_facts(tables: &[TableFact]) -> Self {
        let column_total: usize = tables.iter().map(|t| t.columns.len()).sum();
        let mut graph = UnGraph::with_capacity(tables.len() + column_total, column_total);
        let mut nodes = HashMap::with_capacity(tables.len() + column_total);
        let mut tables_by_name = HashMap::with_capacity(tables.len());
        let mut columns_by_key = HashMap::with_capacity(column_total);

        let mut table_indices = Vec::with_capacity(tables.len());
        for (position, table) in tables.iter().enumerate() {
            let id = position as NodeId + 1;
            let index = graph.add_node(SchemaNode::Table(TableNode {
                id,
                table_name: table.table_name.clone(),
            }));
            nodes.insert(id, index);
            tables_by_name.entry(table.table_name.clone()).or_insert(id);
            table_indices.push(index);
        }

        let mut next_column_id = tables.len() as NodeId + 1;
        for (table, &table_index) in tables.iter().zip(&table_indices) {
            for column in &table.columns {
                let id = next_column_id;
                next_column_id += 1;

                let index = graph.add_node(SchemaNode::Column(ColumnNode {
                    id,
                    column_name: column.column_name.clone(),
                    column_type: column.column_type.clone(),
                    is_optional: column.is_optional,
                }));
                nodes.insert(id, index);
                graph.add_edge(table_index, index, SchemaEdge::Contains);
                columns_by_key.insert(
                    (table.table_name.clone(), column.column_name.clone()),
                    id,
                );
            }
        }

        let mut schema = Self {
            graph,
            nodes,
            tables_by_name,
            columns_by_key,
            foreign_keys: BTreeSet::new(),
            table_count: tables.len(),
        };

        for table in tables {
            for column in &table.columns {
                let Some(reference) = &column.foreign_key_reference else {
                    continue;
                };

                let owner = schema.column_id(&table.table_name, &column.column_name);
                let target = schema.column_id(&reference.table, &reference.column);

                match (owner, target) {
                    (Some(owner), Some(target)) => schema.add_reference(owner, target),
                    _ => tracing::debug!(
                        table = %table.table_name,
                        column = %column.column_name,
                        referenced_table = %reference.table,
                        referenced_column = %reference.column,
                        "Dropping unresolved foreign key reference"
                    ),
                }
            }
        }

        schema
    }

    fn add_reference(&mut self, owner: NodeId, target: NodeId) {
        self.foreign_keys.insert((owner, target));
        let (a, b) = (self.nodes[&owner], self.nodes[&target]);
        self.graph.update_edge(a, b, SchemaEdge::References);
    }

    /// `true` if no tables were discovered.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn table_count(&self) -> usize {
        self.table_count
    }

    pub fn column_count(&self) -> usize {
        self.graph.node_count() - self.table_count
    }

    /// Look up a node by identity.
    pub fn node(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(&id).map(|&index| &self.graph[index])
    }

    /// Tables in identity order.
    pub fn tables(&self) -> impl Iterator<Item = &TableNode> {
        self.graph.node_weights().filter_map(SchemaNode::as_table)
    }

    /// Columns in identity order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnNode> {
        self.graph.node_weights().filter_map(SchemaNode::as_column)
    }

    /// Identity of a table by exact name.
    pub fn table_id(&self, table_name: &str) -> Option<NodeId> {
        self.tables_by_name.get(table_name).copied()
    }

    /// Identity of a column through the canonical index.
    pub fn column_id(&self, table_name: &str, column_name: &str) -> Option<NodeId> {
        self.columns_by_key
            .get(&(table_name.to_string(), column_name.to_string()))
            .copied()
    }

    /// Neighbours of `id` joined by edges of `kind`, in identity order.
    fn neighbors_by(&self, id: NodeId, kind: SchemaEdge) -> Vec<&SchemaNode> {
        let Some(&index) = self.nodes.get(&id) else {
            return Vec::new();
        };

        let mut found: Vec<&SchemaNode> = self
            .graph
            .edges(index)
            .filter(|edge| *edge.weight() == kind)
            .map(|edge| {
                let other = if edge.source() == index {
                    edge.target()
                } else {
                    edge.source()
                };
                &self.graph[other]
            })
            .collect();
        found.sort_by_key(|node| node.id());
        found.dedup_by_key(|node| node.id());
        found
    }

    /// Columns directly contained by a table.
    pub fn columns_of(&self, table_id: NodeId) -> Vec<&ColumnNode> {
        self.neighbors_by(table_id, SchemaEdge::Contains)
            .into_iter()
            .filter_map(SchemaNode::as_column)
            .collect()
    }

    /// Table that owns a column.
    pub fn owning_table(&self, column_id: NodeId) -> Option<&TableNode> {
        self.neighbors_by(column_id, SchemaEdge::Contains)
            .into_iter()
            .find_map(SchemaNode::as_table)
    }

    /// Columns joined to `column_id` by a reference edge.
    pub fn references_of(&self, column_id: NodeId) -> Vec<&ColumnNode> {
        self.neighbors_by(column_id, SchemaEdge::References)
            .into_iter()
            .filter_map(SchemaNode::as_column)
            .collect()
    }

    /// Columns that `column_id` references through its own foreign key.
    pub fn foreign_keys_of(&self, column_id: NodeId) -> Vec<&ColumnNode> {
        self.foreign_keys
            .range((column_id, NodeId::MIN)..=(column_id, NodeId::MAX))
            .filter_map(|&(_, target)| self.node(target).and_then(SchemaNode::as_column))
            .collect()
    }

    fn edge_set(&self, kind: SchemaEdge) -> BTreeSet<(NodeId, NodeId)> {
        self.graph
            .edge_references()
            .filter(|edge| *edge.weight() == kind)
            .map(|edge| {
                let a = self.graph[edge.source()].id();
                let b = self.graph[edge.target()].id();
                (a.min(b), a.max(b))
            })
            .collect()
    }

    /// Containment edges as `(table id, column id)`.
    pub fn containment_edges(&self) -> BTreeSet<(NodeId, NodeId)> {
        self.edge_set(SchemaEdge::Contains)
    }

    /// Reference edges as `(lower id, higher id)`.
    pub fn reference_edges(&self) -> BTreeSet<(NodeId, NodeId)> {
        self.edge_set(SchemaEdge::References)
    }

    /// Human-readable listing of tables, columns and references.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} tables, {} columns, {} references",
            self.table_count(),
            self.column_count(),
            self.reference_edges().len()
        );

        for table in self.tables() {
            let _ = writeln!(out, "{}", table.table_name);
            for column in self.columns_of(table.id) {
                let optional = if column.is_optional { "?" } else { "" };
                let _ = write!(out, "  {} {}{}", column.column_name, column.column_type, optional);
                for target in self.foreign_keys_of(column.id) {
                    if let Some(owner) = self.owning_table(target.id) {
                        let _ = write!(out, " -> {}.{}", owner.table_name, target.column_name);
                    }
                }
                out.push('\n');
            }
        }

        out
    }

    /// Snapshot for JSON output.
    pub fn export(&self) -> GraphExport {
        let mut nodes: Vec<SchemaNode> = self.graph.node_weights().cloned().collect();
        nodes.sort_by_key(SchemaNode::id);

        let mut edges: Vec<ExportedEdge> = self
            .containment_edges()
            .into_iter()
            .map(|(source, target)| ExportedEdge {
                source,
                target,
                kind: SchemaEdge::Contains,
            })
            .collect();
        edges.extend(
            self.reference_edges()
                .into_iter()
                .map(|(source, target)| ExportedEdge {
                    source,
                    target,
                    kind: SchemaEdge::References,
                }),
        );

        GraphExport {
            tables: self.table_count(),
            columns: self.column_count(),
            nodes,
            edges,
        }
    }
}
