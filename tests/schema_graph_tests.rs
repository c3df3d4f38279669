//! Schema graph construction properties.

use dbtalk::schema::{parse_schema_payload, ColumnFact, SchemaGraph, TableFact};
use proptest::prelude::*;
use std::collections::BTreeSet;

mod support;

type RawColumn = (String, bool, Option<(usize, usize)>);

fn facts_strategy() -> impl Strategy<Value = Vec<TableFact>> {
    let column = ("[a-z]{1,6}", any::<bool>(), proptest::option::of((0usize..8, 0usize..8)));
    let table = ("[a-z]{1,6}", prop::collection::vec(column, 0..5));

    prop::collection::vec(table, 0..6).prop_map(|tables: Vec<(String, Vec<RawColumn>)>| {
        let names: Vec<String> = tables.iter().map(|(name, _)| name.clone()).collect();
        let columns: Vec<Vec<String>> = tables
            .iter()
            .map(|(_, cols)| cols.iter().map(|(name, _, _)| name.clone()).collect())
            .collect();

        tables
            .iter()
            .map(|(name, cols)| TableFact {
                table_name: name.clone(),
                columns: cols
                    .iter()
                    .map(|(col, optional, fk)| {
                        let fact = ColumnFact::new(col, "INTEGER", *optional);
                        match fk {
                            // Some targets resolve, some point past the end and dangle.
                            Some((t, c)) if *t < names.len() && *c < columns[*t].len() => {
                                fact.references(&names[*t], &columns[*t][*c])
                            }
                            Some((t, c)) => fact.references(&format!("missing{}", t), &format!("col{}", c)),
                            None => fact,
                        }
                    })
                    .collect(),
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn rebuild_is_idempotent(facts in facts_strategy()) {
        let a = SchemaGraph::from_facts(&facts);
        let b = SchemaGraph::from_facts(&facts);

        prop_assert_eq!(a.node_count(), b.node_count());
        prop_assert_eq!(a.containment_edges(), b.containment_edges());
        prop_assert_eq!(a.reference_edges(), b.reference_edges());
    }

    #[test]
    fn identities_follow_table_then_column_order(facts in facts_strategy()) {
        let graph = SchemaGraph::from_facts(&facts);
        let tables = facts.len() as u32;
        let columns: u32 = facts.iter().map(|t| t.columns.len() as u32).sum();

        let table_ids: Vec<u32> = graph.tables().map(|t| t.id).collect();
        let column_ids: Vec<u32> = graph.columns().map(|c| c.id).collect();
        prop_assert_eq!(table_ids, (1..=tables).collect::<Vec<_>>());
        prop_assert_eq!(column_ids, (tables + 1..=tables + columns).collect::<Vec<_>>());
    }

    #[test]
    fn every_column_has_one_owner(facts in facts_strategy()) {
        let graph = SchemaGraph::from_facts(&facts);
        let contained: Vec<u32> = graph.containment_edges().iter().map(|&(_, column)| column).collect();
        let unique: BTreeSet<u32> = contained.iter().copied().collect();

        prop_assert_eq!(contained.len(), graph.column_count());
        prop_assert_eq!(unique.len(), graph.column_count());
        for column in graph.columns() {
            prop_assert!(graph.owning_table(column.id).is_some());
        }
    }

    #[test]
    fn reference_edges_join_columns(facts in facts_strategy()) {
        let graph = SchemaGraph::from_facts(&facts);
        let first_column = facts.len() as u32 + 1;

        for (a, b) in graph.reference_edges() {
            prop_assert!(a >= first_column && b >= first_column);
        }
    }
}

#[test]
fn foreign_key_between_present_tables_adds_reference() {
    let graph = SchemaGraph::from_facts(&parse_schema_payload(support::SHOP_FACTS).unwrap());

    let customer_id = graph.column_id("orders", "customer_id").unwrap();
    let id = graph.column_id("customers", "id").unwrap();
    assert_eq!(
        graph.reference_edges(),
        BTreeSet::from([(id.min(customer_id), id.max(customer_id))])
    );

    let targets: Vec<_> = graph.references_of(customer_id).iter().map(|c| c.id).collect();
    assert_eq!(targets, vec![id]);
    assert!(graph.summary().contains("customer_id INTEGER -> customers.id"));
}

#[test]
fn foreign_key_to_absent_table_is_dropped() {
    let facts = vec![TableFact {
        table_name: "orders".into(),
        columns: vec![
            ColumnFact::new("id", "INTEGER", false),
            ColumnFact::new("customer_id", "INTEGER", false).references("customers", "id"),
        ],
    }];
    let graph = SchemaGraph::from_facts(&facts);

    assert_eq!(graph.table_count(), 1);
    assert_eq!(graph.column_count(), 2);
    assert!(graph.reference_edges().is_empty());
}

#[test]
fn export_serializes_typed_nodes_and_edges() {
    let graph = SchemaGraph::from_facts(&parse_schema_payload(support::SHOP_FACTS).unwrap());
    let json = serde_json::to_value(graph.export()).unwrap();

    assert_eq!(json["tables"], 2);
    assert_eq!(json["columns"], 4);
    assert_eq!(json["nodes"][0]["kind"], "table");
    assert_eq!(json["nodes"][0]["table_name"], "customers");
    assert_eq!(json["nodes"][2]["kind"], "column");
    assert_eq!(json["edges"].as_array().unwrap().len(), 5);
}
