//! Contract tests for SELECT binding.
//!
//! These tests verify:
//! - Wildcard expansion order, visibility and display names
//! - Fail-fast ordering of table, projection and predicate resolution
//! - Join chain shape and per-join predicates

use std::sync::Arc;

use selbind::binder::{
    bind_select, AmbiguityPolicy, ArithmeticOp, BinderConfig, ExprKind, Expression, FilterObj, SelectBinder,
};
use selbind::catalog::{Catalog, Database, FieldMeta, TableMeta};
use selbind::parser::ast::{CompOp, ConditionSqlNode, InnerJoinSqlNode, RelAttrSqlNode, SelectSqlNode};
use selbind::types::{DataType, Value};
use selbind::{Clause, SelbindError};

use super::{create_test_db, CountingBuilder};

fn id_join(left: &str, right: &str) -> Vec<ConditionSqlNode> {
    vec![ConditionSqlNode::attr_attr(
        RelAttrSqlNode::qualified(left, "id"),
        CompOp::Eq,
        RelAttrSqlNode::qualified(right, "id"),
    )]
}

#[test]
fn test_single_table_star_uses_bare_names() {
    // Contract: `*` over one table yields its visible user fields, bare-named
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("", "*"))
        .from(InnerJoinSqlNode::new("t2"));

    let stmt = bind_select(&db, &select).unwrap();

    assert_eq!(stmt.column_names(), vec!["id", "b"]);
    for expr in stmt.projects() {
        assert_eq!(expr.kind(), ExprKind::Field);
        assert!(expr.as_field().unwrap().is_resolved());
    }
}

#[test]
fn test_two_table_star_uses_qualified_names_in_from_order() {
    // Contract: `*` over a join yields t1's fields then t2's, each `table.field`
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("*", "*"))
        .from(InnerJoinSqlNode::new("t1").join("t2", id_join("t1", "t2")));

    let stmt = bind_select(&db, &select).unwrap();

    assert_eq!(stmt.column_names(), vec!["t1.id", "t1.a", "t2.id", "t2.b"]);
}

#[test]
fn test_scoped_wildcard_expands_only_that_table() {
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("t1", "*"))
        .from(InnerJoinSqlNode::new("t1"))
        .from(InnerJoinSqlNode::new("t2"));

    let stmt = bind_select(&db, &select).unwrap();

    assert_eq!(stmt.column_names(), vec!["t1.id", "t1.a"]);
}

#[test]
fn test_scoped_wildcard_outside_from_rejected() {
    // Contract: `t3.*` with t3 in the catalog but not in FROM is FieldMissing
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("t3", "*"))
        .from(InnerJoinSqlNode::new("t1"))
        .from(InnerJoinSqlNode::new("t2"));

    let err = bind_select(&db, &select).unwrap_err();

    assert_eq!(
        err,
        SelbindError::FieldMissing {
            table: "t3".into(),
            field: "*".into(),
            clause: Clause::Select,
        }
    );
}

#[test]
fn test_wildcard_inside_arithmetic_is_field_missing() {
    // Contract: `t1.a + *` is a user error, not an internal one
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::arithmetic(
            Expression::column("t1", "a"),
            ArithmeticOp::Add,
            Expression::column("", "*"),
        ))
        .from(InnerJoinSqlNode::new("t1"));

    let err = bind_select(&db, &select).unwrap_err();

    assert!(!err.is_internal());
    assert_eq!(
        err,
        SelbindError::FieldMissing {
            table: String::new(),
            field: "*".into(),
            clause: Clause::Select,
        }
    );
}

#[test]
fn test_unknown_table_fails_before_projection_and_predicates() {
    // Contract: table resolution precedes projection and filter work
    let db = create_test_db();
    let counter = CountingBuilder::default();
    let select = SelectSqlNode::new()
        .project(Expression::column("nowhere", "*"))
        .from(InnerJoinSqlNode::new("t1").join("t2", id_join("t1", "t2")))
        .from(InnerJoinSqlNode::new("missing"))
        .filter(ConditionSqlNode::attr_value(
            RelAttrSqlNode::qualified("t1", "a"),
            CompOp::Gt,
            Value::Int64(0),
        ));

    let err = SelectBinder::new(&db)
        .with_predicate_builder(&counter)
        .bind(&select)
        .unwrap_err();

    assert_eq!(
        err,
        SelbindError::TableNotFound {
            table: "missing".into(),
            clause: Clause::From,
        }
    );
    // Only the join predicate that preceded the bad relation was built.
    assert_eq!(counter.calls.get(), 1);
}

#[test]
fn test_unknown_join_table_reports_join_clause() {
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("", "*"))
        .from(InnerJoinSqlNode::new("t1").join("nope", vec![]));

    let err = bind_select(&db, &select).unwrap_err();

    assert_eq!(
        err,
        SelbindError::TableNotFound {
            table: "nope".into(),
            clause: Clause::Join,
        }
    );
}

#[test]
fn test_join_shape_mismatch_aborts_before_predicates() {
    // Contract: 2 join relations with 1 condition list is an internal error
    let db = create_test_db();
    let counter = CountingBuilder::default();
    let malformed = InnerJoinSqlNode {
        base_relation: "t1".into(),
        join_relations: vec!["t2".into(), "t3".into()],
        conditions: vec![id_join("t1", "t2")],
    };
    let select = SelectSqlNode::new()
        .project(Expression::column("", "*"))
        .from(InnerJoinSqlNode::new("t2").join("t1", id_join("t2", "t1")))
        .from(malformed);

    let err = SelectBinder::new(&db)
        .with_predicate_builder(&counter)
        .bind(&select)
        .unwrap_err();

    assert!(err.is_internal());
    assert_eq!(
        err,
        SelbindError::MalformedJoinShape {
            relation: "t1".into(),
            join_relations: 2,
            condition_lists: 1,
        }
    );
    assert_eq!(counter.calls.get(), 0);
}

#[test]
fn test_each_join_step_owns_its_predicate() {
    let db = create_test_db();
    let t3_cond = vec![ConditionSqlNode::attr_value(
        RelAttrSqlNode::qualified("t3", "x"),
        CompOp::Lt,
        Value::Float64(1.5),
    )];
    let select = SelectSqlNode::new()
        .project(Expression::column("t3", "x"))
        .from(
            InnerJoinSqlNode::new("t1")
                .join("t2", id_join("t1", "t2"))
                .join("t3", t3_cond),
        );

    let stmt = bind_select(&db, &select).unwrap();

    let chain = &stmt.join_tables()[0];
    let joined: Vec<&str> = chain.joins().iter().map(|j| j.table.name.as_str()).collect();
    assert_eq!(joined, vec!["t2", "t3"]);

    match &chain.joins()[1].filter.units()[0].left {
        FilterObj::Field(field) => assert_eq!(field.table.name, "t3"),
        FilterObj::Value(_) => panic!("Expected field operand"),
    }
    assert!(Arc::ptr_eq(
        &chain.joins()[0].table,
        &db.find_table("t2").unwrap()
    ));
}

#[test]
fn test_join_predicate_default_table_is_chain_base() {
    let db = create_test_db();
    let on = vec![ConditionSqlNode::attr_attr(
        RelAttrSqlNode::new("id"),
        CompOp::Eq,
        RelAttrSqlNode::qualified("t2", "id"),
    )];
    let select = SelectSqlNode::new()
        .project(Expression::column("t2", "b"))
        .from(InnerJoinSqlNode::new("t1").join("t2", on));

    let stmt = bind_select(&db, &select).unwrap();

    match &stmt.join_tables()[0].joins()[0].filter.units()[0].left {
        FilterObj::Field(field) => assert_eq!(field.table.name, "t1"),
        FilterObj::Value(_) => panic!("Expected field operand"),
    }
}

#[test]
fn test_rebinding_same_node_is_idempotent() {
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("", "*"))
        .project(Expression::column("t2", "b"))
        .from(InnerJoinSqlNode::new("t1").join("t2", id_join("t1", "t2")))
        .filter(ConditionSqlNode::attr_value(
            RelAttrSqlNode::qualified("t1", "a"),
            CompOp::Ne,
            Value::Null,
        ));

    let first = bind_select(&db, &select).unwrap();
    let second = bind_select(&db, &select).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.column_names(), second.column_names());
}

#[test]
fn test_system_fields_never_expanded() {
    // Contract: system prefix is skipped even when flagged visible
    let db = Database::new("test");
    db.create_table(
        TableMeta::with_system_fields(
            "audit",
            vec![
                FieldMeta::new("__rowid", DataType::Int64).unwrap(),
                FieldMeta::new("__version", DataType::Int64).unwrap(),
            ],
            vec![
                FieldMeta::new("event", DataType::String).unwrap(),
                FieldMeta::new("at", DataType::Date).unwrap(),
            ],
        )
        .unwrap(),
    )
    .unwrap();
    let select = SelectSqlNode::new()
        .project(Expression::column("", "*"))
        .project(Expression::column("audit", "*"))
        .from(InnerJoinSqlNode::new("audit"));

    let stmt = bind_select(&db, &select).unwrap();

    assert_eq!(stmt.column_names(), vec!["event", "at", "event", "at"]);
}

#[test]
fn test_system_fields_not_addressable_by_name() {
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("t1", "__trx"))
        .from(InnerJoinSqlNode::new("t1"));

    let err = bind_select(&db, &select).unwrap_err();
    assert!(matches!(err, SelbindError::FieldMissing { .. }));
}

#[test]
fn test_second_table_qualifies_first_tables_names() {
    // Contract: adding a table switches the first table's names to qualified
    let db = create_test_db();
    let single = SelectSqlNode::new()
        .project(Expression::column("t1", "*"))
        .from(InnerJoinSqlNode::new("t1"));
    let double = single.clone().from(InnerJoinSqlNode::new("t3"));

    assert_eq!(bind_select(&db, &single).unwrap().column_names(), vec!["id", "a"]);
    assert_eq!(bind_select(&db, &double).unwrap().column_names(), vec!["t1.id", "t1.a"]);
}

#[test]
fn test_projection_order_matches_source_order() {
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("t2", "b"))
        .project(Expression::column("t1", "*"))
        .project(Expression::field("x"))
        .project(Expression::value(Value::Int64(7)))
        .from(InnerJoinSqlNode::new("t1"))
        .from(InnerJoinSqlNode::new("t2"))
        .from(InnerJoinSqlNode::new("t3"));

    let stmt = bind_select(&db, &select).unwrap();

    assert_eq!(
        stmt.column_names(),
        vec!["t2.b", "t1.id", "t1.a", "t3.x", "7"]
    );
}

#[test]
fn test_ambiguous_unqualified_field_rejected_by_default() {
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::field("id"))
        .from(InnerJoinSqlNode::new("t1"))
        .from(InnerJoinSqlNode::new("t2"));

    let err = bind_select(&db, &select).unwrap_err();

    match err {
        SelbindError::AmbiguousField { field, tables, .. } => {
            assert_eq!(field, "id");
            assert_eq!(tables, vec!["t1", "t2"]);
        }
        other => panic!("Expected AmbiguousField, got {other:?}"),
    }
}

#[test]
fn test_ambiguous_unqualified_field_first_match_policy() {
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::field("id"))
        .from(InnerJoinSqlNode::new("t2"))
        .from(InnerJoinSqlNode::new("t1"));

    let stmt = SelectBinder::new(&db)
        .with_config(BinderConfig::new().with_ambiguity(AmbiguityPolicy::FirstMatch))
        .bind(&select)
        .unwrap();

    assert_eq!(stmt.column_names(), vec!["t2.id"]);
}

#[test]
fn test_hidden_field_addressable_by_name() {
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("", "*"))
        .project(Expression::field("c"))
        .from(InnerJoinSqlNode::new("t2"));

    let stmt = bind_select(&db, &select).unwrap();
    assert_eq!(stmt.column_names(), vec!["id", "b", "c"]);
}

#[test]
fn test_duplicate_relation_name_last_write_wins() {
    // Repeating a relation is accepted: both occurrences expand under `*`
    // and the name maps to the last resolution.
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("", "*"))
        .project(Expression::column("t1", "a"))
        .from(InnerJoinSqlNode::new("t1"))
        .from(InnerJoinSqlNode::new("t1"));

    let stmt = bind_select(&db, &select).unwrap();

    assert_eq!(stmt.join_tables().len(), 2);
    assert_eq!(
        stmt.column_names(),
        vec!["t1.id", "t1.a", "t1.id", "t1.a", "t1.a"]
    );
}

#[test]
fn test_qualify_single_table_config() {
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("", "*"))
        .project(Expression::field("a"))
        .from(InnerJoinSqlNode::new("t1"));

    let stmt = SelectBinder::new(&db)
        .with_config(BinderConfig::new().with_qualify_single_table(true))
        .bind(&select)
        .unwrap();

    assert_eq!(stmt.column_names(), vec!["t1.id", "t1.a", "t1.a"]);
}

#[test]
fn test_where_without_default_table_needs_qualification() {
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("", "*"))
        .from(InnerJoinSqlNode::new("t1"))
        .from(InnerJoinSqlNode::new("t3"))
        .filter(ConditionSqlNode::attr_value(
            RelAttrSqlNode::new("a"),
            CompOp::Eq,
            Value::Int64(1),
        ));

    let err = bind_select(&db, &select).unwrap_err();

    assert_eq!(err.clause(), Some(Clause::Where));
    assert!(matches!(err, SelbindError::FieldMissing { .. }));
}

#[test]
fn test_where_type_mismatch_surfaces_predicate_error() {
    let db = create_test_db();
    let select = SelectSqlNode::new()
        .project(Expression::column("", "*"))
        .from(InnerJoinSqlNode::new("t2"))
        .filter(ConditionSqlNode::attr_value(
            RelAttrSqlNode::new("b"),
            CompOp::Eq,
            Value::Bool(true),
        ));

    let err = bind_select(&db, &select).unwrap_err();
    assert!(matches!(err, SelbindError::PredicateBuild { clause: Clause::Where, .. }));
}

#[test]
fn test_where_built_after_joins() {
    let db = create_test_db();
    let counter = CountingBuilder::default();
    let select = SelectSqlNode::new()
        .project(Expression::column("", "*"))
        .from(InnerJoinSqlNode::new("t1").join("t2", id_join("t1", "t2")))
        .filter(ConditionSqlNode::attr_value(
            RelAttrSqlNode::qualified("t2", "b"),
            CompOp::Eq,
            Value::String("x".into()),
        ));

    let stmt = SelectBinder::new(&db)
        .with_predicate_builder(&counter)
        .bind(&select)
        .unwrap();

    assert_eq!(counter.calls.get(), 2);
    assert_eq!(stmt.filter().unwrap().units().len(), 1);
}

#[test]
fn test_bad_projection_stops_before_where() {
    let db = create_test_db();
    let counter = CountingBuilder::default();
    let select = SelectSqlNode::new()
        .project(Expression::column("t1", "zzz"))
        .from(InnerJoinSqlNode::new("t1"))
        .filter(ConditionSqlNode::attr_value(
            RelAttrSqlNode::new("a"),
            CompOp::Eq,
            Value::Int64(1),
        ));

    let err = SelectBinder::new(&db)
        .with_predicate_builder(&counter)
        .bind(&select)
        .unwrap_err();

    assert!(matches!(err, SelbindError::FieldMissing { .. }));
    assert_eq!(counter.calls.get(), 0);
}

#[test]
fn test_empty_from_clause_with_star_yields_nothing() {
    let db = create_test_db();
    let select = SelectSqlNode::new().project(Expression::column("", "*"));

    let stmt = bind_select(&db, &select).unwrap();

    assert!(stmt.join_tables().is_empty());
    assert!(stmt.projects().is_empty());
    assert!(db.find_table("t1").is_some());
}
