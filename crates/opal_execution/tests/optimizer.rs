use std::sync::Arc;

use opal_error::OpalError;
use opal_execution::database::catalog::Catalog;
use opal_execution::database::table::MemoryTable;
use opal_execution::engine::{Session, SessionConfig};
use opal_execution::explain::format::format_physical_plan;
use opal_execution::optimizer::rule::RuleSet;
use opal_execution::optimizer::rules::bindable::{BindableProjectRule, BindableScanRule};
use opal_execution::types::datatype::DataType;
use opal_execution::types::field::{Field, Schema};
use opal_execution::types::row::Row;
use opal_execution::types::scalar::ScalarValue;

/// Two tables sized so the cost model has real choices to make.
fn catalog(left_rows: usize, right_rows: usize) -> Arc<Catalog> {
    let mut catalog = Catalog::new();
    catalog.create_schema("main").unwrap();

    let rows = |n: usize| {
        (0..n)
            .map(|i| {
                Row::new(vec![
                    ScalarValue::Int32(i as i32),
                    ScalarValue::Int32((i * 7) as i32),
                ])
            })
            .collect::<Vec<_>>()
    };

    catalog
        .create_table(
            "main",
            "facts",
            Schema::new([
                Field::new("fid", DataType::Int32, false),
                Field::new("dim", DataType::Int32, false),
            ]),
            Arc::new(MemoryTable::new(rows(left_rows))),
        )
        .unwrap();
    catalog
        .create_table(
            "main",
            "dims",
            Schema::new([
                Field::new("did", DataType::Int32, false),
                Field::new("extra", DataType::Int32, false),
            ]),
            Arc::new(MemoryTable::new(rows(right_rows))),
        )
        .unwrap();
    Arc::new(catalog)
}

fn session(left_rows: usize, right_rows: usize) -> Session {
    Session::with_config(
        catalog(left_rows, right_rows),
        SessionConfig {
            case_sensitive: true,
            default_schema: Some("main".to_string()),
        },
    )
}

#[test]
fn filter_is_pushed_below_the_join() {
    let session = session(50, 50);
    let plan = session
        .compile("SELECT f.fid FROM facts f JOIN dims d ON f.dim = d.did WHERE f.fid = 7")
        .unwrap();
    let text = format_physical_plan(&plan);

    let join_at = text
        .find("Join")
        .unwrap_or_else(|| panic!("no join in plan:\n{text}"));
    let filter_at = text
        .find("BindableFilter")
        .unwrap_or_else(|| panic!("no filter in plan:\n{text}"));

    // The filter only touches the left side, so it must appear beneath the
    // join, not above it.
    assert!(filter_at > join_at, "filter not pushed down:\n{text}");
}

#[test]
fn filter_on_the_padded_side_of_a_left_join_stays_above() {
    let session = session(10, 10);
    let plan = session
        .compile(
            "SELECT f.fid FROM facts f LEFT OUTER JOIN dims d ON f.dim = d.did WHERE d.extra = 7",
        )
        .unwrap();
    let text = format_physical_plan(&plan);

    let join_at = text.find("Join").unwrap();
    let filter_at = text.find("BindableFilter").unwrap();
    assert!(
        filter_at < join_at,
        "right-side filter must not move below a left outer join:\n{text}"
    );
}

#[test]
fn equi_join_on_large_inputs_uses_the_hash_join() {
    let session = session(200, 200);
    let plan = session
        .compile("SELECT f.fid FROM facts f JOIN dims d ON f.dim = d.did")
        .unwrap();
    let text = format_physical_plan(&plan);
    assert!(text.contains("BindableHashJoin"), "got:\n{text}");
}

#[test]
fn non_equi_join_falls_back_to_nested_loops() {
    let session = session(200, 200);
    let plan = session
        .compile("SELECT f.fid FROM facts f JOIN dims d ON f.dim > d.did")
        .unwrap();
    let text = format_physical_plan(&plan);
    assert!(text.contains("BindableNestedLoopJoin"), "got:\n{text}");
    assert!(!text.contains("BindableHashJoin"), "got:\n{text}");
}

#[test]
fn rule_applications_preserve_row_type() {
    let session = session(50, 50);
    let plan = session
        .compile(
            "SELECT f.fid, d.extra FROM facts f JOIN dims d ON f.dim = d.did WHERE f.fid = 7",
        )
        .unwrap();

    // Pushdown rewrote the tree; the output row type must be untouched.
    let names: Vec<_> = plan.schema().fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(vec!["fid", "extra"], names);
    assert_eq!(DataType::Int32, plan.schema().fields[0].datatype);
}

#[test]
fn plans_carry_cost_estimates() {
    let session = session(50, 50);
    let plan = session
        .compile("SELECT f.fid FROM facts f JOIN dims d ON f.dim = d.did")
        .unwrap();
    let cost = plan.cost();
    assert!(cost.rows > 0.0);
    assert!(cost.value > 0.0);
}

#[test]
fn missing_implementation_rule_means_no_plan() {
    let rules = RuleSet::empty()
        .with_rule(Arc::new(BindableScanRule))
        .with_rule(Arc::new(BindableProjectRule));
    let session = session(10, 10).with_rules(rules);

    // Join has no implementation rule in this rule set, so no plan can reach
    // the bindable convention.
    let err = session
        .compile("SELECT f.fid FROM facts f JOIN dims d ON f.dim = d.did")
        .unwrap_err();
    assert!(matches!(err, OpalError::NoPlanFound { .. }), "{err:?}");

    // Scans and projections alone still plan fine.
    session.compile("SELECT fid FROM facts").unwrap();
}
