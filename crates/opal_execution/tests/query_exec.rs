use std::sync::Arc;

use opal_error::OpalError;
use opal_execution::database::catalog::Catalog;
use opal_execution::database::table::MemoryTable;
use opal_execution::engine::{Session, SessionConfig};
use opal_execution::explain::format::format_physical_plan;
use opal_execution::types::datatype::DataType;
use opal_execution::types::field::{Field, Schema};
use opal_execution::types::row::Row;
use opal_execution::types::scalar::ScalarValue;
use pretty_assertions::assert_eq;

fn int(v: i32) -> ScalarValue {
    ScalarValue::Int32(v)
}

fn string(v: &str) -> ScalarValue {
    ScalarValue::Utf8(v.to_string())
}

fn collect(rows: opal_execution::database::table::RowStream) -> Vec<Vec<ScalarValue>> {
    rows.map(|row| row.unwrap().0).collect()
}

/// Catalog with `employees` and `sales` in an `hr` schema.
fn hr_catalog() -> Arc<Catalog> {
    let mut catalog = Catalog::new();
    catalog.create_schema("hr").unwrap();
    catalog
        .create_table(
            "hr",
            "employees",
            Schema::new([
                Field::new("employeesId", DataType::Int32, false),
                Field::new("name", DataType::Utf8, true),
            ]),
            Arc::new(MemoryTable::new(vec![
                Row::new(vec![int(100), string("Bill")]),
                Row::new(vec![int(200), string("Eric")]),
                Row::new(vec![int(150), string("Sebastian")]),
            ])),
        )
        .unwrap();
    catalog
        .create_table(
            "hr",
            "sales",
            Schema::new([
                Field::new("customerId", DataType::Int32, false),
                Field::new("productId", DataType::Int32, false),
            ]),
            Arc::new(MemoryTable::new(vec![
                Row::new(vec![int(100), int(10)]),
                Row::new(vec![int(150), int(20)]),
            ])),
        )
        .unwrap();
    Arc::new(catalog)
}

fn hr_session() -> Session {
    Session::with_config(
        hr_catalog(),
        SessionConfig {
            case_sensitive: true,
            default_schema: Some("hr".to_string()),
        },
    )
}

/// Catalog with `books` and `author`, data as in the library example.
fn library_catalog() -> Arc<Catalog> {
    let mut catalog = Catalog::new();
    catalog.create_schema("main").unwrap();
    catalog
        .create_table(
            "main",
            "author",
            Schema::new([
                Field::new("id", DataType::Int32, false),
                Field::new("firstname", DataType::Utf8, true),
                Field::new("lastname", DataType::Utf8, true),
            ]),
            Arc::new(MemoryTable::new(vec![
                Row::new(vec![int(0), string("Victor"), string("Hugo")]),
                Row::new(vec![int(1), string("Alexandre"), string("Dumas")]),
            ])),
        )
        .unwrap();
    catalog
        .create_table(
            "main",
            "books",
            Schema::new([
                Field::new("id", DataType::Int32, false),
                Field::new("title", DataType::Utf8, true),
                Field::new("year", DataType::Int32, true),
                Field::new("author", DataType::Int32, true),
            ]),
            Arc::new(MemoryTable::new(vec![
                Row::new(vec![int(1), string("Les Miserables"), int(1862), int(0)]),
                Row::new(vec![
                    int(2),
                    string("The Hunchback of Notre-Dame"),
                    int(1829),
                    int(0),
                ]),
                Row::new(vec![
                    int(3),
                    string("The Last Day of a Condemned Man"),
                    int(1829),
                    int(0),
                ]),
                Row::new(vec![int(4), string("The three Musketeers"), int(1844), int(1)]),
                Row::new(vec![
                    int(5),
                    string("The Count of Monte Cristo"),
                    int(1884),
                    int(1),
                ]),
            ])),
        )
        .unwrap();
    Arc::new(catalog)
}

fn library_session() -> Session {
    Session::with_config(
        library_catalog(),
        SessionConfig {
            case_sensitive: false,
            default_schema: Some("main".to_string()),
        },
    )
}

#[test]
fn inner_join_star() {
    let session = hr_session();
    let result = session
        .query("SELECT * FROM sales s JOIN employees e ON e.employeesId = s.customerId")
        .unwrap();

    let names: Vec<_> = result
        .schema
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(
        vec!["customerId", "productId", "employeesId", "name"],
        names
    );

    let mut rows = collect(result.rows);
    rows.sort_by_key(|row| match row[0] {
        ScalarValue::Int32(v) => v,
        _ => panic!("expected int"),
    });

    assert_eq!(
        vec![
            vec![int(100), int(10), int(100), string("Bill")],
            vec![int(150), int(20), int(150), string("Sebastian")],
        ],
        rows
    );
}

#[test]
fn left_join_filter_order_limit() {
    let session = library_session();
    let result = session
        .query(
            "SELECT b.id, b.title, b.\"year\", a.firstname || ' ' || a.lastname \
             FROM Books b \
             LEFT OUTER JOIN Author a ON b.author = a.id \
             WHERE b.\"year\" > 1830 \
             ORDER BY b.id \
             LIMIT 5",
        )
        .unwrap();

    let rows = collect(result.rows);
    assert_eq!(
        vec![
            vec![int(1), string("Les Miserables"), int(1862), string("Victor Hugo")],
            vec![
                int(4),
                string("The three Musketeers"),
                int(1844),
                string("Alexandre Dumas"),
            ],
            vec![
                int(5),
                string("The Count of Monte Cristo"),
                int(1884),
                string("Alexandre Dumas"),
            ],
        ],
        rows
    );
}

#[test]
fn left_outer_join_pads_unmatched_rows() {
    let mut catalog = Catalog::new();
    catalog.create_schema("main").unwrap();
    catalog
        .create_table(
            "main",
            "orders",
            Schema::new([
                Field::new("id", DataType::Int32, false),
                Field::new("customer", DataType::Int32, true),
            ]),
            Arc::new(MemoryTable::new(vec![
                Row::new(vec![int(1), int(10)]),
                Row::new(vec![int(2), int(99)]),
                Row::new(vec![int(3), ScalarValue::Null]),
            ])),
        )
        .unwrap();
    catalog
        .create_table(
            "main",
            "customers",
            Schema::new([
                Field::new("cid", DataType::Int32, false),
                Field::new("cname", DataType::Utf8, true),
            ]),
            Arc::new(MemoryTable::new(vec![Row::new(vec![
                int(10),
                string("Ada"),
            ])])),
        )
        .unwrap();

    let session = Session::with_config(
        Arc::new(catalog),
        SessionConfig {
            case_sensitive: true,
            default_schema: Some("main".to_string()),
        },
    );

    let result = session
        .query("SELECT * FROM orders o LEFT OUTER JOIN customers c ON o.customer = c.cid ORDER BY o.id")
        .unwrap();
    let rows = collect(result.rows);

    // Every left row appears exactly once; unmatched and null-key rows are
    // null padded.
    assert_eq!(
        vec![
            vec![int(1), int(10), int(10), string("Ada")],
            vec![int(2), int(99), ScalarValue::Null, ScalarValue::Null],
            vec![int(3), ScalarValue::Null, ScalarValue::Null, ScalarValue::Null],
        ],
        rows
    );
}

#[test]
fn unknown_table_fails_before_execution() {
    let session = hr_session();
    let err = session.compile("SELECT x FROM nosuchtable").unwrap_err();
    match err {
        OpalError::UnknownTable(name) => assert_eq!("nosuchtable", name),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unknown_column() {
    let session = hr_session();
    let err = session
        .compile("SELECT nosuchcolumn FROM employees")
        .unwrap_err();
    assert!(matches!(err, OpalError::UnknownColumn(_)), "{err:?}");
}

#[test]
fn ambiguous_unqualified_column() {
    let session = library_session();
    // Both books and author have an `id` column.
    let err = session
        .compile("SELECT id FROM books b JOIN author a ON b.author = a.id")
        .unwrap_err();
    match err {
        OpalError::AmbiguousColumn(name) => assert_eq!("id", name),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn where_requires_boolean() {
    let session = hr_session();
    let err = session
        .compile("SELECT * FROM employees WHERE name")
        .unwrap_err();
    assert!(matches!(err, OpalError::TypeMismatch { .. }), "{err:?}");
}

#[test]
fn rebinding_a_plan_is_deterministic() {
    let session = hr_session();
    let plan = session
        .compile("SELECT * FROM sales s JOIN employees e ON e.employeesId = s.customerId")
        .unwrap();

    let sort_key = |row: &Vec<ScalarValue>| match row[0] {
        ScalarValue::Int32(v) => v,
        _ => panic!("expected int"),
    };

    let mut first = collect(session.bind(&plan).unwrap());
    let mut second = collect(session.bind(&plan).unwrap());
    first.sort_by_key(sort_key);
    second.sort_by_key(sort_key);

    assert_eq!(first, second);
    assert_eq!(2, first.len());
}

#[test]
fn limit_truncates_and_is_cooperative() {
    let session = library_session();
    let result = session
        .query("SELECT id FROM books ORDER BY id LIMIT 2")
        .unwrap();
    let rows = collect(result.rows);
    assert_eq!(vec![vec![int(1)], vec![int(2)]], rows);
}

#[test]
fn limit_larger_than_input() {
    let session = library_session();
    let result = session
        .query("SELECT id FROM author LIMIT 100")
        .unwrap();
    assert_eq!(2, collect(result.rows).len());
}

#[test]
fn limit_zero() {
    let session = library_session();
    let result = session.query("SELECT id FROM books LIMIT 0").unwrap();
    assert!(collect(result.rows).is_empty());
}

#[test]
fn limit_with_offset() {
    let session = library_session();
    let result = session
        .query("SELECT id FROM books ORDER BY id LIMIT 2 OFFSET 1")
        .unwrap();
    assert_eq!(vec![vec![int(2)], vec![int(3)]], collect(result.rows));
}

#[test]
fn order_by_desc() {
    let session = library_session();
    let result = session
        .query("SELECT id FROM books ORDER BY id DESC LIMIT 2")
        .unwrap();
    assert_eq!(vec![vec![int(5)], vec![int(4)]], collect(result.rows));
}

#[test]
fn order_by_puts_nulls_last() {
    let mut catalog = Catalog::new();
    catalog.create_schema("t").unwrap();
    catalog
        .create_table(
            "t",
            "vals",
            Schema::new([Field::new("v", DataType::Int32, true)]),
            Arc::new(MemoryTable::new(vec![
                Row::new(vec![ScalarValue::Null]),
                Row::new(vec![int(2)]),
                Row::new(vec![int(1)]),
            ])),
        )
        .unwrap();

    let session = Session::with_config(
        Arc::new(catalog),
        SessionConfig {
            case_sensitive: true,
            default_schema: Some("t".to_string()),
        },
    );
    let result = session.query("SELECT v FROM vals ORDER BY v").unwrap();
    assert_eq!(
        vec![vec![int(1)], vec![int(2)], vec![ScalarValue::Null]],
        collect(result.rows)
    );
}

#[test]
fn order_by_is_stable_for_equal_keys() {
    let mut catalog = Catalog::new();
    catalog.create_schema("t").unwrap();
    catalog
        .create_table(
            "t",
            "vals",
            Schema::new([
                Field::new("k", DataType::Int32, false),
                Field::new("tag", DataType::Utf8, false),
            ]),
            Arc::new(MemoryTable::new(vec![
                Row::new(vec![int(1), string("first")]),
                Row::new(vec![int(1), string("second")]),
                Row::new(vec![int(0), string("third")]),
            ])),
        )
        .unwrap();

    let session = Session::with_config(
        Arc::new(catalog),
        SessionConfig {
            case_sensitive: true,
            default_schema: Some("t".to_string()),
        },
    );
    let result = session.query("SELECT k, tag FROM vals ORDER BY k").unwrap();
    assert_eq!(
        vec![
            vec![int(0), string("third")],
            vec![int(1), string("first")],
            vec![int(1), string("second")],
        ],
        collect(result.rows)
    );
}

#[test]
fn select_without_from() {
    let session = hr_session();
    let result = session.query("SELECT 1 + 2").unwrap();
    let rows = collect(result.rows);
    assert_eq!(vec![vec![ScalarValue::Int64(3)]], rows);
}

#[test]
fn qualified_wildcard() {
    let session = hr_session();
    let result = session
        .query("SELECT e.* FROM sales s JOIN employees e ON e.employeesId = s.customerId")
        .unwrap();
    let names: Vec<_> = result
        .schema
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(vec!["employeesId", "name"], names);
}

#[test]
fn evaluation_error_aborts_stream() {
    let session = hr_session();
    let result = session
        .query("SELECT productId / (customerId - 100) FROM sales ORDER BY 1")
        .unwrap();
    // sales has a row with customerId = 100, so the division fails during
    // execution, after compilation succeeded.
    let err = result
        .rows
        .map(|row| row.map(|_| ()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert!(matches!(err, OpalError::Evaluation(_)), "{err:?}");
}

#[test]
fn describe_output_is_stable_and_indented() {
    let session = library_session();
    let plan = session
        .compile(
            "SELECT b.id FROM books b JOIN author a ON b.author = a.id \
             WHERE b.\"year\" > 1830 ORDER BY b.id LIMIT 5",
        )
        .unwrap();

    let first = format_physical_plan(&plan);
    let second = format_physical_plan(&plan);
    assert_eq!(first, second);

    // One operator per line, children indented under parents.
    let lines: Vec<_> = first.lines().collect();
    assert!(lines.len() >= 5, "got:\n{first}");
    assert!(lines[0].starts_with("BindableLimit"), "got:\n{first}");
    assert!(lines[1].starts_with("  BindableSort"), "got:\n{first}");
    for window in lines.windows(2) {
        let depth = |line: &str| line.len() - line.trim_start().len();
        assert!(
            depth(window[1]) <= depth(window[0]) + 2,
            "child indented more than one level:\n{first}"
        );
    }
}

#[test]
fn case_sensitive_resolution_rejects_wrong_case() {
    let session = hr_session();
    let err = session.compile("SELECT * FROM Employees").unwrap_err();
    assert!(matches!(err, OpalError::UnknownTable(_)), "{err:?}");
}

#[test]
fn multiple_statements_rejected_by_compile() {
    let session = hr_session();
    let err = session
        .compile("SELECT 1; SELECT 2")
        .unwrap_err();
    assert!(matches!(err, OpalError::Syntax { .. }), "{err:?}");
}
