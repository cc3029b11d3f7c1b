use opal_error::Result;
use tracing::debug;

use crate::binder::bound::{BoundFrom, BoundQuery};
use crate::logical::operator::{
    CrossJoin, Filter, Join, Limit, LogicalOperator, Order, Projection, Scan,
};

/// Builds a logical plan from a bound query.
///
/// The translation is purely structural: FROM items become scans, joins wrap
/// their operands, WHERE becomes a filter above the join tree, the select
/// list becomes a projection, ORDER BY a sort above the projection, and
/// LIMIT sits on top. Reordering and implementation choices are left to the
/// optimizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryPlanner;

impl QueryPlanner {
    pub fn plan_query(&self, query: BoundQuery) -> Result<LogicalOperator> {
        let mut plan = self.plan_from(query.from)?;

        if let Some(predicate) = query.filter {
            plan = LogicalOperator::Filter(Filter {
                predicate,
                input: Box::new(plan),
            });
        }

        plan = LogicalOperator::Projection(Projection {
            exprs: query.projections,
            names: query.names,
            input: Box::new(plan),
        });

        if !query.order_by.is_empty() {
            plan = LogicalOperator::Order(Order {
                exprs: query.order_by,
                input: Box::new(plan),
            });
        }

        if query.limit.is_some() || query.offset > 0 {
            plan = LogicalOperator::Limit(Limit {
                limit: query.limit,
                offset: query.offset,
                input: Box::new(plan),
            });
        }

        let schema = plan.output_schema()?;
        debug!(columns = schema.num_columns(), "built logical plan");

        Ok(plan)
    }

    fn plan_from(&self, from: BoundFrom) -> Result<LogicalOperator> {
        Ok(match from {
            BoundFrom::Empty => LogicalOperator::Empty,
            BoundFrom::Table(table) => LogicalOperator::Scan(Scan {
                schema: table.schema,
                source: table.entry,
            }),
            BoundFrom::Join(join) => LogicalOperator::Join(Join {
                left: Box::new(self.plan_from(join.left)?),
                right: Box::new(self.plan_from(join.right)?),
                join_type: join.join_type,
                condition: join.condition,
            }),
            BoundFrom::CrossJoin(join) => LogicalOperator::CrossJoin(CrossJoin {
                left: Box::new(self.plan_from(join.left)?),
                right: Box::new(self.plan_from(join.right)?),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{BindConfig, Binder};
    use crate::database::catalog::Catalog;
    use crate::database::table::MemoryTable;
    use crate::types::datatype::DataType;
    use crate::types::field::{Field, Schema};
    use std::sync::Arc;

    fn catalog() -> Catalog {
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
                Arc::new(MemoryTable::new(Vec::new())),
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
                Arc::new(MemoryTable::new(Vec::new())),
            )
            .unwrap();
        catalog
    }

    fn plan(sql: &str) -> LogicalOperator {
        let catalog = catalog();
        let config = BindConfig {
            case_sensitive: true,
            default_schema: Some("hr".to_string()),
        };
        let mut statements = opal_parser::parser::parse(sql).unwrap();
        let bound = Binder::new(&catalog, &config)
            .bind_statement(statements.pop().unwrap())
            .unwrap();
        QueryPlanner.plan_query(bound).unwrap()
    }

    #[test]
    fn clause_order_is_structural() {
        let plan = plan(
            "SELECT name FROM employees e JOIN sales s ON e.employeesId = s.customerId \
             WHERE s.productId > 10 ORDER BY name LIMIT 3",
        );

        // Limit > Order > Projection > Filter > Join > (Scan, Scan)
        let order = match plan {
            LogicalOperator::Limit(limit) => *limit.input,
            other => panic!("expected limit on top, got {other:?}"),
        };
        let projection = match order {
            LogicalOperator::Order(order) => *order.input,
            other => panic!("expected order, got {other:?}"),
        };
        let filter = match projection {
            LogicalOperator::Projection(projection) => *projection.input,
            other => panic!("expected projection, got {other:?}"),
        };
        let join = match filter {
            LogicalOperator::Filter(filter) => *filter.input,
            other => panic!("expected filter, got {other:?}"),
        };
        match join {
            LogicalOperator::Join(join) => {
                assert!(matches!(*join.left, LogicalOperator::Scan(_)));
                assert!(matches!(*join.right, LogicalOperator::Scan(_)));
            }
            other => panic!("expected join, got {other:?}"),
        }
    }

    #[test]
    fn select_without_from_plans_over_empty() {
        let plan = plan("SELECT 1");
        match plan {
            LogicalOperator::Projection(projection) => {
                assert!(matches!(*projection.input, LogicalOperator::Empty));
            }
            other => panic!("expected projection, got {other:?}"),
        }
    }

    #[test]
    fn logical_plan_formats_as_tree() {
        let plan = plan("SELECT name FROM employees WHERE employeesId = 100 ORDER BY name LIMIT 1");
        let text = crate::explain::format::format_logical_plan(&plan);

        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("Limit"), "got:\n{text}");
        assert!(lines[1].starts_with("  Order"), "got:\n{text}");
        assert!(lines[2].starts_with("    Projection"), "got:\n{text}");
        assert!(lines[3].starts_with("      Filter"), "got:\n{text}");
        assert!(lines[4].starts_with("        Scan"), "got:\n{text}");
    }

    #[test]
    fn row_types_flow_bottom_up() {
        let plan = plan("SELECT e.name, s.productId FROM employees e JOIN sales s ON e.employeesId = s.customerId");
        let schema = plan.output_schema().unwrap();
        assert_eq!(2, schema.num_columns());
        assert_eq!("name", schema.fields[0].name);
        assert_eq!(DataType::Utf8, schema.fields[0].datatype);
        assert_eq!("productId", schema.fields[1].name);
        assert_eq!(DataType::Int32, schema.fields[1].datatype);
    }
}
