//! Binds parsed statements against the catalog.
//!
//! Binding resolves table and column names, expands wildcards, and infers
//! types, producing a fully type-annotated query that the planner can turn
//! into a logical plan without consulting the catalog again.
pub mod bind_context;
pub mod bound;
pub mod expr_binder;

use std::sync::Arc;

use opal_error::{OpalError, Result};
use opal_parser::ast::{self, Ident, ObjectReference};
use opal_parser::statement::Statement;
use tracing::debug;

use crate::database::catalog::{Catalog, TableEntry};
use crate::expr::{ColumnExpr, Expression};
use crate::logical::operator::{JoinType, OrderByExpr};
use crate::types::datatype::DataType;

use bind_context::{name_matches, BindScope};
use bound::{BoundBaseTable, BoundCrossJoin, BoundFrom, BoundJoin, BoundQuery};
use expr_binder::ExpressionBinder;

/// Options governing identifier resolution.
#[derive(Debug, Clone)]
pub struct BindConfig {
    /// Whether unquoted identifiers match exactly. Quoted identifiers always
    /// match exactly.
    pub case_sensitive: bool,
    /// Schema searched first for unqualified table names.
    pub default_schema: Option<String>,
}

impl Default for BindConfig {
    fn default() -> Self {
        BindConfig {
            case_sensitive: true,
            default_schema: None,
        }
    }
}

#[derive(Debug)]
pub struct Binder<'a> {
    catalog: &'a Catalog,
    config: &'a BindConfig,
}

impl<'a> Binder<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a BindConfig) -> Self {
        Binder { catalog, config }
    }

    pub fn bind_statement(&self, statement: Statement) -> Result<BoundQuery> {
        match statement {
            Statement::Query(query) => self.bind_query(query),
        }
    }

    pub fn bind_query(&self, query: ast::QueryNode) -> Result<BoundQuery> {
        let mut scope = BindScope::empty();
        let from = match query.body.from {
            Some(from) => self.bind_from(from, &mut scope)?,
            None => BoundFrom::Empty,
        };

        let expr_binder = ExpressionBinder::new(&scope, self.config.case_sensitive);

        let filter = match query.body.where_expr {
            Some(expr) => {
                let expr = expr_binder.bind(&expr)?;
                match expr.datatype() {
                    DataType::Boolean | DataType::Null => Some(expr),
                    other => {
                        return Err(OpalError::type_mismatch(format!(
                            "WHERE clause must be a boolean expression, got {other}"
                        )))
                    }
                }
            }
            None => None,
        };

        let (projections, names) =
            self.bind_select_list(query.body.projections, &scope, &expr_binder)?;

        let order_by = self.bind_order_by(query.order_by, &projections, &names, &expr_binder)?;

        let limit = query.limit.limit.map(bind_limit_value).transpose()?;
        let offset = query
            .limit
            .offset
            .map(bind_limit_value)
            .transpose()?
            .unwrap_or(0);

        debug!(
            num_projections = projections.len(),
            has_filter = filter.is_some(),
            "bound query"
        );

        Ok(BoundQuery {
            from,
            filter,
            projections,
            names,
            order_by,
            limit,
            offset,
        })
    }

    fn bind_from(&self, from: ast::FromNode, scope: &mut BindScope) -> Result<BoundFrom> {
        let bound = self.bind_from_node(from, scope)?;

        // Reject duplicate table aliases, they'd make qualified references
        // ambiguous.
        let mut seen: Vec<String> = Vec::new();
        bound.for_each_table(&mut |table| {
            let dup = seen.iter().any(|other| {
                if self.config.case_sensitive {
                    other == &table.alias
                } else {
                    other.eq_ignore_ascii_case(&table.alias)
                }
            });
            if dup {
                return Err(OpalError::Internal(format!(
                    "duplicate table alias '{}'",
                    table.alias
                )));
            }
            seen.push(table.alias.clone());
            Ok(())
        })?;

        Ok(bound)
    }

    fn bind_from_node(&self, node: ast::FromNode, scope: &mut BindScope) -> Result<BoundFrom> {
        match node.body {
            ast::FromNodeBody::BaseTable(base) => {
                let (schema, entry) = self.resolve_table(&base.reference)?;
                let alias = match node.alias {
                    Some(alias) => alias.value,
                    None => base.reference.base()?.value.clone(),
                };
                scope.append_table(&alias, &entry.schema);
                Ok(BoundFrom::Table(BoundBaseTable {
                    schema,
                    entry,
                    alias,
                }))
            }
            ast::FromNodeBody::Join(join) => {
                let left = self.bind_from_node(*join.left, scope)?;
                let right = self.bind_from_node(*join.right, scope)?;

                match join.join_type {
                    ast::JoinType::Cross => {
                        if !matches!(join.join_condition, ast::JoinCondition::None) {
                            return Err(OpalError::Internal(
                                "cross join cannot have a join condition".to_string(),
                            ));
                        }
                        Ok(BoundFrom::CrossJoin(Box::new(BoundCrossJoin {
                            left,
                            right,
                        })))
                    }
                    ast::JoinType::Inner | ast::JoinType::Left => {
                        let join_type = match join.join_type {
                            ast::JoinType::Inner => JoinType::Inner,
                            _ => JoinType::Left,
                        };
                        let condition = match join.join_condition {
                            ast::JoinCondition::On(expr) => {
                                let binder =
                                    ExpressionBinder::new(scope, self.config.case_sensitive);
                                let expr = binder.bind(&expr)?;
                                match expr.datatype() {
                                    DataType::Boolean | DataType::Null => expr,
                                    other => {
                                        return Err(OpalError::type_mismatch(format!(
                                            "JOIN condition must be a boolean expression, got {other}"
                                        )))
                                    }
                                }
                            }
                            ast::JoinCondition::None => {
                                return Err(OpalError::Internal(format!(
                                    "{join_type} JOIN requires an ON condition"
                                )))
                            }
                        };
                        Ok(BoundFrom::Join(Box::new(BoundJoin {
                            left,
                            right,
                            join_type,
                            condition,
                        })))
                    }
                }
            }
        }
    }

    /// Resolve a table reference against the catalog.
    ///
    /// Qualified references name a schema directly. Unqualified references
    /// search the default schema first, then the remaining schemas in
    /// declaration order.
    fn resolve_table(&self, reference: &ObjectReference) -> Result<(String, Arc<TableEntry>)> {
        match reference.0.as_slice() {
            [schema_ident, table_ident] => {
                for schema in self.catalog.schemas() {
                    if !name_matches(&schema.name, schema_ident, self.config.case_sensitive) {
                        continue;
                    }
                    if let Some(entry) = self.find_table(schema, table_ident) {
                        return Ok((schema.name.clone(), entry));
                    }
                }
                Err(OpalError::UnknownTable(reference.to_string()))
            }
            [table_ident] => {
                if let Some(default) = &self.config.default_schema {
                    if let Some(schema) = self.catalog.schema(default) {
                        if let Some(entry) = self.find_table(schema, table_ident) {
                            return Ok((schema.name.clone(), entry));
                        }
                    }
                }
                for schema in self.catalog.schemas() {
                    if let Some(entry) = self.find_table(schema, table_ident) {
                        return Ok((schema.name.clone(), entry));
                    }
                }
                Err(OpalError::UnknownTable(reference.to_string()))
            }
            _ => Err(OpalError::UnknownTable(reference.to_string())),
        }
    }

    fn find_table(
        &self,
        schema: &crate::database::catalog::SchemaEntry,
        ident: &Ident,
    ) -> Option<Arc<TableEntry>> {
        schema
            .tables()
            .find(|entry| name_matches(&entry.name, ident, self.config.case_sensitive))
            .cloned()
    }

    fn bind_select_list(
        &self,
        projections: Vec<ast::SelectExpr>,
        scope: &BindScope,
        expr_binder: &ExpressionBinder,
    ) -> Result<(Vec<Expression>, Vec<String>)> {
        let mut exprs = Vec::new();
        let mut names = Vec::new();

        for projection in projections {
            match projection {
                ast::SelectExpr::Wildcard => {
                    if scope.columns.is_empty() {
                        return Err(OpalError::UnknownColumn(
                            "cannot expand '*' without a FROM clause".to_string(),
                        ));
                    }
                    for (idx, column) in scope.columns.iter().enumerate() {
                        exprs.push(Expression::Column(ColumnExpr {
                            column: idx,
                            datatype: column.datatype,
                        }));
                        names.push(column.name.clone());
                    }
                }
                ast::SelectExpr::QualifiedWildcard(reference) => {
                    let table_ident = match reference.0.as_slice() {
                        [ident] => ident,
                        _ => {
                            return Err(OpalError::UnknownTable(reference.to_string()))
                        }
                    };
                    let mut matched = false;
                    for (idx, column) in scope.columns.iter().enumerate() {
                        if !name_matches(
                            &column.table_alias,
                            table_ident,
                            self.config.case_sensitive,
                        ) {
                            continue;
                        }
                        matched = true;
                        exprs.push(Expression::Column(ColumnExpr {
                            column: idx,
                            datatype: column.datatype,
                        }));
                        names.push(column.name.clone());
                    }
                    if !matched {
                        return Err(OpalError::UnknownTable(reference.to_string()));
                    }
                }
                ast::SelectExpr::Expr(expr) => {
                    let name = output_name_for(&expr, scope, expr_binder)?;
                    exprs.push(expr_binder.bind(&expr)?);
                    names.push(name);
                }
                ast::SelectExpr::AliasedExpr(expr, alias) => {
                    exprs.push(expr_binder.bind(&expr)?);
                    names.push(alias.value);
                }
            }
        }

        Ok((exprs, names))
    }

    /// Resolve ORDER BY keys to select-list output columns.
    ///
    /// Keys resolve by 1-based ordinal, by output name, or by structurally
    /// matching a bound select-list expression.
    fn bind_order_by(
        &self,
        order_by: Vec<ast::OrderByNode>,
        projections: &[Expression],
        names: &[String],
        expr_binder: &ExpressionBinder,
    ) -> Result<Vec<OrderByExpr>> {
        let mut keys = Vec::with_capacity(order_by.len());

        for node in order_by {
            let column = self.resolve_order_by_column(&node.expr, projections, names, expr_binder)?;

            let desc = matches!(node.typ, Some(ast::OrderByType::Desc));
            let nulls_first = match node.nulls {
                Some(ast::OrderByNulls::First) => true,
                Some(ast::OrderByNulls::Last) => false,
                // Default null ordering follows the sort direction.
                None => desc,
            };

            keys.push(OrderByExpr {
                column,
                desc,
                nulls_first,
            });
        }

        Ok(keys)
    }

    fn resolve_order_by_column(
        &self,
        expr: &ast::Expr,
        projections: &[Expression],
        names: &[String],
        expr_binder: &ExpressionBinder,
    ) -> Result<usize> {
        // Ordinal, e.g. `ORDER BY 2`.
        if let ast::Expr::Literal(ast::Literal::Number(s)) = expr {
            let ordinal: usize = s.parse().map_err(|_| {
                OpalError::type_mismatch(format!("invalid ORDER BY position: {s}"))
            })?;
            if ordinal == 0 || ordinal > projections.len() {
                return Err(OpalError::UnknownColumn(format!(
                    "ORDER BY position {ordinal} is not in the select list"
                )));
            }
            return Ok(ordinal - 1);
        }

        // Output name or alias.
        if let ast::Expr::Ident(ident) = expr {
            let matches: Vec<_> = names
                .iter()
                .enumerate()
                .filter(|(_, name)| name_matches(name, ident, expr_binder.case_sensitive))
                .map(|(idx, _)| idx)
                .collect();
            match matches.as_slice() {
                [idx] => return Ok(*idx),
                [] => (), // Fall through to structural matching.
                _ => return Err(OpalError::AmbiguousColumn(ident.value.clone())),
            }
        }

        // Structural match against the bound select list.
        let bound = expr_binder.bind(expr)?;
        projections
            .iter()
            .position(|proj| proj == &bound)
            .ok_or_else(|| {
                OpalError::UnknownColumn(format!(
                    "ORDER BY expression must appear in the select list: {bound}"
                ))
            })
    }
}

/// Derive an output column name for an unaliased select expression.
fn output_name_for(
    expr: &ast::Expr,
    scope: &BindScope,
    expr_binder: &ExpressionBinder,
) -> Result<String> {
    match expr {
        ast::Expr::Ident(_) | ast::Expr::CompoundIdent(_) => {
            // Use the resolved column's name from the catalog.
            match expr_binder.bind(expr)? {
                Expression::Column(col) => Ok(scope.columns[col.column].name.clone()),
                _ => Ok("?column?".to_string()),
            }
        }
        _ => Ok("?column?".to_string()),
    }
}

fn bind_limit_value(expr: ast::Expr) -> Result<usize> {
    if let ast::Expr::Literal(ast::Literal::Number(s)) = &expr {
        if let Ok(value) = s.parse::<usize>() {
            return Ok(value);
        }
    }
    Err(OpalError::type_mismatch(
        "LIMIT and OFFSET require a non-negative integer literal",
    ))
}
