use std::fmt::Debug;
use std::sync::Arc;

use opal_error::Result;

use super::memo::{GroupId, Memo, RelExpr, RelNode};
use super::rules::bindable::{
    BindableEmptyRule, BindableFilterRule, BindableJoinRule, BindableLimitRule,
    BindableProjectRule, BindableScanRule, BindableSortRule,
};
use super::rules::filter_into_join::FilterIntoJoinRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Rewrites a logical shape into an equivalent logical shape.
    Transformation,
    /// Converts a logical operator into a physical operator under a
    /// convention.
    Implementation,
}

/// A child of a rule's output expression.
///
/// Most rules reference the matched expression's existing child groups.
/// Rules that restructure the tree (e.g. pushing a filter beneath a join)
/// produce new sub-expressions, which the search engine places into fresh
/// groups.
#[derive(Debug)]
pub enum RuleChild {
    Group(GroupId),
    New(Box<NewExpr>),
}

#[derive(Debug)]
pub struct NewExpr {
    pub expr: RelExpr,
    pub children: Vec<RuleChild>,
}

/// A plan alternative produced by a rule, equivalent to the matched
/// expression.
#[derive(Debug)]
pub struct RuleOutput {
    pub expr: RelExpr,
    pub children: Vec<RuleChild>,
}

/// A pure rewrite from one plan shape to zero or more equivalent shapes.
///
/// Rules hold no plan-specific state and are shared read-only across
/// optimizations.
pub trait OptimizerRule: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> RuleKind;

    /// Whether the rule's pattern matches this expression.
    fn matches(&self, node: &RelNode, memo: &Memo) -> bool;

    /// Apply the rule to a matching expression.
    fn apply(&self, node: &RelNode, memo: &Memo) -> Result<Vec<RuleOutput>>;
}

/// An immutable collection of rules, constructed once and passed into every
/// optimize call.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn OptimizerRule>>,
}

impl RuleSet {
    pub fn empty() -> Self {
        RuleSet { rules: Vec::new() }
    }

    /// The standard rule set: filter pushdown plus implementations for every
    /// logical operator under the bindable convention.
    pub fn standard() -> Self {
        RuleSet::empty()
            .with_rule(Arc::new(FilterIntoJoinRule))
            .with_rule(Arc::new(BindableScanRule))
            .with_rule(Arc::new(BindableFilterRule))
            .with_rule(Arc::new(BindableProjectRule))
            .with_rule(Arc::new(BindableJoinRule))
            .with_rule(Arc::new(BindableSortRule))
            .with_rule(Arc::new(BindableLimitRule))
            .with_rule(Arc::new(BindableEmptyRule))
    }

    pub fn with_rule(mut self, rule: Arc<dyn OptimizerRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self, kind: RuleKind) -> impl Iterator<Item = &Arc<dyn OptimizerRule>> {
        self.rules.iter().filter(move |rule| rule.kind() == kind)
    }
}
