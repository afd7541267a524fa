//! Selector tree and its constructors.
//!
//! A selector is built bottom-up from plain constructor functions:
//!
//! ```rust
//! use selector_core::{and, equal, greater_than, lower_than, or, select};
//!
//! let selector = select([or([
//!     and([lower_than("age", 30), equal("active", false)]),
//!     and([greater_than("age", 60), equal("active", true)]),
//! ])])
//! .unwrap();
//!
//! assert_eq!(
//!     selector.to_string(),
//!     "((age < 30 && active == false) || (age > 60 && active == true))"
//! );
//! ```
//!
//! Expressions are unchecked until they are wrapped by [`select`], which
//! validates the whole tree once. A [`Selector`] is therefore always
//! structurally valid and never changes after construction.

use std::fmt::{Display, Formatter};

use serde_json::Value;

use crate::compile::compile_expr;
use crate::error::{SelectorError, SelectorResult};

/// Comparison operator of a leaf predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqualThan,
    LowerThan,
    LowerEqualThan,
    Exists,
    RegexMatch,
}

impl Operator {
    /// Keyword used for this operator in a compiled selector document.
    pub fn keyword(&self) -> &'static str {
        match self {
            Operator::Equal => "$eq",
            Operator::NotEqual => "$ne",
            Operator::GreaterThan => "$gt",
            Operator::GreaterEqualThan => "$gte",
            Operator::LowerThan => "$lt",
            Operator::LowerEqualThan => "$lte",
            Operator::Exists => "$exists",
            Operator::RegexMatch => "$regex",
        }
    }

    /// Reverse of [`Operator::keyword`].
    pub fn from_keyword(keyword: &str) -> Option<Operator> {
        match keyword {
            "$eq" => Some(Operator::Equal),
            "$ne" => Some(Operator::NotEqual),
            "$gt" => Some(Operator::GreaterThan),
            "$gte" => Some(Operator::GreaterEqualThan),
            "$lt" => Some(Operator::LowerThan),
            "$lte" => Some(Operator::LowerEqualThan),
            "$exists" => Some(Operator::Exists),
            "$regex" => Some(Operator::RegexMatch),
            _ => None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterEqualThan => ">=",
            Operator::LowerThan => "<",
            Operator::LowerEqualThan => "<=",
            Operator::Exists => "exists",
            Operator::RegexMatch => "=~",
        }
    }
}

/// Logical aggregation of child expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombinatorKind {
    All,
    Any,
}

impl CombinatorKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            CombinatorKind::All => "$and",
            CombinatorKind::Any => "$or",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CombinatorKind::All => "and",
            CombinatorKind::Any => "or",
        }
    }
}

/// How the elements of an array field have to satisfy the inner selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    AtLeastOneElement,
    AllElements,
}

impl MatchMode {
    pub fn keyword(&self) -> &'static str {
        match self {
            MatchMode::AtLeastOneElement => "$elemMatch",
            MatchMode::AllElements => "$allMatch",
        }
    }
}

/// A node of the selector tree.
///
/// An empty `field` addresses the current array element and is only valid
/// below an [`Expr::ArrayMatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Predicate {
        field: String,
        op: Operator,
        operand: Value,
    },
    Combinator {
        kind: CombinatorKind,
        children: Vec<Expr>,
    },
    ArrayMatch {
        field: String,
        mode: MatchMode,
        inner: Box<Expr>,
    },
}

impl Expr {
    fn predicate(field: &str, op: Operator, operand: Value) -> Expr {
        Expr::Predicate {
            field: field.to_string(),
            op,
            operand,
        }
    }

    /// Number of leaf predicates below and including this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Expr::Predicate { .. } => 1,
            Expr::Combinator { children, .. } => children.iter().map(Expr::leaf_count).sum(),
            Expr::ArrayMatch { inner, .. } => inner.leaf_count(),
        }
    }

    fn validate(&self, in_array: bool) -> SelectorResult<()> {
        match self {
            Expr::Predicate { field, op, operand } => {
                if field.is_empty() && !in_array {
                    return Err(SelectorError::ElementPathOutsideArray);
                }
                if *op == Operator::RegexMatch {
                    check_regex(operand.as_str().unwrap_or_default())?;
                }
                Ok(())
            }
            Expr::Combinator { kind, children } => {
                if children.is_empty() {
                    return Err(SelectorError::EmptyCombinator(kind.name()));
                }
                children.iter().try_for_each(|c| c.validate(in_array))
            }
            Expr::ArrayMatch { field, inner, .. } => {
                if field.is_empty() && !in_array {
                    return Err(SelectorError::ElementPathOutsideArray);
                }
                if let Expr::Combinator { children, .. } = inner.as_ref() {
                    if children.is_empty() {
                        return Err(SelectorError::EmptyArrayMatch(field.clone()));
                    }
                }
                inner.validate(true)
            }
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Predicate { field, op, operand } => {
                let field = if field.is_empty() { "$elem" } else { field };
                match op {
                    Operator::Exists => write!(f, "{} exists", field),
                    _ => write!(f, "{} {} {}", field, op.symbol(), operand),
                }
            }
            Expr::Combinator { kind, children } => {
                let sep = match kind {
                    CombinatorKind::All => " && ",
                    CombinatorKind::Any => " || ",
                };
                let parts: Vec<String> = children.iter().map(|c| c.to_string()).collect();
                write!(f, "({})", parts.join(sep))
            }
            Expr::ArrayMatch { field, mode, inner } => {
                let quantifier = match mode {
                    MatchMode::AtLeastOneElement => "any",
                    MatchMode::AllElements => "all",
                };
                write!(f, "{}({}: {})", quantifier, field, inner)
            }
        }
    }
}

/// Field equals `value`.
pub fn equal(field: &str, value: impl Into<Value>) -> Expr {
    Expr::predicate(field, Operator::Equal, value.into())
}

/// Field does not equal `value`.
pub fn not_equal(field: &str, value: impl Into<Value>) -> Expr {
    Expr::predicate(field, Operator::NotEqual, value.into())
}

pub fn greater_than(field: &str, value: impl Into<Value>) -> Expr {
    Expr::predicate(field, Operator::GreaterThan, value.into())
}

pub fn greater_equal_than(field: &str, value: impl Into<Value>) -> Expr {
    Expr::predicate(field, Operator::GreaterEqualThan, value.into())
}

pub fn lower_than(field: &str, value: impl Into<Value>) -> Expr {
    Expr::predicate(field, Operator::LowerThan, value.into())
}

pub fn lower_equal_than(field: &str, value: impl Into<Value>) -> Expr {
    Expr::predicate(field, Operator::LowerEqualThan, value.into())
}

/// Field is present in the document, whatever its value.
pub fn exists(field: &str) -> Expr {
    Expr::predicate(field, Operator::Exists, Value::Bool(true))
}

/// Field holds a string matching `pattern`.
pub fn regex_match(field: &str, pattern: &str) -> Expr {
    Expr::predicate(field, Operator::RegexMatch, Value::String(pattern.to_string()))
}

/// All children must match.
pub fn and(children: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Combinator {
        kind: CombinatorKind::All,
        children: children.into_iter().collect(),
    }
}

/// At least one child must match.
pub fn or(children: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Combinator {
        kind: CombinatorKind::Any,
        children: children.into_iter().collect(),
    }
}

/// Rejects patterns no regex dialect accepts (unbalanced groups or classes,
/// dangling quantifiers). Features the local engine lacks, such as
/// look-around or backreferences, are left for the backend to interpret.
fn check_regex(pattern: &str) -> SelectorResult<()> {
    use regex_syntax::ast::{parse::Parser, ErrorKind};

    let Err(err) = Parser::new().parse(pattern) else {
        return Ok(());
    };
    match err.kind() {
        ErrorKind::GroupUnclosed
        | ErrorKind::GroupUnopened
        | ErrorKind::ClassUnclosed
        | ErrorKind::ClassRangeInvalid
        | ErrorKind::RepetitionCountInvalid
        | ErrorKind::RepetitionCountUnclosed
        | ErrorKind::RepetitionMissing
        | ErrorKind::EscapeUnexpectedEof => Err(SelectorError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: err.kind().to_string(),
        }),
        _ => Ok(()),
    }
}

/// At least one element of the array `field` must satisfy `inner`.
pub fn match_element(field: &str, inner: Expr) -> Expr {
    Expr::ArrayMatch {
        field: field.to_string(),
        mode: MatchMode::AtLeastOneElement,
        inner: Box::new(inner),
    }
}

/// Every element of the array `field` must satisfy all of `inner`.
pub fn match_all(field: &str, inner: impl IntoIterator<Item = Expr>) -> Expr {
    let mut inner: Vec<Expr> = inner.into_iter().collect();
    let inner = if inner.len() == 1 {
        inner.remove(0)
    } else {
        and(inner)
    };
    Expr::ArrayMatch {
        field: field.to_string(),
        mode: MatchMode::AllElements,
        inner: Box::new(inner),
    }
}

/// Builds the top-level selector.
///
/// A single expression is used as-is, several are AND-combined. No
/// expression at all selects every document.
pub fn select(exprs: impl IntoIterator<Item = Expr>) -> SelectorResult<Selector> {
    let mut exprs: Vec<Expr> = exprs.into_iter().collect();
    let root = match exprs.len() {
        0 => return Ok(Selector::match_all()),
        1 => exprs.remove(0),
        _ => and(exprs),
    };
    Selector::new(root)
}

/// Validated, immutable selector tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    root: Expr,
}

impl Selector {
    /// Validates `root` and wraps it.
    pub fn new(root: Expr) -> SelectorResult<Self> {
        root.validate(false)?;
        Ok(Self { root })
    }

    /// Selector matching every document (`_id > null`).
    pub fn match_all() -> Self {
        Self {
            root: greater_than("_id", Value::Null),
        }
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Renders the selector into the backend's query document format.
    pub fn compile(&self) -> Value {
        compile_expr(&self.root)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.root.fmt(f)
    }
}

impl serde::Serialize for Selector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.compile().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_expression_used_as_is() {
        let selector = select([equal("active", true)]).unwrap();
        assert_eq!(selector.root(), &equal("active", true));
    }

    #[test]
    fn test_multiple_expressions_are_and_combined() {
        let selector = select([exists("last_active"), lower_equal_than("age", 25)]).unwrap();
        match selector.root() {
            Expr::Combinator { kind, children } => {
                assert_eq!(*kind, CombinatorKind::All);
                assert_eq!(children.len(), 2);
            }
            other => panic!("unexpected root {:?}", other),
        }
    }

    #[test]
    fn test_empty_select_matches_all() {
        let selector = select(Vec::new()).unwrap();
        assert_eq!(selector, Selector::match_all());
        assert_eq!(selector.root().leaf_count(), 1);
    }

    #[test]
    fn test_empty_combinator_rejected() {
        let err = select([and(Vec::new())]).unwrap_err();
        assert_eq!(err, SelectorError::EmptyCombinator("and"));

        let err = select([equal("a", 1), or(Vec::new())]).unwrap_err();
        assert_eq!(err, SelectorError::EmptyCombinator("or"));
    }

    #[test]
    fn test_element_path_only_inside_array_match() {
        let err = select([equal("", 3)]).unwrap_err();
        assert_eq!(err, SelectorError::ElementPathOutsideArray);

        assert!(select([match_element("shifts", equal("", 3))]).is_ok());
        assert!(select([match_all("shifts", [greater_than("", 1), lower_than("", 3)])]).is_ok());
    }

    #[test]
    fn test_empty_match_all_rejected() {
        let err = select([match_all("shifts", Vec::new())]).unwrap_err();
        assert_eq!(err, SelectorError::EmptyArrayMatch("shifts".to_string()));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = select([regex_match("name", "(Adam")]).unwrap_err();
        assert!(matches!(err, SelectorError::InvalidRegex { .. }));
        assert!(select([regex_match("name", ".*Adam.*")]).is_ok());
        assert!(matches!(
            select([regex_match("name", "[a-z")]).unwrap_err(),
            SelectorError::InvalidRegex { .. }
        ));
        assert!(matches!(
            select([regex_match("name", "*Adam")]).unwrap_err(),
            SelectorError::InvalidRegex { .. }
        ));
    }

    #[test]
    fn test_backend_regex_features_accepted() {
        let selector = select([regex_match("name", "^(?!Adam).*")]).unwrap();
        assert_eq!(
            selector.compile(),
            json!({"name": {"$regex": "^(?!Adam).*"}})
        );
        assert!(select([regex_match("name", "(a)\\1")]).is_ok());
        assert!(select([regex_match("name", "(?<=Mr\\. )Smith")]).is_ok());
    }

    #[test]
    fn test_match_all_single_inner_is_not_wrapped() {
        let expr = match_all("shifts", [equal("", 2)]);
        match expr {
            Expr::ArrayMatch { inner, mode, .. } => {
                assert_eq!(mode, MatchMode::AllElements);
                assert_eq!(*inner, equal("", 2));
            }
            other => panic!("unexpected expr {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let selector = select([
            match_element("shifts", equal("", 3)),
            exists("last_active"),
            regex_match("name", "^A"),
        ])
        .unwrap();
        assert_eq!(
            selector.to_string(),
            "(any(shifts: $elem == 3) && last_active exists && name =~ \"^A\")"
        );
    }

    #[test]
    fn test_operator_keywords_round_trip() {
        for op in [
            Operator::Equal,
            Operator::NotEqual,
            Operator::GreaterThan,
            Operator::GreaterEqualThan,
            Operator::LowerThan,
            Operator::LowerEqualThan,
            Operator::Exists,
            Operator::RegexMatch,
        ] {
            assert_eq!(Operator::from_keyword(op.keyword()), Some(op));
        }
        assert_eq!(Operator::from_keyword("$in"), None);
    }

    #[test]
    fn test_serialize_compiles() {
        let selector = select([equal("active", true)]).unwrap();
        let json = serde_json::to_value(&selector).unwrap();
        assert_eq!(json, json!({"active": {"$eq": true}}));
    }
}
