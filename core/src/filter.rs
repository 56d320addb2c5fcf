//! Filter expressions and their compilation into a parameterized WHERE fragment.
//!
//! A [`Filter`] is an ordered list of entries. Column entries hold one or more
//! comparisons against that column; connective entries (`AND`/`OR`) and nested
//! groups may appear between them.
//!
//! # Evaluation order
//!
//! Entries are emitted strictly in the order they were added, and nested
//! groups are inlined **without parentheses**. No precedence grouping is
//! performed, so a mixed chain such as `a OR b AND c` is evaluated by the
//! database's own rules (`a OR (b AND c)`), not as written from left to right.
//! Callers that need a different grouping must order their entries
//! accordingly.
//!
//! # Wire shape
//!
//! [`Filter::from_json`] accepts the nested object form callers assemble from
//! request parameters:
//!
//! ```json
//! {
//!   "event_id": { "=": "E1" },
//!   "0": "OR",
//!   "status": [{ "=": "cancelled" }, "OR", { "=": "pending" }]
//! }
//! ```
//!
//! Keys that are non-negative integers introduce a connective or a nested
//! group; every other key is a column.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::{RepoError, Result};
use crate::sql::{CompiledQuery, Params, VALUE_PLACEHOLDER};
use crate::value::Value;

/// Comparison operators accepted in a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    /// `<>`
    Ne,
    /// `!=`
    NotEq,
    Like,
    NotLike,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Self::Eq,
        Self::Lt,
        Self::Gt,
        Self::Le,
        Self::Ge,
        Self::Ne,
        Self::NotEq,
        Self::Like,
        Self::NotLike,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Ne => "<>",
            Self::NotEq => "!=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }
}

impl FromStr for Operator {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| RepoError::InvalidOperator(s.to_owned()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Parses an `"AND"` / `"OR"` marker. Markers are case-sensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }
}

/// One item in a column's condition list.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column <operator> value`; the operator is checked when compiling
    Compare {
        operator: Cow<'static, str>,
        value: Value,
    },
    Connective(Connective),
    /// Nested condition list on the same column, inlined when compiled
    Group(Vec<Condition>),
}

impl Condition {
    pub fn compare(operator: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self::Compare {
            operator: operator.into(),
            value: value.into(),
        }
    }

    pub const fn and() -> Self {
        Self::Connective(Connective::And)
    }

    pub const fn or() -> Self {
        Self::Connective(Connective::Or)
    }

    fn op(operator: Operator, value: impl Into<Value>) -> Self {
        Self::compare(operator.as_str(), value)
    }
}

pub fn eq(value: impl Into<Value>) -> Condition {
    Condition::op(Operator::Eq, value)
}

pub fn lt(value: impl Into<Value>) -> Condition {
    Condition::op(Operator::Lt, value)
}

pub fn gt(value: impl Into<Value>) -> Condition {
    Condition::op(Operator::Gt, value)
}

pub fn le(value: impl Into<Value>) -> Condition {
    Condition::op(Operator::Le, value)
}

pub fn ge(value: impl Into<Value>) -> Condition {
    Condition::op(Operator::Ge, value)
}

/// `<>`
pub fn ne(value: impl Into<Value>) -> Condition {
    Condition::op(Operator::Ne, value)
}

/// `!=`
pub fn not_eq(value: impl Into<Value>) -> Condition {
    Condition::op(Operator::NotEq, value)
}

pub fn like(value: impl Into<Value>) -> Condition {
    Condition::op(Operator::Like, value)
}

pub fn not_like(value: impl Into<Value>) -> Condition {
    Condition::op(Operator::NotLike, value)
}

pub type Conditions = SmallVec<[Condition; 2]>;

/// Anything usable as the condition list of a column entry.
pub trait IntoConditions {
    fn into_conditions(self) -> Conditions;
}

impl IntoConditions for Condition {
    fn into_conditions(self) -> Conditions {
        smallvec::smallvec![self]
    }
}

impl IntoConditions for Vec<Condition> {
    fn into_conditions(self) -> Conditions {
        Conditions::from_vec(self)
    }
}

impl<const N: usize> IntoConditions for [Condition; N] {
    fn into_conditions(self) -> Conditions {
        self.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Column {
        column: String,
        conditions: Conditions,
    },
    /// Nested filter, inlined when compiled
    Group(Filter),
    Connective(Connective),
}

/// A structured WHERE expression.
///
/// ```ignore
/// use datarepo::core::filter::{Filter, eq};
///
/// let filter = Filter::new()
///     .column("event_id", eq("E1"))
///     .or()
///     .column("status", eq("cancelled"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    entries: Vec<Entry>,
}

impl Filter {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Adds comparisons against `column`.
    pub fn column(mut self, column: impl Into<String>, conditions: impl IntoConditions) -> Self {
        self.entries.push(Entry::Column {
            column: column.into(),
            conditions: conditions.into_conditions(),
        });
        self
    }

    pub fn and(mut self) -> Self {
        self.entries.push(Entry::Connective(Connective::And));
        self
    }

    pub fn or(mut self) -> Self {
        self.entries.push(Entry::Connective(Connective::Or));
        self
    }

    pub fn group(mut self, nested: Filter) -> Self {
        self.entries.push(Entry::Group(nested));
        self
    }

    /// Parses the nested JSON wire shape described in the module docs.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let mut filter = Self::new();
        match json {
            serde_json::Value::Object(map) => {
                for (key, value) in map {
                    let entry = if is_index(key) {
                        positional_entry(value)?
                    } else {
                        Entry::Column {
                            column: key.clone(),
                            conditions: parse_conditions(key, value)?,
                        }
                    };
                    filter.push(entry);
                }
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    filter.push(positional_entry(item)?);
                }
            }
            serde_json::Value::Null => {}
            other => {
                return Err(RepoError::InvalidFilter(format!(
                    "expected an object, found {other}"
                )));
            }
        }
        Ok(filter)
    }

    /// Compiles this filter against `table`, allowing only `allowed` columns.
    pub fn compile(&self, table: &str, allowed: &[&str]) -> Result<CompiledQuery> {
        compile_filter(self, table, allowed)
    }
}

impl TryFrom<&serde_json::Value> for Filter {
    type Error = RepoError;

    fn try_from(json: &serde_json::Value) -> Result<Self> {
        Self::from_json(json)
    }
}

fn is_index(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

fn positional_entry(value: &serde_json::Value) -> Result<Entry> {
    match value {
        serde_json::Value::String(marker) => Connective::parse(marker)
            .map(Entry::Connective)
            .ok_or_else(|| RepoError::InvalidFilter(format!("unknown connective: {marker}"))),
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
            Filter::from_json(value).map(Entry::Group)
        }
        other => Err(RepoError::InvalidFilter(format!(
            "expected a connective or nested filter, found {other}"
        ))),
    }
}

fn parse_conditions(column: &str, value: &serde_json::Value) -> Result<Conditions> {
    let mut conditions = Conditions::new();
    match value {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                let condition = if is_index(key) {
                    positional_condition(column, key, value)?
                } else {
                    Condition::compare(key.clone(), Value::from_json(value.clone()))
                };
                conditions.push(condition);
            }
        }
        serde_json::Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                conditions.push(positional_condition(column, &index.to_string(), item)?);
            }
        }
        other => {
            return Err(RepoError::InvalidFilter(format!(
                "conditions for `{column}` must be an object or array, found {other}"
            )));
        }
    }
    Ok(conditions)
}

fn positional_condition(column: &str, key: &str, value: &serde_json::Value) -> Result<Condition> {
    if let serde_json::Value::String(marker) = value
        && let Some(connective) = Connective::parse(marker)
    {
        return Ok(Condition::Connective(connective));
    }
    Ok(match value {
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
            Condition::Group(parse_conditions(column, value)?.into_vec())
        }
        // A positional key in operator position: rejected when compiled.
        scalar => Condition::compare(key.to_owned(), Value::from_json(scalar.clone())),
    })
}

//------------------------------------------------------------------------------
// Compilation
//------------------------------------------------------------------------------

enum Token {
    Comparison(String),
    Connective { connective: Connective, implicit: bool },
}

struct FilterCompiler<'a> {
    table: &'a str,
    allowed: &'a [&'a str],
    tokens: Vec<Token>,
    params: Params,
    next_placeholder: usize,
}

/// Compiles `filter` into `table.column <op> :__valueN` comparisons joined by
/// connectives, plus the placeholder map.
///
/// Every column must be in `allowed` and every operator in [`Operator::ALL`];
/// anything else fails before SQL is produced. An empty filter compiles to an
/// empty fragment.
pub fn compile_filter(filter: &Filter, table: &str, allowed: &[&str]) -> Result<CompiledQuery> {
    let mut compiler = FilterCompiler {
        table,
        allowed,
        tokens: Vec::new(),
        params: Params::new(),
        next_placeholder: 0,
    };
    compiler.entries(filter)?;
    Ok(compiler.finish())
}

impl FilterCompiler<'_> {
    fn entries(&mut self, filter: &Filter) -> Result<()> {
        for entry in &filter.entries {
            match entry {
                Entry::Column { column, conditions } => {
                    if !self.allowed.contains(&column.as_str()) {
                        return Err(RepoError::InvalidColumn(column.clone()));
                    }
                    self.conditions(column, conditions)?;
                    self.connective(Connective::And, true);
                }
                Entry::Group(nested) => self.entries(nested)?,
                Entry::Connective(connective) => self.connective(*connective, false),
            }
        }
        Ok(())
    }

    fn conditions(&mut self, column: &str, conditions: &[Condition]) -> Result<()> {
        for condition in conditions {
            match condition {
                Condition::Compare { operator, value } => {
                    let operator: Operator = operator.parse()?;
                    // Adjacent comparisons without a marker are AND-ed.
                    self.connective(Connective::And, true);
                    let placeholder = format!("{VALUE_PLACEHOLDER}{}", self.next_placeholder);
                    self.next_placeholder += 1;
                    self.tokens.push(Token::Comparison(format!(
                        "{}.{column} {operator} {placeholder}",
                        self.table
                    )));
                    self.params.push(placeholder, value.clone());
                }
                Condition::Connective(connective) => self.connective(*connective, false),
                Condition::Group(nested) => self.conditions(column, nested)?,
            }
        }
        Ok(())
    }

    /// Appends a connective after a comparison. An explicit marker replaces
    /// a connective already in place; an implicit one never does.
    fn connective(&mut self, connective: Connective, implicit: bool) {
        match self.tokens.last_mut() {
            None => {}
            Some(Token::Comparison(_)) => self.tokens.push(Token::Connective {
                connective,
                implicit,
            }),
            Some(Token::Connective {
                connective: last,
                implicit: last_implicit,
            }) => {
                if !implicit {
                    *last = connective;
                    *last_implicit = false;
                }
            }
        }
    }

    fn finish(mut self) -> CompiledQuery {
        while matches!(self.tokens.last(), Some(Token::Connective { .. })) {
            self.tokens.pop();
        }
        let mut sql = String::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
            }
            match token {
                Token::Comparison(text) => sql.push_str(text),
                Token::Connective { connective, .. } => sql.push_str(connective.as_str()),
            }
        }
        CompiledQuery::new(sql, self.params)
    }
}
