//! Compiled SQL text and its named parameters.

use core::fmt;

use crate::value::{ParamType, Value};

/// Prefix of generated comparison placeholders: `:__value0`, `:__value1`, ...
pub const VALUE_PLACEHOLDER: &str = ":__value";
pub const LIMIT_PLACEHOLDER: &str = ":__limit";
pub const OFFSET_PLACEHOLDER: &str = ":__offset";
pub const ID_PLACEHOLDER: &str = ":__id";

/// A named parameter bound to a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Placeholder including its leading colon
    pub name: String,
    pub value: Value,
}

impl Param {
    #[inline]
    pub fn param_type(&self) -> ParamType {
        self.value.param_type()
    }
}

/// Ordered placeholder → value map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<Param>);

impl Params {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.0.push(Param {
            name: name.into(),
            value,
        });
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: Params) {
        self.0.extend(other.0);
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = core::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// SQL text plus the parameters it binds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Params,
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    #[inline]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
