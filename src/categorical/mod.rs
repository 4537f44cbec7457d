//! # Categorical input model
//!
//! Observations are loosely typed records: each maps a subset of variable names to a single
//! [`CategoryValue`]. The [`CategorySchema`] fixes the universe of categories per variable and
//! the column order of the indicator matrix. Rows are validated against the schema at call time.

use std::collections::HashMap;
use std::fmt;

/// A single category value.
///
/// Integers and floats compare numerically with each other, so `Int(1)` matches `Float(1.0)`.
/// Values of any other differing kinds never match.
#[derive(Debug, Clone)]
pub enum CategoryValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl PartialEq for CategoryValue {
    fn eq(&self, other: &Self) -> bool {
        use CategoryValue::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => (*a as f64) == *b,
            (Text(a), Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::Bool(v) => write!(f, "{}", v),
            CategoryValue::Int(v) => write!(f, "{}", v),
            CategoryValue::Float(v) => write!(f, "{}", v),
            CategoryValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for CategoryValue {
    fn from(value: bool) -> Self {
        CategoryValue::Bool(value)
    }
}

impl From<i32> for CategoryValue {
    fn from(value: i32) -> Self {
        CategoryValue::Int(value as i64)
    }
}

impl From<i64> for CategoryValue {
    fn from(value: i64) -> Self {
        CategoryValue::Int(value)
    }
}

impl From<u32> for CategoryValue {
    fn from(value: u32) -> Self {
        CategoryValue::Int(value as i64)
    }
}

impl From<f64> for CategoryValue {
    fn from(value: f64) -> Self {
        CategoryValue::Float(value)
    }
}

impl From<&str> for CategoryValue {
    fn from(value: &str) -> Self {
        CategoryValue::Text(value.to_string())
    }
}

impl From<String> for CategoryValue {
    fn from(value: String) -> Self {
        CategoryValue::Text(value)
    }
}

/// Ordered mapping from variable name to its allowed categories.
///
/// Declaration order is the column-block order of the indicator matrix. Re-declaring a variable
/// replaces its categories in place. Repeated categories within one variable keep their first
/// position only.
#[derive(Debug, Clone, Default)]
pub struct CategorySchema {
    variables: Vec<(String, Vec<CategoryValue>)>,
}

impl CategorySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a variable, builder style.
    pub fn variable<S, I, V>(mut self, name: S, categories: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<CategoryValue>,
    {
        self.insert(name, categories);
        self
    }

    pub fn insert<S, I, V>(&mut self, name: S, categories: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<CategoryValue>,
    {
        let name = name.into();
        let mut deduped: Vec<CategoryValue> = Vec::new();
        for value in categories.into_iter().map(Into::into) {
            if !deduped.contains(&value) {
                deduped.push(value);
            }
        }

        match self.variables.iter_mut().find(|(n, _)| *n == name) {
            Some((_, cats)) => *cats = deduped,
            None => self.variables.push((name, deduped)),
        }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.iter().any(|(n, _)| n == name)
    }

    pub fn categories(&self, name: &str) -> Option<&[CategoryValue]> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cats)| cats.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CategoryValue])> {
        self.variables
            .iter()
            .map(|(name, cats)| (name.as_str(), cats.as_slice()))
    }
}

/// One observation: a value per variable it specifies. Omitted variables are missing.
#[derive(Debug, Clone, Default)]
pub struct Observation {
    values: HashMap<String, CategoryValue>,
}

impl Observation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<S: Into<String>, V: Into<CategoryValue>>(mut self, variable: S, value: V) -> Self {
        self.set(variable, value);
        self
    }

    pub fn set<S: Into<String>, V: Into<CategoryValue>>(&mut self, variable: S, value: V) {
        self.values.insert(variable.into(), value.into());
    }

    pub fn get(&self, variable: &str) -> Option<&CategoryValue> {
        self.values.get(variable)
    }

    pub fn remove(&mut self, variable: &str) -> Option<CategoryValue> {
        self.values.remove(variable)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>, V: Into<CategoryValue>> FromIterator<(S, V)> for Observation {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut obs = Observation::new();
        for (k, v) in iter {
            obs.set(k, v);
        }
        obs
    }
}
