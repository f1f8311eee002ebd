//! Feature schema and single-row feature vector types

use crate::error::SchemaError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A single feature cell. `Missing` marks a column nobody supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Missing,
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl FeatureValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FeatureValue::Missing)
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Missing => f.write_str("<missing>"),
            FeatureValue::Text(s) => write!(f, "{:?}", s),
            FeatureValue::Integer(i) => write!(f, "{}", i),
            FeatureValue::Float(x) => write!(f, "{}", x),
            FeatureValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Integer(value)
    }
}

impl From<u32> for FeatureValue {
    fn from(value: u32) -> Self {
        FeatureValue::Integer(i64::from(value))
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Float(value)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Flag(value)
    }
}

/// Caller-supplied values keyed by column name. May hold names the schema lacks.
pub type SuppliedFeatures = HashMap<String, FeatureValue>;

/// Ordered set of column names the model was trained on.
///
/// Cloning is cheap: rows built from a schema share its columns and index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Arc<[String]>,
    index: Arc<HashMap<String, usize>>,
}

impl FeatureSchema {
    pub fn from_columns(columns: Vec<String>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (position, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), position).is_some() {
                return Err(SchemaError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self {
            columns: columns.into(),
            index: Arc::new(index),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// One row holding exactly the schema's columns, in schema order.
///
/// Only the feature builder constructs these, so the column set always
/// matches the schema it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: FeatureSchema,
    values: Vec<FeatureValue>,
}

impl FeatureVector {
    /// `values` must hold one entry per schema column, in schema order
    pub(crate) fn new(schema: &FeatureSchema, values: Vec<FeatureValue>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self {
            schema: schema.clone(),
            values,
        }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.schema.position(name).map(|position| &self.values[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schema.columns().iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of columns left at the missing sentinel
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_missing()).count()
    }
}
