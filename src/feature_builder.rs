//! Feature vector construction for price model inference.
//!
//! Maps whatever the caller knows onto the exact column set the model was
//! trained on. Columns nobody supplied are sent as missing and left to the
//! imputation inside the trained pipeline.

use crate::types::features::{FeatureSchema, FeatureValue, FeatureVector, SuppliedFeatures};
use tracing::debug;

/// Build one row for `schema` from `supplied`.
///
/// Every schema column is present in the output, in schema order. Supplied
/// names outside the schema are dropped without error.
pub fn build(schema: &FeatureSchema, supplied: &SuppliedFeatures) -> FeatureVector {
    let values = schema
        .columns()
        .iter()
        .map(|column| supplied.get(column).cloned().unwrap_or(FeatureValue::Missing))
        .collect();

    let dropped: Vec<&str> = supplied
        .keys()
        .filter(|name| !schema.contains(name))
        .map(String::as_str)
        .collect();
    if !dropped.is_empty() {
        debug!(dropped = ?dropped, "Supplied features not in schema were ignored");
    }

    FeatureVector::new(schema, values)
}

/// How a set of supplied values lines up with the schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coverage {
    /// Schema columns that receive a supplied value
    pub filled: Vec<String>,
    /// Schema columns that will be sent as missing
    pub missing: Vec<String>,
    /// Supplied names the schema does not know
    pub dropped: Vec<String>,
}

/// Feature builder bound to one schema.
pub struct FeatureBuilder<'a> {
    schema: &'a FeatureSchema,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(schema: &'a FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn build(&self, supplied: &SuppliedFeatures) -> FeatureVector {
        build(self.schema, supplied)
    }

    /// Report which columns `supplied` fills, which stay missing and which
    /// supplied names would be dropped.
    pub fn coverage(&self, supplied: &SuppliedFeatures) -> Coverage {
        let (filled, missing): (Vec<String>, Vec<String>) = self
            .schema
            .columns()
            .iter()
            .cloned()
            .partition(|column| supplied.contains_key(column));

        let mut dropped: Vec<String> = supplied
            .keys()
            .filter(|name| !self.schema.contains(name))
            .cloned()
            .collect();
        dropped.sort();

        Coverage {
            filled,
            missing,
            dropped,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.schema.len()
    }

    pub fn feature_names(&self) -> &[String] {
        self.schema.columns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> FeatureSchema {
        FeatureSchema::from_columns(names.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn supplied(pairs: &[(&str, FeatureValue)]) -> SuppliedFeatures {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_build_drops_unknown_and_fills_missing() {
        let schema = schema(&["accommodates", "bedrooms", "neighbourhood_cleansed"]);
        let supplied = supplied(&[
            ("accommodates", FeatureValue::Integer(4)),
            ("bedrooms", FeatureValue::Integer(1)),
            ("room_type", FeatureValue::Text("Private room".to_string())),
        ]);

        let row = build(&schema, &supplied);

        assert_eq!(row.len(), 3);
        assert_eq!(row.get("accommodates"), Some(&FeatureValue::Integer(4)));
        assert_eq!(row.get("bedrooms"), Some(&FeatureValue::Integer(1)));
        assert_eq!(row.get("neighbourhood_cleansed"), Some(&FeatureValue::Missing));
        assert_eq!(row.get("room_type"), None);
    }

    #[test]
    fn test_build_empty_supplied_is_all_missing() {
        let schema = schema(&["accommodates", "bedrooms", "review_scores_rating"]);
        let row = build(&schema, &SuppliedFeatures::new());

        assert_eq!(row.len(), schema.len());
        assert_eq!(row.missing_count(), 3);
        assert!(row.iter().all(|(_, value)| value.is_missing()));
    }

    #[test]
    fn test_build_key_set_equals_schema() {
        let schema = schema(&["a", "b", "c", "d"]);
        let cases = [
            supplied(&[]),
            supplied(&[("a", FeatureValue::Flag(true))]),
            supplied(&[("x", 1_i64.into()), ("y", 2_i64.into()), ("z", 3_i64.into())]),
            supplied(&[
                ("a", 1.5_f64.into()),
                ("b", "text".into()),
                ("c", FeatureValue::Missing),
                ("d", 0_i64.into()),
                ("e", false.into()),
            ]),
        ];

        for case in &cases {
            let row = build(&schema, case);
            let names: Vec<&str> = row.names().collect();
            assert_eq!(names, vec!["a", "b", "c", "d"]);
        }
    }

    #[test]
    fn test_unknown_keys_have_no_effect() {
        let schema = schema(&["accommodates", "bedrooms"]);
        let base = supplied(&[("accommodates", 2_i64.into())]);
        let mut extended = base.clone();
        extended.insert("room_type".to_string(), "Shared room".into());
        extended.insert("price".to_string(), 99.0_f64.into());

        assert_eq!(build(&schema, &base), build(&schema, &extended));
    }

    #[test]
    fn test_build_is_idempotent() {
        let schema = schema(&["accommodates", "bathrooms", "host_is_superhost"]);
        let supplied = supplied(&[("bathrooms", 1.5_f64.into()), ("host_is_superhost", true.into())]);

        assert_eq!(build(&schema, &supplied), build(&schema, &supplied));
    }

    #[test]
    fn test_builder_matches_free_function() {
        let schema = schema(&["accommodates", "room_type"]);
        let supplied = supplied(&[("room_type", "Hotel room".into()), ("bedrooms", 2_i64.into())]);

        let row = FeatureBuilder::new(&schema).build(&supplied);

        assert_eq!(row, build(&schema, &supplied));
        assert_eq!(row.get("room_type"), Some(&FeatureValue::Text("Hotel room".to_string())));
    }

    #[test]
    fn test_coverage() {
        let schema = schema(&["accommodates", "bedrooms", "neighbourhood_cleansed"]);
        let builder = FeatureBuilder::new(&schema);
        let supplied = supplied(&[
            ("bedrooms", 1_i64.into()),
            ("room_type", "Private room".into()),
            ("amenities", 10_i64.into()),
        ]);

        let coverage = builder.coverage(&supplied);

        assert_eq!(coverage.filled, vec!["bedrooms".to_string()]);
        assert_eq!(
            coverage.missing,
            vec!["accommodates".to_string(), "neighbourhood_cleansed".to_string()]
        );
        assert_eq!(coverage.dropped, vec!["amenities".to_string(), "room_type".to_string()]);
        assert_eq!(builder.feature_count(), 3);
    }
}
