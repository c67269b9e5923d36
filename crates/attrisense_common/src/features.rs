//! Feature vector builder.
//!
//! Turns a raw form submission into the single-row record the pipeline was
//! fit on: every contract field, in contract order, typed per the contract.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

use crate::error::ValidationError;
use crate::input::{check_value, RawInputSet, RawValue};
use crate::schema::{self, FieldKind, FEATURE_COUNT, FIELDS, SCHEMA_VERSION};

/// A typed feature value. Categories point at the contract's own strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Integer(i64),
    Category(&'static str),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Integer(v) => write!(f, "{}", v),
            FeatureValue::Category(c) => f.write_str(c),
        }
    }
}

/// One fixed-schema row. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    schema_version: u32,
    values: [FeatureValue; FEATURE_COUNT],
}

impl FeatureRecord {
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        schema::index_of(name).map(|i| self.values[i])
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            FeatureValue::Integer(v) => Some(v),
            FeatureValue::Category(_) => None,
        }
    }

    pub fn category(&self, name: &str) -> Option<&'static str> {
        match self.get(name)? {
            FeatureValue::Category(c) => Some(c),
            FeatureValue::Integer(_) => None,
        }
    }

    /// Fields in contract order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FeatureValue)> + '_ {
        FIELDS.iter().zip(self.values.iter()).map(|(spec, v)| (spec.name, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Build the feature record for one submission.
///
/// The caller is expected to have run [`RawInputSet::validate`]; fields
/// outside the contract are ignored here, and the first contract violation
/// met is returned rather than a full report.
pub fn build(raw: &RawInputSet) -> Result<FeatureRecord, ValidationError> {
    let mut values = [FeatureValue::Integer(0); FEATURE_COUNT];

    for (slot, spec) in values.iter_mut().zip(FIELDS.iter()) {
        let value = raw
            .get(spec.name)
            .ok_or(ValidationError::MissingField(spec.name))?;
        check_value(spec.name, spec.kind, value)?;

        *slot = match (spec.kind, value) {
            (FieldKind::Integer { .. }, RawValue::Integer(v)) => FeatureValue::Integer(*v),
            (FieldKind::Categorical(_), RawValue::Text(s)) => {
                let category = spec
                    .category(s)
                    .ok_or_else(|| ValidationError::UnknownCategory {
                        field: spec.name,
                        value: s.clone(),
                    })?;
                FeatureValue::Category(category)
            }
            (kind, _) => {
                return Err(ValidationError::WrongType {
                    field: spec.name,
                    expected: kind.type_name(),
                })
            }
        };
    }

    Ok(FeatureRecord {
        schema_version: SCHEMA_VERSION,
        values,
    })
}
