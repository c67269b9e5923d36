//! Raw form input: one entry per contract field, as the user entered it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{ValidationError, ValidationReport};
use crate::schema::{self, FieldKind, FIELDS};

/// A single user-entered value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Integer(v) => write!(f, "{}", v),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Integer(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Integer(i64::from(v))
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// Field name to raw value, as submitted by the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInputSet {
    values: BTreeMap<String, RawValue>,
}

impl RawInputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<RawValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<RawValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The values the entry form starts with.
    pub fn form_defaults() -> Self {
        Self::new()
            .with("Age", 30)
            .with("Gender", "Male")
            .with("MaritalStatus", "Single")
            .with("Department", "Sales")
            .with("JobRole", "Sales Executive")
            .with("Education", 1)
            .with("EducationField", "Life Sciences")
            .with("JobLevel", 1)
            .with("MonthlyIncome", 5000)
            .with("PercentSalaryHike", 12)
            .with("StockOptionLevel", 0)
            .with("OverTime", "Yes")
            .with("BusinessTravel", "Non-Travel")
            .with("JobSatisfaction", 1)
            .with("EnvironmentSatisfaction", 1)
            .with("RelationshipSatisfaction", 1)
            .with("WorkLifeBalance", 1)
            .with("JobInvolvement", 1)
            .with("TotalWorkingYears", 8)
            .with("YearsAtCompany", 5)
            .with("YearsInCurrentRole", 3)
            .with("YearsWithCurrManager", 3)
            .with("YearsSinceLastPromotion", 2)
            .with("NumCompaniesWorked", 2)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse input as TOML")
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse input as JSON")
    }

    /// Load from a `.json` or `.toml` file (TOML for any other extension).
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let parsed = if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        };
        parsed.with_context(|| format!("Invalid input file {}", path.display()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        // Emit in contract order so the template reads like the form.
        let mut out = String::new();
        for spec in FIELDS.iter() {
            if let Some(value) = self.values.get(spec.name) {
                let rendered = match value {
                    RawValue::Integer(v) => v.to_string(),
                    RawValue::Text(s) => toml::Value::String(s.clone()).to_string(),
                };
                out.push_str(&format!("{} = {}\n", spec.name, rendered));
            }
        }
        for (name, value) in &self.values {
            if schema::index_of(name).is_none() {
                let rendered = toml::to_string(&BTreeMap::from([(name, value)]))
                    .context("Failed to serialize input")?;
                out.push_str(&rendered);
            }
        }
        Ok(out)
    }

    /// Check every field against the contract, reporting all violations.
    pub fn validate(&self) -> Result<(), ValidationReport> {
        let mut errors = Vec::new();

        for spec in FIELDS.iter() {
            match self.values.get(spec.name) {
                None => errors.push(ValidationError::MissingField(spec.name)),
                Some(value) => {
                    if let Err(e) = check_value(spec.name, spec.kind, value) {
                        errors.push(e);
                    }
                }
            }
        }

        for name in self.values.keys() {
            if schema::index_of(name).is_none() {
                errors.push(ValidationError::UnknownField(name.clone()));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport(errors))
        }
    }
}

/// Check one value against its field kind.
pub(crate) fn check_value(
    field: &'static str,
    kind: FieldKind,
    value: &RawValue,
) -> Result<(), ValidationError> {
    match (kind, value) {
        (FieldKind::Integer { min, max }, RawValue::Integer(v)) => {
            let above = max.map(|m| *v > m).unwrap_or(false);
            if *v < min || above {
                return Err(ValidationError::OutOfRange {
                    field,
                    value: *v,
                    min,
                    max,
                });
            }
            Ok(())
        }
        (FieldKind::Categorical(categories), RawValue::Text(s)) => {
            if categories.contains(&s.as_str()) {
                Ok(())
            } else {
                Err(ValidationError::UnknownCategory {
                    field,
                    value: s.clone(),
                })
            }
        }
        (kind, _) => Err(ValidationError::WrongType {
            field,
            expected: kind.type_name(),
        }),
    }
}
