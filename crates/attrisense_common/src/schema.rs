//! Feature contract shared by the input validator, the feature builder and
//! the model artifact loader.
//!
//! The pipeline artifact is fit on exactly these fields, in exactly this
//! order. Any change here must bump [`SCHEMA_VERSION`] and ship a retrained
//! artifact; the loader rejects artifacts built for another version.

/// Version of the feature contract the artifact must declare.
pub const SCHEMA_VERSION: u32 = 1;

/// Number of fields in a feature record.
pub const FEATURE_COUNT: usize = 24;

pub const GENDERS: &[&str] = &["Male", "Female"];
pub const MARITAL_STATUSES: &[&str] = &["Single", "Married", "Divorced"];
pub const DEPARTMENTS: &[&str] = &["Sales", "Research & Development", "Human Resources"];
pub const JOB_ROLES: &[&str] = &[
    "Sales Executive",
    "Research Scientist",
    "Laboratory Technician",
    "Manufacturing Director",
    "Healthcare Representative",
    "Manager",
    "Sales Representative",
    "Research Director",
    "Human Resources",
];
pub const EDUCATION_FIELDS: &[&str] = &[
    "Life Sciences",
    "Medical",
    "Marketing",
    "Technical Degree",
    "Human Resources",
    "Other",
];
pub const OVER_TIME: &[&str] = &["Yes", "No"];
pub const BUSINESS_TRAVEL: &[&str] = &["Non-Travel", "Travel_Rarely", "Travel_Frequently"];

const EDUCATION_LEVELS: &[&str] = &["Below College", "College", "Bachelor", "Master", "Doctor"];
const JOB_LEVELS: &[&str] = &["Entry Level", "Junior", "Mid Level", "Senior", "Executive"];
const STOCK_LEVELS: &[&str] = &["None", "Low", "Medium", "High"];
const SATISFACTION_LEVELS: &[&str] = &["Low", "Medium", "High", "Very High"];
const BALANCE_LEVELS: &[&str] = &["Bad", "Good", "Better", "Best"];

/// Value domain of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Inclusive integer range; `max: None` is unbounded above.
    Integer { min: i64, max: Option<i64> },
    /// One of a fixed set of category strings.
    Categorical(&'static [&'static str]),
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Integer { .. } => "integer",
            FieldKind::Categorical(_) => "categorical",
        }
    }

    /// Human-readable domain, e.g. `18-60` or `{Yes, No}`.
    pub fn domain(&self) -> String {
        match self {
            FieldKind::Integer { min, max: Some(max) } => format!("{}-{}", min, max),
            FieldKind::Integer { min, max: None } => format!(">={}", min),
            FieldKind::Categorical(categories) => format!("{{{}}}", categories.join(", ")),
        }
    }
}

/// One column of the feature contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Form labels for ordinal levels, indexed from `min`.
    pub labels: Option<&'static [&'static str]>,
}

impl FieldSpec {
    const fn integer(name: &'static str, min: i64, max: i64) -> Self {
        Self {
            name,
            kind: FieldKind::Integer { min, max: Some(max) },
            labels: None,
        }
    }

    const fn ordinal(name: &'static str, min: i64, labels: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: FieldKind::Integer {
                min,
                max: Some(min + labels.len() as i64 - 1),
            },
            labels: Some(labels),
        }
    }

    const fn categorical(name: &'static str, categories: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: FieldKind::Categorical(categories),
            labels: None,
        }
    }

    /// Form label for an ordinal value, if this field has labels.
    pub fn label_for(&self, value: i64) -> Option<&'static str> {
        let labels = self.labels?;
        let FieldKind::Integer { min, .. } = self.kind else {
            return None;
        };
        usize::try_from(value - min)
            .ok()
            .and_then(|i| labels.get(i).copied())
    }

    /// Canonical schema string for a category, matched exactly.
    pub fn category(&self, value: &str) -> Option<&'static str> {
        match self.kind {
            FieldKind::Categorical(categories) => categories.iter().copied().find(|c| *c == value),
            FieldKind::Integer { .. } => None,
        }
    }
}

/// The ordered feature contract.
pub static FIELDS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec::integer("Age", 18, 60),
    FieldSpec::categorical("Gender", GENDERS),
    FieldSpec::categorical("MaritalStatus", MARITAL_STATUSES),
    FieldSpec::categorical("Department", DEPARTMENTS),
    FieldSpec::categorical("JobRole", JOB_ROLES),
    FieldSpec::ordinal("Education", 1, EDUCATION_LEVELS),
    FieldSpec::categorical("EducationField", EDUCATION_FIELDS),
    FieldSpec::ordinal("JobLevel", 1, JOB_LEVELS),
    FieldSpec {
        name: "MonthlyIncome",
        kind: FieldKind::Integer { min: 1000, max: None },
        labels: None,
    },
    FieldSpec::integer("PercentSalaryHike", 0, 30),
    FieldSpec::ordinal("StockOptionLevel", 0, STOCK_LEVELS),
    FieldSpec::categorical("OverTime", OVER_TIME),
    FieldSpec::categorical("BusinessTravel", BUSINESS_TRAVEL),
    FieldSpec::ordinal("JobSatisfaction", 1, SATISFACTION_LEVELS),
    FieldSpec::ordinal("EnvironmentSatisfaction", 1, SATISFACTION_LEVELS),
    FieldSpec::ordinal("RelationshipSatisfaction", 1, SATISFACTION_LEVELS),
    FieldSpec::ordinal("WorkLifeBalance", 1, BALANCE_LEVELS),
    FieldSpec::ordinal("JobInvolvement", 1, SATISFACTION_LEVELS),
    FieldSpec::integer("TotalWorkingYears", 0, 40),
    FieldSpec::integer("YearsAtCompany", 0, 40),
    FieldSpec::integer("YearsInCurrentRole", 0, 20),
    FieldSpec::integer("YearsWithCurrManager", 0, 20),
    FieldSpec::integer("YearsSinceLastPromotion", 0, 15),
    FieldSpec::integer("NumCompaniesWorked", 0, 10),
];

/// Position of a field in the contract.
pub fn index_of(name: &str) -> Option<usize> {
    FIELDS.iter().position(|f| f.name == name)
}

/// Field spec by name.
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Ordered field names.
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.name)
}
