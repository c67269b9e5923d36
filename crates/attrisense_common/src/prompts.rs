//! Retention advice prompt.

use serde::{Deserialize, Serialize};

use crate::features::FeatureRecord;
use crate::inference::format_percent;
use crate::schema;

pub const RETENTION_PROMPT_INSTRUCTIONS: &str = "Suggest ethical, practical, and HR-focused actions \
to reduce employee attrition.";

/// Fields most often behind an attrition risk, passed to the provider as
/// context when available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptContext {
    pub job_satisfaction: i64,
    pub work_life_balance: i64,
    pub over_time: bool,
    pub monthly_income: i64,
    pub years_since_last_promotion: i64,
}

impl PromptContext {
    pub fn from_record(record: &FeatureRecord) -> Option<Self> {
        Some(Self {
            job_satisfaction: record.integer("JobSatisfaction")?,
            work_life_balance: record.integer("WorkLifeBalance")?,
            over_time: record.category("OverTime")? == "Yes",
            monthly_income: record.integer("MonthlyIncome")?,
            years_since_last_promotion: record.integer("YearsSinceLastPromotion")?,
        })
    }

    fn lines(&self) -> Vec<String> {
        vec![
            format!(
                "- Job satisfaction: {}",
                level("JobSatisfaction", self.job_satisfaction)
            ),
            format!(
                "- Work-life balance: {}",
                level("WorkLifeBalance", self.work_life_balance)
            ),
            format!("- Works overtime: {}", if self.over_time { "Yes" } else { "No" }),
            format!("- Monthly income: {}", self.monthly_income),
            format!(
                "- Years since last promotion: {}",
                self.years_since_last_promotion
            ),
        ]
    }
}

/// `3 (High)` when the field has form labels, else just the number.
fn level(field: &str, value: i64) -> String {
    match schema::field(field).and_then(|f| f.label_for(value)) {
        Some(label) => format!("{} ({})", value, label),
        None => value.to_string(),
    }
}

/// Prompt for one prediction.
pub fn build_prompt(probability: f64, context: Option<&PromptContext>) -> String {
    let mut prompt = format!(
        "An employee has an attrition probability of {}.\n",
        format_percent(probability)
    );
    if let Some(context) = context {
        prompt.push_str("\nRelevant employee factors:\n");
        for line in context.lines() {
            prompt.push_str(&line);
            prompt.push('\n');
        }
    }
    prompt.push('\n');
    prompt.push_str(RETENTION_PROMPT_INSTRUCTIONS);
    prompt
}
