//! Output formatting - ASCII-only terminal rendering of assessments
//!
//! Everything renders into a `String` first so the layout can be tested
//! without a terminal; color is applied per `ColorMode`.

use attrisense_common::config::ColorMode;
use attrisense_common::schema::{FieldKind, FIELDS};
use attrisense_common::{AttriSenseError, Assessment, GaugeSpec, PredictionLabel, RiskTier};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::fmt::Write as _;
use std::time::Duration;

/// Cells in the terminal gauge.
const GAUGE_WIDTH: usize = 50;

/// Columns before the first gauge cell (`"  ["`).
const GAUGE_INDENT: usize = 3;

const SPINNER_INTERVAL_MS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Paint {
    Plain,
    Basic,
    TrueColor,
}

/// Renders assessments for the terminal.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    paint: Paint,
}

impl Renderer {
    pub fn new(mode: ColorMode) -> Self {
        let paint = match mode {
            ColorMode::None => Paint::Plain,
            ColorMode::Basic => Paint::Basic,
            ColorMode::Auto if !console::colors_enabled() => Paint::Plain,
            ColorMode::Auto => match std::env::var("COLORTERM").as_deref() {
                Ok("truecolor") | Ok("24bit") => Paint::TrueColor,
                _ => Paint::Basic,
            },
        };
        Self { paint }
    }

    #[cfg(test)]
    fn plain() -> Self {
        Self {
            paint: Paint::Plain,
        }
    }

    pub fn colored(&self) -> bool {
        self.paint != Paint::Plain
    }

    fn tier(&self, text: &str, tier: RiskTier) -> String {
        match self.paint {
            Paint::Plain => text.to_string(),
            Paint::Basic => match tier {
                RiskTier::Low => text.green().to_string(),
                RiskTier::Medium => text.yellow().to_string(),
                RiskTier::High => text.red().to_string(),
            },
            Paint::TrueColor => self.hex(text, tier.color()),
        }
    }

    fn hex(&self, text: &str, color: &str) -> String {
        match hex_rgb(color) {
            Some((r, g, b)) if self.paint == Paint::TrueColor => text.truecolor(r, g, b).to_string(),
            _ if self.paint == Paint::Plain => text.to_string(),
            _ => text.dimmed().to_string(),
        }
    }

    fn bold(&self, text: &str) -> String {
        match self.paint {
            Paint::Plain => text.to_string(),
            _ => text.bold().to_string(),
        }
    }

    fn dimmed(&self, text: &str) -> String {
        match self.paint {
            Paint::Plain => text.to_string(),
            _ => text.dimmed().to_string(),
        }
    }

    /// Full report for one assessment.
    pub fn assessment(&self, assessment: &Assessment) -> String {
        let mut out = String::new();
        let headline_tier = match assessment.prediction.label {
            PredictionLabel::AttritionRisk => RiskTier::High,
            PredictionLabel::Retain => RiskTier::Low,
        };

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.bold(&self.tier(assessment.headline(), headline_tier)));
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "  Risk tier: {}",
            self.tier(assessment.risk_label(), assessment.tier)
        );
        out.push_str(&self.gauge(&assessment.gauge));
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", assessment.probability_sentence());

        let _ = writeln!(out);
        match assessment.recommendation.unavailable() {
            None => {
                let _ = writeln!(out, "[RETENTION SUGGESTIONS]");
            }
            Some(unavailable) => {
                let _ = writeln!(
                    out,
                    "[WARNING] {} ({})",
                    self.tier("AI Suggestions Unavailable", RiskTier::Medium),
                    unavailable.reason
                );
                let _ = writeln!(out, "[GENERAL RETENTION ADVICE]");
            }
        }
        let _ = writeln!(out, "{}", assessment.recommendation.text().trim_end());

        let factors = &assessment.prediction.top_features;
        if !factors.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "[TOP FACTORS]");
            for factor in factors {
                let tier = if factor.value > 0.0 {
                    RiskTier::High
                } else {
                    RiskTier::Low
                };
                let _ = writeln!(
                    out,
                    "  {}  {}",
                    self.tier(&format!("{:+.2}", factor.value), tier),
                    factor.feature
                );
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}",
            self.dimmed(&format!(
                "Assessment {} * {}",
                assessment.id,
                assessment.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            ))
        );
        out
    }

    /// Three-line gauge: colored bar with the value, needle, axis labels.
    pub fn gauge(&self, gauge: &GaugeSpec) -> String {
        let span = gauge.axis_max - gauge.axis_min;
        let position = |value: f64| -> usize {
            let frac = ((value - gauge.axis_min) / span).clamp(0.0, 1.0);
            (frac * GAUGE_WIDTH as f64).round() as usize
        };
        let filled = position(gauge.value);

        let mut bar = String::new();
        for i in 0..GAUGE_WIDTH {
            let at = gauge.axis_min + (i as f64 + 0.5) / GAUGE_WIDTH as f64 * span;
            let tier = gauge
                .bands
                .iter()
                .find(|b| at >= b.from && at < b.to)
                .map(|b| b.tier)
                .unwrap_or(gauge.tier);
            let cell = if i < filled { "#" } else { "-" };
            bar.push_str(&self.tier(cell, tier));
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}[{}] {}",
            " ".repeat(GAUGE_INDENT - 1),
            bar,
            self.bold(&self.tier(
                &format!("{:.2}{}", gauge.value, gauge.number_suffix),
                gauge.tier
            ))
        );

        let needle = GAUGE_INDENT + filled.min(GAUGE_WIDTH - 1);
        let _ = writeln!(
            out,
            "{}{}",
            " ".repeat(needle),
            self.hex("^", &gauge.bar_color)
        );

        let mut marks = vec![gauge.axis_min];
        marks.extend(gauge.bands.iter().map(|b| b.to));
        let _ = writeln!(out, "{}", axis_line(&marks, position).trim_end());
        out
    }

    /// `[OK]` line for a finished check.
    pub fn success(&self, message: &str) -> String {
        format!("[OK] {}", self.tier(message, RiskTier::Low))
    }

    /// Feature contract table.
    pub fn schema(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}",
            self.bold(&format!("{:<26} {:<12} {}", "FIELD", "TYPE", "DOMAIN"))
        );
        for field in FIELDS.iter() {
            let _ = writeln!(
                out,
                "{:<26} {:<12} {}",
                field.name,
                field.kind.type_name(),
                field.kind.domain()
            );
            if let (Some(labels), FieldKind::Integer { min, .. }) = (field.labels, field.kind) {
                let levels: Vec<String> = labels
                    .iter()
                    .zip(min..)
                    .map(|(label, value)| format!("{}={}", value, label))
                    .collect();
                let _ = writeln!(out, "{:<39} {}", "", self.dimmed(&levels.join(", ")));
            }
        }
        out
    }
}

/// Axis labels placed under their gauge columns.
fn axis_line(marks: &[f64], position: impl Fn(f64) -> usize) -> String {
    let mut line = vec![b' '; GAUGE_INDENT + GAUGE_WIDTH + 4];
    for (i, mark) in marks.iter().enumerate() {
        let label = format!("{}", mark.round() as i64);
        let column = GAUGE_INDENT + position(*mark);
        let start = if i == 0 {
            column
        } else if i == marks.len() - 1 {
            column.saturating_sub(label.len())
        } else {
            column.saturating_sub(label.len() / 2)
        };
        for (offset, byte) in label.bytes().enumerate() {
            if let Some(slot) = line.get_mut(start + offset) {
                *slot = byte;
            }
        }
    }
    String::from_utf8_lossy(&line).into_owned()
}

/// `#RRGGBB` to components.
fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Busy indicator on stderr while the provider call runs.
pub fn spinner(message: &str, colored: bool) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = if colored {
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.magenta} {msg}")
    } else {
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/"])
            .template("{spinner} {msg}")
    };
    if let Ok(style) = style {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(SPINNER_INTERVAL_MS));
    spinner
}

/// Print a command failure, listing every validation problem.
pub fn display_failure(error: &anyhow::Error) {
    let colored = console::colors_enabled_stderr();
    let red = |text: &str| {
        if colored {
            text.red().to_string()
        } else {
            text.to_string()
        }
    };

    eprintln!();
    match error.downcast_ref::<AttriSenseError>() {
        Some(AttriSenseError::Validation(report)) => {
            eprintln!(
                "[ERROR] {}",
                red(&format!("Invalid input ({} problems)", report.0.len()))
            );
            for problem in &report.0 {
                eprintln!("  * {}", problem);
            }
        }
        _ => eprintln!("[ERROR] {}", red(&format!("{:#}", error))),
    }
    eprintln!();
}


#[cfg(test)]
mod tests {
    use super::*;
    use attrisense_common::error::InferenceError;
    use attrisense_common::provider::{FakeTextProvider, ProviderError};
    use attrisense_common::{
        render_gauge, AttritionClassifier, FeatureRecord, InferenceAdapter, Orchestrator,
        RawInputSet, RecommendationRequester,
    };
    use std::sync::Arc;

    struct Fixed(f64);

    impl AttritionClassifier for Fixed {
        fn predict(&self, _record: &FeatureRecord) -> Result<u8, InferenceError> {
            Ok(u8::from(self.0 >= 0.5))
        }

        fn predict_proba(&self, _record: &FeatureRecord) -> Result<f64, InferenceError> {
            Ok(self.0)
        }
    }

    fn render(p: f64, provider: FakeTextProvider) -> String {
        let mut orchestrator = Orchestrator::new(
            InferenceAdapter::new(Arc::new(Fixed(p))),
            RecommendationRequester::new(Arc::new(provider)),
        );
        let assessment = orchestrator.predict(&RawInputSet::form_defaults()).unwrap();
        Renderer::plain().assessment(assessment)
    }

    #[test]
    fn test_gauge_fill_and_axis() {
        let text = Renderer::plain().gauge(&render_gauge(0.82));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        assert!(lines[0].starts_with("  ["));
        assert_eq!(lines[0].matches('#').count(), 41);
        assert!(lines[0].ends_with("] 82.00%"));

        assert_eq!(lines[1].find('^'), Some(GAUGE_INDENT + 41));

        let axis = lines[2];
        assert_eq!(axis.find('0'), Some(GAUGE_INDENT));
        assert_eq!(axis.find("40"), Some(GAUGE_INDENT + 19));
        assert_eq!(axis.find("70"), Some(GAUGE_INDENT + 34));
        assert!(axis.ends_with("100"));
    }

    #[test]
    fn test_gauge_extremes() {
        let empty = Renderer::plain().gauge(&render_gauge(0.0));
        assert_eq!(empty.lines().next().unwrap().matches('#').count(), 0);
        assert_eq!(empty.lines().nth(1).unwrap().find('^'), Some(GAUGE_INDENT));

        let full = Renderer::plain().gauge(&render_gauge(1.0));
        assert_eq!(full.lines().next().unwrap().matches('#').count(), GAUGE_WIDTH);
    }

    #[test]
    fn test_generated_advice() {
        let text = render(0.82, FakeTextProvider::always_ok("Offer a flexible schedule."));
        assert!(text.contains("High Risk of Employee Attrition"));
        assert!(text.contains("Risk tier: High Risk"));
        assert!(text.contains("The predicted probability of attrition is 82.00%."));
        assert!(text.contains("[RETENTION SUGGESTIONS]\nOffer a flexible schedule."));
        assert!(!text.contains("Unavailable"));
    }

    #[test]
    fn test_fallback_warning_names_reason() {
        let text = render(
            0.25,
            FakeTextProvider::always_error(ProviderError::QuotaExceeded),
        );
        assert!(text.contains("Low Risk of Employee Attrition"));
        assert!(text.contains("[WARNING] AI Suggestions Unavailable (Provider quota exceeded)"));
        assert!(text.contains("[GENERAL RETENTION ADVICE]"));
        assert!(text.contains("career growth"));
    }

    #[test]
    fn test_schema_lists_contract() {
        let text = Renderer::plain().schema();
        for field in FIELDS.iter() {
            assert!(text.contains(field.name), "{} missing", field.name);
        }
        assert!(text.contains("{Yes, No}"));
        assert!(text.contains("1=Low, 2=Medium, 3=High, 4=Very High"));
    }

    #[test]
    fn test_hex_rgb() {
        assert_eq!(hex_rgb("#EF4444"), Some((0xEF, 0x44, 0x44)));
        assert_eq!(hex_rgb("#22c55e"), Some((0x22, 0xC5, 0x5E)));
        assert_eq!(hex_rgb("EF4444"), None);
        assert_eq!(hex_rgb("#EF44"), None);
    }

    #[test]
    fn test_success_respects_color_mode() {
        assert_eq!(
            Renderer::new(ColorMode::None).success("model ok"),
            "[OK] model ok"
        );
        let basic = Renderer::new(ColorMode::Basic).success("model ok");
        assert!(basic.starts_with("[OK] \u{1b}["), "{:?}", basic);
        assert!(basic.contains("model ok"));
    }

    #[test]
    fn test_color_mode_none_is_plain() {
        assert!(!Renderer::new(ColorMode::None).colored());
        assert!(Renderer::new(ColorMode::Basic).colored());
    }
}
