//! Command implementations for attrisensectl

use anyhow::Context;
use attrisense_common::config::ColorMode;
use attrisense_common::{
    AttriSenseConfig, AttriSenseError, ConfigurationError, InferenceAdapter, Orchestrator,
    RawInputSet,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

use crate::output::{self, Renderer};

const EXIT_FAILURE: u8 = 1;
const EXIT_VALIDATION: u8 = 2;
const EXIT_CONFIGURATION: u8 = 3;

/// A failed command together with the exit status it maps to.
#[derive(Debug)]
pub struct CommandFailure {
    code: u8,
    error: anyhow::Error,
}

impl CommandFailure {
    fn new(code: u8, error: anyhow::Error) -> Self {
        Self { code, error }
    }

    /// Print the error and turn it into the process exit status.
    pub fn report(self) -> ExitCode {
        output::display_failure(&self.error);
        ExitCode::from(self.code)
    }
}

impl From<AttriSenseError> for CommandFailure {
    fn from(error: AttriSenseError) -> Self {
        let code = u8::try_from(error.code()).unwrap_or(EXIT_FAILURE);
        Self::new(code, error.into())
    }
}

impl From<ConfigurationError> for CommandFailure {
    fn from(error: ConfigurationError) -> Self {
        AttriSenseError::from(error).into()
    }
}

impl From<anyhow::Error> for CommandFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::new(EXIT_FAILURE, error)
    }
}

pub type CommandResult = std::result::Result<(), CommandFailure>;

/// Load configuration, applying the `--color` override.
pub fn load_config(
    path: Option<&Path>,
    color: Option<ColorMode>,
) -> std::result::Result<AttriSenseConfig, CommandFailure> {
    let mut config = AttriSenseConfig::load(path)
        .context("Failed to load configuration")
        .map_err(|e| CommandFailure::new(EXIT_CONFIGURATION, e))?;
    if let Some(color) = color {
        config.output.color = color;
    }
    debug!(
        "Model artifact: {}, provider: {} (enabled: {})",
        config.model.artifact_path.display(),
        config.provider.model,
        config.provider.enabled
    );
    Ok(config)
}

pub struct PredictArgs {
    pub input: PathBuf,
    pub model: Option<PathBuf>,
    pub json: bool,
    pub no_ai: bool,
}

/// Unreadable input files are plain failures; malformed content is invalid input.
fn input_failure(error: anyhow::Error) -> CommandFailure {
    let unreadable = error
        .chain()
        .any(|cause| cause.downcast_ref::<std::io::Error>().is_some());
    let code = if unreadable {
        EXIT_FAILURE
    } else {
        EXIT_VALIDATION
    };
    CommandFailure::new(code, error)
}

/// Score one employee record and render the assessment.
pub fn predict(mut config: AttriSenseConfig, args: PredictArgs) -> CommandResult {
    if let Some(model) = args.model {
        config.model.artifact_path = model;
    }
    if args.no_ai {
        config.provider.enabled = false;
    }

    let raw = RawInputSet::from_path(&args.input).map_err(input_failure)?;

    let mut orchestrator = Orchestrator::from_config(&config)?;
    let renderer = Renderer::new(config.output.color);

    let spinner = (!args.json && orchestrator.requester().has_provider())
        .then(|| output::spinner("Suggesting future retention steps...", renderer.colored()));
    let result = orchestrator.predict(&raw);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let assessment = result?;

    if args.json {
        let json = serde_json::to_string_pretty(assessment)
            .context("Failed to serialize assessment")?;
        println!("{}", json);
    } else {
        print!("{}", renderer.assessment(assessment));
    }
    Ok(())
}

/// Print the form defaults as an editable TOML record.
pub fn template() -> CommandResult {
    let toml = RawInputSet::form_defaults().to_toml_string()?;
    print!("{}", toml);
    Ok(())
}

/// Print the feature contract.
pub fn schema(config: &AttriSenseConfig) -> CommandResult {
    print!("{}", Renderer::new(config.output.color).schema());
    Ok(())
}

/// Load the artifact and validate it against the feature contract.
pub fn check_model(config: &AttriSenseConfig, model: Option<PathBuf>) -> CommandResult {
    let path = model.unwrap_or_else(|| config.model.artifact_path.clone());
    let adapter = InferenceAdapter::load(&path)?;
    let renderer = Renderer::new(config.output.color);
    println!(
        "{}",
        renderer.success(&format!("{} matches the feature contract", adapter.describe()))
    );
    Ok(())
}
