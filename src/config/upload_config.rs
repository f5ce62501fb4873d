use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::env_vars::expand_env_vars;
use crate::config::targets::Target;
use crate::error::UploadError;
use crate::upload::RequestDescriptor;

/// Upload settings, from a YAML file, the command line, or both.
///
/// Every field is optional here; [`UploadConfig::validate`] decides whether
/// the combination is usable.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub system: Option<String>,
    pub bucket: Option<String>,
    pub filename: Option<String>,
    pub input: Option<PathBuf>,
}

/// Where the payload is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    pub fn open(&self) -> Result<Box<dyn Read>, UploadError> {
        match self {
            InputSource::Stdin => Ok(Box::new(io::stdin())),
            InputSource::File(path) => File::open(path)
                .map(|file| Box::new(file) as Box<dyn Read>)
                .map_err(|e| {
                    UploadError::Configuration(format!(
                        "Unable to open {} -- {}",
                        path.display(),
                        e
                    ))
                }),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            InputSource::Stdin => "standard input".to_string(),
            InputSource::File(path) => path.display().to_string(),
        }
    }
}

/// A validated configuration, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub target: Target,
    pub request: RequestDescriptor,
    pub input: InputSource,
}

impl UploadConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::from_yaml_str(&content)?;
        config.expand_environment_variables();

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse YAML config")
    }

    /// Expand `$VAR` and `${VAR}` in every string value
    pub fn expand_environment_variables(&mut self) {
        for value in [&mut self.system, &mut self.bucket, &mut self.filename]
            .into_iter()
            .flatten()
        {
            if value.contains('$') {
                *value = expand_env_vars(value);
            }
        }

        if let Some(input) = &mut self.input {
            let raw = input.to_string_lossy().into_owned();
            if raw.contains('$') {
                *input = PathBuf::from(expand_env_vars(&raw));
            }
        }
    }

    /// Layer `overrides` on top of `self`. Set fields in `overrides` win.
    pub fn merge(self, overrides: UploadConfig) -> UploadConfig {
        UploadConfig {
            system: overrides.system.or(self.system),
            bucket: overrides.bucket.or(self.bucket),
            filename: overrides.filename.or(self.filename),
            input: overrides.input.or(self.input),
        }
    }

    pub fn validate(&self) -> Result<UploadPlan, UploadError> {
        let system = required(&self.system, "No system given")?;
        let bucket = required(&self.bucket, "No bucket given")?;
        let filename = required(&self.filename, "No filename given")?;
        let target: Target = system.parse()?;

        let input = match &self.input {
            Some(path) if path.as_os_str() != "-" => InputSource::File(path.clone()),
            _ => InputSource::Stdin,
        };

        Ok(UploadPlan {
            target,
            request: target.request(bucket, filename),
            input,
        })
    }
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, UploadError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(UploadError::Configuration(message.to_string())),
    }
}
