// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! This module provides validation logic to ensure configuration values are
//! consistent and within valid ranges before a run starts.

use crate::{ConfigError, ConfigResult, NavposConfig, OutputConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Required fields
/// - Positive thresholds, widths and periods
/// - Usable rotation bin centers
/// - Known output template placeholders
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &NavposConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_required_fields(config, &mut errors);
    validate_value_ranges(config, &mut errors);
    validate_output_template(&config.output, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_required_fields(config: &NavposConfig, errors: &mut Vec<ConfigValidationError>) {
    let required = [
        ("data.spikes_file", config.data.spikes_file.as_str()),
        ("data.good_neurons_file", config.data.good_neurons_file.as_str()),
        ("data.behavior_suffix", config.data.behavior_suffix.as_str()),
        ("decoding.target_field", config.decoding.target_field.as_str()),
        ("decoding.event_field", config.decoding.event_field.as_str()),
        ("output.template", config.output.template.as_str()),
    ];
    for (field, value) in required {
        if value.is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        }
    }
}

fn invalid(errors: &mut Vec<ConfigValidationError>, field: &str, reason: &str) {
    errors.push(ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    });
}

fn validate_value_ranges(config: &NavposConfig, errors: &mut Vec<ConfigValidationError>) {
    // NaN fails every comparison, so test for the valid case
    if !(config.crossings.threshold > 0.0) {
        invalid(errors, "crossings.threshold", "must be positive");
    }
    if !config.crossings.border.is_finite() {
        invalid(errors, "crossings.border", "must be finite");
    }

    if config.rotation.centers.is_empty() {
        invalid(errors, "rotation.centers", "must contain at least one center");
    }
    if config.rotation.centers.iter().any(|c| !c.is_finite()) {
        invalid(errors, "rotation.centers", "must all be finite");
    }
    if !(config.rotation.width > 0.0) {
        invalid(errors, "rotation.width", "must be positive");
    }
    if !(config.rotation.period > 0.0) {
        invalid(errors, "rotation.period", "must be positive");
    }

    if config.data.max_files == Some(0) {
        invalid(errors, "data.max_files", "must be at least 1 when set");
    }

    if config.decoding.folds < 2 {
        invalid(errors, "decoding.folds", "must be at least 2");
    }
    if config.decoding.neighbors == 0 {
        invalid(errors, "decoding.neighbors", "must be at least 1");
    }
    if !(config.decoding.window_width > 0.0) {
        invalid(errors, "decoding.window_width", "must be positive");
    }
    if config.decoding.window_offsets.is_empty() {
        invalid(errors, "decoding.window_offsets", "must contain at least one offset");
    }

    if config.logging.retention_runs == 0 {
        invalid(errors, "logging.retention_runs", "must be at least 1");
    }
}

fn validate_output_template(output: &OutputConfig, errors: &mut Vec<ConfigValidationError>) {
    let mut rest = output.template.as_str();
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            invalid(errors, "output.template", "unterminated '{' placeholder");
            return;
        };
        let name = &after[..close];
        if !OutputConfig::PLACEHOLDERS.contains(&name) {
            errors.push(ConfigValidationError::InvalidValue {
                field: "output.template".to_string(),
                reason: format!(
                    "unknown placeholder '{{{}}}', expected one of {{region}}, {{date}}, {{jobid}}",
                    name
                ),
            });
        }
        rest = &after[close + 1..];
    }
}
