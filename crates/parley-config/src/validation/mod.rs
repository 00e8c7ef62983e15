//! Full configuration validation.
//!
//! Validates numeric ranges and the topic pool, collecting every error
//! into a single `ConfigError`.

mod helpers;


use crate::schema::ParleyConfig;
use parley_common::ConfigError;

use helpers::validate_range;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ParleyConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_server(&mut errors, config);
    validate_discussion(&mut errors, config);
    validate_range(
        &mut errors,
        "stats.interval_secs",
        config.stats.interval_secs,
        1,
        86_400,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_server(errors: &mut Vec<String>, config: &ParleyConfig) {
    validate_range(errors, "server.port", config.server.port as u64, 1, 65_535);
    validate_range(
        errors,
        "server.outbound_capacity",
        config.server.outbound_capacity as u64,
        1,
        65_536,
    );
    validate_range(
        errors,
        "server.command_capacity",
        config.server.command_capacity as u64,
        1,
        65_536,
    );
    validate_range(
        errors,
        "server.handshake_timeout_secs",
        config.server.handshake_timeout_secs,
        1,
        300,
    );
}

fn validate_discussion(errors: &mut Vec<String>, config: &ParleyConfig) {
    validate_range(
        errors,
        "discussion.prep_duration_secs",
        config.discussion.prep_duration_secs,
        1,
        3_600,
    );
    if !config.discussion.topics.iter().any(|t| !t.trim().is_empty()) {
        errors.push("discussion.topics must contain at least one non-blank topic".into());
    }
    if config.discussion.default_display_name.trim().is_empty() {
        errors.push("discussion.default_display_name must not be blank".into());
    }
}
