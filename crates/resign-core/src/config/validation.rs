//! Configuration validation

use tracing::debug;

use crate::error::ConfigError;
use crate::types::{ArtifactType, SignatureType};

use super::types::ResignConfig;

/// Validate a fully merged configuration
pub fn validate_config(config: &ResignConfig) -> Result<(), ConfigError> {
    debug!("validating configuration");
    validate_inputs(config)?;
    validate_signing_material(config)?;
    validate_output(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_inputs(config: &ResignConfig) -> Result<(), ConfigError> {
    if config.inputs.artifacts.is_empty() {
        return Err(ConfigError::MissingField("inputs.artifacts".to_string()));
    }

    for path in &config.inputs.artifacts {
        if ArtifactType::from_path(path).is_none() {
            return Err(ConfigError::UnsupportedArtifact(path.clone()));
        }
        if !path.exists() {
            return Err(ConfigError::ArtifactNotFound(path.clone()));
        }
    }

    Ok(())
}

fn require(value: Option<&str>, field: &str) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(ConfigError::MissingField(field.to_string())),
    }
}

fn validate_signing_material(config: &ResignConfig) -> Result<(), ConfigError> {
    let signature_type = config
        .signature_type()
        .ok_or_else(|| ConfigError::MissingField("keystore.url".to_string()))?;

    match signature_type {
        SignatureType::Keystore => {
            require(config.keystore.url.as_deref(), "keystore.url")?;
            require(config.keystore.password.as_deref(), "keystore.password")?;
            require(config.keystore.alias.as_deref(), "keystore.alias")?;
        }
        SignatureType::Certificate => {
            if config.certificate.key_path.is_none() {
                return Err(ConfigError::MissingField("certificate.key_path".to_string()));
            }
            if config.certificate.cert_path.is_none() {
                return Err(ConfigError::MissingField("certificate.cert_path".to_string()));
            }
        }
        SignatureType::Pkcs11 => {
            require(config.pkcs11.provider_arg.as_deref(), "pkcs11.provider_arg")?;
        }
    }

    Ok(())
}

fn validate_output(config: &ResignConfig) -> Result<(), ConfigError> {
    if let Some(name) = &config.output.name {
        if name.trim().is_empty() {
            return Err(ConfigError::invalid("output.name", "name cannot be blank"));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(ConfigError::invalid(
                "output.name",
                "must be a file name, use output.directory for the location",
            ));
        }
    }

    Ok(())
}
