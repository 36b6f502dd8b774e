//! Configurable value types that can load from environment variables or plain values

use bridge_types::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A configuration value that is either read from an environment variable or given inline
///
/// In configuration files it can be written as a table
/// (`{ type = "env", value = "PRIVATE_KEY" }`) or as a shorthand string
/// (`"env:PRIVATE_KEY"` or a literal value).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(from = "RawConfigurableValue")]
pub struct ConfigurableValue {
	/// Type of value: "env" for environment variable, "plain" for direct value
	#[serde(rename = "type")]
	pub value_type: ValueType,
	/// The value: either environment variable name or the actual value
	pub value: String,
}

/// Type of configurable value
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
	/// Load value from environment variable (name specified in `value` field)
	Env,
	/// Use the value directly from the `value` field
	Plain,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawConfigurableValue {
	Shorthand(String),
	Tagged {
		#[serde(rename = "type")]
		value_type: ValueType,
		value: String,
	},
}

impl From<RawConfigurableValue> for ConfigurableValue {
	fn from(raw: RawConfigurableValue) -> Self {
		match raw {
			RawConfigurableValue::Shorthand(s) => ConfigurableValue::from(s.as_str()),
			RawConfigurableValue::Tagged { value_type, value } => Self { value_type, value },
		}
	}
}

impl ConfigurableValue {
	/// Reference an environment variable
	pub fn from_env(env_var_name: &str) -> Self {
		Self {
			value_type: ValueType::Env,
			value: env_var_name.to_string(),
		}
	}

	/// Inline value
	pub fn from_plain(plain_value: &str) -> Self {
		Self {
			value_type: ValueType::Plain,
			value: plain_value.to_string(),
		}
	}

	/// Resolve the actual value
	///
	/// An environment variable that is set but blank counts as missing.
	pub fn resolve(&self) -> Result<String, ConfigurableValueError> {
		match self.value_type {
			ValueType::Env => match std::env::var(&self.value) {
				Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
				Ok(_) => Err(ConfigurableValueError::EmptyValue(self.description())),
				Err(_) => Err(ConfigurableValueError::EnvironmentVariableNotFound(
					self.value.clone(),
				)),
			},
			ValueType::Plain if self.value.trim().is_empty() => {
				Err(ConfigurableValueError::EmptyValue(self.description()))
			},
			ValueType::Plain => Ok(self.value.trim().to_string()),
		}
	}

	/// Resolve straight into a [`SecretString`]
	pub fn resolve_secret(&self) -> Result<SecretString, ConfigurableValueError> {
		self.resolve().map(SecretString::from)
	}

	/// Secrets written inline in a config file are worth a warning at startup
	pub fn is_inline(&self) -> bool {
		matches!(self.value_type, ValueType::Plain)
	}

	/// Where the value comes from, without revealing it
	pub fn description(&self) -> String {
		match self.value_type {
			ValueType::Env => format!("environment variable '{}'", self.value),
			ValueType::Plain => "inline value".to_string(),
		}
	}
}

/// Errors that can occur when resolving configurable values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurableValueError {
	#[error("Environment variable '{0}' not found")]
	EnvironmentVariableNotFound(String),

	#[error("Empty value in {0}")]
	EmptyValue(String),
}

// Never print plain values, they may be secrets
impl fmt::Display for ConfigurableValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.value_type {
			ValueType::Env => write!(f, "env:{}", self.value),
			ValueType::Plain => write!(f, "plain:[REDACTED]"),
		}
	}
}

impl From<&str> for ConfigurableValue {
	fn from(value: &str) -> Self {
		match value.strip_prefix("env:") {
			Some(env_var) => Self::from_env(env_var),
			None => Self::from_plain(value),
		}
	}
}

impl From<String> for ConfigurableValue {
	fn from(value: String) -> Self {
		ConfigurableValue::from(value.as_str())
	}
}
