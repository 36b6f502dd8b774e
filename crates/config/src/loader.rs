//! Configuration loading utilities

use crate::settings::{ConfigError, Settings};
use config::{Config, Environment, File, FileFormat};
use tracing::debug;

/// Load settings from `.env`, `config/config.*` and `ACROSS_BRIDGE__*` variables
///
/// Sources are layered over [`Settings::default`]; later sources win. The
/// result is not validated, call [`Settings::validate`] before use.
pub fn load_config() -> Result<Settings, ConfigError> {
	match dotenvy::dotenv() {
		Ok(path) => debug!("Loaded environment from {}", path.display()),
		Err(e) if e.not_found() => {},
		Err(e) => debug!("Ignoring unreadable .env file: {}", e),
	}

	let s = Config::builder()
		.add_source(Config::try_from(&Settings::default())?)
		.add_source(File::with_name("config/config").required(false))
		.add_source(Environment::with_prefix("ACROSS_BRIDGE").separator("__"))
		.build()?;

	Ok(s.try_deserialize()?)
}

/// Load settings from an inline TOML document layered over the defaults
pub fn load_config_from_toml(toml: &str) -> Result<Settings, ConfigError> {
	let s = Config::builder()
		.add_source(Config::try_from(&Settings::default())?)
		.add_source(File::from_str(toml, FileFormat::Toml))
		.build()?;

	Ok(s.try_deserialize()?)
}
