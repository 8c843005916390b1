use serde::{Deserialize, Serialize};

use crate::LicenseError;

/// Configures retry behavior of a license request.
///
/// Missing fields fall back to their defaults when deserialized, so a
/// partial config such as `{"max_attempts": 5}` is accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay in milliseconds before the first retry.
    pub base_delay_ms: u64,
    /// Multiplier applied to the delay for each further retry.
    pub backoff_factor: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            backoff_factor: 2.0,
        }
    }
}

impl Parameters {
    /// Checks the invariants the retry loop relies on.
    pub fn validate(&self) -> Result<(), LicenseError> {
        if self.max_attempts == 0 {
            return Err(LicenseError::InvalidParameters(
                "max_attempts must be at least 1".to_owned(),
            ));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(LicenseError::InvalidParameters(format!(
                "backoff_factor must be a finite number >= 1, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }

    /// Reads parameters from environment variables.
    ///
    /// Reads:
    /// - `LICENSE_MAX_ATTEMPTS`
    /// - `LICENSE_BASE_DELAY_MS`
    /// - `LICENSE_BACKOFF_FACTOR`
    ///
    /// Unset variables keep their default. Returns an error if a variable is
    /// set but cannot be parsed, or if the result fails [`Parameters::validate`].
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Parameters::from_env`], reading values through `lookup`.
    pub(crate) fn from_lookup<F>(lookup: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &'static str| (name, lookup(name));
        let params = Self {
            max_attempts: read_var(var("LICENSE_MAX_ATTEMPTS"), defaults.max_attempts)?,
            base_delay_ms: read_var(var("LICENSE_BASE_DELAY_MS"), defaults.base_delay_ms)?,
            backoff_factor: read_var(var("LICENSE_BACKOFF_FACTOR"), defaults.backoff_factor)?,
        };
        params.validate().map_err(|err| err.to_string())?;
        Ok(params)
    }
}

fn read_var<T>((name, value): (&str, Option<String>), default: T) -> std::result::Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|err| format!("{name} has invalid value '{value}': {err}")),
        None => Ok(default),
    }
}
