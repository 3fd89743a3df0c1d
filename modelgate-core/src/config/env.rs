//! Environment variable interpolation for configuration files

use crate::config::error::ConfigError;
use regex::Regex;
use std::env;
use std::sync::OnceLock;

fn var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid pattern"))
}

/// Replace `${VAR}` placeholders with values from the process environment.
///
/// A placeholder referencing an unset variable is an error; configuration
/// with dangling references must not load.
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(content.len());
    let mut last = 0;
    for captures in var_pattern().captures_iter(content) {
        let whole = captures.get(0).expect("match");
        let name = &captures[1];
        let value = env::var(name).map_err(|_| ConfigError::MissingEnvVar {
            name: name.to_string(),
        })?;
        result.push_str(&content[last..whole.start()]);
        result.push_str(&value);
        last = whole.end();
    }
    result.push_str(&content[last..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_known_vars() {
        env::set_var("MODELGATE_TEST_BUCKET", "media-bucket");
        let out = interpolate_env_vars("bucket: ${MODELGATE_TEST_BUCKET}").unwrap();
        assert_eq!(out, "bucket: media-bucket");
    }

    #[test]
    fn unknown_var_is_an_error() {
        let err = interpolate_env_vars("bucket: ${MODELGATE_TEST_UNSET_VAR}").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar { .. }));
    }

    #[test]
    fn plain_content_passes_through() {
        assert_eq!(interpolate_env_vars("a: 1").unwrap(), "a: 1");
    }
}
