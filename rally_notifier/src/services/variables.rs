//! Build environment variable expansion for build number templates.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static VARIABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(?:\{([A-Za-z0-9_.]+)\}|([A-Za-z0-9_]+))").unwrap());

/// Replace `$VAR` and `${VAR}` with values from `env`. Unknown variables are kept verbatim.
pub fn expand(template: &str, env: &HashMap<String, String>) -> String {
    VARIABLE_REGEX
        .replace_all(template, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match env.get(name) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
