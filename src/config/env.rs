//! Environment-variable overrides for settings paths.

use serde_json::Value;

/// Environment variable name for a settings path.
///
/// `runtime.startupTimeout` with prefix `myapp` becomes
/// `MYAPP_RUNTIME_STARTUPTIMEOUT`.
pub fn var_name(prefix: Option<&str>, path: &str) -> String {
    let name: String = path
        .chars()
        .map(|c| match c {
            '.' | '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();

    match prefix.map(|p| p.trim_end_matches('_')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}_{}", prefix.to_ascii_uppercase(), name),
        None => name,
    }
}

/// Interpret a raw environment string.
///
/// Numbers, booleans, `null` and strings that look like JSON objects or
/// arrays are parsed; everything else stays a string.
pub fn parse_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    let looks_structured = trimmed.starts_with('{') || trimmed.starts_with('[');
    let looks_scalar = matches!(trimmed, "true" | "false" | "null")
        || trimmed.parse::<f64>().is_ok_and(f64::is_finite);

    if looks_structured || looks_scalar {
        if let Ok(value) = serde_json::from_str(trimmed) {
            return value;
        }
    }
    Value::String(raw.to_string())
}

/// Read the override for `path`, if the variable is set.
pub fn lookup(prefix: Option<&str>, path: &str) -> Option<Value> {
    std::env::var(var_name(prefix, path))
        .ok()
        .map(|raw| parse_value(&raw))
}
