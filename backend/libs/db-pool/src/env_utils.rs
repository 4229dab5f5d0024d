//! Environment variable parsing helpers shared by service configs

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when it is
/// missing or does not parse.
///
/// # Example
/// ```ignore
/// let port: u16 = parse_env_with_default("PORT", 8000);
/// ```
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable, `None` if missing or invalid
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Read a string variable, treating empty values as unset
pub fn env_string_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_parse_env_with_default() {
        let result: u32 = parse_env_with_default("AGORA_NONEXISTENT_VAR", 42);
        assert_eq!(result, 42);

        std::env::set_var("AGORA_TEST_PORT", "8080");
        let result: u16 = parse_env_with_default("AGORA_TEST_PORT", 3000);
        assert_eq!(result, 8080);

        std::env::set_var("AGORA_TEST_PORT", "not-a-port");
        let result: u16 = parse_env_with_default("AGORA_TEST_PORT", 3000);
        assert_eq!(result, 3000);
        std::env::remove_var("AGORA_TEST_PORT");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_string_or_ignores_blank() {
        std::env::set_var("AGORA_TEST_HOST", "   ");
        assert_eq!(env_string_or("AGORA_TEST_HOST", "0.0.0.0"), "0.0.0.0");

        std::env::set_var("AGORA_TEST_HOST", "127.0.0.1");
        assert_eq!(env_string_or("AGORA_TEST_HOST", "0.0.0.0"), "127.0.0.1");
        std::env::remove_var("AGORA_TEST_HOST");
    }
}
