//! Environment accessor with typed fallbacks.
//!
//! Lookups never fail: a missing key, or an integer key whose value does
//! not parse, yields the caller's fallback.

/// Read a string from the process environment, or `fallback` when unset.
pub fn get_string(key: &str, fallback: &str) -> String {
    string_from(process_env, key, fallback)
}

/// Read an integer from the process environment, or `fallback` when unset
/// or unparseable.
pub fn get_int(key: &str, fallback: i64) -> i64 {
    int_from(process_env, key, fallback)
}

/// Like [`get_string`], reading from an arbitrary source.
pub fn string_from<F>(lookup: F, key: &str, fallback: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| fallback.to_owned())
}

/// Like [`get_int`], reading from an arbitrary source.
pub fn int_from<F>(lookup: F, key: &str, fallback: i64) -> i64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(fallback)
}

/// Lookup over `std::env`. Non-Unicode values count as unset.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn string_present_wins_over_fallback() {
        let lookup = source(&[("ADDR", ":9000")]);
        assert_eq!(string_from(&lookup, "ADDR", ":8081"), ":9000");
    }

    #[test]
    fn string_absent_uses_fallback() {
        let lookup = source(&[]);
        assert_eq!(string_from(&lookup, "ADDR", ":8081"), ":8081");
    }

    #[test]
    fn string_empty_value_is_kept() {
        let lookup = source(&[("ADDR", "")]);
        assert_eq!(string_from(&lookup, "ADDR", ":8081"), "");
    }

    #[test]
    fn int_parses_present_value() {
        let lookup = source(&[("DB_MAX_OPEN_CONNS", "25"), ("NEG", "-3")]);
        assert_eq!(int_from(&lookup, "DB_MAX_OPEN_CONNS", 10), 25);
        assert_eq!(int_from(&lookup, "NEG", 10), -3);
    }

    #[test]
    fn int_absent_uses_fallback() {
        let lookup = source(&[]);
        assert_eq!(int_from(&lookup, "DB_MAX_OPEN_CONNS", 10), 10);
    }

    #[test]
    fn int_malformed_silently_falls_back() {
        let lookup = source(&[("A", "ten"), ("B", " 5"), ("C", "5.0"), ("D", "")]);
        assert_eq!(int_from(&lookup, "A", 10), 10);
        assert_eq!(int_from(&lookup, "B", 10), 10);
        assert_eq!(int_from(&lookup, "C", 10), 10);
        assert_eq!(int_from(&lookup, "D", 10), 10);
    }

    #[test]
    fn process_env_roundtrip() {
        // Keys are unique to this test so parallel tests cannot race on them.
        std::env::set_var("SOCIAL_API_TEST_ENV_STRING", "hello");
        std::env::set_var("SOCIAL_API_TEST_ENV_INT", "42");
        std::env::set_var("SOCIAL_API_TEST_ENV_BAD_INT", "forty-two");

        assert_eq!(get_string("SOCIAL_API_TEST_ENV_STRING", "x"), "hello");
        assert_eq!(get_string("SOCIAL_API_TEST_ENV_MISSING", "x"), "x");
        assert_eq!(get_int("SOCIAL_API_TEST_ENV_INT", 1), 42);
        assert_eq!(get_int("SOCIAL_API_TEST_ENV_BAD_INT", 1), 1);
        assert_eq!(get_int("SOCIAL_API_TEST_ENV_MISSING", 7), 7);
    }
}
