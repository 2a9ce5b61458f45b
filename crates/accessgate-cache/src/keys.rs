//! Key builders for rate-limit counters.

/// Prefix applied to all AccessGate rate-limit keys.
const PREFIX: &str = "ratelimit";

/// Counter key for one request source within an endpoint group.
pub fn rate_limit(scope: &str, source: &str) -> String {
    format!("{PREFIX}:{scope}:{source}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_key() {
        assert_eq!(
            rate_limit("accounting", "10.0.0.1"),
            "ratelimit:accounting:10.0.0.1"
        );
    }
}
