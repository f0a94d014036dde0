//! Store alias derivation.

/// Alias for the certificate at `index` in the chain presented by `host`.
///
/// Unique within one chain. Running against the same host again yields the
/// same aliases, so earlier entries for that host are replaced.
#[must_use]
pub fn alias_for(host: &str, index: usize) -> String {
    format!("{host}-{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_positions() {
        assert_eq!(alias_for("example.com", 0), "example.com-0");
        assert_eq!(alias_for("example.com", 1), "example.com-1");
    }

    #[test]
    fn test_alias_is_stable_across_runs() {
        assert_eq!(alias_for("example.com", 2), alias_for("example.com", 2));
    }
}
