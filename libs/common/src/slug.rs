//! Community slug normalization.
//!
//! A community's identity is its slug, and slug comparison is
//! case-insensitive everywhere ("RPG" and "rpg" are the same hub). Every
//! boundary (join, sync, send, history, transcript filtering) normalizes
//! once so the rest of the code can use exact string equality.

/// Normalize a raw community identifier into its canonical slug form.
pub fn normalize_slug(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases() {
        assert_eq!(normalize_slug("RPG"), "rpg");
        assert_eq!(normalize_slug("Fps"), "fps");
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(normalize_slug("  strategy \n"), "strategy");
    }

    #[test]
    fn canonical_input_is_unchanged() {
        assert_eq!(normalize_slug("moba"), "moba");
    }
}
