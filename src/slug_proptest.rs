//! Property-based tests for slug derivation.
//!
//! These tests use proptest to generate random display names and verify that
//! the slug invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::slug::{derive_slug, is_valid_slug};
    use proptest::prelude::*;

    proptest! {
        /// Property: derivation is total and always yields a valid slug
        #[test]
        fn derive_slug_always_valid(input in ".*") {
            let slug = derive_slug(&input);
            prop_assert!(!slug.is_empty());
            prop_assert!(
                is_valid_slug(&slug),
                "derive_slug produced invalid slug '{}' from input '{}'",
                slug,
                input
            );
        }

        /// Property: re-deriving a slug yields the same slug
        #[test]
        fn derive_slug_is_idempotent(input in ".*") {
            let once = derive_slug(&input);
            let twice = derive_slug(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: derivation is deterministic
        #[test]
        fn derive_slug_is_deterministic(input in ".*") {
            prop_assert_eq!(derive_slug(&input), derive_slug(&input));
        }

        /// Property: names that are already slugs pass through unchanged
        #[test]
        fn valid_slugs_are_fixed_points(input in "[a-z]([a-z0-9]{0,8}-?){0,4}[a-z0-9]") {
            prop_assume!(is_valid_slug(&input));
            prop_assert_eq!(derive_slug(&input), input);
        }

        /// Property: the slug never contains uppercase characters
        #[test]
        fn derive_slug_is_lowercase(input in "[A-Za-z _.-]{1,40}") {
            let slug = derive_slug(&input);
            prop_assert_eq!(slug.to_lowercase(), slug);
        }
    }
}
