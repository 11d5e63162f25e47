//! Response status classification

use std::ops::Range;

/// Statuses treated as success
pub const SUCCESS_RANGE: Range<u16> = 200..300;

/// Whether `status` denotes a successful response
pub fn is_successful(status: u16) -> bool {
    SUCCESS_RANGE.contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boundaries() {
        assert!(!is_successful(199));
        assert!(is_successful(200));
        assert!(is_successful(204));
        assert!(is_successful(299));
        assert!(!is_successful(300));
        assert!(!is_successful(0));
    }

    proptest! {
        #[test]
        fn prop_2xx_is_successful(status in 200u16..300) {
            prop_assert!(is_successful(status));
        }

        #[test]
        fn prop_everything_else_fails(status in (0u16..600).prop_filter("non-2xx", |s| !(200..300).contains(s))) {
            prop_assert!(!is_successful(status));
        }
    }
}
