//! Pagination utilities for list endpoints

/// Page size applied when a request does not specify a limit
pub const DEFAULT_LIMIT: i64 = 100;

/// Upper bound protecting the service from unbounded result pages
pub const MAX_LIMIT: i64 = 1000;

/// Sanitized LIMIT/OFFSET pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
    /// Row cap for SQL LIMIT/OFFSET query
    pub limit: i64,
}

/// Clamp raw query values into a usable LIMIT/OFFSET pair
///
/// Negative offsets become 0; limits are clamped to [1, MAX_LIMIT] with
/// the default applied when absent.
pub fn clamp_page(offset: Option<i64>, limit: Option<i64>) -> Page {
    let offset = offset.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Page { offset, limit }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = clamp_page(None, None);
        assert_eq!(p.offset, 0);
        assert_eq!(p.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_negative_offset_clamped() {
        let p = clamp_page(Some(-5), Some(10));
        assert_eq!(p.offset, 0);
        assert_eq!(p.limit, 10);
    }

    #[test]
    fn test_zero_limit_clamped_to_one() {
        let p = clamp_page(Some(0), Some(0));
        assert_eq!(p.limit, 1);
    }

    #[test]
    fn test_oversized_limit_clamped() {
        let p = clamp_page(Some(200), Some(1_000_000));
        assert_eq!(p.offset, 200);
        assert_eq!(p.limit, MAX_LIMIT);
    }
}
