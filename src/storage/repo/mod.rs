//! Persistence gateway: per-entity parameterized queries.
//!
//! Every function returns populated records or an `AppError` (`NotFound` for
//! absent rows, `Conflict` for unique violations, `Internal` otherwise).

pub mod chats;
pub mod donations;
pub mod messages;
pub mod posts;
pub mod ratings;
pub mod users;
pub mod verifications;

/// Pagination window: page >= 1, 1 <= limit <= 100.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn clamped(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, 100);
        Page { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit as i64 - 1) / self.limit as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_and_limit_are_clamped() {
        let p = Page::clamped(None, None, 20);
        assert_eq!((p.page, p.limit), (1, 20));
        let p = Page::clamped(Some(0), Some(0), 20);
        assert_eq!((p.page, p.limit), (1, 1));
        let p = Page::clamped(Some(3), Some(500), 20);
        assert_eq!((p.page, p.limit), (3, 100));
    }

    #[test]
    fn offset_and_total_pages() {
        let p = Page::clamped(Some(3), Some(20), 20);
        assert_eq!(p.offset(), 40);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(1), 1);
        assert_eq!(p.total_pages(20), 1);
        assert_eq!(p.total_pages(21), 2);
    }
}
