//! Pagination

use serde::Serialize;

use super::column::ColumnDescriptor;
use super::ListingError;

/// Server-wide paging limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Requested page, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(
        page: Option<u32>,
        page_size: Option<u32>,
        limits: PageLimits,
    ) -> Result<Self, ListingError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ListingError::InvalidPage(page));
        }

        let page_size = page_size.unwrap_or(limits.default_page_size);
        if page_size == 0 || page_size > limits.max_page_size {
            return Err(ListingError::InvalidPageSize {
                requested: page_size,
                max: limits.max_page_size,
            });
        }

        Ok(Self { page, page_size })
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    pub fn total_pages(&self, total: u64) -> u32 {
        total_pages(total, self.page_size)
    }
}

pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
}

/// Bound a requested page into `1..=max(total_pages, 1)`
pub fn clamp_page(requested: i64, total_pages: u32) -> u32 {
    let max = i64::from(total_pages.max(1));
    // max fits in u32, so the clamped value does too
    requested.clamp(1, max) as u32
}

/// Page numbers shown as buttons: previous, current, next, and one more
/// ahead when on the first page, restricted to existing pages.
pub fn page_window(page: u32, total_pages: u32) -> Vec<u32> {
    let mut window = Vec::with_capacity(3);
    if page != 1 {
        window.push(page.saturating_sub(1));
    }
    window.push(page);
    window.push(page.saturating_add(1));
    if page == 1 {
        window.push(page.saturating_add(2));
    }
    window.retain(|p| *p >= 1 && *p <= total_pages);
    window
}

/// One page of rows plus the table metadata the admin UI renders
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub columns: Vec<ColumnDescriptor>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    pub page_window: Vec<u32>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, columns: Vec<ColumnDescriptor>, request: PageRequest, total: u64) -> Self {
        let total_pages = request.total_pages(total);
        Self {
            items,
            columns,
            page: request.page,
            page_size: request.page_size,
            total,
            total_pages,
            page_window: page_window(request.page, total_pages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = PageRequest::new(None, None, PageLimits::default()).unwrap();
        assert_eq!(request, PageRequest { page: 1, page_size: 10 });
        assert_eq!(request.offset(), 0);
        assert_eq!(request.limit(), 10);
    }

    #[test]
    fn test_offset() {
        let request = PageRequest::new(Some(3), Some(20), PageLimits::default()).unwrap();
        assert_eq!(request.offset(), 40);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let limits = PageLimits::default();
        assert!(matches!(
            PageRequest::new(Some(0), None, limits),
            Err(ListingError::InvalidPage(0))
        ));
        assert!(PageRequest::new(None, Some(0), limits).is_err());
        assert!(PageRequest::new(None, Some(101), limits).is_err());
        assert!(PageRequest::new(None, Some(100), limits).is_ok());
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn test_page_window() {
        assert_eq!(page_window(1, 10), vec![1, 2, 3]);
        assert_eq!(page_window(5, 10), vec![4, 5, 6]);
        assert_eq!(page_window(10, 10), vec![9, 10]);
        assert_eq!(page_window(1, 1), vec![1]);
        assert_eq!(page_window(1, 0), Vec::<u32>::new());
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(-4, 5), 1);
        assert_eq!(clamp_page(3, 5), 3);
        assert_eq!(clamp_page(99, 5), 5);
        assert_eq!(clamp_page(7, 0), 1);
    }

    #[test]
    fn test_page_metadata() {
        let request = PageRequest::new(Some(2), Some(10), PageLimits::default()).unwrap();
        let page = Page::new(vec!["a"; 10], Vec::new(), request, 25);

        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page_window, vec![1, 2, 3]);
    }
}
