use serde::{Deserialize, Serialize};

/// Listing envelope returned by every paginated endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, total_items: i64, page_size: i64, current_page: i64) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + page_size - 1) / page_size
        };
        Self {
            items,
            total_items,
            total_pages,
            current_page,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_postgrest(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Common listing query parameters. Page numbering is zero-based.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: i64,
    pub sort_field: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl PageQuery {
    /// PostgREST range + order clauses for this page.
    pub fn to_query_parts(&self, page_size: i64, default_sort: &str) -> (String, String) {
        let offset = self.page.max(0) * page_size;
        let range = format!("offset={}&limit={}", offset, page_size);
        let field = self.sort_field.as_deref().unwrap_or(default_sort);
        let order = format!("order={}.{}", field, self.sort_order.as_postgrest());
        (range, order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_rounds_pages_up() {
        let paged = Paged::new(vec![1, 2, 3], 25, 10, 0);
        assert_eq!(paged.total_pages, 3);
        assert_eq!(paged.total_items, 25);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let paged: Paged<i32> = Paged::new(vec![], 0, 10, 0);
        assert_eq!(paged.total_pages, 0);
    }

    #[test]
    fn page_query_builds_range_and_order() {
        let query = PageQuery {
            page: 2,
            sort_field: Some("created_at".to_string()),
            sort_order: SortOrder::Desc,
        };
        let (range, order) = query.to_query_parts(10, "id");
        assert_eq!(range, "offset=20&limit=10");
        assert_eq!(order, "order=created_at.desc");
    }
}
