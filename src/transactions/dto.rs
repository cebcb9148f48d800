use serde::{Deserialize, Serialize};

use super::repo::Transaction;

/// Request body for creating a transaction. The owner comes from the bearer
/// token, never from the body.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub is_income: bool,
    pub date: String,
}

/// Partial update: only the supplied fields change.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub is_income: Option<bool>,
    pub date: Option<String>,
}

/// Query parameters for the paginated list.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_page() -> i64 {
    1
}
fn default_size() -> i64 {
    9
}

impl ListParams {
    /// Page and size are 1-based; anything below 1 is clamped up.
    pub fn clamped(self) -> Self {
        Self {
            search: self.search,
            page: self.page.max(1),
            size: self.size.max(1),
        }
    }
}

/// Paginated list envelope. `total_amount` sums every matching row, not
/// just the returned window; `total` counts the matching rows.
#[derive(Debug, Serialize)]
pub struct TransactionPageResponse {
    pub transactions: Vec<Transaction>,
    pub total_amount: f64,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub pages: i64,
}

/// ceil(total / size) without going through floats. `size` is always >= 1.
pub(crate) fn page_count(total: i64, size: i64) -> i64 {
    (total + size - 1) / size
}

/// Offset of the requested page window. Saturates so that an absurdly large
/// `page` stays a valid (if empty) window instead of overflowing.
pub(crate) fn page_offset(page: i64, size: i64) -> i64 {
    (page - 1).saturating_mul(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(20, 9), 3);
        assert_eq!(page_count(18, 9), 2);
        assert_eq!(page_count(1, 9), 1);
        assert_eq!(page_count(9, 9), 1);
        assert_eq!(page_count(10, 9), 2);
    }

    #[test]
    fn page_count_of_empty_set_is_zero() {
        assert_eq!(page_count(0, 9), 0);
        assert_eq!(page_count(0, 1), 0);
    }

    #[test]
    fn page_offset_is_window_start() {
        assert_eq!(page_offset(1, 9), 0);
        assert_eq!(page_offset(2, 9), 9);
        assert_eq!(page_offset(3, 50), 100);
    }

    #[test]
    fn page_offset_saturates_instead_of_overflowing() {
        assert_eq!(page_offset(i64::MAX, 9), i64::MAX);
        assert_eq!(page_offset(i64::MAX, i64::MAX), i64::MAX);
    }

    #[test]
    fn params_clamp_to_one() {
        let params = ListParams {
            search: None,
            page: 0,
            size: -3,
        }
        .clamped();
        assert_eq!(params.page, 1);
        assert_eq!(params.size, 1);
    }

    #[test]
    fn params_default_to_first_page_of_nine() {
        let params: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.size, 9);
        assert!(params.search.is_none());
    }

    #[test]
    fn envelope_field_names() {
        let envelope = TransactionPageResponse {
            transactions: vec![],
            total_amount: 150.0,
            total: 2,
            page: 1,
            size: 9,
            pages: 1,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        for key in ["transactions", "total_amount", "total", "page", "size", "pages"] {
            assert!(json.get(key).is_some(), "missing envelope field {key}");
        }
        assert_eq!(json["total_amount"], 150.0);
        assert_eq!(json["pages"], 1);
    }
}
