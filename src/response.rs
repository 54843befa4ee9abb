use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    /// Slice one page out of an already ordered list.
    pub fn paged(message: impl Into<String>, items: Vec<T>, page: i64, per_page: i64) -> ApiResponse<Vec<T>> {
        let total = items.len() as i64;
        let offset = usize::try_from(page.saturating_sub(1).saturating_mul(per_page).max(0)).unwrap_or(usize::MAX);
        let data: Vec<T> = items
            .into_iter()
            .skip(offset)
            .take(per_page.max(0) as usize)
            .collect();
        ApiResponse {
            message: message.into(),
            data: Some(data),
            meta: Some(Meta::new(page, per_page, total)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paged_slices_and_reports_total() {
        let resp = ApiResponse::<u32>::paged("Ok", (1..=25).collect(), 2, 10);
        assert_eq!(resp.data.unwrap(), (11..=20).collect::<Vec<_>>());
        let meta = resp.meta.unwrap();
        assert_eq!(meta.total, Some(25));
        assert_eq!(meta.page, Some(2));
    }

    #[test]
    fn paged_past_the_end_is_empty() {
        let resp = ApiResponse::<u32>::paged("Ok", (1..=5).collect(), i64::MAX, 100);
        assert!(resp.data.unwrap().is_empty());
        assert_eq!(resp.meta.unwrap().total, Some(5));
    }
}
