use mongodb::{bson::doc, options::FindOptions};

/// Optional zero-based offset pagination, taken from the `page` and `size`
/// query parameters. Without a `size`, everything is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromForm)]
pub struct PaginationRequest {
    page: Option<u64>,
    size: Option<u64>,
}

impl PaginationRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    /// Number of items to skip, at most `i64::MAX` as the store cannot go further.
    pub fn skip(&self) -> u64 {
        match self.size {
            Some(size) => self
                .page
                .unwrap_or(0)
                .saturating_mul(size)
                .min(i64::MAX as u64),
            None => 0,
        }
    }

    /// Maximum number of items to return, if limited.
    pub fn limit(&self) -> Option<i64> {
        // A limit of zero means "no limit" to MongoDB, so skip it.
        self.size
            .filter(|size| *size > 0)
            .map(|size| i64::try_from(size).unwrap_or(i64::MAX))
    }

    /// Find options selecting this page, in insertion order.
    pub fn find_options(&self) -> FindOptions {
        FindOptions::builder()
            .sort(doc! { "_id": 1 })
            .skip(self.skip())
            .limit(self.limit())
            .build()
    }
}
