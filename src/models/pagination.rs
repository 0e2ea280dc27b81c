use sea_orm::Order;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 8;
/// Page sizes a client may request; anything else falls back to the default.
pub const ALLOWED_PER_PAGE: [u64; 4] = [4, 8, 16, 32];

/// Sort direction over `upload_time`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Raw list query parameters. Kept as strings so malformed values can fall
/// back to defaults instead of failing extraction with a 400.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number. Defaults to 1; invalid values are clamped.
    pub page: Option<String>,
    /// Page size, one of 4, 8, 16 or 32. Defaults to 8.
    pub per_page: Option<String>,
    /// `asc` or `desc` over upload time. Defaults to `desc`.
    pub order: Option<String>,
}

/// Validated pagination parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
    pub order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            order: SortOrder::Desc,
        }
    }
}

/// Where in the table a resolved request lands once the total is known.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PagePlan {
    pub page: u64,
    pub offset: u64,
    pub total_pages: u64,
}

impl ListQuery {
    /// Resolves raw query strings into a request, silently substituting
    /// defaults for anything invalid or out of range.
    pub fn resolve(&self) -> PageRequest {
        let page = self
            .page
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&p| p >= 1)
            .unwrap_or(DEFAULT_PAGE);

        let per_page = self
            .per_page
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|p| ALLOWED_PER_PAGE.contains(p))
            .unwrap_or(DEFAULT_PER_PAGE);

        let order = self
            .order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or_default();

        PageRequest {
            page,
            per_page,
            order,
        }
    }
}

impl PageRequest {
    /// Clamps the requested page against the row total. An empty table
    /// still has one (empty) page.
    pub fn plan(&self, total: u64) -> PagePlan {
        let total_pages = std::cmp::max(1, total.div_ceil(self.per_page));
        let page = self.page.min(total_pages);
        PagePlan {
            page,
            offset: (page - 1) * self.per_page,
            total_pages,
        }
    }
}

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 8)]
    pub per_page: u64,
    /// Total number of stored images.
    #[schema(example = 42)]
    pub total: u64,
    /// Total number of pages, at least 1.
    #[schema(example = 6)]
    pub total_pages: u64,
}
