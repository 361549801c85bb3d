//! Item search — filtering, ordering and pagination
//!
//! Raw query parameters are normalized into a [`SearchQuery`] before any of
//! them reaches the store. Sort columns come from the closed [`SortKey`] set
//! and the name filter is a bound pattern, so nothing the caller sends is
//! ever spliced into query text.

use deltalake::datafusion::logical_expr::expr::Like;
use deltalake::datafusion::logical_expr::{Expr, SortExpr};
use deltalake::datafusion::prelude::{col, lit};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::store::Window;

use super::types::Item;

pub const DEFAULT_MIN_PRICE: f64 = 0.0;
pub const DEFAULT_MAX_PRICE: f64 = 100_000.0;
pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

// Backslash is the implicit LIKE escape
const LIKE_ESCAPE: char = '\\';

/// Sortable columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Name,
    #[default]
    Price,
}

impl SortKey {
    /// Anything outside `id`, `name`, `price` falls back to `Price`
    pub fn parse(raw: &str) -> Self {
        match raw {
            "id" => Self::Id,
            "name" => Self::Name,
            "price" => Self::Price,
            _ => Self::default(),
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// `asc`/`desc` in any case; anything else is ascending
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            Self::Descending
        } else {
            Self::Ascending
        }
    }

    fn is_ascending(self) -> bool {
        matches!(self, Self::Ascending)
    }
}

/// Query string of `GET /items/search`, as received
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Validated search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Case-insensitive substring of the name; `None` matches everything
    pub text: Option<String>,
    pub min_price: f64,
    pub max_price: f64,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    /// 1-based
    pub page: u64,
    pub limit: u64,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            min_price: DEFAULT_MIN_PRICE,
            max_price: DEFAULT_MAX_PRICE,
            sort_key: SortKey::default(),
            direction: SortDirection::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchQuery {
    /// Apply defaults, clamp the page window and check the price range
    pub fn from_params(params: SearchParams) -> Result<Self> {
        let min_price = params.min_price.unwrap_or(DEFAULT_MIN_PRICE);
        let max_price = params.max_price.unwrap_or(DEFAULT_MAX_PRICE);
        if !min_price.is_finite() || !max_price.is_finite() {
            return Err(CatalogError::Validation("price bounds must be finite numbers".into()));
        }
        if min_price > max_price {
            return Err(CatalogError::Validation(format!(
                "min_price ({min_price}) is greater than max_price ({max_price})"
            )));
        }

        Ok(Self {
            text: params.search.filter(|s| !s.is_empty()),
            min_price,
            max_price,
            sort_key: params.sort_by.as_deref().map(SortKey::parse).unwrap_or_default(),
            direction: params
                .sort_order
                .as_deref()
                .map(SortDirection::parse)
                .unwrap_or_default(),
            page: params.page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        })
    }

    /// Row predicate: price within `[min_price, max_price]`, name filter if any
    pub(crate) fn predicate(&self) -> Expr {
        let in_range = col("price").between(lit(self.min_price), lit(self.max_price));
        match &self.text {
            Some(text) => in_range.and(Expr::Like(Like::new(
                false,
                Box::new(col("name")),
                Box::new(lit(format!("%{}%", escape_like(text)))),
                None,
                true,
            ))),
            None => in_range,
        }
    }

    /// Requested order, ties broken by ascending id
    pub(crate) fn ordering(&self) -> Vec<SortExpr> {
        let primary = col(self.sort_key.column()).sort(self.direction.is_ascending(), false);
        if self.sort_key == SortKey::Id {
            vec![primary]
        } else {
            vec![primary, col("id").sort(true, false)]
        }
    }

    pub(crate) fn window(&self) -> Result<Window> {
        let limit = self.limit as usize;
        let skip = usize::try_from(self.page - 1)
            .ok()
            .and_then(|p| p.checked_mul(limit))
            .ok_or_else(|| CatalogError::Validation(format!("page {} is out of range", self.page)))?;
        Ok(Window { skip, fetch: limit })
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub items: Vec<Item>,
    pub page: u64,
    pub limit: u64,
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = SearchQuery::from_params(SearchParams::default()).unwrap();
        assert_eq!(query, SearchQuery::default());
        assert_eq!(query.window().unwrap(), Window { skip: 0, fetch: 10 });
    }

    #[test]
    fn test_sort_allow_list() {
        assert_eq!(SortKey::parse("name"), SortKey::Name);
        assert_eq!(SortKey::parse("id"), SortKey::Id);
        assert_eq!(SortKey::parse("price; DROP TABLE items"), SortKey::Price);
        assert_eq!(SortKey::parse("NAME"), SortKey::Price);

        assert_eq!(SortDirection::parse("DESC"), SortDirection::Descending);
        assert_eq!(SortDirection::parse("desc"), SortDirection::Descending);
        assert_eq!(SortDirection::parse("ASC"), SortDirection::Ascending);
        assert_eq!(SortDirection::parse("sideways"), SortDirection::Ascending);
    }

    #[test]
    fn test_page_window() {
        let query = SearchQuery::from_params(SearchParams {
            page: Some(3),
            limit: Some(25),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(query.window().unwrap(), Window { skip: 50, fetch: 25 });
    }

    #[test]
    fn test_limit_and_page_clamped() {
        let query = SearchQuery::from_params(SearchParams {
            page: Some(0),
            limit: Some(10_000),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_LIMIT);

        let query = SearchQuery::from_params(SearchParams {
            limit: Some(0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(query.limit, 1);
    }

    #[test]
    fn test_inverted_price_range_rejected() {
        let err = SearchQuery::from_params(SearchParams {
            min_price: Some(50.0),
            max_price: Some(10.0),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_empty_search_matches_all() {
        let query = SearchQuery::from_params(SearchParams {
            search: Some(String::new()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(query.text, None);
    }

    #[test]
    fn test_like_metacharacters_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
