use common::Category;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};

use crate::entity::portfolio;
use crate::models::portfolio::{PortfolioListQuery, split_tags};
use crate::models::shared::Pagination;

/// Text searched by `search`: title, description and tags. The function is
/// created by [`crate::seed::ensure_indexes`] and backs the full-text index.
pub const SEARCH_DOCUMENT: &str =
    "to_tsvector('simple', portfolio_search_text(\"title\", \"description\", \"tags\"))";

pub const DEFAULT_LIMIT: u64 = 12;
pub const MAX_LIMIT: u64 = 100;

/// Secondary ordering of a listing. Featured entries always come first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    Newest,
    Popularity,
    Name,
    Views,
}

impl SortMode {
    /// Parse a sort key. Unknown or absent keys fall back to [`SortMode::Newest`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("인기순" | "popular" | "popularity") => Self::Popularity,
            Some("이름순" | "name") => Self::Name,
            Some("조회순" | "views") => Self::Views,
            _ => Self::Newest,
        }
    }
}

/// Filters of a listing. `None`/empty means the axis is unfiltered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioFilter {
    pub category: Option<Category>,
    pub tags: Vec<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

/// A fully-resolved listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioQuery {
    pub filter: PortfolioFilter,
    pub sort: SortMode,
    pub page: u64,
    pub limit: u64,
}

impl Default for PortfolioQuery {
    fn default() -> Self {
        Self {
            filter: PortfolioFilter::default(),
            sort: SortMode::Newest,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl PortfolioQuery {
    pub fn from_params(params: &PortfolioListQuery) -> Self {
        let category = non_empty(params.category.as_deref()).and_then(|c| c.parse().ok());
        let tags = non_empty(params.tags.as_deref())
            .map(split_tags)
            .unwrap_or_default();
        let search = non_empty(params.search.as_deref()).map(str::to_string);
        let featured = match non_empty(params.featured.as_deref()) {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };

        let page = non_empty(params.page.as_deref())
            .and_then(|p| p.parse::<u64>().ok())
            .filter(|&p| p >= 1)
            .unwrap_or(1);
        let limit = non_empty(params.limit.as_deref())
            .and_then(|l| l.parse::<u64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);

        Self {
            filter: PortfolioFilter {
                category,
                tags,
                search,
                featured,
            },
            sort: SortMode::parse(params.sort.as_deref()),
            page,
            limit,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Select with only the filters applied. Shared by the count and page queries.
    pub fn filtered(&self) -> Select<portfolio::Entity> {
        let filter = &self.filter;
        let mut select = portfolio::Entity::find();

        if let Some(category) = filter.category {
            select = select.filter(portfolio::Column::Category.eq(category));
        }

        if let Some(featured) = filter.featured {
            select = select.filter(portfolio::Column::Featured.eq(featured));
        }

        if !filter.tags.is_empty() {
            let any_tag = filter.tags.iter().fold(Condition::any(), |cond, tag| {
                cond.add(Expr::cust_with_values(
                    "$1 = ANY(\"tags\")",
                    [tag.clone()],
                ))
            });
            select = select.filter(any_tag);
        }

        if let Some(term) = &filter.search {
            select = select.filter(
                Condition::any()
                    .add(Expr::cust_with_values(
                        format!("{SEARCH_DOCUMENT} @@ plainto_tsquery('simple', $1)"),
                        [term.clone()],
                    ))
                    .add(Expr::cust_with_values(
                        "$1 = ANY(\"tags\")",
                        [term.clone()],
                    )),
            );
        }

        select
    }

    /// Filters, ordering and the page window.
    pub fn page_select(&self) -> Select<portfolio::Entity> {
        let select = self
            .filtered()
            .order_by_desc(portfolio::Column::Featured);

        let select = match self.sort {
            SortMode::Newest => select.order_by_desc(portfolio::Column::CreatedAt),
            SortMode::Popularity => select
                .order_by_desc(portfolio::Column::Views)
                .order_by_desc(portfolio::Column::Likes),
            SortMode::Name => select.order_by_asc(portfolio::Column::Title),
            SortMode::Views => select.order_by_desc(portfolio::Column::Views),
        };

        select
            .order_by_asc(portfolio::Column::Id)
            .offset(Some(self.offset()))
            .limit(Some(self.limit))
    }

    /// Run the page and count queries concurrently.
    pub async fn fetch<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<(Vec<portfolio::Model>, Pagination), DbErr> {
        let (items, total) = tokio::try_join!(
            self.page_select().all(db),
            self.filtered().count(db)
        )?;

        Ok((items, Pagination::new(self.page, self.limit, total)))
    }
}
