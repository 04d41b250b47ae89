use common::Category;
use sea_orm::FromQueryResult;
use serde::Serialize;

/// Aggregate figures for the showcase dashboard.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[schema(example = 27)]
    pub total_portfolios: u64,
    #[schema(example = 4)]
    pub featured_portfolios: u64,
    /// Entry count per category, most populated first.
    pub category_stats: Vec<CategoryCount>,
    /// The ten most used tags.
    pub popular_tags: Vec<TagCount>,
    /// The five most viewed entries.
    pub top_viewed_portfolios: Vec<TopViewed>,
}

#[derive(Debug, Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct CategoryCount {
    pub category: Category,
    pub count: i64,
}

#[derive(Debug, Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct TopViewed {
    pub title: String,
    pub views: i64,
}
