use axum::Json;
use axum::extract::State;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Statement,
};
use tracing::instrument;

use crate::entity::portfolio;
use crate::error::{AppError, ErrorBody};
use crate::models::shared::ApiResponse;
use crate::models::stats::{CategoryCount, StatsResponse, TagCount, TopViewed};
use crate::state::AppState;

const POPULAR_TAGS_SQL: &str = r#"
    SELECT tag, COUNT(*) AS count
    FROM portfolio, unnest("tags") AS tag
    GROUP BY tag
    ORDER BY count DESC, tag ASC
    LIMIT 10
"#;

const TOP_VIEWED_LIMIT: u64 = 5;

#[utoipa::path(
    get,
    path = "/portfolio/stats/summary",
    tag = "Portfolio",
    operation_id = "portfolioStats",
    summary = "Showcase statistics",
    description = "Total and featured counts, entries per category, the ten most used tags \
        and the five most viewed entries. The aggregates are computed concurrently.",
    responses(
        (status = 200, description = "Statistics", body = ApiResponse<StatsResponse>),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn portfolio_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StatsResponse>>, AppError> {
    let db = &state.db;

    let (total_portfolios, featured_portfolios, category_stats, popular_tags, top_viewed) =
        tokio::try_join!(
            portfolio::Entity::find().count(db),
            portfolio::Entity::find()
                .filter(portfolio::Column::Featured.eq(true))
                .count(db),
            portfolio::Entity::find()
                .select_only()
                .column(portfolio::Column::Category)
                .column_as(Expr::cust("COUNT(*)"), "count")
                .group_by(portfolio::Column::Category)
                .order_by_desc(Expr::cust("COUNT(*)"))
                .order_by_asc(portfolio::Column::Category)
                .into_model::<CategoryCount>()
                .all(db),
            TagCount::find_by_statement(Statement::from_string(
                DbBackend::Postgres,
                POPULAR_TAGS_SQL,
            ))
            .all(db),
            portfolio::Entity::find()
                .select_only()
                .column(portfolio::Column::Title)
                .column(portfolio::Column::Views)
                .order_by_desc(portfolio::Column::Views)
                .order_by_asc(portfolio::Column::Id)
                .limit(TOP_VIEWED_LIMIT)
                .into_model::<TopViewed>()
                .all(db),
        )?;

    Ok(Json(ApiResponse::ok(StatsResponse {
        total_portfolios,
        featured_portfolios,
        category_stats,
        popular_tags,
        top_viewed_portfolios: top_viewed,
    })))
}
