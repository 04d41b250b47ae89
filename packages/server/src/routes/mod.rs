use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::portfolio::list_portfolios,
            handlers::portfolio::create_portfolio
        ))
        .routes(routes!(
            handlers::portfolio::get_portfolio,
            handlers::portfolio::update_portfolio,
            handlers::portfolio::delete_portfolio
        ))
        .routes(routes!(handlers::portfolio::like_portfolio))
        .routes(routes!(handlers::stats::portfolio_stats))
        .routes(routes!(handlers::image::get_image))
        .routes(routes!(handlers::mail::send_email))
        .routes(routes!(handlers::health::health))
}
