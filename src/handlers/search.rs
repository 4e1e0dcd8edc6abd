use crate::domain::AuthUser;
use crate::models::*;
use crate::services::SearchService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/search",
    tag = "search",
    params(GlobalSearchQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Matches per category, scoped to the caller's role", body = GlobalSearchResponse),
        (status = 401, description = "Not logged in", body = ApiError)
    )
)]
pub async fn global_search(
    search_service: web::Data<SearchService>,
    user: AuthUser,
    query: web::Query<GlobalSearchQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    match search_service
        .global_search(&user, query.q.as_deref(), query.scope)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/inventory/search",
    tag = "search",
    params(InventorySearchQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Inventory items, alphabetical", body = InventorySearchResponse),
        (status = 403, description = "Only admin and staff search inventory", body = ApiError)
    )
)]
pub async fn search_inventory(
    search_service: web::Data<SearchService>,
    user: AuthUser,
    query: web::Query<InventorySearchQuery>,
) -> Result<HttpResponse> {
    match search_service
        .search_inventory(&user, query.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn search_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/search", web::get().to(global_search))
        .route("/inventory/search", web::get().to(search_inventory));
}
