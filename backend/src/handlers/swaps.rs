use actix_web::{web, HttpResponse, Result};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::{ApiError, ApiSuccess, CreateSwapRequest};
use uuid::Uuid;

use crate::models::AppState;
use crate::services::{houses as house_service, swaps as swap_service};

#[derive(Debug, Deserialize)]
struct ActiveSwapQuery {
    task_id: Uuid,
    week_start_date: NaiveDate,
    date: NaiveDate,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/swaps")
            .route("", web::post().to(create_swap))
            .route("/pending", web::get().to(list_pending))
            .route("/active", web::get().to(get_active))
            .route("/expire", web::post().to(expire_swaps))
            .route("/{swap_id}/accept", web::post().to(accept_swap))
            .route("/{swap_id}/reject", web::post().to(reject_swap)),
    );
}

fn swap_error_response(e: swap_service::SwapError) -> HttpResponse {
    match e {
        swap_service::SwapError::TaskNotFound | swap_service::SwapError::NotFound => {
            HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: e.to_string(),
            })
        }
        swap_service::SwapError::NotPending => HttpResponse::Conflict().json(ApiError {
            error: "conflict".to_string(),
            message: e.to_string(),
        }),
        swap_service::SwapError::NotRecipient => HttpResponse::Forbidden().json(ApiError {
            error: "forbidden".to_string(),
            message: e.to_string(),
        }),
        swap_service::SwapError::SelfSwap | swap_service::SwapError::InvalidSwapDate => {
            HttpResponse::BadRequest().json(ApiError {
                error: "invalid_input".to_string(),
                message: e.to_string(),
            })
        }
        swap_service::SwapError::DatabaseError(e) => {
            log::error!("Swap database error: {:?}", e);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Swap operation failed".to_string(),
            })
        }
    }
}

async fn create_swap(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<CreateSwapRequest>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::Unauthorized().json(ApiError {
                error: "unauthorized".to_string(),
                message: "Invalid or missing token".to_string(),
            }));
        }
    };

    let house_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_id".to_string(),
                message: "Invalid house ID format".to_string(),
            }));
        }
    };

    if !house_service::is_member(&state.db, &house_id, &user_id).await.unwrap_or(false) {
        return Ok(HttpResponse::Forbidden().json(ApiError {
            error: "forbidden".to_string(),
            message: "You are not a member of this house".to_string(),
        }));
    }

    // The other side of the swap must live here too.
    if !house_service::is_member(&state.db, &house_id, &body.to_user_id).await.unwrap_or(false) {
        return Ok(HttpResponse::BadRequest().json(ApiError {
            error: "invalid_input".to_string(),
            message: "Recipient is not a member of this house".to_string(),
        }));
    }

    match swap_service::create_swap(&state.db, &house_id, &user_id, &body).await {
        Ok(swap) => Ok(HttpResponse::Created().json(ApiSuccess::new(swap))),
        Err(e) => Ok(swap_error_response(e)),
    }
}

async fn list_pending(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::Unauthorized().json(ApiError {
                error: "unauthorized".to_string(),
                message: "Invalid or missing token".to_string(),
            }));
        }
    };

    let house_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_id".to_string(),
                message: "Invalid house ID format".to_string(),
            }));
        }
    };

    if !house_service::is_member(&state.db, &house_id, &user_id).await.unwrap_or(false) {
        return Ok(HttpResponse::Forbidden().json(ApiError {
            error: "forbidden".to_string(),
            message: "You are not a member of this house".to_string(),
        }));
    }

    match swap_service::list_pending_swaps(&state.db, &house_id, &user_id).await {
        Ok(swaps) => Ok(HttpResponse::Ok().json(ApiSuccess::new(swaps))),
        Err(e) => Ok(swap_error_response(e)),
    }
}

async fn get_active(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    query: web::Query<ActiveSwapQuery>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::Unauthorized().json(ApiError {
                error: "unauthorized".to_string(),
                message: "Invalid or missing token".to_string(),
            }));
        }
    };

    let house_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_id".to_string(),
                message: "Invalid house ID format".to_string(),
            }));
        }
    };

    if !house_service::is_member(&state.db, &house_id, &user_id).await.unwrap_or(false) {
        return Ok(HttpResponse::Forbidden().json(ApiError {
            error: "forbidden".to_string(),
            message: "You are not a member of this house".to_string(),
        }));
    }

    // Sweep aged-out temporary swaps first so the answer reflects today.
    let today = Utc::now().date_naive();
    if let Err(e) = swap_service::expire_temporary_swaps(&state.db, &house_id, today).await {
        return Ok(swap_error_response(e));
    }

    match swap_service::get_active_swap_for_task(
        &state.db,
        &house_id,
        &query.task_id,
        query.week_start_date,
        query.date,
    )
    .await
    {
        Ok(swap) => Ok(HttpResponse::Ok().json(ApiSuccess::new(swap))),
        Err(e) => Ok(swap_error_response(e)),
    }
}

/// Expire aged-out temporary swaps. Meant for a periodic caller; the active
/// lookup also sweeps, so this only has to run often enough for listings.
async fn expire_swaps(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::Unauthorized().json(ApiError {
                error: "unauthorized".to_string(),
                message: "Invalid or missing token".to_string(),
            }));
        }
    };

    let house_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_id".to_string(),
                message: "Invalid house ID format".to_string(),
            }));
        }
    };

    if !house_service::is_member(&state.db, &house_id, &user_id).await.unwrap_or(false) {
        return Ok(HttpResponse::Forbidden().json(ApiError {
            error: "forbidden".to_string(),
            message: "You are not a member of this house".to_string(),
        }));
    }

    let today = Utc::now().date_naive();
    match swap_service::expire_temporary_swaps(&state.db, &house_id, today).await {
        Ok(expired) => Ok(HttpResponse::Ok().json(ApiSuccess::new(expired))),
        Err(e) => Ok(swap_error_response(e)),
    }
}

async fn accept_swap(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    respond(state, req, path, true).await
}

async fn reject_swap(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    respond(state, req, path, false).await
}

async fn respond(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<(String, String)>,
    accept: bool,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::Unauthorized().json(ApiError {
                error: "unauthorized".to_string(),
                message: "Invalid or missing token".to_string(),
            }));
        }
    };

    let (house_id, swap_id) = path.into_inner();
    let (house_id, swap_id) = match (Uuid::parse_str(&house_id), Uuid::parse_str(&swap_id)) {
        (Ok(h), Ok(s)) => (h, s),
        _ => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_id".to_string(),
                message: "Invalid ID format".to_string(),
            }));
        }
    };

    if !house_service::is_member(&state.db, &house_id, &user_id).await.unwrap_or(false) {
        return Ok(HttpResponse::Forbidden().json(ApiError {
            error: "forbidden".to_string(),
            message: "You are not a member of this house".to_string(),
        }));
    }

    match swap_service::get_swap(&state.db, &swap_id).await {
        Ok(Some(swap)) if swap.house_id == house_id => {}
        Ok(_) => {
            return Ok(HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "Swap not found".to_string(),
            }));
        }
        Err(e) => return Ok(swap_error_response(e)),
    }

    match swap_service::respond_to_swap(&state.db, &swap_id, &user_id, accept).await {
        Ok(swap) => Ok(HttpResponse::Ok().json(ApiSuccess::new(swap))),
        Err(e) => Ok(swap_error_response(e)),
    }
}
