use actix_web::{web, HttpResponse, Result};
use shared::{ApiError, ApiSuccess, UpdateHouseSettingsRequest};
use uuid::Uuid;

use crate::handlers::{assignments, completions, groups, swaps, tasks, weekly};
use crate::models::AppState;
use crate::services::houses as house_service;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/houses").service(
            web::scope("/{house_id}")
                .route("", web::get().to(get_house))
                .route("/settings", web::put().to(update_settings))
                .route("/members", web::get().to(list_members))
                .configure(tasks::configure)
                .configure(groups::configure)
                .configure(assignments::configure)
                .configure(completions::configure)
                .configure(weekly::configure)
                .configure(swaps::configure),
        ),
    );
}

async fn get_house(
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

    match house_service::get_house(&state.db, &house_id).await {
        Ok(Some(house)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(house))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "House not found".to_string(),
        })),
        Err(e) => {
            log::error!("Error fetching house: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to fetch house".to_string(),
            }))
        }
    }
}

async fn update_settings(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateHouseSettingsRequest>,
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

    if !house_service::is_owner(&state.db, &house_id, &user_id).await.unwrap_or(false) {
        return Ok(HttpResponse::Forbidden().json(ApiError {
            error: "forbidden".to_string(),
            message: "Only the house owner can change settings".to_string(),
        }));
    }

    match house_service::update_settings(&state.db, &house_id, &body).await {
        Ok(house) => Ok(HttpResponse::Ok().json(ApiSuccess::new(house))),
        Err(house_service::HouseError::NotFound) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "House not found".to_string(),
        })),
        Err(
            e @ (house_service::HouseError::InvalidWeekStartDay
            | house_service::HouseError::InvalidRotationWeeks),
        ) => Ok(HttpResponse::Conflict().json(ApiError {
            error: "conflict".to_string(),
            message: e.to_string(),
        })),
        Err(e) => {
            log::error!("Error updating house settings: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to update settings".to_string(),
            }))
        }
    }
}

async fn list_members(
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

    match house_service::list_members(&state.db, &house_id).await {
        Ok(members) => Ok(HttpResponse::Ok().json(ApiSuccess::new(members))),
        Err(e) => {
            log::error!("Error listing members: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to list members".to_string(),
            }))
        }
    }
}
