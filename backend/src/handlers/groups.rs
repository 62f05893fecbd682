use actix_web::{web, HttpResponse, Result};
use shared::{ApiError, ApiSuccess, CreateGroupRequest, UpdateGroupRequest};
use uuid::Uuid;

use crate::models::AppState;
use crate::services::{groups as group_service, houses as house_service};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/groups")
            .route("", web::get().to(list_groups))
            .route("", web::post().to(create_group))
            .route("/{group_id}", web::get().to(get_group))
            .route("/{group_id}", web::put().to(update_group))
            .route("/{group_id}", web::delete().to(delete_group)),
    );
}

fn group_error_response(e: group_service::GroupError) -> HttpResponse {
    match e {
        group_service::GroupError::NotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Task group not found".to_string(),
        }),
        group_service::GroupError::InvalidName | group_service::GroupError::UnknownTask => {
            HttpResponse::BadRequest().json(ApiError {
                error: "invalid_input".to_string(),
                message: e.to_string(),
            })
        }
        group_service::GroupError::DatabaseError(e) => {
            log::error!("Group database error: {:?}", e);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Group operation failed".to_string(),
            })
        }
    }
}

async fn list_groups(
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

    match group_service::list_groups_with_tasks(&state.db, &house_id).await {
        Ok(groups) => Ok(HttpResponse::Ok().json(ApiSuccess::new(groups))),
        Err(e) => Ok(group_error_response(e)),
    }
}

async fn create_group(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<CreateGroupRequest>,
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

    match group_service::create_group(&state.db, &house_id, &body).await {
        Ok(group) => Ok(HttpResponse::Created().json(ApiSuccess::new(group))),
        Err(e) => Ok(group_error_response(e)),
    }
}

async fn get_group(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<(String, String)>,
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

    let (house_id, group_id) = path.into_inner();
    let (house_id, group_id) = match (Uuid::parse_str(&house_id), Uuid::parse_str(&group_id)) {
        (Ok(h), Ok(g)) => (h, g),
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

    match group_service::get_group_with_tasks(&state.db, &house_id, &group_id).await {
        Ok(Some(group)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(group))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Task group not found".to_string(),
        })),
        Err(e) => Ok(group_error_response(e)),
    }
}

async fn update_group(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateGroupRequest>,
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

    let (house_id, group_id) = path.into_inner();
    let (house_id, group_id) = match (Uuid::parse_str(&house_id), Uuid::parse_str(&group_id)) {
        (Ok(h), Ok(g)) => (h, g),
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

    match group_service::update_group(&state.db, &house_id, &group_id, &body).await {
        Ok(group) => Ok(HttpResponse::Ok().json(ApiSuccess::new(group))),
        Err(e) => Ok(group_error_response(e)),
    }
}

async fn delete_group(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<(String, String)>,
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

    let (house_id, group_id) = path.into_inner();
    let (house_id, group_id) = match (Uuid::parse_str(&house_id), Uuid::parse_str(&group_id)) {
        (Ok(h), Ok(g)) => (h, g),
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

    match group_service::delete_group(&state.db, &house_id, &group_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiSuccess::new("deleted"))),
        Err(e) => Ok(group_error_response(e)),
    }
}
