use actix_web::{web, HttpResponse, Result};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::{AddExtraCompletionRequest, ApiError, ApiSuccess, CompleteTaskRequest};
use uuid::Uuid;

use crate::models::AppState;
use crate::services::{
    completions as completion_service, extra_completions as extra_service,
    houses as house_service,
};

#[derive(Debug, Deserialize)]
struct WeekQuery {
    week_start_date: NaiveDate,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/completions")
            .route("", web::get().to(list_completions))
            .route("", web::post().to(complete_task))
            .route("/pending", web::get().to(list_pending))
            .route("/{completion_id}/validate", web::post().to(validate_completion))
            .route("/{completion_id}", web::delete().to(discard_completion)),
    );
    cfg.service(
        web::scope("/extras")
            .route("", web::get().to(list_extras))
            .route("", web::post().to(add_extra))
            .route("/{extra_id}/validate", web::post().to(validate_extra))
            .route("/{extra_id}", web::delete().to(discard_extra)),
    );
}

fn completion_error_response(e: completion_service::CompletionError) -> HttpResponse {
    match e {
        completion_service::CompletionError::TaskNotFound
        | completion_service::CompletionError::NotFound => {
            HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: e.to_string(),
            })
        }
        completion_service::CompletionError::NotPending => {
            HttpResponse::Conflict().json(ApiError {
                error: "conflict".to_string(),
                message: e.to_string(),
            })
        }
        completion_service::CompletionError::SelfValidation => {
            HttpResponse::Forbidden().json(ApiError {
                error: "forbidden".to_string(),
                message: e.to_string(),
            })
        }
        e => {
            log::error!("Completion error: {:?}", e);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Completion operation failed".to_string(),
            })
        }
    }
}

fn extra_error_response(e: extra_service::ExtraCompletionError) -> HttpResponse {
    match e {
        extra_service::ExtraCompletionError::NotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: e.to_string(),
        }),
        extra_service::ExtraCompletionError::NotPending => {
            HttpResponse::Conflict().json(ApiError {
                error: "conflict".to_string(),
                message: e.to_string(),
            })
        }
        extra_service::ExtraCompletionError::SelfValidation => {
            HttpResponse::Forbidden().json(ApiError {
                error: "forbidden".to_string(),
                message: e.to_string(),
            })
        }
        extra_service::ExtraCompletionError::InvalidName
        | extra_service::ExtraCompletionError::InvalidPoints => {
            HttpResponse::BadRequest().json(ApiError {
                error: "invalid_input".to_string(),
                message: e.to_string(),
            })
        }
        e => {
            log::error!("Extra completion error: {:?}", e);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Extra completion operation failed".to_string(),
            })
        }
    }
}

async fn complete_task(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<CompleteTaskRequest>,
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
    match completion_service::complete_task(
        &state.db,
        &house_id,
        &body.task_id,
        &user_id,
        body.week_start_date,
        today,
    )
    .await
    {
        Ok(completion) => Ok(HttpResponse::Created().json(ApiSuccess::new(completion))),
        Err(e) => Ok(completion_error_response(e)),
    }
}

async fn list_completions(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    query: web::Query<WeekQuery>,
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

    match completion_service::list_completions(&state.db, &house_id, &user_id, query.week_start_date)
        .await
    {
        Ok(completions) => Ok(HttpResponse::Ok().json(ApiSuccess::new(completions))),
        Err(e) => Ok(completion_error_response(e)),
    }
}

async fn list_pending(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    query: web::Query<WeekQuery>,
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

    match completion_service::list_pending_to_validate(
        &state.db,
        &house_id,
        &user_id,
        query.week_start_date,
    )
    .await
    {
        Ok(completions) => Ok(HttpResponse::Ok().json(ApiSuccess::new(completions))),
        Err(e) => Ok(completion_error_response(e)),
    }
}

async fn validate_completion(
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

    let (house_id, completion_id) = path.into_inner();
    let (house_id, completion_id) =
        match (Uuid::parse_str(&house_id), Uuid::parse_str(&completion_id)) {
            (Ok(h), Ok(c)) => (h, c),
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

    match completion_service::get_completion(&state.db, &completion_id).await {
        Ok(Some(completion)) if completion.house_id == house_id => {}
        Ok(_) => {
            return Ok(HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "Completion not found".to_string(),
            }));
        }
        Err(e) => return Ok(completion_error_response(e)),
    }

    match completion_service::validate_completion(&state.db, &completion_id, &user_id).await {
        Ok(completion) => Ok(HttpResponse::Ok().json(ApiSuccess::new(completion))),
        Err(e) => Ok(completion_error_response(e)),
    }
}

async fn discard_completion(
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

    let (house_id, completion_id) = path.into_inner();
    let (house_id, completion_id) =
        match (Uuid::parse_str(&house_id), Uuid::parse_str(&completion_id)) {
            (Ok(h), Ok(c)) => (h, c),
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

    // Only the member who logged a completion may withdraw it.
    match completion_service::get_completion(&state.db, &completion_id).await {
        Ok(Some(completion)) if completion.house_id == house_id => {
            if completion.user_id != user_id {
                return Ok(HttpResponse::Forbidden().json(ApiError {
                    error: "forbidden".to_string(),
                    message: "You can only discard your own completions".to_string(),
                }));
            }
        }
        Ok(_) => {
            return Ok(HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "Completion not found".to_string(),
            }));
        }
        Err(e) => return Ok(completion_error_response(e)),
    }

    match completion_service::discard_completion(&state.db, &completion_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiSuccess::new("discarded"))),
        Err(e) => Ok(completion_error_response(e)),
    }
}

async fn add_extra(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<AddExtraCompletionRequest>,
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

    match extra_service::add_extra_completion(&state.db, &house_id, &user_id, &body).await {
        Ok(extra) => Ok(HttpResponse::Created().json(ApiSuccess::new(extra))),
        Err(e) => Ok(extra_error_response(e)),
    }
}

async fn list_extras(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    query: web::Query<WeekQuery>,
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

    match extra_service::list_extra_completions(&state.db, &house_id, &user_id, query.week_start_date)
        .await
    {
        Ok(extras) => Ok(HttpResponse::Ok().json(ApiSuccess::new(extras))),
        Err(e) => Ok(extra_error_response(e)),
    }
}

async fn validate_extra(
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

    let (house_id, extra_id) = path.into_inner();
    let (house_id, extra_id) = match (Uuid::parse_str(&house_id), Uuid::parse_str(&extra_id)) {
        (Ok(h), Ok(e)) => (h, e),
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

    match extra_service::get_extra_completion(&state.db, &extra_id).await {
        Ok(Some(extra)) if extra.house_id == house_id => {}
        Ok(_) => {
            return Ok(HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "Extra completion not found".to_string(),
            }));
        }
        Err(e) => return Ok(extra_error_response(e)),
    }

    match extra_service::validate_extra_completion(&state.db, &extra_id, &user_id).await {
        Ok(extra) => Ok(HttpResponse::Ok().json(ApiSuccess::new(extra))),
        Err(e) => Ok(extra_error_response(e)),
    }
}

async fn discard_extra(
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

    let (house_id, extra_id) = path.into_inner();
    let (house_id, extra_id) = match (Uuid::parse_str(&house_id), Uuid::parse_str(&extra_id)) {
        (Ok(h), Ok(e)) => (h, e),
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

    // Only the member who logged an extra may withdraw it.
    match extra_service::get_extra_completion(&state.db, &extra_id).await {
        Ok(Some(extra)) if extra.house_id == house_id => {
            if extra.user_id != user_id {
                return Ok(HttpResponse::Forbidden().json(ApiError {
                    error: "forbidden".to_string(),
                    message: "You can only discard your own completions".to_string(),
                }));
            }
        }
        Ok(_) => {
            return Ok(HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "Extra completion not found".to_string(),
            }));
        }
        Err(e) => return Ok(extra_error_response(e)),
    }

    match extra_service::discard_extra_completion(&state.db, &extra_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiSuccess::new("discarded"))),
        Err(e) => Ok(extra_error_response(e)),
    }
}
