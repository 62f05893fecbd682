use actix_web::{web, HttpResponse, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{ApiError, ApiSuccess, ProcessWeekEndRequest, UpsertWeeklyConfigRequest};
use uuid::Uuid;

use crate::models::AppState;
use crate::services::{houses as house_service, week_end as week_end_service, weeks};

#[derive(Debug, Deserialize)]
struct WeekQuery {
    week_start_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct WeekInfo {
    week_start_date: NaiveDate,
    week_end_date: NaiveDate,
    days_remaining: i64,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/week", web::get().to(get_week_info))
        .route("/scores", web::get().to(get_scores))
        .route("/config", web::get().to(get_config))
        .route("/config", web::put().to(upsert_config))
        .route("/week-end", web::post().to(process_week_end));
}

/// Resolve an arbitrary date to the house's week, using its configured
/// first day of the week.
async fn get_week_info(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    query: web::Query<DateQuery>,
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

    let house = match house_service::get_house(&state.db, &house_id).await {
        Ok(Some(house)) => house,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "House not found".to_string(),
            }));
        }
        Err(e) => {
            log::error!("Error fetching house: {:?}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to fetch house".to_string(),
            }));
        }
    };

    let today = Utc::now().date_naive();
    let info = WeekInfo {
        week_start_date: weeks::week_start(query.date, house.week_start_day),
        week_end_date: weeks::week_end(query.date, house.week_start_day),
        days_remaining: weeks::days_remaining_in_week(today, query.date, house.week_start_day),
    };

    Ok(HttpResponse::Ok().json(ApiSuccess::new(info)))
}

async fn get_scores(
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

    match week_end_service::get_week_scores(&state.db, &house_id, query.week_start_date).await {
        Ok(scores) => Ok(HttpResponse::Ok().json(ApiSuccess::new(scores))),
        Err(e) => {
            log::error!("Error fetching weekly scores: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to fetch weekly scores".to_string(),
            }))
        }
    }
}

async fn get_config(
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

    match week_end_service::get_config(&state.db, &house_id, query.week_start_date).await {
        Ok(Some(config)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(config))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "No configuration for this week".to_string(),
        })),
        Err(e) => {
            log::error!("Error fetching weekly config: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to fetch weekly config".to_string(),
            }))
        }
    }
}

async fn upsert_config(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpsertWeeklyConfigRequest>,
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
            message: "Only the house owner can change the weekly target".to_string(),
        }));
    }

    if body.points_target_per_person < 0 {
        return Ok(HttpResponse::BadRequest().json(ApiError {
            error: "invalid_input".to_string(),
            message: "Target must not be negative".to_string(),
        }));
    }

    match week_end_service::upsert_config(&state.db, &house_id, &body).await {
        Ok(config) => Ok(HttpResponse::Ok().json(ApiSuccess::new(config))),
        Err(e) => {
            log::error!("Error upserting weekly config: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to update weekly config".to_string(),
            }))
        }
    }
}

async fn process_week_end(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<ProcessWeekEndRequest>,
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
            message: "Only the house owner can close a week".to_string(),
        }));
    }

    if body.base_target < 0 {
        return Ok(HttpResponse::BadRequest().json(ApiError {
            error: "invalid_input".to_string(),
            message: "Base target must not be negative".to_string(),
        }));
    }

    match week_end_service::process_week_end(&state.db, &house_id, body.week_start_date, body.base_target)
        .await
    {
        Ok(outcomes) => {
            for outcome in &outcomes {
                log::info!(
                    "Week {} closed for {}: deficit {}, surplus {}, next target {}",
                    body.week_start_date,
                    outcome.user_id,
                    outcome.deficit,
                    outcome.surplus,
                    outcome.next_target
                );
            }
            let next_week = body.week_start_date + chrono::Duration::days(7);
            match week_end_service::get_week_scores(&state.db, &house_id, next_week).await {
                Ok(scores) => Ok(HttpResponse::Ok().json(ApiSuccess::new(scores))),
                Err(e) => {
                    log::error!("Error fetching next-week scores: {:?}", e);
                    Ok(HttpResponse::InternalServerError().json(ApiError {
                        error: "internal_error".to_string(),
                        message: "Failed to fetch next-week scores".to_string(),
                    }))
                }
            }
        }
        Err(e) => {
            log::error!("Error processing week end: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to process week end".to_string(),
            }))
        }
    }
}
