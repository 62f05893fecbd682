use actix_web::{web, HttpResponse, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{ApiError, ApiSuccess, SaveAssignmentsRequest, Task, WeeklyAssignment};
use uuid::Uuid;

use crate::models::AppState;
use crate::services::{
    groups as group_service, houses as house_service, rotation as rotation_service,
};

#[derive(Debug, Deserialize)]
struct WeekQuery {
    week_start_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct RotateRequest {
    week_start_date: NaiveDate,
}

/// The caller's own assignment for a week, with the assigned group's tasks
/// resolved so a dashboard needs a single request.
#[derive(Debug, Serialize)]
struct MyAssignment {
    assignment: Option<WeeklyAssignment>,
    tasks: Vec<Task>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/assignments")
            .route("", web::get().to(get_assignments))
            .route("", web::put().to(save_assignments))
            .route("/mine", web::get().to(get_my_assignment))
            .route("/rotate", web::post().to(rotate))
            .route("/suggest", web::get().to(suggest))
            .route("/{user_id}", web::delete().to(clear_assignment)),
    );
}

fn rotation_error_response(e: rotation_service::RotationError) -> HttpResponse {
    match e {
        rotation_service::RotationError::HouseNotFound => {
            HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "House not found".to_string(),
            })
        }
        e => {
            log::error!("Rotation error: {:?}", e);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Assignment operation failed".to_string(),
            })
        }
    }
}

async fn get_assignments(
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

    match rotation_service::get_assignments(&state.db, &house_id, query.week_start_date).await {
        Ok(assignments) => Ok(HttpResponse::Ok().json(ApiSuccess::new(assignments))),
        Err(e) => Ok(rotation_error_response(e)),
    }
}

async fn get_my_assignment(
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

    let assignments =
        match rotation_service::get_assignments(&state.db, &house_id, query.week_start_date).await
        {
            Ok(assignments) => assignments,
            Err(e) => return Ok(rotation_error_response(e)),
        };
    let assignment = assignments.into_iter().find(|a| a.user_id == user_id);

    let tasks = match assignment.as_ref().and_then(|a| a.task_group_id) {
        Some(group_id) => {
            match group_service::get_group_with_tasks(&state.db, &house_id, &group_id).await {
                Ok(Some(group)) => group.tasks,
                // Group deleted after assignment: no tasks to show.
                Ok(None) => Vec::new(),
                Err(e) => {
                    log::error!("Error fetching assigned group: {:?}", e);
                    return Ok(HttpResponse::InternalServerError().json(ApiError {
                        error: "internal_error".to_string(),
                        message: "Failed to fetch assigned group".to_string(),
                    }));
                }
            }
        }
        None => Vec::new(),
    };

    Ok(HttpResponse::Ok().json(ApiSuccess::new(MyAssignment { assignment, tasks })))
}

async fn rotate(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<RotateRequest>,
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

    match rotation_service::assign_groups_for_week(&state.db, &house_id, body.week_start_date).await
    {
        Ok(assignments) => Ok(HttpResponse::Ok().json(ApiSuccess::new(assignments))),
        Err(e) => Ok(rotation_error_response(e)),
    }
}

async fn suggest(
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

    match rotation_service::suggest_assignments(&state.db, &house_id, query.week_start_date).await {
        Ok(suggestions) => Ok(HttpResponse::Ok().json(ApiSuccess::new(suggestions))),
        Err(e) => Ok(rotation_error_response(e)),
    }
}

async fn save_assignments(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<SaveAssignmentsRequest>,
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
            message: "Only the house owner can save assignments".to_string(),
        }));
    }

    match rotation_service::save_assignments(&state.db, &house_id, &body).await {
        Ok(assignments) => Ok(HttpResponse::Ok().json(ApiSuccess::new(assignments))),
        Err(e) => Ok(rotation_error_response(e)),
    }
}

async fn clear_assignment(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<(String, String)>,
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

    let (house_id, target_user_id) = path.into_inner();
    let (house_id, target_user_id) =
        match (Uuid::parse_str(&house_id), Uuid::parse_str(&target_user_id)) {
            (Ok(h), Ok(u)) => (h, u),
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

    // Members step back from their own assignment; only the owner may clear
    // someone else's.
    if target_user_id != user_id
        && !house_service::is_owner(&state.db, &house_id, &user_id).await.unwrap_or(false)
    {
        return Ok(HttpResponse::Forbidden().json(ApiError {
            error: "forbidden".to_string(),
            message: "You can only clear your own assignment".to_string(),
        }));
    }

    match rotation_service::clear_assignment(&state.db, &house_id, &target_user_id, query.week_start_date)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiSuccess::new("cleared"))),
        Err(e) => Ok(rotation_error_response(e)),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use chrono::NaiveDate;
    use shared::AssignmentEntry;

    use super::*;
    use crate::services::rotation as rotation_service;
    use crate::services::testing::{
        add_member, bearer, create_group, create_house, create_user, setup_test_db, test_config,
    };

    fn week() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[actix_web::test]
    async fn test_save_assignments_is_owner_only() {
        let pool = setup_test_db().await;
        let owner = create_user(&pool, "owner@example.com").await;
        let member = create_user(&pool, "member@example.com").await;
        let house = create_house(&pool, &owner, 1, 1).await;
        add_member(&pool, &house, &owner).await;
        add_member(&pool, &house, &member).await;
        let group = create_group(&pool, &house, "Kitchen").await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState {
                    db: pool.clone(),
                    config: test_config(),
                }))
                .configure(crate::handlers::configure_routes),
        )
        .await;

        let body = SaveAssignmentsRequest {
            week_start_date: week(),
            assignments: vec![AssignmentEntry {
                user_id: member,
                task_group_id: Some(group),
            }],
        };

        let req = test::TestRequest::put()
            .uri(&format!("/api/houses/{house}/assignments"))
            .insert_header(("Authorization", bearer(&member)))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(rotation_service::get_assignments(&pool, &house, week())
            .await
            .unwrap()
            .is_empty());

        let req = test::TestRequest::put()
            .uri(&format!("/api/houses/{house}/assignments"))
            .insert_header(("Authorization", bearer(&owner)))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_members_clear_only_their_own_assignment() {
        let pool = setup_test_db().await;
        let owner = create_user(&pool, "owner@example.com").await;
        let member = create_user(&pool, "member@example.com").await;
        let house = create_house(&pool, &owner, 1, 1).await;
        add_member(&pool, &house, &owner).await;
        add_member(&pool, &house, &member).await;
        create_group(&pool, &house, "Kitchen").await;
        create_group(&pool, &house, "Bathroom").await;
        rotation_service::assign_groups_for_week(&pool, &house, week())
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState {
                    db: pool.clone(),
                    config: test_config(),
                }))
                .configure(crate::handlers::configure_routes),
        )
        .await;

        let req = test::TestRequest::delete()
            .uri(&format!(
                "/api/houses/{house}/assignments/{owner}?week_start_date=2024-01-15"
            ))
            .insert_header(("Authorization", bearer(&member)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let assignments = rotation_service::get_assignments(&pool, &house, week())
            .await
            .unwrap();
        assert!(assignments[0].task_group_id.is_some());

        let req = test::TestRequest::delete()
            .uri(&format!(
                "/api/houses/{house}/assignments/{member}?week_start_date=2024-01-15"
            ))
            .insert_header(("Authorization", bearer(&member)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // The owner can clear anyone.
        let req = test::TestRequest::delete()
            .uri(&format!(
                "/api/houses/{house}/assignments/{owner}?week_start_date=2024-01-15"
            ))
            .insert_header(("Authorization", bearer(&owner)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let assignments = rotation_service::get_assignments(&pool, &house, week())
            .await
            .unwrap();
        assert!(assignments.iter().all(|a| a.task_group_id.is_none()));
    }
}
