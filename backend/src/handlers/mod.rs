use actix_web::web;

pub mod assignments;
pub mod completions;
pub mod groups;
pub mod houses;
pub mod swaps;
pub mod tasks;
pub mod users;
pub mod weekly;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(users::configure)
            .configure(houses::configure),
    );
}
