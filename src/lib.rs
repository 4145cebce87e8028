pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use application::delivery_service::DeliveryService;
pub use db::{create_pool, DbPool};
pub use infrastructure::pg_store::PgDeliveryStore;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::delivery::list_tasks,
        handlers::delivery::change_task_status,
        handlers::delivery::list_offers,
        handlers::delivery::assign_offer,
        handlers::delivery::apply_courier,
    ),
    components(schemas(
        handlers::delivery::TaskSummaryResponse,
        handlers::delivery::OfferResponse,
        handlers::delivery::AssignResponse,
        handlers::delivery::ChangeStatusRequest,
        handlers::delivery::StatusResponse,
        handlers::delivery::CourierApplicationRequest,
        handlers::delivery::CourierApplicationResponse,
    )),
    tags((name = "delivery", description = "Delivery offers, claims and task lifecycle"))
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Build and return an actix-web `Server` bound to `host:port`, backed by
/// PostgreSQL.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service = DeliveryService::new(Arc::new(PgDeliveryStore::new(pool)));
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(service.clone()))
            .wrap(Logger::default())
            .configure(handlers::delivery::configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}

#[cfg(test)]
mod tests {
    use super::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn openapi_documents_every_delivery_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/delivery/tasks/",
            "/delivery/tasks/{id}/status/",
            "/delivery/offers/",
            "/delivery/offers/{id}/assign/",
            "/delivery/courier/apply/",
        ] {
            assert!(paths.contains(&expected), "missing {} in {:?}", expected, paths);
        }
    }
}
