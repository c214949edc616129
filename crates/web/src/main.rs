use std::sync::Arc;

use anyhow::Context;
use storage::{Database, services::MarkPolicy};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod routes;
mod state;

use config::Config;
use features::{faculty, students};
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health,
        faculty::handlers::list_courses,
        faculty::handlers::list_students,
        faculty::handlers::list_marks,
        faculty::handlers::submit_marks,
        faculty::handlers::update_mark,
        students::handlers::component_marks,
        students::handlers::entire_result,
        students::handlers::course_result,
        students::handlers::verify_marks,
    ),
    components(
        schemas(
            storage::dto::marks::MarkEntry,
            storage::dto::marks::SubmitMarksRequest,
            storage::dto::marks::RosterMark,
            storage::dto::marks::ErrorKind,
            storage::dto::marks::EntryError,
            storage::dto::marks::EntryOutcome,
            storage::dto::marks::BatchUpsertReport,
            storage::dto::marks::VerifyMarkRequest,
            storage::dto::marks::VerifyMarkResponse,
            storage::dto::marks::StudentComponentMark,
            storage::dto::marks::CourseSummary,
            storage::dto::marks::FacultyCourse,
            storage::dto::result::ComponentDetail,
            storage::dto::result::VerificationRollup,
            storage::dto::result::CourseResult,
            storage::models::Component,
            storage::models::VerificationStatus,
            storage::models::MarkRecord,
            storage::models::Course,
            storage::models::Student,
        )
    ),
    tags(
        (name = "faculty", description = "Mark entry and class rosters for faculty"),
        (name = "students", description = "Result viewing and mark verification for students"),
        (name = "health", description = "Service liveness"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting marks API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let policy = MarkPolicy {
        freeze_verified: config.freeze_verified_marks,
    };
    if !policy.freeze_verified {
        tracing::warn!("Verified marks can be overwritten (FREEZE_VERIFIED_MARKS=false)");
    }

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("No API_KEYS configured, every protected request will be rejected");
    }

    let state = AppState::new(Arc::new(db), policy);

    let app = routes::router(state, api_keys)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
