use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;
use sqlx::PgPool;

use clinic_scheduler::database::init_database;
use clinic_scheduler::{AppState, Config, routes};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("Clinic Scheduler API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration (reads .env when present)
    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!(
        "Starting clinic scheduler (environment: {}, provisioning: {:?})",
        config.environment,
        config.availability_provisioning
    );
    if config.is_production() && config.jwt_secret.contains("change-this-in-production") {
        log::warn!("JWT_SECRET is still the development default");
    }

    let pool = init_database(&config.database_url, config.max_connections).await?;
    log::info!("Database initialized");

    let app_state = web::Data::new(AppState::<PgPool>::new(pool, &config));
    let config_data = web::Data::new(config.clone());

    let server_address = config.server_address();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(app_state.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&config_data.client_base_url)
                    .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
                    .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
                    .max_age(3600),
            )
            .wrap(Logger::new(r#"%a "%r" %s %b "%{User-Agent}i" %T"#))
            .service(hello)
            .service(health)
            .configure(routes::configure::<PgPool>)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
