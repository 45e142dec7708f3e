use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wall_service::config::Config;
use wall_service::handlers;
use wall_service::jobs::CleanupSweeper;
use wall_service::middleware::RequireAuth;
use wall_service::security::TokenService;
use wall_service::store::{FeedStore, MemoryFeedStore, PgFeedStore};
use wall_service::AppState;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Starting wall-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.env);

    let store: Arc<dyn FeedStore> = match config.database.url.as_deref() {
        Some(url) => {
            let store = PgFeedStore::connect(url, config.database.max_connections)
                .await
                .context("Failed to connect to PostgreSQL")?;
            info!(
                "Database pool initialized with {} max connections",
                config.database.max_connections
            );

            if config.database.run_migrations {
                store
                    .migrate()
                    .await
                    .context("Failed to run database migrations")?;
                info!("Database migrations completed");
            }

            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store; data will not survive a restart");
            Arc::new(MemoryFeedStore::new())
        }
    };

    let tokens = Arc::new(TokenService::new(
        &config.auth.token_secret,
        config.auth.token_ttl_secs,
    ));

    let state = AppState::new(store, tokens.clone());

    // Retries account cascades that were interrupted mid-flight
    let _sweeper = if config.jobs.cleanup_sweep_secs > 0 {
        let sweeper = CleanupSweeper::new(
            state.accounts.clone(),
            Duration::from_secs(config.jobs.cleanup_sweep_secs),
        );
        Some(sweeper.start())
    } else {
        warn!("Cleanup sweeper disabled (CLEANUP_SWEEP_SECS=0)");
        None
    };

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    info!("Starting HTTP server at {}", bind_address);

    let app_state = web::Data::new(state);
    let cors_origins = config.app.cors_allowed_origins.clone();

    HttpServer::new(move || {
        // Build CORS configuration from the comma separated origin list
        let mut cors = Cors::default();
        for origin in cors_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .service(
                web::scope("/api")
                    // Public routes
                    .service(handlers::health::health)
                    .service(handlers::health::liveness)
                    .service(handlers::auth::register)
                    .service(handlers::auth::login)
                    // Everything else requires a valid token
                    .service(
                        web::scope("")
                            .wrap(RequireAuth::new(tokens.clone()))
                            .service(handlers::auth::re_auth)
                            .service(handlers::auth::logout)
                            .service(handlers::users::list_users)
                            .service(handlers::users::get_user)
                            .service(handlers::users::update_user)
                            .service(handlers::users::delete_user)
                            .service(handlers::posts::wall)
                            .service(handlers::posts::user_posts)
                            .service(handlers::posts::create_post)
                            .service(handlers::posts::like_post)
                            .service(handlers::posts::unlike_post)
                            .service(handlers::comments::add_comment)
                            .service(handlers::comments::edit_comment)
                            .service(handlers::comments::delete_comment)
                            .service(handlers::posts::get_post)
                            .service(handlers::posts::edit_post)
                            .service(handlers::posts::delete_post),
                    ),
            )
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server error")?;

    info!("wall-service shutdown complete");

    Ok(())
}
