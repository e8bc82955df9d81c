use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use discussion_service::handlers;
use discussion_service::repository::{PostStore, ReviewStore};
use discussion_service::services::CommentService;
use discussion_service::Config;

#[tokio::main]
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

    info!("Starting discussion-service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: env={}, http_port={}",
        config.app.env, config.app.http_port
    );

    // Initialize database pool with prepared statement caching disabled for
    // PgBouncer compatibility
    let connect_options = PgConnectOptions::from_str(&config.database.url)
        .context("Failed to parse DATABASE_URL")?
        .statement_cache_capacity(0);

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options)
        .await
        .context("Failed to connect to database")?;

    // Verify database connection
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("Failed to verify database connection")?;
    info!("Database pool created and verified");

    // Run database migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    // One engine instance per parent entity kind
    let post_comments = CommentService::new(pool.clone(), Arc::new(PostStore::new(pool.clone())));
    let review_comments =
        CommentService::new(pool.clone(), Arc::new(ReviewStore::new(pool.clone())));

    let bind_address = format!("{}:{}", config.app.host, config.app.http_port);
    info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            // default instance for entity-agnostic routes
            .app_data(web::Data::new(post_comments.clone()))
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/ready", web::get().to(|| async { "READY" }))
            .route(
                "/api/v1/users/{id}/comments",
                web::get().to(handlers::get_author_comments),
            )
            .service(
                web::scope("/api/v1/posts")
                    .app_data(web::Data::new(post_comments.clone()))
                    .service(
                        web::resource("/{id}/comments")
                            .route(web::get().to(handlers::list_thread))
                            .route(web::post().to(handlers::create_comment)),
                    )
                    .service(
                        web::resource("/comments/{id}")
                            .route(web::put().to(handlers::update_comment))
                            .route(web::delete().to(handlers::delete_comment)),
                    )
                    .route(
                        "/comments/{id}/upvote",
                        web::post().to(handlers::upvote_comment),
                    )
                    .route(
                        "/comments/{id}/downvote",
                        web::post().to(handlers::downvote_comment),
                    )
                    .route("/comments/{id}/vote", web::delete().to(handlers::remove_vote)),
            )
            .service(
                web::scope("/api/v1/reviews")
                    .app_data(web::Data::new(review_comments.clone()))
                    .service(
                        web::resource("/{id}/comments")
                            .route(web::get().to(handlers::list_thread))
                            .route(web::post().to(handlers::create_comment)),
                    )
                    .service(
                        web::resource("/comments/{id}")
                            .route(web::put().to(handlers::update_comment))
                            .route(web::delete().to(handlers::delete_comment)),
                    )
                    .route(
                        "/comments/{id}/upvote",
                        web::post().to(handlers::upvote_comment),
                    )
                    .route(
                        "/comments/{id}/downvote",
                        web::post().to(handlers::downvote_comment),
                    )
                    .route("/comments/{id}/vote", web::delete().to(handlers::remove_vote)),
            )
    })
    .bind(&bind_address)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("discussion-service shutting down");
    Ok(())
}
