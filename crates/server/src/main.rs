//! quire server entry point.

use std::sync::Arc;

use quire_api::AppState;
use quire_common::{Config, LocalStorage, StorageBackend};
use quire_core::{
    CommentService, ContactService, FeedService, FollowingService, GroupService, PostService,
    UserService,
};
use quire_db::repositories::{
    CommentRepository, ContactRepository, FollowRepository, GroupRepository, PostRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::services::ServeDir;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quire=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting quire server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(quire_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    quire_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));
    let contact_repo = ContactRepository::new(Arc::clone(&db));

    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::from_config(&config.media));

    // Initialize services
    let user_service = UserService::new(user_repo.clone());
    let group_service = GroupService::new(group_repo.clone());
    let feed_service = FeedService::new(post_repo.clone(), user_repo.clone(), group_repo.clone());
    let post_service = PostService::new(
        post_repo,
        user_repo.clone(),
        group_repo,
        storage,
        config.media.max_image_bytes,
    );
    let comment_service = CommentService::new(comment_repo, user_repo);
    let following_service = FollowingService::new(follow_repo);
    let contact_service = ContactService::new(contact_repo);

    // Create or refresh the configured groups
    let groups = group_service.seed(&config.groups).await?;
    info!(count = groups.len(), "Groups seeded");

    let state = AppState {
        user_service,
        group_service,
        feed_service,
        post_service,
        comment_service,
        following_service,
        contact_service,
        auth: Arc::new(config.auth.clone()),
    };

    // Build router
    let app = quire_api::app(state, config.media.max_image_bytes)
        .nest_service(&config.media.url, ServeDir::new(&config.media.root));

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
