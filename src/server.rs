use axum::Router;
use lib_core::{config, AppResult, ErrType};
use tokio::signal;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    app::{App, AppState},
    routes,
};

/// Serves axum backend server
pub async fn serve() -> AppResult<()> {
    let app = App::new().await?;

    // bind routes
    let router = get_router(app);

    let addr = config::get_host_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|err| ErrType::ServerError.err(err, format!("Failed to start TCP listener on {addr}")))?;
    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!("Listening on {}", local_addr);
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| ErrType::ServerError.err(err, "Failed to serve"))
}

pub fn get_router(app: AppState) -> Router {
    // Prepare swagger
    let swagger = SwaggerUi::new("/v1/swagger").url("/v1/api-docs/openapi.json", routes::ApiDoc::openapi());

    routes::bind_routes(app.clone(), Router::<AppState>::new())
        .merge(swagger)
        .layer(axum::middleware::from_fn(lib_core::interceptor::intercept))
        .with_state(app)
}

/// Function that listens to signals and notify waiters
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(err = err.to_string(), "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(err = err.to_string(), "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}
