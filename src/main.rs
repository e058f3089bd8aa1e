use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod routes;
mod server;

async fn run() {
    // initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_thread_ids(true).json().flatten_event(true))
        .init();

    // load env
    dotenv::dotenv().ok();

    // serve app
    if let Err(err) = server::serve().await {
        tracing::error!(message = err.message(), err = err.to_string(), "Server failed");
        std::process::exit(1);
    }

    tracing::info!("Server has stopped.");
}

fn main() {
    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("Failed to build async rt: {err}");
            std::process::exit(1);
        }
    };
    rt.block_on(run())
}
