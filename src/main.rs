#[tokio::main]
async fn main() {
    let log_guard = presence_sync::logging::init_logging();

    if let Err(e) = presence_sync::run().await {
        tracing::error!("presence-sync failed: {}", e);
        drop(log_guard);
        std::process::exit(1);
    }
}
