use project_folders_lib::storage;

#[tokio::main]
async fn main() {
    let settings = match storage::loadSettings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load settings: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(settings.tracingLevel())
        .init();

    if let Err(e) = project_folders_lib::run(settings).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
