use clap::Parser;
use gridsweep::cli::{
    Args, build_config, connect_store, init_logging, load_service_account, validate_database_url,
};
use gridsweep::{create_app, init_schedule};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(base) = validate_database_url(&args.database_url) else {
        std::process::exit(1);
    };

    let Some(account) = load_service_account(args.credentials_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(store) = connect_store(base, account) else {
        std::process::exit(1);
    };

    let config = build_config(&args, store);
    init_schedule(&config);
    let app = create_app(&config);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap();

    info!(address = %local_addr, "Listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
