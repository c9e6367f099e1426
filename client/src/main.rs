use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contentflow_client::{App, AuthPhase, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ContentFlow client");

    let (app, controller) = App::new(config);
    let controller_handle = tokio::spawn(controller.run());

    // Wait for the session bootstrap to resolve.
    let mut phase = app.phase.clone();
    loop {
        let loading = *phase.borrow() == AuthPhase::Loading;
        if !loading {
            break;
        }
        if phase.changed().await.is_err() {
            break;
        }
    }
    match &*phase.borrow() {
        AuthPhase::Authenticated(user) => {
            tracing::info!(user = %user.name, plan = %user.plan, "Session restored");
        }
        _ => tracing::info!("No active session"),
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    controller_handle.abort();

    Ok(())
}
