use color_eyre::{eyre::eyre, Result};
use padmonitor::config::{config_path, Config};
use padmonitor::controller::ControllerHandle;
use padmonitor::monitor;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let path = config_path()?;
    info!("Using config file {}", path.display());
    let config = Config::load_or_create(&path).await?;

    let mut controller = ControllerHandle::spawn(Some(config.controller.clone()))
        .await
        .map_err(|e| eyre!("Failed to spawn controller: {}", e))?;

    let events = controller
        .take_events()
        .ok_or_else(|| eyre!("Controller event stream already taken"))?;
    let cancel = controller.cancellation_token();

    let monitor_handle = tokio::spawn(monitor::run(
        events,
        controller.subscribe(),
        config.monitor.clone(),
        cancel.child_token(),
    ));

    info!("Monitoring gamepad input, press Ctrl-C to quit");
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");

    if let Err(e) = controller.shutdown().await {
        error!("Controller shutdown failed: {}", e);
    }
    if let Err(e) = monitor_handle.await {
        error!("Monitor task failed: {}", e);
    }

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
