use tracing_subscriber::EnvFilter;

use skirmish_host::arena::DemoArena;
use skirmish_host::config::MatchConfig;
use skirmish_host::match_loop::{MatchCommand, spawn_match};
use skirmish_host::presenter::Presenter;
use skirmish_host::registry::ModeRegistry;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = MatchConfig::load();
    if let Some(mode) = std::env::args()
        .skip(1)
        .find_map(|a| a.strip_prefix("--mode=").map(String::from))
    {
        config.mode = mode;
    }
    if let Err(e) = config.validate() {
        tracing::error!("{e}");
        std::process::exit(1);
    }

    let registry = ModeRegistry::new();
    tracing::info!(
        modes = registry.available_modes(),
        mode = %config.mode,
        "Skirmish starting"
    );

    let arena = DemoArena::new(&config.demo);
    let (cmd_tx, broadcast_rx, handle) = match spawn_match(&registry, &config, arena) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!("Match setup failed: {e}");
            std::process::exit(1);
        },
    };

    // First interrupt decides the battle on the spot; a second one aborts.
    let stop_tx = cmd_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, ending battle now");
            let _ = stop_tx.send(MatchCommand::End);
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted again, stopping match");
            let _ = stop_tx.send(MatchCommand::Stop);
        }
    });

    let summary = Presenter::new().run(broadcast_rx).await;
    if let Err(e) = handle.await {
        tracing::error!("Match task failed: {e}");
    }
    drop(cmd_tx);

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("Failed to encode match summary: {e}"),
    }
}
