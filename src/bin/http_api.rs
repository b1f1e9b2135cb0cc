//! Serves one moodboard over local HTTP for a browser front-end.

use log::info;
use moodboard::config::ConfigBuilder;
use moodboard::view_api::{AppState, build_router};
use moodboard::{Moodboard, PlaylistFlow};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = ConfigBuilder::new().build()?;
    let state = AppState::new(
        Moodboard::new(config.recommender),
        PlaylistFlow::new(config.spotify, config.store),
    );

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("Moodboard view API listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}
