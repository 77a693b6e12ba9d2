//! Headless slide show driving a demo deck

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use slide_core::{SlideSettings, Slides};

mod deck;

use deck::Deck;

/// Time the cards take to deal back in after a shuffle
const DEAL_IN: Duration = Duration::from_millis(900);

/// Settings used when no file is given: the show loops every three seconds
fn default_settings() -> SlideSettings {
    SlideSettings {
        looping: true,
        auto_play: true,
        interval: Duration::from_secs(3),
        ..SlideSettings::default()
    }
}

/// Load settings from a JSON file
fn load_settings(path: &Path) -> Result<SlideSettings> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    let settings = serde_json::from_str(&text)
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(settings)
}

/// Pause, reorder the deck, deal it back in and restart from the top
async fn shuffle(slides: &Slides, deck: &Arc<Deck>) {
    slides.reset();
    slides.pause();
    deck.shuffle();
    info!("Deck shuffled, dealing in");
    tokio::time::sleep(DEAL_IN).await;
    slides.restart();
}

async fn run(settings: SlideSettings) -> Result<()> {
    let deck = Deck::new();
    let interval = settings.interval;
    let slides = Slides::start(deck.options(settings));
    slides.subscribe(deck.clone());

    info!("Starting slide show with {} cards", slides.total());

    // One full lap on auto-play
    tokio::time::sleep(interval * (slides.total() as u32 + 1)).await;
    info!("Lap done, background is {:?}", deck.background());

    // A drag: pause while held, throw the card, resume on release
    slides.pause();
    if let Some(current) = slides.current() {
        deck.throw(current);
    }
    let outcome = slides.next().await?;
    info!("Dragged card away: {:?}", outcome);
    slides.play();
    tokio::time::sleep(interval * 2).await;

    shuffle(&slides, &deck).await;
    tokio::time::sleep(interval * slides.total() as u32).await;

    slides.pause();
    info!(
        "Slide show finished at {:?} of {}",
        slides.current(),
        slides.total()
    );
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => load_settings(Path::new(&path))?,
        None => default_settings(),
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime.block_on(run(settings))
}
