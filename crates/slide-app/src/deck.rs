//! Demo deck of cards driven by the slide controller
//! Cards "fly off" as the show advances and are restacked when it loops

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rand::seq::SliceRandom;
use slide_core::{
    effect_fn, progress_fn, SlideContext, SlideOptions, SlideSettings, SlideSubscriber, Transition,
};

/// How long a card takes to fly off screen
const FLY_OFF: Duration = Duration::from_millis(650);

/// A transition never waits longer than this for the fly-off
const FLY_OFF_LIMIT: Duration = Duration::from_millis(500);

/// Pause before restacking when every card is gone
const RESTACK_DELAY: Duration = Duration::from_millis(1000);

/// A single card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: u32,
    pub background: &'static str,
    pub content: &'static str,
    pub title: &'static str,
}

fn default_cards() -> Vec<Card> {
    vec![
        Card {
            id: 1,
            background: "#ffeed2",
            content: "Hello",
            title: "Reimagine your life without any electronic product",
        },
        Card {
            id: 2,
            background: "#a1c3d2",
            content: "こんにちは",
            title: "Make your best to take challenge in your work",
        },
        Card {
            id: 3,
            background: "#3869a8",
            content: "Bonjour",
            title: "React is good but not for high frequency changing data",
        },
        Card {
            id: 4,
            background: "#ffccd2",
            content: "Hallo",
            title: "Life is not easy but you should try to overcome it",
        },
        Card {
            id: 5,
            background: "#fec864",
            content: "Olá",
            title: "Animation is good but state management and orchestration is difficult sometimes",
        },
    ]
}

/// The cards plus which of them have flown off
#[derive(Debug)]
pub struct Deck {
    cards: RwLock<Vec<Card>>,
    gone: Mutex<HashSet<usize>>,
    fly_off: Duration,
}

impl Deck {
    pub fn new() -> Arc<Self> {
        Self::with_cards(default_cards(), FLY_OFF)
    }

    pub fn with_cards(cards: Vec<Card>, fly_off: Duration) -> Arc<Self> {
        Arc::new(Self {
            cards: RwLock::new(cards),
            gone: Mutex::new(HashSet::new()),
            fly_off,
        })
    }

    pub fn len(&self) -> usize {
        self.cards.read().len()
    }

    pub fn card(&self, index: usize) -> Option<Card> {
        self.cards.read().get(index).cloned()
    }

    pub fn gone_count(&self) -> usize {
        self.gone.lock().len()
    }

    pub fn all_gone(&self) -> bool {
        self.gone_count() == self.len()
    }

    /// Background shown behind the stack: the last card once all are gone
    pub fn background(&self) -> Option<&'static str> {
        let cards = self.cards.read();
        let gone = self.gone_count();
        if gone >= cards.len() {
            cards.last().map(|c| c.background)
        } else {
            cards.get(gone).map(|c| c.background)
        }
    }

    /// Mark a card as gone, e.g. after it was dragged away
    pub fn throw(&self, index: usize) {
        self.gone.lock().insert(index);
    }

    /// Put every card back and reorder the deck
    pub fn shuffle(&self) {
        self.gone.lock().clear();
        self.cards.write().shuffle(&mut rand::thread_rng());
    }

    /// Wire the deck's effects into controller options
    pub fn options(self: &Arc<Self>, mut settings: SlideSettings) -> SlideOptions {
        if settings.count != self.len() {
            tracing::debug!("Deck has {} cards, overriding count {}", self.len(), settings.count);
            settings.count = self.len();
        }

        let deck = self.clone();
        let on_next = effect_fn(move |transition| {
            let deck = deck.clone();
            async move {
                deck.fly_off(&transition).await;
                Ok(())
            }
        });

        let deck = self.clone();
        let on_loop = effect_fn(move |_| {
            let deck = deck.clone();
            async move {
                deck.restack().await;
                Ok(())
            }
        });

        SlideOptions::from_settings(settings)
            .on_next(on_next)
            .on_loop(on_loop)
            .on_progress(progress_fn(progress_bar()))
    }

    /// Fly the previous card off unless it is already gone
    async fn fly_off(&self, transition: &Transition) {
        let already_gone = !self.gone.lock().insert(transition.previous);
        if already_gone {
            return;
        }
        tracing::debug!("Card {} flies off", transition.previous);
        if tokio::time::timeout(FLY_OFF_LIMIT, tokio::time::sleep(self.fly_off))
            .await
            .is_err()
        {
            tracing::trace!("Fly-off still running, continuing");
        }
    }

    /// Bring every card back; waits a moment if the last one just left
    async fn restack(&self) {
        if self.all_gone() {
            tokio::time::sleep(RESTACK_DELAY).await;
        }
        self.gone.lock().clear();
        tracing::info!("Deck restacked");
    }
}

impl SlideSubscriber for Deck {
    fn on_slide_change(&self, context: &SlideContext) {
        match context.current.and_then(|index| self.card(index)) {
            Some(card) => tracing::info!("Now showing card {}: \"{}\" ({})", card.id, card.title, card.content),
            None => tracing::info!("Nothing to show"),
        }
    }
}

/// Progress reporter drawing a ten-step bar whenever it changes
fn progress_bar() -> impl Fn(f64) + Send + Sync + 'static {
    let last = Mutex::new(None);
    move |progress: f64| {
        let steps = (progress.clamp(0.0, 1.0) * 10.0).floor() as usize;
        let mut last = last.lock();
        if *last == Some(steps) {
            return;
        }
        *last = Some(steps);
        tracing::debug!("[{}{}] {:>3.0}%", "#".repeat(steps), "-".repeat(10 - steps), progress * 100.0);
    }
}
