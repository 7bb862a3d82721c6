//! Wall-clock driver.

use crate::{Session, UiEvent};
use folio_page::Page;
use folio_storage::Storage;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Drive `session` from `events` until an unload event arrives or every
/// sender is dropped, firing timers as their deadlines pass. Returns the
/// session after shutdown.
pub async fn run<S: Storage, P: Page>(
    mut session: Session<S, P>,
    mut events: mpsc::Receiver<UiEvent>,
) -> Session<S, P> {
    while !session.is_closed() {
        let clock = session.context().clock.clone();
        let wait = session
            .next_deadline()
            .map(|deadline| (deadline - clock.now()).to_std().unwrap_or(Duration::ZERO));

        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    if let Err(e) = session.handle(event).await {
                        warn!(error = %e, "event rejected");
                        break;
                    }
                }
                None => {
                    debug!("event channel closed");
                    session.shutdown().await;
                }
            },
            _ = sleep_for(wait) => {
                let applied = session.advance_to(clock.now()).await;
                if !applied.is_empty() {
                    debug!(count = applied.len(), "evolutions applied");
                }
            }
        }
    }
    session
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}
