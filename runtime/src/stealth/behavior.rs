//! Human-paced pauses between portal interactions.

use rand::Rng;
use std::time::Duration;

/// A uniformly random delay in `[min_ms, max_ms]`.
pub fn random_delay(min_ms: u64, max_ms: u64) -> Duration {
    let (lo, hi) = if min_ms <= max_ms { (min_ms, max_ms) } else { (max_ms, min_ms) };
    Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
}

/// Pause between two UI actions (150-400ms).
pub fn action_delay() -> Duration {
    random_delay(150, 400)
}

/// Pause after a click that opens a menu or swaps a tab (400-900ms).
pub fn settle_delay() -> Duration {
    random_delay(400, 900)
}

/// Pace UI actions, or do nothing when pacing is off.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub enabled: bool,
}

impl Pacing {
    pub const OFF: Pacing = Pacing { enabled: false };
    pub const HUMAN: Pacing = Pacing { enabled: true };

    pub async fn between_actions(self) {
        if self.enabled {
            tokio::time::sleep(action_delay()).await;
        }
    }

    pub async fn settle(self) {
        if self.enabled {
            tokio::time::sleep(settle_delay()).await;
        }
    }
}
