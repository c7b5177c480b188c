//! Relay discovery and selection.

mod known;
pub use known::KnownRelaysManager;

mod score;
pub use score::{AcceptAll, DefaultScoreCalculator, RelayFilter, ScoreCalculator};

mod selection;
pub use selection::{PingFilter, RelaySelectionManager};
