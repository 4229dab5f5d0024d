pub mod accounts;
pub mod aggregation;
pub mod content;
pub mod toggle;

pub use accounts::AccountService;
pub use aggregation::Aggregator;
pub use content::ContentService;
pub use toggle::{ToggleEngine, ToggleOutcome};
