mod aggregate;
mod cache;
mod productivity;
mod streak;
mod tracker;
mod types;

pub use aggregate::aggregate;
pub use cache::{AnalyticsCache, CacheOptions, CacheStatus};
pub use productivity::{calculate_productivity, RECENT_WINDOW};
pub use streak::{calculate_streaks, parse_session_date};
pub use tracker::{SubmitReceipt, Tracker, ANALYTICS_UNAVAILABLE};
pub use types::*;
