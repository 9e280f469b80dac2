//! HTTP request handlers organized by functionality

pub mod admin;
pub mod draws;
pub mod timer;
pub mod users;
pub mod wallet;

// Re-export handler functions
pub use admin::{add_draw, admin_draws, require_admin};
pub use draws::{DrawFeed, DrawQuery, central_draw, recent_draws, record_draw};
pub use timer::{TimersResponse, get_timers, post_timer};
pub use users::{append_history, create_user, list_history, user_account};
pub use wallet::{AmountInput, deposit, wallet_summary, withdraw};
