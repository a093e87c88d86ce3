//! A terminal kanban board whose cards carry received/start/due/end dates
//! shown as urgency badges, with fractional sort keys for every ordered
//! collection.

pub mod card;
pub mod config;
pub mod date_status;
pub mod errors;
pub mod kanban_board;
pub mod logging;
pub mod sort_index;
pub mod ui;
