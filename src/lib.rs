//! Simple to use cli for tracking how much you work compared to a daily target.
//! Work and breaks are timed as they happen, and once a day is over the difference to the target
//! of that weekday is added to a running balance.
//!

pub mod cli;
pub mod fs;
pub mod tracking;
pub mod utils;
