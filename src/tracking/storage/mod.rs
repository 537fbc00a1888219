//!  Storage is organized through [state_storage::StateFileStorage].
//!  The basic idea is:
//!   - The whole application state lives in a single json file.
//!   - Every save overwrites the file as a whole.
//!   - Loading is forgiving, anything unreadable turns into the default state.

pub mod entities;
pub mod state_storage;
