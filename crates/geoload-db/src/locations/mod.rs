//! Database operations for the `locations` table.

mod read;
mod types;
mod write;

pub use read::{count_locations_for_user, list_locations_for_user};
pub use types::LocationRow;
pub use write::insert_location_batch;
