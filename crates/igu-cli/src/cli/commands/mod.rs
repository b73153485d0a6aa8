//! CLI command handlers. Each command is in its own file.

mod auction_done;
mod merge;
mod status;
mod update;

pub use auction_done::run_auction_done;
pub use merge::run_merge;
pub use status::run_status;
pub use update::run_update;
