pub mod credentials;
pub mod diff;
pub mod history;
pub mod reconcile;

pub use history::{write_json_lines, CommitWalk, HistoryWalker, WalkOptions};
pub use reconcile::reconcile;
