//! Unauthenticated, like the rest of the lottery.

mod rerun;
mod show;
mod update;

pub use rerun::rerun;
pub use show::show;
pub use update::update;
