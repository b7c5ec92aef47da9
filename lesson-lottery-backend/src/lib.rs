//! A weekly lesson with a fixed number of seats, handed out by lottery.
//!
//! People sign up during a weekly window. When the window closes the
//! selection is frozen: some are chosen, the rest wait. Chosen participants
//! can cancel until a deadline before the lesson and the freed seat goes to
//! someone from the waiting list. Once the deadline passes every chosen
//! participant gets a visit recorded, which lowers their odds in the weighted
//! algorithms next time.

pub mod cancel;
pub mod clock;
pub mod error;
pub mod lottery;
pub mod phase;
pub mod rerun;
pub mod routes;
pub mod server;
pub mod signup;
pub mod telemetry;
#[cfg(test)]
mod test_utils;

pub use cancel::{CancelOutcome, Collection};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AppError, LotteryError};
pub use lottery::{Lottery, Transaction, ViewResult};
pub use phase::Phase;
