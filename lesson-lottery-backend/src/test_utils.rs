//! A lottery on a manual clock and an in-memory store.
//!
//! The config uses UTC: signups on monday 10:00-18:00, the lesson on thursday
//! at 18:00 with a 24 hour cancellation deadline and two seats.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use lesson_lottery_config::{AlgorithmConfig, ClockTime, Config, Day, LessonConfig, SignupConfig};
use lesson_lottery_store::models::{Candidate, SignupSet};
use lesson_lottery_store::MemoryStore;
use rand::rngs::StdRng;
use rand::SeedableRng as _;

use crate::clock::ManualClock;
use crate::lottery::Lottery;

/// Monday, inside the signup window.
pub const SIGNUP_OPEN: &str = "2026-10-05T12:00:00Z";
/// Tuesday, before the cancellation deadline on wednesday 18:00.
pub const WINDOW_CLOSED: &str = "2026-10-06T12:00:00Z";
pub const PAST_DEADLINE: &str = "2026-10-07T20:00:00Z";

pub fn at(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
}

fn time(hour: u32) -> ClockTime {
    ClockTime(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
}

pub fn config() -> Config {
    Config {
        signup: SignupConfig {
            weekday: Day(Weekday::Mon),
            start: time(10),
            end: time(18),
        },
        lesson: LessonConfig {
            weekday: Day(Weekday::Thu),
            time: time(18),
            capacity: 2,
            cancel_deadline_hours: 24,
            timezone: chrono_tz::UTC,
        },
        email: vec!["example.org".to_owned()],
        algorithm: AlgorithmConfig {
            name: "fcfs".to_owned(),
            weight_exponent: None,
        },
    }
}

pub fn lottery_with_store(store: MemoryStore, now: &str) -> Lottery<MemoryStore, ManualClock> {
    Lottery::with_clock(store, config(), ManualClock::new(at(now)), StdRng::seed_from_u64(7))
}

pub fn lottery(now: &str) -> Lottery<MemoryStore, ManualClock> {
    lottery_with_store(MemoryStore::default(), now)
}

/// `name@example.org`
pub fn person(name: &str) -> Candidate {
    Candidate::new(name, "Novak", format!("{name}@example.org"))
}

/// Writes the signup list directly, whatever the current phase.
pub fn seed_signups(lottery: &Lottery<MemoryStore, ManualClock>, names: &[&str]) {
    let signups = SignupSet {
        signups: names.iter().copied().map(person).collect(),
    };
    lottery
        .transaction(|transaction| transaction.save_signups(&signups))
        .unwrap();
}
