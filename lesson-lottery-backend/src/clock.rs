use std::sync::Mutex;

use chrono::{
    DateTime, Datelike as _, Duration, LocalResult, NaiveDateTime, TimeDelta, TimeZone as _, Utc,
};
use chrono_tz::Tz;
use lesson_lottery_config::{ClockTime, Config, Day};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// The instant of the given weekday and local time in the week of `now`,
/// rolled forward a week if that day already lies behind `now` (or is today and
/// `allow_today` is false). Only the date is compared, so a time earlier today
/// still yields today.
#[must_use]
pub fn next_occurrence(
    day: Day,
    time: ClockTime,
    now: DateTime<Utc>,
    timezone: Tz,
    allow_today: bool,
) -> DateTime<Utc> {
    let local_now = now.with_timezone(&timezone);
    let mut days_ahead = i64::from(day.0.num_days_from_monday())
        - i64::from(local_now.weekday().num_days_from_monday());
    if (!allow_today && days_ahead == 0) || days_ahead < 0 {
        days_ahead += 7;
    }
    let date = local_now.date_naive() + Duration::days(days_ahead);
    localize(timezone, date.and_time(time.0)).with_timezone(&Utc)
}

/// Nonexistent local times (DST gap) move forward by an hour, ambiguous ones
/// take the earlier instant.
fn localize(timezone: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match timezone.from_local_datetime(&local) {
        LocalResult::Single(instant) | LocalResult::Ambiguous(instant, _) => instant,
        LocalResult::None => localize(timezone, local + Duration::hours(1)),
    }
}

/// Answers the two time questions of the lottery for one instant.
#[derive(Clone, Copy, Debug)]
pub struct Windows<'a> {
    config: &'a Config,
    now: DateTime<Utc>,
}

impl<'a> Windows<'a> {
    #[must_use]
    pub const fn new(config: &'a Config, now: DateTime<Utc>) -> Self {
        Self { config, now }
    }

    #[must_use]
    pub fn signup_start(&self) -> DateTime<Utc> {
        let signup = &self.config.signup;
        next_occurrence(signup.weekday, signup.start, self.now, self.config.lesson.timezone, true)
    }

    #[must_use]
    pub fn signup_end(&self) -> DateTime<Utc> {
        let signup = &self.config.signup;
        next_occurrence(signup.weekday, signup.end, self.now, self.config.lesson.timezone, true)
    }

    /// Both bounds are inclusive. An end before the start is an empty window.
    #[must_use]
    pub fn in_signup_window(&self) -> bool {
        self.signup_start() <= self.now && self.now <= self.signup_end()
    }

    #[must_use]
    pub fn lesson_start(&self) -> DateTime<Utc> {
        let lesson = &self.config.lesson;
        next_occurrence(lesson.weekday, lesson.time, self.now, lesson.timezone, true)
    }

    /// `None` when the offset falls outside the representable range.
    #[must_use]
    pub fn cancel_deadline(&self) -> Option<DateTime<Utc>> {
        TimeDelta::try_hours(self.config.lesson.cancel_deadline_hours)
            .and_then(|before| self.lesson_start().checked_sub_signed(before))
    }

    /// An unrepresentable deadline lies infinitely far before the lesson for
    /// positive hours and after it for negative ones.
    #[must_use]
    pub fn over_cancel_deadline(&self) -> bool {
        self.cancel_deadline().map_or(self.config.lesson.cancel_deadline_hours > 0, |deadline| {
            self.now > deadline
        })
    }
}
