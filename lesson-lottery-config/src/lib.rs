use core::fmt::{Debug, Display};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};

use chrono::{NaiveTime, Timelike as _, Weekday};
use chrono_tz::Tz;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "lesson-lottery.toml";
pub const ENV_PREFIX: &str = "LESSON_LOTTERY_";
/// The zone lessons were scheduled in before the zone became configurable.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Ljubljana;
/// How far the cancellation deadline may sit from the lesson, either way.
pub const MAX_CANCEL_DEADLINE_HOURS: i64 = 24 * 365;

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
    #[error("invalid value {value:?} for {field}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// A weekday written as its full english name, e.g. `thursday`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Day(pub Weekday);

impl Day {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.0 {
            Weekday::Mon => "monday",
            Weekday::Tue => "tuesday",
            Weekday::Wed => "wednesday",
            Weekday::Thu => "thursday",
            Weekday::Fri => "friday",
            Weekday::Sat => "saturday",
            Weekday::Sun => "sunday",
        }
    }
}

impl TryFrom<String> for Day {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let weekday = match value.trim().to_lowercase().as_str() {
            "monday" => Weekday::Mon,
            "tuesday" => Weekday::Tue,
            "wednesday" => Weekday::Wed,
            "thursday" => Weekday::Thu,
            "friday" => Weekday::Fri,
            "saturday" => Weekday::Sat,
            "sunday" => Weekday::Sun,
            _ => {
                return Err(ConfigError::InvalidField {
                    field: "weekday",
                    value,
                    reason: "expected a weekday name like monday",
                })
            }
        };
        Ok(Self(weekday))
    }
}

impl From<Day> for String {
    fn from(value: Day) -> Self {
        value.name().to_owned()
    }
}

/// A wall clock time written as `HH:MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(pub NaiveTime);

impl TryFrom<String> for ClockTime {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let parsed = value
            .trim()
            .split_once(':')
            .and_then(|(hour, minute)| Some((hour.parse().ok()?, minute.parse().ok()?)))
            .and_then(|(hour, minute)| NaiveTime::from_hms_opt(hour, minute, 0));
        parsed.map(Self).ok_or(ConfigError::InvalidField {
            field: "time",
            value,
            reason: "expected HH:MM",
        })
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        format!("{:02}:{:02}", value.0.hour(), value.0.minute())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignupConfig {
    pub weekday: Day,
    pub start: ClockTime,
    pub end: ClockTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LessonConfig {
    pub weekday: Day,
    pub time: ClockTime,
    pub capacity: i64,
    pub cancel_deadline_hours: i64,
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

const fn default_timezone() -> Tz {
    DEFAULT_TIMEZONE
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    pub name: String,
    #[serde(default)]
    pub weight_exponent: Option<f64>,
}

/// Everything the lottery needs to know about one recurring lesson.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub signup: SignupConfig,
    pub lesson: LessonConfig,
    /// Allowed email domains, without the `@`.
    pub email: Vec<String>,
    pub algorithm: AlgorithmConfig,
}

impl Config {
    /// Expects an already lowercased address.
    #[must_use]
    pub fn allows_email(&self, email: &str) -> bool {
        self.email
            .iter()
            .map(|domain| domain.trim().to_lowercase())
            .any(|domain| !domain.is_empty() && email.ends_with(&format!("@{domain}")))
    }

    /// Checks the values serde cannot express as types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let hours = self.lesson.cancel_deadline_hours;
        if hours.unsigned_abs() > MAX_CANCEL_DEADLINE_HOURS.unsigned_abs() {
            return Err(ConfigError::InvalidField {
                field: "cancel_deadline_hours",
                value: hours.to_string(),
                reason: "must be within a year of the lesson",
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            data_dir: default_data_dir(),
        }
    }
}

const fn default_listen() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 8000))
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub lottery: Config,
}

pub fn get_settings(path: &Path) -> Result<Settings, ConfigError> {
    let settings: Settings = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    settings.lottery.validate()?;
    Ok(settings)
}

/// The admin form as submitted, before any coercion.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConfigUpdate {
    pub signup_weekday: String,
    pub signup_start: String,
    pub signup_end: String,
    pub lesson_weekday: String,
    pub lesson_time: String,
    pub lesson_capacity: String,
    pub cancel_deadline_hours: String,
    /// One domain per line.
    pub email_domains: String,
    pub algorithm_name: String,
    #[serde(default)]
    pub weight_exponent: String,
}

impl ConfigUpdate {
    /// Builds a complete snapshot. The lesson timezone is not part of the form
    /// and is carried over by the caller.
    pub fn into_config(self, timezone: Tz) -> Result<Config, ConfigError> {
        let weight_exponent = match self.weight_exponent.trim() {
            "" => None,
            value => Some(value.parse::<f64>().map_err(|_| ConfigError::InvalidField {
                field: "weight_exponent",
                value: self.weight_exponent.clone(),
                reason: "expected a number",
            })?),
        };
        let config = Config {
            signup: SignupConfig {
                weekday: Day::try_from(self.signup_weekday)?,
                start: ClockTime::try_from(self.signup_start)?,
                end: ClockTime::try_from(self.signup_end)?,
            },
            lesson: LessonConfig {
                weekday: Day::try_from(self.lesson_weekday)?,
                time: ClockTime::try_from(self.lesson_time)?,
                capacity: parse_integer("lesson_capacity", &self.lesson_capacity)?,
                cancel_deadline_hours: parse_integer(
                    "cancel_deadline_hours",
                    &self.cancel_deadline_hours,
                )?,
                timezone,
            },
            email: self
                .email_domains
                .lines()
                .map(str::trim)
                .filter(|domain| !domain.is_empty())
                .map(str::to_owned)
                .collect(),
            algorithm: AlgorithmConfig {
                name: self.algorithm_name.trim().to_owned(),
                weight_exponent,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_integer(field: &'static str, value: &str) -> Result<i64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidField {
        field,
        value: value.to_owned(),
        reason: "expected a whole number",
    })
}
