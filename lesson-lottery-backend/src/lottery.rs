use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use lesson_lottery_config::{Config, ConfigUpdate};
use lesson_lottery_selection::{select, Algorithm};
use lesson_lottery_store::models::{Candidate, Selection, SignupSet, VisitHistory};
use lesson_lottery_store::schema::Record;
use lesson_lottery_store::{Store, StoreExt as _};
use rand::rngs::StdRng;
use rand::SeedableRng as _;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cancel::{self, CancelOutcome};
use crate::clock::{Clock, SystemClock, Windows};
use crate::error::LotteryError;
use crate::phase::{self, Phase, Resolved};
use crate::{rerun, signup};

struct Locked<S> {
    store: S,
    rng: StdRng,
    bootstrap: Config,
}

/// The lottery service. Every operation runs as one [`Transaction`] while
/// holding the single lock, so check-then-act sequences like the freeze never
/// interleave.
pub struct Lottery<S, C = SystemClock> {
    locked: Mutex<Locked<S>>,
    clock: C,
}

/// Exclusive access to the store for the duration of one operation.
///
/// The config snapshot and "now" are taken once when the transaction starts.
pub struct Transaction<'a, S> {
    store: &'a mut S,
    rng: &'a mut StdRng,
    config: Config,
    now: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewResult {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen: Option<Vec<Candidate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting: Option<Vec<Candidate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered: Option<Candidate>,
}

impl From<Resolved> for ViewResult {
    fn from(resolved: Resolved) -> Self {
        let (chosen, waiting) = resolved
            .selection
            .map(|selection| (selection.chosen, selection.waiting))
            .unzip();
        Self {
            phase: resolved.phase,
            chosen,
            waiting,
            registered: None,
        }
    }
}

impl<S: Store> Lottery<S> {
    pub fn new(store: S, bootstrap: Config) -> Self {
        Self::with_clock(store, bootstrap, SystemClock, StdRng::from_entropy())
    }
}

impl<S: Store, C: Clock> Lottery<S, C> {
    pub fn with_clock(store: S, bootstrap: Config, clock: C, rng: StdRng) -> Self {
        Self {
            locked: Mutex::new(Locked {
                store,
                rng,
                bootstrap,
            }),
            clock,
        }
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    pub fn transaction<T>(
        &self,
        operation: impl FnOnce(&mut Transaction<'_, S>) -> Result<T, LotteryError>,
    ) -> Result<T, LotteryError> {
        // every write is a whole-record atomic replace, so the store is
        // consistent even if a previous holder panicked
        let mut locked = self.locked.lock().unwrap_or_else(PoisonError::into_inner);
        let Locked {
            store,
            rng,
            bootstrap,
        } = &mut *locked;
        let config = match store.load_optional::<Config>(Record::Config)? {
            Some(config) => match config.validate() {
                Ok(()) => config,
                Err(err) => {
                    warn!("ignoring stored config: {err}");
                    bootstrap.clone()
                }
            },
            None => bootstrap.clone(),
        };
        let mut transaction = Transaction {
            store,
            rng,
            config,
            now: self.clock.now(),
        };
        operation(&mut transaction)
    }

    /// Registers `candidate` if the signup window is open, otherwise just
    /// reports where the lottery stands.
    pub fn view_or_register(&self, candidate: Option<Candidate>) -> Result<ViewResult, LotteryError> {
        self.transaction(|transaction| {
            let resolved = phase::resolve(transaction)?;
            let registered = match candidate {
                Some(candidate) if resolved.phase == Phase::SignupOpen => {
                    Some(signup::register(transaction, candidate)?)
                }
                Some(candidate) => {
                    debug!(
                        "ignoring signup of {} while {}",
                        candidate.email, resolved.phase
                    );
                    None
                }
                None => None,
            };
            Ok(ViewResult {
                registered,
                ..resolved.into()
            })
        })
    }

    pub fn cancel(&self, email: &str) -> Result<CancelOutcome, LotteryError> {
        self.transaction(|transaction| cancel::cancel(transaction, email))
    }

    pub fn admin_rerun(&self) -> Result<Selection, LotteryError> {
        self.transaction(rerun::rerun)
    }

    pub fn admin_config(&self) -> Result<Config, LotteryError> {
        self.transaction(|transaction| Ok(transaction.config().clone()))
    }

    /// Replaces the whole config snapshot.
    pub fn admin_update_config(&self, config: Config) -> Result<(), LotteryError> {
        self.transaction(|transaction| transaction.save_config(config))
    }

    /// Coerces the admin form against the current snapshot and stores the
    /// result, all under one lock. Nothing is written if a field is invalid.
    pub fn admin_apply_update(&self, update: ConfigUpdate) -> Result<Config, LotteryError> {
        self.transaction(|transaction| {
            let config = update.into_config(transaction.config().lesson.timezone)?;
            transaction.save_config(config.clone())?;
            Ok(config)
        })
    }
}

impl<S: Store> Transaction<'_, S> {
    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub const fn windows(&self) -> Windows<'_> {
        Windows::new(&self.config, self.now)
    }

    pub fn algorithm(&self) -> Algorithm {
        let algorithm = &self.config.algorithm;
        Algorithm::from_config(&algorithm.name, algorithm.weight_exponent)
    }

    pub fn signups(&self) -> Result<SignupSet, LotteryError> {
        Ok(self.store.load(Record::Signups)?)
    }

    pub fn save_signups(&mut self, signups: &SignupSet) -> Result<(), LotteryError> {
        Ok(self.store.save(Record::Signups, signups)?)
    }

    /// `None` if there is no selection record or it is unreadable.
    pub fn selection(&self) -> Result<Option<Selection>, LotteryError> {
        Ok(self.store.load_optional(Record::Selection)?)
    }

    pub fn has_selection_record(&self) -> Result<bool, LotteryError> {
        Ok(self.store.read(Record::Selection)?.is_some())
    }

    pub fn save_selection(&mut self, selection: &Selection) -> Result<(), LotteryError> {
        Ok(self.store.save(Record::Selection, selection)?)
    }

    pub fn delete_selection(&mut self) -> Result<(), LotteryError> {
        Ok(self.store.remove(Record::Selection)?)
    }

    pub fn history(&self) -> Result<VisitHistory, LotteryError> {
        Ok(self.store.load(Record::History)?)
    }

    pub fn save_history(&mut self, history: &VisitHistory) -> Result<(), LotteryError> {
        Ok(self.store.save(Record::History, history)?)
    }

    /// Refuses snapshots that would break the clock arithmetic.
    pub fn save_config(&mut self, config: Config) -> Result<(), LotteryError> {
        config.validate()?;
        self.store.save(Record::Config, &config)?;
        info!(
            "config updated: {} seats, algorithm {}",
            config.lesson.capacity, config.algorithm.name
        );
        self.config = config;
        Ok(())
    }

    /// Runs the configured algorithm against the current visit history.
    pub fn draw(&mut self, candidates: &[Candidate], capacity: i64) -> Result<Vec<usize>, LotteryError> {
        let history = self.history()?;
        let algorithm = self.algorithm();
        Ok(select(candidates, capacity, algorithm, &history, &mut *self.rng))
    }

    pub fn store(&self) -> &S {
        &*self.store
    }
}
