use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Candidate {
    /// Normalizes the email so it can be used as the candidate's identity.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl AsRef<str>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: normalize_email(email.as_ref()),
        }
    }

    #[must_use]
    pub fn identity(&self) -> String {
        normalize_email(&self.email)
    }

    #[must_use]
    pub fn has_email(&self, email: &str) -> bool {
        normalize_email(&self.email) == normalize_email(email)
    }
}

#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupSet {
    pub signups: Vec<Candidate>,
}

impl SignupSet {
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        self.signups.iter().any(|candidate| candidate.has_email(email))
    }

    /// Returns the removed candidate, if any.
    pub fn remove(&mut self, email: &str) -> Option<Candidate> {
        let position = self
            .signups
            .iter()
            .position(|candidate| candidate.has_email(email))?;
        Some(self.signups.remove(position))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub chosen: Vec<Candidate>,
    pub waiting: Vec<Candidate>,
    pub history_saved: bool,
}

impl Selection {
    #[must_use]
    pub const fn new(chosen: Vec<Candidate>, waiting: Vec<Candidate>) -> Self {
        Self {
            chosen,
            waiting,
            history_saved: false,
        }
    }

    /// A selection that holds nobody at all is treated like no selection.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        !self.chosen.is_empty() || !self.waiting.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitHistory {
    pub visits: BTreeMap<String, u64>,
}

impl VisitHistory {
    #[must_use]
    pub fn visits(&self, email: &str) -> u64 {
        self.visits
            .get(&normalize_email(email))
            .copied()
            .unwrap_or_default()
    }

    pub fn record_visit(&mut self, email: &str) {
        let count = self.visits.entry(normalize_email(email)).or_default();
        *count = count.saturating_add(1);
    }
}
