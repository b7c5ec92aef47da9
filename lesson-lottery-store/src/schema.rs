/// The logical records the lottery keeps. Each one is a single document that
/// is always read and overwritten as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Record {
    Config,
    Signups,
    Selection,
    History,
}

impl Record {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Signups => "signups",
            Self::Selection => "selection",
            Self::History => "history",
        }
    }

    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.json", self.name())
    }
}
