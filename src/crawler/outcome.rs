//! Result of a unit of work that is allowed to come back empty

/// Either a payload or an explicit "nothing here"
///
/// `Absent` is how a suppressed failure reaches the caller: the unit
/// completed, produced no data, and downstream processing for it should be
/// skipped. It carries no error; the cause has already been logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    /// The unit produced a value
    Found(T),

    /// The unit yielded nothing
    Absent,
}

impl<T> FetchOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Borrows the payload, if any
    pub fn found(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Absent => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            Self::Found(value) => FetchOutcome::Found(f(value)),
            Self::Absent => FetchOutcome::Absent,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Returns the payload, or `T::default()` for an absent unit
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.into_option().unwrap_or_default()
    }
}

impl<T> From<Option<T>> for FetchOutcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Found(value),
            None => Self::Absent,
        }
    }
}
