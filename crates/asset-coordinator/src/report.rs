use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use crate::{
    error::{LoadError, LoadErrorKind},
    kind::AssetKind,
};

/// Result of one load of a batch.
#[derive(Debug)]
pub struct LoadOutcome {
    pub name: String,
    pub kind: AssetKind,
    pub source: String,
    pub result: Result<(), LoadError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedEntry {
    pub name: String,
    pub kind: AssetKind,
    pub source: String,
}

#[derive(Debug)]
pub struct LoadFailure {
    pub name: String,
    pub kind: AssetKind,
    pub source: String,
    pub error: LoadError,
}

impl Display for LoadFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} from {}): {}",
            self.name, self.kind, self.source, self.error
        )
    }
}

/// What a call to `load` did, every issued load accounted for once.
#[derive(Debug, Default)]
pub struct BatchReport {
    loaded: Vec<LoadedEntry>,
    failures: Vec<LoadFailure>,
}

impl BatchReport {
    pub(crate) fn from_outcomes<I: IntoIterator<Item = LoadOutcome>>(outcomes: I) -> Self {
        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome.result {
                Ok(()) => report.loaded.push(LoadedEntry {
                    name: outcome.name,
                    kind: outcome.kind,
                    source: outcome.source,
                }),
                Err(error) => report.failures.push(LoadFailure {
                    name: outcome.name,
                    kind: outcome.kind,
                    source: outcome.source,
                    error,
                }),
            }
        }
        report
    }

    pub fn loaded(&self) -> &[LoadedEntry] {
        &self.loaded
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn failures_of(&self, kind: LoadErrorKind) -> impl Iterator<Item = &LoadFailure> {
        self.failures
            .iter()
            .filter(move |failure| failure.error.kind() == kind)
    }

    pub fn failure(&self, name: &str, kind: AssetKind) -> Option<&LoadFailure> {
        self.failures
            .iter()
            .find(|failure| failure.name == name && failure.kind == kind)
    }

    pub fn total(&self) -> usize {
        self.loaded.len() + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turns a report with failures into an error.
    pub fn into_result(self) -> Result<Vec<LoadedEntry>, BatchError> {
        if self.failures.is_empty() {
            Ok(self.loaded)
        } else {
            Err(BatchError {
                total: self.total(),
                failures: self.failures,
            })
        }
    }
}

#[derive(Debug)]
pub struct BatchError {
    total: usize,
    failures: Vec<LoadFailure>,
}

impl BatchError {
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }
}

impl Display for BatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} loads failed", self.failures.len(), self.total)?;
        if let Some(first) = self.failures.first() {
            write!(f, ", first: {}", first)?;
        }
        Ok(())
    }
}

impl Error for BatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.failures
            .first()
            .map(|failure| &failure.error as &(dyn Error + 'static))
    }
}
