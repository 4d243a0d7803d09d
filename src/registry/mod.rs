//! Suite registry
//!
//! An explicit, append-only list of suites built at startup and handed to
//! the runner by reference. The runner only ever borrows it immutably, so
//! the registry cannot change while a run is in progress.

use crate::models::{CaseInfo, Fixture, HarnessError, Suite, SuiteHandle};

/// Ordered collection of registered suites
#[derive(Default)]
pub struct Registry {
    suites: Vec<Box<dyn SuiteHandle>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a suite; suite names must be unique
    pub fn register<F: Fixture>(&mut self, suite: Suite<F>) -> Result<(), HarnessError> {
        if self.get(suite.name()).is_some() {
            return Err(HarnessError::DuplicateSuite(suite.name().to_string()));
        }
        tracing::debug!(
            suite = suite.name(),
            cases = suite.len(),
            "registered test suite"
        );
        self.suites.push(Box::new(suite));
        Ok(())
    }

    /// Builder form of [`Registry::register`]
    pub fn with_suite<F: Fixture>(mut self, suite: Suite<F>) -> Result<Self, HarnessError> {
        self.register(suite)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Suites in registration order
    pub fn suites(&self) -> impl Iterator<Item = &(dyn SuiteHandle + 'static)> {
        self.suites.iter().map(|s| s.as_ref())
    }

    pub fn get(&self, name: &str) -> Option<&dyn SuiteHandle> {
        self.suites().find(|s| s.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.suites().map(|s| s.name()).collect()
    }

    /// Case metadata for every suite, in registration order
    pub fn describe(&self) -> Vec<(&str, Vec<CaseInfo>)> {
        self.suites().map(|s| (s.name(), s.describe())).collect()
    }

    /// Total executable units across all suites
    pub fn unit_count(&self) -> usize {
        self.suites().map(|s| s.unit_count()).sum()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("suites", &self.names())
            .finish()
    }
}
