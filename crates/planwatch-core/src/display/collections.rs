//! Collection wrapper types for displaying groups of domain objects.

use std::fmt;

use crate::models::{PlanStep, PlanTransaction};

/// Newtype wrapper for displaying wallet history.
///
/// # Examples
///
/// ```rust
/// use planwatch_core::display::PlanTransactions;
///
/// let empty = PlanTransactions(Vec::new());
/// assert_eq!(empty.to_string(), "No plan transactions found.\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlanTransactions(pub Vec<PlanTransaction>);

impl PlanTransactions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanTransaction> {
        self.0.iter()
    }
}

impl IntoIterator for PlanTransactions {
    type Item = PlanTransaction;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PlanTransactions {
    type Item = &'a PlanTransaction;
    type IntoIter = std::slice::Iter<'a, PlanTransaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PlanTransactions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No plan transactions found.");
        }
        for record in &self.0 {
            write!(f, "{record}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying the steps of a plan.
#[derive(Debug, Clone, Default)]
pub struct Steps(pub Vec<PlanStep>);

impl Steps {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Steps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No steps found.");
        }
        for step in &self.0 {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
