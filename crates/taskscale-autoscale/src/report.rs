//! Cycle outcome reporting.
//!
//! A cycle never fails as a whole from the caller's point of view: it
//! returns a `CycleReport` listing every error in the order encountered.
//! An empty list is success.

use std::fmt::Write;

use serde::Serialize;

use crate::error::ScaleError;

/// An error tagged with its position in the cycle's error list.
#[derive(Debug)]
pub struct CycleError {
    pub index: usize,
    pub error: ScaleError,
}

/// A replica change that was successfully applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicaChange {
    pub function: String,
    pub from: u64,
    pub to: u64,
}

/// Outcome of one scaling cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    errors: Vec<CycleError>,
    changes: Vec<ReplicaChange>,
}

impl CycleReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error; its index is its position in the list.
    pub fn push_error(&mut self, error: ScaleError) {
        let index = self.errors.len();
        self.errors.push(CycleError { index, error });
    }

    pub fn push_change(&mut self, change: ReplicaChange) {
        self.changes.push(change);
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[CycleError] {
        &self.errors
    }

    pub fn changes(&self) -> &[ReplicaChange] {
        &self.changes
    }

    pub fn into_errors(self) -> Vec<CycleError> {
        self.errors
    }

    /// Text body listing every error, one per line:
    /// `[AutoScale] [<index>] <message>`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for e in &self.errors {
            // Writing to a String cannot fail.
            let _ = writeln!(out, "[AutoScale] [{}] {}", e.index, e.error);
        }
        out
    }
}
