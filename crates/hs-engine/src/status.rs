//! Per-command, per-phase diagnostic log with severity aggregation.

use crate::phase::{Phase, Severity};
use serde::Serialize;

/// One diagnostic record. Warning and failure entries carry a
/// recommended-action string as part of the contract.
#[derive(Clone, Debug, Serialize)]
pub struct StatusEntry {
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
    pub action: String,
}

/// Ordered diagnostic log for one command, tracking a severity per phase.
#[derive(Debug, Default)]
pub struct StatusLog {
    entries: Vec<StatusEntry>,
    severity: [Severity; Phase::COUNT],
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and raise the phase severity if needed.
    pub fn add(
        &mut self,
        phase: Phase,
        severity: Severity,
        message: impl Into<String>,
        action: impl Into<String>,
    ) {
        self.entries.push(StatusEntry {
            phase,
            severity,
            message: message.into(),
            action: action.into(),
        });
        let slot = &mut self.severity[phase.index()];
        *slot = (*slot).max(severity);
    }

    pub fn warning(&mut self, phase: Phase, message: impl Into<String>, action: impl Into<String>) {
        self.add(phase, Severity::Warning, message, action);
    }

    pub fn failure(&mut self, phase: Phase, message: impl Into<String>, action: impl Into<String>) {
        self.add(phase, Severity::Failure, message, action);
    }

    /// Drop all entries for a phase and reset its severity to Unknown.
    ///
    /// Invoked once at the start of each phase's execution so re-running a
    /// command does not accumulate stale diagnostics.
    pub fn clear(&mut self, phase: Phase) {
        self.entries.retain(|e| e.phase != phase);
        self.severity[phase.index()] = Severity::Unknown;
    }

    pub fn phase_severity(&self, phase: Phase) -> Severity {
        self.severity[phase.index()]
    }

    /// Assert the phase severity from its entries, marking Success when no
    /// entries were ever added. Called exactly once at the end of a
    /// successful execute; absence of entries is not implicitly success.
    pub fn refresh_phase_severity(&mut self, phase: Phase) {
        let max = self
            .entries
            .iter()
            .filter(|e| e.phase == phase)
            .map(|e| e.severity)
            .max()
            .unwrap_or(Severity::Success);
        self.severity[phase.index()] = max.max(Severity::Success);
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    pub fn entries_for(&self, phase: Phase) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(move |e| e.phase == phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_phase_is_unknown_until_refreshed() {
        let mut log = StatusLog::new();
        assert_eq!(log.phase_severity(Phase::Run), Severity::Unknown);
        log.refresh_phase_severity(Phase::Run);
        assert_eq!(log.phase_severity(Phase::Run), Severity::Success);
    }

    #[test]
    fn severity_is_max_of_entries() {
        let mut log = StatusLog::new();
        log.warning(Phase::Run, "slow", "check inputs");
        assert_eq!(log.phase_severity(Phase::Run), Severity::Warning);
        log.failure(Phase::Run, "broken", "fix the parameter");
        assert_eq!(log.phase_severity(Phase::Run), Severity::Failure);
        // A later lower-severity entry does not lower the phase severity.
        log.warning(Phase::Run, "still slow", "check inputs");
        assert_eq!(log.phase_severity(Phase::Run), Severity::Failure);
    }

    #[test]
    fn clear_is_per_phase() {
        let mut log = StatusLog::new();
        log.failure(Phase::Initialization, "bad param", "set it");
        log.warning(Phase::Run, "partial", "review");
        log.clear(Phase::Run);
        assert_eq!(log.phase_severity(Phase::Run), Severity::Unknown);
        assert_eq!(log.phase_severity(Phase::Initialization), Severity::Failure);
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn refresh_after_entries_keeps_max() {
        let mut log = StatusLog::new();
        log.warning(Phase::Discovery, "w", "a");
        log.refresh_phase_severity(Phase::Discovery);
        assert_eq!(log.phase_severity(Phase::Discovery), Severity::Warning);
    }
}
