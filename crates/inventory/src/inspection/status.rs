use serde::{Deserialize, Serialize};

use batchline_core::{DomainError, DomainResult};

/// Report workflow status. Transitions only ever move one step forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    Pending,
    InProgress,
    Completed,
}

impl InspectionStatus {
    /// The single status reachable from `self`.
    pub fn next(self) -> Option<Self> {
        match self {
            InspectionStatus::Pending => Some(InspectionStatus::InProgress),
            InspectionStatus::InProgress => Some(InspectionStatus::Completed),
            InspectionStatus::Completed => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    pub fn ensure_transition_to(self, target: Self) -> DomainResult<()> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(format!(
                "inspection report cannot move from {self} to {target}"
            )))
        }
    }

    /// Lines accept edits until the report is completed.
    pub fn lines_editable(self) -> bool {
        self != InspectionStatus::Completed
    }
}

impl core::fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            InspectionStatus::Pending => "pending",
            InspectionStatus::InProgress => "in_progress",
            InspectionStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}
