use thiserror::Error;

use batchline_core::DomainError;
use batchline_inventory::{InspectionReportId, ReceiptId};

use super::ports::LedgerError;

/// Everything an inspection operation can fail with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InspectionError {
    /// Receipt is unknown, not done yet, or received nothing.
    #[error("invalid receipt {receipt_id}: {reason}")]
    InvalidReceipt {
        receipt_id: ReceiptId,
        reason: String,
    },

    #[error("inspection report {0} has no resolvable source receipt")]
    NoSourceReceipt(InspectionReportId),

    #[error("missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("quality check location '{0}' does not exist")]
    MissingQcLocation(String),

    #[error("inspection report {0} not found")]
    ReportNotFound(InspectionReportId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl InspectionError {
    pub(crate) fn invalid_receipt(receipt_id: ReceiptId, reason: impl Into<String>) -> Self {
        Self::InvalidReceipt {
            receipt_id,
            reason: reason.into(),
        }
    }
}

pub type InspectionResult<T> = Result<T, InspectionError>;
