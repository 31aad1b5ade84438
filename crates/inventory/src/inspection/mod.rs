//! Quality inspection of received goods.
//!
//! An [`InspectionReport`] is opened against a finalized receipt, gets one
//! [`InspectionLine`] per received product, and walks
//! `Pending → InProgress → Completed`. The physical side (moving samples to the
//! quality-check area and then to retention) is orchestrated outside this
//! crate; the report only records the resulting transfer and movement ids.

mod line;
mod report;
mod settings;
mod status;

pub use line::{CheckItem, CheckResult, Conclusion, InspectionLine, LineDetails};
pub use report::{
    CheckRecorded, CompleteInspection, ConclusionRecorded, CreateReport, InspectionCommand,
    InspectionCompleted, InspectionEvent, InspectionReport, InspectionReportId, InspectionStarted,
    LineDetailsUpdated, LineRemoved, NewInspectionLine, RecordCheck, RecordConclusion, RemoveLine,
    ReportCreated, SampleMovement, SampleQuantitySet, SetSampleQuantity, StartInspection,
    UpdateLineDetails,
};
pub use settings::InspectionSettings;
pub use status::InspectionStatus;
