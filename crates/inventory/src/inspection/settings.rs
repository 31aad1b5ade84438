/// Names and sequence codes the inspection workflow relies on.
///
/// Defaults match the host's stock configuration; the infra layer can
/// override them from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionSettings {
    /// Holding location samples are moved into when inspection starts.
    pub quality_check_location: String,
    /// Location inspected samples are retained in afterwards.
    pub retention_location: String,
    pub report_sequence_code: String,
    pub line_sequence_code: String,
}

impl Default for InspectionSettings {
    fn default() -> Self {
        Self {
            quality_check_location: "Quality Check".to_string(),
            retention_location: "Retain Sample".to_string(),
            report_sequence_code: "inspection.report".to_string(),
            line_sequence_code: "inspection.report.line".to_string(),
        }
    }
}
