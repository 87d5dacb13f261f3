use serde::{Deserialize, Serialize};

use clinibill_core::PatientId;

/// Patient reference record, used only for labeling statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: PatientId,
    pub first_name: String,
    pub last_name: String,
}

impl Patient {
    /// `"first last"` as rendered on statements.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
