use serde::{Deserialize, Serialize};

use std::path::PathBuf;

use crate::error::ContextError;

/// The payload returned by the report service for a valid share token,
/// as served by `GET /informe/{token}`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VehicleReport {
    #[serde(rename = "vehiculo")]
    pub vehicle: VehicleInfo,
    /// The diagnostic trouble codes recorded against the vehicle.
    #[serde(rename = "errores", default)]
    pub errors: Vec<String>,
}

/// The vehicle record embedded in a report. The wire names are the Spanish
/// field names of the service, kept as serde renames so that the rest of the
/// crate works with one validated shape.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VehicleInfo {
    #[serde(rename = "marca")]
    pub make: String,
    #[serde(rename = "modelo")]
    pub model: String,
    pub year: i32,
    pub vin: String,
    #[serde(rename = "velocidad")]
    pub speed: i64,
    pub rpm: i64,
    /// The inspection record as stored by the service. Across revisions of the
    /// backend this has been a JSON object, a string containing a quasi-JSON
    /// encoding of that object, or absent, so it is captured untyped here and
    /// only interpreted by `revision::normalize`.
    #[serde(default)]
    pub revision: serde_json::Value,
}

impl VehicleReport {
    /// Reads a report previously saved as JSON, for rendering without contacting
    /// the service.
    pub fn from_path(report_path: &PathBuf) -> Result<VehicleReport, ContextError> {
        let report_content = std::fs::read_to_string(report_path).map_err(|error| {
            ContextError::with_error(
                format!("Unable to read the report file {:?}", report_path),
                &error,
            )
        })?;
        let report: VehicleReport = serde_json::from_str(&report_content).map_err(|error| {
            ContextError::with_error(
                format!("Unable to parse the report file {:?}", report_path),
                &error,
            )
        })?;

        Ok(report)
    }
}
