//! Built-in record kinds
//!
//! - manifest: participants and the visits/sessions they have
//! - curation_status: per-session progress of raw data through reorganization
//!   and BIDS conversion
//! - processing_status: per-session outcome of each pipeline step

use super::types::{ColumnDef, Schema};

pub const MANIFEST: &str = "manifest";
pub const CURATION_STATUS: &str = "curation_status";
pub const PROCESSING_STATUS: &str = "processing_status";

/// Accepted values of `processing_status.status`
pub const PROCESSING_STATUSES: [&str; 4] = ["SUCCESS", "FAIL", "INCOMPLETE", "UNAVAILABLE"];

const PARTICIPANT_ID: &str = "Participant identifier, without the BIDS prefix";
const SESSION_ID: &str = "Imaging session identifier, without the BIDS prefix";
const BIDS_PARTICIPANT_ID: &str = "Participant identifier with BIDS prefix (e.g., sub-01)";
const BIDS_SESSION_ID: &str = "Imaging session identifier with BIDS prefix (e.g., ses-01)";
const VISIT_ID: &str = "Visit identifier";

/// All built-in schemas.
pub fn all() -> Vec<Schema> {
    vec![manifest(), curation_status(), processing_status()]
}

pub fn manifest() -> Schema {
    build(
        MANIFEST,
        vec![
            ColumnDef::required_string("participant_id").with_description(PARTICIPANT_ID),
            ColumnDef::required_string("visit_id").with_description(VISIT_ID),
            ColumnDef::optional_string("session_id").with_description(SESSION_ID),
            ColumnDef::optional_list("datatype")
                .with_description("Imaging datatypes acquired in the session (e.g., anat, dwi)"),
        ],
        &["participant_id", "visit_id"],
    )
}

pub fn curation_status() -> Schema {
    build(
        CURATION_STATUS,
        vec![
            ColumnDef::required_string("participant_id").with_description(PARTICIPANT_ID),
            ColumnDef::required_string("session_id").with_description(SESSION_ID),
            ColumnDef::required_string("participant_dicom_dir")
                .with_description("Directory holding the participant's raw DICOM files"),
            ColumnDef::required_bool("in_pre_reorg")
                .with_description("Whether the session's raw data is present"),
            ColumnDef::required_bool("in_post_reorg")
                .with_description("Whether the session's data has been reorganized"),
            ColumnDef::required_bool("in_bids")
                .with_description("Whether the session's data has been converted to BIDS"),
        ],
        &["participant_id", "session_id"],
    )
}

pub fn processing_status() -> Schema {
    build(
        PROCESSING_STATUS,
        vec![
            ColumnDef::required_string("participant_id").with_description(PARTICIPANT_ID),
            ColumnDef::required_string("bids_participant_id")
                .with_description(BIDS_PARTICIPANT_ID),
            ColumnDef::required_string("session_id").with_description(SESSION_ID),
            ColumnDef::required_string("bids_session_id").with_description(BIDS_SESSION_ID),
            ColumnDef::required_string("pipeline_name").with_description("Name of the pipeline"),
            ColumnDef::required_string("pipeline_version")
                .with_description("Version of the pipeline"),
            ColumnDef::required_string("pipeline_step")
                .with_description("Name of the pipeline step"),
            ColumnDef::required_string("status")
                .with_description("Outcome of the pipeline step")
                .with_allowed_values(PROCESSING_STATUSES),
        ],
        &[
            "participant_id",
            "session_id",
            "pipeline_name",
            "pipeline_version",
            "pipeline_step",
        ],
    )
}

fn build(name: &str, columns: Vec<ColumnDef>, index_columns: &[&str]) -> Schema {
    match Schema::new(name, columns, index_columns.iter().copied()) {
        Ok(schema) => schema,
        // Definitions above are static; a failure here is a bug in this file.
        Err(e) => panic!("built-in schema '{}' is invalid: {}", name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    #[test]
    fn test_builtins_construct() {
        let names: Vec<String> = all().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec![MANIFEST, CURATION_STATUS, PROCESSING_STATUS]);
    }

    #[test]
    fn test_manifest_shape() {
        let schema = manifest();
        assert_eq!(
            schema.index_columns(),
            ["participant_id".to_string(), "visit_id".to_string()]
        );
        assert_eq!(schema.column_type("datatype").unwrap(), ColumnType::List);
        assert!(!schema.is_required("session_id").unwrap());
    }

    #[test]
    fn test_processing_status_allowed_values() {
        let schema = processing_status();
        let status = schema.column("status").unwrap();
        assert_eq!(status.allowed_values.as_ref().unwrap().len(), 4);
    }
}
