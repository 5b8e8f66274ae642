//! Surveyor input checks run before the USER_INPUTS cursor advances.

use mep_core::{ConduitSize, EquipmentId, MepError, MepResult, UserInputs, WireGauge};
use std::collections::BTreeMap;

/// Check one item's surveyor inputs before the cursor may advance.
///
/// Designation, location, phase wire, ground wire and conduit are required;
/// any wire or conduit label given must be a known table entry. Errors are
/// keyed by the camelCase field name.
pub fn validate_user_inputs(inputs: &UserInputs, own_id: &EquipmentId) -> MepResult<()> {
    let mut errors = BTreeMap::new();

    if inputs.designation.trim().is_empty() {
        errors.insert("designation".to_string(), "Designation is required".to_string());
    }
    if inputs.location.trim().is_empty() {
        errors.insert("location".to_string(), "Location is required".to_string());
    }

    check_gauge(&mut errors, "phaseWireSize", inputs.phase_wire_size.as_deref(), true);
    check_gauge(&mut errors, "groundWireSize", inputs.ground_wire_size.as_deref(), true);
    check_gauge(
        &mut errors,
        "neutralWireSize",
        inputs.neutral_wire_size.as_deref(),
        false,
    );

    match non_blank(inputs.conduit_size.as_deref()) {
        None => {
            errors.insert("conduitSize".to_string(), "Conduit size is required".to_string());
        }
        Some(label) => {
            if label.parse::<ConduitSize>().is_err() {
                errors.insert(
                    "conduitSize".to_string(),
                    format!("Unknown conduit size '{label}'"),
                );
            }
        }
    }

    if let Some(dims) = inputs.dimensions {
        if [dims.width, dims.height, dims.depth]
            .iter()
            .any(|v| !v.is_finite() || *v <= 0.0)
        {
            errors.insert(
                "dimensions".to_string(),
                "Dimensions must be positive".to_string(),
            );
        }
    }

    if inputs.fed_from.as_ref() == Some(own_id) {
        errors.insert(
            "fedFrom".to_string(),
            "Equipment cannot be fed from itself".to_string(),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(MepError::FieldValidation(errors))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_gauge(
    errors: &mut BTreeMap<String, String>,
    field: &str,
    value: Option<&str>,
    required: bool,
) {
    match non_blank(value) {
        None if required => {
            errors.insert(field.to_string(), "Wire size is required".to_string());
        }
        None => {}
        Some(label) => {
            if label.parse::<WireGauge>().is_err() {
                errors.insert(field.to_string(), format!("Unknown wire size '{label}'"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mep_core::Dimensions;

    fn complete() -> UserInputs {
        UserInputs {
            designation: "LP-1".into(),
            location: "Level 2 corridor".into(),
            phase_wire_size: Some("3/0 AWG".into()),
            ground_wire_size: Some("6 AWG".into()),
            conduit_size: Some("2\"".into()),
            ..UserInputs::default()
        }
    }

    #[test]
    fn complete_inputs_pass() {
        assert!(validate_user_inputs(&complete(), &EquipmentId::new("p1")).is_ok());
    }

    #[test]
    fn empty_inputs_report_every_required_field() {
        let err = validate_user_inputs(&UserInputs::default(), &EquipmentId::new("p1"))
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "conduitSize",
                "designation",
                "groundWireSize",
                "location",
                "phaseWireSize"
            ]
        );
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let mut inputs = complete();
        inputs.phase_wire_size = Some("13 AWG".into());
        inputs.neutral_wire_size = Some("huge".into());
        inputs.conduit_size = Some("7\"".into());
        let err = validate_user_inputs(&inputs, &EquipmentId::new("p1")).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields["phaseWireSize"].contains("13 AWG"));
        assert!(fields.contains_key("neutralWireSize"));
        assert!(fields.contains_key("conduitSize"));
        assert!(!fields.contains_key("designation"));
    }

    #[test]
    fn self_feed_and_bad_dimensions_are_rejected() {
        let mut inputs = complete();
        inputs.fed_from = Some(EquipmentId::new("p1"));
        inputs.dimensions = Some(Dimensions {
            width: 20.0,
            height: 0.0,
            depth: 6.0,
        });
        let err = validate_user_inputs(&inputs, &EquipmentId::new("p1")).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("fedFrom"));
        assert!(fields.contains_key("dimensions"));
    }
}
