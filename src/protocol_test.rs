use serde_json::json;

use super::*;

// =============================================================================
// Outbound commands
// =============================================================================

#[test]
fn got_message_wire_shape() {
    let json = serde_json::to_value(Command::GotMessage).expect("serialize");
    assert_eq!(json, json!({"type": "got_message"}));
}

#[test]
fn param_update_wire_shape() {
    let command = Command::ParamUpdate {
        node_ind: 2,
        key: "exposure".to_owned(),
        value: "0.5".to_owned(),
    };
    let json = serde_json::to_value(&command).expect("serialize");
    assert_eq!(
        json,
        json!({"type": "param_update", "node_ind": 2, "key": "exposure", "value": "0.5"})
    );
}

// =============================================================================
// Inbound events
// =============================================================================

#[test]
fn progress_event_parses() {
    let event: ServerEvent =
        serde_json::from_str(r#"{"type":"progress","node_ind":3,"progress":0.25}"#)
            .expect("parse");
    assert_eq!(
        event,
        ServerEvent::Progress {
            node_ind: 3,
            progress: 0.25
        }
    );
}

#[test]
fn completed_event_parses_with_arbitrary_results() {
    let event: ServerEvent = serde_json::from_str(
        r#"{"type":"completed","node_ind":1,"results":{"mesh":"ok","faces":12}}"#,
    )
    .expect("parse");
    assert_eq!(
        event,
        ServerEvent::Completed {
            node_ind: 1,
            results: json!({"mesh": "ok", "faces": 12})
        }
    );
}

#[test]
fn unknown_event_type_is_rejected() {
    let result = serde_json::from_str::<ServerEvent>(r#"{"type":"telemetry","node_ind":0}"#);
    assert!(result.is_err());
}

#[test]
fn progress_event_missing_fields_is_rejected() {
    let result = serde_json::from_str::<ServerEvent>(r#"{"type":"progress"}"#);
    assert!(result.is_err());
}

// =============================================================================
// Handshake
// =============================================================================

#[test]
fn handshake_preserves_descriptor_order() {
    let handshake: Handshake = serde_json::from_str(
        r#"{"dag_nodes":[{"name":"load"},{"name":"align"},{"name":"render"}]}"#,
    )
    .expect("parse");
    assert_eq!(handshake.dag_nodes.len(), 3);
    assert_eq!(handshake.dag_nodes[0]["name"], "load");
    assert_eq!(handshake.dag_nodes[2]["name"], "render");
}

#[test]
fn handshake_without_dag_nodes_is_rejected() {
    let result = serde_json::from_str::<Handshake>(r#"{"type":"progress","node_ind":0}"#);
    assert!(result.is_err());
}
