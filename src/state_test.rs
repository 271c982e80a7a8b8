use serde_json::json;

use super::*;

fn three_nodes() -> SessionState {
    let mut state = SessionState::new();
    state.set_dag_nodes(vec![json!({"name": "a"}), json!({"name": "b"}), json!({"name": "c"})]);
    state
}

#[test]
fn new_state_is_disconnected_and_empty() {
    let state = SessionState::new();
    assert!(!state.connected());
    assert!(!state.got_initial());
    assert!(!state.load_complete());
    assert!((state.initial_load_progress()).abs() < f64::EPSILON);
    assert!(state.nodes().is_empty());
}

#[test]
fn set_dag_nodes_initializes_every_node() {
    let state = three_nodes();
    assert_eq!(state.nodes().len(), 3);
    for node in state.nodes() {
        assert_eq!(node.status, NodeStatus::NotReady);
        assert!((node.progress).abs() < f64::EPSILON);
        assert!(node.input.is_empty());
        assert!(node.output.is_none());
    }
    assert_eq!(state.nodes()[1].descriptor["name"], "b");
}

#[test]
fn status_and_progress_setters_target_one_node() {
    let mut state = three_nodes();
    state.set_status(1, NodeStatus::InProgress);
    state.set_progress(1, 0.4);

    assert_eq!(state.nodes()[1].status, NodeStatus::InProgress);
    assert!((state.nodes()[1].progress - 0.4).abs() < f64::EPSILON);
    assert_eq!(state.nodes()[0].status, NodeStatus::NotReady);
    assert_eq!(state.nodes()[2].status, NodeStatus::NotReady);
}

#[test]
fn node_input_merges_instead_of_replacing() {
    let mut state = three_nodes();

    let mut defaults = Params::new();
    defaults.insert("parallel_tilt".to_owned(), json!(0));
    defaults.insert("parallel_twist".to_owned(), json!(0));
    state.set_node_input(defaults, 1);

    let mut update = Params::new();
    update.insert("parallel_tilt".to_owned(), json!(12.5));
    state.set_node_input(update, 1);

    let input = &state.nodes()[1].input;
    assert_eq!(input.len(), 2);
    assert_eq!(input["parallel_tilt"], json!(12.5));
    assert_eq!(input["parallel_twist"], json!(0));
}

#[test]
fn node_output_recorded() {
    let mut state = three_nodes();
    state.set_node_output(json!({"points": 42}), 2);
    assert_eq!(state.nodes()[2].output, Some(json!({"points": 42})));
}

#[test]
fn out_of_range_index_is_ignored() {
    let mut state = three_nodes();
    state.set_status(99, NodeStatus::Completed);
    state.set_progress(99, 1.0);
    state.set_node_input(Params::new(), 99);
    state.set_node_output(json!(null), 99);

    assert_eq!(state.nodes().len(), 3);
    for node in state.nodes() {
        assert_eq!(node.status, NodeStatus::NotReady);
    }
}

#[test]
fn connection_flags_round_trip() {
    let mut state = SessionState::new();
    state.set_connected(true);
    state.set_got_initial(true);
    state.set_initial_load_progress(0.7);
    state.set_load_complete(true);

    assert!(state.connected());
    assert!(state.got_initial());
    assert!(state.load_complete());
    assert!((state.initial_load_progress() - 0.7).abs() < f64::EPSILON);
}
