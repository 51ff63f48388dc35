use dashstore_core::{Document, DocumentError, DocumentKind};
use serde_json::{json, Value};

fn hosts() -> Document {
    Document::from_value(
        DocumentKind::Dashboard,
        json!({
            "title": "Hosts",
            "refresh": "1m",
            "rows": [
                {"title": "CPU", "panels": [{"id": 1, "title": "Load"}, {"id": 2, "title": "Steal"}]},
                {"title": "Disk", "panels": [{"id": 3, "title": "IOPS"}]}
            ]
        }),
        Some("hosts"),
    )
    .unwrap()
}

fn row(value: Value) -> Document {
    Document::from_value(DocumentKind::Row, value, None).unwrap()
}

fn panel(value: Value) -> Document {
    Document::from_value(DocumentKind::Panel, value, None).unwrap()
}

#[test]
fn names_derive_from_title_without_hint() {
    let dashboard = Document::from_value(
        DocumentKind::Dashboard,
        json!({"title": "Prod / Hosts"}),
        None,
    )
    .unwrap();
    assert_eq!(dashboard.name(), "prod-hosts");

    assert_eq!(row(json!({"title": "CPU Usage"})).name(), "1-cpu-usage");
    assert_eq!(panel(json!({"id": 7, "title": "Load"})).name(), "7-load");
    assert_eq!(hosts().child_names().unwrap(), vec!["1-cpu", "2-disk"]);
}

#[test]
fn parse_rejects_sources_of_wrong_shape() {
    let err = Document::parse(DocumentKind::Row, b"[1, 2]", None).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Malformed {
            kind: DocumentKind::Row,
            ..
        }
    ));

    let err = Document::parse(DocumentKind::Dashboard, br#"{"rows": {}}"#, None).unwrap_err();
    assert!(matches!(err, DocumentError::Malformed { .. }));

    let err = Document::parse(DocumentKind::Row, br#"{"panels": [1]}"#, None).unwrap_err();
    assert!(matches!(err, DocumentError::Malformed { .. }));

    let err = Document::parse(DocumentKind::Panel, b"{truncated", None).unwrap_err();
    assert!(matches!(err, DocumentError::Malformed { .. }));
}

#[test]
fn child_lookup_accepts_exact_name_or_number() {
    let dashboard = hosts();

    assert_eq!(dashboard.child("2-disk").unwrap().name(), "2-disk");
    assert_eq!(dashboard.child("2").unwrap().name(), "2-disk");
    assert_eq!(dashboard.child("2-renamed").unwrap().name(), "2-disk");
    assert_eq!(
        dashboard.child("disk").unwrap_err(),
        DocumentError::ChildNotFound {
            kind: DocumentKind::Row,
            name: "disk".to_string()
        }
    );

    let load = dashboard.child("1").unwrap().child("1-load").unwrap();
    assert_eq!(load.kind(), DocumentKind::Panel);
    assert_eq!(load.child_names().unwrap_err(), DocumentError::NoSubNodes);
    assert_eq!(load.child("x").unwrap_err(), DocumentError::NoSubNodes);
}

#[test]
fn standalone_documents_have_no_parent() {
    let standalone = panel(json!({"id": 1, "title": "Load"}));
    assert!(standalone.parent().is_none());
    assert_eq!(standalone.top().name(), "1-load");

    let cpu = hosts().child("1-cpu").unwrap();
    assert_eq!(cpu.parent().unwrap().name(), "hosts");
}

#[test]
fn update_rejects_incompatible_pairs() {
    let dashboard = hosts();
    let cpu = dashboard.child("1-cpu").unwrap();
    let load = cpu.child("1-load").unwrap();

    assert_eq!(
        dashboard.update(&panel(json!({"title": "Lost"}))).unwrap_err(),
        DocumentError::IncompatibleUpdate {
            target: DocumentKind::Dashboard,
            incoming: DocumentKind::Panel
        }
    );
    assert_eq!(
        cpu.update(&hosts()).unwrap_err(),
        DocumentError::IncompatibleUpdate {
            target: DocumentKind::Row,
            incoming: DocumentKind::Dashboard
        }
    );
    assert_eq!(
        load.update(&row(json!({"title": "Net"}))).unwrap_err(),
        DocumentError::IncompatibleUpdate {
            target: DocumentKind::Panel,
            incoming: DocumentKind::Row
        }
    );
    assert_eq!(dashboard.child_names().unwrap(), vec!["1-cpu", "2-disk"]);
}

#[test]
fn dashboard_merge_overrides_keys_and_replaces_rows_when_given() {
    let dashboard = hosts();

    let title_only = Document::from_value(
        DocumentKind::Dashboard,
        json!({"title": "Hosts v2"}),
        Some("other"),
    )
    .unwrap();
    dashboard.update(&title_only).unwrap();

    let value = dashboard.to_value();
    assert_eq!(value["title"], json!("Hosts v2"));
    assert_eq!(value["refresh"], json!("1m"));
    assert_eq!(dashboard.name(), "hosts");
    assert_eq!(dashboard.child_names().unwrap(), vec!["1-cpu", "2-disk"]);

    let with_rows = Document::from_value(
        DocumentKind::Dashboard,
        json!({"rows": [{"title": "Only"}]}),
        None,
    )
    .unwrap();
    dashboard.update(&with_rows).unwrap();

    assert_eq!(dashboard.child_names().unwrap(), vec!["1-only"]);
    let only = dashboard.child("1-only").unwrap();
    assert_eq!(only.parent().unwrap().name(), "hosts");
}

#[test]
fn appended_row_gets_next_position_and_fresh_panel_ids() {
    let dashboard = hosts();
    let incoming = row(json!({
        "title": "Net",
        "panels": [{"id": 1, "title": "Rx"}, {"id": 1, "title": "Tx"}]
    }));

    dashboard.update(&incoming).unwrap();

    assert_eq!(
        dashboard.child_names().unwrap(),
        vec!["1-cpu", "2-disk", "3-net"]
    );
    let net = dashboard.child("3-net").unwrap();
    assert_eq!(net.child_names().unwrap(), vec!["4-rx", "5-tx"]);
    assert_eq!(net.child("5").unwrap().to_value()["id"], json!(5));
}

#[test]
fn appended_panel_id_is_unique_across_dashboard() {
    let dashboard = hosts();
    let cpu = dashboard.child("1-cpu").unwrap();

    cpu.update(&panel(json!({"id": 1, "title": "Iowait"}))).unwrap();

    assert_eq!(
        cpu.child_names().unwrap(),
        vec!["1-load", "2-steal", "4-iowait"]
    );
}

#[test]
fn nested_row_merge_keeps_name_and_renumbers_incoming_panels() {
    let dashboard = hosts();
    let cpu = dashboard.child("1-cpu").unwrap();

    cpu.update(&row(json!({
        "title": "Processor",
        "height": "300px",
        "panels": [{"id": 1, "title": "User"}]
    })))
    .unwrap();

    assert_eq!(cpu.name(), "1-cpu");
    assert_eq!(cpu.to_value()["height"], json!("300px"));
    assert_eq!(cpu.child_names().unwrap(), vec!["4-user"]);
    assert_eq!(
        dashboard.child("2-disk").unwrap().child_names().unwrap(),
        vec!["3-iops"]
    );
}

#[test]
fn standalone_row_merge_keeps_panels_when_incoming_has_none() {
    let template = Document::from_value(
        DocumentKind::Row,
        json!({"title": "CPU", "collapse": true, "panels": [{"id": 8, "title": "Load"}]}),
        Some("R1"),
    )
    .unwrap();

    template
        .update(&row(json!({"collapse": false})))
        .unwrap();

    assert_eq!(template.name(), "R1");
    assert_eq!(template.to_value()["collapse"], json!(false));
    assert_eq!(template.child_names().unwrap(), vec!["8-load"]);
}

#[test]
fn source_reflects_in_place_mutations() {
    let dashboard = hosts();
    let disk = dashboard.child("2-disk").unwrap();
    disk.update(&panel(json!({"title": "Latency"}))).unwrap();
    dashboard.remove_child("1-cpu").unwrap();

    let reparsed = Document::parse(
        DocumentKind::Dashboard,
        &dashboard.source().unwrap(),
        Some("hosts"),
    )
    .unwrap();

    assert_eq!(reparsed.child_names().unwrap(), vec!["1-disk"]);
    assert_eq!(
        reparsed.child("1-disk").unwrap().child_names().unwrap(),
        vec!["3-iops", "4-latency"]
    );
    assert_eq!(reparsed.to_value()["refresh"], json!("1m"));
}

#[test]
fn remove_child_from_row_and_panel() {
    let dashboard = hosts();
    let cpu = dashboard.child("1-cpu").unwrap();

    cpu.remove_child("2").unwrap();
    assert_eq!(cpu.child_names().unwrap(), vec!["1-load"]);

    assert_eq!(
        cpu.remove_child("2-steal").unwrap_err(),
        DocumentError::ChildNotFound {
            kind: DocumentKind::Panel,
            name: "2-steal".to_string()
        }
    );
    let load = cpu.child("1-load").unwrap();
    assert_eq!(load.remove_child("1").unwrap_err(), DocumentError::NoSubNodes);
}

#[test]
fn exact_name_wins_over_earlier_sibling_with_same_number() {
    let template = Document::from_value(
        DocumentKind::Row,
        json!({"title": "CPU", "panels": [{"title": "Load"}, {"title": "Steal"}]}),
        Some("R1"),
    )
    .unwrap();
    assert_eq!(template.child_names().unwrap(), vec!["0-load", "0-steal"]);

    assert_eq!(template.child("0-steal").unwrap().name(), "0-steal");
    assert_eq!(template.child("0-other").unwrap().name(), "0-load");

    template.remove_child("0-steal").unwrap();
    assert_eq!(template.child_names().unwrap(), vec!["0-load"]);
}
