//! Integration tests for the form editor
//!
//! Drives edit sessions through the public change operations and checks
//! values, validity and the rendered tree.

use assert_matches::assert_matches;
use schema_form::{
    resolve_field_settings, Adornment, AdornmentContext, Control, EditError, EditOp, FieldPath,
    FormEditor, PrimitiveKind, SettingsBuiltins, SettingsPatch, SettingsTable, TypeNode,
    Validator, Value,
};
use schema_loader::SchemaProgram;
use serde_json::json;

const STATION: &str = include_str!("fixtures/station.schema.yaml");
const GROUP_SETTINGS: &str = include_str!("fixtures/group.settings.yaml");

fn station_type(name: &str) -> TypeNode {
    SchemaProgram::from_yaml(STATION)
        .expect("parse station")
        .expand_type(name)
        .expect("expand type")
}

fn text() -> TypeNode {
    TypeNode::primitive(PrimitiveKind::Text)
}

fn p(raw: &str) -> FieldPath {
    FieldPath::parse(raw)
}

#[test]
fn record_with_tags_becomes_valid() {
    let node = TypeNode::record([("name", text()), ("tags", TypeNode::vector(text()))]);
    let mut editor = FormEditor::mount(node, None, SettingsTable::new()).expect("mount");
    assert!(!editor.is_valid());
    assert_eq!(
        editor.errors().get(&p("name")).map(Vec::as_slice),
        Some(&["This field is required".to_string()][..])
    );

    editor.set_input(&p("name"), "x").expect("name");
    editor.push_item(&p("tags")).expect("push");
    editor.set_input(&p("tags.0"), "t1").expect("tag");

    assert_eq!(editor.get_json(), json!({"name": "x", "tags": ["t1"]}));
    assert!(editor.is_valid());
}

#[test]
fn switching_cases_discards_the_old_value() {
    let node = TypeNode::variant([
        ("A", TypeNode::primitive(PrimitiveKind::Nat)),
        ("B", text()),
    ]);
    let mut editor = FormEditor::mount(node, None, SettingsTable::new()).expect("mount");
    assert!(!editor.is_valid());

    editor.select_case(&FieldPath::root(), "A").expect("select A");
    editor.set_input(&p("A"), "5").expect("type 5");
    assert_eq!(editor.get_json(), json!({"A": 5}));

    editor.select_case(&FieldPath::root(), "A").expect("reselect A");
    assert_eq!(editor.get_json(), json!({"A": 5}));

    editor.select_case(&FieldPath::root(), "B").expect("select B");
    assert_eq!(editor.get_json(), json!({"B": ""}));
    assert_eq!(
        editor.set_input(&p("A"), "6"),
        Err(EditError::UnknownPath(p("A")))
    );
    assert_matches!(
        editor.select_case(&FieldPath::root(), "C"),
        Err(EditError::UnknownCase { .. })
    );
}

#[test]
fn excluded_cases_cannot_be_selected() {
    let node = TypeNode::record([(
        "status",
        TypeNode::variant([("Active", TypeNode::primitive(PrimitiveKind::Null)), ("Banned", text())]),
    )]);
    let table = SettingsTable::new().with(
        "status",
        SettingsPatch {
            exclude_cases: Some(vec!["Banned".into()]),
            ..SettingsPatch::default()
        },
    );
    let mut editor = FormEditor::mount(node, None, table).expect("mount");
    assert_matches!(
        editor.select_case(&p("status"), "Banned"),
        Err(EditError::UnknownCase { .. })
    );

    let rendered = editor.render();
    let Some(Control::Variant { cases, .. }) = rendered.find(&p("status")).map(|n| &n.control) else {
        panic!("expected a variant control");
    };
    assert_eq!(cases.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), ["Active"]);
}

#[test]
fn concrete_index_beats_wildcard() {
    let table = SettingsTable::from_yaml(GROUP_SETTINGS).expect("settings");
    let initial = json!({
        "title": "core",
        "members": [
            {"name": "ada", "identity": "aaaaa-aa", "status": {"Active": null}},
            {"name": "bob", "identity": "aaaaa-aa", "status": {"Active": null}}
        ],
        "subgroups": []
    });
    let editor = FormEditor::mount_json(
        station_type("Group"),
        &initial,
        table,
        Default::default(),
    )
    .expect("mount");

    let rendered = editor.render();
    let label = |path: &str| rendered.find(&p(path)).map(|n| n.label.clone());
    assert_eq!(label("members.0").as_deref(), Some("Owner"));
    assert_eq!(label("members.1").as_deref(), Some("Member"));

    let Control::Record { fields } = &rendered.control else {
        panic!("expected a record");
    };
    assert_eq!(fields[0].path, p("subgroups"));
}

#[test]
fn disabled_by_wildcard_rejects_edits() {
    let table = SettingsTable::from_yaml(GROUP_SETTINGS).expect("settings");
    let mut editor = FormEditor::mount(station_type("Group"), None, table).expect("mount");
    editor.push_item(&p("members")).expect("push member");
    assert_eq!(
        editor.set_input(&p("members.0.identity"), "aaaaa-aa"),
        Err(EditError::Disabled(p("members.0.identity")))
    );
    editor.set_input(&p("members.0.name"), "ada").expect("name is editable");
    assert!(editor.render().find(&p("members.0.identity")).is_some_and(|n| n.disabled));
}

#[test]
fn hidden_fields_keep_their_value_and_do_not_count() {
    let node = TypeNode::record([("name", text()), ("secret", text())]);
    let table = SettingsTable::new().with("secret", SettingsPatch::hidden());

    let editor = FormEditor::mount_json(
        node.clone(),
        &json!({"name": "a", "secret": "s"}),
        table.clone(),
        Default::default(),
    )
    .expect("mount");
    assert!(editor.is_valid());
    assert_eq!(editor.get_json(), json!({"name": "a", "secret": "s"}));
    assert!(editor.render().find(&p("secret")).is_some_and(|n| n.hidden));

    let blank = FormEditor::mount_json(
        node,
        &json!({"name": "a", "secret": ""}),
        table,
        Default::default(),
    )
    .expect("mount");
    assert!(blank.is_valid());
}

#[test]
fn unreachable_positions_do_not_count() {
    let node = TypeNode::record([("memo", TypeNode::optional(text()))]);
    let mut editor = FormEditor::mount(node, None, SettingsTable::new()).expect("mount");
    assert!(editor.is_valid());

    editor.set_present(&p("memo"), true).expect("present");
    assert!(!editor.is_valid());
    editor.set_present(&p("memo"), false).expect("absent");
    assert!(editor.is_valid());
}

#[test]
fn caller_validators_run_after_structure() {
    let node = TypeNode::record([
        ("code", text()),
        ("tags", TypeNode::vector(text())),
    ]);
    let table = SettingsTable::new()
        .with(
            "code",
            SettingsPatch::default()
                .with_validator(
                    "shape",
                    Validator::pattern("^[A-Z]{3}$", Some("Three capitals".into()))
                        .expect("valid pattern"),
                )
                .with_validator(
                    "not_abc",
                    Validator::custom(|v| (*v == Value::text("ABC")).then(|| "Taken".to_string())),
                ),
        )
        .with(
            "tags",
            SettingsPatch::default().with_validator("few", Validator::MaxItems { value: 1 }),
        );
    let mut editor = FormEditor::mount(node, None, table).expect("mount");

    editor.set_input(&p("code"), "ab").expect("edit");
    assert_eq!(
        editor.errors().get(&p("code")),
        Some(&vec!["Three capitals".to_string()])
    );
    editor.set_input(&p("code"), "ABC").expect("edit");
    assert_eq!(editor.errors().get(&p("code")), Some(&vec!["Taken".to_string()]));
    editor.set_input(&p("code"), "XYZ").expect("edit");
    assert!(editor.is_valid());

    editor.push_item(&p("tags")).expect("push");
    editor.push_item(&p("tags")).expect("push");
    assert!(editor.errors().contains_key(&p("tags")));
}

#[test]
fn reorder_keeps_drafts_with_their_items() {
    let node = TypeNode::record([(
        "nums",
        TypeNode::vector(TypeNode::primitive(PrimitiveKind::Nat8)),
    )]);
    let mut editor = FormEditor::mount(node, None, SettingsTable::new()).expect("mount");
    editor.push_item(&p("nums")).expect("push");
    editor.push_item(&p("nums")).expect("push");
    editor.set_input(&p("nums.0"), "abc").expect("draft");
    editor.set_input(&p("nums.1"), "7").expect("value");

    let key_before = editor.render().find(&p("nums.0")).map(|n| n.key.clone());
    editor.move_item(&p("nums"), 0, 1).expect("move");

    assert_eq!(editor.get_json(), json!({"nums": [7, 0]}));
    assert_eq!(editor.draft(&p("nums.1")).map(|d| d.text.as_str()), Some("abc"));
    assert!(editor.draft(&p("nums.0")).is_none());
    assert_eq!(editor.render().find(&p("nums.1")).map(|n| n.key.clone()), key_before);

    editor.remove_item(&p("nums"), 1).expect("remove");
    assert!(editor.draft(&p("nums.0")).is_none());
    assert!(editor.is_valid());
}

#[test]
fn recursion_stops_at_the_ceiling_until_expanded() {
    let initial = json!({
        "title": "root",
        "members": [],
        "subgroups": [{
            "title": "child",
            "members": [],
            "subgroups": [{"title": "deep", "members": [], "subgroups": []}]
        }]
    });
    let mut editor = FormEditor::mount_json(
        station_type("Group"),
        &initial,
        SettingsTable::new(),
        Default::default(),
    )
    .expect("mount");

    let collapsed = p("subgroups.0.subgroups.0");
    let rendered = editor.render();
    assert_matches!(
        rendered.find(&collapsed).map(|n| &n.control),
        Some(Control::LoadMore { type_id }) if type_id == "Group"
    );
    assert!(rendered.find(&p("subgroups.0.subgroups.0.title")).is_none());
    assert!(editor.is_valid());

    assert_matches!(
        editor.expand(&p("subgroups.0.title")),
        Err(EditError::NotA { .. })
    );
    editor.expand(&collapsed).expect("expand");
    assert!(editor.is_expanded(&collapsed));

    let rendered = editor.render();
    let deep = rendered
        .find(&p("subgroups.0.subgroups.0.title"))
        .and_then(|n| n.leaf())
        .expect("deep title");
    assert_eq!(deep.text, "deep");
}

#[test]
fn collapsed_incomplete_value_is_reported() {
    let initial = json!({
        "title": "root",
        "members": [],
        "subgroups": [{
            "title": "child",
            "members": [],
            "subgroups": [{"title": "deep", "members": [], "subgroups": []}]
        }]
    });
    let mut editor = FormEditor::mount_json(
        station_type("Group"),
        &initial,
        SettingsTable::new(),
        Default::default(),
    )
    .expect("mount");
    editor
        .push_item(&p("subgroups.0.subgroups.0.members"))
        .expect("push hidden member");

    let errors = editor.errors();
    assert_eq!(
        errors.get(&p("subgroups.0.subgroups.0")),
        Some(&vec!["Expand to complete this field".to_string()])
    );
}

#[test]
fn adornments_replace_or_append() {
    let node = TypeNode::record([("name", text()), ("note", text())]);
    let mut table = SettingsTable::new();
    table
        .adorn(
            "name",
            Adornment::replace(|ctx: &AdornmentContext| json!({"custom": ctx.label})),
        )
        .adorn(
            "note",
            Adornment::end(|ctx: &AdornmentContext| json!({"chars": ctx.value.and_then(Value::length)})),
        );
    let editor = FormEditor::mount_json(
        node,
        &json!({"name": "a", "note": "hey"}),
        table,
        Default::default(),
    )
    .expect("mount");

    let rendered = editor.render();
    assert_eq!(
        rendered.find(&p("name")).map(|n| &n.control),
        Some(&Control::Custom {
            content: json!({"custom": "Name"})
        })
    );
    let note = rendered.find(&p("note")).expect("note");
    assert!(note.leaf().is_some());
    assert_eq!(note.end, Some(json!({"chars": 3})));
}

#[test]
fn settings_resolution_is_idempotent() {
    let table = SettingsTable::from_yaml(GROUP_SETTINGS).expect("settings");
    let node = station_type("User");
    let builtins = SettingsBuiltins::default();
    let path = p("members.0");
    let first = resolve_field_settings(&node, &path, &table, &builtins);
    let second = resolve_field_settings(&node, &path, &table, &builtins);
    assert_eq!(first, second);
    assert_eq!(first.label, "Owner");
}

#[test]
fn scripted_session() {
    let node = TypeNode::record([("name", text()), ("tags", TypeNode::vector(text()))]);
    let ops: Vec<EditOp> = serde_yml::from_str(
        r#"
- op: set_input
  path: name
  text: ada
- op: push_item
  path: tags
- op: set_value
  path: tags.0
  value: first
"#,
    )
    .expect("script");
    let mut editor = FormEditor::mount(node, None, SettingsTable::new()).expect("mount");
    for op in &ops {
        editor.apply(op).expect("apply");
    }
    assert_eq!(editor.get_json(), json!({"name": "ada", "tags": ["first"]}));
}
