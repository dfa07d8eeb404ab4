use console_error_panic_hook::set_once as set_panic_hook_once;
use js_sys::Uint8Array;
use schema_form::{
    codec, EditOp, EngineConfig, EngineOptions, FieldPath, FormEditor, FormViewer, PayloadCatalog,
    SettingsTable, Value,
};
use schema_loader::{ResolveError, SchemaProgram, TypeSelector};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    set_panic_hook_once();
}

/* ============================================================================
   Stateless Functions

   Each call parses the schema program it is given. Values, settings and
   render trees cross the boundary as JSON strings.
   ============================================================================ */

/// Package name, type names and method names of a schema program
#[wasm_bindgen]
pub fn list_schema(schema_yaml: &str) -> Result<JsValue, JsValue> {
    Ok(js_string(list_schema_json(schema_yaml).map_err(js_error)?))
}

/// Expanded type tree of a named type
#[wasm_bindgen]
pub fn describe_type(schema_yaml: &str, type_name: &str) -> Result<JsValue, JsValue> {
    let node = parse_program(schema_yaml)
        .map_err(js_error)?
        .select(&TypeSelector::name(type_name))
        .map_err(map_resolve_error)?;
    Ok(js_string(
        serde_json::to_string(&node).map_err(map_serde_error)?,
    ))
}

/// Expanded argument or result tuple of a method
#[wasm_bindgen]
pub fn describe_method(schema_yaml: &str, method: &str, results: bool) -> Result<JsValue, JsValue> {
    let node = parse_program(schema_yaml)
        .map_err(js_error)?
        .select(&method_selector(method, results))
        .map_err(map_resolve_error)?;
    Ok(js_string(
        serde_json::to_string(&node).map_err(map_serde_error)?,
    ))
}

/// Render a read-only view of a stored value.
///
/// `endpoint` names the schema program; payload leaves bound to it are
/// decoded against its method tuples. `expand_json` is an optional JSON
/// array of field paths whose collapsed recursion should be opened.
#[wasm_bindgen]
pub fn render_view(
    schema_yaml: &str,
    endpoint: &str,
    type_name: &str,
    value_json: &str,
    settings: Option<String>,
    expand_json: Option<String>,
) -> Result<JsValue, JsValue> {
    let rendered = render_view_json(
        schema_yaml,
        endpoint,
        type_name,
        value_json,
        settings.as_deref(),
        expand_json.as_deref(),
    )
    .map_err(js_error)?;
    Ok(js_string(rendered))
}

/// Decode tuple payload bytes into a JSON value
#[wasm_bindgen]
pub fn decode_payload(
    schema_yaml: &str,
    method: &str,
    results: bool,
    buffer: Uint8Array,
) -> Result<JsValue, JsValue> {
    let bytes = buffer.to_vec();
    Ok(js_string(
        decode_payload_json(schema_yaml, method, results, &bytes).map_err(js_error)?,
    ))
}

/// Encode a JSON tuple value into payload bytes
#[wasm_bindgen]
pub fn encode_payload(
    schema_yaml: &str,
    method: &str,
    results: bool,
    value_json: &str,
) -> Result<Uint8Array, JsValue> {
    let bytes = encode_payload_bytes(schema_yaml, method, results, value_json).map_err(js_error)?;
    Ok(Uint8Array::from(bytes.as_slice()))
}

/* ============================================================================
   Edit Sessions

   A session keeps a form editor alive between calls. Schema programs come
   from a manifest (JSON object of endpoint name to schema YAML) so payload
   leaves bound to any listed endpoint can be decoded without fetching.
   ============================================================================ */

#[wasm_bindgen]
pub struct FormSession {
    editor: FormEditor,
    programs: HashMap<String, Arc<SchemaProgram>>,
}

#[wasm_bindgen]
impl FormSession {
    /// Mount a form for `type_name` of the `endpoint` program.
    ///
    /// `initial_json` seeds the form; without it every field starts at its
    /// default. `settings` is a YAML or JSON settings table and
    /// `config_yaml` overrides engine limits.
    #[wasm_bindgen(constructor)]
    pub fn new(
        manifest_json: &str,
        endpoint: &str,
        type_name: &str,
        initial_json: Option<String>,
        settings: Option<String>,
        config_yaml: Option<String>,
    ) -> Result<FormSession, JsValue> {
        Session::mount(
            manifest_json,
            endpoint,
            type_name,
            initial_json.as_deref(),
            settings.as_deref(),
            config_yaml.as_deref(),
        )
        .map(|session| FormSession {
            editor: session.editor,
            programs: session.programs,
        })
        .map_err(js_error)
    }

    /// Apply one edit operation (JSON, e.g. `{"op":"set_input",...}`) and
    /// return the new render tree
    pub fn apply(&mut self, op_json: &str) -> Result<JsValue, JsValue> {
        let op: EditOp = serde_json::from_str(op_json).map_err(map_serde_error)?;
        self.editor
            .apply(&op)
            .map_err(|err| js_error(err.to_string()))?;
        settle_payloads(&mut self.editor, &self.programs);
        self.render()
    }

    /// Apply an edit operation inside the decoded payload at `path`
    pub fn apply_payload_edit(&mut self, path: &str, op_json: &str) -> Result<JsValue, JsValue> {
        let op: EditOp = serde_json::from_str(op_json).map_err(map_serde_error)?;
        let path = FieldPath::parse(path);
        let nested = self
            .editor
            .payload_editor_mut(&path)
            .ok_or_else(|| js_error(format!("no decoded payload at '{}'", path)))?;
        nested.apply(&op).map_err(|err| js_error(err.to_string()))?;
        self.render()
    }

    /// Re-encode the nested payload at `path` into its bytes field
    pub fn commit_payload(&mut self, path: &str) -> Result<JsValue, JsValue> {
        self.editor
            .commit_payload(&FieldPath::parse(path))
            .map_err(|err| js_error(err.to_string()))?;
        settle_payloads(&mut self.editor, &self.programs);
        self.render()
    }

    pub fn render(&self) -> Result<JsValue, JsValue> {
        Ok(js_string(
            serde_json::to_string(&self.editor.render()).map_err(map_serde_error)?,
        ))
    }

    pub fn values(&self) -> Result<JsValue, JsValue> {
        Ok(js_string(
            serde_json::to_string(&self.editor.get_json()).map_err(map_serde_error)?,
        ))
    }

    /// Validity and per-path errors
    pub fn report(&self) -> Result<JsValue, JsValue> {
        Ok(js_string(
            serde_json::to_string(&SessionReport::of(&self.editor)).map_err(map_serde_error)?,
        ))
    }

    pub fn is_valid(&self) -> bool {
        self.editor.is_valid()
    }
}

/* Session state without the JS wrapper, so the logic runs natively too */
struct Session {
    editor: FormEditor,
    programs: HashMap<String, Arc<SchemaProgram>>,
}

impl Session {
    fn mount(
        manifest_json: &str,
        endpoint: &str,
        type_name: &str,
        initial_json: Option<&str>,
        settings: Option<&str>,
        config_yaml: Option<&str>,
    ) -> Result<Self, String> {
        let programs = parse_manifest(manifest_json)?;
        let program = programs
            .get(endpoint)
            .ok_or_else(|| format!("Endpoint '{}' not found in manifest", endpoint))?;
        let node = program
            .select(&TypeSelector::name(type_name))
            .map_err(|err| err.to_string())?;

        let mut config = match config_yaml {
            Some(yaml) => serde_yml::from_str::<EngineConfig>(yaml)
                .map_err(|err| format!("Invalid config: {err}"))?,
            None => EngineConfig::default(),
        };
        if config.payload_endpoint.is_none() {
            config.payload_endpoint = Some(endpoint.to_string());
        }
        let options = EngineOptions::with_config(config);
        let table = parse_settings(settings)?;

        let mut editor = match initial_json {
            Some(json) => {
                let initial: serde_json::Value =
                    serde_json::from_str(json).map_err(|err| format!("Invalid value JSON: {err}"))?;
                FormEditor::mount_json(node, &initial, table, options)
            }
            None => FormEditor::mount_with(node, None, table, options),
        }
        .map_err(|err| err.to_string())?;
        settle_payloads(&mut editor, &programs);

        Ok(Self { editor, programs })
    }
}

#[derive(Serialize)]
struct SessionReport {
    valid: bool,
    errors: BTreeMap<String, Vec<String>>,
}

impl SessionReport {
    fn of(editor: &FormEditor) -> Self {
        let errors: BTreeMap<String, Vec<String>> = editor
            .errors()
            .into_iter()
            .map(|(path, messages)| (path.to_string(), messages))
            .collect();
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/* Answer every pending payload lookup from the loaded programs */
fn settle_payloads(editor: &mut FormEditor, programs: &HashMap<String, Arc<SchemaProgram>>) {
    for request in editor.payload_requests() {
        let result = match programs.get(&request.endpoint) {
            Some(program) => program.select(&request.direction.selector(&request.method)),
            None => Err(ResolveError::unavailable(
                &request.endpoint,
                "endpoint not in manifest",
            )),
        };
        editor.apply_payload(request.resolved(result));
    }
}

/* ============================================================================
   Helpers
   ============================================================================ */

fn parse_program(schema_yaml: &str) -> Result<SchemaProgram, String> {
    SchemaProgram::from_yaml(schema_yaml).map_err(|err| format!("Invalid schema YAML: {err}"))
}

fn parse_manifest(manifest_json: &str) -> Result<HashMap<String, Arc<SchemaProgram>>, String> {
    let manifest: HashMap<String, String> = serde_json::from_str(manifest_json)
        .map_err(|err| format!("Invalid manifest JSON: {err}"))?;
    if manifest.is_empty() {
        return Err("Manifest is empty".into());
    }
    manifest
        .into_iter()
        .map(|(endpoint, yaml)| {
            let program = SchemaProgram::from_yaml(&yaml)
                .map_err(|err| format!("Invalid schema YAML for endpoint '{}': {}", endpoint, err))?;
            Ok((endpoint, Arc::new(program)))
        })
        .collect()
}

/* Settings tables are YAML; JSON parses as YAML too */
fn parse_settings(settings: Option<&str>) -> Result<SettingsTable, String> {
    match settings {
        Some(content) if !content.trim().is_empty() => {
            SettingsTable::from_yaml(content).map_err(|err| format!("Invalid settings: {err}"))
        }
        _ => Ok(SettingsTable::new()),
    }
}

fn method_selector(method: &str, results: bool) -> TypeSelector {
    if results {
        TypeSelector::method_results(method)
    } else {
        TypeSelector::method_args(method)
    }
}

fn list_schema_json(schema_yaml: &str) -> Result<String, String> {
    let program = parse_program(schema_yaml)?;
    let listing = serde_json::json!({
        "package": program.package(),
        "types": program.type_names().collect::<Vec<_>>(),
        "methods": program.method_names().collect::<Vec<_>>(),
    });
    serde_json::to_string(&listing).map_err(|err| err.to_string())
}

fn render_view_json(
    schema_yaml: &str,
    endpoint: &str,
    type_name: &str,
    value_json: &str,
    settings: Option<&str>,
    expand_json: Option<&str>,
) -> Result<String, String> {
    let program = Arc::new(parse_program(schema_yaml)?);
    let node = program
        .select(&TypeSelector::name(type_name))
        .map_err(|err| err.to_string())?;
    let value: serde_json::Value =
        serde_json::from_str(value_json).map_err(|err| format!("Invalid value JSON: {err}"))?;
    let expand: Vec<String> = match expand_json {
        Some(json) => serde_json::from_str(json).map_err(|err| format!("Invalid expand list: {err}"))?,
        None => Vec::new(),
    };

    let options = EngineOptions::with_config(EngineConfig {
        payload_endpoint: Some(endpoint.to_string()),
        ..EngineConfig::default()
    });
    let mut viewer = FormViewer::from_json(node, &value, parse_settings(settings)?)
        .map_err(|err| err.to_string())?
        .with_options(options)
        .with_catalog(PayloadCatalog::from_program(endpoint, program));
    for path in &expand {
        viewer.expand(&FieldPath::parse(path));
    }
    serde_json::to_string(&viewer.render()).map_err(|err| err.to_string())
}

fn decode_payload_json(
    schema_yaml: &str,
    method: &str,
    results: bool,
    bytes: &[u8],
) -> Result<String, String> {
    let tuple = parse_program(schema_yaml)?
        .select(&method_selector(method, results))
        .map_err(|err| err.to_string())?;
    let value = codec::decode(bytes, &tuple).map_err(|err| format!("Decode error: {err}"))?;
    serde_json::to_string(&value.to_json()).map_err(|err| err.to_string())
}

fn encode_payload_bytes(
    schema_yaml: &str,
    method: &str,
    results: bool,
    value_json: &str,
) -> Result<Vec<u8>, String> {
    let tuple = parse_program(schema_yaml)?
        .select(&method_selector(method, results))
        .map_err(|err| err.to_string())?;
    let json: serde_json::Value =
        serde_json::from_str(value_json).map_err(|err| format!("Invalid value JSON: {err}"))?;
    let value = Value::from_json(&json, &tuple).map_err(|err| err.to_string())?;
    codec::encode(&value, &tuple).map_err(|err| format!("Encode error: {err}"))
}

fn map_resolve_error(err: ResolveError) -> JsValue {
    js_error(err.to_string())
}

fn map_serde_error(err: serde_json::Error) -> JsValue {
    js_error(format!("Serialization error: {err}"))
}

fn js_error(message: String) -> JsValue {
    js_sys::Error::new(&message).into()
}

fn js_string(value: String) -> JsValue {
    JsValue::from_str(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATION: &str = include_str!("../../schema_form/tests/fixtures/station.schema.yaml");
    const PROPOSAL_SETTINGS: &str =
        include_str!("../../schema_form/tests/fixtures/proposal.settings.yaml");

    fn manifest() -> String {
        serde_json::json!({ "station": STATION }).to_string()
    }

    #[test]
    fn listing_names_types_and_methods() {
        let listing: serde_json::Value =
            serde_json::from_str(&list_schema_json(STATION).expect("list")).expect("json");
        assert_eq!(listing["package"], "station");
        assert_eq!(listing["methods"][0], "set_name");
    }

    #[test]
    fn payload_bytes_survive_the_boundary() {
        let bytes = encode_payload_bytes(STATION, "transfer", false, "[1, 2]").expect("encode");
        let decoded = decode_payload_json(STATION, "transfer", false, &bytes).expect("decode");
        assert_eq!(decoded, r#"{"0":1,"1":2}"#);
    }

    #[test]
    fn view_decodes_bound_payloads() {
        let arg = encode_payload_bytes(STATION, "set_name", false, r#"["ada"]"#).expect("encode");
        let hex: String = arg.iter().map(|b| format!("{:02x}", b)).collect();
        let value = serde_json::json!({"method": "set_name", "arg": format!("0x{}", hex), "memo": null});
        let rendered = render_view_json(
            STATION,
            "station",
            "Proposal",
            &value.to_string(),
            Some(PROPOSAL_SETTINGS),
            None,
        )
        .expect("render");
        assert!(rendered.contains(r#""status":"decoded""#), "{}", rendered);
        assert!(rendered.contains(r#""method":"set_name""#));
    }

    #[test]
    fn session_settles_payloads_from_the_manifest() {
        let arg = encode_payload_bytes(STATION, "set_name", false, r#"["ada"]"#).expect("encode");
        let hex: String = arg.iter().map(|b| format!("{:02x}", b)).collect();
        let initial = serde_json::json!({"method": "set_name", "arg": format!("0x{}", hex), "memo": null});
        let mut session = Session::mount(
            &manifest(),
            "station",
            "Proposal",
            Some(&initial.to_string()),
            Some(PROPOSAL_SETTINGS),
            None,
        )
        .expect("mount");

        let nested = session
            .editor
            .payload_editor(&FieldPath::parse("arg"))
            .expect("nested editor");
        assert_eq!(nested.get_json(), serde_json::json!({"0": "ada"}));

        session
            .editor
            .set_input(&FieldPath::parse("method"), "transfer")
            .expect("switch method");
        settle_payloads(&mut session.editor, &session.programs);
        assert!(session.editor.payload_requests().is_empty());
        assert!(SessionReport::of(&session.editor).valid);
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let err = Session::mount(&manifest(), "ledger", "User", None, None, None)
            .err()
            .expect("mount error");
        assert!(err.contains("ledger"));
    }
}
