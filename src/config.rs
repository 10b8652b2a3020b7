//! Widget configuration: the typed schema, built-in defaults, and the
//! key-wise layering of document-author overrides on top of them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{EmbedError, Result};

/// Keys a props fragment may override. Anything else is warned about and
/// dropped rather than forwarded to the component.
pub const RECOGNIZED_KEYS: &[&str] = &[
    "layout",
    "editorHeight",
    "viewerHeight",
    "autoRun",
    "autoRunDelay",
    "showLog",
    "showAutoUpdateToggle",
    "showBottomControlPanel",
];

/// Configuration handed to the editor+viewer component alongside the code
/// fragments. `Default` carries the built-in layer; a props fragment may
/// override individual keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerConfig {
    pub layout: String,
    pub editor_height: String,
    pub viewer_height: String,
    pub auto_run: bool,
    pub auto_run_delay: u32,
    /// Left unset by default so the component's own default applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_log: Option<bool>,
    pub show_auto_update_toggle: bool,
    pub show_bottom_control_panel: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            layout: "horizontal".to_string(),
            editor_height: "400px".to_string(),
            viewer_height: "400px".to_string(),
            auto_run: true,
            auto_run_delay: 500,
            show_log: None,
            show_auto_update_toggle: false,
            show_bottom_control_panel: false,
        }
    }
}

/// Parse a props fragment into a key→value override map.
///
/// The fragment must be a JSON object; anything else (including valid JSON of
/// another shape) is a configuration error the caller recovers from.
pub fn parse_overrides(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(EmbedError::Config(format!(
            "props fragment must be a JSON object, got {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(EmbedError::Config(e.to_string())),
    }
}

/// Layer overrides on top of the built-in defaults.
///
/// The merge is key-wise: a recognized key replaces the default wholesale, no
/// deep merge. Unrecognized keys are warned about and ignored, and recovery is
/// per key as well: an override with the wrong type is warned about and
/// dropped without discarding the valid overrides next to it.
pub fn layered(overrides: &Map<String, Value>) -> ViewerConfig {
    let mut config = ViewerConfig::default();

    for (key, value) in overrides {
        if !RECOGNIZED_KEYS.contains(&key.as_str()) {
            warn!(key = %key, "ignoring unrecognized props key");
            continue;
        }
        match apply_override(&config, key, value) {
            Some(next) => config = next,
            None => warn!(key = %key, "ignoring props override with invalid type"),
        }
    }

    config
}

/// Apply a single recognized override, keeping the schema as the one source
/// of truth: re-serialize the current configuration, splice the key in, and
/// deserialize the result. `None` means the value's type does not fit.
fn apply_override(config: &ViewerConfig, key: &str, value: &Value) -> Option<ViewerConfig> {
    let mut merged = match serde_json::to_value(config) {
        Ok(Value::Object(map)) => map,
        _ => return None,
    };
    merged.insert(key.to_string(), value.clone());
    serde_json::from_value(Value::Object(merged)).ok()
}

/// Resolve a widget's effective configuration from its optional props
/// fragment. Parse failures are swallowed with a warning, not fatal.
pub fn effective_config(props_text: Option<&str>) -> ViewerConfig {
    let Some(text) = props_text else {
        return ViewerConfig::default();
    };

    match parse_overrides(text) {
        Ok(overrides) => layered(&overrides),
        Err(e) => {
            warn!("failed to parse props fragment, using defaults: {e}");
            ViewerConfig::default()
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let c = ViewerConfig::default();
        assert_eq!(c.layout, "horizontal");
        assert_eq!(c.editor_height, "400px");
        assert_eq!(c.viewer_height, "400px");
        assert!(c.auto_run);
        assert_eq!(c.auto_run_delay, 500);
        assert_eq!(c.show_log, None);
        assert!(!c.show_auto_update_toggle);
        assert!(!c.show_bottom_control_panel);
    }

    #[test]
    fn no_props_yields_defaults() {
        assert_eq!(effective_config(None), ViewerConfig::default());
    }

    #[test]
    fn override_is_key_wise() {
        let config = effective_config(Some(r#"{"layout":"vertical"}"#));
        assert_eq!(config.layout, "vertical");
        // Everything else stays at its default.
        assert_eq!(config.editor_height, "400px");
        assert!(config.auto_run);
        assert_eq!(config.auto_run_delay, 500);
    }

    #[test]
    fn several_overrides_apply_together() {
        let config = effective_config(Some(
            r#"{"autoRun":false,"autoRunDelay":100,"showLog":true}"#,
        ));
        assert!(!config.auto_run);
        assert_eq!(config.auto_run_delay, 100);
        assert_eq!(config.show_log, Some(true));
        assert_eq!(config.layout, "horizontal");
    }

    #[test]
    fn malformed_json_falls_back_to_defaults() {
        assert_eq!(effective_config(Some("{not json")), ViewerConfig::default());
    }

    #[test]
    fn non_object_json_falls_back_to_defaults() {
        assert_eq!(effective_config(Some("[1,2,3]")), ViewerConfig::default());
        assert_eq!(effective_config(Some("\"vertical\"")), ViewerConfig::default());
    }

    #[test]
    fn unrecognized_keys_are_dropped() {
        let config = effective_config(Some(r#"{"layout":"vertical","banana":1}"#));
        assert_eq!(config.layout, "vertical");
    }

    #[test]
    fn wrong_typed_override_recovers_to_defaults() {
        let config = effective_config(Some(r#"{"autoRunDelay":"fast"}"#));
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn wrong_typed_override_does_not_discard_valid_siblings() {
        let config = effective_config(Some(
            r#"{"layout":"vertical","autoRunDelay":"fast","showLog":true}"#,
        ));
        assert_eq!(config.layout, "vertical");
        assert_eq!(config.show_log, Some(true));
        // Only the bad key falls back.
        assert_eq!(config.auto_run_delay, 500);
    }

    #[test]
    fn show_log_is_omitted_from_serialized_props() {
        let json = serde_json::to_value(ViewerConfig::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("showLog"));
        assert_eq!(obj["editorHeight"], "400px");
        assert_eq!(obj["showAutoUpdateToggle"], false);
    }

    #[test]
    fn non_object_parse_reports_shape() {
        let err = parse_overrides("42").unwrap_err();
        assert!(err.to_string().contains("a number"));
    }
}
