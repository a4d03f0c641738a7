//! Generated (`dynamic-ai`) blocks.
//!
//! These blocks carry literal HTML, CSS and JavaScript instead of typed props.
//! HTML goes into a dedicated container, CSS is installed into a
//! [`StyleRegistry`] keyed by the block's id, and JavaScript is handed to a
//! [`ScriptRunner`], which decides whether and how it runs.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::content::InstanceId;
use crate::error::{PageError, PageResult};

/// `props.content` of a generated block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicContent {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub html: Option<String>,
    pub css: Option<String>,
    pub js: Option<String>,
}

/// Props of a `dynamic-ai` instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicAi {
    pub content: DynamicContent,
    pub settings: Value,
}

impl DynamicAi {
    /// Id that owns this block's style entry: the payload id, then the
    /// instance id, then an id derived from the payload itself.
    pub fn style_id(&self, instance_id: Option<&InstanceId>) -> String {
        if let Some(id) = self.content.id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        if let Some(id) = instance_id {
            return id.to_string();
        }
        let digest = self.payload_digest();
        format!("dynamic-{}", &digest[..12])
    }

    /// Settings as an object; anything else becomes `{}`.
    pub fn settings(&self) -> Value {
        match &self.settings {
            Value::Object(_) => self.settings.clone(),
            _ => Value::Object(Default::default()),
        }
    }

    /// Changes whenever the script or its inputs change.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.payload_digest().as_bytes());
        hasher.update(self.settings().to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn payload_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [&self.content.html, &self.content.css, &self.content.js] {
            hasher.update(part.as_deref().unwrap_or_default().as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// ─── Style registry ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct StyleEntry {
    id: String,
    css: String,
}

/// Document-level style blocks owned by generated components.
///
/// An entry is acquired when its block mounts (or its CSS changes) and released
/// when the block is unmounted or replaced. Entries keep installation order.
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    entries: Vec<StyleEntry>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the CSS owned by `id`.
    pub fn acquire(&mut self, id: &str, css: &str) {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                if entry.css != css {
                    tracing::debug!(id, "replacing dynamic style block");
                    entry.css = css.to_string();
                }
            }
            None => {
                tracing::debug!(id, "installing dynamic style block");
                self.entries.push(StyleEntry {
                    id: id.to_string(),
                    css: css.to_string(),
                });
            }
        }
    }

    /// Remove the CSS owned by `id`. Returns whether an entry existed.
    pub fn release(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let released = self.entries.len() != before;
        if released {
            tracing::debug!(id, "released dynamic style block");
        }
        released
    }

    pub fn release_all(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.css.as_str())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `<style>` tags for the document head.
    pub fn to_style_tags(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str("<style data-dynamic-id=\"");
            out.push_str(&crate::html::escape_html(&entry.id));
            out.push_str("\">");
            out.push_str(&escape_closing_tag(&entry.css, "</style"));
            out.push_str("</style>\n");
        }
        out
    }
}

/// Breaks any `</tag` sequence so embedded text cannot end its element early.
fn escape_closing_tag(text: &str, closing: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let lower = text.to_ascii_lowercase();
    let mut last = 0;
    for (pos, _) in lower.match_indices(closing) {
        out.push_str(&text[last..pos]);
        out.push_str("<\\/");
        last = pos + 2;
    }
    out.push_str(&text[last..]);
    out
}

// ─── Script boundary ────────────────────────────────────────────────────────

/// One script invocation for a generated block.
#[derive(Debug, Clone, Copy)]
pub struct ScriptCall<'a> {
    /// Owner id of the block (same key as its style entry).
    pub block_id: &'a str,
    /// DOM id of the block's container element.
    pub container_id: &'a str,
    pub source: &'a str,
    pub settings: &'a Value,
}

/// Decides what happens to a generated block's script.
///
/// The runner is called once per content change of a block. It may return
/// markup to append after the block's container. Errors are logged by the
/// caller and never affect other blocks.
pub trait ScriptRunner {
    fn run(&self, call: &ScriptCall<'_>) -> PageResult<Option<String>>;
}

/// Never runs scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledScripts;

impl ScriptRunner for DisabledScripts {
    fn run(&self, call: &ScriptCall<'_>) -> PageResult<Option<String>> {
        tracing::debug!(block = call.block_id, "scripts disabled, not running generated script");
        Ok(None)
    }
}

/// Emits a client-side script that calls the source as
/// `function (container, settings)` inside a try/catch.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineScripts;

impl ScriptRunner for InlineScripts {
    fn run(&self, call: &ScriptCall<'_>) -> PageResult<Option<String>> {
        // `<!--` inside a script element switches the HTML parser into an escaped state.
        if call.source.contains("<!--") {
            return Err(PageError::ScriptRejected {
                instance: call.block_id.to_string(),
                reason: "source contains an HTML comment opener".to_string(),
            });
        }
        let container = script_json(call.container_id)?;
        let settings = script_json(call.settings)?;
        let script = format!(
            "<script>(function(){{var container=document.getElementById({container});\
             var settings={settings};\
             try{{(function(container,settings){{\n{source}\n}})(container,settings);}}\
             catch(e){{console.error(\"dynamic block script failed\",e);}}}})();</script>",
            container = container,
            settings = settings,
            source = call.source,
        );
        Ok(Some(escape_script_body(&script)))
    }
}

/// JSON literal with no `<`, so data can neither open a comment nor close the element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> PageResult<String> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

/// Escapes `</script` inside the body while keeping the outer tags intact.
fn escape_script_body(script: &str) -> String {
    const OPEN: &str = "<script>";
    const CLOSE: &str = "</script>";
    let body = &script[OPEN.len()..script.len() - CLOSE.len()];
    format!("{}{}{}", OPEN, escape_closing_tag(body, "</script"), CLOSE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(js: &str) -> DynamicAi {
        serde_json::from_value(json!({
            "content": { "html": "<p>hi</p>", "css": "p{color:red}", "js": js },
            "settings": { "speed": 2 }
        }))
        .unwrap()
    }

    #[test]
    fn style_id_prefers_payload_then_instance() {
        let mut block = payload("");
        block.content.id = Some("hero-1".into());
        assert_eq!(block.style_id(Some(&InstanceId::Number(5))), "hero-1");

        block.content.id = None;
        assert_eq!(block.style_id(Some(&InstanceId::Number(5))), "5");
    }

    #[test]
    fn generated_style_id_is_stable() {
        let block = payload("x()");
        let a = block.style_id(None);
        assert!(a.starts_with("dynamic-"));
        assert_eq!(a, block.clone().style_id(None));
        assert_ne!(a, payload("y()").style_id(None));
    }

    #[test]
    fn numeric_payload_id_is_read() {
        let block: DynamicAi = serde_json::from_value(json!({ "content": { "id": 9 } })).unwrap();
        assert_eq!(block.content.id.as_deref(), Some("9"));
        assert_eq!(block.settings(), json!({}));
    }

    #[test]
    fn fingerprint_tracks_settings() {
        let a = payload("run()");
        let mut b = a.clone();
        b.settings = json!({ "speed": 3 });
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }

    #[test]
    fn registry_acquire_replace_release() {
        let mut registry = StyleRegistry::new();
        registry.acquire("a", "p{}");
        registry.acquire("b", "div{}");
        registry.acquire("a", "span{}");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a"), Some("span{}"));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["a", "b"]);

        assert!(registry.release("a"));
        assert!(!registry.release("a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn style_tags_cannot_close_early() {
        let mut registry = StyleRegistry::new();
        registry.acquire("x", "a{}</STYLE><script>");
        let tags = registry.to_style_tags();
        assert_eq!(tags.matches("</style>").count(), 1);
        assert!(tags.contains("<\\/STYLE>"));
    }

    #[test]
    fn inline_scripts_wrap_in_try_catch() {
        let settings = json!({ "n": 1 });
        let call = ScriptCall {
            block_id: "b",
            container_id: "dynamic-ai-b",
            source: "container.textContent = '</script>';",
            settings: &settings,
        };
        let out = InlineScripts.run(&call).unwrap().unwrap();
        assert!(out.starts_with("<script>"));
        assert!(out.ends_with("</script>"));
        assert_eq!(out.matches("</script>").count(), 1);
        assert!(out.contains("try{"));
        assert!(out.contains(r#"getElementById("dynamic-ai-b")"#));
    }

    #[test]
    fn inline_scripts_keep_markup_out_of_data() {
        let settings = json!({ "a": "<!--<script>", "b": "</script><h2>x</h2>" });
        let call = ScriptCall {
            block_id: "b",
            container_id: "dynamic-ai-<b>",
            source: "container.dataset.ok = settings.a;",
            settings: &settings,
        };
        let out = InlineScripts.run(&call).unwrap().unwrap();
        let body = &out["<script>".len()..out.len() - "</script>".len()];
        assert!(!body.contains('<'));
        assert!(body.contains(r#"var settings={"a":"\u003c!--\u003cscript>""#));
        assert!(body.contains(r#"getElementById("dynamic-ai-\u003cb>")"#));
        assert_eq!(out.matches("</script>").count(), 1);
    }

    #[test]
    fn inline_scripts_reject_comment_openers() {
        let settings = json!({});
        let call = ScriptCall {
            block_id: "b",
            container_id: "c",
            source: "<!-- x",
            settings: &settings,
        };
        assert!(matches!(
            InlineScripts.run(&call),
            Err(PageError::ScriptRejected { .. })
        ));
    }

    #[test]
    fn disabled_scripts_emit_nothing() {
        let settings = json!({});
        let call = ScriptCall {
            block_id: "b",
            container_id: "c",
            source: "alert(1)",
            settings: &settings,
        };
        assert_eq!(DisabledScripts.run(&call).unwrap(), None);
    }
}
