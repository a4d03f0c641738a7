use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;

use crate::components::{Block, BlockKind};
use crate::content::{ComponentInstance, PageContent};
use crate::dynamic::{DisabledScripts, DynamicAi, ScriptCall, ScriptRunner, StyleRegistry};
use crate::error::PageError;
use crate::html::{self, escape_html, BlockContext};
use crate::media::{BaseUrlResolver, MediaResolver};

/// How one instance ended up on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Component(BlockKind),
    /// `type` has no renderer.
    Unknown(String),
    /// Known `type`, props could not be decoded.
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNode {
    pub key: String,
    pub kind: NodeKind,
    pub html: String,
}

/// Output of one render pass, in page order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedPage {
    pub nodes: Vec<RenderedNode>,
}

impl RenderedPage {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            out.push_str(&node.html);
            out.push('\n');
        }
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone)]
struct ScriptState {
    fingerprint: String,
    output: Option<String>,
}

/// Renders pages and keeps the side state of generated blocks between renders.
///
/// Style entries and script results are keyed by the generated block's id.
/// A render pass releases the entries of blocks that are no longer on the page,
/// and scripts only run again when their block's content or settings change.
pub struct RenderHost {
    media: Box<dyn MediaResolver>,
    scripts: Box<dyn ScriptRunner>,
    styles: StyleRegistry,
    script_state: HashMap<String, ScriptState>,
}

impl Default for RenderHost {
    fn default() -> Self {
        Self::new(BaseUrlResolver::default(), DisabledScripts)
    }
}

impl RenderHost {
    pub fn new(media: impl MediaResolver + 'static, scripts: impl ScriptRunner + 'static) -> Self {
        Self {
            media: Box::new(media),
            scripts: Box::new(scripts),
            styles: StyleRegistry::new(),
            script_state: HashMap::new(),
        }
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Render every instance in array order.
    ///
    /// Unknown types and undecodable props become placeholders; a failing block
    /// never stops the rest of the page.
    pub fn render_page(&mut self, content: &PageContent, page_data: &Value) -> RenderedPage {
        let mut claimed = HashSet::new();
        let mut nodes = Vec::with_capacity(content.len());
        for (index, instance) in content.iter().enumerate() {
            nodes.push(self.render_instance(index, instance, page_data, &mut claimed));
        }
        self.release_stale(&claimed);
        RenderedPage { nodes }
    }

    /// Drop every style entry and script result, as when the page goes away.
    pub fn unmount(&mut self) {
        self.styles.release_all();
        self.script_state.clear();
    }

    /// Full HTML document with the current style entries in the head.
    pub fn render_document(&self, title: &str, page: &RenderedPage) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{}</title>
{}</head>
<body>
<main class="pc-page">
{}</main>
</body>
</html>
"#,
            escape_html(title),
            self.styles.to_style_tags(),
            page.to_html()
        )
    }

    fn render_instance(
        &mut self,
        index: usize,
        instance: &ComponentInstance,
        page_data: &Value,
        claimed: &mut HashSet<String>,
    ) -> RenderedNode {
        let key = instance.render_key(index);
        let block = match Block::from_instance(instance) {
            Ok(block) => block,
            Err(err) => return self.invalid_node(key, &instance.kind, &err),
        };

        let mut out = String::new();
        let (kind, result) = match &block {
            Block::Unknown(type_key) => {
                tracing::warn!(key = %key, component_type = %type_key, "unknown component type");
                (NodeKind::Unknown(type_key.clone()), html::write_unknown(&key, type_key, &mut out))
            }
            Block::DynamicAi(payload) => {
                let result = self.render_dynamic(&key, instance, payload, claimed, &mut out);
                (NodeKind::Component(BlockKind::DynamicAi), result)
            }
            other => {
                let ctx = BlockContext {
                    key: &key,
                    page_data,
                    media: self.media.as_ref(),
                };
                let result = html::render_block(other, &ctx, &mut out);
                let kind = other
                    .kind()
                    .map_or_else(|| NodeKind::Unknown(instance.kind.clone()), NodeKind::Component);
                (kind, result)
            }
        };

        match result {
            Ok(()) => RenderedNode { key, kind, html: out },
            Err(_) => {
                let err = PageError::InvalidProps {
                    kind: instance.kind.clone(),
                    reason: "formatting failed".to_string(),
                };
                self.invalid_node(key, &instance.kind, &err)
            }
        }
    }

    fn invalid_node(&self, key: String, type_key: &str, err: &PageError) -> RenderedNode {
        tracing::warn!(key = %key, component_type = %type_key, error = %err, "invalid component props");
        RenderedNode {
            html: html::invalid_placeholder(&key, type_key),
            key,
            kind: NodeKind::Invalid(type_key.to_string()),
        }
    }

    fn render_dynamic(
        &mut self,
        key: &str,
        instance: &ComponentInstance,
        payload: &DynamicAi,
        claimed: &mut HashSet<String>,
        out: &mut String,
    ) -> std::fmt::Result {
        let block_id = payload.style_id(instance.id.as_ref());
        let container_id = format!("dynamic-ai-{}", block_id);
        let body = payload.content.html.as_deref().unwrap_or_default();

        // Each id has one owner per pass; later duplicates render without side effects.
        if !claimed.insert(block_id.clone()) {
            tracing::warn!(key, block = %block_id, "generated block id already used on this page");
            return html::write_dynamic(key, &container_id, body, None, out);
        }

        match payload.content.css.as_deref().filter(|css| !css.trim().is_empty()) {
            Some(css) => self.styles.acquire(&block_id, css),
            None => {
                self.styles.release(&block_id);
            }
        }

        let script = self.run_script(&block_id, &container_id, payload);
        html::write_dynamic(key, &container_id, body, script.as_deref(), out)
    }

    fn run_script(&mut self, block_id: &str, container_id: &str, payload: &DynamicAi) -> Option<String> {
        let Some(source) = payload.content.js.as_deref().filter(|js| !js.trim().is_empty()) else {
            self.script_state.remove(block_id);
            return None;
        };

        let fingerprint = payload.fingerprint();
        if let Some(state) = self.script_state.get(block_id) {
            if state.fingerprint == fingerprint {
                return state.output.clone();
            }
        }

        let settings = payload.settings();
        let call = ScriptCall {
            block_id,
            container_id,
            source,
            settings: &settings,
        };
        let runner = self.scripts.as_ref();
        let output = match catch_unwind(AssertUnwindSafe(|| runner.run(&call))) {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                tracing::error!(block = block_id, error = %err, "generated block script failed");
                None
            }
            Err(_) => {
                let err = PageError::ScriptFailed {
                    instance: block_id.to_string(),
                    message: "script runner panicked".to_string(),
                };
                tracing::error!(block = block_id, error = %err, "generated block script failed");
                None
            }
        };

        self.script_state.insert(
            block_id.to_string(),
            ScriptState {
                fingerprint,
                output: output.clone(),
            },
        );
        output
    }

    fn release_stale(&mut self, claimed: &HashSet<String>) {
        let stale: Vec<String> = self
            .styles
            .ids()
            .filter(|id| !claimed.contains(*id))
            .map(str::to_string)
            .collect();
        for id in stale {
            self.styles.release(&id);
        }
        self.script_state.retain(|id, _| claimed.contains(id));
    }
}

/// Render `content` once with default settings: no media base URL and
/// scripts disabled.
pub fn render_page(content: &PageContent, page_data: &Value) -> RenderedPage {
    RenderHost::default().render_page(content, page_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageResult;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingScripts(Rc<Cell<usize>>);

    impl ScriptRunner for CountingScripts {
        fn run(&self, _call: &ScriptCall<'_>) -> PageResult<Option<String>> {
            self.0.set(self.0.get() + 1);
            Ok(Some("<script>ran()</script>".to_string()))
        }
    }

    fn dynamic(id: i64, css: &str, js: &str) -> Value {
        json!({ "id": id, "type": "dynamic-ai", "props": { "content": { "html": "<p>gen</p>", "css": css, "js": js } } })
    }

    #[test]
    fn keeps_page_order_and_placeholders() {
        let content = PageContent::normalize(&json!([
            { "id": 1, "type": "heading", "props": { "text": "Hi" } },
            { "id": 2, "type": "not-a-type", "props": {} },
            { "id": 3, "type": "heading", "props": { "level": 12 } }
        ]))
        .unwrap();
        let page = render_page(&content, &Value::Null);
        let kinds: Vec<_> = page.nodes.iter().map(|n| n.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Component(BlockKind::Heading),
                NodeKind::Unknown("not-a-type".into()),
                NodeKind::Invalid("heading".into()),
            ]
        );
        assert!(page.nodes[2].html.contains("Invalid props for component type: heading"));
    }

    #[test]
    fn script_runs_once_per_content_change() {
        let count = Rc::new(Cell::new(0));
        let mut host = RenderHost::new(BaseUrlResolver::default(), CountingScripts(count.clone()));

        let first = PageContent::normalize(&json!([dynamic(7, "p{}", "go()")])).unwrap();
        let page = host.render_page(&first, &Value::Null);
        host.render_page(&first, &Value::Null);
        assert_eq!(count.get(), 1);
        assert!(page.nodes[0].html.ends_with("<script>ran()</script>"));

        let changed = PageContent::normalize(&json!([dynamic(7, "p{}", "stop()")])).unwrap();
        host.render_page(&changed, &Value::Null);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn stale_styles_are_released() {
        let mut host = RenderHost::default();
        let both = PageContent::normalize(&json!([dynamic(1, "a{}", ""), dynamic(2, "b{}", "")])).unwrap();
        host.render_page(&both, &Value::Null);
        assert_eq!(host.styles().len(), 2);

        let one = PageContent::normalize(&json!([dynamic(2, "b{}", "")])).unwrap();
        host.render_page(&one, &Value::Null);
        assert_eq!(host.styles().ids().collect::<Vec<_>>(), vec!["2"]);

        host.unmount();
        assert!(host.styles().is_empty());
    }

    #[test]
    fn document_includes_style_tags() {
        let mut host = RenderHost::default();
        let content = PageContent::normalize(&json!([dynamic(4, ".x{color:red}", "")])).unwrap();
        let page = host.render_page(&content, &Value::Null);
        let doc = host.render_document("Home & Garden", &page);
        assert!(doc.contains("<title>Home &amp; Garden</title>"));
        assert!(doc.contains("<style data-dynamic-id=\"4\">.x{color:red}</style>"));
        assert!(doc.contains("id=\"dynamic-ai-4\""));
    }
}
