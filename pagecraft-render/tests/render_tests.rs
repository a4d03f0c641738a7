use pagecraft_render::dynamic::ScriptCall;
use pagecraft_render::tailwind::{extract_arbitrary_styles, normalize_arbitrary_classes, split_classes};
use pagecraft_render::{
    editor_fields, normalize_schema, render_page, BaseUrlResolver, BlockKind, InlineScripts, NodeKind,
    PageContent, PageError, PageResult, PropertyKind, RenderHost, SchemaChange, ScriptRunner,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

fn fixture_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("fixtures");
    path.push(filename);
    path
}

fn load_fixture(filename: &str) -> Value {
    let text = fs::read_to_string(fixture_path(filename)).unwrap();
    serde_json::from_str(&text).unwrap()
}

// Page rendering

#[test]
fn test_unknown_type_renders_placeholder() {
    let content = PageContent::normalize(&load_fixture("unknown-type.json")).unwrap();
    let page = render_page(&content, &json!({}));

    assert_eq!(page.len(), 2);
    assert_eq!(page.nodes[0].kind, NodeKind::Component(BlockKind::Heading));
    assert!(page.nodes[0].html.starts_with("<h2"));
    assert!(page.nodes[0].html.contains(">Hi</h2>"));
    assert_eq!(page.nodes[1].kind, NodeKind::Unknown("not-a-type".into()));
    assert!(page.nodes[1].html.contains("Unknown component type: not-a-type"));
}

#[test]
fn test_every_kind_renders_in_order() {
    let content = PageContent::normalize(&load_fixture("all-kinds.json")).unwrap();
    let mut host = RenderHost::new(BaseUrlResolver::new(Some("https://cdn.test")), InlineScripts);
    let page = host.render_page(&content, &load_fixture("products.json"));

    let keys: Vec<_> = page.nodes.iter().map(|n| n.key.as_str()).collect();
    let expected: Vec<String> = (1..=13).map(|i| i.to_string()).collect();
    assert_eq!(keys, expected.iter().map(String::as_str).collect::<Vec<_>>());

    let kinds: Vec<_> = page.nodes.iter().map(|n| n.kind.clone()).collect();
    let expected_kinds: Vec<_> = BlockKind::ALL.into_iter().map(NodeKind::Component).collect();
    assert_eq!(kinds, expected_kinds);
}

#[test]
fn test_all_kinds_output_details() {
    let content = PageContent::normalize(&load_fixture("all-kinds.json")).unwrap();
    let mut host = RenderHost::new(BaseUrlResolver::new(Some("https://cdn.test")), InlineScripts);
    let page = host.render_page(&content, &load_fixture("products.json"));
    let html = page.to_html();

    assert!(html.contains("<h1 data-component-id=\"1\" class=\"pc-heading tracking-tight\" style=\"margin-bottom:24px;\">Welcome</h1>"));
    assert!(html.contains("<strong>things</strong>"));
    assert!(html.contains("href=\"/signup\""));
    assert!(html.contains("src=\"https://cdn.test/uploads/team.jpg\""));
    assert!(html.contains("height:48px;"));
    assert!(html.contains("background-image:url(&quot;https://cdn.test/media/12&quot;)"));
    assert!(html.contains("data-icon=\"shield\""));
    assert!(html.contains("<cite>Sam</cite>"));
    assert!(html.contains("19.50<span class=\"pc-plan__period\">/month</span>"));
    assert!(html.contains("<h3><a href=\"/shop/mug\">Mug</a></h3>"));
    assert!(html.contains("€8"));
    assert!(html.contains("<div class=\"promo\">Sale</div>"));
    assert!(html.contains("getElementById(\"dynamic-ai-promo\")"));
    assert_eq!(host.styles().get("promo"), Some(".promo{color:red}"));
}

#[test]
fn test_invalid_props_do_not_stop_the_page() {
    let content = PageContent::normalize(&json!([
        { "id": 1, "type": "image", "props": { "width": "wide" } },
        { "id": 2, "type": "divider", "props": {} }
    ]))
    .unwrap();
    let page = render_page(&content, &Value::Null);

    assert_eq!(page.nodes[0].kind, NodeKind::Invalid("image".into()));
    assert!(page.nodes[0].html.contains("Invalid props for component type: image"));
    assert_eq!(page.nodes[1].kind, NodeKind::Component(BlockKind::Divider));
}

#[test]
fn test_duplicate_ids_fail_validation() {
    let content = PageContent::normalize(&load_fixture("duplicate-ids.json")).unwrap();
    assert_eq!(content.validate(), Err(PageError::DuplicateId { id: "a".into() }));
}

// Generated blocks

struct FailingScripts;

impl ScriptRunner for FailingScripts {
    fn run(&self, call: &ScriptCall<'_>) -> PageResult<Option<String>> {
        Err(PageError::ScriptFailed {
            instance: call.block_id.to_string(),
            message: "boom".into(),
        })
    }
}

struct PanickingScripts;

impl ScriptRunner for PanickingScripts {
    fn run(&self, _call: &ScriptCall<'_>) -> PageResult<Option<String>> {
        panic!("runner bug")
    }
}

fn page_with_script() -> PageContent {
    PageContent::normalize(&json!([
        { "id": 1, "type": "dynamic-ai", "props": { "content": { "html": "<b>x</b>", "js": "throw new Error()" } } },
        { "id": 2, "type": "heading", "props": { "text": "After" } }
    ]))
    .unwrap()
}

#[test]
fn test_script_errors_are_contained() {
    let mut host = RenderHost::new(BaseUrlResolver::default(), FailingScripts);
    let page = host.render_page(&page_with_script(), &Value::Null);

    assert_eq!(page.len(), 2);
    assert_eq!(page.nodes[0].html, "<div data-component-id=\"1\" class=\"pc-dynamic\" id=\"dynamic-ai-1\"><b>x</b></div>");
    assert!(page.nodes[1].html.contains("After"));
}

#[test]
fn test_script_panics_are_contained() {
    let mut host = RenderHost::new(BaseUrlResolver::default(), PanickingScripts);
    let page = host.render_page(&page_with_script(), &Value::Null);
    assert_eq!(page.len(), 2);
    assert!(page.nodes[1].html.contains("After"));
}

#[test]
fn test_script_settings_cannot_swallow_siblings() {
    let content = PageContent::normalize(&json!([
        { "id": 1, "type": "dynamic-ai", "props": {
            "content": { "html": "<i>x</i>", "js": "container.title = settings.a;" },
            "settings": { "a": "<!--<script>" }
        } },
        { "id": 2, "type": "heading", "props": { "text": "After" } }
    ]))
    .unwrap();
    let mut host = RenderHost::new(BaseUrlResolver::default(), InlineScripts);
    let html = host.render_page(&content, &Value::Null).to_html();

    let script_start = html.find("<script>").unwrap() + "<script>".len();
    let script_end = html.find("</script>").unwrap();
    assert!(!html[script_start..script_end].contains('<'));
    assert!(html[script_end..].contains(">After</h2>"));
}

#[test]
fn test_scripts_are_disabled_by_default() {
    let page = render_page(&page_with_script(), &Value::Null);
    assert!(!page.to_html().contains("<script"));
}

#[test]
fn test_style_lifecycle_across_renders() {
    let mut host = RenderHost::default();
    let with_css = |css: &str| {
        PageContent::normalize(&json!([
            { "id": "gen", "type": "dynamic-ai", "props": { "content": { "html": "", "css": css } } }
        ]))
        .unwrap()
    };

    host.render_page(&with_css("a{}"), &Value::Null);
    assert_eq!(host.styles().get("gen"), Some("a{}"));

    host.render_page(&with_css("b{}"), &Value::Null);
    assert_eq!(host.styles().get("gen"), Some("b{}"));
    assert_eq!(host.styles().len(), 1);

    host.render_page(&with_css(""), &Value::Null);
    assert!(host.styles().is_empty());

    host.render_page(&with_css("c{}"), &Value::Null);
    host.render_page(&PageContent::default(), &Value::Null);
    assert!(host.styles().is_empty());
}

#[test]
fn test_document_wraps_page() {
    let content = PageContent::normalize(&load_fixture("unknown-type.json")).unwrap();
    let mut host = RenderHost::default();
    let page = host.render_page(&content, &Value::Null);
    let doc = host.render_document("Home", &page);
    assert!(doc.starts_with("<!DOCTYPE html>"));
    assert!(doc.contains("<title>Home</title>"));
    assert!(doc.contains("<main class=\"pc-page\">"));
}

// Schemas

#[test]
fn test_legacy_string_schema_normalizes() {
    let normalized = normalize_schema(&load_fixture("legacy-schema.json")).unwrap();
    assert_eq!(normalized.change, SchemaChange::AddedExtraClasses);
    assert_eq!(
        normalized.schema.to_value(),
        json!({
            "properties": {
                "color": { "type": "text" },
                "extraClasses": {
                    "type": "text",
                    "label": "Tailwind Classes",
                    "default": null,
                    "description": "Additional Tailwind CSS classes to apply to the component"
                }
            }
        })
    );
}

#[test]
fn test_normalize_is_idempotent() {
    for fixture in ["legacy-schema.json", "canonical-schema.json"] {
        let once = normalize_schema(&load_fixture(fixture)).unwrap();
        let twice = normalize_schema(&once.schema.to_value()).unwrap();
        assert_eq!(twice.schema, once.schema);
        assert_eq!(twice.change, SchemaChange::AlreadyPresent);
    }
}

#[test]
fn test_existing_extra_classes_untouched() {
    let raw = load_fixture("canonical-schema.json");
    let normalized = normalize_schema(&raw).unwrap();
    assert_eq!(normalized.change, SchemaChange::AlreadyPresent);
    assert_eq!(
        normalized.schema.properties["extraClasses"],
        raw["properties"]["extraClasses"]
    );
}

#[test]
fn test_editor_fields_follow_schema_order() {
    let normalized = normalize_schema(&load_fixture("canonical-schema.json")).unwrap();
    let fields = editor_fields(&normalized.schema);
    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["title", "layout", "extraClasses"]);
    assert_eq!(fields[1].kind, PropertyKind::Select);
    assert_eq!(fields[1].options, vec![json!("wide"), json!("narrow")]);
}

// Arbitrary-value classes

#[test]
fn test_bracket_scenarios() {
    assert_eq!(normalize_arbitrary_classes("p-[12]"), "p-12px");

    let out = extract_arbitrary_styles("text-[#ff0000]");
    assert_eq!(out.styles, vec![("color".to_string(), "#ff0000".to_string())]);
    assert_eq!(out.remaining_classes, "");
}

#[test]
fn test_normalize_keeps_every_token() {
    let input = "flex w-[50%] p-[ 8 ] text-[red] mx-auto";
    let output = normalize_arbitrary_classes(input);
    assert_eq!(output, "flex w-50% p-8px text-red mx-auto");
    assert_eq!(split_classes(&output).len(), split_classes(input).len());
}
