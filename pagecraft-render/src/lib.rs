//! # Pagecraft page model and renderer
//!
//! Pages are stored as an ordered JSON array of component instances
//! (`{ "id", "type", "props" }`). This crate decodes that content, resolves each
//! instance against the built-in component kinds, and renders HTML.
//!
//! ## Features
//! - Lenient decoding of stored page content and component schemas
//! - Schema normalization (adds the `extraClasses` property)
//! - Arbitrary-value utility classes (`p-[12]`, `text-[#ff0000]`) turned into
//!   class names or inline styles
//! - Generated (`dynamic-ai`) blocks with per-block style ownership and a
//!   pluggable script runner
//!
//! ## Example
//! ```
//! use pagecraft_render::{render_page, PageContent};
//! use serde_json::json;
//!
//! let content = PageContent::normalize(&json!([
//!     { "id": 1, "type": "heading", "props": { "text": "Welcome" } },
//!     { "id": 2, "type": "not-a-type", "props": {} }
//! ]))
//! .unwrap();
//!
//! let page = render_page(&content, &json!({}));
//! assert_eq!(page.len(), 2);
//! assert!(page.nodes[1].html.contains("Unknown component type: not-a-type"));
//! ```

pub mod components;
pub mod content;
pub mod dynamic;
pub mod error;
pub mod host;
pub mod html;
pub mod media;
pub mod schema;
pub mod tailwind;

// --- Core types ---
pub use components::{Block, BlockKind};
pub use content::{ComponentInstance, InstanceId, PageContent};
pub use error::{PageError, PageResult};
pub use host::{render_page, NodeKind, RenderHost, RenderedNode, RenderedPage};

// --- Schemas ---
pub use schema::{
    decode_schema, editor_fields, normalize_schema, ComponentSchema, EditorField, NormalizedSchema,
    PropertyKind, SchemaChange, EXTRA_CLASSES_FIELD,
};

// --- Generated blocks and media ---
pub use dynamic::{DisabledScripts, InlineScripts, ScriptCall, ScriptRunner, StyleRegistry};
pub use media::{BaseUrlResolver, MediaRef, MediaResolver};
