//! Arbitrary-value ("bracket") utility classes.
//!
//! Components accept a free-form `extraClasses` string. Utilities written as
//! `prefix-[value]` carry literal CSS values that a prebuilt stylesheet cannot
//! know about, so they are either rewritten into a cleaned class name or pulled
//! out into inline declarations.
//!
//! ## Usage
//! ```
//! use pagecraft_render::tailwind::{extract_arbitrary_styles, normalize_arbitrary_classes};
//!
//! assert_eq!(normalize_arbitrary_classes("flex p-[12]"), "flex p-12px");
//!
//! let out = extract_arbitrary_styles("rounded text-[#ff0000]");
//! assert_eq!(out.to_css(), "color:#ff0000;");
//! assert_eq!(out.remaining_classes, "rounded");
//! ```

pub mod arbitrary;
pub mod parser;

pub use arbitrary::{extract_arbitrary_styles, normalize_arbitrary_classes, ExtractedStyles};
pub use parser::{parse_bracket_token, split_classes, BracketToken};
