//! # nestedtext
//!
//! Pure-Rust loader and dumper for **NestedText**, a human-friendly data
//! format whose values are limited to nested mappings, ordered sequences,
//! and opaque strings. No value ever needs quoting or escaping, so
//! arbitrary text — code, regexes, prose — can be embedded directly.
//!
//! This crate is the NestedText *core*: it turns bytes into a [`Value`]
//! tree (with a precise source-location map, if requested) and renders a
//! tree back to canonical NestedText. It performs no type inference —
//! every scalar is a `String` on load and a `String` on dump — and does no
//! file I/O, schema validation, or JSON/YAML/CSV conversion; those are
//! jobs for collaborators built on top of this crate.
//!
//! ## Quick start
//!
//! ```rust
//! use nestedtext::{load_str, dump, LoadOptions};
//!
//! let doc = "name: Katheryn McDaniel\nphone: 1-210-555-5297";
//! let value = load_str(doc, &LoadOptions::default()).unwrap().unwrap();
//! assert_eq!(value.get("name").unwrap().as_str(), Some("Katheryn McDaniel"));
//!
//! let rendered = dump(&value, &Default::default()).unwrap();
//! assert_eq!(rendered, doc);
//! ```
//!
//! ## Modules
//!
//! - [`value`] — the `Value` tree (`String`/`Sequence`/`Mapping`) and key-paths
//! - [`line`] — the line classifier: CR/LF/CRLF splitting, per-line classification
//! - [`inline`] — the inline `{...}`/`[...]` grammar
//! - [`block`] — the block parser: indentation, nesting, multiline keys/strings
//! - [`keymap`] — `Location`, `Keymap`, and key-path utility operations
//! - [`loader`] — the public `load`/`load_str` entry points
//! - [`dumper`] — the public `dump` entry point and its rendering options
//! - [`error`] — `ParseError` and `DumpError`

pub mod block;
pub mod dumper;
pub mod error;
pub mod inline;
pub mod keymap;
pub mod line;
pub mod loader;
pub mod value;

pub use dumper::{dump, DumpNode, DumpOptions};
pub use error::{DumpError, DumpErrorKind, ParseError, ParseErrorKind};
pub use keymap::{Keymap, Location};
pub use loader::{load, load_str, load_str_with_keymap, load_with_keymap, LoadOptions, OnDup, Top};
pub use value::{KeyPath, KeyPathSegment, Value};
