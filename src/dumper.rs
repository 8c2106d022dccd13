//! The dumper — renders a tree back to canonical NestedText.
//!
//! `Value` is a closed three-case enum (`String`/`Sequence`/`Mapping`), so
//! `dump` itself never has to convert anything: a `Value` is already one
//! of those three shapes by construction. The [`DumpNode`] trait is the
//! seam for collaborators whose own tree type carries richer leaves
//! (numbers, booleans, dates) that aren't a `Value` yet — `dump` accepts
//! any `DumpNode`, and for a node that isn't already a `Value` it consults
//! `DumpOptions::converters` (keyed by [`DumpNode::type_tag`]) and falls
//! back to `DumpOptions::default` (a [`LeafPolicy`]) before giving up with
//! `DumpErrorKind::UnsupportedType`.

use std::borrow::Cow;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{DumpError, DumpErrorKind};
use crate::keymap::Keymap;
use crate::value::{KeyPath, KeyPathSegment, Value};

/// A leaf-conversion hook, keyed by a caller-chosen type tag, for
/// collaborators whose own tree type has leaves this crate doesn't know
/// how to render natively. Consulted by [`dump`] for any [`DumpNode`] that
/// isn't already a `Value`; see [`DumpNode::type_tag`].
pub type ConverterFn = Rc<dyn Fn(&KeyPath) -> Option<Value>>;

/// A node `dump` can render: either a `Value` directly, or a foreign leaf
/// type a collaborator resolves into one via `DumpOptions::converters`/
/// `DumpOptions::default`.
///
/// `Value` itself implements this trivially. A collaborator crate with its
/// own tree type (say, one with numeric or boolean leaves) implements this
/// for its leaf type, returning `None` from `as_value` and a stable tag
/// from `type_tag` that a `ConverterFn` registered under the same tag
/// knows how to handle.
pub trait DumpNode {
    /// `Some(self)` when this node already is a `Value` — the only case
    /// `dump` can resolve without consulting `converters`/`default`.
    fn as_value(&self) -> Option<&Value> {
        None
    }

    /// The tag `DumpOptions::converters` is keyed by for this node's
    /// concrete type, when `as_value` returns `None`.
    fn type_tag(&self) -> &'static str {
        ""
    }
}

impl DumpNode for Value {
    fn as_value(&self) -> Option<&Value> {
        Some(self)
    }
}

/// What to do with a leaf `dump` cannot convert to a `Value` via
/// `DumpOptions::converters`. `Strict` rejects it; `Fallback` supplies a
/// replacement string keyed by the node's key-path.
#[derive(Clone)]
pub enum LeafPolicy {
    Strict,
    Fallback(Rc<dyn Fn(&KeyPath) -> String>),
}

/// How a mapping's entries are ordered before rendering (the `sort_keys`
/// option).
#[derive(Clone)]
pub enum SortKeys {
    /// Preserve the mapping's insertion order.
    Off,
    /// Sort lexicographically by each entry's rendered key.
    On,
    /// Sort by the string a caller-supplied comparator derives from
    /// `(original_key, parent_key_path)`.
    By(Rc<dyn Fn(&str, &KeyPath) -> String>),
}

/// How a mapping key is rewritten for display (the `map_keys` option).
#[derive(Clone)]
pub enum MapKeys {
    /// `(rendered_key, parent_key_path) -> rendered_key`.
    Callback(Rc<dyn Fn(&str, &KeyPath) -> String>),
    /// Recover each key's original raw source text from a keymap produced
    /// by a prior `load_str_with_keymap` call.
    Keymap(Keymap),
}

/// Options controlling one `dump` call.
#[derive(Clone)]
pub struct DumpOptions {
    /// Spaces per nesting level. Must be >= 2.
    pub indent: usize,
    /// Maximum width (in `char`s) of an inline rendering still considered
    /// for use in place of block form. `0` disables inline output
    /// entirely (except where block form cannot express the value at
    /// all, e.g. an empty mapping/sequence, which always renders inline).
    pub width: usize,
    /// Depth (root = 0) at or beyond which a subtree is force-rendered
    /// inline regardless of `width`. `None` means "never force."
    pub inline_level: Option<usize>,
    pub sort_keys: SortKeys,
    pub map_keys: Option<MapKeys>,
    pub converters: HashMap<&'static str, ConverterFn>,
    pub default: LeafPolicy,
}

impl Default for DumpOptions {
    fn default() -> Self {
        DumpOptions {
            indent: 4,
            width: 0,
            inline_level: None,
            sort_keys: SortKeys::Off,
            map_keys: None,
            converters: HashMap::new(),
            default: LeafPolicy::Strict,
        }
    }
}

impl DumpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(mut self, n: usize) -> Self {
        self.indent = n;
        self
    }

    pub fn width(mut self, n: usize) -> Self {
        self.width = n;
        self
    }

    pub fn inline_level(mut self, depth: usize) -> Self {
        self.inline_level = Some(depth);
        self
    }

    pub fn sort_keys(mut self, sort_keys: SortKeys) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    pub fn map_keys(mut self, map_keys: MapKeys) -> Self {
        self.map_keys = Some(map_keys);
        self
    }

    /// Register a converter for foreign leaves tagged `type_tag` by
    /// [`DumpNode::type_tag`]. Replaces any converter already registered
    /// under that tag.
    pub fn converter(mut self, type_tag: &'static str, f: ConverterFn) -> Self {
        self.converters.insert(type_tag, f);
        self
    }

    /// What to do with a foreign leaf no registered converter resolves.
    pub fn default_leaf_policy(mut self, policy: LeafPolicy) -> Self {
        self.default = policy;
        self
    }
}

/// Render `value` to canonical NestedText per `opts`.
///
/// `value` is usually a [`Value`]; it may be any [`DumpNode`], in which
/// case a node that isn't already a `Value` is resolved via
/// `opts.converters`/`opts.default` before rendering.
pub fn dump<N: DumpNode>(value: &N, opts: &DumpOptions) -> Result<String, DumpError> {
    if opts.indent < 2 {
        return Err(DumpError::new(
            DumpErrorKind::InvalidOption,
            format!("indent must be >= 2, got {}", opts.indent),
            Vec::new(),
        ));
    }
    let mut path: KeyPath = Vec::new();
    let resolved = resolve_node(value, &path, opts)?;
    render_top(&resolved, &mut path, opts)
}

/// Resolve any `DumpNode` to a `Value`, borrowing when it already is one so
/// the common `dump(&Value, _)` path never pays for a clone.
fn resolve_node<'a, N: DumpNode>(value: &'a N, path: &KeyPath, opts: &DumpOptions) -> Result<Cow<'a, Value>, DumpError> {
    if let Some(v) = value.as_value() {
        return Ok(Cow::Borrowed(v));
    }
    let tag = value.type_tag();
    if let Some(convert) = opts.converters.get(tag) {
        if let Some(v) = convert(path) {
            return Ok(Cow::Owned(v));
        }
    }
    match &opts.default {
        LeafPolicy::Strict => Err(DumpError::new(
            DumpErrorKind::UnsupportedType,
            format!("unsupported type {tag:?} at {}", KeyPathSegment::join(path, ".")),
            path.clone(),
        )),
        LeafPolicy::Fallback(f) => Ok(Cow::Owned(Value::String(f(path)))),
    }
}

/// What a child value renders as, from its parent's point of view: text
/// that can follow `- `/`key: ` on the same line, or a block that needs
/// its own indented frame below a bare `-`/`key:` line.
enum ChildRender {
    RestOfLine(String),
    Block(String),
}

fn render_top(value: &Value, path: &mut KeyPath, opts: &DumpOptions) -> Result<String, DumpError> {
    match value {
        Value::Mapping(entries) if entries.is_empty() => Ok("{}".to_string()),
        Value::Sequence(items) if items.is_empty() => Ok("[]".to_string()),
        Value::String(s) => Ok(render_multiline_string_block(s, 0, opts)),
        _ => match render_container(value, 0, path, opts)? {
            ChildRender::RestOfLine(s) => Ok(s),
            ChildRender::Block(s) => Ok(s),
        },
    }
}

/// Decide how a non-empty `Mapping`/`Sequence` at `depth` should render:
/// inline if `inline_level` forces it or the inline form fits `width`,
/// block otherwise. This is deterministic — no lookahead beyond this one
/// subtree.
fn render_container(
    value: &Value,
    depth: usize,
    path: &mut KeyPath,
    opts: &DumpOptions,
) -> Result<ChildRender, DumpError> {
    let force_inline = opts.inline_level.is_some_and(|lvl| depth >= lvl);
    if force_inline {
        let rendered = render_inline(value, false)
            .map_err(|_| unrepresentable(path, "value forced inline by inline_level contains a character forbidden in inline context"))?;
        return Ok(ChildRender::RestOfLine(rendered));
    }
    if opts.width > 0 {
        if let Ok(candidate) = render_inline(value, false) {
            if candidate.chars().count() <= opts.width {
                return Ok(ChildRender::RestOfLine(candidate));
            }
        }
    }
    Ok(ChildRender::Block(render_block_container(value, depth, path, opts)?))
}

fn render_block_container(
    value: &Value,
    depth: usize,
    path: &mut KeyPath,
    opts: &DumpOptions,
) -> Result<String, DumpError> {
    match value {
        Value::Mapping(entries) => render_mapping_block(entries, depth, path, opts),
        Value::Sequence(items) => render_sequence_block(items, depth, path, opts),
        Value::String(s) => Ok(render_multiline_string_block(s, depth, opts)),
    }
}

/// Decide how one child node (a mapping entry's value or a sequence
/// item) renders, given the child's own nesting `depth`.
fn render_child(
    value: &Value,
    depth: usize,
    path: &mut KeyPath,
    opts: &DumpOptions,
) -> Result<ChildRender, DumpError> {
    match value {
        Value::String(s) if s.contains('\n') => {
            Ok(ChildRender::Block(render_multiline_string_block(s, depth, opts)))
        }
        Value::String(s) => Ok(ChildRender::RestOfLine(s.clone())),
        Value::Sequence(items) if items.is_empty() => Ok(ChildRender::RestOfLine("[]".to_string())),
        Value::Mapping(entries) if entries.is_empty() => Ok(ChildRender::RestOfLine("{}".to_string())),
        _ => render_container(value, depth, path, opts),
    }
}

/// Render the child of a multiline key. This child must be a non-leaf or
/// a multiline string — a rest-of-line value is never allowed here,
/// because a multiline key consumes the rest of its own line already.
fn render_multiline_key_child(
    value: &Value,
    depth: usize,
    path: &mut KeyPath,
    opts: &DumpOptions,
) -> Result<String, DumpError> {
    match value {
        Value::String(s) => Ok(render_multiline_string_block(s, depth, opts)),
        Value::Sequence(items) if items.is_empty() => {
            Err(unrepresentable(path, "an empty sequence cannot be paired with a multiline key — it has no block form"))
        }
        Value::Mapping(entries) if entries.is_empty() => {
            Err(unrepresentable(path, "an empty mapping cannot be paired with a multiline key — it has no block form"))
        }
        _ => render_block_container(value, depth, path, opts),
    }
}

fn render_mapping_block(
    entries: &[(String, Value)],
    depth: usize,
    path: &mut KeyPath,
    opts: &DumpOptions,
) -> Result<String, DumpError> {
    let ordered = order_entries(entries, path, opts)?;
    let indent_str = " ".repeat(depth * opts.indent);
    let mut lines: Vec<String> = Vec::new();

    for (rendered_key, value, original_key) in ordered {
        path.push(KeyPathSegment::Key(original_key));

        if is_simple_key(&rendered_key) {
            match render_child(value, depth + 1, path, opts)? {
                ChildRender::RestOfLine(s) if s.is_empty() => {
                    lines.push(format!("{indent_str}{rendered_key}:"));
                }
                ChildRender::RestOfLine(s) => {
                    lines.push(format!("{indent_str}{rendered_key}: {s}"));
                }
                ChildRender::Block(block) => {
                    lines.push(format!("{indent_str}{rendered_key}:"));
                    lines.push(block);
                }
            }
        } else {
            for fragment in split_key_fragments(&rendered_key) {
                if fragment.is_empty() {
                    lines.push(format!("{indent_str}:"));
                } else {
                    lines.push(format!("{indent_str}: {fragment}"));
                }
            }
            lines.push(render_multiline_key_child(value, depth + 1, path, opts)?);
        }

        path.pop();
    }

    Ok(lines.join("\n"))
}

fn render_sequence_block(
    items: &[Value],
    depth: usize,
    path: &mut KeyPath,
    opts: &DumpOptions,
) -> Result<String, DumpError> {
    let indent_str = " ".repeat(depth * opts.indent);
    let mut lines: Vec<String> = Vec::new();

    for (i, item) in items.iter().enumerate() {
        path.push(KeyPathSegment::Index(i));
        match render_child(item, depth + 1, path, opts)? {
            ChildRender::RestOfLine(s) if s.is_empty() => lines.push(format!("{indent_str}-")),
            ChildRender::RestOfLine(s) => lines.push(format!("{indent_str}- {s}")),
            ChildRender::Block(block) => {
                lines.push(format!("{indent_str}-"));
                lines.push(block);
            }
        }
        path.pop();
    }

    Ok(lines.join("\n"))
}

/// One `> ` line per line of `s` (a bare `>` for an empty line), at
/// `depth`'s indent. Used both for standalone multiline-string values and
/// for single-line strings that, for structural reasons (a multiline key,
/// or `inline_level`-forced block elsewhere), must render as a block.
fn render_multiline_string_block(s: &str, depth: usize, opts: &DumpOptions) -> String {
    let indent_str = " ".repeat(depth * opts.indent);
    s.split('\n')
        .map(|line| {
            if line.is_empty() {
                format!("{indent_str}>")
            } else {
                format!("{indent_str}> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a (possibly already-multiline) key into its `: fragment` lines.
/// A key with no embedded newline still becomes one fragment — it's
/// routed here because it failed [`is_simple_key`] for some other reason
/// (a forbidden leading character, a trailing bare colon, an embedded
/// `": "`), not because it spans multiple lines.
fn split_key_fragments(key: &str) -> Vec<&str> {
    if key.contains('\n') {
        key.split('\n').collect()
    } else {
        vec![key]
    }
}

/// A key safe to render as `key:` / `key: value` without multiline-key
/// syntax: no newline, no leading `- > : [ { #`, no trailing bare `:`, no
/// leading/trailing whitespace, and no embedded `": "` (which the loader
/// would otherwise mistake for the key/value separator).
fn is_simple_key(key: &str) -> bool {
    if key.is_empty() || key.contains('\n') {
        return false;
    }
    if key != key.trim() {
        return false;
    }
    if matches!(key.chars().next(), Some('-' | '>' | ':' | '[' | '{' | '#')) {
        return false;
    }
    if key.ends_with(':') || key.contains(": ") {
        return false;
    }
    true
}

/// Order a mapping's entries for rendering: apply `map_keys` to derive
/// each entry's display key, detect collisions among the resulting
/// display keys, then apply `sort_keys`. Returns `(display_key, value,
/// original_key)` triples — `original_key` is what gets pushed onto the
/// key-path, since key-path identity tracks the tree, not its rendering.
fn order_entries<'a>(
    entries: &'a [(String, Value)],
    path: &KeyPath,
    opts: &DumpOptions,
) -> Result<Vec<(String, &'a Value, String)>, DumpError> {
    let mut seen: HashMap<String, ()> = HashMap::with_capacity(entries.len());
    let mut items: Vec<(String, &Value, String)> = Vec::with_capacity(entries.len());

    for (key, value) in entries {
        let mut child_path = path.clone();
        child_path.push(KeyPathSegment::Key(key.clone()));

        let display_key = match &opts.map_keys {
            None => key.clone(),
            Some(MapKeys::Callback(f)) => f(key, path),
            Some(MapKeys::Keymap(km)) => match km.raw_path(&child_path).last() {
                Some(KeyPathSegment::Key(raw)) => raw.clone(),
                _ => key.clone(),
            },
        };

        if seen.insert(display_key.clone(), ()).is_some() {
            return Err(DumpError::new(
                DumpErrorKind::DuplicateKeyAfterNormalization,
                format!("duplicate key after normalization: {display_key}"),
                child_path,
            ));
        }

        items.push((display_key, value, key.clone()));
    }

    match &opts.sort_keys {
        SortKeys::Off => {}
        SortKeys::On => items.sort_by(|a, b| a.0.cmp(&b.0)),
        SortKeys::By(cmp) => {
            let mut keyed: Vec<(String, (String, &Value, String))> = items
                .into_iter()
                .map(|entry| {
                    let sort_key = cmp(&entry.2, path);
                    (sort_key, entry)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            items = keyed.into_iter().map(|(_, entry)| entry).collect();
        }
    }

    Ok(items)
}

/// Render `value` as a single-line inline `{...}`/`[...]` (or bare
/// string, for recursive calls on a leaf). `forbid_colon` is set while
/// recursing into a mapping's keys/values — colons are only disallowed in
/// inline strings that sit directly inside a mapping, not inside a nested
/// sequence.
fn render_inline(value: &Value, forbid_colon: bool) -> Result<String, ()> {
    match value {
        Value::String(s) => render_inline_string(s, forbid_colon),
        Value::Sequence(items) => {
            let parts: Result<Vec<String>, ()> = items.iter().map(|v| render_inline(v, false)).collect();
            Ok(format!("[{}]", parts?.join(", ")))
        }
        Value::Mapping(entries) => {
            let parts: Result<Vec<String>, ()> = entries
                .iter()
                .map(|(k, v)| {
                    let key = render_inline_string(k, true)?;
                    let val = render_inline(v, true)?;
                    Ok(format!("{key}: {val}"))
                })
                .collect();
            Ok(format!("{{{}}}", parts?.join(", ")))
        }
    }
}

/// An inline string value/key is re-trimmed by the inline parser on
/// reload (leading/trailing whitespace is stripped), so a leaf carrying
/// surrounding whitespace can't round-trip through inline form without
/// silently losing it. Reject it here — same as a forbidden character —
/// so the caller falls back to block form, which preserves it verbatim.
fn render_inline_string(s: &str, forbid_colon: bool) -> Result<String, ()> {
    let forbidden = |c: char| matches!(c, '[' | ']' | '{' | '}' | ',' | '\n') || (forbid_colon && c == ':');
    if s.chars().any(forbidden) || s != s.trim() {
        Err(())
    } else {
        Ok(s.to_string())
    }
}

fn unrepresentable(path: &KeyPath, reason: &str) -> DumpError {
    DumpError::new(DumpErrorKind::UnrepresentableInline, reason.to_string(), path.clone())
}
