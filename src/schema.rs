//! A read-only view over a precompiled message schema.
//!
//! The compiler and evaluator never inspect a code-generated schema
//! directly; they go through [`MessageDescriptor`] and [`SchemaRegistry`].
//! Populating a registry -- the analogue of loading a generated shared
//! object and pulling descriptors out of it by symbol name -- is the
//! caller's job; this module only owns the lookup contract.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::SchemaError;

/// Whether a field holds a scalar value or a nested message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// A scalar (int, float, string, bytes, ...). The wire format does not
    /// distinguish scalar subtypes at this layer; that's left to filter
    /// comparison (see [`crate::item::Item`]).
    Scalar,
    /// A nested message, together with its descriptor.
    Message(MessageDescriptor),
}

#[derive(Debug)]
struct FieldDescriptorInner {
    name: String,
    tag: u32,
    kind: FieldKind,
}

/// A single field of a [`MessageDescriptor`]: its name, wire tag, and kind.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    inner: Arc<FieldDescriptorInner>,
}

impl FieldDescriptor {
    /// The field's name, as it appears in query strings.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The field's wire tag (its `field_number`).
    pub fn tag(&self) -> u32 {
        self.inner.tag
    }

    /// Whether the field is a scalar or nested message, and if a message,
    /// its descriptor.
    pub fn kind(&self) -> &FieldKind {
        &self.inner.kind
    }

    /// Shorthand for `matches!(self.kind(), FieldKind::Message(_))`.
    pub fn is_message(&self) -> bool {
        matches!(self.inner.kind, FieldKind::Message(_))
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
impl Eq for FieldDescriptor {}

#[derive(Debug)]
struct MessageDescriptorInner {
    /// Fully qualified name, e.g. `library.Book`.
    name: String,
    fields: Vec<FieldDescriptor>,
}

/// An ordered collection of fields describing one message type.
///
/// Cheap to clone: internally reference-counted, like the rest of this
/// crate's schema types.
#[derive(Clone, Debug)]
pub struct MessageDescriptor {
    inner: Arc<MessageDescriptorInner>,
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
impl Eq for MessageDescriptor {}

impl fmt::Display for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.name)
    }
}

impl MessageDescriptor {
    /// Builds a descriptor for a message with the given fully qualified name
    /// and fields, in declaration order.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        MessageDescriptor {
            inner: Arc::new(MessageDescriptorInner {
                name: name.into(),
                fields,
            }),
        }
    }

    /// The message's fully qualified name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// All fields, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.inner.fields
    }

    /// Looks up a field by its query-string name.
    ///
    /// Returns [`SchemaError`] if `ctx` has no field named `name` -- this is
    /// the compile-time `UnknownField` failure surfaced as
    /// [`CompileErrorKind::UnknownField`](crate::error::CompileErrorKind::UnknownField).
    pub fn field_by_name(&self, name: &str) -> Result<&FieldDescriptor, SchemaError> {
        self.inner
            .fields
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| SchemaError::field_not_found(name, self.name()))
    }
}

/// Builds a new, unique-by-tag field descriptor.
pub fn field(name: impl Into<String>, tag: u32, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor {
        inner: Arc::new(FieldDescriptorInner {
            name: name.into(),
            tag,
            kind,
        }),
    }
}

/// Shorthand for `field(name, tag, FieldKind::Scalar)`.
pub fn scalar_field(name: impl Into<String>, tag: u32) -> FieldDescriptor {
    field(name, tag, FieldKind::Scalar)
}

/// Shorthand for `field(name, tag, FieldKind::Message(nested))`.
pub fn message_field(name: impl Into<String>, tag: u32, nested: MessageDescriptor) -> FieldDescriptor {
    field(name, tag, FieldKind::Message(nested))
}

/// Lower-cases the first character of `message_name` and, for every
/// subsequent upper-case character, emits `_` followed by its lower-case
/// form. Anything else is copied through unchanged.
///
/// This mirrors the name-mangling convention code generators use to derive
/// a C-linkage symbol name from a message type name, e.g. `PkgName` ->
/// `pkg_name`, `ABc` -> `a_bc`, `X` -> `x`, `myField` -> `my_field`.
pub fn munge_message_name(message_name: &str) -> String {
    let mut out = String::with_capacity(message_name.len() + 4);
    let mut chars = message_name.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_lowercase());
    }
    for c in chars {
        if c.is_uppercase() {
            out.push('_');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Composes the mangled symbol name `resolve_root` looks up for a fully
/// qualified type name such as `library.Book`: split at the last `.`, munge
/// the message-name portion, and join as `<package>__<munged>__descriptor`.
///
/// If there is no `.`, the whole name is treated as the message name with an
/// empty package, giving a symbol of the form `__<munged>__descriptor`.
pub fn mangled_symbol(type_name: &str) -> String {
    let (package, message_name) = match type_name.rfind('.') {
        Some(idx) => (&type_name[..idx], &type_name[idx + 1..]),
        None => ("", type_name),
    };
    format!("{package}__{}__descriptor", munge_message_name(message_name))
}

/// A symbol table mapping mangled descriptor symbols to [`MessageDescriptor`]s.
///
/// Stands in for the "library handle" a production build would get from
/// `dlopen`-ing a generated shared object: this crate never loads or links
/// anything itself, it only implements the symbol-naming and lookup
/// contract. Callers populate the registry with descriptors built from
/// their own schema (however that schema got generated).
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    symbols: HashMap<String, MessageDescriptor>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        SchemaRegistry {
            symbols: HashMap::new(),
        }
    }

    /// Registers `descriptor` directly under a pre-mangled symbol name.
    ///
    /// Use this when you already know the symbol a generated schema would
    /// export (e.g. you're mirroring the output of a real code generator).
    pub fn register_symbol(&mut self, symbol: impl Into<String>, descriptor: MessageDescriptor) {
        self.symbols.insert(symbol.into(), descriptor);
    }

    /// Registers `descriptor` under the symbol that `resolve_root` would
    /// derive for `fully_qualified_type_name`.
    pub fn register(&mut self, fully_qualified_type_name: &str, descriptor: MessageDescriptor) {
        let symbol = mangled_symbol(fully_qualified_type_name);
        self.register_symbol(symbol, descriptor);
    }

    /// Resolves a dotted, fully qualified type name (`package.sub.Message`)
    /// to its [`MessageDescriptor`] via the mangled-symbol lookup described
    /// on [`mangled_symbol`].
    pub fn resolve_root(&self, type_name: &str) -> Result<MessageDescriptor, SchemaError> {
        let symbol = mangled_symbol(type_name);
        log::debug!("resolving root type `{type_name}` as symbol `{symbol}`");
        self.symbols
            .get(&symbol)
            .cloned()
            .ok_or_else(|| SchemaError::root_not_found(type_name, symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn munges_upper_case_boundaries() {
        assert_eq!(munge_message_name("PkgName"), "pkg_name");
        assert_eq!(munge_message_name("ABc"), "a_bc");
        assert_eq!(munge_message_name("X"), "x");
        assert_eq!(munge_message_name("myField"), "my_field");
    }

    #[test]
    fn mangles_dotted_type_names() {
        assert_eq!(
            mangled_symbol("library.Book"),
            "library__book__descriptor"
        );
        assert_eq!(
            mangled_symbol("library.sub.BookShelf"),
            "library.sub__book_shelf__descriptor"
        );
        assert_eq!(mangled_symbol("Book"), "__book__descriptor");
    }

    #[test]
    fn resolves_registered_root() {
        let mut registry = SchemaRegistry::new();
        let book = MessageDescriptor::new("library.Book", vec![scalar_field("title", 1)]);
        registry.register("library.Book", book.clone());

        let resolved = registry.resolve_root("library.Book").unwrap();
        assert_eq!(resolved, book);
    }

    #[test]
    fn missing_root_is_not_found() {
        let registry = SchemaRegistry::new();
        assert!(registry.resolve_root("library.Book").is_err());
    }

    #[test]
    fn field_lookup_fails_for_unknown_name() {
        let book = MessageDescriptor::new("library.Book", vec![scalar_field("title", 1)]);
        assert!(book.field_by_name("notafield").is_err());
    }
}
