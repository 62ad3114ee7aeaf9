//! An XPath-like query engine over length-delimited tag-length-value binary
//! records.
//!
//! Given a [`schema::MessageDescriptor`] describing a message type's fields
//! and a query string (see the grammar in [`compiler`]), [`compiler::compile`]
//! produces a [`plan::Plan`] that [`evaluator::evaluate_all`] walks against
//! encoded bytes, without ever decoding a field the query doesn't touch.
//!
//! ```
//! use pbquery::schema::{scalar_field, message_field, MessageDescriptor};
//! use pbquery::{compile, evaluate_all};
//!
//! let book = MessageDescriptor::new(
//!     "library.Book",
//!     vec![scalar_field("title", 1)],
//! );
//! let library = MessageDescriptor::new(
//!     "library.Library",
//!     vec![message_field("books", 1, book)],
//! );
//!
//! let plan = compile(&library, "books.title").unwrap();
//! // `buf` would be the wire-encoded Library bytes.
//! # let buf: &[u8] = &[];
//! let _titles = evaluate_all(buf, &plan);
//! ```

pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod item;
pub mod plan;
pub mod result;
pub mod schema;
pub mod wire;

pub use compiler::compile;
pub use error::{CompileError, CompileErrorKind, EvalError, EvalErrorKind, SchemaError};
pub use evaluator::{
    evaluate_all, evaluate_all_with_config, evaluate_first, evaluate_first_with_config, for_each,
    ControlFlow, EvaluatorConfig,
};
pub use filter::Filter;
pub use item::Item;
pub use plan::{PathStep, Plan};
pub use result::{QueryResult, Slice};
pub use schema::{FieldDescriptor, FieldKind, MessageDescriptor, SchemaRegistry};
