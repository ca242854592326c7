//! # UTL-X
//!
//! A format-agnostic functional transformation language and runtime:
//! parse a document into the Universal Data Model (UDM), transform it
//! with a small functional expression language, serialize the result
//! back out in a different wire format.
//!
//! ## Overview
//!
//! A UTL-X script declares its input(s) and output(s) in a short
//! header, then an expression body that builds the result from
//! `$input` (or a named `$input-<name>`). The same script can read
//! JSON and write XML, or vice versa, without knowing anything about
//! either format beyond the shape of the data — every adapter
//! produces/consumes the same [`udm::Udm`] value tree.
//!
//! ## Quick Start
//!
//! ```
//! use utlx::Engine;
//!
//! let script = r#"
//! %utlx 1.0
//! input json
//! output json { pretty: false }
//! ---
//! { greeting: "hello " + $input.name }
//! "#;
//!
//! let engine = Engine::compile(script)?;
//! let output = engine.transform(br#"{"name": "Ada"}"#)?;
//! assert_eq!(String::from_utf8(output)?, r#"{"greeting":"hello Ada"}"#);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Templates and `apply`
//!
//! Scripts may declare `template match="Name" { ... }` or
//! `template match=<predicate> { ... }` rules and dispatch to them
//! with `apply(path)`, the same way a document-oriented transform
//! language handles heterogeneous element/node collections:
//!
//! ```
//! use utlx::Engine;
//!
//! let script = r#"
//! %utlx 1.0
//! input xml
//! output json { pretty: false }
//! ---
//! template match="item" { { sku: @sku } }
//! apply($input.item)
//! "#;
//!
//! let engine = Engine::compile(script)?;
//! let output = engine.transform(b"<root><item sku=\"A1\"/><item sku=\"A2\"/></root>")?;
//! assert_eq!(String::from_utf8(output)?, r#"[{"sku":"A1"},{"sku":"A2"}]"#);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Multi-input and multi-output scripts
//!
//! A header may declare more than one `input` directive (bound as
//! `$input-<name>`) and either a single `output <format>` or a named
//! `output { a: json, b: xml }` block; [`Engine::transform_multi`]
//! handles both shapes, returning a [`engine::TransformOutput`].
//!
//! ## Embedding
//!
//! [`Engine::compile`] (or [`Engine::compile_with_config`] for a
//! custom [`engine::EngineConfig`]) parses and caches a script once;
//! [`Engine::transform`]/[`Engine::transform_multi`] run it as many
//! times as needed and are safe to call from multiple threads against
//! the same compiled [`Engine`].
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::UtlxError`], a single enum
//! covering lex/parse/runtime/format/engine failures, each variant
//! carrying the [`error::Span`] of the offending source (where one
//! applies) for diagnostics.

pub mod ast;
pub mod engine;
pub mod error;
pub mod formats;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod stdlib;
pub mod udm;

pub use engine::{Engine, EngineConfig, TransformOutput};
pub use error::{ErrorContext, LexError, ParseError, Position, RuntimeError, Span, UtlxError, UtlxResult};
pub use udm::Udm;
