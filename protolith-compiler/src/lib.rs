#![doc(html_root_url = "https://docs.rs/protolith-compiler/0.1.0")]

//! `protolith-compiler` translates `.proto` files into Rust source: an immutable message type
//! and `Builder` per message, a `Kind` discriminator enum per `oneof`, and a `BinaryCodec`/
//! `JsonCodec` pair per message, targeting the traits in the [`protolith`] runtime crate.
//!
//! `protolith-compiler` is designed to be used for build-time code generation as part of a
//! Cargo build script.
//!
//! ## Example
//!
//! Add `protolith` and `protolith-compiler` to `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! protolith = "0.1"
//!
//! [build-dependencies]
//! protolith-compiler = "0.1"
//! ```
//!
//! Add `src/items.proto`:
//!
//! ```proto
//! syntax = "proto3";
//!
//! package snazzy.items;
//!
//! message Shirt {
//!   enum Size {
//!     SMALL = 0;
//!     MEDIUM = 1;
//!     LARGE = 2;
//!   }
//!
//!   string color = 1;
//!   Size size = 2;
//! }
//! ```
//!
//! And generate Rust code from it in `build.rs`:
//!
//! ```rust,no_run
//! fn main() -> std::io::Result<()> {
//!     protolith_compiler::compile_protos(&["src/items.proto"], &["src/"])
//! }
//! ```
//!
//! ## Sourcing `protoc`
//!
//! `protolith-compiler` depends on the Protocol Buffers compiler, `protoc`, to parse `.proto`
//! files into a `FileDescriptorSet`. If set, the `PROTOC` and `PROTOC_INCLUDE` environment
//! variables locate `protoc` and the protobuf built-in includes:
//!
//! ```bash
//! PROTOC=/usr/bin/protoc
//! PROTOC_INCLUDE=/usr/include
//! ```
//!
//! Alternatively, [`Config::skip_protoc_run`] plus [`Config::file_descriptor_set_path`] let a
//! pre-computed `FileDescriptorSet` stand in for invoking `protoc` directly.

mod ast;
mod code_generator;
mod config;
mod extern_paths;
mod fully_qualified_name;
mod ident;
mod json;
mod message_graph;
mod module;
mod path;
mod schema;
mod syn_helpers;

use std::io::Result;
use std::path::Path;

pub use config::{error_message_protoc_not_found, protoc_from_env, protoc_include_from_env, Config};
pub use fully_qualified_name::FullyQualifiedName;
pub use module::Module;
pub(crate) use syn_helpers::SynHelpers;

/// Compiles `.proto` files into Rust files as part of a Cargo build.
///
/// The generated `.rs` files are written to the `OUT_DIR` directory, suitable for use with the
/// [`include!`] macro. This function should be called from a crate's `build.rs`.
///
/// **`protos`** - paths to `.proto` files to compile. Any transitively imported `.proto` files
/// are automatically included.
///
/// **`includes`** - paths to directories to search for imports, in order. Every path in
/// `protos` must live under one of `includes`.
///
/// # Errors
///
/// This function can fail if `protoc` cannot be located or invoked, if a `.proto` file fails to
/// parse, or if an imported `.proto` file cannot be located. It's expected that this call is
/// `unwrap`ed in a `build.rs`; there is typically no reason to gracefully recover from a build
/// script failure.
pub fn compile_protos(protos: &[impl AsRef<Path>], includes: &[impl AsRef<Path>]) -> Result<()> {
    Config::new().compile_protos(protos, includes)
}
