//! # Glint Core
//!
//! Content pipeline for the Glint engine: turns serialized scene
//! descriptions (a binary chunked stream or a JSON document plus raw
//! buffers) into a live object graph of renderable entities.
//!
//! The pipeline is layered bottom-up:
//!
//! - [`binary`] - sequential little-endian decoder over a byte slice
//! - [`buffer`] - [`buffer::BufferView`] / [`buffer::Accessor`] typed views into raw buffers
//! - [`mesh`] - vertex layouts, topologies, vertex/index buffers
//! - [`model`] - runtime entities (models, bones, meshes, nodes, skeletons)
//! - [`content`] - load sessions: documents, the type-reader registry,
//!   and the reference resolver with its object cache
//! - [`assembler`] - skeleton construction and vertex interleaving

pub mod assembler;
pub mod binary;
pub mod buffer;
pub mod content;
pub mod math;
pub mod mesh;
pub mod model;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
