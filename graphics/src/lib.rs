//! # Glint Graphics
//!
//! Draw-preparation layer of the Glint engine: WGSL shader programs,
//! naga-reflected uniform block layouts, and the standard effect with
//! its dirty-flag parameter cache.
//!
//! Nothing here talks to a GPU; the output is validated shader modules
//! and staged uniform bytes ready for upload by a backend.

pub mod effect;
pub mod error;
pub mod shader;
pub mod uniform;

pub use effect::{EffectDirtyFlags, StandardEffect};
pub use error::GraphicsError;
pub use shader::ShaderProgram;
pub use uniform::{
    EffectParameter, ParameterClass, ParameterType, UniformBlockLayout, UniformBuffer,
};
