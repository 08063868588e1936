//! Graphics error types.

use std::fmt;

/// Errors that can occur in the graphics layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Shader source failed to parse or validate.
    ShaderCompilation(String),
    /// No parameter with the given name exists in the uniform block.
    UnknownParameter(String),
    /// A value was written to a parameter of a different shape.
    TypeMismatch {
        /// Parameter name.
        name: String,
        /// Shape the parameter has.
        expected: String,
        /// Shape of the value written.
        got: String,
    },
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShaderCompilation(msg) => write!(f, "shader compilation failed: {msg}"),
            Self::UnknownParameter(name) => write!(f, "unknown parameter: {name}"),
            Self::TypeMismatch {
                name,
                expected,
                got,
            } => write!(f, "parameter {name} is {expected}, cannot write {got}"),
        }
    }
}

impl std::error::Error for GraphicsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::UnknownParameter("fog_vector".to_string());
        assert_eq!(err.to_string(), "unknown parameter: fog_vector");

        let err = GraphicsError::TypeMismatch {
            name: "world".to_string(),
            expected: "float4x4".to_string(),
            got: "float3".to_string(),
        };
        assert_eq!(err.to_string(), "parameter world is float4x4, cannot write float3");
    }
}
