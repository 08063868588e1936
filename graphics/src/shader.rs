//! WGSL shader programs.

use crate::error::GraphicsError;

/// A parsed and validated WGSL shader module.
///
/// The naga module is kept around for reflection: uniform block
/// layouts are derived from it rather than computed by hand.
pub struct ShaderProgram {
    module: naga::Module,
    info: naga::valid::ModuleInfo,
}

impl ShaderProgram {
    /// Parse and validate WGSL source.
    pub fn from_wgsl(source: &str) -> Result<Self, GraphicsError> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| {
            GraphicsError::ShaderCompilation(format!("WGSL parse error: {e}"))
        })?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        let info = validator
            .validate(&module)
            .map_err(|e| GraphicsError::ShaderCompilation(format!("validation error: {e}")))?;

        Ok(Self { module, info })
    }

    /// The underlying naga module.
    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    /// Validation info for the module.
    pub fn info(&self) -> &naga::valid::ModuleInfo {
        &self.info
    }

    /// Whether the module has an entry point with the given name.
    pub fn has_entry_point(&self, name: &str) -> bool {
        self.module.entry_points.iter().any(|ep| ep.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_shader() {
        let program = ShaderProgram::from_wgsl(
            r#"
            @vertex
            fn vs_main() -> @builtin(position) vec4<f32> {
                return vec4<f32>(0.0, 0.0, 0.0, 1.0);
            }
            "#,
        )
        .unwrap();
        assert!(program.has_entry_point("vs_main"));
        assert!(!program.has_entry_point("fs_main"));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = ShaderProgram::from_wgsl("fn broken(").err().unwrap();
        assert!(matches!(err, GraphicsError::ShaderCompilation(_)));
    }
}
