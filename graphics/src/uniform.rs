//! Uniform block reflection and the staging buffer writing into it.
//!
//! Layouts come straight out of naga's IR: every parameter offset and
//! size is the one the validated shader actually uses, so a CPU-side
//! write can never drift from the GPU-side struct layout.

use std::sync::Arc;

use glint_core::math::{Mat4, Vec2, Vec3, Vec4};

use crate::error::GraphicsError;

/// Broad shape class of an effect parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterClass {
    /// Single scalar.
    Scalar,
    /// Row of components.
    Vector,
    /// Matrix.
    Matrix,
    /// Nested struct with members of its own.
    Struct,
}

/// Scalar type of an effect parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    /// 32-bit float.
    Float,
    /// Signed 32-bit integer.
    Int,
    /// Unsigned 32-bit integer.
    UInt,
    /// Boolean.
    Bool,
}

/// One reflected uniform block member. Immutable once reflected.
#[derive(Debug, Clone)]
pub struct EffectParameter {
    /// Member name.
    pub name: String,
    /// Shape class.
    pub class: ParameterClass,
    /// Scalar type.
    pub ty: ParameterType,
    /// Matrix rows (1 for scalars and vectors).
    pub rows: u32,
    /// Vector width or matrix columns (1 for scalars).
    pub columns: u32,
    /// Absolute byte offset within the block.
    pub offset: usize,
    /// Byte size of the member.
    pub size: usize,
    /// Whether matrix data is stored row-major. Always false for WGSL
    /// modules; kept so consumers need no layout assumptions.
    pub row_major: bool,
    /// Members of a nested struct, with absolute offsets.
    pub members: Vec<EffectParameter>,
}

impl EffectParameter {
    /// Human-readable shape, used in mismatch errors.
    pub fn shape(&self) -> String {
        match self.class {
            ParameterClass::Scalar => format!("{:?}", self.ty).to_lowercase(),
            ParameterClass::Vector => {
                format!("{:?}{}", self.ty, self.columns).to_lowercase()
            }
            ParameterClass::Matrix => {
                format!("{:?}{}x{}", self.ty, self.columns, self.rows).to_lowercase()
            }
            ParameterClass::Struct => "struct".to_string(),
        }
    }
}

/// Reflected layout of one uniform block.
#[derive(Debug, Clone)]
pub struct UniformBlockLayout {
    /// The uniform global's name.
    pub name: String,
    /// Total byte size of the block.
    pub size: usize,
    /// Top-level members in declaration order.
    pub parameters: Vec<EffectParameter>,
}

impl UniformBlockLayout {
    /// Reflects the uniform global named `block_name` out of a
    /// validated module.
    pub fn reflect(module: &naga::Module, block_name: &str) -> Result<Self, GraphicsError> {
        let global = module
            .global_variables
            .iter()
            .map(|(_, gv)| gv)
            .find(|gv| {
                gv.space == naga::AddressSpace::Uniform
                    && gv.name.as_deref() == Some(block_name)
            })
            .ok_or_else(|| GraphicsError::UnknownParameter(block_name.to_string()))?;

        let ty = &module.types[global.ty];
        let naga::TypeInner::Struct { members, span } = &ty.inner else {
            return Err(GraphicsError::ShaderCompilation(format!(
                "uniform {block_name} is not a struct"
            )));
        };

        Ok(Self {
            name: block_name.to_string(),
            size: *span as usize,
            parameters: reflect_members(module, members, 0)?,
        })
    }

    /// Finds a parameter by name; nested members are addressed with
    /// dots (`"fog.color"`).
    pub fn parameter(&self, name: &str) -> Option<&EffectParameter> {
        let mut parts = name.split('.');
        let first = parts.next()?;
        let mut param = self.parameters.iter().find(|p| p.name == first)?;
        for part in parts {
            param = param.members.iter().find(|p| p.name == part)?;
        }
        Some(param)
    }
}

fn scalar_type(scalar: naga::Scalar) -> Result<ParameterType, GraphicsError> {
    match scalar.kind {
        naga::ScalarKind::Float => Ok(ParameterType::Float),
        naga::ScalarKind::Sint => Ok(ParameterType::Int),
        naga::ScalarKind::Uint => Ok(ParameterType::UInt),
        naga::ScalarKind::Bool => Ok(ParameterType::Bool),
        other => Err(GraphicsError::ShaderCompilation(format!(
            "unsupported uniform scalar kind {other:?}"
        ))),
    }
}

fn reflect_members(
    module: &naga::Module,
    members: &[naga::StructMember],
    base_offset: usize,
) -> Result<Vec<EffectParameter>, GraphicsError> {
    let mut parameters = Vec::with_capacity(members.len());
    for member in members {
        let name = member.name.clone().unwrap_or_default();
        let offset = base_offset + member.offset as usize;
        let inner = &module.types[member.ty].inner;
        let size = inner.size(module.to_ctx()) as usize;

        let param = match inner {
            naga::TypeInner::Scalar(scalar) => EffectParameter {
                name,
                class: ParameterClass::Scalar,
                ty: scalar_type(*scalar)?,
                rows: 1,
                columns: 1,
                offset,
                size,
                row_major: false,
                members: Vec::new(),
            },
            naga::TypeInner::Vector { size: width, scalar } => EffectParameter {
                name,
                class: ParameterClass::Vector,
                ty: scalar_type(*scalar)?,
                rows: 1,
                columns: *width as u32,
                offset,
                size,
                row_major: false,
                members: Vec::new(),
            },
            naga::TypeInner::Matrix {
                columns,
                rows,
                scalar,
            } => EffectParameter {
                name,
                class: ParameterClass::Matrix,
                ty: scalar_type(*scalar)?,
                rows: *rows as u32,
                columns: *columns as u32,
                offset,
                size,
                row_major: false,
                members: Vec::new(),
            },
            naga::TypeInner::Struct { members, .. } => EffectParameter {
                name,
                class: ParameterClass::Struct,
                ty: ParameterType::Float,
                rows: 1,
                columns: 1,
                offset,
                size,
                row_major: false,
                members: reflect_members(module, members, offset)?,
            },
            other => {
                return Err(GraphicsError::ShaderCompilation(format!(
                    "unsupported uniform member type {other:?}"
                )))
            }
        };
        parameters.push(param);
    }
    Ok(parameters)
}

/// CPU staging buffer for one uniform block.
///
/// Every setter validates the parameter's shape and writes exactly
/// `size` bytes at the reflected offset.
pub struct UniformBuffer {
    layout: Arc<UniformBlockLayout>,
    data: Vec<u8>,
}

impl UniformBuffer {
    /// Create a zeroed buffer sized to the block.
    pub fn new(layout: Arc<UniformBlockLayout>) -> Self {
        let data = vec![0u8; layout.size];
        Self { layout, data }
    }

    /// The block layout this buffer stages for.
    pub fn layout(&self) -> &Arc<UniformBlockLayout> {
        &self.layout
    }

    /// The staged bytes, ready for upload.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn checked_write(
        &mut self,
        name: &str,
        class: ParameterClass,
        ty: ParameterType,
        columns: u32,
        rows: u32,
        got: &str,
        bytes: &[u8],
    ) -> Result<(), GraphicsError> {
        let param = self
            .layout
            .parameter(name)
            .ok_or_else(|| GraphicsError::UnknownParameter(name.to_string()))?;

        if param.class != class
            || param.ty != ty
            || param.columns != columns
            || param.rows != rows
            || param.size != bytes.len()
        {
            return Err(GraphicsError::TypeMismatch {
                name: name.to_string(),
                expected: param.shape(),
                got: got.to_string(),
            });
        }

        self.data[param.offset..param.offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Write a float scalar.
    pub fn set_f32(&mut self, name: &str, value: f32) -> Result<(), GraphicsError> {
        self.checked_write(
            name,
            ParameterClass::Scalar,
            ParameterType::Float,
            1,
            1,
            "float",
            &value.to_le_bytes(),
        )
    }

    /// Write an integer scalar.
    pub fn set_i32(&mut self, name: &str, value: i32) -> Result<(), GraphicsError> {
        self.checked_write(
            name,
            ParameterClass::Scalar,
            ParameterType::Int,
            1,
            1,
            "int",
            &value.to_le_bytes(),
        )
    }

    /// Write a float2.
    pub fn set_vec2(&mut self, name: &str, value: Vec2) -> Result<(), GraphicsError> {
        let values: [f32; 2] = value.into();
        self.checked_write(
            name,
            ParameterClass::Vector,
            ParameterType::Float,
            2,
            1,
            "float2",
            bytemuck::cast_slice(&values),
        )
    }

    /// Write a float3.
    pub fn set_vec3(&mut self, name: &str, value: Vec3) -> Result<(), GraphicsError> {
        let values: [f32; 3] = value.into();
        self.checked_write(
            name,
            ParameterClass::Vector,
            ParameterType::Float,
            3,
            1,
            "float3",
            bytemuck::cast_slice(&values),
        )
    }

    /// Write a float4.
    pub fn set_vec4(&mut self, name: &str, value: Vec4) -> Result<(), GraphicsError> {
        let values: [f32; 4] = value.into();
        self.checked_write(
            name,
            ParameterClass::Vector,
            ParameterType::Float,
            4,
            1,
            "float4",
            bytemuck::cast_slice(&values),
        )
    }

    /// Write a float4x4, column-major as WGSL stores it.
    pub fn set_mat4(&mut self, name: &str, value: &Mat4) -> Result<(), GraphicsError> {
        let mut bytes = [0u8; 64];
        for (i, v) in value.as_slice().iter().enumerate() {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
        }
        self.checked_write(
            name,
            ParameterClass::Matrix,
            ParameterType::Float,
            4,
            4,
            "float4x4",
            &bytes,
        )
    }

    /// Write the transpose of a float4x4.
    pub fn set_mat4_transpose(&mut self, name: &str, value: &Mat4) -> Result<(), GraphicsError> {
        let transposed = value.transpose();
        self.set_mat4(name, &transposed)
    }
}
