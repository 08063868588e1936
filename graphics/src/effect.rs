//! The standard effect: a dirty-flag cache over a uniform block.
//!
//! Setters only record state and mark the dependent parameter groups
//! stale; [`StandardEffect::apply`] recomputes exactly the stale groups
//! and writes them through the uniform buffer. A clean effect applies
//! in zero writes.

use std::sync::Arc;

use bitflags::bitflags;
use log::trace;

use glint_core::math::{Mat4, Vec3, Vec4};

use crate::error::GraphicsError;
use crate::shader::ShaderProgram;
use crate::uniform::{UniformBlockLayout, UniformBuffer};

bitflags! {
    /// Parameter groups that need recomputation before the next draw.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EffectDirtyFlags: u32 {
        /// World matrix and its inverse transpose.
        const WORLD = 1 << 0;
        /// Combined world-view-projection matrix.
        const WORLD_VIEW_PROJ = 1 << 1;
        /// Eye position derived from the view matrix.
        const EYE_POSITION = 1 << 2;
        /// Fog vector and color.
        const FOG = 1 << 3;
        /// Fog on/off state.
        const FOG_ENABLE = 1 << 4;
        /// Premultiplied material colors.
        const MATERIAL_COLOR = 1 << 5;
        /// Shader permutation index.
        const SHADER_INDEX = 1 << 6;
        /// Every group.
        const ALL = Self::WORLD.bits()
            | Self::WORLD_VIEW_PROJ.bits()
            | Self::EYE_POSITION.bits()
            | Self::FOG.bits()
            | Self::FOG_ENABLE.bits()
            | Self::MATERIAL_COLOR.bits()
            | Self::SHADER_INDEX.bits();
    }
}

/// WGSL source of the built-in effect.
pub const STANDARD_EFFECT_WGSL: &str = r#"
struct StandardUniforms {
    world: mat4x4<f32>,
    world_view_proj: mat4x4<f32>,
    world_inverse_transpose: mat4x4<f32>,
    diffuse_color: vec4<f32>,
    emissive_color: vec3<f32>,
    specular_color: vec3<f32>,
    eye_position: vec3<f32>,
    fog_vector: vec4<f32>,
    fog_color: vec3<f32>,
    specular_power: f32,
    shader_index: i32,
}

@group(0) @binding(0) var<uniform> standard: StandardUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) fog_factor: f32,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = standard.world_view_proj * vec4<f32>(position, 1.0);
    out.fog_factor = clamp(dot(vec4<f32>(position, 1.0), standard.fog_vector), 0.0, 1.0);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let lit = standard.diffuse_color + vec4<f32>(standard.emissive_color, 0.0);
    return vec4<f32>(mix(lit.rgb, standard.fog_color, in.fog_factor), lit.a);
}
"#;

/// Name of the built-in effect's uniform global.
pub const STANDARD_EFFECT_BLOCK: &str = "standard";

/// Matrix, material, and fog state with lazy uniform recomputation.
pub struct StandardEffect {
    program: ShaderProgram,
    buffer: UniformBuffer,
    dirty: EffectDirtyFlags,

    world: Mat4,
    view: Mat4,
    projection: Mat4,

    diffuse_color: Vec3,
    emissive_color: Vec3,
    specular_color: Vec3,
    specular_power: f32,
    ambient_light_color: Vec3,
    alpha: f32,

    fog_enabled: bool,
    fog_start: f32,
    fog_end: f32,
    fog_color: Vec3,

    texture_enabled: bool,
    lighting_enabled: bool,
    per_pixel_lighting: bool,
}

impl StandardEffect {
    /// Compiles the built-in shader, reflects its uniform block, and
    /// starts with every group dirty.
    pub fn new() -> Result<Self, GraphicsError> {
        let program = ShaderProgram::from_wgsl(STANDARD_EFFECT_WGSL)?;
        let layout = UniformBlockLayout::reflect(program.module(), STANDARD_EFFECT_BLOCK)?;
        let buffer = UniformBuffer::new(Arc::new(layout));

        Ok(Self {
            program,
            buffer,
            dirty: EffectDirtyFlags::ALL,
            world: Mat4::identity(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            diffuse_color: Vec3::new(1.0, 1.0, 1.0),
            emissive_color: Vec3::zeros(),
            specular_color: Vec3::zeros(),
            specular_power: 16.0,
            ambient_light_color: Vec3::zeros(),
            alpha: 1.0,
            fog_enabled: false,
            fog_start: 0.0,
            fog_end: 1.0,
            fog_color: Vec3::zeros(),
            texture_enabled: false,
            lighting_enabled: false,
            per_pixel_lighting: false,
        })
    }

    /// The validated shader program.
    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    /// The staged uniform bytes, valid after [`apply`](Self::apply).
    pub fn uniform_bytes(&self) -> &[u8] {
        self.buffer.bytes()
    }

    /// Groups currently marked stale.
    pub fn dirty_flags(&self) -> EffectDirtyFlags {
        self.dirty
    }

    pub fn set_world(&mut self, world: Mat4) {
        self.world = world;
        self.dirty |= EffectDirtyFlags::WORLD
            | EffectDirtyFlags::WORLD_VIEW_PROJ
            | EffectDirtyFlags::FOG;
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
        self.dirty |= EffectDirtyFlags::WORLD_VIEW_PROJ
            | EffectDirtyFlags::EYE_POSITION
            | EffectDirtyFlags::FOG;
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.dirty |= EffectDirtyFlags::WORLD_VIEW_PROJ;
    }

    pub fn set_diffuse_color(&mut self, color: Vec3) {
        self.diffuse_color = color;
        self.dirty |= EffectDirtyFlags::MATERIAL_COLOR;
    }

    pub fn set_emissive_color(&mut self, color: Vec3) {
        self.emissive_color = color;
        self.dirty |= EffectDirtyFlags::MATERIAL_COLOR;
    }

    pub fn set_specular_color(&mut self, color: Vec3) {
        self.specular_color = color;
        self.dirty |= EffectDirtyFlags::MATERIAL_COLOR;
    }

    pub fn set_specular_power(&mut self, power: f32) {
        self.specular_power = power;
        self.dirty |= EffectDirtyFlags::MATERIAL_COLOR;
    }

    pub fn set_ambient_light_color(&mut self, color: Vec3) {
        self.ambient_light_color = color;
        self.dirty |= EffectDirtyFlags::MATERIAL_COLOR;
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
        self.dirty |= EffectDirtyFlags::MATERIAL_COLOR;
    }

    pub fn set_fog_enabled(&mut self, enabled: bool) {
        self.fog_enabled = enabled;
        self.dirty |= EffectDirtyFlags::FOG_ENABLE;
    }

    pub fn set_fog_start(&mut self, start: f32) {
        self.fog_start = start;
        self.dirty |= EffectDirtyFlags::FOG;
    }

    pub fn set_fog_end(&mut self, end: f32) {
        self.fog_end = end;
        self.dirty |= EffectDirtyFlags::FOG;
    }

    pub fn set_fog_color(&mut self, color: Vec3) {
        self.fog_color = color;
        self.dirty |= EffectDirtyFlags::FOG;
    }

    pub fn set_texture_enabled(&mut self, enabled: bool) {
        self.texture_enabled = enabled;
        self.dirty |= EffectDirtyFlags::SHADER_INDEX;
    }

    pub fn set_lighting_enabled(&mut self, enabled: bool) {
        self.lighting_enabled = enabled;
        self.dirty |= EffectDirtyFlags::SHADER_INDEX;
    }

    pub fn set_per_pixel_lighting(&mut self, enabled: bool) {
        self.per_pixel_lighting = enabled;
        self.dirty |= EffectDirtyFlags::SHADER_INDEX;
    }

    /// Recomputes the stale parameter groups and writes them through
    /// the uniform buffer. Returns how many groups were recomputed; a
    /// clean effect returns 0 and writes nothing.
    pub fn apply(&mut self) -> Result<usize, GraphicsError> {
        let mut served = 0;

        if self.dirty.contains(EffectDirtyFlags::WORLD) {
            self.buffer.set_mat4("world", &self.world)?;
            let inverse = self.world.try_inverse().unwrap_or_else(Mat4::identity);
            self.buffer
                .set_mat4_transpose("world_inverse_transpose", &inverse)?;
            self.dirty.remove(EffectDirtyFlags::WORLD);
            served += 1;
        }

        if self.dirty.contains(EffectDirtyFlags::WORLD_VIEW_PROJ) {
            let wvp = self.projection * self.view * self.world;
            self.buffer.set_mat4("world_view_proj", &wvp)?;
            self.dirty.remove(EffectDirtyFlags::WORLD_VIEW_PROJ);
            served += 1;
        }

        if self.dirty.contains(EffectDirtyFlags::EYE_POSITION) {
            let inverse = self.view.try_inverse().unwrap_or_else(Mat4::identity);
            let eye = Vec3::new(inverse[(0, 3)], inverse[(1, 3)], inverse[(2, 3)]);
            self.buffer.set_vec3("eye_position", eye)?;
            self.dirty.remove(EffectDirtyFlags::EYE_POSITION);
            served += 1;
        }

        if self.dirty.contains(EffectDirtyFlags::FOG) {
            self.buffer.set_vec4("fog_vector", self.fog_vector())?;
            self.buffer.set_vec3("fog_color", self.fog_color)?;
            self.dirty.remove(EffectDirtyFlags::FOG);
            served += 1;
        }

        if self.dirty.contains(EffectDirtyFlags::FOG_ENABLE) {
            self.buffer.set_vec4("fog_vector", self.fog_vector())?;
            self.dirty.remove(EffectDirtyFlags::FOG_ENABLE);
            served += 1;
        }

        if self.dirty.contains(EffectDirtyFlags::MATERIAL_COLOR) {
            let d = self.diffuse_color;
            self.buffer.set_vec4(
                "diffuse_color",
                Vec4::new(
                    d.x * self.alpha,
                    d.y * self.alpha,
                    d.z * self.alpha,
                    self.alpha,
                ),
            )?;
            let emissive =
                (self.emissive_color + self.ambient_light_color.component_mul(&d)) * self.alpha;
            self.buffer.set_vec3("emissive_color", emissive)?;
            self.buffer.set_vec3("specular_color", self.specular_color)?;
            self.buffer.set_f32("specular_power", self.specular_power)?;
            self.dirty.remove(EffectDirtyFlags::MATERIAL_COLOR);
            served += 1;
        }

        if self.dirty.contains(EffectDirtyFlags::SHADER_INDEX) {
            self.buffer.set_i32("shader_index", self.shader_index())?;
            self.dirty.remove(EffectDirtyFlags::SHADER_INDEX);
            served += 1;
        }

        if served > 0 {
            trace!("standard effect recomputed {served} parameter groups");
        }
        Ok(served)
    }

    /// Permutation index selecting the shader variant for the current
    /// toggles.
    fn shader_index(&self) -> i32 {
        let mut index = 0;
        if self.texture_enabled {
            index += 1;
        }
        if self.lighting_enabled {
            index += 2;
            if self.per_pixel_lighting {
                index += 4;
            }
        }
        index
    }

    /// Per-vertex fog coefficient vector: `dot(position, fog_vector)`
    /// yields the fog blend factor. Zero when fog is off; saturated
    /// when the start and end distances coincide.
    fn fog_vector(&self) -> Vec4 {
        if !self.fog_enabled {
            return Vec4::zeros();
        }
        if self.fog_start == self.fog_end {
            return Vec4::new(0.0, 0.0, 0.0, 1.0);
        }
        let wv = self.view * self.world;
        let scale = 1.0 / (self.fog_start - self.fog_end);
        Vec4::new(
            wv[(2, 0)] * scale,
            wv[(2, 1)] * scale,
            wv[(2, 2)] * scale,
            (wv[(2, 3)] + self.fog_start) * scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_all_covers_every_group() {
        let all = EffectDirtyFlags::ALL;
        assert_eq!(all.bits(), 0x7f);
        assert!(all.contains(EffectDirtyFlags::FOG_ENABLE));
        assert!(all.contains(EffectDirtyFlags::MATERIAL_COLOR));
    }

    #[test]
    fn test_shader_index_permutations() {
        let mut effect = StandardEffect::new().unwrap();
        assert_eq!(effect.shader_index(), 0);
        effect.set_texture_enabled(true);
        effect.set_lighting_enabled(true);
        assert_eq!(effect.shader_index(), 3);
        effect.set_per_pixel_lighting(true);
        assert_eq!(effect.shader_index(), 7);
        // Per-pixel without lighting changes nothing.
        effect.set_lighting_enabled(false);
        assert_eq!(effect.shader_index(), 1);
    }
}
