/// Per-draw shader parameters.
///
/// A `MaterialParamsBlock` is scratch data owned by the `RenderQueue`: it is
/// allocated while recording, referenced from a key by its `u16` index, and
/// released right after the replay that consumes it.

use glam::{Mat4, Vec4};

/// One named shader parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Vec4(Vec4),
    Mat4(Mat4),
    /// Backend texture id
    Texture(u16),
    /// Backend buffer id
    Buffer(u16),
}

/// Ordered bag of named shader parameters
#[derive(Debug, Clone, Default)]
pub struct MaterialParamsBlock {
    params: Vec<(String, ParamValue)>,
}

impl MaterialParamsBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter
    pub fn set(&mut self, name: &str, value: ParamValue) -> &mut Self {
        match self.params.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.params.push((name.to_string(), value)),
        }
        self
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> &mut Self {
        self.set(name, ParamValue::Float(value))
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) -> &mut Self {
        self.set(name, ParamValue::Vec4(value))
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4) -> &mut Self {
        self.set(name, ParamValue::Mat4(value))
    }

    pub fn set_texture(&mut self, name: &str, texture: u16) -> &mut Self {
        self.set(name, ParamValue::Texture(texture))
    }

    pub fn set_buffer(&mut self, name: &str, buffer: u16) -> &mut Self {
        self.set(name, ParamValue::Buffer(buffer))
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Drop all parameters, keeping the allocation
    pub fn clear(&mut self) {
        self.params.clear();
    }

    /// Append the numeric parameters, in insertion order, as raw uniform bytes.
    ///
    /// Texture and buffer ids are bindings, not uniform data, and are skipped.
    pub fn write_uniform_bytes(&self, out: &mut Vec<u8>) {
        for (_, value) in &self.params {
            match value {
                ParamValue::Float(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
                ParamValue::Vec4(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
                ParamValue::Mat4(m) => out.extend_from_slice(bytemuck::bytes_of(m)),
                ParamValue::Texture(_) | ParamValue::Buffer(_) => {}
            }
        }
    }
}
