//! Named uniform values and their std140 packing.
//!
//! A [`UniformSet`] keeps insertion order; that order is the field order of
//! the matching WGSL struct. Packing follows the uniform address space rules
//! shared by WGSL and WebGL2: `f32` aligns to 4 bytes, `vec3<f32>` to 16 with a
//! size of 12, and the whole block is rounded up to 16 bytes.

use std::fmt;

use glam::Vec3;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UniformError {
    #[error("uniform `{0}` is referenced by the program but has no bound value")]
    Missing(&'static str),
    #[error("uniform `{name}` holds a {expected} and cannot take a {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("uniform `{found}` is bound where the program declares `{expected}`")]
    OutOfOrder {
        expected: &'static str,
        found: &'static str,
    },
    #[error("uniform `{0}` is not part of this set")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3(Vec3),
}

impl UniformValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Vec3(_) => "vec3",
        }
    }

    fn align(&self) -> usize {
        match self {
            Self::Float(_) => 4,
            Self::Vec3(_) => 16,
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::Float(_) => 4,
            Self::Vec3(_) => 12,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Vec3(_) => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(value) => Some(*value),
            Self::Float(_) => None,
        }
    }
}

impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v:.3}"),
            Self::Vec3(v) => write!(f, "({:.3}, {:.3}, {:.3})", v.x, v.y, v.z),
        }
    }
}

/// Ordered mapping from uniform name to its current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    entries: Vec<(&'static str, UniformValue)>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a binding. Declaring a name twice keeps the first position
    /// and overwrites the value.
    pub fn with(mut self, name: &'static str, value: UniformValue) -> Self {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn with_float(self, name: &'static str, value: f32) -> Self {
        self.with(name, UniformValue::Float(value))
    }

    pub fn with_vec3(self, name: &'static str, value: Vec3) -> Self {
        self.with(name, UniformValue::Vec3(value))
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| *value)
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(|value| value.as_float())
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        self.get(name).and_then(|value| value.as_vec3())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, UniformValue)> + '_ {
        self.entries.iter().copied()
    }

    /// Updates an existing binding, keeping its type.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| UniformError::Unknown(name.to_string()))?;
        if std::mem::discriminant(&entry.1) != std::mem::discriminant(&value) {
            return Err(UniformError::TypeMismatch {
                name: name.to_string(),
                expected: entry.1.kind(),
                found: value.kind(),
            });
        }
        entry.1 = value;
        Ok(())
    }

    /// Checks that every name a program references has a binding.
    pub fn ensure_bound(&self, referenced: &[&'static str]) -> Result<(), UniformError> {
        match referenced.iter().find(|name| self.get(name).is_none()) {
            Some(name) => Err(UniformError::Missing(*name)),
            None => Ok(()),
        }
    }

    /// Byte offsets of every entry under std140 rules.
    pub fn offsets(&self) -> Vec<usize> {
        let mut offset = 0;
        self.entries
            .iter()
            .map(|(_, value)| {
                offset = align_to(offset, value.align());
                let at = offset;
                offset += value.size();
                at
            })
            .collect()
    }

    /// Size of the packed block, at least 16 bytes.
    pub fn byte_size(&self) -> usize {
        let end = self
            .entries
            .iter()
            .zip(self.offsets())
            .map(|((_, value), offset)| offset + value.size())
            .max()
            .unwrap_or(0);
        align_to(end.max(1), 16)
    }

    /// Packs the values into a buffer ready for `queue.write_buffer`.
    pub fn to_std140(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.byte_size()];
        for ((_, value), offset) in self.entries.iter().zip(self.offsets()) {
            match value {
                UniformValue::Float(v) => {
                    bytes[offset..offset + 4].copy_from_slice(bytemuck::bytes_of(v));
                }
                UniformValue::Vec3(v) => {
                    let data = v.to_array();
                    bytes[offset..offset + 12].copy_from_slice(bytemuck::cast_slice(&data));
                }
            }
        }
        bytes
    }
}

fn align_to(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk_set() -> UniformSet {
        UniformSet::new()
            .with_float("uTime", 0.0)
            .with_vec3("uColorInner", Vec3::X)
            .with_vec3("uColorOuter", Vec3::Z)
    }

    #[test]
    fn offsets_follow_std140() {
        let set = disk_set();
        assert_eq!(set.offsets(), vec![0, 16, 32]);
        assert_eq!(set.byte_size(), 48);
    }

    #[test]
    fn scalar_packs_into_vec3_tail() {
        let set = UniformSet::new()
            .with_float("uTime", 1.0)
            .with_vec3("uColor", Vec3::ONE)
            .with_float("uOpacity", 0.5);
        assert_eq!(set.offsets(), vec![0, 16, 28]);
        assert_eq!(set.byte_size(), 32);
        let bytes = set.to_std140();
        let opacity: f32 = bytemuck::pod_read_unaligned(&bytes[28..32]);
        assert_eq!(opacity, 0.5);
    }

    #[test]
    fn packs_values_at_their_offsets() {
        let mut set = disk_set();
        set.set("uTime", UniformValue::Float(20.0)).unwrap();
        let bytes = set.to_std140();
        let time: f32 = bytemuck::pod_read_unaligned(&bytes[0..4]);
        let outer_z: f32 = bytemuck::pod_read_unaligned(&bytes[40..44]);
        assert_eq!(time, 20.0);
        assert_eq!(outer_z, 1.0);
    }

    #[test]
    fn set_rejects_unknown_and_mistyped_values() {
        let mut set = disk_set();
        assert_eq!(
            set.set("uSpeed", UniformValue::Float(1.0)),
            Err(UniformError::Unknown("uSpeed".into()))
        );
        assert!(matches!(
            set.set("uTime", UniformValue::Vec3(Vec3::ONE)),
            Err(UniformError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn ensure_bound_reports_first_missing_name() {
        let set = disk_set();
        assert!(set.ensure_bound(&["uTime", "uColorInner"]).is_ok());
        assert_eq!(
            set.ensure_bound(&["uTime", "uDistortion"]),
            Err(UniformError::Missing("uDistortion"))
        );
    }

    #[test]
    fn empty_set_still_occupies_a_block() {
        assert_eq!(UniformSet::new().byte_size(), 16);
    }
}
