//! Compact little-endian binary format.
//!
//! Properties are written in collection order with no names, so the reader
//! must see a collection of the same shape.
//!
//! | kind                            | encoding                          |
//! |---------------------------------|-----------------------------------|
//! | bool                            | 1 byte (0 or 1)                   |
//! | int, float, uid                 | 4 bytes                           |
//! | vec2 / vec3 / vec4, quat        | 2 / 3 / 4 consecutive `f32`       |
//! | string, enum, texture, mesh     | `u64` byte length, then UTF-8     |

use crate::error::{EngineError, Result};
use crate::math::{Quat, Vec2, Vec3, Vec4};
use crate::reflect::{MeshRef, Properties, PropertyRef, PropertyValue, TextureRef};
use crate::uid::Uid;

/// Append every property of `props` to `out`.
pub fn write_binary(props: &Properties<'_>, out: &mut Vec<u8>) {
    for prop in props.iter() {
        match prop.value() {
            PropertyValue::Bool(v) => out.push(v as u8),
            PropertyValue::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
            PropertyValue::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
            PropertyValue::String(v) => write_str(out, &v),
            PropertyValue::Vec2(v) => write_floats(out, &v.to_array()),
            PropertyValue::Vec3(v) => write_floats(out, &v.to_array()),
            PropertyValue::Vec4(v) => write_floats(out, &v.to_array()),
            PropertyValue::Quat(v) => write_floats(out, &v.to_array()),
            PropertyValue::Uid(v) => out.extend_from_slice(&v.raw().to_le_bytes()),
            PropertyValue::Enum(v) => write_str(out, v.value()),
            PropertyValue::Texture(v) => write_str(out, v.filename()),
            PropertyValue::Mesh(v) => write_str(out, v.filename()),
        }
    }
}

/// Read every property of `props` from the front of `input`, advancing it.
pub fn read_binary(props: &mut Properties<'_>, input: &mut &[u8]) -> Result<()> {
    let mut reader = BinaryReader { input, offset: 0 };
    for prop in props.iter_mut() {
        let name = prop.name().to_owned();
        match prop.value_mut() {
            PropertyRef::Bool(v) => **v = reader.u8()? != 0,
            PropertyRef::Int(v) => **v = i32::from_le_bytes(reader.array()?),
            PropertyRef::Float(v) => **v = reader.f32()?,
            PropertyRef::String(v) => **v = reader.string()?,
            PropertyRef::Vec2(v) => **v = Vec2::from_array(reader.floats()?),
            PropertyRef::Vec3(v) => **v = Vec3::from_array(reader.floats()?),
            PropertyRef::Vec4(v) => **v = Vec4::from_array(reader.floats()?),
            PropertyRef::Quat(v) => **v = Quat::from_array(reader.floats()?),
            PropertyRef::Uid(v) => **v = Uid::from_raw(u32::from_le_bytes(reader.array()?)),
            PropertyRef::Enum(v) => {
                let value = reader.string()?;
                if !v.set(&value) {
                    log::warn!("\"{value}\" is not a valid {name}, keeping \"{}\"", v.value());
                }
            }
            PropertyRef::Texture(v) => **v = TextureRef::new(reader.string()?),
            PropertyRef::Mesh(v) => **v = MeshRef::new(reader.string()?),
        }
    }
    Ok(())
}

fn write_floats(out: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u64).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

struct BinaryReader<'r, 'b> {
    input: &'r mut &'b [u8],
    offset: usize,
}

impl<'b> BinaryReader<'_, 'b> {
    fn take(&mut self, n: usize) -> Result<&'b [u8]> {
        let input: &'b [u8] = self.input;
        if input.len() < n {
            return Err(EngineError::parse(
                0,
                format!("truncated binary input: wanted {n} bytes at offset {}", self.offset),
            ));
        }
        let (head, tail) = input.split_at(n);
        *self.input = tail;
        self.offset += n;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    fn floats<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut out = [0.0; N];
        for slot in &mut out {
            *slot = self.f32()?;
        }
        Ok(out)
    }

    fn string(&mut self) -> Result<String> {
        let len = u64::from_le_bytes(self.array()?);
        let len = usize::try_from(len)
            .map_err(|_| EngineError::parse(0, format!("string length {len} too large")))?;
        let offset = self.offset;
        let bytes = self.take(len)?.to_vec();
        String::from_utf8(bytes)
            .map_err(|_| EngineError::parse(0, format!("invalid UTF-8 string at offset {offset}")))
    }
}
