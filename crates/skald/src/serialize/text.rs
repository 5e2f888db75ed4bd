//! Line-oriented text format.
//!
//! ```text
//! Position          <- property name
//! 1 2 3             <- value; vectors are space separated
//! Active
//! true
//! next              <- end of this object's block
//! ```
//!
//! String values are escaped (`\\`, `\n`) so every value stays on one line.

use crate::error::{EngineError, Result};
use crate::math::{Quat, Vec2, Vec3, Vec4};
use crate::reflect::{MeshRef, Properties, Property, PropertyRef, PropertyValue, TextureRef};
use crate::uid::Uid;

/// The line that ends an object's property block.
pub const NEXT: &str = "next";

/// Write every property as `name\nvalue\n`, then the `next` sentinel.
pub fn write_block(props: &Properties<'_>, out: &mut String) {
    for prop in props.iter() {
        out.push_str(prop.name());
        out.push('\n');
        out.push_str(&format_value(&prop.value()));
        out.push('\n');
    }
    out.push_str(NEXT);
    out.push('\n');
}

/// Serialise one collection to a standalone string.
pub fn to_text(props: &Properties<'_>) -> String {
    let mut out = String::new();
    write_block(props, &mut out);
    out
}

/// Read one block from `text` into `props`.
pub fn from_text(props: &mut Properties<'_>, text: &str) -> Result<()> {
    TextReader::new(text).read_block(props)
}

pub fn format_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Bool(v) => v.to_string(),
        PropertyValue::Int(v) => v.to_string(),
        PropertyValue::Float(v) => v.to_string(),
        PropertyValue::String(v) => escape(v),
        PropertyValue::Vec2(v) => format!("{} {}", v.x, v.y),
        PropertyValue::Vec3(v) => format!("{} {} {}", v.x, v.y, v.z),
        PropertyValue::Vec4(v) => format!("{} {} {} {}", v.x, v.y, v.z, v.w),
        PropertyValue::Quat(v) => format!("{} {} {} {}", v.x, v.y, v.z, v.w),
        PropertyValue::Uid(v) => v.to_string(),
        PropertyValue::Enum(v) => escape(v.value()),
        PropertyValue::Texture(v) => escape(v.filename()),
        PropertyValue::Mesh(v) => escape(v.filename()),
    }
}

/// A property line pair read without a target object.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    pub name: String,
    pub value: String,
    /// Line number of the value, for error messages.
    pub line: usize,
}

impl RawField {
    pub fn parse_uid(&self) -> Result<Uid> {
        parse_number::<u32>(&self.value, self.line).map(Uid::from_raw)
    }
}

/// Find a field by name in a raw block.
pub fn raw_field<'f>(fields: &'f [RawField], name: &str) -> Option<&'f RawField> {
    fields.iter().find(|f| f.name == name)
}

/// Write raw fields into `props`. Names with no matching property are skipped.
pub fn apply_raw(props: &mut Properties<'_>, fields: &[RawField]) -> Result<()> {
    for field in fields {
        match props.find_mut(&field.name) {
            Some(prop) => read_into(prop, &field.value, field.line)?,
            None => log::warn!(
                "line {}: \"{}\" has no property \"{}\", skipped",
                field.line,
                props.title(),
                field.name
            ),
        }
    }
    Ok(())
}

/// Parse `text` according to the property's kind and store it.
pub fn read_into(prop: &mut Property<'_>, text: &str, line: usize) -> Result<()> {
    let name = prop.name().to_owned();
    match prop.value_mut() {
        PropertyRef::Bool(v) => **v = parse_bool(text, line)?,
        PropertyRef::Int(v) => **v = parse_number(text, line)?,
        PropertyRef::Float(v) => **v = parse_number(text, line)?,
        PropertyRef::String(v) => **v = unescape(text),
        PropertyRef::Vec2(v) => {
            let [x, y] = parse_floats(text, line)?;
            **v = Vec2::new(x, y);
        }
        PropertyRef::Vec3(v) => {
            let [x, y, z] = parse_floats(text, line)?;
            **v = Vec3::new(x, y, z);
        }
        PropertyRef::Vec4(v) => {
            let [x, y, z, w] = parse_floats(text, line)?;
            **v = Vec4::new(x, y, z, w);
        }
        PropertyRef::Quat(v) => {
            let [x, y, z, w] = parse_floats(text, line)?;
            **v = Quat::from_xyzw(x, y, z, w);
        }
        PropertyRef::Uid(v) => **v = Uid::from_raw(parse_number(text, line)?),
        PropertyRef::Enum(v) => {
            let value = unescape(text);
            if !v.set(&value) {
                log::warn!("line {line}: \"{value}\" is not a valid {name}, keeping \"{}\"", v.value());
            }
        }
        PropertyRef::Texture(v) => **v = TextureRef::new(unescape(text)),
        PropertyRef::Mesh(v) => **v = MeshRef::new(unescape(text)),
    }
    Ok(())
}

/// Sequential reader over a text save.
pub struct TextReader<'s> {
    lines: std::str::Lines<'s>,
    line: usize,
}

impl<'s> TextReader<'s> {
    pub fn new(text: &'s str) -> Self {
        Self {
            lines: text.lines(),
            line: 0,
        }
    }

    /// 1-based number of the last line read.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn next_line(&mut self) -> Option<&'s str> {
        let line = self.lines.next()?;
        self.line += 1;
        Some(line)
    }

    /// The next line, or a parse error at end of input.
    pub fn expect_line(&mut self) -> Result<&'s str> {
        self.next_line()
            .ok_or_else(|| EngineError::parse(self.line + 1, "unexpected end of input"))
    }

    /// Read `name`/`value` pairs up to and including the `next` sentinel.
    pub fn read_raw_block(&mut self) -> Result<Vec<RawField>> {
        let mut fields = Vec::new();
        loop {
            let name = self.expect_line()?;
            if name == NEXT {
                return Ok(fields);
            }
            let value = self.expect_line()?;
            fields.push(RawField {
                name: name.to_owned(),
                value: value.to_owned(),
                line: self.line,
            });
        }
    }

    /// Read one block straight into `props`.
    pub fn read_block(&mut self, props: &mut Properties<'_>) -> Result<()> {
        let fields = self.read_raw_block()?;
        apply_raw(props, &fields)
    }
}

fn parse_bool(text: &str, line: usize) -> Result<bool> {
    match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(EngineError::parse(line, format!("expected a bool, got \"{other}\""))),
    }
}

pub(crate) fn parse_number<T: std::str::FromStr>(text: &str, line: usize) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| EngineError::parse(line, format!("expected a number, got \"{text}\"")))
}

fn parse_floats<const N: usize>(text: &str, line: usize) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    let mut parts = text.split_whitespace();
    for slot in &mut out {
        let part = parts
            .next()
            .ok_or_else(|| EngineError::parse(line, format!("expected {N} numbers, got \"{text}\"")))?;
        *slot = parse_number(part, line)?;
    }
    if parts.next().is_some() {
        return Err(EngineError::parse(line, format!("expected {N} numbers, got \"{text}\"")));
    }
    Ok(out)
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

pub(crate) fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::VEnum;

    /// One field of every supported kind.
    #[derive(Debug, Clone, PartialEq)]
    struct Everything {
        flag: bool,
        count: i32,
        speed: f32,
        label: String,
        uv: Vec2,
        position: Vec3,
        color: Vec4,
        rotation: Quat,
        target: Uid,
        state: VEnum,
        texture: TextureRef,
        mesh: MeshRef,
    }

    impl Everything {
        fn blank() -> Self {
            Self {
                flag: false,
                count: 0,
                speed: 0.0,
                label: String::new(),
                uv: Vec2::ZERO,
                position: Vec3::ZERO,
                color: Vec4::ZERO,
                rotation: Quat::IDENTITY,
                target: Uid::NONE,
                state: VEnum::new(&["Idle", "Attack"]),
                texture: TextureRef::default(),
                mesh: MeshRef::default(),
            }
        }

        fn filled() -> Self {
            Self {
                flag: true,
                count: -42,
                speed: 3.25,
                label: "two\nlines \\ slash".into(),
                uv: Vec2::new(0.5, 0.125),
                position: Vec3::new(1.0, -2.5, 1e-3),
                color: Vec4::new(0.1, 0.2, 0.3, 1.0),
                rotation: Quat::from_rotation_y(0.7),
                target: Uid::from_raw(12345),
                state: VEnum::with_value(&["Idle", "Attack"], "Attack"),
                texture: TextureRef::new("brick.png"),
                mesh: MeshRef::new("enemy.gltf"),
            }
        }

        fn props(&mut self) -> Properties<'_> {
            let mut p = Properties::new("Everything");
            p.add("Flag", &mut self.flag);
            p.add("Count", &mut self.count);
            p.add("Speed", &mut self.speed);
            p.add("Label", &mut self.label);
            p.add("UV", &mut self.uv);
            p.add("Position", &mut self.position);
            p.add("Color", &mut self.color);
            p.add("Rotation", &mut self.rotation);
            p.add("Target", &mut self.target);
            p.add("State", &mut self.state);
            p.add("Texture", &mut self.texture);
            p.add("Mesh", &mut self.mesh);
            p
        }
    }

    #[test]
    fn round_trip_reproduces_every_kind() {
        let mut source = Everything::filled();
        let text = to_text(&source.props());

        let mut loaded = Everything::blank();
        from_text(&mut loaded.props(), &text).unwrap();
        assert_eq!(loaded, Everything::filled());
    }

    #[test]
    fn block_layout() {
        let mut count = 3;
        let mut pos = Vec3::new(1.0, 2.0, 3.0);
        let mut props = Properties::new("T");
        props.add("Count", &mut count);
        props.add("Position", &mut pos);
        assert_eq!(to_text(&props), "Count\n3\nPosition\n1 2 3\nnext\n");
    }

    #[test]
    fn unknown_names_are_skipped() {
        let mut count = 0;
        let mut props = Properties::new("T");
        props.add("Count", &mut count);
        from_text(&mut props, "Legacy\nwhatever\nCount\n7\nnext\n").unwrap();
        drop(props);
        assert_eq!(count, 7);
    }

    #[test]
    fn bad_value_reports_line() {
        let mut pos = Vec3::ZERO;
        let mut props = Properties::new("T");
        props.add("Position", &mut pos);
        let err = from_text(&mut props, "Position\n1 2\nnext\n").unwrap_err();
        assert!(matches!(err, EngineError::Parse { line: 2, .. }));
    }

    #[test]
    fn missing_sentinel_is_an_error() {
        let mut count = 0;
        let mut props = Properties::new("T");
        props.add("Count", &mut count);
        let err = from_text(&mut props, "Count\n7\n").unwrap_err();
        assert!(matches!(err, EngineError::Parse { line: 3, .. }));
    }

    #[test]
    fn invalid_enum_keeps_current_value() {
        let mut state = VEnum::with_value(&["Idle", "Attack"], "Attack");
        let mut props = Properties::new("T");
        props.add("State", &mut state);
        from_text(&mut props, "State\nFly\nnext\n").unwrap();
        drop(props);
        assert_eq!(state.value(), "Attack");
    }

    #[test]
    fn reader_walks_consecutive_blocks() {
        let mut reader = TextReader::new("A\n1\nnext\nB\n2\nnext\n");
        let first = reader.read_raw_block().unwrap();
        let second = reader.read_raw_block().unwrap();
        assert_eq!(first[0].name, "A");
        assert_eq!(second[0].value, "2");
        assert_eq!(second[0].line, 5);
        assert!(reader.next_line().is_none());
    }
}
