use crate::byte_reader::ByteReader;
use crate::class_file_error::{ClassFileError, Result};
use crate::modified_utf8;
use std::io::Read;

/// A resolved constant-pool value, as returned by [`ConstantPool::value`]
/// for a `ConstantValue` attribute or any other caller that needs the typed
/// payload rather than a raw index.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    ClassName(String),
    StringValue(String),
}

const TAG_PLACEHOLDER: u8 = 0;
const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_INVOKE_DYNAMIC: u8 = 18;

/// The constant pool of a single classfile, laid out as three parallel
/// arrays indexed by constant-pool index rather than as a fully
/// materialized vector of decoded entries. This avoids allocating a
/// `String` for every UTF-8 entry the scan never ends up needing — most
/// constant pools are dominated by entries (method refs, name-and-type
/// descriptors) this layer never resolves at all.
pub struct ConstantPool {
    tag: Vec<u8>,
    /// Buffer offset of the entry's payload, i.e. just past the tag byte.
    offset: Vec<u32>,
    /// For tag 7/8 (Class/String), the UTF-8 index it refers to; -1
    /// elsewhere, 0 meaning "null string" for a 0 reference index.
    indirect: Vec<i32>,
}

impl ConstantPool {
    /// Parses `count - 1` entries (indices `1..count`) from `reader`,
    /// advancing two slots for tags 5 (long) and 6 (double) per the JVM
    /// spec's "each takes two constant-pool slots" quirk.
    pub fn read<R: Read>(reader: &mut ByteReader<R>, count: usize) -> Result<ConstantPool> {
        let mut tag = vec![TAG_PLACEHOLDER; count];
        let mut offset = vec![0u32; count];
        let mut indirect = vec![-1i32; count];

        let mut i = 1usize;
        while i < count {
            let t = reader.u8()?;
            let payload_offset = reader.position() as u32;
            match t {
                TAG_UTF8 => {
                    let len = reader.u16()? as usize;
                    reader.bytes(len)?;
                }
                TAG_INTEGER | TAG_FLOAT => reader.skip(4)?,
                TAG_LONG | TAG_DOUBLE => reader.skip(8)?,
                TAG_CLASS | TAG_STRING => {
                    let idx = reader.u16()?;
                    indirect[i] = idx as i32;
                }
                TAG_FIELDREF | TAG_METHODREF | TAG_INTERFACE_METHODREF | TAG_NAME_AND_TYPE => {
                    reader.skip(4)?
                }
                TAG_METHOD_HANDLE => reader.skip(3)?,
                TAG_METHOD_TYPE => reader.skip(2)?,
                TAG_INVOKE_DYNAMIC => reader.skip(4)?,
                other => return Err(ClassFileError::ConstantPoolTagNotSupported(other)),
            }
            tag[i] = t;
            offset[i] = payload_offset;
            if matches!(t, TAG_LONG | TAG_DOUBLE) {
                i += 2;
            } else {
                i += 1;
            }
        }
        Ok(ConstantPool {
            tag,
            offset,
            indirect,
        })
    }

    pub fn len(&self) -> usize {
        self.tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tag.is_empty()
    }

    fn tag_at(&self, index: u16) -> Result<u8> {
        self.tag
            .get(index as usize)
            .filter(|&&t| t != TAG_PLACEHOLDER || index == 0)
            .copied()
            .ok_or(ClassFileError::InvalidConstantPoolIndex(index))
    }

    fn utf8_bytes<'a, R: Read>(&self, reader: &'a ByteReader<R>, index: u16) -> Result<&'a [u8]> {
        if self.tag_at(index)? != TAG_UTF8 {
            return Err(ClassFileError::WrongConstantPoolEntryKind(index, "Utf8"));
        }
        let off = self.offset[index as usize] as usize;
        let len = reader.u16_at(off)? as usize;
        reader.bytes_at(off + 2, len)
    }

    /// Resolves a Class/String index's indirection to the UTF-8 index it
    /// points at. A reference index of 0 denotes a null string.
    fn resolve_indirect(&self, index: u16) -> Result<Option<u16>> {
        let t = self.tag_at(index)?;
        if t != TAG_CLASS && t != TAG_STRING {
            return Err(ClassFileError::WrongConstantPoolEntryKind(
                index,
                "Class or String",
            ));
        }
        let utf8_index = self.indirect[index as usize];
        if utf8_index == 0 {
            Ok(None)
        } else {
            Ok(Some(utf8_index as u16))
        }
    }

    /// Resolves indirections (tag 7/8 → tag 1) and decodes the modified
    /// UTF-8 string at `index`, or `None` for a null string reference.
    pub fn string<R: Read>(
        &self,
        reader: &ByteReader<R>,
        index: u16,
        replace_slash_with_dot: bool,
    ) -> Result<Option<String>> {
        let t = self.tag_at(index)?;
        let utf8_index = if t == TAG_UTF8 {
            Some(index)
        } else {
            self.resolve_indirect(index)?
        };
        match utf8_index {
            None => Ok(None),
            Some(i) => {
                let bytes = self.utf8_bytes(reader, i)?;
                modified_utf8::decode(bytes, replace_slash_with_dot).map(Some)
            }
        }
    }

    /// Like [`ConstantPool::string`], but for a class-reference entry:
    /// resolves 7 → 1 and applies `'/'`→`'.'` substitution, as every class
    /// name consumer in this crate wants.
    pub fn class_name<R: Read>(
        &self,
        reader: &ByteReader<R>,
        index: u16,
    ) -> Result<Option<String>> {
        if self.tag_at(index)? != TAG_CLASS {
            return Err(ClassFileError::WrongConstantPoolEntryKind(index, "Class"));
        }
        self.string(reader, index, true)
    }

    /// Compares the (possibly indirect) UTF-8 entry at `index` against
    /// `literal` byte-for-byte, without allocating a decoded `String` for
    /// either side.
    pub fn string_equals<R: Read>(
        &self,
        reader: &ByteReader<R>,
        index: u16,
        literal: &str,
    ) -> Result<bool> {
        let t = self.tag_at(index)?;
        let utf8_index = if t == TAG_UTF8 {
            Some(index)
        } else {
            self.resolve_indirect(index)?
        };
        match utf8_index {
            None => Ok(false),
            Some(i) => {
                let bytes = self.utf8_bytes(reader, i)?;
                Ok(modified_utf8::bytes_equal_str(bytes, literal))
            }
        }
    }

    /// Returns the typed constant at `index` for tags 1, 3, 4, 5, 6, 7, 8;
    /// any other tag is a fatal parse error for the enclosing classfile.
    pub fn value<R: Read>(&self, reader: &ByteReader<R>, index: u16) -> Result<ConstantValue> {
        let t = self.tag_at(index)?;
        let off = self.offset[index as usize] as usize;
        match t {
            TAG_UTF8 => {
                let bytes = self.utf8_bytes(reader, index)?;
                modified_utf8::decode(bytes, false).map(ConstantValue::Utf8)
            }
            TAG_INTEGER => Ok(ConstantValue::Integer(reader.u32_at(off)? as i32)),
            TAG_FLOAT => Ok(ConstantValue::Float(f32::from_bits(reader.u32_at(off)?))),
            TAG_LONG => Ok(ConstantValue::Long(reader.i64_at(off)?)),
            TAG_DOUBLE => Ok(ConstantValue::Double(f64::from_bits(
                reader.i64_at(off)? as u64,
            ))),
            TAG_CLASS => {
                let name = self
                    .string(reader, index, true)?
                    .ok_or(ClassFileError::InvalidConstantPoolIndex(index))?;
                Ok(ConstantValue::ClassName(name))
            }
            TAG_STRING => {
                let s = self
                    .string(reader, index, false)?
                    .ok_or(ClassFileError::InvalidConstantPoolIndex(index))?;
                Ok(ConstantValue::StringValue(s))
            }
            other => Err(ClassFileError::WrongConstantPoolEntryKind(
                index,
                constant_kind_name(other),
            )),
        }
    }
}

fn constant_kind_name(tag: u8) -> &'static str {
    match tag {
        TAG_FIELDREF => "FieldRef",
        TAG_METHODREF => "MethodRef",
        TAG_INTERFACE_METHODREF => "InterfaceMethodRef",
        TAG_NAME_AND_TYPE => "NameAndType",
        TAG_METHOD_HANDLE => "MethodHandle",
        TAG_METHOD_TYPE => "MethodType",
        TAG_INVOKE_DYNAMIC => "InvokeDynamic",
        _ => "constant",
    }
}
