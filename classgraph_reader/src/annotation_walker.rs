use crate::byte_reader::ByteReader;
use crate::class_file_error::{ClassFileError, Result};
use std::io::Read;

/// Walks and discards the element-value pairs of an annotation. The
/// classfile parser has already read (and decided
/// whether to keep) the annotation's own type descriptor by the time this
/// runs; everything here exists purely to skip past payload bytes we never
/// interpret, without losing track of the cursor for whatever follows.
fn skip_element_value<R: Read>(reader: &mut ByteReader<R>) -> Result<()> {
    let tag = reader.u8()?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => {
            reader.skip(2)?;
        }
        b'e' => reader.skip(4)?,
        b'c' => reader.skip(2)?,
        b'@' => skip_annotation(reader)?,
        b'[' => {
            let count = reader.u16()? as usize;
            for _ in 0..count {
                skip_element_value(reader)?;
            }
        }
        other => return Err(ClassFileError::UnknownElementValueTag(other)),
    }
    Ok(())
}

/// Fully discards a nested annotation: its type index plus every
/// element-value pair.
fn skip_annotation<R: Read>(reader: &mut ByteReader<R>) -> Result<()> {
    reader.skip(2)?; // type_index
    let num_pairs = reader.u16()? as usize;
    for _ in 0..num_pairs {
        reader.skip(2)?; // element_name_index
        skip_element_value(reader)?;
    }
    Ok(())
}

/// Reads a top-level annotation entry from a `RuntimeVisibleAnnotations`
/// attribute: the caller already knows this is an annotation worth
/// recording, so this returns the raw type-descriptor constant-pool index
/// and discards the element-value pairs that follow it.
pub fn read_annotation_type_index<R: Read>(reader: &mut ByteReader<R>) -> Result<u16> {
    let type_index = reader.u16()?;
    let num_pairs = reader.u16()? as usize;
    for _ in 0..num_pairs {
        reader.skip(2)?; // element_name_index
        skip_element_value(reader)?;
    }
    Ok(type_index)
}
