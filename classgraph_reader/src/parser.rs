use crate::access_flags::{ClassAccessFlags, FieldAccessFlags};
use crate::annotation_walker;
use crate::attribute_info::AttributeType;
use crate::byte_reader::ByteReader;
use crate::class_file_error::{ClassFileError, Result};
use crate::class_record::{FieldConstantValue, LogEntry, ParseOutcome, UnlinkedClassRecord};
use crate::constant_pool::{ConstantPool, ConstantValue};
use crate::field_type_extractor;
use crate::intern::StringInterner;
use crate::match_spec::FieldsWanted;
use crate::scan_filter::ScanFilter;
use log::Level;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::sync::Arc;

/// Reads one classfile per `parse` call and emits an [`UnlinkedClassRecord`]
/// or nothing.
///
/// Walks the classfile in its natural on-disk order — magic → version →
/// constant pool → access flags → this/super class → interfaces → fields →
/// methods → attributes — but every step can bail out to "skip this
/// classfile" instead of always building a complete record, and every
/// referenced name passes through the scan filter before it is interned.
///
/// The parser is single-use per call but reusable across calls: its
/// `ByteReader`'s buffer is kept between invocations (see
/// `ByteReader::reuse`) so a whole scan can reuse one parser/buffer pair
/// per worker instead of reallocating per classfile.
pub struct ClassfileParser {
    reader: Option<ByteReader<Box<dyn Read>>>,
    scan_non_public_fields: bool,
}

impl ClassfileParser {
    pub fn new(scan_non_public_fields: bool) -> Self {
        ClassfileParser {
            reader: None,
            scan_non_public_fields,
        }
    }

    /// Parses one classfile. Any structural error is caught here and turned
    /// into a discarded record plus a log entry: nothing in this crate
    /// propagates a per-classfile error past this call.
    pub fn parse(
        &mut self,
        input: Box<dyn Read>,
        relative_path: &str,
        filter: &dyn ScanFilter,
        fields_wanted: &FieldsWanted,
        interner: &StringInterner,
    ) -> ParseOutcome {
        let mut log = Vec::new();
        let result = self.parse_inner(input, relative_path, filter, fields_wanted, interner, &mut log);
        match result {
            Ok(record) => ParseOutcome { record, log },
            Err(e) => {
                log.push(LogEntry {
                    level: Level::Debug,
                    message: format!("{relative_path}: discarding classfile: {e}"),
                });
                ParseOutcome { record: None, log }
            }
        }
    }

    fn parse_inner(
        &mut self,
        input: Box<dyn Read>,
        relative_path: &str,
        filter: &dyn ScanFilter,
        fields_wanted: &FieldsWanted,
        interner: &StringInterner,
        log: &mut Vec<LogEntry>,
    ) -> Result<Option<UnlinkedClassRecord>> {
        match &mut self.reader {
            Some(reader) => reader.reuse(input)?,
            None => self.reader = Some(ByteReader::new(input)?),
        }
        let reader = self.reader.as_mut().unwrap();

        let magic = reader.u32()? as u32;
        if magic != 0xCAFE_BABE {
            log.push(LogEntry {
                level: Level::Debug,
                message: format!("{relative_path}: bad magic number {magic:#010X}"),
            });
            return Ok(None);
        }
        reader.skip(2)?; // minor_version
        reader.skip(2)?; // major_version

        let cp_count = reader.u16()? as usize;
        let constant_pool = ConstantPool::read(reader, cp_count)?;

        let access_bits = reader.u16()?;
        let access_flags = ClassAccessFlags::from_bits_truncate(access_bits);
        let is_interface = access_flags.contains(ClassAccessFlags::INTERFACE);
        let is_annotation = access_flags.contains(ClassAccessFlags::ANNOTATION);

        let this_class_index = reader.u16()?;
        let this_class_name = constant_pool
            .class_name(reader, this_class_index)?
            .ok_or_else(|| ClassFileError::InvalidClassData("this_class is null".to_string()))?;

        if this_class_name == "java.lang.Object" {
            return Ok(None);
        }

        match relative_path_to_dotted(relative_path) {
            Some(expected) if expected == this_class_name => {}
            _ => {
                log.push(LogEntry {
                    level: Level::Debug,
                    message: format!(
                        "{relative_path}: this_class {this_class_name} does not match path"
                    ),
                });
                return Ok(None);
            }
        }

        let class_name = interner.intern(&this_class_name);

        let super_class_index = reader.u16()?;
        let super_class_name = if super_class_index == 0 {
            None
        } else {
            constant_pool.class_name(reader, super_class_index)?
        };
        let superclass_name = match super_class_name {
            Some(name) if name != "java.lang.Object" && filter.is_allowed(&name) => {
                Some(interner.intern(&name))
            }
            _ => None,
        };

        let interfaces_count = reader.u16()? as usize;
        let mut implemented_interfaces = Vec::with_capacity(interfaces_count);
        for _ in 0..interfaces_count {
            let idx = reader.u16()?;
            if let Some(name) = constant_pool.class_name(reader, idx)? {
                if filter.is_allowed(&name) {
                    implemented_interfaces.push(interner.intern(&name));
                }
            }
        }

        let mut field_types: HashSet<Arc<str>> = HashSet::new();
        let mut static_final_field_values: HashMap<String, FieldConstantValue> = HashMap::new();
        let fields_wanted_for_class = fields_wanted.get(this_class_name.as_str());

        let field_count = reader.u16()? as usize;
        for _ in 0..field_count {
            read_one_field(
                reader,
                &constant_pool,
                filter,
                interner,
                fields_wanted_for_class,
                self.scan_non_public_fields,
                &mut field_types,
                &mut static_final_field_values,
            )?;
        }

        let method_count = reader.u16()? as usize;
        for _ in 0..method_count {
            skip_one_method(reader)?;
        }

        let mut annotations = Vec::new();
        let class_attr_count = reader.u16()? as usize;
        for _ in 0..class_attr_count {
            read_one_class_attribute(reader, &constant_pool, filter, interner, &mut annotations)?;
        }

        Ok(Some(UnlinkedClassRecord {
            class_name: Some(class_name),
            is_interface,
            is_annotation,
            superclass_name,
            implemented_interfaces,
            annotations,
            field_types,
            static_final_field_values,
        }))
    }
}

fn relative_path_to_dotted(relative_path: &str) -> Option<String> {
    relative_path
        .strip_suffix(".class")
        .map(|s| s.replace('/', "."))
}

#[allow(clippy::too_many_arguments)]
fn read_one_field<R: Read>(
    reader: &mut ByteReader<R>,
    cp: &ConstantPool,
    filter: &dyn ScanFilter,
    interner: &StringInterner,
    fields_wanted: Option<&HashSet<String>>,
    scan_non_public_fields: bool,
    field_types: &mut HashSet<Arc<str>>,
    static_values: &mut HashMap<String, FieldConstantValue>,
) -> Result<()> {
    let access_bits = reader.u16()?;
    let access_flags = FieldAccessFlags::from_bits_truncate(access_bits);
    let name_index = reader.u16()?;
    let descriptor_index = reader.u16()?;

    let is_public = access_flags.contains(FieldAccessFlags::PUBLIC);
    if !is_public && !scan_non_public_fields {
        skip_attributes(reader)?;
        return Ok(());
    }

    let name = cp.string(reader, name_index, false)?.unwrap_or_default();
    let descriptor = cp
        .string(reader, descriptor_index, false)?
        .unwrap_or_default();

    record_field_type_names(&descriptor, filter, interner, field_types);

    let is_static_final = access_flags.contains(FieldAccessFlags::STATIC | FieldAccessFlags::FINAL);
    let wants_constant = is_static_final
        && fields_wanted
            .map(|set| set.contains(&name))
            .unwrap_or(false);

    let mut constant_value_index: Option<u16> = None;
    let mut signature: Option<String> = None;

    let attr_count = reader.u16()? as usize;
    for _ in 0..attr_count {
        let attr_name_index = reader.u16()?;
        let attr_len = reader.u32()? as usize;
        let attr_type = attribute_type_at(cp, reader, attr_name_index)?;
        match attr_type {
            AttributeType::ConstantValue if wants_constant => {
                constant_value_index = Some(reader.u16()?);
            }
            AttributeType::Signature => {
                let sig_index = reader.u16()?;
                signature = cp.string(reader, sig_index, false)?;
            }
            _ => reader.skip(attr_len)?,
        }
    }

    if let Some(sig) = &signature {
        record_field_type_names(sig, filter, interner, field_types);
    }

    if let Some(idx) = constant_value_index {
        let value = coerce_constant_value(cp, reader, idx, &descriptor)?;
        static_values.insert(name, value);
    }

    Ok(())
}

fn record_field_type_names(
    descriptor_or_signature: &str,
    filter: &dyn ScanFilter,
    interner: &StringInterner,
    field_types: &mut HashSet<Arc<str>>,
) {
    for name in field_type_extractor::extract_class_names(descriptor_or_signature) {
        if filter.is_allowed(&name) {
            field_types.insert(interner.intern(&name));
        }
    }
}

fn attribute_type_at<R: Read>(
    cp: &ConstantPool,
    reader: &ByteReader<R>,
    name_index: u16,
) -> Result<AttributeType> {
    let name = cp.string(reader, name_index, false)?.unwrap_or_default();
    Ok(AttributeType::by_name(&name))
}

fn coerce_constant_value<R: Read>(
    cp: &ConstantPool,
    reader: &ByteReader<R>,
    index: u16,
    descriptor: &str,
) -> Result<FieldConstantValue> {
    let value = cp.value(reader, index)?;
    let first = descriptor.chars().next().unwrap_or('\0');
    match (first, value) {
        ('B', ConstantValue::Integer(i)) => Ok(FieldConstantValue::Byte(i as i8)),
        ('C', ConstantValue::Integer(i)) => Ok(FieldConstantValue::Char(i as u16)),
        ('S', ConstantValue::Integer(i)) => Ok(FieldConstantValue::Short(i as i16)),
        ('Z', ConstantValue::Integer(i)) => Ok(FieldConstantValue::Boolean(i != 0)),
        ('I', ConstantValue::Integer(i)) => Ok(FieldConstantValue::Int(i)),
        ('J', ConstantValue::Long(l)) => Ok(FieldConstantValue::Long(l)),
        ('F', ConstantValue::Float(f)) => Ok(FieldConstantValue::Float(f)),
        ('D', ConstantValue::Double(d)) => Ok(FieldConstantValue::Double(d)),
        ('L', ConstantValue::StringValue(s)) if descriptor == "Ljava/lang/String;" => {
            Ok(FieldConstantValue::String(s))
        }
        _ => Err(ClassFileError::UnsupportedConstantValueDescriptor(
            descriptor.to_string(),
        )),
    }
}

fn skip_attributes<R: Read>(reader: &mut ByteReader<R>) -> Result<()> {
    let count = reader.u16()? as usize;
    for _ in 0..count {
        reader.skip(2)?; // attribute_name_index
        let len = reader.u32()? as usize;
        reader.skip(len)?;
    }
    Ok(())
}

fn skip_one_method<R: Read>(reader: &mut ByteReader<R>) -> Result<()> {
    reader.skip(2)?; // access_flags
    reader.skip(2)?; // name_index
    reader.skip(2)?; // descriptor_index
    skip_attributes(reader)
}

fn read_one_class_attribute<R: Read>(
    reader: &mut ByteReader<R>,
    cp: &ConstantPool,
    filter: &dyn ScanFilter,
    interner: &StringInterner,
    annotations: &mut Vec<Arc<str>>,
) -> Result<()> {
    let name_index = reader.u16()?;
    let len = reader.u32()? as usize;
    if cp.string_equals(reader, name_index, "RuntimeVisibleAnnotations")? {
        let start = reader.position();
        let count = reader.u16()? as usize;
        for _ in 0..count {
            let type_index = annotation_walker::read_annotation_type_index(reader)?;
            if let Some(descriptor) = cp.string(reader, type_index, true)? {
                if let Some(name) = strip_l_semicolon(&descriptor) {
                    if filter.is_allowed(&name) {
                        annotations.push(interner.intern(&name));
                    }
                }
            }
        }
        let consumed = reader.position() - start;
        if consumed < len {
            reader.skip(len - consumed)?;
        }
    } else {
        reader.skip(len)?;
    }
    Ok(())
}

fn strip_l_semicolon(descriptor: &str) -> Option<String> {
    descriptor
        .strip_prefix('L')
        .and_then(|s| s.strip_suffix(';'))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan_filter::AllowAll;
    use std::io::Cursor;

    struct ClassBuilder {
        constants: Vec<Vec<u8>>,
    }

    impl ClassBuilder {
        fn new() -> Self {
            ClassBuilder { constants: vec![] }
        }

        fn utf8(&mut self, s: &str) -> u16 {
            let mut entry = vec![1u8];
            entry.extend((s.len() as u16).to_be_bytes());
            entry.extend(s.as_bytes());
            self.constants.push(entry);
            self.constants.len() as u16
        }

        fn class_ref(&mut self, name: &str) -> u16 {
            let utf8_index = self.utf8(name);
            let mut entry = vec![7u8];
            entry.extend(utf8_index.to_be_bytes());
            self.constants.push(entry);
            self.constants.len() as u16
        }

        fn integer(&mut self, v: i32) -> u16 {
            let mut entry = vec![3u8];
            entry.extend(v.to_be_bytes());
            self.constants.push(entry);
            self.constants.len() as u16
        }

        fn build(
            &self,
            access_flags: u16,
            this_class: u16,
            super_class: u16,
            interfaces: &[u16],
            fields: &[u8],
            methods: &[u8],
            class_attributes: &[u8],
        ) -> Vec<u8> {
            let mut out = Vec::new();
            out.extend(0xCAFEBABEu32.to_be_bytes());
            out.extend(0u16.to_be_bytes()); // minor
            out.extend(52u16.to_be_bytes()); // major
            out.extend(((self.constants.len() + 1) as u16).to_be_bytes());
            for c in &self.constants {
                out.extend(c);
            }
            out.extend(access_flags.to_be_bytes());
            out.extend(this_class.to_be_bytes());
            out.extend(super_class.to_be_bytes());
            out.extend((interfaces.len() as u16).to_be_bytes());
            for i in interfaces {
                out.extend(i.to_be_bytes());
            }
            out.extend(fields);
            out.extend(methods);
            out.extend(class_attributes);
            out
        }
    }

    fn no_methods() -> Vec<u8> {
        0u16.to_be_bytes().to_vec()
    }

    fn no_attrs() -> Vec<u8> {
        0u16.to_be_bytes().to_vec()
    }

    #[test]
    fn scenario_1_empty_pool_minimal_class() {
        // "A.class" extends java.lang.Object implicitly (super index 0)
        let mut b = ClassBuilder::new();
        let this_class = b.class_ref("A");
        let bytes = b.build(0x0021, this_class, 0, &[], &no_attrs(), &no_methods(), &no_attrs());

        let interner = StringInterner::new();
        let mut parser = ClassfileParser::new(false);
        let outcome = parser.parse(
            Box::new(Cursor::new(bytes)),
            "A.class",
            &AllowAll,
            &FieldsWanted::new(),
            &interner,
        );
        let record = outcome.record.expect("record");
        assert_eq!(&*record.class_name.unwrap(), "A");
        assert!(record.superclass_name.is_none());
        assert!(record.implemented_interfaces.is_empty());
    }

    #[test]
    fn scenario_2_static_final_int_constant() {
        let mut b = ClassBuilder::new();
        let this_class = b.class_ref("A");
        let name_idx = b.utf8("X");
        let descriptor_idx = b.utf8("I");
        let const_value_attr_name = b.utf8("ConstantValue");
        let const_idx = b.integer(42);

        let mut field = Vec::new();
        field.extend(0u16.to_be_bytes()); // field count placeholder, fixed below
        // access flags: PUBLIC(0x1)|STATIC(0x8)|FINAL(0x10) = 0x19
        let mut one_field = Vec::new();
        one_field.extend(0x19u16.to_be_bytes());
        one_field.extend(name_idx.to_be_bytes());
        one_field.extend(descriptor_idx.to_be_bytes());
        one_field.extend(1u16.to_be_bytes()); // 1 attribute
        one_field.extend(const_value_attr_name.to_be_bytes());
        one_field.extend(2u32.to_be_bytes()); // attr length
        one_field.extend(const_idx.to_be_bytes());

        let mut fields = Vec::new();
        fields.extend(1u16.to_be_bytes()); // field_count
        fields.extend(one_field);

        let bytes = b.build(0x0021, this_class, 0, &[], &fields, &no_methods(), &no_attrs());

        let interner = StringInterner::new();
        let mut fields_wanted = FieldsWanted::new();
        fields_wanted.insert("A".to_string(), HashSet::from(["X".to_string()]));
        let mut parser = ClassfileParser::new(false);
        let outcome = parser.parse(
            Box::new(Cursor::new(bytes)),
            "A.class",
            &AllowAll,
            &fields_wanted,
            &interner,
        );
        let record = outcome.record.expect("record");
        assert_eq!(
            record.static_final_field_values.get("X"),
            Some(&FieldConstantValue::Int(42))
        );
    }

    #[test]
    fn scenario_3_superclass_object_yields_no_edge() {
        let mut b = ClassBuilder::new();
        let this_class = b.class_ref("A");
        let super_class = b.class_ref("java/lang/Object");
        let bytes = b.build(
            0x0021,
            this_class,
            super_class,
            &[],
            &no_attrs(),
            &no_methods(),
            &no_attrs(),
        );
        let interner = StringInterner::new();
        let mut parser = ClassfileParser::new(false);
        let outcome = parser.parse(
            Box::new(Cursor::new(bytes)),
            "A.class",
            &AllowAll,
            &FieldsWanted::new(),
            &interner,
        );
        assert!(outcome.record.unwrap().superclass_name.is_none());
    }

    #[test]
    fn this_class_path_mismatch_is_skipped() {
        let mut b = ClassBuilder::new();
        let this_class = b.class_ref("A");
        let bytes = b.build(0x0021, this_class, 0, &[], &no_attrs(), &no_methods(), &no_attrs());
        let interner = StringInterner::new();
        let mut parser = ClassfileParser::new(false);
        let outcome = parser.parse(
            Box::new(Cursor::new(bytes)),
            "pkg/B.class",
            &AllowAll,
            &FieldsWanted::new(),
            &interner,
        );
        assert!(outcome.record.is_none());
        assert!(!outcome.log.is_empty());
    }

    #[test]
    fn bad_magic_is_skipped() {
        let bytes = vec![0x00, 0x00, 0x00, 0x00, 0, 0, 0, 0, 0, 1];
        let interner = StringInterner::new();
        let mut parser = ClassfileParser::new(false);
        let outcome = parser.parse(
            Box::new(Cursor::new(bytes)),
            "A.class",
            &AllowAll,
            &FieldsWanted::new(),
            &interner,
        );
        assert!(outcome.record.is_none());
    }

    #[test]
    fn interface_and_annotation_flags_and_annotation_edge() {
        let mut b = ClassBuilder::new();
        let this_class = b.class_ref("I");
        let rv_annotations = b.utf8("RuntimeVisibleAnnotations");
        let marker_descriptor = b.utf8("LMarker;");

        let mut attr_body = Vec::new();
        attr_body.extend(1u16.to_be_bytes()); // num_annotations
        attr_body.extend(marker_descriptor.to_be_bytes()); // type_index
        attr_body.extend(0u16.to_be_bytes()); // num_element_value_pairs

        let mut class_attrs = Vec::new();
        class_attrs.extend(1u16.to_be_bytes()); // attribute count
        class_attrs.extend(rv_annotations.to_be_bytes());
        class_attrs.extend((attr_body.len() as u32).to_be_bytes());
        class_attrs.extend(attr_body);

        // ACC_INTERFACE | ACC_ABSTRACT
        let bytes = b.build(
            0x0600,
            this_class,
            0,
            &[],
            &no_attrs(),
            &no_methods(),
            &class_attrs,
        );
        let interner = StringInterner::new();
        let mut parser = ClassfileParser::new(false);
        let outcome = parser.parse(
            Box::new(Cursor::new(bytes)),
            "I.class",
            &AllowAll,
            &FieldsWanted::new(),
            &interner,
        );
        let record = outcome.record.expect("record");
        assert!(record.is_interface);
        assert_eq!(record.annotations.len(), 1);
        assert_eq!(&*record.annotations[0], "Marker");
    }

    #[test]
    fn field_descriptor_and_signature_feed_field_types() {
        let mut b = ClassBuilder::new();
        let this_class = b.class_ref("A");
        let name_idx = b.utf8("list");
        let descriptor_idx = b.utf8("Ljava/util/List;");
        let signature_attr_name = b.utf8("Signature");
        let signature_idx = b.utf8("Ljava/util/List<Ljava/lang/String;>;");

        let mut one_field = Vec::new();
        one_field.extend(0x0001u16.to_be_bytes()); // PUBLIC
        one_field.extend(name_idx.to_be_bytes());
        one_field.extend(descriptor_idx.to_be_bytes());
        one_field.extend(1u16.to_be_bytes());
        one_field.extend(signature_attr_name.to_be_bytes());
        one_field.extend(2u32.to_be_bytes());
        one_field.extend(signature_idx.to_be_bytes());

        let mut fields = Vec::new();
        fields.extend(1u16.to_be_bytes());
        fields.extend(one_field);

        let bytes = b.build(0x0021, this_class, 0, &[], &fields, &no_methods(), &no_attrs());
        let interner = StringInterner::new();
        let mut parser = ClassfileParser::new(false);
        let outcome = parser.parse(
            Box::new(Cursor::new(bytes)),
            "A.class",
            &AllowAll,
            &FieldsWanted::new(),
            &interner,
        );
        let record = outcome.record.expect("record");
        let names: HashSet<String> = record.field_types.iter().map(|s| s.to_string()).collect();
        assert!(names.contains("java.util.List"));
        assert!(names.contains("java.lang.String"));
    }

    #[test]
    fn non_public_field_skipped_by_default() {
        let mut b = ClassBuilder::new();
        let this_class = b.class_ref("A");
        let name_idx = b.utf8("secret");
        let descriptor_idx = b.utf8("Ljava/util/List;");

        let mut one_field = Vec::new();
        one_field.extend(0x0002u16.to_be_bytes()); // PRIVATE
        one_field.extend(name_idx.to_be_bytes());
        one_field.extend(descriptor_idx.to_be_bytes());
        one_field.extend(0u16.to_be_bytes()); // no attrs

        let mut fields = Vec::new();
        fields.extend(1u16.to_be_bytes());
        fields.extend(one_field);

        let bytes = b.build(0x0021, this_class, 0, &[], &fields, &no_methods(), &no_attrs());
        let interner = StringInterner::new();
        let mut parser = ClassfileParser::new(false);
        let outcome = parser.parse(
            Box::new(Cursor::new(bytes)),
            "A.class",
            &AllowAll,
            &FieldsWanted::new(),
            &interner,
        );
        let record = outcome.record.expect("record");
        assert!(record.field_types.is_empty());
    }

    #[test]
    fn reader_is_reused_across_parses() {
        let interner = StringInterner::new();
        let mut parser = ClassfileParser::new(false);
        for i in 0..3 {
            let mut b = ClassBuilder::new();
            let this_class = b.class_ref(&format!("C{i}"));
            let bytes = b.build(0x0021, this_class, 0, &[], &no_attrs(), &no_methods(), &no_attrs());
            let outcome = parser.parse(
                Box::new(Cursor::new(bytes)),
                &format!("C{i}.class"),
                &AllowAll,
                &FieldsWanted::new(),
                &interner,
            );
            assert_eq!(&*outcome.record.unwrap().class_name.unwrap(), format!("C{i}"));
        }
    }
}
