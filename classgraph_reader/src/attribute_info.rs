/// The only class/field attributes this layer distinguishes by name; every
/// other attribute is skipped by its declared length without even
/// allocating a name for it. The JVM defines dozens — `Code`,
/// `StackMapTable`, `LineNumberTable`, and so on — but this reader never
/// disassembles a method body, so only the three names the parser
/// actually branches on are worth naming here.
#[derive(Debug, PartialEq, Eq)]
pub enum AttributeType {
    ConstantValue,
    Signature,
    RuntimeVisibleAnnotations,
    Other,
}

impl AttributeType {
    pub fn by_name(name: &str) -> AttributeType {
        match name {
            "ConstantValue" => AttributeType::ConstantValue,
            "Signature" => AttributeType::Signature,
            "RuntimeVisibleAnnotations" => AttributeType::RuntimeVisibleAnnotations,
            _ => AttributeType::Other,
        }
    }
}
