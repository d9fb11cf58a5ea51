#![allow(dead_code)]

// Element types occupy the low 5 bits of the control byte. The values are
// fixed by the Matter TLV encoding.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlvElementType {
    NotSpecified = -1,
    Int8 = 0x00,
    Int16 = 0x01,
    Int32 = 0x02,
    Int64 = 0x03,
    UInt8 = 0x04,
    UInt16 = 0x05,
    UInt32 = 0x06,
    UInt64 = 0x07,
    BooleanFalse = 0x08,
    BooleanTrue = 0x09,
    FloatingPointNumber32 = 0x0A,
    FloatingPointNumber64 = 0x0B,
    Utf8String1ByteLength = 0x0C,
    Utf8String2ByteLength = 0x0D,
    Utf8String4ByteLength = 0x0E,
    Utf8String8ByteLength = 0x0F,
    ByteString1ByteLength = 0x10,
    ByteString2ByteLength = 0x11,
    ByteString4ByteLength = 0x12,
    ByteString8ByteLength = 0x13,
    Null = 0x14,
    Structure = 0x15,
    Array = 0x16,
    List = 0x17,
    EndOfContainer = 0x18,
}

pub const K_TLV_TYPE_MASK: u8 = 0x1F;
pub const K_TLV_TAG_CONTROL_MASK: u8 = 0xE0;

impl TlvElementType {
    pub fn from_control_byte(control: u8) -> Option<TlvElementType> {
        use TlvElementType::*;
        match control & K_TLV_TYPE_MASK {
            0x00 => Some(Int8),
            0x01 => Some(Int16),
            0x02 => Some(Int32),
            0x03 => Some(Int64),
            0x04 => Some(UInt8),
            0x05 => Some(UInt16),
            0x06 => Some(UInt32),
            0x07 => Some(UInt64),
            0x08 => Some(BooleanFalse),
            0x09 => Some(BooleanTrue),
            0x0A => Some(FloatingPointNumber32),
            0x0B => Some(FloatingPointNumber64),
            0x0C => Some(Utf8String1ByteLength),
            0x0D => Some(Utf8String2ByteLength),
            0x0E => Some(Utf8String4ByteLength),
            0x0F => Some(Utf8String8ByteLength),
            0x10 => Some(ByteString1ByteLength),
            0x11 => Some(ByteString2ByteLength),
            0x12 => Some(ByteString4ByteLength),
            0x13 => Some(ByteString8ByteLength),
            0x14 => Some(Null),
            0x15 => Some(Structure),
            0x16 => Some(Array),
            0x17 => Some(List),
            0x18 => Some(EndOfContainer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlvType {
    KtlvTypeNotSpecified,
    KtlvTypeSignedInteger,
    KtlvTypeUnsignedInteger,
    KtlvTypeBoolean,
    KtlvTypeFloatingPointNumber,
    KtlvTypeUtf8String,
    KtlvTypeByteString,
    KtlvTypeNull,
    KtlvTypeStructure,
    KtlvTypeArray,
    KtlvTypeList,
}

pub fn tlv_element_type_to_tlv_type(elem: TlvElementType) -> TlvType {
    use TlvElementType::*;
    match elem {
        Int8 | Int16 | Int32 | Int64 => TlvType::KtlvTypeSignedInteger,
        UInt8 | UInt16 | UInt32 | UInt64 => TlvType::KtlvTypeUnsignedInteger,
        BooleanFalse | BooleanTrue => TlvType::KtlvTypeBoolean,
        FloatingPointNumber32 | FloatingPointNumber64 => TlvType::KtlvTypeFloatingPointNumber,
        Utf8String1ByteLength | Utf8String2ByteLength | Utf8String4ByteLength
        | Utf8String8ByteLength => TlvType::KtlvTypeUtf8String,
        ByteString1ByteLength | ByteString2ByteLength | ByteString4ByteLength
        | ByteString8ByteLength => TlvType::KtlvTypeByteString,
        Null => TlvType::KtlvTypeNull,
        Structure => TlvType::KtlvTypeStructure,
        Array => TlvType::KtlvTypeArray,
        List => TlvType::KtlvTypeList,
        NotSpecified | EndOfContainer => TlvType::KtlvTypeNotSpecified,
    }
}

pub fn tlv_type_is_container(t: TlvType) -> bool {
    matches!(
        t,
        TlvType::KtlvTypeStructure | TlvType::KtlvTypeArray | TlvType::KtlvTypeList
    )
}

pub fn tlv_element_type_is_container(elem: TlvElementType) -> bool {
    matches!(
        elem,
        TlvElementType::Structure | TlvElementType::Array | TlvElementType::List
    )
}

pub fn container_type_to_element_type(t: TlvType) -> Option<TlvElementType> {
    match t {
        TlvType::KtlvTypeStructure => Some(TlvElementType::Structure),
        TlvType::KtlvTypeArray => Some(TlvElementType::Array),
        TlvType::KtlvTypeList => Some(TlvElementType::List),
        _ => None,
    }
}
