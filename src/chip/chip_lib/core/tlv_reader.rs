use super::tlv_tags::{self, anonymous_tag, common_tag, context_tag, Tag};
use super::tlv_types::{
    tlv_element_type_is_container, tlv_element_type_to_tlv_type, TlvElementType, TlvType,
    K_TLV_TAG_CONTROL_MASK,
};
use crate::ChipError;
use crate::ChipErrorResult;

use crate::chip_error_end_of_tlv;
use crate::chip_error_incorrect_state;
use crate::chip_error_invalid_integer_value;
use crate::chip_error_invalid_tlv_element;
use crate::chip_error_invalid_tlv_tag;
use crate::chip_error_tlv_underrun;
use crate::chip_error_unexpected_tlv_element;
use crate::chip_error_wrong_tlv_type;

use crate::verify_or_return_error;

// Positioned reader over one contiguous TLV encoding. Chained backing
// stores are not supported; certificate decoding always sees a single
// buffer.
pub trait TlvReader<'a> {
    fn init(&mut self, buf: &'a [u8]);

    fn next(&mut self) -> ChipErrorResult;

    fn next_tag(&mut self, expected_tag: Tag) -> ChipErrorResult;

    fn next_type_tag(&mut self, expected_type: TlvType, expected_tag: Tag) -> ChipErrorResult;

    fn expect(&self, expected_tag: Tag) -> ChipErrorResult;

    fn expect_type_tag(&self, expected_type: TlvType, expected_tag: Tag) -> ChipErrorResult;

    fn get_type(&self) -> TlvType;

    fn get_tag(&self) -> Tag;

    fn get_length(&self) -> usize;

    fn get_boolean(&self) -> Result<bool, ChipError>;

    fn get_u8(&self) -> Result<u8, ChipError>;
    fn get_u16(&self) -> Result<u16, ChipError>;
    fn get_u32(&self) -> Result<u32, ChipError>;
    fn get_u64(&self) -> Result<u64, ChipError>;
    fn get_i64(&self) -> Result<i64, ChipError>;

    fn get_bytes(&self) -> Result<&'a [u8], ChipError>;

    fn get_string(&self) -> Result<&'a str, ChipError>;

    fn enter_container(&mut self) -> Result<TlvType, ChipError>;

    fn exit_container(&mut self, outer_container_type: TlvType) -> ChipErrorResult;

    fn verify_end_of_container(&mut self) -> ChipErrorResult;

    fn skip(&mut self) -> ChipErrorResult;
}

struct ElementHead {
    tag: Tag,
    elem_type: TlvElementType,
    len_or_val: u64,
    payload_offset: usize,
    // For containers this is the body start, otherwise the offset just past
    // the element.
    next_offset: usize,
}

pub struct TlvContiguousBufferReader<'a> {
    m_buf: &'a [u8],
    m_cursor: usize,
    m_elem_type: TlvElementType,
    m_elem_tag: Tag,
    m_elem_len_or_val: u64,
    m_payload_offset: usize,
    m_container_type: TlvType,
    m_elem_is_unread_container: bool,
    m_at_end_of_container: bool,
}

impl<'a> Default for TlvContiguousBufferReader<'a> {
    fn default() -> Self {
        TlvContiguousBufferReader::const_default()
    }
}

fn read_le(buf: &[u8], offset: usize, size: usize) -> Result<u64, ChipError> {
    verify_or_return_error!(offset + size <= buf.len(), Err(chip_error_tlv_underrun!()));
    let mut value: u64 = 0;
    for i in 0..size {
        value |= (buf[offset + i] as u64) << (8 * i);
    }
    Ok(value)
}

fn sign_extend(value: u64, size: usize) -> u64 {
    let shift = 64 - 8 * size as u32;
    (((value << shift) as i64) >> shift) as u64
}

impl<'a> TlvContiguousBufferReader<'a> {
    pub const fn const_default() -> Self {
        Self {
            m_buf: &[],
            m_cursor: 0,
            m_elem_type: TlvElementType::NotSpecified,
            m_elem_tag: tlv_tags::unknown_tag(),
            m_elem_len_or_val: 0,
            m_payload_offset: 0,
            m_container_type: TlvType::KtlvTypeNotSpecified,
            m_elem_is_unread_container: false,
            m_at_end_of_container: false,
        }
    }

    pub fn new(buf: &'a [u8]) -> Self {
        let mut reader = Self::const_default();
        <Self as TlvReader>::init(&mut reader, buf);
        reader
    }

    fn clear_element_state(&mut self) {
        self.m_elem_type = TlvElementType::NotSpecified;
        self.m_elem_tag = anonymous_tag();
        self.m_elem_len_or_val = 0;
        self.m_payload_offset = 0;
        self.m_elem_is_unread_container = false;
    }

    fn parse_head(buf: &'a [u8], offset: usize) -> Result<ElementHead, ChipError> {
        verify_or_return_error!(offset < buf.len(), Err(chip_error_tlv_underrun!()));

        let control = buf[offset];
        let elem_type = TlvElementType::from_control_byte(control)
            .ok_or(chip_error_invalid_tlv_element!())?;

        let (tag, tag_size): (Tag, usize) = match control & K_TLV_TAG_CONTROL_MASK {
            0x00 => (anonymous_tag(), 0),
            0x20 => {
                verify_or_return_error!(offset + 2 <= buf.len(), Err(chip_error_tlv_underrun!()));
                (context_tag(buf[offset + 1]), 1)
            }
            0x40 => (common_tag(read_le(buf, offset + 1, 2)? as u32), 2),
            0x60 => (common_tag(read_le(buf, offset + 1, 4)? as u32), 4),
            // Implicit-profile and fully-qualified tags never appear in
            // certificate encodings.
            _ => return Err(chip_error_invalid_tlv_tag!()),
        };

        let value_offset = offset + 1 + tag_size;

        use TlvElementType::*;
        let head = match elem_type {
            Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 | UInt64 => {
                let size = 1usize << ((elem_type as u8) & 0x3);
                let mut value = read_le(buf, value_offset, size)?;
                if matches!(elem_type, Int8 | Int16 | Int32 | Int64) {
                    value = sign_extend(value, size);
                }
                ElementHead {
                    tag,
                    elem_type,
                    len_or_val: value,
                    payload_offset: value_offset,
                    next_offset: value_offset + size,
                }
            }
            BooleanFalse | BooleanTrue | Null => ElementHead {
                tag,
                elem_type,
                len_or_val: (elem_type == BooleanTrue) as u64,
                payload_offset: value_offset,
                next_offset: value_offset,
            },
            Utf8String1ByteLength | ByteString1ByteLength | Utf8String2ByteLength
            | ByteString2ByteLength => {
                let len_size = match elem_type {
                    Utf8String1ByteLength | ByteString1ByteLength => 1,
                    _ => 2,
                };
                let len = read_le(buf, value_offset, len_size)? as usize;
                let payload_offset = value_offset + len_size;
                verify_or_return_error!(
                    payload_offset + len <= buf.len(),
                    Err(chip_error_tlv_underrun!())
                );
                ElementHead {
                    tag,
                    elem_type,
                    len_or_val: len as u64,
                    payload_offset,
                    next_offset: payload_offset + len,
                }
            }
            Structure | Array | List => ElementHead {
                tag,
                elem_type,
                len_or_val: 0,
                payload_offset: value_offset,
                next_offset: value_offset,
            },
            EndOfContainer => ElementHead {
                tag: anonymous_tag(),
                elem_type,
                len_or_val: 0,
                payload_offset: offset + 1,
                next_offset: offset + 1,
            },
            _ => return Err(chip_error_invalid_tlv_element!()),
        };

        Ok(head)
    }

    // Consume elements starting at `start` up to and including the
    // end-of-container byte matching the current nesting level.
    fn skip_to_end_of_container(&self, start: usize) -> Result<usize, ChipError> {
        let mut depth = 0usize;
        let mut offset = start;

        loop {
            let head = Self::parse_head(self.m_buf, offset)?;
            if head.elem_type == TlvElementType::EndOfContainer {
                if depth == 0 {
                    return Ok(offset + 1);
                }
                depth -= 1;
                offset += 1;
            } else if tlv_element_type_is_container(head.elem_type) {
                depth += 1;
                offset = head.payload_offset;
            } else {
                offset = head.next_offset;
            }
        }
    }

    fn unsigned_value(&self) -> Result<u64, ChipError> {
        use TlvElementType::*;
        match self.m_elem_type {
            UInt8 | UInt16 | UInt32 | UInt64 => Ok(self.m_elem_len_or_val),
            _ => Err(chip_error_wrong_tlv_type!()),
        }
    }
}

impl<'a> TlvReader<'a> for TlvContiguousBufferReader<'a> {
    fn init(&mut self, buf: &'a [u8]) {
        self.m_buf = buf;
        self.m_cursor = 0;
        self.m_container_type = TlvType::KtlvTypeNotSpecified;
        self.m_at_end_of_container = false;
        self.clear_element_state();
        self.m_elem_tag = tlv_tags::unknown_tag();
    }

    fn next(&mut self) -> ChipErrorResult {
        verify_or_return_error!(!self.m_at_end_of_container, Err(chip_error_end_of_tlv!()));

        let offset = if self.m_elem_is_unread_container {
            self.skip_to_end_of_container(self.m_payload_offset)?
        } else {
            self.m_cursor
        };
        self.m_elem_is_unread_container = false;

        if offset >= self.m_buf.len() {
            // Containers must be closed by an end-of-container element.
            verify_or_return_error!(
                self.m_container_type == TlvType::KtlvTypeNotSpecified,
                Err(chip_error_tlv_underrun!())
            );
            self.m_cursor = offset;
            self.clear_element_state();
            return Err(chip_error_end_of_tlv!());
        }

        let head = Self::parse_head(self.m_buf, offset)?;
        if head.elem_type == TlvElementType::EndOfContainer {
            verify_or_return_error!(
                self.m_container_type != TlvType::KtlvTypeNotSpecified,
                Err(chip_error_invalid_tlv_element!())
            );
            self.m_at_end_of_container = true;
            self.m_cursor = offset;
            self.clear_element_state();
            return Err(chip_error_end_of_tlv!());
        }

        self.m_elem_type = head.elem_type;
        self.m_elem_tag = head.tag;
        self.m_elem_len_or_val = head.len_or_val;
        self.m_payload_offset = head.payload_offset;
        self.m_elem_is_unread_container = tlv_element_type_is_container(head.elem_type);
        self.m_cursor = head.next_offset;

        Ok(())
    }

    fn next_tag(&mut self, expected_tag: Tag) -> ChipErrorResult {
        self.next()?;
        self.expect(expected_tag)
    }

    fn next_type_tag(&mut self, expected_type: TlvType, expected_tag: Tag) -> ChipErrorResult {
        self.next()?;
        self.expect_type_tag(expected_type, expected_tag)
    }

    fn expect(&self, expected_tag: Tag) -> ChipErrorResult {
        verify_or_return_error!(
            self.m_elem_type != TlvElementType::NotSpecified,
            Err(chip_error_wrong_tlv_type!())
        );
        verify_or_return_error!(
            self.get_tag() == expected_tag,
            Err(chip_error_unexpected_tlv_element!())
        );
        Ok(())
    }

    fn expect_type_tag(&self, expected_type: TlvType, expected_tag: Tag) -> ChipErrorResult {
        self.expect(expected_tag)?;
        verify_or_return_error!(
            self.get_type() == expected_type,
            Err(chip_error_wrong_tlv_type!())
        );
        Ok(())
    }

    fn get_type(&self) -> TlvType {
        tlv_element_type_to_tlv_type(self.m_elem_type)
    }

    fn get_tag(&self) -> Tag {
        self.m_elem_tag
    }

    fn get_length(&self) -> usize {
        use TlvElementType::*;
        match self.m_elem_type {
            Utf8String1ByteLength | Utf8String2ByteLength | ByteString1ByteLength
            | ByteString2ByteLength => self.m_elem_len_or_val as usize,
            _ => 0,
        }
    }

    fn get_boolean(&self) -> Result<bool, ChipError> {
        match self.m_elem_type {
            TlvElementType::BooleanFalse => Ok(false),
            TlvElementType::BooleanTrue => Ok(true),
            _ => Err(chip_error_wrong_tlv_type!()),
        }
    }

    fn get_u8(&self) -> Result<u8, ChipError> {
        let v = self.unsigned_value()?;
        verify_or_return_error!(v <= u8::MAX as u64, Err(chip_error_invalid_integer_value!()));
        Ok(v as u8)
    }

    fn get_u16(&self) -> Result<u16, ChipError> {
        let v = self.unsigned_value()?;
        verify_or_return_error!(v <= u16::MAX as u64, Err(chip_error_invalid_integer_value!()));
        Ok(v as u16)
    }

    fn get_u32(&self) -> Result<u32, ChipError> {
        let v = self.unsigned_value()?;
        verify_or_return_error!(v <= u32::MAX as u64, Err(chip_error_invalid_integer_value!()));
        Ok(v as u32)
    }

    fn get_u64(&self) -> Result<u64, ChipError> {
        self.unsigned_value()
    }

    fn get_i64(&self) -> Result<i64, ChipError> {
        use TlvElementType::*;
        match self.m_elem_type {
            Int8 | Int16 | Int32 | Int64 => Ok(self.m_elem_len_or_val as i64),
            _ => Err(chip_error_wrong_tlv_type!()),
        }
    }

    fn get_bytes(&self) -> Result<&'a [u8], ChipError> {
        use TlvElementType::*;
        match self.m_elem_type {
            Utf8String1ByteLength | Utf8String2ByteLength | ByteString1ByteLength
            | ByteString2ByteLength => {
                let len = self.m_elem_len_or_val as usize;
                Ok(&self.m_buf[self.m_payload_offset..self.m_payload_offset + len])
            }
            _ => Err(chip_error_wrong_tlv_type!()),
        }
    }

    fn get_string(&self) -> Result<&'a str, ChipError> {
        use TlvElementType::*;
        match self.m_elem_type {
            Utf8String1ByteLength | Utf8String2ByteLength => {
                let len = self.m_elem_len_or_val as usize;
                core::str::from_utf8(&self.m_buf[self.m_payload_offset..self.m_payload_offset + len])
                    .map_err(|_| chip_error_invalid_tlv_element!())
            }
            _ => Err(chip_error_wrong_tlv_type!()),
        }
    }

    fn enter_container(&mut self) -> Result<TlvType, ChipError> {
        verify_or_return_error!(
            self.m_elem_is_unread_container,
            Err(chip_error_incorrect_state!())
        );

        let outer = self.m_container_type;
        self.m_container_type = tlv_element_type_to_tlv_type(self.m_elem_type);
        self.m_cursor = self.m_payload_offset;
        self.clear_element_state();

        Ok(outer)
    }

    fn exit_container(&mut self, outer_container_type: TlvType) -> ChipErrorResult {
        verify_or_return_error!(
            self.m_container_type != TlvType::KtlvTypeNotSpecified,
            Err(chip_error_incorrect_state!())
        );

        let offset = if self.m_at_end_of_container {
            // Sitting on the end-of-container byte; consume it.
            self.m_cursor + 1
        } else {
            let start = if self.m_elem_is_unread_container {
                self.skip_to_end_of_container(self.m_payload_offset)?
            } else {
                self.m_cursor
            };
            self.skip_to_end_of_container(start)?
        };

        self.m_at_end_of_container = false;
        self.m_cursor = offset;
        self.m_container_type = outer_container_type;
        self.clear_element_state();

        Ok(())
    }

    fn verify_end_of_container(&mut self) -> ChipErrorResult {
        match self.next() {
            Err(e) if e == chip_error_end_of_tlv!() => Ok(()),
            Err(e) => Err(e),
            Ok(()) => Err(chip_error_unexpected_tlv_element!()),
        }
    }

    fn skip(&mut self) -> ChipErrorResult {
        if self.m_elem_is_unread_container {
            self.m_cursor = self.skip_to_end_of_container(self.m_payload_offset)?;
            self.m_elem_is_unread_container = false;
        }
        self.clear_element_state();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::chip_lib::core::tlv_writer::{TlvContiguousBufferWriter, TlvWriter};

    fn written<'b>(buf: &'b mut [u8; 128], build: impl FnOnce(&mut TlvContiguousBufferWriter)) -> usize {
        let mut writer = TlvContiguousBufferWriter::new(buf);
        build(&mut writer);
        writer.get_length_written()
    }

    #[test]
    fn read_plain_integers() {
        let mut buf = [0u8; 128];
        let len = written(&mut buf, |w| {
            let mut outer = TlvType::KtlvTypeNotSpecified;
            w.start_container(anonymous_tag(), TlvType::KtlvTypeStructure, &mut outer)
                .unwrap();
            w.put_u64(context_tag(1), 5).unwrap();
            w.put_u64(context_tag(2), 0x1_0000).unwrap();
            w.put_boolean(context_tag(3), true).unwrap();
            w.end_container(outer).unwrap();
        });

        let mut reader = TlvContiguousBufferReader::new(&buf[..len]);
        reader.next().unwrap();
        reader
            .expect_type_tag(TlvType::KtlvTypeStructure, anonymous_tag())
            .unwrap();
        let outer = reader.enter_container().unwrap();

        reader.next_tag(context_tag(1)).unwrap();
        assert_eq!(Ok(5), reader.get_u8());
        reader.next_tag(context_tag(2)).unwrap();
        assert!(reader.get_u16().is_err());
        assert_eq!(Ok(0x1_0000), reader.get_u32());
        reader.next_tag(context_tag(3)).unwrap();
        assert_eq!(Ok(true), reader.get_boolean());

        reader.verify_end_of_container().unwrap();
        reader.exit_container(outer).unwrap();
        assert!(reader.next().is_err());
    }

    #[test]
    fn read_strings_and_bytes() {
        let mut buf = [0u8; 128];
        let len = written(&mut buf, |w| {
            let mut outer = TlvType::KtlvTypeNotSpecified;
            w.start_container(anonymous_tag(), TlvType::KtlvTypeStructure, &mut outer)
                .unwrap();
            w.put_string(context_tag(1), "hello").unwrap();
            w.put_bytes(context_tag(2), &[1, 2, 3, 4]).unwrap();
            w.end_container(outer).unwrap();
        });

        let mut reader = TlvContiguousBufferReader::new(&buf[..len]);
        reader.next().unwrap();
        let outer = reader.enter_container().unwrap();
        reader.next_tag(context_tag(1)).unwrap();
        assert_eq!(Ok("hello"), reader.get_string());
        assert_eq!(5, reader.get_length());
        reader.next_tag(context_tag(2)).unwrap();
        assert_eq!(Ok(&[1u8, 2, 3, 4][..]), reader.get_bytes());
        reader.exit_container(outer).unwrap();
    }

    #[test]
    fn skipping_unread_nested_container() {
        let mut buf = [0u8; 128];
        let len = written(&mut buf, |w| {
            let mut outer = TlvType::KtlvTypeNotSpecified;
            w.start_container(anonymous_tag(), TlvType::KtlvTypeStructure, &mut outer)
                .unwrap();
            let mut inner = TlvType::KtlvTypeNotSpecified;
            w.start_container(context_tag(1), TlvType::KtlvTypeList, &mut inner)
                .unwrap();
            w.put_u64(context_tag(7), 99).unwrap();
            w.end_container(inner).unwrap();
            w.put_u64(context_tag(2), 42).unwrap();
            w.end_container(outer).unwrap();
        });

        let mut reader = TlvContiguousBufferReader::new(&buf[..len]);
        reader.next().unwrap();
        let outer = reader.enter_container().unwrap();
        // Move onto the list but do not enter it; the next call must hop
        // over its body.
        reader.next_tag(context_tag(1)).unwrap();
        reader.next_tag(context_tag(2)).unwrap();
        assert_eq!(Ok(42), reader.get_u64());
        reader.exit_container(outer).unwrap();
    }

    #[test]
    fn exit_container_mid_way() {
        let mut buf = [0u8; 128];
        let len = written(&mut buf, |w| {
            let mut outer = TlvType::KtlvTypeNotSpecified;
            w.start_container(anonymous_tag(), TlvType::KtlvTypeStructure, &mut outer)
                .unwrap();
            w.put_u64(context_tag(1), 1).unwrap();
            w.put_u64(context_tag(2), 2).unwrap();
            w.put_u64(context_tag(3), 3).unwrap();
            w.end_container(outer).unwrap();
        });

        let mut reader = TlvContiguousBufferReader::new(&buf[..len]);
        reader.next().unwrap();
        let outer = reader.enter_container().unwrap();
        reader.next_tag(context_tag(1)).unwrap();
        reader.exit_container(outer).unwrap();
        assert!(reader.next().is_err());
    }

    #[test]
    fn truncated_input_is_underrun() {
        let mut buf = [0u8; 128];
        let len = written(&mut buf, |w| {
            let mut outer = TlvType::KtlvTypeNotSpecified;
            w.start_container(anonymous_tag(), TlvType::KtlvTypeStructure, &mut outer)
                .unwrap();
            w.put_bytes(context_tag(1), &[9; 16]).unwrap();
            w.end_container(outer).unwrap();
        });

        let mut reader = TlvContiguousBufferReader::new(&buf[..len - 4]);
        reader.next().unwrap();
        let _outer = reader.enter_container().unwrap();
        assert_eq!(Err(chip_error_tlv_underrun!()), reader.next_tag(context_tag(1)));
    }
}
