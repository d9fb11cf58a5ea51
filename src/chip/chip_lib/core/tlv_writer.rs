use super::tlv_tags::{
    is_context_tag, is_special_tag, profile_id_from_tag, tag_num_from_tag, Tag, TlvCommonProfiles,
};
use super::tlv_types::{container_type_to_element_type, TlvElementType, TlvType};
use crate::ChipErrorResult;

use crate::chip_error_buffer_too_small;
use crate::chip_error_incorrect_state;
use crate::chip_error_invalid_tlv_tag;

use crate::verify_or_return_error;

pub trait TlvWriter {
    fn put_boolean(&mut self, tag: Tag, value: bool) -> ChipErrorResult;

    // Unsigned integers are written with the smallest encoding that holds
    // the value, as the standard writer does.
    fn put_u64(&mut self, tag: Tag, value: u64) -> ChipErrorResult;

    fn put_u32(&mut self, tag: Tag, value: u32) -> ChipErrorResult {
        self.put_u64(tag, value as u64)
    }

    fn put_u16(&mut self, tag: Tag, value: u16) -> ChipErrorResult {
        self.put_u64(tag, value as u64)
    }

    fn put_u8(&mut self, tag: Tag, value: u8) -> ChipErrorResult {
        self.put_u64(tag, value as u64)
    }

    fn put_bytes(&mut self, tag: Tag, bytes: &[u8]) -> ChipErrorResult;

    fn put_string(&mut self, tag: Tag, value: &str) -> ChipErrorResult;

    fn start_container(
        &mut self,
        tag: Tag,
        container_type: TlvType,
        outer_container_type: &mut TlvType,
    ) -> ChipErrorResult;

    fn end_container(&mut self, outer_container_type: TlvType) -> ChipErrorResult;

    fn get_length_written(&self) -> usize;
}

pub struct TlvContiguousBufferWriter<'a> {
    m_buf: &'a mut [u8],
    m_write_point: usize,
    m_container_type: TlvType,
}

impl<'a> TlvContiguousBufferWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            m_buf: buf,
            m_write_point: 0,
            m_container_type: TlvType::KtlvTypeNotSpecified,
        }
    }

    fn write_byte(&mut self, byte: u8) -> ChipErrorResult {
        verify_or_return_error!(
            self.m_write_point < self.m_buf.len(),
            Err(chip_error_buffer_too_small!())
        );
        self.m_buf[self.m_write_point] = byte;
        self.m_write_point += 1;
        Ok(())
    }

    fn write_le(&mut self, value: u64, size: usize) -> ChipErrorResult {
        for i in 0..size {
            self.write_byte((value >> (8 * i)) as u8)?;
        }
        Ok(())
    }

    // Emits the control byte and tag field. Only the tag forms the reader
    // understands are supported.
    fn write_control_and_tag(&mut self, tag: Tag, elem_type: TlvElementType) -> ChipErrorResult {
        let elem_bits = (elem_type as u8) & 0x1F;

        if is_special_tag(&tag) {
            let tag_num = tag_num_from_tag(&tag);
            if is_context_tag(&tag) {
                self.write_byte(0x20 | elem_bits)?;
                return self.write_byte(tag_num as u8);
            }
            // Anonymous tag.
            verify_or_return_error!(
                tag_num == tag_num_from_tag(&super::tlv_tags::anonymous_tag()),
                Err(chip_error_invalid_tlv_tag!())
            );
            return self.write_byte(elem_bits);
        }

        verify_or_return_error!(
            profile_id_from_tag(&tag) == TlvCommonProfiles::KcommonProfileId as u32,
            Err(chip_error_invalid_tlv_tag!())
        );
        let tag_num = tag_num_from_tag(&tag);
        if tag_num <= u16::MAX as u32 {
            self.write_byte(0x40 | elem_bits)?;
            self.write_le(tag_num as u64, 2)
        } else {
            self.write_byte(0x60 | elem_bits)?;
            self.write_le(tag_num as u64, 4)
        }
    }
}

impl<'a> TlvWriter for TlvContiguousBufferWriter<'a> {
    fn put_boolean(&mut self, tag: Tag, value: bool) -> ChipErrorResult {
        let elem_type = if value {
            TlvElementType::BooleanTrue
        } else {
            TlvElementType::BooleanFalse
        };
        self.write_control_and_tag(tag, elem_type)
    }

    fn put_u64(&mut self, tag: Tag, value: u64) -> ChipErrorResult {
        let (elem_type, size) = if value <= u8::MAX as u64 {
            (TlvElementType::UInt8, 1)
        } else if value <= u16::MAX as u64 {
            (TlvElementType::UInt16, 2)
        } else if value <= u32::MAX as u64 {
            (TlvElementType::UInt32, 4)
        } else {
            (TlvElementType::UInt64, 8)
        };
        self.write_control_and_tag(tag, elem_type)?;
        self.write_le(value, size)
    }

    fn put_bytes(&mut self, tag: Tag, bytes: &[u8]) -> ChipErrorResult {
        if bytes.len() <= u8::MAX as usize {
            self.write_control_and_tag(tag, TlvElementType::ByteString1ByteLength)?;
            self.write_le(bytes.len() as u64, 1)?;
        } else {
            verify_or_return_error!(
                bytes.len() <= u16::MAX as usize,
                Err(chip_error_buffer_too_small!())
            );
            self.write_control_and_tag(tag, TlvElementType::ByteString2ByteLength)?;
            self.write_le(bytes.len() as u64, 2)?;
        }
        for b in bytes {
            self.write_byte(*b)?;
        }
        Ok(())
    }

    fn put_string(&mut self, tag: Tag, value: &str) -> ChipErrorResult {
        let bytes = value.as_bytes();
        if bytes.len() <= u8::MAX as usize {
            self.write_control_and_tag(tag, TlvElementType::Utf8String1ByteLength)?;
            self.write_le(bytes.len() as u64, 1)?;
        } else {
            verify_or_return_error!(
                bytes.len() <= u16::MAX as usize,
                Err(chip_error_buffer_too_small!())
            );
            self.write_control_and_tag(tag, TlvElementType::Utf8String2ByteLength)?;
            self.write_le(bytes.len() as u64, 2)?;
        }
        for b in bytes {
            self.write_byte(*b)?;
        }
        Ok(())
    }

    fn start_container(
        &mut self,
        tag: Tag,
        container_type: TlvType,
        outer_container_type: &mut TlvType,
    ) -> ChipErrorResult {
        let elem_type =
            container_type_to_element_type(container_type).ok_or(chip_error_incorrect_state!())?;
        self.write_control_and_tag(tag, elem_type)?;
        *outer_container_type = self.m_container_type;
        self.m_container_type = container_type;
        Ok(())
    }

    fn end_container(&mut self, outer_container_type: TlvType) -> ChipErrorResult {
        verify_or_return_error!(
            self.m_container_type != TlvType::KtlvTypeNotSpecified,
            Err(chip_error_incorrect_state!())
        );
        self.write_byte(TlvElementType::EndOfContainer as u8)?;
        self.m_container_type = outer_container_type;
        Ok(())
    }

    fn get_length_written(&self) -> usize {
        self.m_write_point
    }
}
