use super::asn1::{der, der_encoding_for_oid};
use super::asn1_time::Asn1UniversalTime;
use super::{Class, Oid, Tag};
use crate::ChipErrorResult;

use crate::asn1_error_invalid_state;
use crate::asn1_error_length_overflow;
use crate::asn1_error_max_depth_exceeded;
use crate::asn1_error_overflow;
use crate::asn1_error_unknown_object_id;
use crate::asn1_error_unsupported_encoding;
use crate::verify_or_return_error;

// Constructed/encapsulated types may nest this deep while encoding a
// certificate.
pub const K_MAX_DEFERRED_LENGTH_DEPTH: usize = 10;

pub trait Asn1Writer {
    fn put_integer(&mut self, value: i64) -> ChipErrorResult;

    // Writes an INTEGER whose content octets are supplied verbatim.
    fn put_integer_from_bytes(&mut self, value: &[u8]) -> ChipErrorResult;

    fn put_boolean(&mut self, value: bool) -> ChipErrorResult;

    fn put_object_id(&mut self, oid: Oid) -> ChipErrorResult;

    fn put_string(&mut self, tag: Tag, value: &str) -> ChipErrorResult;

    fn put_octet_string(&mut self, bytes: &[u8]) -> ChipErrorResult;

    fn put_bit_string(&mut self, unused_bits: u8, bytes: &[u8]) -> ChipErrorResult;

    fn put_time(&mut self, time: &Asn1UniversalTime) -> ChipErrorResult;

    fn put_null(&mut self) -> ChipErrorResult;

    // A context-specific primitive value, e.g. the keyIdentifier inside an
    // AuthorityKeyIdentifier.
    fn put_context_value(&mut self, tag: Tag, bytes: &[u8]) -> ChipErrorResult;

    // Copies an already-encoded DER element through unchanged.
    fn put_raw_der(&mut self, bytes: &[u8]) -> ChipErrorResult;

    fn start_constructed(&mut self, cls: Class, tag: Tag) -> ChipErrorResult;

    fn end_constructed(&mut self) -> ChipErrorResult;

    // An OCTET STRING or BIT STRING whose contents are themselves DER.
    fn start_encapsulated(&mut self, cls: Class, tag: Tag, bit_string: bool) -> ChipErrorResult;

    fn end_encapsulated(&mut self) -> ChipErrorResult;

    fn get_length_written(&self) -> usize;
}

#[derive(Default)]
pub struct NullAsn1Writer;

impl Asn1Writer for NullAsn1Writer {
    fn put_integer(&mut self, _value: i64) -> ChipErrorResult {
        Ok(())
    }
    fn put_integer_from_bytes(&mut self, _value: &[u8]) -> ChipErrorResult {
        Ok(())
    }
    fn put_boolean(&mut self, _value: bool) -> ChipErrorResult {
        Ok(())
    }
    fn put_object_id(&mut self, _oid: Oid) -> ChipErrorResult {
        Ok(())
    }
    fn put_string(&mut self, _tag: Tag, _value: &str) -> ChipErrorResult {
        Ok(())
    }
    fn put_octet_string(&mut self, _bytes: &[u8]) -> ChipErrorResult {
        Ok(())
    }
    fn put_bit_string(&mut self, _unused_bits: u8, _bytes: &[u8]) -> ChipErrorResult {
        Ok(())
    }
    fn put_time(&mut self, _time: &Asn1UniversalTime) -> ChipErrorResult {
        Ok(())
    }
    fn put_null(&mut self) -> ChipErrorResult {
        Ok(())
    }
    fn put_context_value(&mut self, _tag: Tag, _bytes: &[u8]) -> ChipErrorResult {
        Ok(())
    }
    fn put_raw_der(&mut self, _bytes: &[u8]) -> ChipErrorResult {
        Ok(())
    }
    fn start_constructed(&mut self, _cls: Class, _tag: Tag) -> ChipErrorResult {
        Ok(())
    }
    fn end_constructed(&mut self) -> ChipErrorResult {
        Ok(())
    }
    fn start_encapsulated(&mut self, _cls: Class, _tag: Tag, _bit_string: bool) -> ChipErrorResult {
        Ok(())
    }
    fn end_encapsulated(&mut self) -> ChipErrorResult {
        Ok(())
    }
    fn get_length_written(&self) -> usize {
        0
    }
}

pub struct Asn1ContiguousBufferWriter<'a> {
    m_buf: &'a mut [u8],
    m_write_point: usize,
    // Offsets of one-byte length placeholders awaiting back-patching.
    m_deferred_lengths: [usize; K_MAX_DEFERRED_LENGTH_DEPTH],
    m_deferred_count: usize,
}

impl<'a> Asn1ContiguousBufferWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            m_buf: buf,
            m_write_point: 0,
            m_deferred_lengths: [0; K_MAX_DEFERRED_LENGTH_DEPTH],
            m_deferred_count: 0,
        }
    }

    fn write_byte(&mut self, byte: u8) -> ChipErrorResult {
        verify_or_return_error!(
            self.m_write_point < self.m_buf.len(),
            Err(asn1_error_overflow!())
        );
        self.m_buf[self.m_write_point] = byte;
        self.m_write_point += 1;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> ChipErrorResult {
        verify_or_return_error!(
            self.m_write_point + bytes.len() <= self.m_buf.len(),
            Err(asn1_error_overflow!())
        );
        self.m_buf[self.m_write_point..self.m_write_point + bytes.len()].copy_from_slice(bytes);
        self.m_write_point += bytes.len();
        Ok(())
    }

    fn write_identifier(&mut self, cls: Class, tag: Tag, constructed: bool) -> ChipErrorResult {
        verify_or_return_error!(tag < 0x1F, Err(asn1_error_unsupported_encoding!()));
        let form = if constructed { der::K_FORM_CONSTRUCTED } else { 0 };
        self.write_byte(cls | form | tag)
    }

    fn write_length(&mut self, len: usize) -> ChipErrorResult {
        if len < 128 {
            self.write_byte(len as u8)
        } else if len < 256 {
            self.write_byte(0x81)?;
            self.write_byte(len as u8)
        } else if len < 65536 {
            self.write_byte(0x82)?;
            self.write_byte((len >> 8) as u8)?;
            self.write_byte(len as u8)
        } else {
            Err(asn1_error_length_overflow!())
        }
    }

    fn put_value(&mut self, cls: Class, tag: Tag, constructed: bool, bytes: &[u8]) -> ChipErrorResult {
        self.write_identifier(cls, tag, constructed)?;
        self.write_length(bytes.len())?;
        self.write_bytes(bytes)
    }

    fn push_deferred_length(&mut self) -> ChipErrorResult {
        verify_or_return_error!(
            self.m_deferred_count < K_MAX_DEFERRED_LENGTH_DEPTH,
            Err(asn1_error_max_depth_exceeded!())
        );
        self.m_deferred_lengths[self.m_deferred_count] = self.m_write_point;
        self.m_deferred_count += 1;
        self.write_byte(0)
    }

    // Patch the reserved one-byte length. Long contents shift the tail
    // right to open up room for the multi-byte length form.
    fn patch_deferred_length(&mut self) -> ChipErrorResult {
        verify_or_return_error!(self.m_deferred_count > 0, Err(asn1_error_invalid_state!()));
        self.m_deferred_count -= 1;
        let length_offset = self.m_deferred_lengths[self.m_deferred_count];
        let content_len = self.m_write_point - length_offset - 1;

        if content_len < 128 {
            self.m_buf[length_offset] = content_len as u8;
            return Ok(());
        }

        let extra = if content_len < 256 {
            1
        } else if content_len < 65536 {
            2
        } else {
            return Err(asn1_error_length_overflow!());
        };
        verify_or_return_error!(
            self.m_write_point + extra <= self.m_buf.len(),
            Err(asn1_error_overflow!())
        );

        self.m_buf
            .copy_within(length_offset + 1..self.m_write_point, length_offset + 1 + extra);
        self.m_buf[length_offset] = 0x80 | extra as u8;
        for i in 0..extra {
            self.m_buf[length_offset + 1 + i] = (content_len >> (8 * (extra - 1 - i))) as u8;
        }
        self.m_write_point += extra;

        Ok(())
    }
}

impl<'a> Asn1Writer for Asn1ContiguousBufferWriter<'a> {
    fn put_integer(&mut self, value: i64) -> ChipErrorResult {
        let bytes = value.to_be_bytes();
        let mut start = 0usize;
        while start < bytes.len() - 1 {
            let redundant_zero = bytes[start] == 0x00 && (bytes[start + 1] & 0x80) == 0;
            let redundant_ff = bytes[start] == 0xFF && (bytes[start + 1] & 0x80) != 0;
            if redundant_zero || redundant_ff {
                start += 1;
            } else {
                break;
            }
        }
        self.put_value(der::K_CLASS_UNIVERSAL, der::K_TAG_INTEGER, false, &bytes[start..])
    }

    fn put_integer_from_bytes(&mut self, value: &[u8]) -> ChipErrorResult {
        verify_or_return_error!(!value.is_empty(), Err(asn1_error_unsupported_encoding!()));
        self.put_value(der::K_CLASS_UNIVERSAL, der::K_TAG_INTEGER, false, value)
    }

    fn put_boolean(&mut self, value: bool) -> ChipErrorResult {
        let byte = if value { 0xFFu8 } else { 0x00u8 };
        self.put_value(der::K_CLASS_UNIVERSAL, der::K_TAG_BOOLEAN, false, &[byte])
    }

    fn put_object_id(&mut self, oid: Oid) -> ChipErrorResult {
        let encoding = der_encoding_for_oid(oid).ok_or(asn1_error_unknown_object_id!())?;
        self.put_value(der::K_CLASS_UNIVERSAL, der::K_TAG_OBJECT_ID, false, encoding)
    }

    fn put_string(&mut self, tag: Tag, value: &str) -> ChipErrorResult {
        self.put_value(der::K_CLASS_UNIVERSAL, tag, false, value.as_bytes())
    }

    fn put_octet_string(&mut self, bytes: &[u8]) -> ChipErrorResult {
        self.put_value(der::K_CLASS_UNIVERSAL, der::K_TAG_OCTET_STRING, false, bytes)
    }

    fn put_bit_string(&mut self, unused_bits: u8, bytes: &[u8]) -> ChipErrorResult {
        verify_or_return_error!(unused_bits < 8, Err(asn1_error_unsupported_encoding!()));
        self.write_identifier(der::K_CLASS_UNIVERSAL, der::K_TAG_BIT_STRING, false)?;
        self.write_length(bytes.len() + 1)?;
        self.write_byte(unused_bits)?;
        self.write_bytes(bytes)
    }

    fn put_time(&mut self, time: &Asn1UniversalTime) -> ChipErrorResult {
        let time_string = time.export_to_asn1_time_string()?;
        let tag = if time.uses_generalized_time() {
            der::K_TAG_GENERALIZED_TIME
        } else {
            der::K_TAG_UTC_TIME
        };
        self.put_value(der::K_CLASS_UNIVERSAL, tag, false, time_string.bytes())
    }

    fn put_null(&mut self) -> ChipErrorResult {
        self.put_value(der::K_CLASS_UNIVERSAL, der::K_TAG_NULL, false, &[])
    }

    fn put_context_value(&mut self, tag: Tag, bytes: &[u8]) -> ChipErrorResult {
        self.put_value(der::K_CLASS_CONTEXT_SPECIFIC, tag, false, bytes)
    }

    fn put_raw_der(&mut self, bytes: &[u8]) -> ChipErrorResult {
        self.write_bytes(bytes)
    }

    fn start_constructed(&mut self, cls: Class, tag: Tag) -> ChipErrorResult {
        self.write_identifier(cls, tag, true)?;
        self.push_deferred_length()
    }

    fn end_constructed(&mut self) -> ChipErrorResult {
        self.patch_deferred_length()
    }

    fn start_encapsulated(&mut self, cls: Class, tag: Tag, bit_string: bool) -> ChipErrorResult {
        self.write_identifier(cls, tag, false)?;
        self.push_deferred_length()?;
        if bit_string {
            // DER inside a BIT STRING always starts on a byte boundary.
            self.write_byte(0)?;
        }
        Ok(())
    }

    fn end_encapsulated(&mut self) -> ChipErrorResult {
        self.patch_deferred_length()
    }

    fn get_length_written(&self) -> usize {
        self.m_write_point
    }
}
