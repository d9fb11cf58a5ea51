use super::asn1::{der, oid_from_der_encoding};
use super::asn1_time::Asn1UniversalTime;
use super::{Class, Oid, Tag};
use crate::ChipError;
use crate::ChipErrorResult;

use crate::asn1_end;
use crate::asn1_error_invalid_encoding;
use crate::asn1_error_invalid_state;
use crate::asn1_error_max_depth_exceeded;
use crate::asn1_error_underrun;
use crate::asn1_error_unsupported_encoding;
use crate::asn1_error_value_overflow;
use crate::verify_or_return_error;

pub const K_MAX_CONTAINER_DEPTH: usize = 10;

// DER reader covering the X.509 profile of Matter certificates:
// definite-length encodings, low tag numbers, nesting bounded by
// K_MAX_CONTAINER_DEPTH.
pub struct Asn1Reader<'a> {
    m_buf: &'a [u8],
    m_offset: usize,
    m_class: Class,
    m_tag: Tag,
    m_constructed: bool,
    m_element_offset: usize,
    m_value_offset: usize,
    m_value_len: usize,
    m_container_ends: [usize; K_MAX_CONTAINER_DEPTH],
    m_depth: usize,
}

impl<'a> Asn1Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            m_buf: buf,
            m_offset: 0,
            m_class: 0,
            m_tag: 0,
            m_constructed: false,
            m_element_offset: 0,
            m_value_offset: 0,
            m_value_len: 0,
            m_container_ends: [0; K_MAX_CONTAINER_DEPTH],
            m_depth: 0,
        }
    }

    fn current_end(&self) -> usize {
        if self.m_depth > 0 {
            self.m_container_ends[self.m_depth - 1]
        } else {
            self.m_buf.len()
        }
    }

    // Parse the identifier and length octets of the element at the read
    // position and step over it.
    pub fn next(&mut self) -> ChipErrorResult {
        let end = self.current_end();
        verify_or_return_error!(self.m_offset < end, Err(asn1_end!()));

        let identifier = self.m_buf[self.m_offset];
        let tag = identifier & 0x1F;
        verify_or_return_error!(tag < 0x1F, Err(asn1_error_unsupported_encoding!()));

        verify_or_return_error!(self.m_offset + 1 < end, Err(asn1_error_underrun!()));
        let first_len = self.m_buf[self.m_offset + 1];
        let (len, len_size): (usize, usize) = if first_len < 0x80 {
            (first_len as usize, 1)
        } else {
            let num_bytes = (first_len & 0x7F) as usize;
            verify_or_return_error!(
                num_bytes >= 1 && num_bytes <= 2,
                Err(asn1_error_unsupported_encoding!())
            );
            verify_or_return_error!(
                self.m_offset + 1 + num_bytes < end,
                Err(asn1_error_underrun!())
            );
            let mut len = 0usize;
            for i in 0..num_bytes {
                len = (len << 8) | self.m_buf[self.m_offset + 2 + i] as usize;
            }
            (len, 1 + num_bytes)
        };

        let value_offset = self.m_offset + 1 + len_size;
        verify_or_return_error!(value_offset + len <= end, Err(asn1_error_underrun!()));

        self.m_class = identifier & 0xC0;
        self.m_constructed = (identifier & der::K_FORM_CONSTRUCTED) != 0;
        self.m_tag = tag;
        self.m_element_offset = self.m_offset;
        self.m_value_offset = value_offset;
        self.m_value_len = len;
        self.m_offset = value_offset + len;

        Ok(())
    }

    pub fn is_at_end(&self) -> bool {
        self.m_offset >= self.current_end()
    }

    pub fn get_class(&self) -> Class {
        self.m_class
    }

    pub fn get_tag(&self) -> Tag {
        self.m_tag
    }

    pub fn is_constructed(&self) -> bool {
        self.m_constructed
    }

    pub fn get_value(&self) -> &'a [u8] {
        &self.m_buf[self.m_value_offset..self.m_value_offset + self.m_value_len]
    }

    // The complete current element, identifier and length octets included.
    pub fn get_encoded_element(&self) -> &'a [u8] {
        &self.m_buf[self.m_element_offset..self.m_value_offset + self.m_value_len]
    }

    fn expect(&self, cls: Class, tag: Tag, constructed: bool) -> ChipErrorResult {
        verify_or_return_error!(
            self.m_class == cls && self.m_tag == tag && self.m_constructed == constructed,
            Err(asn1_error_invalid_encoding!())
        );
        Ok(())
    }

    pub fn next_expect(&mut self, cls: Class, tag: Tag, constructed: bool) -> ChipErrorResult {
        self.next()?;
        self.expect(cls, tag, constructed)
    }

    fn push_container(&mut self, start: usize, end: usize) -> ChipErrorResult {
        verify_or_return_error!(
            self.m_depth < K_MAX_CONTAINER_DEPTH,
            Err(asn1_error_max_depth_exceeded!())
        );
        self.m_container_ends[self.m_depth] = end;
        self.m_depth += 1;
        self.m_offset = start;
        Ok(())
    }

    pub fn enter_constructed_type(&mut self) -> ChipErrorResult {
        verify_or_return_error!(self.m_constructed, Err(asn1_error_invalid_state!()));
        self.push_container(self.m_value_offset, self.m_value_offset + self.m_value_len)
    }

    pub fn exit_constructed_type(&mut self) -> ChipErrorResult {
        verify_or_return_error!(self.m_depth > 0, Err(asn1_error_invalid_state!()));
        self.m_depth -= 1;
        self.m_offset = self.m_container_ends[self.m_depth];
        Ok(())
    }

    // Enter an OCTET STRING or BIT STRING whose contents are DER. For a BIT
    // STRING the leading unused-bits octet must be zero.
    pub fn enter_encapsulated_type(&mut self) -> ChipErrorResult {
        verify_or_return_error!(!self.m_constructed, Err(asn1_error_invalid_state!()));

        let mut start = self.m_value_offset;
        if self.m_tag == der::K_TAG_BIT_STRING {
            verify_or_return_error!(self.m_value_len >= 1, Err(asn1_error_underrun!()));
            verify_or_return_error!(
                self.m_buf[start] == 0,
                Err(asn1_error_unsupported_encoding!())
            );
            start += 1;
        } else {
            verify_or_return_error!(
                self.m_tag == der::K_TAG_OCTET_STRING,
                Err(asn1_error_invalid_state!())
            );
        }

        self.push_container(start, self.m_value_offset + self.m_value_len)
    }

    pub fn exit_encapsulated_type(&mut self) -> ChipErrorResult {
        self.exit_constructed_type()
    }

    pub fn get_boolean(&self) -> Result<bool, ChipError> {
        verify_or_return_error!(
            self.m_tag == der::K_TAG_BOOLEAN && self.m_value_len == 1,
            Err(asn1_error_invalid_encoding!())
        );
        Ok(self.get_value()[0] != 0)
    }

    pub fn get_integer(&self) -> Result<i64, ChipError> {
        verify_or_return_error!(
            self.m_tag == der::K_TAG_INTEGER && self.m_value_len >= 1,
            Err(asn1_error_invalid_encoding!())
        );
        verify_or_return_error!(self.m_value_len <= 8, Err(asn1_error_value_overflow!()));

        let bytes = self.get_value();
        let mut value: i64 = if (bytes[0] & 0x80) != 0 { -1 } else { 0 };
        for b in bytes {
            value = (value << 8) | (*b as i64);
        }
        Ok(value)
    }

    pub fn get_object_id(&self) -> Result<Oid, ChipError> {
        verify_or_return_error!(
            self.m_tag == der::K_TAG_OBJECT_ID && self.m_value_len >= 1,
            Err(asn1_error_invalid_encoding!())
        );
        Ok(oid_from_der_encoding(self.get_value()))
    }

    pub fn get_string(&self) -> Result<&'a str, ChipError> {
        verify_or_return_error!(
            matches!(
                self.m_tag,
                der::K_TAG_UTF8_STRING | der::K_TAG_PRINTABLE_STRING | der::K_TAG_IA5_STRING
            ),
            Err(asn1_error_invalid_encoding!())
        );
        core::str::from_utf8(self.get_value()).map_err(|_| asn1_error_invalid_encoding!())
    }

    pub fn get_time(&self) -> Result<Asn1UniversalTime, ChipError> {
        verify_or_return_error!(
            matches!(
                self.m_tag,
                der::K_TAG_UTC_TIME | der::K_TAG_GENERALIZED_TIME
            ),
            Err(asn1_error_invalid_encoding!())
        );
        let s = core::str::from_utf8(self.get_value()).map_err(|_| asn1_error_invalid_encoding!())?;
        Asn1UniversalTime::import_from_asn1_time_string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::asn1::asn1_writer::{Asn1ContiguousBufferWriter, Asn1Writer};
    use crate::chip::asn1::Asn1Oid;

    #[test]
    fn walk_written_sequence() {
        let mut buf = [0u8; 64];
        let mut writer = Asn1ContiguousBufferWriter::new(&mut buf);
        writer
            .start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)
            .unwrap();
        writer.put_integer(42).unwrap();
        writer
            .put_object_id(Asn1Oid::KoidEllipticCurvePrime256v1.into())
            .unwrap();
        writer.put_boolean(true).unwrap();
        writer.end_constructed().unwrap();
        let len = writer.get_length_written();

        let mut reader = Asn1Reader::new(&buf[..len]);
        reader
            .next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)
            .unwrap();
        reader.enter_constructed_type().unwrap();
        reader.next().unwrap();
        assert_eq!(Ok(42), reader.get_integer());
        reader.next().unwrap();
        assert_eq!(
            Ok(Asn1Oid::KoidEllipticCurvePrime256v1 as Oid),
            reader.get_object_id()
        );
        reader.next().unwrap();
        assert_eq!(Ok(true), reader.get_boolean());
        assert!(reader.is_at_end());
        assert_eq!(Err(asn1_end!()), reader.next());
        reader.exit_constructed_type().unwrap();
    }

    #[test]
    fn negative_integer_round_trip() {
        let mut buf = [0u8; 16];
        let mut writer = Asn1ContiguousBufferWriter::new(&mut buf);
        writer.put_integer(-1234).unwrap();
        let len = writer.get_length_written();

        let mut reader = Asn1Reader::new(&buf[..len]);
        reader.next().unwrap();
        assert_eq!(Ok(-1234), reader.get_integer());
    }

    #[test]
    fn encapsulated_bit_string() {
        let mut buf = [0u8; 32];
        let mut writer = Asn1ContiguousBufferWriter::new(&mut buf);
        writer
            .start_encapsulated(der::K_CLASS_UNIVERSAL, der::K_TAG_BIT_STRING, true)
            .unwrap();
        writer.put_integer(7).unwrap();
        writer.end_encapsulated().unwrap();
        let len = writer.get_length_written();

        let mut reader = Asn1Reader::new(&buf[..len]);
        reader.next().unwrap();
        reader.enter_encapsulated_type().unwrap();
        reader.next().unwrap();
        assert_eq!(Ok(7), reader.get_integer());
        reader.exit_encapsulated_type().unwrap();
    }

    #[test]
    fn time_round_trip_through_der() {
        let time = Asn1UniversalTime {
            year: 2031,
            month: 7,
            day: 4,
            hour: 10,
            minute: 20,
            second: 30,
        };
        let mut buf = [0u8; 32];
        let mut writer = Asn1ContiguousBufferWriter::new(&mut buf);
        writer.put_time(&time).unwrap();
        let len = writer.get_length_written();

        let mut reader = Asn1Reader::new(&buf[..len]);
        reader.next().unwrap();
        assert_eq!(der::K_TAG_UTC_TIME, reader.get_tag());
        assert_eq!(Ok(time), reader.get_time());
    }

    #[test]
    fn truncated_element_is_underrun() {
        let encoding = [0x04u8, 0x05, 0x01, 0x02];
        let mut reader = Asn1Reader::new(&encoding);
        assert_eq!(Err(asn1_error_underrun!()), reader.next());
    }
}
