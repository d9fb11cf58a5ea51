use crate::chip::asn1::{der, oid_category, Asn1Oid, Asn1Reader, Oid, K_OID_CATEGORY_EXTENSION};
use crate::chip::chip_lib::core::tlv_tags::{anonymous_tag, context_tag};
use crate::chip::chip_lib::core::tlv_types::TlvType;
use crate::chip::chip_lib::core::tlv_writer::{TlvContiguousBufferWriter, TlvWriter};
use crate::chip::credentials::chip_cert::{
    asn1_time_to_chip_epoch, ChipCertBasicConstraintsTag, ChipCertExtTag, ChipCertTag, ChipDN,
    KeyUsageFlags, K_KEY_IDENTIFIER_LENGTH, K_MAX_CERT_SERIAL_NUMBER_LENGTH,
};
use crate::chip::crypto::{
    ecdsa_der_signature_to_raw, K_P256_ECDSA_SIGNATURE_LENGTH_RAW, K_P256_PUBLIC_KEY_LENGTH,
};
use crate::ChipError;
use crate::ChipErrorResult;

use crate::chip_error_unsupported_cert_format;
use crate::chip_error_unsupported_elliptic_curve;
use crate::chip_error_unsupported_signature_type;
use crate::verify_or_return_error;

const K_X509_VERSION_3: i64 = 2;

fn decode_algorithm_identifier(reader: &mut Asn1Reader) -> Result<Oid, ChipError> {
    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
    reader.enter_constructed_type()?;
    reader.next()?;
    let oid = reader.get_object_id()?;
    reader.exit_constructed_type()?;
    Ok(oid)
}

fn convert_validity<W: TlvWriter>(reader: &mut Asn1Reader, writer: &mut W) -> ChipErrorResult {
    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
    reader.enter_constructed_type()?;

    reader.next()?;
    let not_before = asn1_time_to_chip_epoch(&reader.get_time()?)?;
    writer.put_u32(context_tag(ChipCertTag::KtagNotBefore as u8), not_before)?;

    reader.next()?;
    let not_after = asn1_time_to_chip_epoch(&reader.get_time()?)?;
    writer.put_u32(context_tag(ChipCertTag::KtagNotAfter as u8), not_after)?;

    reader.exit_constructed_type()
}

fn convert_name<'a, W: TlvWriter>(
    reader: &mut Asn1Reader<'a>,
    writer: &mut W,
    tlv_tag_num: u8,
) -> ChipErrorResult {
    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
    let mut dn = ChipDN::default();
    dn.decode_from_asn1(reader)?;
    dn.encode_to_tlv(writer, context_tag(tlv_tag_num))
}

fn convert_subject_public_key_info<W: TlvWriter>(
    reader: &mut Asn1Reader,
    writer: &mut W,
) -> ChipErrorResult {
    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
    reader.enter_constructed_type()?;

    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
    reader.enter_constructed_type()?;
    reader.next()?;
    verify_or_return_error!(
        reader.get_object_id()? == Asn1Oid::KoidPubKeyAlgoECPublicKey as Oid,
        Err(chip_error_unsupported_cert_format!())
    );
    reader.next()?;
    verify_or_return_error!(
        reader.get_object_id()? == Asn1Oid::KoidEllipticCurvePrime256v1 as Oid,
        Err(chip_error_unsupported_elliptic_curve!())
    );
    reader.exit_constructed_type()?;

    writer.put_u8(context_tag(ChipCertTag::KtagPublicKeyAlgorithm as u8), 1)?;
    writer.put_u8(context_tag(ChipCertTag::KtagEllipticCurveId as u8), 1)?;

    reader.next()?;
    verify_or_return_error!(
        reader.get_tag() == der::K_TAG_BIT_STRING,
        Err(chip_error_unsupported_cert_format!())
    );
    let bit_string = reader.get_value();
    verify_or_return_error!(
        bit_string.len() == K_P256_PUBLIC_KEY_LENGTH + 1 && bit_string[0] == 0,
        Err(chip_error_unsupported_cert_format!())
    );
    writer.put_bytes(
        context_tag(ChipCertTag::KtagEllipticCurvePublicKey as u8),
        &bit_string[1..],
    )?;

    reader.exit_constructed_type()
}

// RFC5280 named-bit decoding; the reverse of the TLV-to-DER direction.
fn decode_key_usage_bit_string(content: &[u8]) -> Result<u16, ChipError> {
    verify_or_return_error!(
        !content.is_empty() && content.len() <= 3,
        Err(chip_error_unsupported_cert_format!())
    );
    let unused_bits = content[0];
    verify_or_return_error!(unused_bits < 8, Err(chip_error_unsupported_cert_format!()));

    let mut bits: u16 = 0;
    for (byte_index, byte) in content[1..].iter().enumerate() {
        for bit_index in 0..8 {
            if (byte >> (7 - bit_index)) & 1 != 0 {
                let named_bit = byte_index * 8 + bit_index;
                verify_or_return_error!(
                    named_bit < 16,
                    Err(chip_error_unsupported_cert_format!())
                );
                bits |= 1 << named_bit;
            }
        }
    }
    Ok(bits)
}

fn convert_basic_constraints<W: TlvWriter>(
    reader: &mut Asn1Reader,
    writer: &mut W,
) -> ChipErrorResult {
    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
    reader.enter_constructed_type()?;

    let mut is_ca = false;
    let mut path_len: Option<u8> = None;
    loop {
        match reader.next() {
            Ok(()) => {}
            Err(e) if e == crate::asn1_end!() => break,
            Err(e) => return Err(e),
        }
        match reader.get_tag() {
            der::K_TAG_BOOLEAN => is_ca = reader.get_boolean()?,
            der::K_TAG_INTEGER => {
                let value = reader.get_integer()?;
                verify_or_return_error!(
                    (0..=u8::MAX as i64).contains(&value),
                    Err(chip_error_unsupported_cert_format!())
                );
                path_len = Some(value as u8);
            }
            _ => return Err(chip_error_unsupported_cert_format!()),
        }
    }
    reader.exit_constructed_type()?;

    let mut outer = TlvType::KtlvTypeNotSpecified;
    writer.start_container(
        context_tag(ChipCertExtTag::KtagBasicConstraints as u8),
        TlvType::KtlvTypeStructure,
        &mut outer,
    )?;
    writer.put_boolean(context_tag(ChipCertBasicConstraintsTag::KtagIsCA as u8), is_ca)?;
    if let Some(path_len) = path_len {
        writer.put_u8(
            context_tag(ChipCertBasicConstraintsTag::KtagPathLenConstraint as u8),
            path_len,
        )?;
    }
    writer.end_container(outer)
}

fn convert_extended_key_usage<W: TlvWriter>(
    reader: &mut Asn1Reader,
    writer: &mut W,
) -> ChipErrorResult {
    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
    reader.enter_constructed_type()?;

    let mut outer = TlvType::KtlvTypeNotSpecified;
    writer.start_container(
        context_tag(ChipCertExtTag::KtagExtendedKeyUsage as u8),
        TlvType::KtlvTypeArray,
        &mut outer,
    )?;
    loop {
        match reader.next() {
            Ok(()) => {}
            Err(e) if e == crate::asn1_end!() => break,
            Err(e) => return Err(e),
        }
        let oid = reader.get_object_id()?;
        verify_or_return_error!(
            oid_category(oid) == crate::chip::asn1::K_OID_CATEGORY_KEY_PURPOSE,
            Err(chip_error_unsupported_cert_format!())
        );
        writer.put_u8(anonymous_tag(), (oid & 0xFF) as u8)?;
    }
    writer.end_container(outer)?;

    reader.exit_constructed_type()
}

fn convert_key_identifier<W: TlvWriter>(
    writer: &mut W,
    key_id: &[u8],
    ext_tag: ChipCertExtTag,
) -> ChipErrorResult {
    verify_or_return_error!(
        key_id.len() == K_KEY_IDENTIFIER_LENGTH,
        Err(chip_error_unsupported_cert_format!())
    );
    writer.put_bytes(context_tag(ext_tag as u8), key_id)
}

fn convert_extensions<'a, W: TlvWriter>(
    reader: &mut Asn1Reader<'a>,
    writer: &mut W,
) -> ChipErrorResult {
    reader.enter_constructed_type()?;
    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
    reader.enter_constructed_type()?;

    let mut outer = TlvType::KtlvTypeNotSpecified;
    writer.start_container(
        context_tag(ChipCertTag::KtagExtensions as u8),
        TlvType::KtlvTypeList,
        &mut outer,
    )?;

    loop {
        match reader.next() {
            Ok(()) => {}
            Err(e) if e == crate::asn1_end!() => break,
            Err(e) => return Err(e),
        }

        // Extension ::= SEQUENCE { extnID, critical BOOLEAN DEFAULT FALSE,
        // extnValue OCTET STRING }
        let encoded_extension = reader.get_encoded_element();
        reader.enter_constructed_type()?;
        reader.next()?;
        let ext_oid = reader.get_object_id()?;

        reader.next()?;
        if reader.get_tag() == der::K_TAG_BOOLEAN {
            reader.get_boolean()?;
            reader.next()?;
        }
        verify_or_return_error!(
            reader.get_tag() == der::K_TAG_OCTET_STRING,
            Err(chip_error_unsupported_cert_format!())
        );

        if oid_category(ext_oid) == K_OID_CATEGORY_EXTENSION {
            reader.enter_encapsulated_type()?;
            match (ext_oid & 0xFF) as u8 {
                1 => convert_basic_constraints(reader, writer)?,
                2 => {
                    reader.next()?;
                    verify_or_return_error!(
                        reader.get_tag() == der::K_TAG_BIT_STRING,
                        Err(chip_error_unsupported_cert_format!())
                    );
                    let bits = decode_key_usage_bit_string(reader.get_value())?;
                    verify_or_return_error!(
                        KeyUsageFlags::from_bits(bits).is_some(),
                        Err(chip_error_unsupported_cert_format!())
                    );
                    writer.put_u16(context_tag(ChipCertExtTag::KtagKeyUsage as u8), bits)?;
                }
                3 => convert_extended_key_usage(reader, writer)?,
                4 => {
                    reader.next()?;
                    verify_or_return_error!(
                        reader.get_tag() == der::K_TAG_OCTET_STRING,
                        Err(chip_error_unsupported_cert_format!())
                    );
                    let key_id = reader.get_value();
                    convert_key_identifier(writer, key_id, ChipCertExtTag::KtagSubjectKeyId)?;
                }
                5 => {
                    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
                    reader.enter_constructed_type()?;
                    reader.next()?;
                    verify_or_return_error!(
                        reader.get_class() == der::K_CLASS_CONTEXT_SPECIFIC
                            && reader.get_tag() == 0,
                        Err(chip_error_unsupported_cert_format!())
                    );
                    let key_id = reader.get_value();
                    convert_key_identifier(writer, key_id, ChipCertExtTag::KtagAuthorityKeyId)?;
                    reader.exit_constructed_type()?;
                }
                _ => return Err(chip_error_unsupported_cert_format!()),
            }
            reader.exit_encapsulated_type()?;
        } else {
            // Extensions outside the known profile ride along verbatim as
            // future extensions.
            writer.put_bytes(
                context_tag(ChipCertExtTag::KtagFutureExtension as u8),
                encoded_extension,
            )?;
        }

        reader.exit_constructed_type()?;
    }

    writer.end_container(outer)?;
    reader.exit_constructed_type()?;
    reader.exit_constructed_type()
}

pub fn convert_x509_cert_to_chip_cert(x509_cert: &[u8], out: &mut [u8]) -> Result<usize, ChipError> {
    let mut reader = Asn1Reader::new(x509_cert);
    let mut writer = TlvContiguousBufferWriter::new(out);

    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
    reader.enter_constructed_type()?;

    let mut tlv_outer = TlvType::KtlvTypeNotSpecified;
    writer.start_container(anonymous_tag(), TlvType::KtlvTypeStructure, &mut tlv_outer)?;

    // TBSCertificate
    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
    reader.enter_constructed_type()?;

    // version [0] EXPLICIT INTEGER
    reader.next()?;
    verify_or_return_error!(
        reader.get_class() == der::K_CLASS_CONTEXT_SPECIFIC
            && reader.get_tag() == 0
            && reader.is_constructed(),
        Err(chip_error_unsupported_cert_format!())
    );
    reader.enter_constructed_type()?;
    reader.next()?;
    verify_or_return_error!(
        reader.get_integer()? == K_X509_VERSION_3,
        Err(chip_error_unsupported_cert_format!())
    );
    reader.exit_constructed_type()?;

    // serialNumber
    reader.next()?;
    verify_or_return_error!(
        reader.get_tag() == der::K_TAG_INTEGER,
        Err(chip_error_unsupported_cert_format!())
    );
    let serial = reader.get_value();
    verify_or_return_error!(
        !serial.is_empty() && serial.len() <= K_MAX_CERT_SERIAL_NUMBER_LENGTH,
        Err(chip_error_unsupported_cert_format!())
    );
    writer.put_bytes(context_tag(ChipCertTag::KtagSerialNumber as u8), serial)?;

    // signature AlgorithmIdentifier
    verify_or_return_error!(
        decode_algorithm_identifier(&mut reader)? == Asn1Oid::KoidSigAlgoECDSAWithSHA256 as Oid,
        Err(chip_error_unsupported_signature_type!())
    );
    writer.put_u8(context_tag(ChipCertTag::KtagSignatureAlgorithm as u8), 1)?;

    convert_name(&mut reader, &mut writer, ChipCertTag::KtagIssuer as u8)?;
    convert_validity(&mut reader, &mut writer)?;
    convert_name(&mut reader, &mut writer, ChipCertTag::KtagSubject as u8)?;
    convert_subject_public_key_info(&mut reader, &mut writer)?;

    // extensions [3] EXPLICIT
    reader.next()?;
    verify_or_return_error!(
        reader.get_class() == der::K_CLASS_CONTEXT_SPECIFIC
            && reader.get_tag() == 3
            && reader.is_constructed(),
        Err(chip_error_unsupported_cert_format!())
    );
    convert_extensions(&mut reader, &mut writer)?;

    reader.exit_constructed_type()?;

    // signatureAlgorithm
    verify_or_return_error!(
        decode_algorithm_identifier(&mut reader)? == Asn1Oid::KoidSigAlgoECDSAWithSHA256 as Oid,
        Err(chip_error_unsupported_signature_type!())
    );

    // signatureValue BIT STRING carrying the DER Ecdsa-Sig-Value
    reader.next()?;
    verify_or_return_error!(
        reader.get_tag() == der::K_TAG_BIT_STRING,
        Err(chip_error_unsupported_cert_format!())
    );
    let bit_string = reader.get_value();
    verify_or_return_error!(
        bit_string.len() > 1 && bit_string[0] == 0,
        Err(chip_error_unsupported_cert_format!())
    );
    let mut raw_signature = [0u8; K_P256_ECDSA_SIGNATURE_LENGTH_RAW];
    ecdsa_der_signature_to_raw(&bit_string[1..], &mut raw_signature)?;
    writer.put_bytes(
        context_tag(ChipCertTag::KtagEcdsaSignature as u8),
        &raw_signature,
    )?;

    reader.exit_constructed_type()?;
    writer.end_container(tlv_outer)?;

    Ok(writer.get_length_written())
}
