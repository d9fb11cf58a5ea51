use crate::chip::asn1::{der, Asn1ContiguousBufferWriter, Asn1Writer, Oid};
use crate::chip::credentials::chip_cert::{
    chip_epoch_to_asn1_time, decode_chip_cert, CertDecodeFlags, CertFlags, ChipCertificateData,
    KeyUsageFlags, KEY_PURPOSE_TABLE,
};
use crate::chip::crypto::{
    ecdsa_raw_signature_to_der, hash_sha256, K_MAX_ECDSA_SIGNATURE_LENGTH_DER,
    K_SHA256_HASH_LENGTH,
};
use crate::ChipError;
use crate::ChipErrorResult;

use crate::chip::asn1::{get_oid, K_OID_CATEGORY_EXTENSION};
use crate::chip::credentials::chip_cert::K_MAX_DER_CERT_LENGTH;

// X.509 v3 TBSCertificate version value.
const K_X509_VERSION_3: i64 = 2;

fn encode_algorithm_identifier<W: Asn1Writer>(writer: &mut W, algo_oid: Oid) -> ChipErrorResult {
    // AlgorithmIdentifier ::= SEQUENCE { algorithm OBJECT IDENTIFIER }
    // ecdsa-with-SHA256 carries no parameters.
    writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;
    writer.put_object_id(algo_oid)?;
    writer.end_constructed()
}

fn encode_validity<W: Asn1Writer>(
    writer: &mut W,
    not_before: u32,
    not_after: u32,
) -> ChipErrorResult {
    writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;
    writer.put_time(&chip_epoch_to_asn1_time(not_before, false))?;
    writer.put_time(&chip_epoch_to_asn1_time(not_after, true))?;
    writer.end_constructed()
}

fn encode_subject_public_key_info<W: Asn1Writer>(
    writer: &mut W,
    cert_data: &ChipCertificateData,
) -> ChipErrorResult {
    writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;
    writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;
    writer.put_object_id(cert_data.m_pub_key_algo_oid)?;
    writer.put_object_id(cert_data.m_pub_key_curve_oid)?;
    writer.end_constructed()?;
    writer.put_bit_string(0, cert_data.m_public_key)?;
    writer.end_constructed()
}

// RFC5280 named-bit encoding: key-usage bit n lands in bit (7 - n % 8) of
// content byte n / 8, and trailing zero bits are not encoded.
fn encode_key_usage_bit_string<W: Asn1Writer>(
    writer: &mut W,
    usage: KeyUsageFlags,
) -> ChipErrorResult {
    let bits = usage.bits();
    if bits == 0 {
        return writer.put_bit_string(0, &[]);
    }

    let highest_bit = 15 - bits.leading_zeros() as usize;
    let num_bits = highest_bit + 1;

    let mut content = [0u8; 2];
    for i in 0..num_bits {
        if (bits >> i) & 1 != 0 {
            content[i / 8] |= 1 << (7 - (i % 8));
        }
    }

    let num_bytes = num_bits.div_ceil(8);
    let unused_bits = (num_bytes * 8 - num_bits) as u8;
    writer.put_bit_string(unused_bits, &content[..num_bytes])
}

fn start_extension<W: Asn1Writer>(writer: &mut W, ext_id: u8, critical: bool) -> ChipErrorResult {
    writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;
    writer.put_object_id(get_oid(K_OID_CATEGORY_EXTENSION, ext_id))?;
    if critical {
        writer.put_boolean(true)?;
    }
    writer.start_encapsulated(der::K_CLASS_UNIVERSAL, der::K_TAG_OCTET_STRING, false)
}

fn end_extension<W: Asn1Writer>(writer: &mut W) -> ChipErrorResult {
    writer.end_encapsulated()?;
    writer.end_constructed()
}

fn encode_extensions<W: Asn1Writer>(
    writer: &mut W,
    cert_data: &ChipCertificateData,
) -> ChipErrorResult {
    // extensions [3] EXPLICIT SEQUENCE OF Extension
    writer.start_constructed(der::K_CLASS_CONTEXT_SPECIFIC, 3)?;
    writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;

    if cert_data
        .m_cert_flags
        .contains(CertFlags::KextPresentBasicConstraints)
    {
        start_extension(writer, 1, true)?;
        writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;
        if cert_data.m_cert_flags.contains(CertFlags::KisCA) {
            writer.put_boolean(true)?;
        }
        if cert_data
            .m_cert_flags
            .contains(CertFlags::KpathLenConstraintPresent)
        {
            writer.put_integer(cert_data.m_path_len_constraint as i64)?;
        }
        writer.end_constructed()?;
        end_extension(writer)?;
    }

    if cert_data.m_cert_flags.contains(CertFlags::KextPresentKeyUsage) {
        start_extension(writer, 2, true)?;
        encode_key_usage_bit_string(writer, cert_data.m_key_usage_flags)?;
        end_extension(writer)?;
    }

    if cert_data
        .m_cert_flags
        .contains(CertFlags::KextPresentExtendedKeyUsage)
    {
        start_extension(writer, 3, true)?;
        writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;
        for (flag, id) in KEY_PURPOSE_TABLE.iter() {
            if cert_data.m_key_purpose_flags.contains(*flag) {
                writer.put_object_id(get_oid(
                    crate::chip::asn1::K_OID_CATEGORY_KEY_PURPOSE,
                    *id,
                ))?;
            }
        }
        writer.end_constructed()?;
        end_extension(writer)?;
    }

    if cert_data
        .m_cert_flags
        .contains(CertFlags::KextPresentSubjectKeyId)
    {
        start_extension(writer, 4, false)?;
        writer.put_octet_string(&cert_data.m_subject_key_id)?;
        end_extension(writer)?;
    }

    if cert_data
        .m_cert_flags
        .contains(CertFlags::KextPresentAuthKeyId)
    {
        start_extension(writer, 5, false)?;
        writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;
        writer.put_context_value(0, &cert_data.m_auth_key_id)?;
        writer.end_constructed()?;
        end_extension(writer)?;
    }

    if cert_data
        .m_cert_flags
        .contains(CertFlags::KextPresentFutureExtension)
    {
        // The blob already is a complete DER Extension.
        writer.put_raw_der(cert_data.m_future_extension)?;
    }

    writer.end_constructed()?;
    writer.end_constructed()
}

// Emits the DER TBSCertificate for a decoded certificate. The output is
// what the certificate's ECDSA signature covers.
pub fn encode_tbs_cert<W: Asn1Writer>(
    cert_data: &ChipCertificateData,
    writer: &mut W,
) -> ChipErrorResult {
    writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;

    // version [0] EXPLICIT INTEGER
    writer.start_constructed(der::K_CLASS_CONTEXT_SPECIFIC, 0)?;
    writer.put_integer(K_X509_VERSION_3)?;
    writer.end_constructed()?;

    writer.put_integer_from_bytes(cert_data.m_serial_number)?;
    encode_algorithm_identifier(writer, cert_data.m_sig_algo_oid)?;
    cert_data.m_issuer_dn.encode_to_asn1(writer)?;
    encode_validity(writer, cert_data.m_not_before_time, cert_data.m_not_after_time)?;
    cert_data.m_subject_dn.encode_to_asn1(writer)?;
    encode_subject_public_key_info(writer, cert_data)?;
    encode_extensions(writer, cert_data)?;

    writer.end_constructed()
}

// Computes and stores the SHA-256 hash of the DER TBSCertificate.
pub fn generate_tbs_hash(cert_data: &mut ChipCertificateData) -> ChipErrorResult {
    let mut tbs_buf = [0u8; K_MAX_DER_CERT_LENGTH];
    let tbs_len = {
        let mut writer = Asn1ContiguousBufferWriter::new(&mut tbs_buf);
        encode_tbs_cert(cert_data, &mut writer)?;
        writer.get_length_written()
    };

    let mut hash = [0u8; K_SHA256_HASH_LENGTH];
    hash_sha256(&tbs_buf[..tbs_len], &mut hash);
    cert_data.m_tbs_hash = hash;
    cert_data.m_cert_flags.insert(CertFlags::KtbsHashPresent);

    Ok(())
}

pub fn convert_chip_cert_to_x509_cert(chip_cert: &[u8], out: &mut [u8]) -> Result<usize, ChipError> {
    let mut cert_data = ChipCertificateData::default();
    decode_chip_cert(chip_cert, &mut cert_data, CertDecodeFlags::empty())?;

    let mut writer = Asn1ContiguousBufferWriter::new(out);
    writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;
    encode_tbs_cert(&cert_data, &mut writer)?;
    encode_algorithm_identifier(&mut writer, cert_data.m_sig_algo_oid)?;

    let mut der_sig = [0u8; K_MAX_ECDSA_SIGNATURE_LENGTH_DER];
    let der_sig_len = ecdsa_raw_signature_to_der(cert_data.m_signature, &mut der_sig)?;
    writer.put_bit_string(0, &der_sig[..der_sig_len])?;

    writer.end_constructed()?;
    Ok(writer.get_length_written())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::credentials::chip_cert::tests::{
        make_signed_cert, make_subject_key_id, node_dn, rcac_dn, TestCertParams,
    };
    use crate::chip::credentials::chip_cert::K_MAX_CHIP_CERT_LENGTH;
    use crate::chip::crypto::{verify_raw_signature, P256Keypair};
    use crate::chip::crypto::crypto_pal::ECPKey;

    fn sample_cert(keypair: &P256Keypair) -> ([u8; K_MAX_CHIP_CERT_LENGTH], usize) {
        make_signed_cert(
            &TestCertParams {
                serial: 0x42,
                issuer: rcac_dn(1),
                subject: node_dn(0x1234, 0xFAB1),
                not_before: 100,
                not_after: 10_000,
                is_ca: false,
                path_len_constraint: None,
                key_usage: KeyUsageFlags::KdigitalSignature,
                subject_key_id: make_subject_key_id(3, 4),
                auth_key_id: make_subject_key_id(1, 2),
                public_key: keypair.public_key().const_bytes(),
            },
            keypair,
        )
    }

    #[test]
    fn tbs_hash_is_deterministic() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let (buf, len) = sample_cert(&keypair);

        let mut a = ChipCertificateData::default();
        decode_chip_cert(&buf[..len], &mut a, CertDecodeFlags::KgenerateTbsHash).unwrap();
        let mut b = ChipCertificateData::default();
        decode_chip_cert(&buf[..len], &mut b, CertDecodeFlags::KgenerateTbsHash).unwrap();

        assert_eq!(a.m_tbs_hash, b.m_tbs_hash);
        assert!(a.m_cert_flags.contains(CertFlags::KtbsHashPresent));
    }

    #[test]
    fn different_serial_changes_tbs_hash() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();

        let mut params = TestCertParams {
            serial: 1,
            issuer: rcac_dn(1),
            subject: rcac_dn(1),
            not_before: 1,
            not_after: 100,
            is_ca: true,
            path_len_constraint: None,
            key_usage: KeyUsageFlags::KkeyCertSign,
            subject_key_id: make_subject_key_id(1, 2),
            auth_key_id: make_subject_key_id(1, 2),
            public_key: keypair.public_key().const_bytes(),
        };
        let (buf_a, len_a) = make_signed_cert(&params, &keypair);
        params.serial = 2;
        let (buf_b, len_b) = make_signed_cert(&params, &keypair);

        let mut a = ChipCertificateData::default();
        decode_chip_cert(&buf_a[..len_a], &mut a, CertDecodeFlags::KgenerateTbsHash).unwrap();
        let mut b = ChipCertificateData::default();
        decode_chip_cert(&buf_b[..len_b], &mut b, CertDecodeFlags::KgenerateTbsHash).unwrap();

        assert_ne!(a.m_tbs_hash, b.m_tbs_hash);
    }

    #[test]
    fn signature_covers_der_tbs() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let (buf, len) = sample_cert(&keypair);

        let mut cert_data = ChipCertificateData::default();
        decode_chip_cert(&buf[..len], &mut cert_data, CertDecodeFlags::KgenerateTbsHash).unwrap();

        assert!(verify_raw_signature(
            keypair.public_key().const_bytes(),
            &cert_data.m_tbs_hash,
            cert_data.m_signature
        )
        .is_ok());
    }

    #[test]
    fn x509_output_is_a_der_sequence() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let (buf, len) = sample_cert(&keypair);

        let mut der_buf = [0u8; K_MAX_DER_CERT_LENGTH];
        let der_len = convert_chip_cert_to_x509_cert(&buf[..len], &mut der_buf).unwrap();

        assert!(der_len > 0);
        assert_eq!(0x30, der_buf[0]);

        // The outer SEQUENCE length must account for the whole output.
        let mut reader = crate::chip::asn1::Asn1Reader::new(&der_buf[..der_len]);
        reader
            .next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)
            .unwrap();
        assert!(reader.is_at_end());
    }

    #[test]
    fn key_usage_named_bits() {
        let mut buf = [0u8; 16];
        let mut writer = Asn1ContiguousBufferWriter::new(&mut buf);
        // digitalSignature (bit 0) + keyCertSign (bit 5)
        encode_key_usage_bit_string(
            &mut writer,
            KeyUsageFlags::KdigitalSignature | KeyUsageFlags::KkeyCertSign,
        )
        .unwrap();
        let len = writer.get_length_written();
        // 6 named bits, 2 unused, content 0b1000_0100
        assert_eq!(&[0x03, 0x02, 0x02, 0x84], &buf[..len]);

        let mut buf = [0u8; 16];
        let mut writer = Asn1ContiguousBufferWriter::new(&mut buf);
        // decipherOnly is bit 8 and forces a second content byte.
        encode_key_usage_bit_string(&mut writer, KeyUsageFlags::KdecipherOnly).unwrap();
        let len = writer.get_length_written();
        assert_eq!(&[0x03, 0x03, 0x07, 0x00, 0x80], &buf[..len]);
    }
}
