use crate::chip::asn1::{
    get_oid, oid_category, Asn1Oid, Asn1UniversalTime, Oid, K_OID_CATEGORY_ATTRIBUTE_TYPE,
    K_OID_CATEGORY_ELLIPTIC_CURVE, K_OID_CATEGORY_KEY_PURPOSE, K_OID_CATEGORY_PUBKEY_ALGO,
    K_OID_CATEGORY_SIG_ALGO,
};
use crate::chip::chip_lib::core::case_auth_tag::is_valid_case_auth_tag;
use crate::chip::chip_lib::core::node_id::is_operational_node_id;
use crate::chip::chip_lib::core::tlv_reader::{TlvContiguousBufferReader, TlvReader};
use crate::chip::chip_lib::core::tlv_tags::{
    anonymous_tag, context_tag, is_context_tag, tag_num_from_tag, Tag,
};
use crate::chip::chip_lib::core::tlv_types::TlvType;
use crate::chip::chip_lib::core::tlv_writer::TlvWriter;
use crate::chip::chip_lib::support::bytes_to_hex;
use crate::chip::chip_lib::support::time_utils::{
    calendar_time_to_chip_epoch, chip_epoch_to_calendar_time,
};
use crate::chip::crypto::{
    verify_raw_signature, K_P256_ECDSA_SIGNATURE_LENGTH_RAW, K_P256_PUBLIC_KEY_LENGTH,
    K_SHA256_HASH_LENGTH, K_SUBJECT_KEY_IDENTIFIER_LENGTH,
};
use crate::ChipError;
use crate::ChipErrorResult;

use crate::chip_error_invalid_argument;
use crate::chip_error_no_memory;
use crate::chip_error_not_found;
use crate::chip_error_unsupported_cert_format;
use crate::chip_error_unsupported_elliptic_curve;
use crate::chip_error_unsupported_signature_type;
use crate::chip_error_wrong_cert_dn;
use crate::chip_error_wrong_node_id;
use crate::verify_or_return_error;

use bitflags::bitflags;

pub const K_KEY_IDENTIFIER_LENGTH: usize = K_SUBJECT_KEY_IDENTIFIER_LENGTH;
pub const K_CHIP_DN_MAX_RDN_COUNT: usize = 5;
pub const K_MAX_CHIP_CERT_LENGTH: usize = 400;
pub const K_MAX_DER_CERT_LENGTH: usize = 600;
pub const K_MAX_CERT_SERIAL_NUMBER_LENGTH: usize = 20;

// In TLV certificates the X.509/RFC5280 special time 99991231235959Z ('no
// well-defined expiration date') is represented as a CHIP epoch time of 0.
pub const K_NULL_CERT_TIME: u32 = 0;

// DN attribute TLV tag numbers carry the attribute OID in the low 7 bits;
// this bit marks the DER form as PrintableString.
pub const K_OID_ATTRIBUTE_IS_PRINTABLE_STRING_FLAG: u32 = 0x80;

pub type CertificateKeyId = [u8; K_KEY_IDENTIFIER_LENGTH];

// Context tags of the TLV certificate structure, fixed by the Matter
// specification.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipCertTag {
    KtagSerialNumber = 1,
    KtagSignatureAlgorithm = 2,
    KtagIssuer = 3,
    KtagNotBefore = 4,
    KtagNotAfter = 5,
    KtagSubject = 6,
    KtagPublicKeyAlgorithm = 7,
    KtagEllipticCurveId = 8,
    KtagEllipticCurvePublicKey = 9,
    KtagExtensions = 10,
    KtagEcdsaSignature = 11,
}

// Context tags within the extensions list.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipCertExtTag {
    KtagBasicConstraints = 1,
    KtagKeyUsage = 2,
    KtagExtendedKeyUsage = 3,
    KtagSubjectKeyId = 4,
    KtagAuthorityKeyId = 5,
    KtagFutureExtension = 6,
}

// Context tags within the basic-constraints structure.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipCertBasicConstraintsTag {
    KtagIsCA = 1,
    KtagPathLenConstraint = 2,
}

pub fn tag_not_before() -> Tag {
    context_tag(ChipCertTag::KtagNotBefore as u8)
}

pub fn tag_not_after() -> Tag {
    context_tag(ChipCertTag::KtagNotAfter as u8)
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CertFlags: u16 {
        const KextPresentBasicConstraints = 0x0001;
        const KextPresentKeyUsage = 0x0002;
        const KextPresentExtendedKeyUsage = 0x0004;
        const KextPresentSubjectKeyId = 0x0008;
        const KextPresentAuthKeyId = 0x0010;
        const KextPresentFutureExtension = 0x0020;
        const KextPresentFutureIsCritical = 0x0040;
        const KpathLenConstraintPresent = 0x0080;
        const KisCA = 0x0100;
        const KisTrustAnchor = 0x0200;
        const KtbsHashPresent = 0x0400;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyUsageFlags: u16 {
        const KdigitalSignature = 0x0001;
        const KnonRepudiation = 0x0002;
        const KkeyEncipherment = 0x0004;
        const KdataEncipherment = 0x0008;
        const KkeyAgreement = 0x0010;
        const KkeyCertSign = 0x0020;
        const KcrlSign = 0x0040;
        const KencipherOnly = 0x0080;
        const KdecipherOnly = 0x0100;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyPurposeFlags: u8 {
        const KserverAuth = 0x01;
        const KclientAuth = 0x02;
        const KcodeSigning = 0x04;
        const KemailProtection = 0x08;
        const KtimeStamping = 0x10;
        const KocspSigning = 0x20;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CertDecodeFlags: u8 {
        const KgenerateTbsHash = 0x01;
        const KisTrustAnchor = 0x02;
    }
}

// Key-purpose OID ids (low byte) in the order the extended-key-usage
// extension is re-encoded.
pub(crate) const KEY_PURPOSE_TABLE: [(KeyPurposeFlags, u8); 6] = [
    (KeyPurposeFlags::KserverAuth, 1),
    (KeyPurposeFlags::KclientAuth, 2),
    (KeyPurposeFlags::KcodeSigning, 3),
    (KeyPurposeFlags::KemailProtection, 4),
    (KeyPurposeFlags::KtimeStamping, 5),
    (KeyPurposeFlags::KocspSigning, 6),
];

pub fn key_purpose_flag_for_oid(oid: Oid) -> Option<KeyPurposeFlags> {
    if oid_category(oid) != K_OID_CATEGORY_KEY_PURPOSE {
        return None;
    }
    let id = (oid & 0xFF) as u8;
    KEY_PURPOSE_TABLE
        .iter()
        .find(|(_, table_id)| *table_id == id)
        .map(|(flag, _)| *flag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertType {
    KnotSpecified,
    Kroot,
    Kica,
    Knode,
    KfirmwareSigning,
}

pub fn is_chip_64bit_dn_attr(oid: Oid) -> bool {
    matches!(
        oid,
        o if o == Asn1Oid::KoidAttributeTypeMatterNodeId as Oid
            || o == Asn1Oid::KoidAttributeTypeMatterFirmwareSigningId as Oid
            || o == Asn1Oid::KoidAttributeTypeMatterICACId as Oid
            || o == Asn1Oid::KoidAttributeTypeMatterRCACId as Oid
            || o == Asn1Oid::KoidAttributeTypeMatterFabricId as Oid
    )
}

pub fn is_chip_32bit_dn_attr(oid: Oid) -> bool {
    oid == Asn1Oid::KoidAttributeTypeMatterCASEAuthTag as Oid
}

pub fn is_chip_dn_attr(oid: Oid) -> bool {
    is_chip_64bit_dn_attr(oid) || is_chip_32bit_dn_attr(oid)
}

fn is_known_attribute_oid(oid: Oid) -> bool {
    oid_category(oid) == K_OID_CATEGORY_ATTRIBUTE_TYPE
        && (0x01..=0x16).contains(&(oid & 0xFF))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RdnValue<'a> {
    #[default]
    None,
    String {
        value: &'a str,
        printable: bool,
    },
    ChipVal(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipRDN<'a> {
    pub m_attr_oid: Oid,
    pub m_value: RdnValue<'a>,
}

impl<'a> Default for ChipRDN<'a> {
    fn default() -> Self {
        ChipRDN::const_default()
    }
}

impl<'a> ChipRDN<'a> {
    pub const fn const_default() -> Self {
        Self {
            m_attr_oid: Asn1Oid::KoidNotSpecified as Oid,
            m_value: RdnValue::None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.m_attr_oid == Asn1Oid::KoidNotSpecified as Oid
    }

    pub fn is_equal(&self, other: &Self) -> bool {
        self == other
    }

    pub fn chip_val(&self) -> Option<u64> {
        match self.m_value {
            RdnValue::ChipVal(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipDN<'a> {
    pub rdn: [ChipRDN<'a>; K_CHIP_DN_MAX_RDN_COUNT],
}

impl<'a> Default for ChipDN<'a> {
    fn default() -> Self {
        ChipDN::const_default()
    }
}

impl<'a> ChipDN<'a> {
    pub const fn const_default() -> Self {
        Self {
            rdn: [ChipRDN::const_default(); K_CHIP_DN_MAX_RDN_COUNT],
        }
    }

    pub fn clear(&mut self) {
        self.rdn = [ChipRDN::const_default(); K_CHIP_DN_MAX_RDN_COUNT];
    }

    pub fn rdn_count(&self) -> usize {
        self.rdn.iter().take_while(|rdn| !rdn.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.rdn_count() == 0
    }

    fn append(&mut self, rdn: ChipRDN<'a>) -> ChipErrorResult {
        for slot in self.rdn.iter_mut() {
            if slot.is_empty() {
                *slot = rdn;
                return Ok(());
            }
        }
        Err(chip_error_no_memory!())
    }

    pub fn add_attribute(&mut self, oid: Oid, value: u64) -> ChipErrorResult {
        verify_or_return_error!(is_chip_dn_attr(oid), Err(chip_error_invalid_argument!()));
        if is_chip_32bit_dn_attr(oid) {
            verify_or_return_error!(
                value <= u32::MAX as u64 && is_valid_case_auth_tag(value as u32),
                Err(chip_error_invalid_argument!())
            );
        }

        self.append(ChipRDN {
            m_attr_oid: oid,
            m_value: RdnValue::ChipVal(value),
        })
    }

    pub fn add_attribute_string(
        &mut self,
        oid: Oid,
        value: &'a str,
        printable: bool,
    ) -> ChipErrorResult {
        verify_or_return_error!(
            is_known_attribute_oid(oid) && !is_chip_dn_attr(oid),
            Err(chip_error_invalid_argument!())
        );

        self.append(ChipRDN {
            m_attr_oid: oid,
            m_value: RdnValue::String { value, printable },
        })
    }

    pub fn is_equal(&self, other: &Self) -> bool {
        let count = self.rdn_count();
        if count != other.rdn_count() {
            return false;
        }
        self.rdn[..count]
            .iter()
            .zip(other.rdn[..count].iter())
            .all(|(a, b)| a.is_equal(b))
    }

    // Infers the certificate type from the pattern of Matter attributes in
    // the DN. Advisory metadata; validation corroborates it against the
    // basic-constraints extension.
    pub fn get_cert_type(&self) -> Result<CertType, ChipError> {
        let mut cert_type = CertType::KnotSpecified;
        let mut fabric_id_present = false;

        for rdn in self.rdn.iter().take_while(|rdn| !rdn.is_empty()) {
            let oid = rdn.m_attr_oid;
            if oid == Asn1Oid::KoidAttributeTypeMatterRCACId as Oid {
                verify_or_return_error!(
                    cert_type == CertType::KnotSpecified,
                    Err(chip_error_wrong_cert_dn!())
                );
                cert_type = CertType::Kroot;
            } else if oid == Asn1Oid::KoidAttributeTypeMatterICACId as Oid {
                verify_or_return_error!(
                    cert_type == CertType::KnotSpecified,
                    Err(chip_error_wrong_cert_dn!())
                );
                cert_type = CertType::Kica;
            } else if oid == Asn1Oid::KoidAttributeTypeMatterNodeId as Oid {
                verify_or_return_error!(
                    cert_type == CertType::KnotSpecified,
                    Err(chip_error_wrong_cert_dn!())
                );
                let node_id = rdn.chip_val().ok_or(chip_error_wrong_cert_dn!())?;
                verify_or_return_error!(
                    is_operational_node_id(node_id),
                    Err(chip_error_wrong_node_id!())
                );
                cert_type = CertType::Knode;
            } else if oid == Asn1Oid::KoidAttributeTypeMatterFirmwareSigningId as Oid {
                verify_or_return_error!(
                    cert_type == CertType::KnotSpecified,
                    Err(chip_error_wrong_cert_dn!())
                );
                cert_type = CertType::KfirmwareSigning;
            } else if oid == Asn1Oid::KoidAttributeTypeMatterFabricId as Oid {
                // Only one fabric id attribute is allowed.
                verify_or_return_error!(!fabric_id_present, Err(chip_error_wrong_cert_dn!()));
                fabric_id_present = true;
            }
        }

        if cert_type == CertType::Knode {
            verify_or_return_error!(fabric_id_present, Err(chip_error_wrong_cert_dn!()));
        }

        Ok(cert_type)
    }

    // The matter id of whichever of NodeId / FirmwareSigningId / ICACId /
    // RCACId is present.
    pub fn get_cert_chip_id(&self) -> Result<u64, ChipError> {
        let mut id: Option<u64> = None;

        for rdn in self.rdn.iter().take_while(|rdn| !rdn.is_empty()) {
            let oid = rdn.m_attr_oid;
            if oid == Asn1Oid::KoidAttributeTypeMatterNodeId as Oid
                || oid == Asn1Oid::KoidAttributeTypeMatterFirmwareSigningId as Oid
                || oid == Asn1Oid::KoidAttributeTypeMatterICACId as Oid
                || oid == Asn1Oid::KoidAttributeTypeMatterRCACId as Oid
            {
                verify_or_return_error!(id.is_none(), Err(chip_error_wrong_cert_dn!()));
                id = rdn.chip_val();
            }
        }

        id.ok_or(chip_error_not_found!())
    }

    pub fn get_cert_fabric_id(&self) -> Result<u64, ChipError> {
        let mut fabric_id: Option<u64> = None;

        for rdn in self.rdn.iter().take_while(|rdn| !rdn.is_empty()) {
            if rdn.m_attr_oid == Asn1Oid::KoidAttributeTypeMatterFabricId as Oid {
                verify_or_return_error!(fabric_id.is_none(), Err(chip_error_wrong_cert_dn!()));
                fabric_id = rdn.chip_val();
            }
        }

        fabric_id.ok_or(chip_error_not_found!())
    }

    pub fn encode_to_tlv<W: TlvWriter>(&self, writer: &mut W, tag: Tag) -> ChipErrorResult {
        let mut outer = TlvType::KtlvTypeNotSpecified;
        writer.start_container(tag, TlvType::KtlvTypeList, &mut outer)?;

        for rdn in self.rdn.iter().take_while(|rdn| !rdn.is_empty()) {
            let mut tag_num = (rdn.m_attr_oid & 0xFF) as u32;
            match rdn.m_value {
                RdnValue::ChipVal(value) => {
                    writer.put_u64(context_tag(tag_num as u8), value)?;
                }
                RdnValue::String { value, printable } => {
                    if printable {
                        tag_num |= K_OID_ATTRIBUTE_IS_PRINTABLE_STRING_FLAG;
                    }
                    writer.put_string(context_tag(tag_num as u8), value)?;
                }
                RdnValue::None => {}
            }
        }

        writer.end_container(outer)
    }

    // The reader must be positioned on the DN list element.
    pub fn decode_from_tlv<R: TlvReader<'a>>(&mut self, reader: &mut R) -> ChipErrorResult {
        verify_or_return_error!(
            reader.get_type() == TlvType::KtlvTypeList,
            Err(chip_error_unsupported_cert_format!())
        );
        self.clear();

        let outer = reader.enter_container()?;
        loop {
            match reader.next() {
                Ok(()) => {}
                Err(e) if e == crate::chip_error_end_of_tlv!() => break,
                Err(e) => return Err(e),
            }

            let tag = reader.get_tag();
            verify_or_return_error!(
                is_context_tag(&tag),
                Err(chip_error_unsupported_cert_format!())
            );
            let tag_num = tag_num_from_tag(&tag);
            let printable = (tag_num & K_OID_ATTRIBUTE_IS_PRINTABLE_STRING_FLAG) != 0;
            let oid = get_oid(
                K_OID_CATEGORY_ATTRIBUTE_TYPE,
                (tag_num & !K_OID_ATTRIBUTE_IS_PRINTABLE_STRING_FLAG) as u8,
            );
            verify_or_return_error!(
                is_known_attribute_oid(oid),
                Err(chip_error_unsupported_cert_format!())
            );

            if is_chip_dn_attr(oid) {
                verify_or_return_error!(!printable, Err(chip_error_wrong_cert_dn!()));
                self.add_attribute(oid, reader.get_u64()?)?;
            } else {
                self.add_attribute_string(oid, reader.get_string()?, printable)?;
            }
        }

        reader.exit_container(outer)
    }

    pub fn encode_to_asn1<W: crate::chip::asn1::Asn1Writer>(
        &self,
        writer: &mut W,
    ) -> ChipErrorResult {
        use crate::chip::asn1::der;

        writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;

        for rdn in self.rdn.iter().take_while(|rdn| !rdn.is_empty()) {
            writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SET)?;
            writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;
            writer.put_object_id(rdn.m_attr_oid)?;

            match rdn.m_value {
                RdnValue::ChipVal(value) => {
                    // Matter attribute values cross into DER as fixed-width
                    // uppercase hex UTF8Strings.
                    let mut hex = [0u8; bytes_to_hex::K_UINT64_HEX_LENGTH];
                    let hex_len = if is_chip_64bit_dn_attr(rdn.m_attr_oid) {
                        bytes_to_hex::uint64_to_hex(value, &mut hex)?;
                        bytes_to_hex::K_UINT64_HEX_LENGTH
                    } else {
                        bytes_to_hex::uint32_to_hex(value as u32, &mut hex)?;
                        bytes_to_hex::K_UINT32_HEX_LENGTH
                    };
                    let hex_str = core::str::from_utf8(&hex[..hex_len])
                        .map_err(|_| chip_error_invalid_argument!())?;
                    writer.put_string(der::K_TAG_UTF8_STRING, hex_str)?;
                }
                RdnValue::String { value, printable } => {
                    let string_tag =
                        if rdn.m_attr_oid == Asn1Oid::KoidAttributeTypeDomainComponent as Oid {
                            der::K_TAG_IA5_STRING
                        } else if printable {
                            der::K_TAG_PRINTABLE_STRING
                        } else {
                            der::K_TAG_UTF8_STRING
                        };
                    writer.put_string(string_tag, value)?;
                }
                RdnValue::None => {}
            }

            writer.end_constructed()?;
            writer.end_constructed()?;
        }

        writer.end_constructed()
    }

    // The reader must be positioned on the Name SEQUENCE.
    pub fn decode_from_asn1(
        &mut self,
        reader: &mut crate::chip::asn1::Asn1Reader<'a>,
    ) -> ChipErrorResult {
        use crate::chip::asn1::der;

        self.clear();
        reader.enter_constructed_type()?;

        loop {
            match reader.next() {
                Ok(()) => {}
                Err(e) if e == crate::asn1_end!() => break,
                Err(e) => return Err(e),
            }

            verify_or_return_error!(
                reader.get_tag() == der::K_TAG_SET && reader.is_constructed(),
                Err(chip_error_unsupported_cert_format!())
            );
            reader.enter_constructed_type()?;
            reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
            reader.enter_constructed_type()?;

            reader.next()?;
            let oid = reader.get_object_id()?;
            verify_or_return_error!(
                is_known_attribute_oid(oid),
                Err(chip_error_unsupported_cert_format!())
            );

            reader.next()?;
            if is_chip_dn_attr(oid) {
                verify_or_return_error!(
                    reader.get_tag() == der::K_TAG_UTF8_STRING,
                    Err(chip_error_wrong_cert_dn!())
                );
                let hex = reader.get_string()?;
                let value = if is_chip_64bit_dn_attr(oid) {
                    bytes_to_hex::hex_to_uint64(hex.as_bytes())?
                } else {
                    bytes_to_hex::hex_to_uint32(hex.as_bytes())? as u64
                };
                self.add_attribute(oid, value)?;
            } else {
                let printable = reader.get_tag() == der::K_TAG_PRINTABLE_STRING;
                self.add_attribute_string(oid, reader.get_string()?, printable)?;
            }

            reader.exit_constructed_type()?;
            reader.exit_constructed_type()?;
        }

        reader.exit_constructed_type()
    }
}

pub struct ChipCertificateData<'a> {
    pub m_certificate: &'a [u8],
    pub m_serial_number: &'a [u8],
    pub m_subject_dn: ChipDN<'a>,
    pub m_issuer_dn: ChipDN<'a>,
    pub m_subject_key_id: CertificateKeyId,
    pub m_auth_key_id: CertificateKeyId,
    pub m_not_before_time: u32,
    pub m_not_after_time: u32,
    pub m_public_key: &'a [u8],
    pub m_signature: &'a [u8],
    pub m_future_extension: &'a [u8],
    pub m_pub_key_algo_oid: Oid,
    pub m_pub_key_curve_oid: Oid,
    pub m_sig_algo_oid: Oid,
    pub m_cert_flags: CertFlags,
    pub m_key_usage_flags: KeyUsageFlags,
    pub m_key_purpose_flags: KeyPurposeFlags,
    pub m_path_len_constraint: u8,
    pub m_tbs_hash: [u8; K_SHA256_HASH_LENGTH],
}

impl<'a> Default for ChipCertificateData<'a> {
    fn default() -> Self {
        ChipCertificateData::const_default()
    }
}

impl<'a> ChipCertificateData<'a> {
    pub const fn const_default() -> Self {
        Self {
            m_certificate: &[],
            m_serial_number: &[],
            m_subject_dn: ChipDN::const_default(),
            m_issuer_dn: ChipDN::const_default(),
            m_subject_key_id: [0; K_KEY_IDENTIFIER_LENGTH],
            m_auth_key_id: [0; K_KEY_IDENTIFIER_LENGTH],
            m_not_before_time: 0,
            m_not_after_time: 0,
            m_public_key: &[],
            m_signature: &[],
            m_future_extension: &[],
            m_pub_key_algo_oid: Asn1Oid::KoidNotSpecified as Oid,
            m_pub_key_curve_oid: Asn1Oid::KoidNotSpecified as Oid,
            m_sig_algo_oid: Asn1Oid::KoidNotSpecified as Oid,
            m_cert_flags: CertFlags::empty(),
            m_key_usage_flags: KeyUsageFlags::empty(),
            m_key_purpose_flags: KeyPurposeFlags::empty(),
            m_path_len_constraint: 0,
            m_tbs_hash: [0; K_SHA256_HASH_LENGTH],
        }
    }

    pub fn clear(&mut self) {
        *self = Self::const_default();
    }

    pub fn is_equal(&self, other: &Self) -> bool {
        self.m_certificate == other.m_certificate
    }

    pub fn is_self_signed(&self) -> bool {
        self.m_issuer_dn.is_equal(&self.m_subject_dn) && self.m_auth_key_id == self.m_subject_key_id
    }
}

fn decode_basic_constraints<'a, R: TlvReader<'a>>(
    reader: &mut R,
    cert_data: &mut ChipCertificateData<'a>,
) -> ChipErrorResult {
    verify_or_return_error!(
        reader.get_type() == TlvType::KtlvTypeStructure,
        Err(chip_error_unsupported_cert_format!())
    );
    let outer = reader.enter_container()?;

    loop {
        match reader.next() {
            Ok(()) => {}
            Err(e) if e == crate::chip_error_end_of_tlv!() => break,
            Err(e) => return Err(e),
        }

        let tag = reader.get_tag();
        verify_or_return_error!(
            is_context_tag(&tag),
            Err(chip_error_unsupported_cert_format!())
        );
        match tag_num_from_tag(&tag) {
            n if n == ChipCertBasicConstraintsTag::KtagIsCA as u32 => {
                if reader.get_boolean()? {
                    cert_data.m_cert_flags.insert(CertFlags::KisCA);
                }
            }
            n if n == ChipCertBasicConstraintsTag::KtagPathLenConstraint as u32 => {
                cert_data.m_path_len_constraint = reader.get_u8()?;
                cert_data
                    .m_cert_flags
                    .insert(CertFlags::KpathLenConstraintPresent);
            }
            _ => return Err(chip_error_unsupported_cert_format!()),
        }
    }

    cert_data
        .m_cert_flags
        .insert(CertFlags::KextPresentBasicConstraints);
    reader.exit_container(outer)
}

fn decode_extended_key_usage<'a, R: TlvReader<'a>>(
    reader: &mut R,
    cert_data: &mut ChipCertificateData<'a>,
) -> ChipErrorResult {
    verify_or_return_error!(
        reader.get_type() == TlvType::KtlvTypeArray,
        Err(chip_error_unsupported_cert_format!())
    );
    let outer = reader.enter_container()?;

    loop {
        match reader.next() {
            Ok(()) => {}
            Err(e) if e == crate::chip_error_end_of_tlv!() => break,
            Err(e) => return Err(e),
        }

        let purpose_id = reader.get_u8()?;
        let flag = key_purpose_flag_for_oid(get_oid(K_OID_CATEGORY_KEY_PURPOSE, purpose_id))
            .ok_or(chip_error_unsupported_cert_format!())?;
        cert_data.m_key_purpose_flags.insert(flag);
    }

    cert_data
        .m_cert_flags
        .insert(CertFlags::KextPresentExtendedKeyUsage);
    reader.exit_container(outer)
}

fn decode_key_identifier<'a, R: TlvReader<'a>>(
    reader: &mut R,
    out: &mut CertificateKeyId,
) -> ChipErrorResult {
    let bytes = reader.get_bytes()?;
    verify_or_return_error!(
        bytes.len() == K_KEY_IDENTIFIER_LENGTH,
        Err(chip_error_unsupported_cert_format!())
    );
    out.copy_from_slice(bytes);
    Ok(())
}

// The blob is a DER Extension: SEQUENCE { extnID, critical BOOLEAN
// OPTIONAL, extnValue OCTET STRING }.
fn decode_future_extension<'a>(
    blob: &'a [u8],
    cert_data: &mut ChipCertificateData<'a>,
) -> ChipErrorResult {
    let mut reader = crate::chip::asn1::Asn1Reader::new(blob);
    reader
        .next_expect(
            crate::chip::asn1::der::K_CLASS_UNIVERSAL,
            crate::chip::asn1::der::K_TAG_SEQUENCE,
            true,
        )
        .map_err(|_| chip_error_unsupported_cert_format!())?;
    reader
        .enter_constructed_type()
        .map_err(|_| chip_error_unsupported_cert_format!())?;
    reader
        .next()
        .map_err(|_| chip_error_unsupported_cert_format!())?;

    if reader.next().is_ok() && reader.get_tag() == crate::chip::asn1::der::K_TAG_BOOLEAN {
        if reader.get_boolean().unwrap_or(false) {
            cert_data
                .m_cert_flags
                .insert(CertFlags::KextPresentFutureIsCritical);
        }
    }

    cert_data.m_future_extension = blob;
    cert_data
        .m_cert_flags
        .insert(CertFlags::KextPresentFutureExtension);
    Ok(())
}

fn decode_extensions<'a, R: TlvReader<'a>>(
    reader: &mut R,
    cert_data: &mut ChipCertificateData<'a>,
) -> ChipErrorResult {
    verify_or_return_error!(
        reader.get_type() == TlvType::KtlvTypeList,
        Err(chip_error_unsupported_cert_format!())
    );
    let outer = reader.enter_container()?;

    loop {
        match reader.next() {
            Ok(()) => {}
            Err(e) if e == crate::chip_error_end_of_tlv!() => break,
            Err(e) => return Err(e),
        }

        let tag = reader.get_tag();
        verify_or_return_error!(
            is_context_tag(&tag),
            Err(chip_error_unsupported_cert_format!())
        );
        match tag_num_from_tag(&tag) {
            n if n == ChipCertExtTag::KtagBasicConstraints as u32 => {
                decode_basic_constraints(reader, cert_data)?;
            }
            n if n == ChipCertExtTag::KtagKeyUsage as u32 => {
                let bits = reader.get_u16()?;
                cert_data.m_key_usage_flags = KeyUsageFlags::from_bits(bits)
                    .ok_or(chip_error_unsupported_cert_format!())?;
                cert_data.m_cert_flags.insert(CertFlags::KextPresentKeyUsage);
            }
            n if n == ChipCertExtTag::KtagExtendedKeyUsage as u32 => {
                decode_extended_key_usage(reader, cert_data)?;
            }
            n if n == ChipCertExtTag::KtagSubjectKeyId as u32 => {
                let mut key_id = [0u8; K_KEY_IDENTIFIER_LENGTH];
                decode_key_identifier(reader, &mut key_id)?;
                cert_data.m_subject_key_id = key_id;
                cert_data
                    .m_cert_flags
                    .insert(CertFlags::KextPresentSubjectKeyId);
            }
            n if n == ChipCertExtTag::KtagAuthorityKeyId as u32 => {
                let mut key_id = [0u8; K_KEY_IDENTIFIER_LENGTH];
                decode_key_identifier(reader, &mut key_id)?;
                cert_data.m_auth_key_id = key_id;
                cert_data
                    .m_cert_flags
                    .insert(CertFlags::KextPresentAuthKeyId);
            }
            n if n == ChipCertExtTag::KtagFutureExtension as u32 => {
                let blob = reader.get_bytes()?;
                decode_future_extension(blob, cert_data)?;
            }
            _ => return Err(chip_error_unsupported_cert_format!()),
        }
    }

    reader.exit_container(outer)
}

pub fn decode_chip_cert_with_reader<'a, R: TlvReader<'a>>(
    reader: &mut R,
    cert_data: &mut ChipCertificateData<'a>,
    chip_cert: &'a [u8],
    decode_flags: CertDecodeFlags,
) -> ChipErrorResult {
    cert_data.clear();

    if reader.get_type() == TlvType::KtlvTypeNotSpecified {
        reader.next()?;
    }
    reader.expect_type_tag(TlvType::KtlvTypeStructure, anonymous_tag())?;
    let outer = reader.enter_container()?;

    reader.next_tag(context_tag(ChipCertTag::KtagSerialNumber as u8))?;
    let serial = reader.get_bytes()?;
    verify_or_return_error!(
        !serial.is_empty() && serial.len() <= K_MAX_CERT_SERIAL_NUMBER_LENGTH,
        Err(chip_error_unsupported_cert_format!())
    );
    cert_data.m_serial_number = serial;

    reader.next_tag(context_tag(ChipCertTag::KtagSignatureAlgorithm as u8))?;
    cert_data.m_sig_algo_oid = get_oid(K_OID_CATEGORY_SIG_ALGO, reader.get_u8()?);
    verify_or_return_error!(
        cert_data.m_sig_algo_oid == Asn1Oid::KoidSigAlgoECDSAWithSHA256 as Oid,
        Err(chip_error_unsupported_signature_type!())
    );

    reader.next_tag(context_tag(ChipCertTag::KtagIssuer as u8))?;
    cert_data.m_issuer_dn.decode_from_tlv(reader)?;

    reader.next_tag(tag_not_before())?;
    cert_data.m_not_before_time = reader.get_u32()?;
    reader.next_tag(tag_not_after())?;
    cert_data.m_not_after_time = reader.get_u32()?;
    if cert_data.m_not_after_time != K_NULL_CERT_TIME {
        verify_or_return_error!(
            cert_data.m_not_before_time <= cert_data.m_not_after_time,
            Err(chip_error_invalid_argument!())
        );
    }

    reader.next_tag(context_tag(ChipCertTag::KtagSubject as u8))?;
    cert_data.m_subject_dn.decode_from_tlv(reader)?;

    reader.next_tag(context_tag(ChipCertTag::KtagPublicKeyAlgorithm as u8))?;
    cert_data.m_pub_key_algo_oid = get_oid(K_OID_CATEGORY_PUBKEY_ALGO, reader.get_u8()?);
    verify_or_return_error!(
        cert_data.m_pub_key_algo_oid == Asn1Oid::KoidPubKeyAlgoECPublicKey as Oid,
        Err(chip_error_unsupported_cert_format!())
    );

    reader.next_tag(context_tag(ChipCertTag::KtagEllipticCurveId as u8))?;
    cert_data.m_pub_key_curve_oid = get_oid(K_OID_CATEGORY_ELLIPTIC_CURVE, reader.get_u8()?);
    verify_or_return_error!(
        cert_data.m_pub_key_curve_oid == Asn1Oid::KoidEllipticCurvePrime256v1 as Oid,
        Err(chip_error_unsupported_elliptic_curve!())
    );

    reader.next_tag(context_tag(ChipCertTag::KtagEllipticCurvePublicKey as u8))?;
    let public_key = reader.get_bytes()?;
    verify_or_return_error!(
        public_key.len() == K_P256_PUBLIC_KEY_LENGTH,
        Err(chip_error_unsupported_cert_format!())
    );
    cert_data.m_public_key = public_key;

    reader.next_tag(context_tag(ChipCertTag::KtagExtensions as u8))?;
    decode_extensions(reader, cert_data)?;

    reader.next_tag(context_tag(ChipCertTag::KtagEcdsaSignature as u8))?;
    let signature = reader.get_bytes()?;
    verify_or_return_error!(
        signature.len() == K_P256_ECDSA_SIGNATURE_LENGTH_RAW,
        Err(chip_error_unsupported_cert_format!())
    );
    cert_data.m_signature = signature;

    reader.verify_end_of_container()?;
    reader.exit_container(outer)?;

    cert_data.m_certificate = chip_cert;

    if decode_flags.contains(CertDecodeFlags::KgenerateTbsHash) {
        super::chip_cert_to_x509::generate_tbs_hash(cert_data)?;
    }
    if decode_flags.contains(CertDecodeFlags::KisTrustAnchor) {
        cert_data.m_cert_flags.insert(CertFlags::KisTrustAnchor);
    }

    Ok(())
}

pub fn decode_chip_cert<'a>(
    chip_cert: &'a [u8],
    cert_data: &mut ChipCertificateData<'a>,
    decode_flags: CertDecodeFlags,
) -> ChipErrorResult {
    let mut reader = TlvContiguousBufferReader::new(chip_cert);
    decode_chip_cert_with_reader(&mut reader, cert_data, chip_cert, decode_flags)
}

// Re-encode a decoded certificate as TLV; the inverse of decode_chip_cert
// and the back half of the X.509 conversion.
pub fn encode_chip_cert<W: TlvWriter>(
    cert_data: &ChipCertificateData,
    writer: &mut W,
) -> ChipErrorResult {
    let mut outer = TlvType::KtlvTypeNotSpecified;
    writer.start_container(anonymous_tag(), TlvType::KtlvTypeStructure, &mut outer)?;

    writer.put_bytes(
        context_tag(ChipCertTag::KtagSerialNumber as u8),
        cert_data.m_serial_number,
    )?;
    writer.put_u8(
        context_tag(ChipCertTag::KtagSignatureAlgorithm as u8),
        (cert_data.m_sig_algo_oid & 0xFF) as u8,
    )?;
    cert_data
        .m_issuer_dn
        .encode_to_tlv(writer, context_tag(ChipCertTag::KtagIssuer as u8))?;
    writer.put_u32(tag_not_before(), cert_data.m_not_before_time)?;
    writer.put_u32(tag_not_after(), cert_data.m_not_after_time)?;
    cert_data
        .m_subject_dn
        .encode_to_tlv(writer, context_tag(ChipCertTag::KtagSubject as u8))?;
    writer.put_u8(
        context_tag(ChipCertTag::KtagPublicKeyAlgorithm as u8),
        (cert_data.m_pub_key_algo_oid & 0xFF) as u8,
    )?;
    writer.put_u8(
        context_tag(ChipCertTag::KtagEllipticCurveId as u8),
        (cert_data.m_pub_key_curve_oid & 0xFF) as u8,
    )?;
    writer.put_bytes(
        context_tag(ChipCertTag::KtagEllipticCurvePublicKey as u8),
        cert_data.m_public_key,
    )?;

    let mut ext_outer = TlvType::KtlvTypeNotSpecified;
    writer.start_container(
        context_tag(ChipCertTag::KtagExtensions as u8),
        TlvType::KtlvTypeList,
        &mut ext_outer,
    )?;

    if cert_data
        .m_cert_flags
        .contains(CertFlags::KextPresentBasicConstraints)
    {
        let mut bc_outer = TlvType::KtlvTypeNotSpecified;
        writer.start_container(
            context_tag(ChipCertExtTag::KtagBasicConstraints as u8),
            TlvType::KtlvTypeStructure,
            &mut bc_outer,
        )?;
        writer.put_boolean(
            context_tag(ChipCertBasicConstraintsTag::KtagIsCA as u8),
            cert_data.m_cert_flags.contains(CertFlags::KisCA),
        )?;
        if cert_data
            .m_cert_flags
            .contains(CertFlags::KpathLenConstraintPresent)
        {
            writer.put_u8(
                context_tag(ChipCertBasicConstraintsTag::KtagPathLenConstraint as u8),
                cert_data.m_path_len_constraint,
            )?;
        }
        writer.end_container(bc_outer)?;
    }

    if cert_data.m_cert_flags.contains(CertFlags::KextPresentKeyUsage) {
        writer.put_u16(
            context_tag(ChipCertExtTag::KtagKeyUsage as u8),
            cert_data.m_key_usage_flags.bits(),
        )?;
    }

    if cert_data
        .m_cert_flags
        .contains(CertFlags::KextPresentExtendedKeyUsage)
    {
        let mut eku_outer = TlvType::KtlvTypeNotSpecified;
        writer.start_container(
            context_tag(ChipCertExtTag::KtagExtendedKeyUsage as u8),
            TlvType::KtlvTypeArray,
            &mut eku_outer,
        )?;
        for (flag, id) in KEY_PURPOSE_TABLE.iter() {
            if cert_data.m_key_purpose_flags.contains(*flag) {
                writer.put_u8(anonymous_tag(), *id)?;
            }
        }
        writer.end_container(eku_outer)?;
    }

    if cert_data
        .m_cert_flags
        .contains(CertFlags::KextPresentSubjectKeyId)
    {
        writer.put_bytes(
            context_tag(ChipCertExtTag::KtagSubjectKeyId as u8),
            &cert_data.m_subject_key_id,
        )?;
    }
    if cert_data
        .m_cert_flags
        .contains(CertFlags::KextPresentAuthKeyId)
    {
        writer.put_bytes(
            context_tag(ChipCertExtTag::KtagAuthorityKeyId as u8),
            &cert_data.m_auth_key_id,
        )?;
    }
    if cert_data
        .m_cert_flags
        .contains(CertFlags::KextPresentFutureExtension)
    {
        writer.put_bytes(
            context_tag(ChipCertExtTag::KtagFutureExtension as u8),
            cert_data.m_future_extension,
        )?;
    }

    writer.end_container(ext_outer)?;

    writer.put_bytes(
        context_tag(ChipCertTag::KtagEcdsaSignature as u8),
        cert_data.m_signature,
    )?;

    writer.end_container(outer)
}

// Verify `cert`'s signature over its TBS hash against the signer's public
// key. The cert must have been decoded with KgenerateTbsHash.
pub fn verify_cert_signature(
    cert: &ChipCertificateData,
    signer: &ChipCertificateData,
) -> ChipErrorResult {
    verify_or_return_error!(
        cert.m_cert_flags.contains(CertFlags::KtbsHashPresent),
        Err(chip_error_invalid_argument!())
    );
    verify_raw_signature(signer.m_public_key, &cert.m_tbs_hash, cert.m_signature)
}

pub fn chip_epoch_to_asn1_time(epoch: u32, is_not_after: bool) -> Asn1UniversalTime {
    if is_not_after && epoch == K_NULL_CERT_TIME {
        return Asn1UniversalTime {
            year: 9999,
            month: 12,
            day: 31,
            hour: 23,
            minute: 59,
            second: 59,
        };
    }

    let (year, month, day, hour, minute, second) = chip_epoch_to_calendar_time(epoch);
    Asn1UniversalTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
    }
}

pub fn asn1_time_to_chip_epoch(time: &Asn1UniversalTime) -> Result<u32, ChipError> {
    if (time.year, time.month, time.day, time.hour, time.minute, time.second)
        == (9999, 12, 31, 23, 59, 59)
    {
        return Ok(K_NULL_CERT_TIME);
    }

    calendar_time_to_chip_epoch(
        time.year,
        time.month,
        time.day,
        time.hour,
        time.minute,
        time.second,
    )
    .map_err(|_| chip_error_unsupported_cert_format!())
}

// Owned staging buffer for conversion outputs, sized for the DER maximum.
pub struct CertBuffer {
    pub buf: [u8; K_MAX_DER_CERT_LENGTH],
    pub len: usize,
}

impl Default for CertBuffer {
    fn default() -> Self {
        CertBuffer::const_default()
    }
}

impl CertBuffer {
    pub const fn const_default() -> Self {
        Self {
            buf: [0; K_MAX_DER_CERT_LENGTH],
            len: 0,
        }
    }

    pub fn init(&mut self, cert: &[u8]) -> ChipErrorResult {
        verify_or_return_error!(
            !cert.is_empty() && cert.len() <= K_MAX_DER_CERT_LENGTH,
            Err(chip_error_invalid_argument!())
        );
        self.buf[..cert.len()].copy_from_slice(cert);
        self.set_length(cert.len())
    }

    pub fn set_length(&mut self, size: usize) -> ChipErrorResult {
        verify_or_return_error!(
            size <= K_MAX_DER_CERT_LENGTH,
            Err(chip_error_invalid_argument!())
        );
        self.len = size;
        Ok(())
    }

    pub fn bytes(&mut self) -> &mut [u8] {
        &mut self.buf[..self.len]
    }

    pub fn const_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn length(&self) -> usize {
        self.len
    }
}
