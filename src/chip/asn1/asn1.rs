pub type Oid = u16;

pub const K_OID_CATEGORY_MASK: Oid = 0xFF00;
pub const K_OID_CATEGORY_PUBKEY_ALGO: Oid = 0x0100;
pub const K_OID_CATEGORY_SIG_ALGO: Oid = 0x0200;
pub const K_OID_CATEGORY_ATTRIBUTE_TYPE: Oid = 0x0300;
pub const K_OID_CATEGORY_ELLIPTIC_CURVE: Oid = 0x0400;
pub const K_OID_CATEGORY_EXTENSION: Oid = 0x0500;
pub const K_OID_CATEGORY_KEY_PURPOSE: Oid = 0x0600;

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asn1Oid {
    KoidPubKeyAlgoECPublicKey = 0x0101,

    KoidSigAlgoECDSAWithSHA256 = 0x0201,

    KoidAttributeTypeCommonName = 0x0301,
    KoidAttributeTypeSurname = 0x0302,
    KoidAttributeTypeSerialNumber = 0x0303,
    KoidAttributeTypeCountryName = 0x0304,
    KoidAttributeTypeLocalityName = 0x0305,
    KoidAttributeTypeStateOrProvinceName = 0x0306,
    KoidAttributeTypeOrganizationName = 0x0307,
    KoidAttributeTypeOrganizationalUnitName = 0x0308,
    KoidAttributeTypeTitle = 0x0309,
    KoidAttributeTypeName = 0x030A,
    KoidAttributeTypeGivenName = 0x030B,
    KoidAttributeTypeInitials = 0x030C,
    KoidAttributeTypeGenerationQualifier = 0x030D,
    KoidAttributeTypeDNQualifier = 0x030E,
    KoidAttributeTypePseudonym = 0x030F,
    KoidAttributeTypeDomainComponent = 0x0310,
    KoidAttributeTypeMatterNodeId = 0x0311,
    KoidAttributeTypeMatterFirmwareSigningId = 0x0312,
    KoidAttributeTypeMatterICACId = 0x0313,
    KoidAttributeTypeMatterRCACId = 0x0314,
    KoidAttributeTypeMatterFabricId = 0x0315,
    KoidAttributeTypeMatterCASEAuthTag = 0x0316,

    KoidEllipticCurvePrime256v1 = 0x0401,

    KoidExtensionBasicConstraints = 0x0501,
    KoidExtensionKeyUsage = 0x0502,
    KoidExtensionExtendedKeyUsage = 0x0503,
    KoidExtensionSubjectKeyIdentifier = 0x0504,
    KoidExtensionAuthorityKeyIdentifier = 0x0505,

    KoidKeyPurposeServerAuth = 0x0601,
    KoidKeyPurposeClientAuth = 0x0602,
    KoidKeyPurposeCodeSigning = 0x0603,
    KoidKeyPurposeEmailProtection = 0x0604,
    KoidKeyPurposeTimeStamping = 0x0605,
    KoidKeyPurposeOCSPSigning = 0x0606,

    KoidNotSpecified = 0,
    KoidUnknown = 0xFFFF,
}

impl From<Asn1Oid> for Oid {
    fn from(value: Asn1Oid) -> Self {
        value as Oid
    }
}

pub fn oid_category(oid: Oid) -> Oid {
    oid & K_OID_CATEGORY_MASK
}

pub const fn get_oid(category: Oid, id: u8) -> Oid {
    category | id as Oid
}

struct OidTableEntry {
    oid: Oid,
    der: &'static [u8],
}

const fn entry(oid: Asn1Oid, der: &'static [u8]) -> OidTableEntry {
    OidTableEntry {
        oid: oid as Oid,
        der,
    }
}

static OID_TABLE: &[OidTableEntry] = &[
    // 1.2.840.10045.2.1
    entry(
        Asn1Oid::KoidPubKeyAlgoECPublicKey,
        &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01],
    ),
    // 1.2.840.10045.4.3.2
    entry(
        Asn1Oid::KoidSigAlgoECDSAWithSHA256,
        &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x02],
    ),
    entry(Asn1Oid::KoidAttributeTypeCommonName, &[0x55, 0x04, 0x03]),
    entry(Asn1Oid::KoidAttributeTypeSurname, &[0x55, 0x04, 0x04]),
    entry(Asn1Oid::KoidAttributeTypeSerialNumber, &[0x55, 0x04, 0x05]),
    entry(Asn1Oid::KoidAttributeTypeCountryName, &[0x55, 0x04, 0x06]),
    entry(Asn1Oid::KoidAttributeTypeLocalityName, &[0x55, 0x04, 0x07]),
    entry(
        Asn1Oid::KoidAttributeTypeStateOrProvinceName,
        &[0x55, 0x04, 0x08],
    ),
    entry(
        Asn1Oid::KoidAttributeTypeOrganizationName,
        &[0x55, 0x04, 0x0A],
    ),
    entry(
        Asn1Oid::KoidAttributeTypeOrganizationalUnitName,
        &[0x55, 0x04, 0x0B],
    ),
    entry(Asn1Oid::KoidAttributeTypeTitle, &[0x55, 0x04, 0x0C]),
    entry(Asn1Oid::KoidAttributeTypeName, &[0x55, 0x04, 0x29]),
    entry(Asn1Oid::KoidAttributeTypeGivenName, &[0x55, 0x04, 0x2A]),
    entry(Asn1Oid::KoidAttributeTypeInitials, &[0x55, 0x04, 0x2B]),
    entry(
        Asn1Oid::KoidAttributeTypeGenerationQualifier,
        &[0x55, 0x04, 0x2C],
    ),
    entry(Asn1Oid::KoidAttributeTypeDNQualifier, &[0x55, 0x04, 0x2E]),
    entry(Asn1Oid::KoidAttributeTypePseudonym, &[0x55, 0x04, 0x41]),
    // 0.9.2342.19200300.100.1.25
    entry(
        Asn1Oid::KoidAttributeTypeDomainComponent,
        &[0x09, 0x92, 0x26, 0x89, 0x93, 0xF2, 0x2C, 0x64, 0x01, 0x19],
    ),
    // Matter attribute arc: 1.3.6.1.4.1.37244.1.x
    entry(
        Asn1Oid::KoidAttributeTypeMatterNodeId,
        &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0xA2, 0x7C, 0x01, 0x01],
    ),
    entry(
        Asn1Oid::KoidAttributeTypeMatterFirmwareSigningId,
        &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0xA2, 0x7C, 0x01, 0x02],
    ),
    entry(
        Asn1Oid::KoidAttributeTypeMatterICACId,
        &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0xA2, 0x7C, 0x01, 0x03],
    ),
    entry(
        Asn1Oid::KoidAttributeTypeMatterRCACId,
        &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0xA2, 0x7C, 0x01, 0x04],
    ),
    entry(
        Asn1Oid::KoidAttributeTypeMatterFabricId,
        &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0xA2, 0x7C, 0x01, 0x05],
    ),
    entry(
        Asn1Oid::KoidAttributeTypeMatterCASEAuthTag,
        &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0xA2, 0x7C, 0x01, 0x06],
    ),
    // 1.2.840.10045.3.1.7
    entry(
        Asn1Oid::KoidEllipticCurvePrime256v1,
        &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07],
    ),
    entry(Asn1Oid::KoidExtensionBasicConstraints, &[0x55, 0x1D, 0x13]),
    entry(Asn1Oid::KoidExtensionKeyUsage, &[0x55, 0x1D, 0x0F]),
    entry(Asn1Oid::KoidExtensionExtendedKeyUsage, &[0x55, 0x1D, 0x25]),
    entry(
        Asn1Oid::KoidExtensionSubjectKeyIdentifier,
        &[0x55, 0x1D, 0x0E],
    ),
    entry(
        Asn1Oid::KoidExtensionAuthorityKeyIdentifier,
        &[0x55, 0x1D, 0x23],
    ),
    // 1.3.6.1.5.5.7.3.x
    entry(
        Asn1Oid::KoidKeyPurposeServerAuth,
        &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x01],
    ),
    entry(
        Asn1Oid::KoidKeyPurposeClientAuth,
        &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x02],
    ),
    entry(
        Asn1Oid::KoidKeyPurposeCodeSigning,
        &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x03],
    ),
    entry(
        Asn1Oid::KoidKeyPurposeEmailProtection,
        &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x04],
    ),
    entry(
        Asn1Oid::KoidKeyPurposeTimeStamping,
        &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x08],
    ),
    entry(
        Asn1Oid::KoidKeyPurposeOCSPSigning,
        &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x09],
    ),
];

pub fn der_encoding_for_oid(oid: Oid) -> Option<&'static [u8]> {
    OID_TABLE
        .iter()
        .find(|e| e.oid == oid)
        .map(|e| e.der)
}

pub fn oid_from_der_encoding(der: &[u8]) -> Oid {
    OID_TABLE
        .iter()
        .find(|e| e.der == der)
        .map(|e| e.oid)
        .unwrap_or(Asn1Oid::KoidUnknown as Oid)
}

// DER identifier octets for the universal types the certificate profile
// uses.
pub mod der {
    pub const K_CLASS_UNIVERSAL: u8 = 0x00;
    pub const K_CLASS_CONTEXT_SPECIFIC: u8 = 0x80;
    pub const K_FORM_CONSTRUCTED: u8 = 0x20;

    pub const K_TAG_BOOLEAN: u8 = 0x01;
    pub const K_TAG_INTEGER: u8 = 0x02;
    pub const K_TAG_BIT_STRING: u8 = 0x03;
    pub const K_TAG_OCTET_STRING: u8 = 0x04;
    pub const K_TAG_NULL: u8 = 0x05;
    pub const K_TAG_OBJECT_ID: u8 = 0x06;
    pub const K_TAG_UTF8_STRING: u8 = 0x0C;
    pub const K_TAG_SEQUENCE: u8 = 0x10;
    pub const K_TAG_SET: u8 = 0x11;
    pub const K_TAG_PRINTABLE_STRING: u8 = 0x13;
    pub const K_TAG_IA5_STRING: u8 = 0x16;
    pub const K_TAG_UTC_TIME: u8 = 0x17;
    pub const K_TAG_GENERALIZED_TIME: u8 = 0x18;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_extraction() {
        assert_eq!(
            K_OID_CATEGORY_ATTRIBUTE_TYPE,
            oid_category(Asn1Oid::KoidAttributeTypeMatterNodeId.into())
        );
        assert_eq!(
            K_OID_CATEGORY_SIG_ALGO,
            oid_category(Asn1Oid::KoidSigAlgoECDSAWithSHA256.into())
        );
    }

    #[test]
    fn oid_composition() {
        assert_eq!(
            Asn1Oid::KoidSigAlgoECDSAWithSHA256 as Oid,
            get_oid(K_OID_CATEGORY_SIG_ALGO, 1)
        );
    }

    #[test]
    fn der_table_round_trip() {
        for oid in [
            Asn1Oid::KoidAttributeTypeMatterNodeId,
            Asn1Oid::KoidEllipticCurvePrime256v1,
            Asn1Oid::KoidExtensionBasicConstraints,
            Asn1Oid::KoidKeyPurposeClientAuth,
        ] {
            let der = der_encoding_for_oid(oid.into()).unwrap();
            assert_eq!(oid as Oid, oid_from_der_encoding(der));
        }
    }

    #[test]
    fn unknown_der_encoding() {
        assert_eq!(
            Asn1Oid::KoidUnknown as Oid,
            oid_from_der_encoding(&[0x55, 0x55, 0x55])
        );
    }
}
