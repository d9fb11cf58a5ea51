use crate::chip::asn1::{der, Asn1ContiguousBufferWriter, Asn1Reader, Asn1Writer};
use crate::ChipError;
use crate::ChipErrorResult;

use crate::chip_error_buffer_too_small;
use crate::chip_error_incorrect_state;
use crate::chip_error_internal;
use crate::chip_error_invalid_argument;
use crate::chip_error_invalid_signature;
use crate::chip_static_assert;
use crate::verify_or_return_error;

use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use generic_array::GenericArray;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;
use sha2::{Digest, Sha256};

pub const K_P256_FE_LENGTH: usize = 32;
pub const K_P256_ECDSA_SIGNATURE_LENGTH_RAW: usize = 2 * K_P256_FE_LENGTH;
pub const K_P256_POINT_LENGTH: usize = 2 * K_P256_FE_LENGTH + 1;
pub const K_SHA256_HASH_LENGTH: usize = 32;
pub const K_SHA1_HASH_LENGTH: usize = 20;
pub const K_SUBJECT_KEY_IDENTIFIER_LENGTH: usize = K_SHA1_HASH_LENGTH;
pub const K_AUTHORITY_KEY_IDENTIFIER_LENGTH: usize = K_SHA1_HASH_LENGTH;
pub const K_MAX_CERTIFICATE_SERIAL_NUMBER_LENGTH: usize = 20;

pub const K_P256_PRIVATE_KEY_LENGTH: usize = K_P256_FE_LENGTH;
pub const K_P256_PUBLIC_KEY_LENGTH: usize = K_P256_POINT_LENGTH;

pub const K_MAX_ECDSA_SIGNATURE_LENGTH: usize = K_P256_ECDSA_SIGNATURE_LENGTH_RAW;
pub const K_MAX_HASH_LENGTH: usize = K_SHA256_HASH_LENGTH;

/*
 * Overhead to encode a raw ECDSA signature in X9.62 format in ASN.1 DER
 *
 * Ecdsa-Sig-Value ::= SEQUENCE {
 *     r       INTEGER,
 *     s       INTEGER
 * }
 *
 * The SEQUENCE head costs at most 3 bytes and each INTEGER head plus a
 * possible 0x00 pad costs at most 3 bytes.
 */
pub const K_MAX_ECDSA_X9DOT62_ASN1_OVERHEAD: usize = 9;
pub const K_MAX_ECDSA_SIGNATURE_LENGTH_DER: usize =
    K_MAX_ECDSA_SIGNATURE_LENGTH + K_MAX_ECDSA_X9DOT62_ASN1_OVERHEAD;

chip_static_assert!(
    K_MAX_ECDSA_SIGNATURE_LENGTH >= K_P256_ECDSA_SIGNATURE_LENGTH_RAW,
    "ECDSA signature buffer length is too short for crypto suite"
);

pub fn clear_secret_data(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        unsafe {
            core::ptr::write_volatile(b, 0);
        }
    }
}

pub fn is_buffer_content_equal_constant_time(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

pub struct SensitiveDataBuffer<const KCAPACITY: usize> {
    m_bytes: [u8; KCAPACITY],
    m_length: usize,
}

impl<const KCAPACITY: usize> Default for SensitiveDataBuffer<KCAPACITY> {
    fn default() -> Self {
        SensitiveDataBuffer::<KCAPACITY>::const_default()
    }
}

impl<const KCAPACITY: usize> SensitiveDataBuffer<KCAPACITY> {
    pub const fn const_default() -> Self {
        Self {
            m_bytes: [0; KCAPACITY],
            m_length: 0,
        }
    }

    pub fn length(&self) -> usize {
        self.m_length
    }

    pub fn set_length(&mut self, length: usize) -> ChipErrorResult {
        verify_or_return_error!(length <= KCAPACITY, Err(chip_error_invalid_argument!()));
        self.m_length = length;
        Ok(())
    }

    pub fn bytes(&mut self) -> &mut [u8] {
        &mut self.m_bytes[..]
    }

    pub fn const_bytes(&self) -> &[u8] {
        &self.m_bytes[..]
    }

    pub const fn capacity(&self) -> usize {
        KCAPACITY
    }
}

impl<const KCAPACITY: usize> Drop for SensitiveDataBuffer<KCAPACITY> {
    fn drop(&mut self) {
        clear_secret_data(&mut self.m_bytes);
    }
}

impl<const KCAPACITY: usize> Clone for SensitiveDataBuffer<KCAPACITY> {
    fn clone(&self) -> Self {
        let mut clone = Self::default();
        clone.m_bytes.copy_from_slice(&self.m_bytes);
        clone.m_length = self.m_length;
        clone
    }
}

pub type P256EcdsaSignature = SensitiveDataBuffer<K_MAX_ECDSA_SIGNATURE_LENGTH>;

pub trait ECPKey {
    type Sig;

    fn length(&self) -> usize;
    fn const_bytes(&self) -> &[u8];
    fn is_uncompressed(&self) -> bool;

    fn matches(&self, other: &Self) -> bool {
        self.length() == other.length()
            && is_buffer_content_equal_constant_time(self.const_bytes(), other.const_bytes())
    }

    fn ecdsa_validate_msg_signature(&self, msg: &[u8], signature: &Self::Sig) -> ChipErrorResult;
    fn ecdsa_validate_hash_signature(&self, hash: &[u8], signature: &Self::Sig) -> ChipErrorResult;
}

#[derive(Clone)]
pub struct P256PublicKey {
    m_bytes: [u8; K_P256_PUBLIC_KEY_LENGTH],
}

impl Default for P256PublicKey {
    fn default() -> Self {
        P256PublicKey::const_default()
    }
}

impl P256PublicKey {
    pub const fn const_default() -> Self {
        Self {
            m_bytes: [0; K_P256_PUBLIC_KEY_LENGTH],
        }
    }

    pub fn from_span(span: &[u8]) -> Result<Self, ChipError> {
        verify_or_return_error!(
            span.len() == K_P256_PUBLIC_KEY_LENGTH,
            Err(chip_error_invalid_argument!())
        );
        let mut key = Self::const_default();
        key.m_bytes.copy_from_slice(span);
        Ok(key)
    }
}

impl ECPKey for P256PublicKey {
    type Sig = P256EcdsaSignature;

    fn length(&self) -> usize {
        K_P256_PUBLIC_KEY_LENGTH
    }

    fn const_bytes(&self) -> &[u8] {
        &self.m_bytes[..]
    }

    fn is_uncompressed(&self) -> bool {
        const K_UNCOMPRESSED_POINT_MARKER: u8 = 0x04;

        // SEC1 definition of an uncompressed point is (0x04 || X || Y) where X
        // and Y are raw zero-padded big-endian large integers of the group
        // size.
        self.length() == (K_P256_FE_LENGTH * 2 + 1)
            && self.const_bytes()[0] == K_UNCOMPRESSED_POINT_MARKER
    }

    fn ecdsa_validate_msg_signature(&self, msg: &[u8], signature: &Self::Sig) -> ChipErrorResult {
        let mut hash = [0u8; K_SHA256_HASH_LENGTH];
        hash_sha256(msg, &mut hash);
        self.ecdsa_validate_hash_signature(&hash, signature)
    }

    fn ecdsa_validate_hash_signature(&self, hash: &[u8], signature: &Self::Sig) -> ChipErrorResult {
        verify_or_return_error!(
            hash.len() == K_SHA256_HASH_LENGTH,
            Err(chip_error_invalid_argument!())
        );
        verify_raw_signature(self.const_bytes(), hash, signature.const_bytes())
    }
}

// Raw (r || s) P-256 signature verification over a precomputed SHA-256
// digest.
pub fn verify_raw_signature(public_key: &[u8], hash: &[u8], signature: &[u8]) -> ChipErrorResult {
    verify_or_return_error!(
        signature.len() == K_P256_ECDSA_SIGNATURE_LENGTH_RAW,
        Err(chip_error_invalid_argument!())
    );

    let verifying_key =
        VerifyingKey::from_sec1_bytes(public_key).map_err(|_| chip_error_invalid_argument!())?;
    let signature = Signature::from_bytes(GenericArray::from_slice(signature))
        .map_err(|_| chip_error_invalid_signature!())?;

    verifying_key
        .verify_prehash(hash, &signature)
        .map_err(|_| chip_error_invalid_signature!())
}

pub struct P256Keypair {
    m_signing_key: Option<SigningKey>,
    m_public_key: P256PublicKey,
}

impl Default for P256Keypair {
    fn default() -> Self {
        Self {
            m_signing_key: None,
            m_public_key: P256PublicKey::const_default(),
        }
    }
}

impl P256Keypair {
    pub fn initialize(&mut self) -> ChipErrorResult {
        let signing_key = SigningKey::random(&mut OsRng);
        let point = signing_key.verifying_key().to_encoded_point(false);
        self.m_public_key = P256PublicKey::from_span(point.as_bytes())?;
        self.m_signing_key = Some(signing_key);
        Ok(())
    }

    pub fn public_key(&self) -> &P256PublicKey {
        &self.m_public_key
    }

    pub fn ecdsa_sign_hash(
        &self,
        hash: &[u8],
        out_signature: &mut P256EcdsaSignature,
    ) -> ChipErrorResult {
        let signing_key = self
            .m_signing_key
            .as_ref()
            .ok_or(chip_error_incorrect_state!())?;
        verify_or_return_error!(
            hash.len() == K_SHA256_HASH_LENGTH,
            Err(chip_error_invalid_argument!())
        );

        let signature: Signature = signing_key
            .sign_prehash(hash)
            .map_err(|_| chip_error_internal!())?;
        let bytes = signature.to_bytes();
        out_signature.bytes()[..K_P256_ECDSA_SIGNATURE_LENGTH_RAW].copy_from_slice(bytes.as_slice());
        out_signature.set_length(K_P256_ECDSA_SIGNATURE_LENGTH_RAW)
    }

    pub fn ecdsa_sign_msg(
        &self,
        msg: &[u8],
        out_signature: &mut P256EcdsaSignature,
    ) -> ChipErrorResult {
        let mut hash = [0u8; K_SHA256_HASH_LENGTH];
        hash_sha256(msg, &mut hash);
        self.ecdsa_sign_hash(&hash, out_signature)
    }
}

pub fn hash_sha256(data: &[u8], out: &mut [u8; K_SHA256_HASH_LENGTH]) {
    let mut hasher = Sha256::new();
    hasher.update(data);
    out.copy_from_slice(hasher.finalize().as_slice());
}

fn put_der_integer_from_raw<W: Asn1Writer>(raw: &[u8], writer: &mut W) -> ChipErrorResult {
    let mut start = 0usize;
    while start < raw.len() - 1 && raw[start] == 0 {
        start += 1;
    }
    let body = &raw[start..];

    if (body[0] & 0x80) != 0 {
        let mut padded = [0u8; K_P256_FE_LENGTH + 1];
        padded[1..1 + body.len()].copy_from_slice(body);
        writer.put_integer_from_bytes(&padded[..body.len() + 1])
    } else {
        writer.put_integer_from_bytes(body)
    }
}

// Matter TLV certificates carry raw r || s; X.509 carries the X9.62 DER
// form. The two conversions below are exact inverses on valid inputs.
pub fn ecdsa_raw_signature_to_der(raw: &[u8], out: &mut [u8]) -> Result<usize, ChipError> {
    verify_or_return_error!(
        raw.len() == K_P256_ECDSA_SIGNATURE_LENGTH_RAW,
        Err(chip_error_invalid_argument!())
    );

    let mut writer = Asn1ContiguousBufferWriter::new(out);
    writer.start_constructed(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE)?;
    put_der_integer_from_raw(&raw[..K_P256_FE_LENGTH], &mut writer)?;
    put_der_integer_from_raw(&raw[K_P256_FE_LENGTH..], &mut writer)?;
    writer.end_constructed()?;

    Ok(writer.get_length_written())
}

fn copy_der_integer_to_fixed(content: &[u8], out: &mut [u8]) -> ChipErrorResult {
    let mut start = 0usize;
    while start < content.len() && content[start] == 0 {
        start += 1;
    }
    let body = &content[start..];
    verify_or_return_error!(body.len() <= out.len(), Err(chip_error_buffer_too_small!()));

    let pad = out.len() - body.len();
    out[..pad].fill(0);
    out[pad..].copy_from_slice(body);
    Ok(())
}

pub fn ecdsa_der_signature_to_raw(der_signature: &[u8], out: &mut [u8]) -> ChipErrorResult {
    verify_or_return_error!(
        out.len() == K_P256_ECDSA_SIGNATURE_LENGTH_RAW,
        Err(chip_error_invalid_argument!())
    );

    let mut reader = Asn1Reader::new(der_signature);
    reader.next_expect(der::K_CLASS_UNIVERSAL, der::K_TAG_SEQUENCE, true)?;
    reader.enter_constructed_type()?;

    reader.next()?;
    let r = reader.get_value();
    verify_or_return_error!(
        reader.get_tag() == der::K_TAG_INTEGER,
        Err(chip_error_invalid_argument!())
    );
    copy_der_integer_to_fixed(r, &mut out[..K_P256_FE_LENGTH])?;

    reader.next()?;
    let s = reader.get_value();
    verify_or_return_error!(
        reader.get_tag() == der::K_TAG_INTEGER,
        Err(chip_error_invalid_argument!())
    );
    copy_der_integer_to_fixed(s, &mut out[K_P256_FE_LENGTH..])?;

    reader.exit_constructed_type()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trip() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();

        let msg = b"attestation payload";
        let mut signature = P256EcdsaSignature::default();
        keypair.ecdsa_sign_msg(msg, &mut signature).unwrap();
        assert_eq!(K_P256_ECDSA_SIGNATURE_LENGTH_RAW, signature.length());

        assert!(keypair
            .public_key()
            .ecdsa_validate_msg_signature(msg, &signature)
            .is_ok());
    }

    #[test]
    fn tampered_signature_fails() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();

        let msg = b"attestation payload";
        let mut signature = P256EcdsaSignature::default();
        keypair.ecdsa_sign_msg(msg, &mut signature).unwrap();
        signature.bytes()[10] ^= 0x01;

        assert_eq!(
            Err(chip_error_invalid_signature!()),
            keypair
                .public_key()
                .ecdsa_validate_msg_signature(msg, &signature)
        );
    }

    #[test]
    fn wrong_key_fails() {
        let mut signer = P256Keypair::default();
        signer.initialize().unwrap();
        let mut other = P256Keypair::default();
        other.initialize().unwrap();

        let msg = b"hello";
        let mut signature = P256EcdsaSignature::default();
        signer.ecdsa_sign_msg(msg, &mut signature).unwrap();

        assert!(other
            .public_key()
            .ecdsa_validate_msg_signature(msg, &signature)
            .is_err());
    }

    #[test]
    fn signature_der_round_trip() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let mut signature = P256EcdsaSignature::default();
        keypair.ecdsa_sign_msg(b"data", &mut signature).unwrap();

        let mut der_buf = [0u8; K_MAX_ECDSA_SIGNATURE_LENGTH_DER];
        let der_len = ecdsa_raw_signature_to_der(signature.const_bytes(), &mut der_buf).unwrap();

        let mut raw = [0u8; K_P256_ECDSA_SIGNATURE_LENGTH_RAW];
        ecdsa_der_signature_to_raw(&der_buf[..der_len], &mut raw).unwrap();
        assert_eq!(signature.const_bytes(), &raw);
    }

    #[test]
    fn high_bit_integers_get_padded() {
        let mut raw = [0u8; K_P256_ECDSA_SIGNATURE_LENGTH_RAW];
        raw[0] = 0x80;
        raw[K_P256_FE_LENGTH] = 0xFF;

        let mut der_buf = [0u8; K_MAX_ECDSA_SIGNATURE_LENGTH_DER];
        let der_len = ecdsa_raw_signature_to_der(&raw, &mut der_buf).unwrap();

        let mut round = [0u8; K_P256_ECDSA_SIGNATURE_LENGTH_RAW];
        ecdsa_der_signature_to_raw(&der_buf[..der_len], &mut round).unwrap();
        assert_eq!(raw, round);
    }

    #[test]
    fn constant_time_compare() {
        assert!(is_buffer_content_equal_constant_time(b"abc", b"abc"));
        assert!(!is_buffer_content_equal_constant_time(b"abc", b"abd"));
        assert!(!is_buffer_content_equal_constant_time(b"abc", b"ab"));
    }

    #[test]
    fn matches_compares_keys() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let copy = P256PublicKey::from_span(keypair.public_key().const_bytes()).unwrap();
        assert!(keypair.public_key().matches(&copy));
        assert!(keypair.public_key().is_uncompressed());
    }
}
