use crate::chip::credentials::{
    certificate_validity_policy::{
        apply_default_policy, CertificateValidityPolicy, CertificateValidityResult,
    },
    chip_cert::{
        decode_chip_cert, verify_cert_signature, CertDecodeFlags, CertFlags, CertType,
        CertificateKeyId, ChipCertificateData, ChipDN, KeyPurposeFlags, KeyUsageFlags,
        K_NULL_CERT_TIME,
    },
};

use crate::ChipError;
use crate::ChipErrorResult;

use crate::chip_error_ca_cert_not_found;
use crate::chip_error_cert_not_found;
use crate::chip_error_cert_path_len_constraint_exceeded;
use crate::chip_error_cert_path_too_long;
use crate::chip_error_cert_usage_not_allowed;
use crate::chip_error_internal;
use crate::chip_error_invalid_argument;
use crate::chip_error_no_memory;
use crate::chip_error_unsupported_cert_format;
use crate::chip_error_wrong_cert_type;
use crate::chip_ok;
use crate::verify_or_return_error;

use crate::chip_log_detail;
use crate::chip_log_error;

pub const K_MAX_CERTS_PER_STANDARD_SET: usize = 3;

// Bounds the recursion of the chain walk independently of the set size;
// operational chains are at most three certificates deep.
pub const K_MAX_CERT_CHAIN_DEPTH: u8 = 5;

// The effective time a validation runs against. A live clock reading gives
// hard verdicts; a last-known-good checkpoint gives softer ones; with
// neither, evaluation yields KtimeUnknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveTime {
    NotSpecified,
    CurrentChipEpochTime(u32),
    LastKnownGoodChipEpochTime(u32),
}

pub struct ValidationContext<'s, 'a, ValidityPolicy>
where
    ValidityPolicy: CertificateValidityPolicy,
{
    pub m_effective_time: EffectiveTime,
    // Output on success: the certificate that terminated the chain. May be
    // preset by the caller to designate an anchor; reset() clears it.
    pub m_trust_anchor: Option<&'s ChipCertificateData<'a>>,
    pub m_required_key_usages: KeyUsageFlags,
    pub m_required_key_purpose: KeyPurposeFlags,
    pub m_required_cert_type: CertType,
    pub m_validity_policy: Option<&'s ValidityPolicy>,
    // Union of the usages seen along the validated path; the requirement
    // check runs once the walk completes.
    m_found_key_usages: KeyUsageFlags,
    m_found_key_purposes: KeyPurposeFlags,
}

impl<'s, 'a, ValidityPolicy> ValidationContext<'s, 'a, ValidityPolicy>
where
    ValidityPolicy: CertificateValidityPolicy,
{
    pub const fn new() -> Self {
        Self {
            m_effective_time: EffectiveTime::NotSpecified,
            m_trust_anchor: None,
            m_required_key_usages: KeyUsageFlags::empty(),
            m_required_key_purpose: KeyPurposeFlags::empty(),
            m_required_cert_type: CertType::KnotSpecified,
            m_validity_policy: None,
            m_found_key_usages: KeyUsageFlags::empty(),
            m_found_key_purposes: KeyPurposeFlags::empty(),
        }
    }

    pub fn set_effective_time(&mut self, chip_time: EffectiveTime) {
        self.m_effective_time = chip_time;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl<'s, 'a, ValidityPolicy> Default for ValidationContext<'s, 'a, ValidityPolicy>
where
    ValidityPolicy: CertificateValidityPolicy,
{
    fn default() -> Self {
        ValidationContext::new()
    }
}

// A fixed-capacity collection holding one candidate chain. The capacity is
// a compile-time parameter; the default fits NOC + ICAC + RCAC.
pub struct ChipCertificateSet<'a, const N: usize = K_MAX_CERTS_PER_STANDARD_SET> {
    m_certs: [Option<ChipCertificateData<'a>>; N],
    m_cert_count: u8,
}

impl<'a, const N: usize> Default for ChipCertificateSet<'a, N> {
    fn default() -> Self {
        ChipCertificateSet::new()
    }
}

impl<'a, const N: usize> ChipCertificateSet<'a, N> {
    pub const fn new() -> Self {
        Self {
            m_certs: [const { None }; N],
            m_cert_count: 0,
        }
    }

    pub fn release(&mut self) {
        self.clear();
    }

    pub fn clear(&mut self) {
        for cert in self.m_certs.iter_mut() {
            *cert = None;
        }
        self.m_cert_count = 0;
    }

    pub fn load_cert(&mut self, chip_cert: &'a [u8], decode_flags: CertDecodeFlags) -> ChipErrorResult {
        let mut cert = ChipCertificateData::default();
        decode_chip_cert(chip_cert, &mut cert, decode_flags)?;

        // Verify the cert has both the Subject Key Id and Authority Key Id
        // extensions present. Only certs with both these extensions are
        // supported for the purposes of certificate validation.
        verify_or_return_error!(
            cert.m_cert_flags
                .contains(CertFlags::KextPresentSubjectKeyId | CertFlags::KextPresentAuthKeyId),
            Err(chip_error_unsupported_cert_format!())
        );

        // Loading a certificate already in the set is a no-op.
        for existing in self.m_certs.iter().flatten() {
            if existing.is_equal(&cert) {
                return chip_ok!();
            }
        }

        verify_or_return_error!(
            (self.m_cert_count as usize) < N,
            Err(chip_error_no_memory!())
        );

        self.m_certs[self.m_cert_count as usize] = Some(cert);
        self.m_cert_count += 1;

        chip_ok!()
    }

    // Pops the most recently loaded certificate; chain-building code uses
    // this to backtrack.
    pub fn release_last_cert(&mut self) -> ChipErrorResult {
        verify_or_return_error!(self.m_cert_count > 0, Err(chip_error_internal!()));

        self.m_certs[(self.m_cert_count - 1) as usize] = None;
        self.m_cert_count -= 1;

        chip_ok!()
    }

    // First match in load order wins when subject key ids collide.
    pub fn find_cert<'s>(&'s self, subject_key_id: &CertificateKeyId) -> Option<&'s ChipCertificateData<'a>> {
        self.m_certs[..self.m_cert_count as usize]
            .iter()
            .flatten()
            .find(|cert| cert.m_subject_key_id == *subject_key_id)
    }

    pub fn is_cert_in_the_set(&self, cert: &ChipCertificateData<'a>) -> bool {
        self.m_certs[..self.m_cert_count as usize]
            .iter()
            .flatten()
            .any(|current| core::ptr::eq(current, cert))
    }

    pub fn get_cert_count(&self) -> u8 {
        self.m_cert_count
    }

    pub fn get_certs(&self) -> &[Option<ChipCertificateData<'a>>] {
        &self.m_certs
    }

    pub fn get_last_cert<'s>(&'s self) -> Option<&'s ChipCertificateData<'a>> {
        if self.m_cert_count > 0 {
            self.m_certs[(self.m_cert_count - 1) as usize].as_ref()
        } else {
            None
        }
    }

    pub fn validate_cert<'s, Policy: CertificateValidityPolicy>(
        &'s self,
        cert: &'s ChipCertificateData<'a>,
        context: &mut ValidationContext<'s, 'a, Policy>,
    ) -> ChipErrorResult {
        verify_or_return_error!(
            self.is_cert_in_the_set(cert),
            Err(chip_error_invalid_argument!())
        );

        context.m_found_key_usages = KeyUsageFlags::empty();
        context.m_found_key_purposes = KeyPurposeFlags::empty();

        self.validate_cert_depth(cert, context, 0)?;

        // Requirements are satisfied when any certificate along the
        // validated path carries them; the certificate type applies to the
        // target itself and was checked at depth 0.
        if !context.m_required_key_usages.is_empty() {
            verify_or_return_error!(
                context
                    .m_found_key_usages
                    .contains(context.m_required_key_usages),
                Err(chip_error_cert_usage_not_allowed!())
            );
        }
        if !context.m_required_key_purpose.is_empty() {
            verify_or_return_error!(
                context
                    .m_found_key_purposes
                    .contains(context.m_required_key_purpose),
                Err(chip_error_cert_usage_not_allowed!())
            );
        }

        chip_ok!()
    }

    pub fn validate_cert_depth<'s, Policy: CertificateValidityPolicy>(
        &'s self,
        cert: &'s ChipCertificateData<'a>,
        context: &mut ValidationContext<'s, 'a, Policy>,
        depth: u8,
    ) -> ChipErrorResult {
        let cert_type = cert.m_subject_dn.get_cert_type()?;

        verify_or_return_error!(
            !cert
                .m_cert_flags
                .contains(CertFlags::KextPresentFutureIsCritical),
            Err(chip_error_cert_usage_not_allowed!())
        );

        if depth > 0 {
            // If the depth is greater than 0 then the certificate is
            // required to be a CA certificate.

            verify_or_return_error!(
                cert.m_cert_flags.contains(CertFlags::KisCA),
                Err(chip_error_cert_usage_not_allowed!())
            );

            // Verify the key usage extension is present and contains the
            // 'keyCertSign' flag.
            verify_or_return_error!(
                cert.m_cert_flags.contains(CertFlags::KextPresentKeyUsage)
                    && cert.m_key_usage_flags.contains(KeyUsageFlags::KkeyCertSign),
                Err(chip_error_cert_usage_not_allowed!())
            );

            verify_or_return_error!(
                cert_type == CertType::Kica || cert_type == CertType::Kroot,
                Err(chip_error_wrong_cert_type!())
            );

            // From the RFC, the path length constraint "gives the maximum
            // number of non-self-issued intermediate certificates that may
            // follow this certificate in a valid certification path. (Note:
            // The last certificate in the certification path is not an
            // intermediate certificate, and is not included in this
            // limit...)"
            if cert
                .m_cert_flags
                .contains(CertFlags::KpathLenConstraintPresent)
            {
                verify_or_return_error!(
                    (depth - 1) <= cert.m_path_len_constraint,
                    Err(chip_error_cert_path_len_constraint_exceeded!())
                );
            }
        } else if context.m_required_cert_type != CertType::KnotSpecified {
            verify_or_return_error!(
                cert_type == context.m_required_cert_type,
                Err(chip_error_wrong_cert_type!())
            );
        }

        if cert.m_cert_flags.contains(CertFlags::KextPresentKeyUsage) {
            context.m_found_key_usages |= cert.m_key_usage_flags;
        }
        if cert
            .m_cert_flags
            .contains(CertFlags::KextPresentExtendedKeyUsage)
        {
            context.m_found_key_purposes |= cert.m_key_purpose_flags;
        }

        verify_or_return_error!(
            depth <= K_MAX_CERT_CHAIN_DEPTH,
            Err(chip_error_cert_path_too_long!())
        );

        // Verify NotBefore and NotAfter validity of the certificate.
        //
        // X.509/RFC5280 defines the special time 99991231235959Z to mean
        // 'no well-defined expiration date'. In CHIP TLV-encoded
        // certificates this special value is represented as a CHIP epoch
        // time value of 0 sec (2000-01-01 00:00:00 UTC).
        let validity_result = match context.m_effective_time {
            EffectiveTime::CurrentChipEpochTime(time) => {
                if time < cert.m_not_before_time {
                    chip_log_detail!(
                        SecureChannel,
                        "certificate NotBefore {} is after current time {}",
                        cert.m_not_before_time,
                        time
                    );
                    CertificateValidityResult::KnotYetValid
                } else if cert.m_not_after_time != K_NULL_CERT_TIME && time > cert.m_not_after_time
                {
                    chip_log_detail!(
                        SecureChannel,
                        "certificate NotAfter {} is before current time {}",
                        cert.m_not_after_time,
                        time
                    );
                    CertificateValidityResult::Kexpired
                } else {
                    CertificateValidityResult::Kvalid
                }
            }
            EffectiveTime::LastKnownGoodChipEpochTime(time) => {
                // Last Known Good Time may not be moved forward except at
                // the time of commissioning or firmware update, so it can't
                // be used to validate NotBefore. However, so long as
                // firmware build times are properly recorded and
                // certificates loaded during commissioning are in fact
                // valid at the time of commissioning, observing a NotAfter
                // that falls before Last Known Good Time is a reliable
                // indicator that the certificate in question is expired.
                if cert.m_not_after_time != K_NULL_CERT_TIME && time > cert.m_not_after_time {
                    CertificateValidityResult::KexpiredAtLastKnownGoodTime
                } else {
                    CertificateValidityResult::KnotExpiredAtLastKnownGoodTime
                }
            }
            EffectiveTime::NotSpecified => CertificateValidityResult::KtimeUnknown,
        };

        match context.m_validity_policy {
            Some(policy) => policy.apply_certificate_validity_policy(cert, depth, validity_result)?,
            None => apply_default_policy(cert, depth, validity_result)?,
        }

        // If the certificate itself is trusted, or it is the anchor the
        // caller designated, it is implicitly valid. Record it and stop.
        let is_designated_anchor = context
            .m_trust_anchor
            .is_some_and(|anchor| core::ptr::eq(anchor, cert));
        if cert.m_cert_flags.contains(CertFlags::KisTrustAnchor) || is_designated_anchor {
            context.m_trust_anchor = Some(cert);
            return chip_ok!();
        }

        // A self-signed certificate terminates the chain: there is no path
        // to follow past it. It is accepted as an anchor only if its
        // signature verifies against its own public key.
        if cert.is_self_signed() {
            verify_cert_signature(cert, cert)?;
            context.m_trust_anchor = Some(cert);
            return chip_ok!();
        }

        // The certificate depth can never legitimately reach the total
        // number of certificates; a circular chain of certificates would
        // otherwise recurse forever.
        verify_or_return_error!(
            depth < self.m_cert_count,
            Err(chip_error_cert_path_too_long!())
        );

        // Search for a valid CA certificate that matches the Issuer DN and
        // Authority Key Id of the current certificate.
        let ca_cert = self
            .find_valid_cert_depth(&cert.m_issuer_dn, &cert.m_auth_key_id, context, depth + 1)
            .inspect_err(|e| {
                chip_log_error!(
                    SecureChannel,
                    "failed to find valid cert during chain traversal: {}",
                    e
                );
            })?;

        // Verify the signature of the current certificate against the
        // public key of the CA certificate.
        verify_cert_signature(cert, ca_cert)
    }

    pub fn find_valid_cert<'s, Policy: CertificateValidityPolicy>(
        &'s self,
        subject_dn: &ChipDN<'a>,
        subject_key_id: &CertificateKeyId,
        context: &mut ValidationContext<'s, 'a, Policy>,
    ) -> Result<&'s ChipCertificateData<'a>, ChipError> {
        self.find_valid_cert_depth(subject_dn, subject_key_id, context, 0)
    }

    pub fn find_valid_cert_depth<'s, Policy: CertificateValidityPolicy>(
        &'s self,
        subject_dn: &ChipDN<'a>,
        subject_key_id: &CertificateKeyId,
        context: &mut ValidationContext<'s, 'a, Policy>,
        depth: u8,
    ) -> Result<&'s ChipCertificateData<'a>, ChipError> {
        let mut err = if depth > 0 {
            chip_error_ca_cert_not_found!()
        } else {
            chip_error_cert_not_found!()
        };

        for candidate in self.m_certs[..self.m_cert_count as usize].iter().flatten() {
            // Both the subject DN and the subject key id have to match.
            if !candidate.m_subject_dn.is_equal(subject_dn) {
                continue;
            }
            if candidate.m_subject_key_id != *subject_key_id {
                continue;
            }

            // Attempt to validate the cert. If the cert is valid, return it
            // to the caller. Otherwise save the returned error and continue
            // searching; first success wins. Usages recorded by a rejected
            // candidate are rolled back, only the validated path counts.
            let saved_usages = context.m_found_key_usages;
            let saved_purposes = context.m_found_key_purposes;
            match self.validate_cert_depth(candidate, context, depth) {
                Ok(()) => return Ok(candidate),
                Err(e) => {
                    context.m_found_key_usages = saved_usages;
                    context.m_found_key_purposes = saved_purposes;
                    err = e;
                }
            }
        }

        Err(err)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::chip::crypto::crypto_pal::ECPKey;
    use crate::chip::credentials::{
        certificate_validity_policy::{
            DefaultCertificateValidityPolicy, IgnoreCertificateValidityPeriodPolicy,
        },
        chip_cert::tests::{
            icac_dn, make_signed_cert, make_subject_key_id, node_dn, rcac_dn, TestCertParams,
        },
        chip_cert::K_MAX_CHIP_CERT_LENGTH,
    };
    use crate::chip::crypto::{P256Keypair, K_P256_ECDSA_SIGNATURE_LENGTH_RAW};

    use crate::chip_error_cert_expired;
    use crate::chip_error_cert_not_valid_yet;
    use crate::chip_error_invalid_signature;

    type DefaultContext<'s, 'a> = ValidationContext<'s, 'a, DefaultCertificateValidityPolicy>;
    type IgnorePolicyContext<'s, 'a> =
        ValidationContext<'s, 'a, IgnoreCertificateValidityPeriodPolicy>;

    type CertBlob = ([u8; K_MAX_CHIP_CERT_LENGTH], usize);

    const NOT_BEFORE: u32 = 100;
    const NOT_AFTER: u32 = 10_000;
    const IN_WINDOW: u32 = 5_000;

    fn make_root(keypair: &P256Keypair, rcac_id: u64, key_id: CertificateKeyId) -> CertBlob {
        make_signed_cert(
            &TestCertParams {
                serial: 1,
                issuer: rcac_dn(rcac_id),
                subject: rcac_dn(rcac_id),
                not_before: NOT_BEFORE,
                not_after: NOT_AFTER,
                is_ca: true,
                path_len_constraint: None,
                key_usage: KeyUsageFlags::KkeyCertSign,
                subject_key_id: key_id,
                auth_key_id: key_id,
                public_key: keypair.public_key().const_bytes(),
            },
            keypair,
        )
    }

    fn make_ica(
        keypair: &P256Keypair,
        icac_id: u64,
        key_id: CertificateKeyId,
        issuer: crate::chip::credentials::chip_cert::ChipDN<'static>,
        issuer_key_id: CertificateKeyId,
        issuer_keypair: &P256Keypair,
    ) -> CertBlob {
        make_signed_cert(
            &TestCertParams {
                serial: 2,
                issuer,
                subject: icac_dn(icac_id),
                not_before: NOT_BEFORE,
                not_after: NOT_AFTER,
                is_ca: true,
                path_len_constraint: None,
                key_usage: KeyUsageFlags::KkeyCertSign,
                subject_key_id: key_id,
                auth_key_id: issuer_key_id,
                public_key: keypair.public_key().const_bytes(),
            },
            issuer_keypair,
        )
    }

    fn make_noc(
        keypair: &P256Keypair,
        node_id: u64,
        fabric_id: u64,
        key_id: CertificateKeyId,
        issuer: crate::chip::credentials::chip_cert::ChipDN<'static>,
        issuer_key_id: CertificateKeyId,
        issuer_keypair: &P256Keypair,
    ) -> CertBlob {
        make_signed_cert(
            &TestCertParams {
                serial: 3,
                issuer,
                subject: node_dn(node_id, fabric_id),
                not_before: NOT_BEFORE,
                not_after: NOT_AFTER,
                is_ca: false,
                path_len_constraint: None,
                key_usage: KeyUsageFlags::KdigitalSignature,
                subject_key_id: key_id,
                auth_key_id: issuer_key_id,
                public_key: keypair.public_key().const_bytes(),
            },
            issuer_keypair,
        )
    }

    fn current_time_context<'s, 'a>(time: u32) -> DefaultContext<'s, 'a> {
        let mut context = DefaultContext::default();
        context.set_effective_time(EffectiveTime::CurrentChipEpochTime(time));
        context
    }

    #[test]
    fn new_set_is_empty() {
        let set: ChipCertificateSet = ChipCertificateSet::new();
        assert_eq!(0, set.get_cert_count());
        assert!(set.get_last_cert().is_none());
    }

    #[test]
    fn load_find_and_release() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let root_key_id = make_subject_key_id(1, 2);
        let (root, root_len) = make_root(&keypair, 1, root_key_id);

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(&root[..root_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();
        assert_eq!(1, set.get_cert_count());

        // duplicate load is a no-op
        set.load_cert(&root[..root_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();
        assert_eq!(1, set.get_cert_count());

        let found = set.find_cert(&root_key_id);
        assert!(found.is_some());
        assert!(set.is_cert_in_the_set(found.unwrap()));
        assert!(set.find_cert(&make_subject_key_id(9, 9)).is_none());

        set.release_last_cert().unwrap();
        assert_eq!(0, set.get_cert_count());
        assert!(set.release_last_cert().is_err());
    }

    #[test]
    fn capacity_exhaustion_leaves_count_unchanged() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let (root_a, len_a) = make_root(&keypair, 1, make_subject_key_id(1, 2));
        let (root_b, len_b) = make_root(&keypair, 2, make_subject_key_id(3, 4));

        let mut set: ChipCertificateSet<1> = ChipCertificateSet::new();
        set.load_cert(&root_a[..len_a], CertDecodeFlags::empty()).unwrap();
        assert_eq!(
            Err(chip_error_no_memory!()),
            set.load_cert(&root_b[..len_b], CertDecodeFlags::empty())
        );
        assert_eq!(1, set.get_cert_count());
    }

    #[test]
    fn self_signed_root_accepted_as_anchor() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let root_key_id = make_subject_key_id(1, 2);
        let (root, root_len) = make_root(&keypair, 1, root_key_id);

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        // No trust-anchor flag: acceptance depends on the self-signature.
        set.load_cert(&root[..root_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();

        let root_ref = set.find_cert(&root_key_id).unwrap();
        let mut context = current_time_context(IN_WINDOW);
        set.validate_cert(root_ref, &mut context).unwrap();
        assert!(context
            .m_trust_anchor
            .is_some_and(|anchor| core::ptr::eq(anchor, root_ref)));
    }

    #[test]
    fn self_signed_root_with_bad_signature_is_rejected() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let root_key_id = make_subject_key_id(1, 2);
        let (mut root, root_len) = make_root(&keypair, 1, root_key_id);
        // Corrupt one signature byte.
        root[root_len - 2] ^= 0x01;

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(&root[..root_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();

        let root_ref = set.find_cert(&root_key_id).unwrap();
        let mut context = current_time_context(IN_WINDOW);
        assert_eq!(
            Err(chip_error_invalid_signature!()),
            set.validate_cert(root_ref, &mut context)
        );
    }

    #[test]
    fn trust_anchor_flag_skips_self_verification() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let root_key_id = make_subject_key_id(1, 2);
        let (mut root, root_len) = make_root(&keypair, 1, root_key_id);
        root[root_len - 2] ^= 0x01;

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        // Anchors provisioned out-of-band skip the self-signature check.
        set.load_cert(&root[..root_len], CertDecodeFlags::KisTrustAnchor)
            .unwrap();

        let root_ref = set.find_cert(&root_key_id).unwrap();
        let mut context = current_time_context(IN_WINDOW);
        set.validate_cert(root_ref, &mut context).unwrap();
        assert!(context
            .m_trust_anchor
            .is_some_and(|anchor| core::ptr::eq(anchor, root_ref)));
    }

    #[test]
    fn three_cert_chain_validates_to_root() {
        let mut root_keypair = P256Keypair::default();
        root_keypair.initialize().unwrap();
        let mut ica_keypair = P256Keypair::default();
        ica_keypair.initialize().unwrap();
        let mut node_keypair = P256Keypair::default();
        node_keypair.initialize().unwrap();

        let root_key_id = make_subject_key_id(1, 2);
        let ica_key_id = make_subject_key_id(3, 4);
        let node_key_id = make_subject_key_id(5, 6);

        let (root, root_len) = make_root(&root_keypair, 1, root_key_id);
        let (ica, ica_len) = make_ica(
            &ica_keypair,
            2,
            ica_key_id,
            rcac_dn(1),
            root_key_id,
            &root_keypair,
        );
        let (noc, noc_len) = make_noc(
            &node_keypair,
            0x1234,
            0xFAB1,
            node_key_id,
            icac_dn(2),
            ica_key_id,
            &ica_keypair,
        );

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(
            &root[..root_len],
            CertDecodeFlags::KisTrustAnchor | CertDecodeFlags::KgenerateTbsHash,
        )
        .unwrap();
        set.load_cert(&ica[..ica_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();
        set.load_cert(&noc[..noc_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();

        let root_ref = set.find_cert(&root_key_id).unwrap();
        let noc_ref = set.find_cert(&node_key_id).unwrap();

        let mut context = current_time_context(IN_WINDOW);
        context.m_required_cert_type = CertType::Knode;
        context.m_required_key_usages = KeyUsageFlags::KdigitalSignature;

        set.validate_cert(noc_ref, &mut context).unwrap();
        assert!(context
            .m_trust_anchor
            .is_some_and(|anchor| core::ptr::eq(anchor, root_ref)));
    }

    #[test]
    fn designated_anchor_terminates_chain_early() {
        let mut root_keypair = P256Keypair::default();
        root_keypair.initialize().unwrap();
        let mut ica_keypair = P256Keypair::default();
        ica_keypair.initialize().unwrap();
        let mut node_keypair = P256Keypair::default();
        node_keypair.initialize().unwrap();

        let root_key_id = make_subject_key_id(1, 2);
        let ica_key_id = make_subject_key_id(3, 4);
        let node_key_id = make_subject_key_id(5, 6);

        let (ica, ica_len) = make_ica(
            &ica_keypair,
            2,
            ica_key_id,
            rcac_dn(1),
            root_key_id,
            &root_keypair,
        );
        let (noc, noc_len) = make_noc(
            &node_keypair,
            0x1234,
            0xFAB1,
            node_key_id,
            icac_dn(2),
            ica_key_id,
            &ica_keypair,
        );

        // The root is not in the set at all; the caller vouches for the
        // intermediate directly.
        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(&ica[..ica_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();
        set.load_cert(&noc[..noc_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();

        let ica_ref = set.find_cert(&ica_key_id).unwrap();
        let noc_ref = set.find_cert(&node_key_id).unwrap();

        // Without a designated anchor the chain dead-ends above the ICA.
        let mut context = current_time_context(IN_WINDOW);
        assert!(set.validate_cert(noc_ref, &mut context).is_err());

        let mut context = current_time_context(IN_WINDOW);
        context.m_trust_anchor = Some(ica_ref);
        set.validate_cert(noc_ref, &mut context).unwrap();
        assert!(context
            .m_trust_anchor
            .is_some_and(|anchor| core::ptr::eq(anchor, ica_ref)));
    }

    #[test]
    fn tampered_intermediate_signature_fails_chain() {
        let mut root_keypair = P256Keypair::default();
        root_keypair.initialize().unwrap();
        let mut ica_keypair = P256Keypair::default();
        ica_keypair.initialize().unwrap();
        let mut node_keypair = P256Keypair::default();
        node_keypair.initialize().unwrap();

        let root_key_id = make_subject_key_id(1, 2);
        let ica_key_id = make_subject_key_id(3, 4);
        let node_key_id = make_subject_key_id(5, 6);

        let (root, root_len) = make_root(&root_keypair, 1, root_key_id);
        let (mut ica, ica_len) = make_ica(
            &ica_keypair,
            2,
            ica_key_id,
            rcac_dn(1),
            root_key_id,
            &root_keypair,
        );
        // One byte of the ICA signature flips.
        ica[ica_len - 2] ^= 0x01;
        let (noc, noc_len) = make_noc(
            &node_keypair,
            0x1234,
            0xFAB1,
            node_key_id,
            icac_dn(2),
            ica_key_id,
            &ica_keypair,
        );

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(
            &root[..root_len],
            CertDecodeFlags::KisTrustAnchor | CertDecodeFlags::KgenerateTbsHash,
        )
        .unwrap();
        set.load_cert(&ica[..ica_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();
        set.load_cert(&noc[..noc_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();

        let noc_ref = set.find_cert(&node_key_id).unwrap();
        let mut context = current_time_context(IN_WINDOW);
        assert_eq!(
            Err(chip_error_invalid_signature!()),
            set.validate_cert(noc_ref, &mut context)
        );
    }

    #[test]
    fn backtracking_skips_invalid_candidate() {
        // Two self-signed roots share the same subject DN and key id; one
        // carries a corrupted signature. Validation of a leaf issued by the
        // good root must succeed in either load order.
        for bad_first in [true, false] {
            let mut good_keypair = P256Keypair::default();
            good_keypair.initialize().unwrap();
            let mut node_keypair = P256Keypair::default();
            node_keypair.initialize().unwrap();

            let root_key_id = make_subject_key_id(1, 2);
            let node_key_id = make_subject_key_id(5, 6);

            let (good_root, good_len) = make_root(&good_keypair, 1, root_key_id);
            let (mut bad_root, bad_len) = {
                let mut other_keypair = P256Keypair::default();
                other_keypair.initialize().unwrap();
                make_root(&other_keypair, 1, root_key_id)
            };
            bad_root[bad_len - 2] ^= 0x01;

            let (noc, noc_len) = make_noc(
                &node_keypair,
                0x1234,
                0xFAB1,
                node_key_id,
                rcac_dn(1),
                root_key_id,
                &good_keypair,
            );

            let mut set: ChipCertificateSet<4> = ChipCertificateSet::new();
            if bad_first {
                set.load_cert(&bad_root[..bad_len], CertDecodeFlags::KgenerateTbsHash)
                    .unwrap();
                set.load_cert(&good_root[..good_len], CertDecodeFlags::KgenerateTbsHash)
                    .unwrap();
            } else {
                set.load_cert(&good_root[..good_len], CertDecodeFlags::KgenerateTbsHash)
                    .unwrap();
                set.load_cert(&bad_root[..bad_len], CertDecodeFlags::KgenerateTbsHash)
                    .unwrap();
            }
            set.load_cert(&noc[..noc_len], CertDecodeFlags::KgenerateTbsHash)
                .unwrap();

            let noc_ref = set.find_cert(&node_key_id).unwrap();
            let mut context = current_time_context(IN_WINDOW);
            assert!(
                set.validate_cert(noc_ref, &mut context).is_ok(),
                "bad_first = {}",
                bad_first
            );
        }
    }

    #[test]
    fn validity_window_verdicts() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let root_key_id = make_subject_key_id(1, 2);
        let (root, root_len) = make_root(&keypair, 1, root_key_id);

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(&root[..root_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();
        let root_ref = set.find_cert(&root_key_id).unwrap();

        // (a) not yet valid
        let mut context = current_time_context(NOT_BEFORE - 1);
        assert_eq!(
            Err(chip_error_cert_not_valid_yet!()),
            set.validate_cert(root_ref, &mut context)
        );

        // (b) expired
        let mut context = current_time_context(NOT_AFTER + 1);
        assert_eq!(
            Err(chip_error_cert_expired!()),
            set.validate_cert(root_ref, &mut context)
        );

        // (c) inside the window
        let mut context = current_time_context(IN_WINDOW);
        assert!(set.validate_cert(root_ref, &mut context).is_ok());

        // (d) expired relative to last known good time: the default policy
        // accepts the softer verdict.
        let mut context = DefaultContext::default();
        context.set_effective_time(EffectiveTime::LastKnownGoodChipEpochTime(NOT_AFTER + 1));
        assert!(set.validate_cert(root_ref, &mut context).is_ok());

        // (e) no effective time at all
        let mut context = DefaultContext::default();
        assert!(set.validate_cert(root_ref, &mut context).is_ok());
    }

    #[test]
    fn custom_policy_overrides_default() {
        struct RejectSoftVerdicts;
        impl CertificateValidityPolicy for RejectSoftVerdicts {
            fn apply_certificate_validity_policy(
                &self,
                _cert: &ChipCertificateData,
                _depth: u8,
                result: CertificateValidityResult,
            ) -> ChipErrorResult {
                match result {
                    CertificateValidityResult::Kvalid => Ok(()),
                    _ => Err(crate::chip_error_cert_expired!()),
                }
            }
        }

        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let root_key_id = make_subject_key_id(1, 2);
        let (root, root_len) = make_root(&keypair, 1, root_key_id);

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(&root[..root_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();
        let root_ref = set.find_cert(&root_key_id).unwrap();

        let policy = RejectSoftVerdicts;
        let mut context: ValidationContext<'_, '_, RejectSoftVerdicts> = ValidationContext::new();
        context.m_validity_policy = Some(&policy);
        context.set_effective_time(EffectiveTime::LastKnownGoodChipEpochTime(IN_WINDOW));
        assert_eq!(
            Err(chip_error_cert_expired!()),
            set.validate_cert(root_ref, &mut context)
        );

        // The ignore-validity policy lets even an expired window pass.
        let policy = IgnoreCertificateValidityPeriodPolicy;
        let mut context = IgnorePolicyContext::default();
        context.m_validity_policy = Some(&policy);
        context.set_effective_time(EffectiveTime::CurrentChipEpochTime(NOT_AFTER + 1));
        assert!(set.validate_cert(root_ref, &mut context).is_ok());
    }

    #[test]
    fn chain_exceeding_max_depth_is_rejected() {
        let mut keypairs: Vec<P256Keypair> = Vec::new();
        for _ in 0..7 {
            let mut kp = P256Keypair::default();
            kp.initialize().unwrap();
            keypairs.push(kp);
        }

        let mut certs: Vec<CertBlob> = Vec::new();
        let root_key_id = make_subject_key_id(0, 1);
        certs.push(make_root(&keypairs[0], 100, root_key_id));

        // Five intermediates, each signed by its predecessor.
        for i in 1..=5u8 {
            let issuer = if i == 1 {
                rcac_dn(100)
            } else {
                icac_dn(100 + i as u64 - 1)
            };
            certs.push(make_ica(
                &keypairs[i as usize],
                100 + i as u64,
                make_subject_key_id(i, i + 1),
                issuer,
                make_subject_key_id(i - 1, i),
                &keypairs[(i - 1) as usize],
            ));
        }

        let node_key_id = make_subject_key_id(7, 8);
        certs.push(make_noc(
            &keypairs[6],
            0x1234,
            0xFAB1,
            node_key_id,
            icac_dn(105),
            make_subject_key_id(5, 6),
            &keypairs[5],
        ));

        let mut set: ChipCertificateSet<8> = ChipCertificateSet::new();
        for (buf, len) in certs.iter() {
            set.load_cert(&buf[..*len], CertDecodeFlags::KgenerateTbsHash)
                .unwrap();
        }

        let noc_ref = set.find_cert(&node_key_id).unwrap();
        let mut context = current_time_context(IN_WINDOW);
        assert_eq!(
            Err(chip_error_cert_path_too_long!()),
            set.validate_cert(noc_ref, &mut context)
        );
    }

    #[test]
    fn path_len_constraint_is_enforced() {
        let mut root_keypair = P256Keypair::default();
        root_keypair.initialize().unwrap();
        let mut ica_keypair = P256Keypair::default();
        ica_keypair.initialize().unwrap();
        let mut node_keypair = P256Keypair::default();
        node_keypair.initialize().unwrap();

        let root_key_id = make_subject_key_id(1, 2);
        let ica_key_id = make_subject_key_id(3, 4);
        let node_key_id = make_subject_key_id(5, 6);

        // Root allows no intermediates below it.
        let (root, root_len) = make_signed_cert(
            &TestCertParams {
                serial: 1,
                issuer: rcac_dn(1),
                subject: rcac_dn(1),
                not_before: NOT_BEFORE,
                not_after: NOT_AFTER,
                is_ca: true,
                path_len_constraint: Some(0),
                key_usage: KeyUsageFlags::KkeyCertSign,
                subject_key_id: root_key_id,
                auth_key_id: root_key_id,
                public_key: root_keypair.public_key().const_bytes(),
            },
            &root_keypair,
        );
        let (ica, ica_len) = make_ica(
            &ica_keypair,
            2,
            ica_key_id,
            rcac_dn(1),
            root_key_id,
            &root_keypair,
        );
        let (noc, noc_len) = make_noc(
            &node_keypair,
            0x1234,
            0xFAB1,
            node_key_id,
            icac_dn(2),
            ica_key_id,
            &ica_keypair,
        );

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(
            &root[..root_len],
            CertDecodeFlags::KisTrustAnchor | CertDecodeFlags::KgenerateTbsHash,
        )
        .unwrap();
        set.load_cert(&ica[..ica_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();
        set.load_cert(&noc[..noc_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();

        let noc_ref = set.find_cert(&node_key_id).unwrap();
        let mut context = current_time_context(IN_WINDOW);
        assert_eq!(
            Err(chip_error_cert_path_len_constraint_exceeded!()),
            set.validate_cert(noc_ref, &mut context)
        );
    }

    #[test]
    fn required_usage_satisfied_by_ancestor() {
        let mut root_keypair = P256Keypair::default();
        root_keypair.initialize().unwrap();
        let mut node_keypair = P256Keypair::default();
        node_keypair.initialize().unwrap();

        let root_key_id = make_subject_key_id(1, 2);
        let node_key_id = make_subject_key_id(5, 6);

        let (root, root_len) = make_root(&root_keypair, 1, root_key_id);
        let (noc, noc_len) = make_noc(
            &node_keypair,
            0x1234,
            0xFAB1,
            node_key_id,
            rcac_dn(1),
            root_key_id,
            &root_keypair,
        );

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(
            &root[..root_len],
            CertDecodeFlags::KisTrustAnchor | CertDecodeFlags::KgenerateTbsHash,
        )
        .unwrap();
        set.load_cert(&noc[..noc_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();
        let noc_ref = set.find_cert(&node_key_id).unwrap();

        // keyCertSign is carried by the root, not the leaf; the path-wide
        // check accepts it.
        let mut context = current_time_context(IN_WINDOW);
        context.m_required_key_usages = KeyUsageFlags::KkeyCertSign;
        assert!(set.validate_cert(noc_ref, &mut context).is_ok());

        // No certificate on the path carries a key purpose.
        let mut context = current_time_context(IN_WINDOW);
        context.m_required_key_purpose = KeyPurposeFlags::KclientAuth;
        assert_eq!(
            Err(chip_error_cert_usage_not_allowed!()),
            set.validate_cert(noc_ref, &mut context)
        );
    }

    #[test]
    fn required_cert_type_mismatch() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let root_key_id = make_subject_key_id(1, 2);
        let (root, root_len) = make_root(&keypair, 1, root_key_id);

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(&root[..root_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();
        let root_ref = set.find_cert(&root_key_id).unwrap();

        let mut context = current_time_context(IN_WINDOW);
        context.m_required_cert_type = CertType::Knode;
        assert_eq!(
            Err(chip_error_wrong_cert_type!()),
            set.validate_cert(root_ref, &mut context)
        );
    }

    #[test]
    fn missing_issuer_reports_ca_not_found() {
        let mut node_keypair = P256Keypair::default();
        node_keypair.initialize().unwrap();
        let mut orphan_signer = P256Keypair::default();
        orphan_signer.initialize().unwrap();

        let node_key_id = make_subject_key_id(5, 6);
        let (noc, noc_len) = make_noc(
            &node_keypair,
            0x1234,
            0xFAB1,
            node_key_id,
            rcac_dn(1),
            make_subject_key_id(1, 2),
            &orphan_signer,
        );

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(&noc[..noc_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();
        let noc_ref = set.find_cert(&node_key_id).unwrap();

        let mut context = current_time_context(IN_WINDOW);
        assert_eq!(
            Err(chip_error_ca_cert_not_found!()),
            set.validate_cert(noc_ref, &mut context)
        );
    }

    #[test]
    fn find_valid_cert_returns_anchor() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let root_key_id = make_subject_key_id(1, 2);
        let (root, root_len) = make_root(&keypair, 1, root_key_id);

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(&root[..root_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();

        let mut context = current_time_context(IN_WINDOW);
        let dn = rcac_dn(1);
        let found = set.find_valid_cert(&dn, &root_key_id, &mut context).unwrap();
        assert_eq!(root_key_id, found.m_subject_key_id);
        assert!(context.m_trust_anchor.is_some());

        // An unknown identity misses.
        let mut context = current_time_context(IN_WINDOW);
        let other_dn = rcac_dn(2);
        assert!(set
            .find_valid_cert(&other_dn, &make_subject_key_id(9, 9), &mut context)
            .is_err());
    }

    #[test]
    fn validate_rejects_foreign_cert() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let root_key_id = make_subject_key_id(1, 2);
        let (root, root_len) = make_root(&keypair, 1, root_key_id);

        let mut set: ChipCertificateSet = ChipCertificateSet::new();
        set.load_cert(&root[..root_len], CertDecodeFlags::KgenerateTbsHash)
            .unwrap();

        // A decoded certificate that was never loaded into the set.
        let mut foreign = ChipCertificateData::default();
        crate::chip::credentials::chip_cert::decode_chip_cert(
            &root[..root_len],
            &mut foreign,
            CertDecodeFlags::KgenerateTbsHash,
        )
        .unwrap();

        let mut context = current_time_context(IN_WINDOW);
        assert_eq!(
            Err(chip_error_invalid_argument!()),
            set.validate_cert(&foreign, &mut context)
        );
    }

    // The signature splice offset used by the fixtures is part of this
    // module's contract with them; pin it down.
    #[test]
    fn signature_occupies_buffer_tail() {
        let mut keypair = P256Keypair::default();
        keypair.initialize().unwrap();
        let (root, root_len) = make_root(&keypair, 1, make_subject_key_id(1, 2));

        let mut cert_data = ChipCertificateData::default();
        decode_chip_cert(&root[..root_len], &mut cert_data, CertDecodeFlags::empty()).unwrap();
        let expected = &root[root_len - 1 - K_P256_ECDSA_SIGNATURE_LENGTH_RAW..root_len - 1];
        assert_eq!(expected, cert_data.m_signature);
    }
}
