use crate::chip::credentials::chip_cert::ChipCertificateData;
use crate::ChipErrorResult;

use crate::chip_error_cert_expired;
use crate::chip_error_cert_not_valid_yet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateValidityResult {
    // Current time is known and is within the validity period bounded by
    // [notBefore, notAfter].
    Kvalid = 0,
    // Current time is known and falls before notBefore.
    KnotYetValid = 1,
    // Current time is known and falls after notAfter.
    Kexpired = 2,
    // Last Known Good Time is known and notAfter occurs at or after it.
    KnotExpiredAtLastKnownGoodTime = 3,
    // Last Known Good Time is known and notAfter occurs before it.
    KexpiredAtLastKnownGoodTime = 4,
    // No time source is available.
    KtimeUnknown = 5,
}

pub trait CertificateValidityPolicy {
    fn apply_certificate_validity_policy(
        &self,
        cert: &ChipCertificateData,
        depth: u8,
        result: CertificateValidityResult,
    ) -> ChipErrorResult;
}

// Policy applied when the validation context carries none. Devices without
// a reliable clock must keep interoperating, so only a hard verdict from a
// live clock rejects; last-known-good and unknown-time verdicts pass.
pub fn apply_default_policy(
    _cert: &ChipCertificateData,
    _depth: u8,
    result: CertificateValidityResult,
) -> ChipErrorResult {
    match result {
        CertificateValidityResult::Kvalid
        | CertificateValidityResult::KnotExpiredAtLastKnownGoodTime
        | CertificateValidityResult::KexpiredAtLastKnownGoodTime
        | CertificateValidityResult::KtimeUnknown => Ok(()),
        CertificateValidityResult::KnotYetValid => Err(chip_error_cert_not_valid_yet!()),
        CertificateValidityResult::Kexpired => Err(chip_error_cert_expired!()),
    }
}

#[derive(Default)]
pub struct DefaultCertificateValidityPolicy;

impl CertificateValidityPolicy for DefaultCertificateValidityPolicy {
    fn apply_certificate_validity_policy(
        &self,
        cert: &ChipCertificateData,
        depth: u8,
        result: CertificateValidityResult,
    ) -> ChipErrorResult {
        apply_default_policy(cert, depth, result)
    }
}

#[derive(Default)]
pub struct IgnoreCertificateValidityPeriodPolicy;

impl CertificateValidityPolicy for IgnoreCertificateValidityPeriodPolicy {
    fn apply_certificate_validity_policy(
        &self,
        _cert: &ChipCertificateData,
        _depth: u8,
        _result: CertificateValidityResult,
    ) -> ChipErrorResult {
        Ok(())
    }
}
