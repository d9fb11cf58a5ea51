pub mod certificate_validity_policy;
pub mod chip_cert;
pub mod chip_cert_to_x509;
pub mod chip_certificate_set;
pub mod x509_to_chip_cert;
