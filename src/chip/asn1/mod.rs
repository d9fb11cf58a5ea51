pub mod asn1;
pub mod asn1_error;
pub mod asn1_reader;
pub mod asn1_time;
pub mod asn1_writer;

pub use asn1::{
    der, get_oid, oid_category, Asn1Oid, Oid, K_OID_CATEGORY_ATTRIBUTE_TYPE,
    K_OID_CATEGORY_ELLIPTIC_CURVE, K_OID_CATEGORY_EXTENSION, K_OID_CATEGORY_KEY_PURPOSE,
    K_OID_CATEGORY_MASK, K_OID_CATEGORY_PUBKEY_ALGO, K_OID_CATEGORY_SIG_ALGO,
};
pub use asn1_reader::Asn1Reader;
pub use asn1_time::Asn1UniversalTime;
pub use asn1_writer::{Asn1ContiguousBufferWriter, Asn1Writer, NullAsn1Writer};

// DER identifier class and low-tag-number types, as the writer interfaces
// take them.
pub type Class = u8;
pub type Tag = u8;
