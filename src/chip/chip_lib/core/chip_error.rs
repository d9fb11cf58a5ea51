use core::fmt;

pub type StorageType = u32;
pub type ValueType = StorageType;

#[repr(u8)]
pub enum Range {
    KSdk = 0x0,        //< CHIP SDK errors.
    KOs = 0x1,         //< Encapsulated OS errors, other than POSIX errno.
    KPosix = 0x2,      //< Encapsulated POSIX errno values.
    KPlatform = 0x5,   //< Platform-defined encapsulation.
    KLastRange = 0x6,
}

#[repr(u8)]
pub enum SdkPart {
    KCore = 0,        //< SDK core errors.
    KInet = 1,        //< Inet layer errors.
    KDevice = 2,      //< Device layer errors.
    KASN1 = 3,        //< ASN1 errors; see asn1/asn1_error.rs.
    KApplication = 7, //< Application-defined errors.
}

#[cfg(feature = "chip_config_error_source")]
macro_rules! chip_initialize_error_source {
    ($e:expr, $f:expr, $l:expr) => {
        Self {
            m_error: $e,
            m_file: $f,
            m_line: $l,
        }
    };
}

#[cfg(not(feature = "chip_config_error_source"))]
macro_rules! chip_initialize_error_source {
    ($e:expr, $_f:expr, $_l:expr) => {
        Self { m_error: $e }
    };
}

#[derive(Debug, Copy, Clone)]
pub struct ChipError {
    m_error: StorageType,
    #[cfg(feature = "chip_config_error_source")]
    m_file: &'static str,
    #[cfg(feature = "chip_config_error_source")]
    m_line: u32,
}

impl PartialEq for ChipError {
    fn eq(&self, other: &Self) -> bool {
        self.m_error == other.m_error
    }
}

impl Eq for ChipError {}

impl fmt::Display for ChipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CHIP Error 0x{:08X}", self.m_error)
    }
}

impl ChipError {
    const K_RANGE_START: u32 = 24;
    const K_VALUE_START: u32 = 0;
    const K_VALUE_LENGTH: u32 = 24;

    const K_SDKPART_START: u32 = 8;
    pub const K_SDKPART_LENGTH: u32 = 3;
    const K_SDKCODE_START: u32 = 0;
    pub const K_SDKCODE_LENGTH: u32 = 8;

    pub const fn fits_in_field(length: u32, value: StorageType) -> bool {
        value < (1u32 << length)
    }

    const fn make_mask(start: u32, length: u32) -> StorageType {
        ((1u32 << length) - 1) << start
    }

    const fn make_field(start: u32, value: StorageType) -> StorageType {
        value << start
    }

    const fn make_integer_with_range_value(range: Range, value: StorageType) -> StorageType {
        Self::make_field(Self::K_RANGE_START, range as StorageType)
            | Self::make_field(Self::K_VALUE_START, value)
    }

    pub const fn make_integer_with_part_code(part: SdkPart, code: u8) -> StorageType {
        Self::make_integer_with_range_value(
            Range::KSdk,
            Self::make_field(Self::K_SDKPART_START, part as StorageType),
        ) | Self::make_field(Self::K_SDKCODE_START, code as StorageType)
    }

    pub const fn new_range_value(range: Range, value: ValueType) -> Self {
        Self::new_range_value_error_source(range, value, "", 0)
    }

    #[allow(unused_variables)]
    pub const fn new_range_value_error_source(
        range: Range,
        value: ValueType,
        file: &'static str,
        line: u32,
    ) -> Self {
        chip_initialize_error_source!(
            Self::make_integer_with_range_value(
                range,
                value & Self::make_mask(0, Self::K_VALUE_LENGTH)
            ),
            file,
            line
        )
    }

    pub const fn new_part_code(part: SdkPart, code: u8) -> Self {
        Self::new_part_code_error_source(part, code, "", 0)
    }

    #[allow(unused_variables)]
    pub const fn new_part_code_error_source(
        part: SdkPart,
        code: u8,
        file: &'static str,
        line: u32,
    ) -> Self {
        chip_initialize_error_source!(Self::make_integer_with_part_code(part, code), file, line)
    }

    pub const fn new_error(error: StorageType) -> Self {
        Self::new_error_error_source(error, "", 0)
    }

    #[allow(unused_variables)]
    pub const fn new_error_error_source(error: StorageType, file: &'static str, line: u32) -> Self {
        chip_initialize_error_source!(error, file, line)
    }

    pub const fn as_integer(&self) -> StorageType {
        self.m_error
    }

    pub const fn is_success(&self) -> bool {
        self.m_error == 0
    }
}

#[macro_export]
macro_rules! chip_sdk_error {
    ($part:expr, $code:expr) => {
        $crate::chip::chip_lib::core::chip_error::ChipError::new_part_code_error_source(
            $part,
            $code,
            file!(),
            line!(),
        )
    };
}

#[macro_export]
macro_rules! chip_core_error {
    ($e:expr) => {
        $crate::chip_sdk_error!($crate::chip::chip_lib::core::chip_error::SdkPart::KCore, $e)
    };
}

#[macro_export]
macro_rules! chip_no_error {
    () => {
        $crate::chip::chip_lib::core::chip_error::ChipError::new_error(0)
    };
}

#[macro_export]
macro_rules! chip_ok {
    () => {
        Ok(())
    };
}

// start to create all the error code

#[macro_export]
macro_rules! chip_error_incorrect_state {
    () => {
        $crate::chip_core_error!(0x03)
    };
}

#[macro_export]
macro_rules! chip_error_no_memory {
    () => {
        $crate::chip_core_error!(0x0b)
    };
}

#[macro_export]
macro_rules! chip_error_buffer_too_small {
    () => {
        $crate::chip_core_error!(0x19)
    };
}

#[macro_export]
macro_rules! chip_error_tlv_underrun {
    () => {
        $crate::chip_core_error!(0x22)
    };
}

#[macro_export]
macro_rules! chip_error_end_of_tlv {
    () => {
        $crate::chip_core_error!(0x25)
    };
}

#[macro_export]
macro_rules! chip_error_invalid_tlv_tag {
    () => {
        $crate::chip_core_error!(0x26)
    };
}

#[macro_export]
macro_rules! chip_error_invalid_tlv_element {
    () => {
        $crate::chip_core_error!(0x27)
    };
}

#[macro_export]
macro_rules! chip_error_wrong_tlv_type {
    () => {
        $crate::chip_core_error!(0x29)
    };
}

#[macro_export]
macro_rules! chip_error_unexpected_tlv_element {
    () => {
        $crate::chip_core_error!(0x2b)
    };
}

#[macro_export]
macro_rules! chip_error_tlv_container_open {
    () => {
        $crate::chip_core_error!(0x2c)
    };
}

#[macro_export]
macro_rules! chip_error_invalid_argument {
    () => {
        $crate::chip_core_error!(0x2f)
    };
}

#[macro_export]
macro_rules! chip_error_invalid_integer_value {
    () => {
        $crate::chip_core_error!(0x30)
    };
}

#[macro_export]
macro_rules! chip_error_not_found {
    () => {
        $crate::chip_core_error!(0x4a)
    };
}

#[macro_export]
macro_rules! chip_error_unsupported_signature_type {
    () => {
        $crate::chip_core_error!(0x4b)
    };
}

#[macro_export]
macro_rules! chip_error_unsupported_cert_format {
    () => {
        $crate::chip_core_error!(0x4e)
    };
}

#[macro_export]
macro_rules! chip_error_unsupported_elliptic_curve {
    () => {
        $crate::chip_core_error!(0x4f)
    };
}

#[macro_export]
macro_rules! chip_error_cert_not_found {
    () => {
        $crate::chip_core_error!(0x51)
    };
}

#[macro_export]
macro_rules! chip_error_invalid_signature {
    () => {
        $crate::chip_core_error!(0x54)
    };
}

#[macro_export]
macro_rules! chip_error_cert_not_trusted {
    () => {
        $crate::chip_core_error!(0x56)
    };
}

#[macro_export]
macro_rules! chip_error_wrong_cert_type {
    () => {
        $crate::chip_core_error!(0x58)
    };
}

#[macro_export]
macro_rules! chip_error_ca_cert_not_found {
    () => {
        $crate::chip_core_error!(0x68)
    };
}

#[macro_export]
macro_rules! chip_error_cert_path_len_constraint_exceeded {
    () => {
        $crate::chip_core_error!(0x69)
    };
}

#[macro_export]
macro_rules! chip_error_cert_path_too_long {
    () => {
        $crate::chip_core_error!(0x6a)
    };
}

#[macro_export]
macro_rules! chip_error_cert_usage_not_allowed {
    () => {
        $crate::chip_core_error!(0x6b)
    };
}

#[macro_export]
macro_rules! chip_error_cert_expired {
    () => {
        $crate::chip_core_error!(0x6c)
    };
}

#[macro_export]
macro_rules! chip_error_cert_not_valid_yet {
    () => {
        $crate::chip_core_error!(0x6d)
    };
}

#[macro_export]
macro_rules! chip_error_wrong_node_id {
    () => {
        $crate::chip_core_error!(0x72)
    };
}

#[macro_export]
macro_rules! chip_error_wrong_cert_dn {
    () => {
        $crate::chip_core_error!(0x74)
    };
}

#[macro_export]
macro_rules! chip_error_internal {
    () => {
        $crate::chip_core_error!(0xac)
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_error_is_success() {
        let e = chip_no_error!();
        assert!(e.is_success());
    }

    #[test]
    fn same_code_compares_equal() {
        let a = chip_error_invalid_argument!();
        let b = chip_error_invalid_argument!();
        assert_eq!(a, b);
    }

    #[test]
    fn different_codes_compare_unequal() {
        let a = chip_error_invalid_argument!();
        let b = chip_error_no_memory!();
        assert_ne!(a, b);
    }

    #[test]
    fn sdk_part_is_encoded() {
        let e = ChipError::new_part_code(SdkPart::KASN1, 0x07);
        assert_eq!(
            e.as_integer(),
            ChipError::make_integer_with_part_code(SdkPart::KASN1, 0x07)
        );
        assert_ne!(e, chip_core_error!(0x07));
    }
}
