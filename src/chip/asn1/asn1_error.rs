#[macro_export]
macro_rules! chip_asn1_error {
    ($e:expr) => {
        $crate::chip_sdk_error!($crate::chip::chip_lib::core::chip_error::SdkPart::KASN1, $e)
    };
}

// ASN1_END is not an error as such; it signals the end of the input or of
// the current constructed type.
#[macro_export]
macro_rules! asn1_end {
    () => {
        $crate::chip_asn1_error!(0x01)
    };
}

#[macro_export]
macro_rules! asn1_error_underrun {
    () => {
        $crate::chip_asn1_error!(0x02)
    };
}

#[macro_export]
macro_rules! asn1_error_overflow {
    () => {
        $crate::chip_asn1_error!(0x03)
    };
}

#[macro_export]
macro_rules! asn1_error_invalid_state {
    () => {
        $crate::chip_asn1_error!(0x04)
    };
}

#[macro_export]
macro_rules! asn1_error_max_depth_exceeded {
    () => {
        $crate::chip_asn1_error!(0x05)
    };
}

#[macro_export]
macro_rules! asn1_error_invalid_encoding {
    () => {
        $crate::chip_asn1_error!(0x06)
    };
}

#[macro_export]
macro_rules! asn1_error_unsupported_encoding {
    () => {
        $crate::chip_asn1_error!(0x07)
    };
}

#[macro_export]
macro_rules! asn1_error_tag_overflow {
    () => {
        $crate::chip_asn1_error!(0x08)
    };
}

#[macro_export]
macro_rules! asn1_error_length_overflow {
    () => {
        $crate::chip_asn1_error!(0x09)
    };
}

#[macro_export]
macro_rules! asn1_error_value_overflow {
    () => {
        $crate::chip_asn1_error!(0x0a)
    };
}

#[macro_export]
macro_rules! asn1_error_unknown_object_id {
    () => {
        $crate::chip_asn1_error!(0x0b)
    };
}
