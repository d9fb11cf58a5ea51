use crate::asn1_error_invalid_encoding;
use crate::chip::chip_lib::support::default_string::DefaultString;
use crate::verify_or_return_error;
use crate::ChipError;

use core::fmt::Write;

pub const K_ASN1_GENERALIZED_TIME_STRING_LENGTH: usize = 15;
pub const K_ASN1_UTC_TIME_STRING_LENGTH: usize = 13;

pub type Asn1UniversalTimeString = DefaultString<K_ASN1_GENERALIZED_TIME_STRING_LENGTH>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asn1UniversalTime {
    pub year: u16,  /*< Year component. Legal interval is 0..9999. */
    pub month: u8,  /*< Month component. Legal interval is 1..12. */
    pub day: u8,    /*< Day of month component. Legal interval is 1..31. */
    pub hour: u8,   /*< Hour component. Legal interval is 0..23. */
    pub minute: u8, /*< Minute component. Legal interval is 0..59. */
    pub second: u8, /*< Second component. Legal interval is 0..59. */
}

impl Default for Asn1UniversalTime {
    fn default() -> Self {
        Asn1UniversalTime::new()
    }
}

impl Asn1UniversalTime {
    pub const fn new() -> Self {
        Self {
            year: 0,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    pub fn export_to_asn1_time_string(&self) -> Result<Asn1UniversalTimeString, ChipError> {
        // X.509/RFC5280 mandates that times before 2050 UTC must be encoded as
        // ASN.1 UTCTime values, while times equal or greater than 2050 must be
        // encoded as GeneralizedTime values. The only difference (in the
        // context of X.509 DER) is that GeneralizedTimes are encoded with a 4
        // digit year, while UTCTimes are encoded with a two-digit year.
        let mut time_string = Asn1UniversalTimeString::default();
        let result = if self.uses_generalized_time() {
            write!(
                &mut time_string,
                "{:04}{:02}{:02}{:02}{:02}{:02}Z",
                self.year, self.month, self.day, self.hour, self.minute, self.second
            )
        } else {
            write!(
                &mut time_string,
                "{:02}{:02}{:02}{:02}{:02}{:02}Z",
                self.year % 100,
                self.month,
                self.day,
                self.hour,
                self.minute,
                self.second
            )
        };
        verify_or_return_error!(result.is_ok(), Err(asn1_error_invalid_encoding!()));

        Ok(time_string)
    }

    pub fn import_from_asn1_time_string(time_string: &str) -> Result<Self, ChipError> {
        let bytes = time_string.as_bytes();
        let generalized = match bytes.len() {
            K_ASN1_GENERALIZED_TIME_STRING_LENGTH => true,
            K_ASN1_UTC_TIME_STRING_LENGTH => false,
            _ => return Err(asn1_error_invalid_encoding!()),
        };
        verify_or_return_error!(
            bytes[bytes.len() - 1] == b'Z',
            Err(asn1_error_invalid_encoding!())
        );

        let mut fields = [0u16; 6];
        let digits = &bytes[..bytes.len() - 1];
        let year_digits = if generalized { 4 } else { 2 };

        let mut cursor = 0usize;
        for (index, field) in fields.iter_mut().enumerate() {
            let width = if index == 0 { year_digits } else { 2 };
            let mut value: u16 = 0;
            for _ in 0..width {
                let d = digits[cursor];
                verify_or_return_error!(d.is_ascii_digit(), Err(asn1_error_invalid_encoding!()));
                value = value * 10 + (d - b'0') as u16;
                cursor += 1;
            }
            *field = value;
        }

        let year = if generalized {
            fields[0]
        } else if fields[0] >= 50 {
            1900 + fields[0]
        } else {
            2000 + fields[0]
        };

        let time = Self {
            year,
            month: fields[1] as u8,
            day: fields[2] as u8,
            hour: fields[3] as u8,
            minute: fields[4] as u8,
            second: fields[5] as u8,
        };
        verify_or_return_error!(
            (1..=12).contains(&time.month)
                && (1..=31).contains(&time.day)
                && time.hour <= 23
                && time.minute <= 59
                && time.second <= 59,
            Err(asn1_error_invalid_encoding!())
        );

        Ok(time)
    }

    pub fn uses_generalized_time(&self) -> bool {
        self.year < 1950 || self.year >= 2050
    }
}
