pub mod bytes_to_hex;
pub mod code_utils;
pub mod default_string;
pub mod logging;
pub mod time_utils;
