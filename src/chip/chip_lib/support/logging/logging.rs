pub use super::constants::LogCategory;
pub use super::constants::LogModule;

use core::fmt;

pub type LogRedirectCallback = Option<fn(&str, LogCategory, fmt::Arguments) -> ()>;

static mut LOG_REDIRECT_CB: LogRedirectCallback = None;

#[cfg(feature = "chip_log_filtering")]
static mut LOG_FILTER: LogCategory = LogCategory::KLogCategoryMax;

static MODULENAMES: [&str; LogModule::KLogModuleMax as usize] = [
    "-",   // NotSpecified
    "TLV", // TLV
    "ASN", // ASN1
    "CR",  // Crypto
    "SC",  // SecureChannel
    "SPT", // Support
    "TST", // Test
];

fn get_module_name(module: LogModule) -> &'static str {
    if module < LogModule::KLogModuleMax {
        return MODULENAMES[module as usize];
    }
    MODULENAMES[LogModule::KLogModuleNotSpecified as usize]
}

#[cfg(test)]
fn log_v(module_name: &str, category: LogCategory, args: fmt::Arguments) {
    println!("CHIP:{}: {} {}", module_name, category, args);
}

#[cfg(not(test))]
fn log_v(_module_name: &str, _category: LogCategory, _args: fmt::Arguments) {}

pub fn set_log_redirect_callback(cb: LogRedirectCallback) {
    unsafe {
        LOG_REDIRECT_CB = cb;
    }
}

#[cfg(feature = "chip_log_filtering")]
pub fn set_log_filter(category: LogCategory) {
    unsafe {
        LOG_FILTER = category;
    }
}

#[cfg(not(feature = "chip_log_filtering"))]
pub fn set_log_filter(_category: LogCategory) {}

fn is_category_built(category: LogCategory) -> bool {
    match category {
        LogCategory::KLogCategoryError => cfg!(feature = "chip_error_logging"),
        LogCategory::KLogCategoryProgress => cfg!(feature = "chip_progress_logging"),
        LogCategory::KLogCategoryDetail => cfg!(feature = "chip_detail_logging"),
        _ => false,
    }
}

#[cfg(feature = "chip_log_filtering")]
pub fn is_category_enabled(category: LogCategory) -> bool {
    is_category_built(category) && category <= unsafe { LOG_FILTER }
}

#[cfg(not(feature = "chip_log_filtering"))]
pub fn is_category_enabled(category: LogCategory) -> bool {
    is_category_built(category)
}

pub fn log(module: LogModule, category: LogCategory, args: fmt::Arguments) {
    let module_name = get_module_name(module);
    let redirect = unsafe { LOG_REDIRECT_CB };

    match redirect {
        Some(cb) => cb(module_name, category, args),
        None => log_v(module_name, category, args),
    }
}

#[macro_export]
macro_rules! chip_internal_log {
    ($mod:ident, $cat:ident, $msg:expr $(, $args:expr)*) => {
        $crate::chip_internal_log_impl!($mod,
            <$crate::chip::logging::LogCategory as core::str::FromStr>::from_str(
                concat!(stringify!(KLogCategory), stringify!($cat))).unwrap(),
            $msg $(, $args)*)
    };
}

#[macro_export]
macro_rules! chip_internal_log_impl {
    ($mod:ident, $cat:expr, $msg:expr $(, $args:expr)*) => {
        if $crate::chip::logging::is_category_enabled($cat) {
            $crate::chip::logging::log(
                <$crate::chip::logging::LogModule as core::str::FromStr>::from_str(
                    concat!(stringify!(KLogModule), stringify!($mod))).unwrap(),
                $cat,
                format_args!($msg $(, $args)*));
        }
    };
}
