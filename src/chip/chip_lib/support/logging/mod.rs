pub mod constants;
pub mod logging;

pub use constants::LogCategory;
pub use constants::LogModule;
pub use logging::{is_category_enabled, log, set_log_filter, set_log_redirect_callback};

#[macro_export]
macro_rules! chip_log_error {
    ($mod:ident, $msg:expr $(, $args:expr)*) => {
        $crate::chip_internal_log!($mod, Error, $msg $(, $args)*)
    };
}

#[macro_export]
macro_rules! chip_log_progress {
    ($mod:ident, $msg:expr $(, $args:expr)*) => {
        $crate::chip_internal_log!($mod, Progress, $msg $(, $args)*)
    };
}

#[macro_export]
macro_rules! chip_log_detail {
    ($mod:ident, $msg:expr $(, $args:expr)*) => {
        $crate::chip_internal_log!($mod, Detail, $msg $(, $args)*)
    };
}
