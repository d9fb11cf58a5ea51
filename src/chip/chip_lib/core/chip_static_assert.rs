#[macro_export]
macro_rules! chip_static_assert {
    ($cond:expr, $msg:literal) => {
        const _: () = assert!($cond, $msg);
    };
    ($cond:expr) => {
        const _: () = assert!($cond);
    };
}
