pub mod crypto_pal;

pub use crypto_pal::*;
