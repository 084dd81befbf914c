//! `opskit_util` v1:
//! Shared retail-ops helpers.
//!
//! - `config`   : injected toolkit configuration
//! - `calendar` : Sunday-start week numbers, Pacific-time conversion
//! - `hash`     : SHA-256 string digests
//! - `password` : throwaway password generation
pub mod calendar;
pub mod config;
pub mod hash;
pub mod password;

pub use calendar::{convert_to_pacific, week_number, week_number_from_str};
pub use config::{SpecToolkitConfig, init_workspace};
pub use hash::sha256_hex;
pub use password::generate_password;
