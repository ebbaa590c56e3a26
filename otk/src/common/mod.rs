//! Common types.

#[macro_use]
pub mod bytes;
pub mod bcd;
pub mod field;
pub mod hexdump;
pub mod logger;
pub mod sgx;
