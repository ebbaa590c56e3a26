//! Gramine SGX one-time-key signing support.
//!
//! The crate provides a byte-exact SIGSTRUCT codec, MRSIGNER derivation, the
//! auxiliary values needed by the hardware RSA exponent-3 check and a local
//! cache of attestation quotes tied to signing keys.
//!
//! # Examples
//!
//! ```rust,ignore
//! let store = QuoteStore::new(&config.quote_store);
//! let signed = signer::sign(sigstruct, &my_signer, &config.signing, &store)?;
//! ```

#[macro_use]
pub mod common;
pub mod config;
pub mod signer;
pub mod store;

pub use common::sgx::{
    mrsigner_for_modulus, mrsigner_for_modulus_le, quote::Quote, sigstruct::Sigstruct, MrEnclave,
    MrSigner,
};
pub use config::Config;
pub use store::QuoteStore;
