//! SGX-specific functionality.

pub mod quote;
pub mod rsa;
pub mod sigstruct;

use sha2::{Digest, Sha256};

use super::field;

impl_bytes!(MrEnclave, 32, "Enclave hash (MRENCLAVE).");
impl_bytes!(MrSigner, 32, "Enclave signer hash (MRSIGNER).");

/// Size of the RSA modulus used to sign enclaves, in bytes.
pub const MODULUS_SIZE: usize = 384;

/// Possible errors returned by this module.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid SIGSTRUCT: {0}")]
    InvalidSigstruct(String),
    #[error(transparent)]
    Field(#[from] field::Error),
    #[error("failed to read SIGSTRUCT: {0}")]
    Io(#[from] std::io::Error),
}

/// Compute MRSIGNER for a big-endian RSA modulus.
pub fn mrsigner_for_modulus(modulus: &[u8]) -> MrSigner {
    let modulus_le: Vec<u8> = modulus.iter().rev().copied().collect();
    mrsigner_for_modulus_le(&modulus_le)
}

/// Compute MRSIGNER for a little-endian RSA modulus, as laid out in SIGSTRUCT.
pub fn mrsigner_for_modulus_le(modulus: &[u8]) -> MrSigner {
    MrSigner(Sha256::digest(modulus).into())
}
