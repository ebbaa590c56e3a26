//! Auxiliary values for the SGX RSA exponent-3 signature check.
//!
//! The processor verifies SIGSTRUCT signatures without a full modular
//! exponentiation. Instead it expects two helper values next to the signature
//! (see https://eprint.iacr.org/2016/086.pdf, section 6.5.2):
//!
//! ```text
//! q1 = floor(s^2 / m)
//! q2 = floor(((s^2 mod m) * s) / m)
//! ```
use num_bigint::BigUint;
use num_traits::Zero;

use super::Error;

/// The only RSA public exponent accepted in SIGSTRUCT.
pub const SGX_RSA_PUBLIC_EXPONENT: u32 = 3;

/// RSA key size used to sign enclaves, in bits.
pub const SGX_RSA_KEY_SIZE: u32 = 3072;

/// The q1 and q2 values accompanying a signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuxValues {
    pub q1: BigUint,
    pub q2: BigUint,
}

impl AuxValues {
    /// Compute q1 and q2 for `signature` under `modulus`.
    pub fn compute(signature: &BigUint, modulus: &BigUint) -> Result<Self, Error> {
        if modulus.is_zero() {
            return Err(Error::InvalidSigstruct("modulus is zero".to_string()));
        }

        let squared = signature * signature;
        let q1 = &squared / modulus;
        let w = &squared % modulus;
        let q2 = (w * signature) / modulus;

        Ok(Self { q1, q2 })
    }
}
