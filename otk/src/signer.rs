//! Signing SIGSTRUCT with a one-time key.
//!
//! The key lives in a separate signing enclave, which is handed the signing
//! data and returns the public modulus, the signature and a quote whose report
//! data binds the modulus to the signing enclave. Running that enclave is up to
//! the [`EnclaveSigner`] implementation.
use byteorder::{ByteOrder, LittleEndian};
use num_bigint::BigUint;
use slog::{info, Logger};

use crate::{
    common::{
        hexdump::{hexdump, DEFAULT_WIDTH},
        logger::get_logger,
        sgx::{
            self, mrsigner_for_modulus,
            rsa::SGX_RSA_PUBLIC_EXPONENT,
            sigstruct::{check_isvsvn, Sigstruct, SIGNING_DATA_SIZE},
            MrSigner, MODULUS_SIZE,
        },
    },
    config,
    store::{self, QuoteStore},
};

/// Possible errors returned by this module.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed signer output: expected at least {expected} bytes, got {got}")]
    MalformedOutput { expected: usize, got: usize },
    #[error("failed to sign: {0}")]
    Signer(anyhow::Error),
    #[error(transparent)]
    Sgx(#[from] sgx::Error),
    #[error(transparent)]
    Store(#[from] store::Error),
}

/// Result of signing with the one-time key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerOutput {
    /// RSA public exponent.
    pub exponent: u32,
    /// Big-endian RSA modulus.
    pub modulus: Vec<u8>,
    /// Big-endian RSA signature.
    pub signature: Vec<u8>,
    /// Quote of the signing enclave.
    pub quote: Vec<u8>,
}

impl SignerOutput {
    /// Parse the raw output of the signing enclave: the modulus, the
    /// signature and the quote, concatenated in this order.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        if data.len() < 2 * MODULUS_SIZE {
            return Err(Error::MalformedOutput {
                expected: 2 * MODULUS_SIZE,
                got: data.len(),
            });
        }
        let (modulus, rest) = data.split_at(MODULUS_SIZE);
        let (signature, quote) = rest.split_at(MODULUS_SIZE);

        Ok(Self {
            exponent: SGX_RSA_PUBLIC_EXPONENT,
            modulus: modulus.to_vec(),
            signature: signature.to_vec(),
            quote: quote.to_vec(),
        })
    }

    /// MRSIGNER of the one-time key.
    pub fn mrsigner(&self) -> MrSigner {
        mrsigner_for_modulus(&self.modulus)
    }
}

/// Producer of one-time-key signatures.
pub trait EnclaveSigner {
    /// Sign `signing_data` extracted from SIGSTRUCT.
    fn sign(&self, signing_data: &[u8; SIGNING_DATA_SIZE]) -> anyhow::Result<SignerOutput>;
}

/// Ensure ISVSVN embedded in signing data is at the maximum value.
pub fn check_signing_data_isvsvn(signing_data: &[u8; SIGNING_DATA_SIZE]) -> Result<(), Error> {
    Ok(check_isvsvn(LittleEndian::read_u16(
        &signing_data[SIGNING_DATA_SIZE - 2..],
    ))?)
}

/// Log the modulus, its MRSIGNER and the quote as hex dumps.
pub fn show_quote(logger: &Logger, modulus: &[u8], quote: &[u8]) {
    let mrsigner = mrsigner_for_modulus(modulus);
    let sections: [(&str, &[u8]); 3] = [
        ("modulus", modulus),
        ("mrsigner", mrsigner.as_ref()),
        ("quote", quote),
    ];
    for (name, data) in sections {
        for line in hexdump(data, DEFAULT_WIDTH) {
            info!(logger, "{}", name; "data" => line);
        }
    }
}

/// Sign `sigstruct` with a one-time key.
///
/// On success the exponent, modulus, signature and the q1/q2 values are
/// filled in. If configured, the quote is saved in `store` first.
pub fn sign<S: EnclaveSigner + ?Sized>(
    sigstruct: Sigstruct,
    signer: &S,
    options: &config::Signing,
    store: &QuoteStore,
) -> Result<Sigstruct, Error> {
    let logger = get_logger("otk/signer");

    let signing_data = sigstruct.signing_data();
    if options.check_isvsvn {
        check_signing_data_isvsvn(&signing_data)?;
    }

    info!(logger, "signing SIGSTRUCT"; "mrenclave" => ?sigstruct.mrenclave());
    let output = signer.sign(&signing_data).map_err(Error::Signer)?;

    if options.show_quote {
        show_quote(&logger, &output.modulus, &output.quote);
    }
    if options.store_quote {
        store.save(&output.modulus, &output.quote)?;
    }

    let modulus = BigUint::from_bytes_be(&output.modulus);
    let signature = BigUint::from_bytes_be(&output.signature);

    let mut sigstruct = sigstruct;
    sigstruct.set_signature(output.exponent, &modulus, &signature)?;

    info!(logger, "signed SIGSTRUCT";
        "mrsigner" => ?sigstruct.mrsigner(),
        "mrenclave" => ?sigstruct.mrenclave(),
    );

    Ok(sigstruct)
}
