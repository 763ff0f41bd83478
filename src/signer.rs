//! Account credentials and transaction signing
use super::error::PipelineError;
use bech32::Bech32m;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use std::fmt;

const MNEMONIC_WORDS: usize = 25;
const ADDRESS_HRP: &str = "edi";

/// An account secret handed to the pipeline for one call. Never logged.
#[derive(Clone)]
pub struct Credential {
    mnemonic: String,
}

/// Signs transaction payloads on behalf of one account.
pub trait Signer: Send + Sync {
    fn address(&self) -> &str;
    /// Ed25519 verifying key the address was derived from.
    fn public_key(&self) -> [u8; 32];
    fn sign(&self, payload: &[u8]) -> anyhow::Result<Vec<u8>>;
}

/// Ed25519 signer whose seed is the digest of a 25-word mnemonic. The address is the bech32m
/// encoding of the verifying key.
pub struct MnemonicSigner {
    address: String,
    key: SigningKey,
}

impl Credential {
    pub fn from_mnemonic(mnemonic: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
        }
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("mnemonic", &"<redacted>")
            .finish()
    }
}

/// Bech32m address of an ed25519 verifying key.
pub fn address_for(public_key: &[u8; 32]) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(ADDRESS_HRP)?;
    Ok(bech32::encode::<Bech32m>(hrp, public_key)?)
}

/// Check `signature` over `payload` against a raw verifying key.
pub fn verify(public_key: &[u8], payload: &[u8], signature: &[u8]) -> anyhow::Result<()> {
    let public_key = <[u8; 32]>::try_from(public_key)
        .map_err(|_| anyhow::anyhow!("public key must be 32 bytes, got {}", public_key.len()))?;
    let key = VerifyingKey::from_bytes(&public_key)?;
    let signature = Signature::from_slice(signature)?;
    key.verify(payload, &signature)
        .map_err(|_| anyhow::anyhow!("signature does not match the payload"))
}

impl MnemonicSigner {
    pub fn from_credential(credential: &Credential) -> Result<Self, PipelineError> {
        let words: Vec<&str> = credential.mnemonic.split_whitespace().collect();
        if words.len() != MNEMONIC_WORDS {
            return Err(PipelineError::InvalidCredential(format!(
                "expected {MNEMONIC_WORDS} mnemonic words, found {}",
                words.len()
            )));
        }
        if !words
            .iter()
            .all(|w| w.chars().all(|c| c.is_ascii_lowercase()))
        {
            return Err(PipelineError::InvalidCredential(
                "mnemonic words must be lower-case ASCII".into(),
            ));
        }

        let invalid = PipelineError::InvalidCredential;
        let digest =
            hex::decode(sha256::digest(words.join(" "))).map_err(|e| invalid(e.to_string()))?;
        let seed = <[u8; 32]>::try_from(digest.as_slice())
            .map_err(|_| invalid("mnemonic digest is not 32 bytes".into()))?;
        let key = SigningKey::from_bytes(&seed);
        let address =
            address_for(&key.verifying_key().to_bytes()).map_err(|e| invalid(e.to_string()))?;

        Ok(Self { address, key })
    }
}

impl Signer for MnemonicSigner {
    fn address(&self) -> &str {
        &self.address
    }

    fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    fn sign(&self, payload: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(self.key.sign(payload).to_bytes().to_vec())
    }
}
