//! Ledger boundary: call and transaction wire types plus the [`OracleLedger`] trait
use super::fixed::{SLOT_WIDTH, decode_fixed};
use super::signer::{address_for, verify};
use async_trait::async_trait;
use std::fmt;

pub const ADD_RECORD: &str = "add_record";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(pub String);

/// Suggested validity window and fee handed out by the ledger before signing.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct TransactionParams {
    #[n(0)]
    pub first_valid: u64,
    #[n(1)]
    pub last_valid: u64,
    #[n(2)]
    pub fee: u64,
    #[n(3)]
    pub genesis_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum ArgValue {
    #[n(0)]
    Bytes(#[n(0)] Vec<u8>),
    #[n(1)]
    Uint(#[n(0)] u64),
    #[n(2)]
    Int(#[n(0)] i64),
}

/// One application method call, addressed to the oracle app.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct OracleCallRequest {
    #[n(0)]
    pub app_id: u64,
    #[n(1)]
    pub method: String,
    #[n(2)]
    pub args: Vec<ArgValue>,
    #[n(3)]
    pub box_key: Vec<u8>, // storage slot the call writes
    #[n(4)]
    pub sender: String,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct UnsignedTransaction {
    #[n(0)]
    pub params: TransactionParams,
    #[n(1)]
    pub request: OracleCallRequest,
    #[n(2)]
    pub note: Vec<u8>, // uuid7, makes every submission a distinct transaction
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct SignedTransaction {
    #[n(0)]
    pub txn: UnsignedTransaction,
    #[n(1)]
    pub public_key: Vec<u8>, // ed25519 verifying key of the sender
    #[n(2)]
    pub signature: Vec<u8>,
}

/// The status entry the oracle app keeps per document.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct OracleRecord {
    #[n(0)]
    pub doc_type: u64,
    #[n(1)]
    pub reference: [u8; SLOT_WIDTH],
    #[n(2)]
    pub status: i64,
    #[n(3)]
    pub item_code: [u8; SLOT_WIDTH],
    #[n(4)]
    pub item_qty: u64,
}

#[async_trait]
pub trait OracleLedger: Send + Sync {
    async fn suggested_params(&self) -> anyhow::Result<TransactionParams>;

    /// Submit a signed transaction exactly once. An `Ok` means the ledger accepted it.
    async fn submit(&self, txn: SignedTransaction) -> anyhow::Result<TransactionId>;
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl UnsignedTransaction {
    /// The bytes a signer signs.
    pub fn signing_payload(&self) -> anyhow::Result<Vec<u8>> {
        Ok(minicbor::to_vec(self)?)
    }
}

impl SignedTransaction {
    pub fn id(&self) -> anyhow::Result<TransactionId> {
        let cbor = minicbor::to_vec(self)?;
        Ok(TransactionId(sha256::digest(&cbor)))
    }

    /// The signature must cover the signing payload, and the sender must be the address of the
    /// key that produced it.
    pub fn verify(&self) -> anyhow::Result<()> {
        verify(&self.public_key, &self.txn.signing_payload()?, &self.signature)?;

        let public_key = <[u8; 32]>::try_from(self.public_key.as_slice())?;
        let signer = address_for(&public_key)?;
        if signer != self.txn.request.sender {
            anyhow::bail!(
                "sender {} does not match the signing key {signer}",
                self.txn.request.sender
            );
        }
        Ok(())
    }
}

fn slot(arg: &ArgValue, name: &str) -> anyhow::Result<[u8; SLOT_WIDTH]> {
    match arg {
        ArgValue::Bytes(bytes) => <[u8; SLOT_WIDTH]>::try_from(bytes.as_slice()).map_err(|_| {
            anyhow::anyhow!(
                "argument '{name}' must be {SLOT_WIDTH} bytes, got {}",
                bytes.len()
            )
        }),
        other => Err(anyhow::anyhow!(
            "argument '{name}' must be bytes, got {other:?}"
        )),
    }
}

fn uint(arg: &ArgValue, name: &str) -> anyhow::Result<u64> {
    match arg {
        ArgValue::Uint(v) => Ok(*v),
        other => Err(anyhow::anyhow!(
            "argument '{name}' must be an unsigned integer, got {other:?}"
        )),
    }
}

impl OracleRecord {
    /// Decode the `add_record(key, doc_type, ref, status, item_code, item_qty)` argument list.
    /// Returns the key slot alongside the record.
    pub fn from_add_record_args(args: &[ArgValue]) -> anyhow::Result<([u8; SLOT_WIDTH], Self)> {
        let [key, doc_type, reference, status, item_code, item_qty] = args else {
            return Err(anyhow::anyhow!(
                "{ADD_RECORD} takes 6 arguments, got {}",
                args.len()
            ));
        };
        let status = match status {
            ArgValue::Int(v) => *v,
            other => {
                return Err(anyhow::anyhow!(
                    "argument 'status' must be an integer, got {other:?}"
                ));
            }
        };

        let record = Self {
            doc_type: uint(doc_type, "doc_type")?,
            reference: slot(reference, "ref")?,
            status,
            item_code: slot(item_code, "item_code")?,
            item_qty: uint(item_qty, "item_qty")?,
        };
        Ok((slot(key, "key")?, record))
    }

    pub fn reference(&self) -> anyhow::Result<String> {
        Ok(decode_fixed(&self.reference)?)
    }

    pub fn item_code(&self) -> anyhow::Result<String> {
        Ok(decode_fixed(&self.item_code)?)
    }
}
