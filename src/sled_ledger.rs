//! Local oracle ledger backed by sled
//!
//! Plays the part of the chain and the oracle app together. An app must be created before it
//! accepts calls, and only its creator may call `add_record`, which writes an [`OracleRecord`]
//! under the call's box key. Every accepted transaction is logged under its id. The replay check,
//! the box write and the log write run in one sled transaction.
use super::fixed::encode_fixed32;
use super::ledger::{
    ADD_RECORD, OracleLedger, OracleRecord, SignedTransaction, TransactionId, TransactionParams,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sled::Db;
use sled::transaction::{TransactionError, abort};
use std::sync::Arc;

const APP_PREFIX: &str = "app/";
const BOX_PREFIX: &str = "box/";
const TXN_PREFIX: &str = "txn/";
const VALIDITY_WINDOW: u64 = 1000;
const MIN_FEE: u64 = 1000;
const GENESIS_ID: &str = "edi-oracle-local-v1";

/// Wall-clock time of a ledger event, stored as nanoseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

/// An oracle app and the account allowed to write to it.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct AppEntry {
    #[n(0)]
    pub creator: String,
    #[n(1)]
    pub round: u64,
    #[n(2)]
    pub created_at: Timestamp,
}

/// What the ledger remembers about an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct LedgerEntry {
    #[n(0)]
    pub txid: String,
    #[n(1)]
    pub round: u64,
    #[n(2)]
    pub sender: String,
    #[n(3)]
    pub app_id: u64,
    #[n(4)]
    pub box_key: Vec<u8>,
    #[n(5)]
    pub confirmed_at: Timestamp,
}

pub struct SledLedger {
    instance: Arc<Db>,
}

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C> minicbor::Encode<C> for Timestamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        let nanos = self.0.timestamp_nanos_opt().ok_or_else(|| {
            minicbor::encode::Error::message("timestamp is outside the nanosecond range")
        })?;
        e.i64(nanos)?;
        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Timestamp {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(Self(DateTime::from_timestamp_nanos(d.i64()?)))
    }
}

fn app_key(app_id: u64) -> Vec<u8> {
    format!("{APP_PREFIX}{app_id}").into_bytes()
}

fn box_key(app_id: u64, key: &[u8]) -> Vec<u8> {
    let mut out = format!("{BOX_PREFIX}{app_id}/").into_bytes();
    out.extend_from_slice(key);
    out
}

fn txn_key(txid: &TransactionId) -> Vec<u8> {
    format!("{TXN_PREFIX}{txid}").into_bytes()
}

impl SledLedger {
    pub fn new(instance: Arc<Db>) -> Self {
        Self { instance }
    }

    /// A throwaway ledger that lives in memory and is removed on drop.
    pub fn temporary() -> anyhow::Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self::new(Arc::new(db)))
    }

    /// Register the oracle app with `creator` as the only account allowed to add records.
    /// An app id can be created once.
    pub fn create_app(&self, app_id: u64, creator: &str) -> anyhow::Result<AppEntry> {
        let entry = AppEntry {
            creator: creator.to_string(),
            round: self.instance.generate_id()?,
            created_at: Timestamp::now(),
        };
        self.instance
            .compare_and_swap(app_key(app_id), None::<&[u8]>, Some(minicbor::to_vec(&entry)?))?
            .map_err(|_| anyhow::anyhow!("application {app_id} already exists"))?;

        tracing::info!(app_id, creator, round = entry.round, "Created oracle app");
        Ok(entry)
    }

    pub fn app(&self, app_id: u64) -> anyhow::Result<Option<AppEntry>> {
        match self.instance.get(app_key(app_id))? {
            Some(raw) => Ok(Some(minicbor::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Read back the record stored under `key`, the same key the pipeline derived.
    pub fn get_record(&self, app_id: u64, key: &str) -> anyhow::Result<Option<OracleRecord>> {
        let slot = encode_fixed32(key)?;
        match self.instance.get(box_key(app_id, &slot))? {
            Some(raw) => Ok(Some(minicbor::decode(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn transaction(&self, txid: &TransactionId) -> anyhow::Result<Option<LedgerEntry>> {
        match self.instance.get(txn_key(txid))? {
            Some(raw) => Ok(Some(minicbor::decode(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.instance.scan_prefix(TXN_PREFIX).count()
    }
}

#[async_trait]
impl OracleLedger for SledLedger {
    async fn suggested_params(&self) -> anyhow::Result<TransactionParams> {
        let round = self.instance.generate_id()?;
        Ok(TransactionParams {
            first_valid: round,
            last_valid: round + VALIDITY_WINDOW,
            fee: MIN_FEE,
            genesis_id: GENESIS_ID.to_string(),
        })
    }

    async fn submit(&self, signed: SignedTransaction) -> anyhow::Result<TransactionId> {
        let txn = &signed.txn;
        let request = &txn.request;
        let round = self.instance.generate_id()?;

        if txn.params.genesis_id != GENESIS_ID {
            anyhow::bail!("transaction is for network '{}'", txn.params.genesis_id);
        }
        if round < txn.params.first_valid || round > txn.params.last_valid {
            anyhow::bail!(
                "round {round} is outside the validity window {}..={}",
                txn.params.first_valid,
                txn.params.last_valid
            );
        }
        if txn.params.fee < MIN_FEE {
            anyhow::bail!("fee {} is below the minimum of {MIN_FEE}", txn.params.fee);
        }
        signed.verify()?;

        let Some(app) = self.app(request.app_id)? else {
            anyhow::bail!("application {} does not exist", request.app_id);
        };
        if request.method != ADD_RECORD {
            anyhow::bail!(
                "application {} has no method '{}'",
                request.app_id,
                request.method
            );
        }
        if request.sender != app.creator {
            anyhow::bail!(
                "only the creator of application {} may call {ADD_RECORD}",
                request.app_id
            );
        }

        let (key, record) = OracleRecord::from_add_record_args(&request.args)?;
        if key.as_slice() != request.box_key.as_slice() {
            anyhow::bail!("box reference does not match the key argument");
        }

        let txid = signed.id()?;
        let entry = LedgerEntry {
            txid: txid.0.clone(),
            round,
            sender: request.sender.clone(),
            app_id: request.app_id,
            box_key: request.box_key.clone(),
            confirmed_at: Timestamp::now(),
        };
        let record_slot = box_key(request.app_id, &key);
        let record_bytes = minicbor::to_vec(&record)?;
        let txn_slot = txn_key(&txid);
        let entry_bytes = minicbor::to_vec(&entry)?;

        let outcome = self.instance.transaction(|tx| {
            if tx.get(&txn_slot)?.is_some() {
                return abort(());
            }
            tx.insert(record_slot.as_slice(), record_bytes.as_slice())?;
            tx.insert(txn_slot.as_slice(), entry_bytes.as_slice())?;
            Ok(())
        });
        match outcome {
            Ok(()) => {}
            Err(TransactionError::Abort(())) => {
                anyhow::bail!("transaction {txid} is already in the ledger")
            }
            Err(TransactionError::Storage(e)) => return Err(e.into()),
        }

        tracing::info!(
            %txid,
            round,
            app_id = request.app_id,
            box_key = %hex::encode(key),
            "Confirmed oracle transaction"
        );
        Ok(txid)
    }
}
