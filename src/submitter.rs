//! Assembly and dispatch of the `add_record` oracle call
use super::error::PipelineError;
use super::fixed::{SLOT_WIDTH, encode_fixed};
use super::ledger::{
    ADD_RECORD, ArgValue, OracleCallRequest, OracleLedger, SignedTransaction, TransactionId,
    UnsignedTransaction,
};
use super::params::OracleParams;
use super::signer::Signer;
use std::sync::Arc;
use uuid7::uuid7;

pub struct OracleSubmitter {
    ledger: Arc<dyn OracleLedger>,
    app_id: u64,
}

fn encoded(field: &str, value: &str) -> Result<Vec<u8>, PipelineError> {
    encode_fixed(value, SLOT_WIDTH).map_err(|source| PipelineError::EncodingOverflow {
        field: field.to_string(),
        source,
    })
}

impl OracleSubmitter {
    pub fn new(ledger: Arc<dyn OracleLedger>, app_id: u64) -> Self {
        Self { ledger, app_id }
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    /// Arguments go out as `[key, doc_type, ref, status, item_code, item_qty]`, strings as
    /// fixed-width slots and numbers as they are. The box key is the encoded key.
    pub fn build_request(
        &self,
        params: &OracleParams,
        sender: &str,
    ) -> Result<OracleCallRequest, PipelineError> {
        let key = encoded("key", &params.key)?;
        let reference = encoded("ref", &params.reference)?;
        let item_code = encoded("item_code", &params.item_code)?;

        Ok(OracleCallRequest {
            app_id: self.app_id,
            method: ADD_RECORD.to_string(),
            args: vec![
                ArgValue::Bytes(key.clone()),
                ArgValue::Uint(params.doc_type.into()),
                ArgValue::Bytes(reference),
                ArgValue::Int(params.status.into()),
                ArgValue::Bytes(item_code),
                ArgValue::Uint(params.item_qty),
            ],
            box_key: key,
            sender: sender.to_string(),
        })
    }

    /// Sign and submit one `add_record` call. There is no retry: a failure is returned as-is and
    /// a future dropped before the ledger answers leaves the outcome unknown.
    pub async fn submit(
        &self,
        params: &OracleParams,
        signer: &dyn Signer,
    ) -> Result<TransactionId, PipelineError> {
        let request = self.build_request(params, signer.address())?;
        let failed = |source: anyhow::Error| PipelineError::SubmissionError {
            key: params.key.clone(),
            source,
        };

        let suggested = self.ledger.suggested_params().await.map_err(failed)?;
        let txn = UnsignedTransaction {
            params: suggested,
            request,
            note: uuid7().as_bytes().to_vec(),
        };
        let payload = txn.signing_payload().map_err(failed)?;
        let signature = signer
            .sign(&payload)
            .map_err(|e| PipelineError::InvalidCredential(e.to_string()))?;

        tracing::debug!(key = %params.key, app_id = self.app_id, "Submitting oracle call");
        let signed = SignedTransaction {
            txn,
            public_key: signer.public_key().to_vec(),
            signature,
        };
        self.ledger.submit(signed).await.map_err(failed)
    }
}
