//! EDI to oracle pipeline
//!
//! One call to [`EdiOraclePipeline::process`] takes a raw interchange through every stage:
//!
//! ```text
//! raw bytes
//!   ├─> DocumentParser      (Interchange)
//!   ├─> resolve_doc_type    (ST01 code)
//!   ├─> FieldMapRegistry    (FieldMap)
//!   ├─> build_record        (CanonicalRecord)
//!   ├─> derive_params       (OracleParams)
//!   └─> OracleSubmitter     (TransactionId)
//! ```
//!
//! The first failing stage ends the call; nothing is submitted unless every earlier stage
//! succeeded. Calls share nothing mutable and can run concurrently.
use super::config::OracleConfig;
use super::error::{ConfigError, PipelineError};
use super::ledger::{OracleLedger, TransactionId};
use super::params::{OracleParams, derive_params};
use super::record::{CanonicalRecord, build_record};
use super::registry::FieldMapRegistry;
use super::resolver::resolve_doc_type;
use super::signer::{Credential, MnemonicSigner, Signer};
use super::submitter::OracleSubmitter;
use super::x12::{DocumentParser, X12Parser};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything the pipeline derived from a document before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDocument {
    pub doc_type: String,
    pub record: CanonicalRecord,
    pub params: OracleParams,
}

pub struct EdiOraclePipeline {
    parser: Arc<dyn DocumentParser>,
    registry: Arc<FieldMapRegistry>,
    submitter: OracleSubmitter,
}

impl EdiOraclePipeline {
    pub fn new(
        registry: Arc<FieldMapRegistry>,
        ledger: Arc<dyn OracleLedger>,
        app_id: u64,
    ) -> Self {
        Self {
            parser: Arc::new(X12Parser::new()),
            registry,
            submitter: OracleSubmitter::new(ledger, app_id),
        }
    }

    pub fn from_config(
        config: &OracleConfig,
        ledger: Arc<dyn OracleLedger>,
    ) -> Result<Self, ConfigError> {
        let registry = Arc::new(config.registry()?);
        Ok(Self::new(registry, ledger, config.app_id))
    }

    /// Swap the default X12 tokenizer for another parser.
    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn registry(&self) -> &FieldMapRegistry {
        &self.registry
    }

    /// Parse, resolve, map and derive, without touching the ledger.
    pub fn prepare(&self, raw: &[u8]) -> Result<PreparedDocument, PipelineError> {
        let interchange = self.parser.parse(raw)?;
        debug!(groups = interchange.groups.len(), "Parsed interchange");

        let doc_type = resolve_doc_type(&interchange)?;
        let field_map = self.registry.map_for(&doc_type)?;
        debug!(%doc_type, fields = field_map.len(), "Resolved field map");

        let record = build_record(&interchange, field_map)?;
        let params = derive_params(&record, &doc_type)?;
        debug!(
            key = %params.key,
            status = params.status,
            item_qty = params.item_qty,
            "Derived oracle params"
        );

        Ok(PreparedDocument {
            doc_type,
            record,
            params,
        })
    }

    #[tracing::instrument(skip_all, fields(bytes = raw.len()))]
    pub async fn process(
        &self,
        raw: &[u8],
        credential: &Credential,
    ) -> Result<TransactionId, PipelineError> {
        let prepared = self.prepare(raw)?;
        let signer = MnemonicSigner::from_credential(credential)?;
        self.submit(prepared, &signer).await
    }

    /// Same as [`process`](Self::process) with a caller-supplied signer.
    pub async fn process_with_signer(
        &self,
        raw: &[u8],
        signer: &dyn Signer,
    ) -> Result<TransactionId, PipelineError> {
        let prepared = self.prepare(raw)?;
        self.submit(prepared, signer).await
    }

    async fn submit(
        &self,
        prepared: PreparedDocument,
        signer: &dyn Signer,
    ) -> Result<TransactionId, PipelineError> {
        let txid = self.submitter.submit(&prepared.params, signer).await?;
        info!(
            doc_type = %prepared.doc_type,
            key = %prepared.params.key,
            %txid,
            "Recorded document on the oracle"
        );
        Ok(txid)
    }
}
