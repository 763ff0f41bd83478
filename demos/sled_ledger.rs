//! Run an interchange file through the pipeline against an on-disk sled ledger.
//!
//! ```text
//! EDI_ORACLE_APP_ID=1001 EDI_ORACLE_MNEMONIC="..." \
//!     cargo run --example sled_ledger -- tests/fixtures/850_purchase_order.edi
//! ```
use anyhow::Context;
use edi_oracle::{
    Credential, EdiOraclePipeline, MnemonicSigner, OracleConfig, Signer, SledLedger,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: sled_ledger <interchange.edi>")?;
    let raw = std::fs::read(&path).with_context(|| format!("failed to read {path}"))?;

    let config = OracleConfig::from_env()?;
    let credential = Credential::from_mnemonic(
        std::env::var("EDI_ORACLE_MNEMONIC").context("EDI_ORACLE_MNEMONIC is not set")?,
    );

    let db = sled::open("sled")?;
    let ledger = Arc::new(SledLedger::new(Arc::new(db)));
    let signer = MnemonicSigner::from_credential(&credential)?;
    if ledger.app(config.app_id)?.is_none() {
        ledger.create_app(config.app_id, signer.address())?;
    }

    let pipeline = EdiOraclePipeline::from_config(&config, ledger.clone())?;
    let prepared = pipeline.prepare(&raw)?;
    println!("{:#}", prepared.record.to_json());

    let txid = pipeline.process(&raw, &credential).await?;
    println!("transaction: {txid}");

    if let Some(record) = ledger.get_record(config.app_id, &prepared.params.key)? {
        println!("{record:#?}");
    }

    Ok(())
}
