//! Turns X12 EDI documents (850 purchase orders, 856 ship notices, 810 invoices) into a single
//! `add_record` call on a ledger oracle contract.

pub mod config;
pub mod error;
pub mod fixed;
pub mod ledger;
pub mod params;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod signer;
pub mod sled_ledger;
pub mod submitter;
pub mod x12;

pub use config::OracleConfig;
pub use error::{ErrorKind, PipelineError};
pub use ledger::{OracleLedger, TransactionId};
pub use params::{DocumentKind, OracleParams};
pub use pipeline::{EdiOraclePipeline, PreparedDocument};
pub use record::CanonicalRecord;
pub use registry::{FieldMap, FieldMapRegistry};
pub use signer::{Credential, MnemonicSigner, Signer};
pub use sled_ledger::SledLedger;
