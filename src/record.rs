//! Canonical record extraction
use super::error::{ParseError, PipelineError};
use super::registry::FieldMap;
use super::x12::{Interchange, Transaction};
use serde::Serialize;
use std::collections::BTreeMap;

/// Business fields pulled out of one interchange, keyed by canonical field name. A mapped field
/// that the document does not carry is present with a `None` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    pub doc_type: String,
    fields: BTreeMap<String, Option<String>>,
    #[serde(skip)]
    transactions_seen: usize,
}

impl CanonicalRecord {
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            fields: BTreeMap::new(),
            transactions_seen: 1,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.fields.insert(name.into(), value.map(str::to_string));
        self
    }

    /// The extracted value, `None` when the field is unmapped or the document lacks it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    pub fn is_mapped(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn transactions_seen(&self) -> usize {
        self.transactions_seen
    }

    /// Transactions present in the interchange that did not contribute to this record.
    pub fn discarded_transactions(&self) -> usize {
        self.transactions_seen.saturating_sub(1)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| {
                    let value = value
                        .clone()
                        .map_or(serde_json::Value::Null, serde_json::Value::String);
                    (name.clone(), value)
                })
                .collect(),
        )
    }
}

fn extract(transaction: &Transaction, field_map: &FieldMap) -> BTreeMap<String, Option<String>> {
    field_map
        .fields()
        .map(|(name, path)| {
            let mut values = transaction.query(path).into_iter();
            let first = values.next();
            let extra = values.count();
            if extra > 0 {
                tracing::debug!(
                    field = name,
                    path = %path,
                    extra,
                    "Path matched several values, keeping the first"
                );
            }
            (name.to_string(), first)
        })
        .collect()
}

/// Apply `field_map` to every transaction of the interchange and keep the first result.
pub fn build_record(
    interchange: &Interchange,
    field_map: &FieldMap,
) -> Result<CanonicalRecord, PipelineError> {
    let mut extracted = interchange
        .transactions()
        .map(|(_, _, txn)| extract(txn, field_map));

    let fields = extracted
        .next()
        .ok_or(PipelineError::MalformedDocument(ParseError::NoTransactions))?;
    let transactions_seen = 1 + extracted.count();

    if transactions_seen > 1 {
        tracing::warn!(
            doc_type = %field_map.doc_type,
            discarded = transactions_seen - 1,
            "Interchange carries several transactions, only the first is recorded"
        );
    }

    Ok(CanonicalRecord {
        doc_type: field_map.doc_type.clone(),
        fields,
        transactions_seen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::PathExpr;
    use crate::x12::{DocumentParser, X12Parser};

    const ISA: &str = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *230430*1200*U*00401*000000001*0*P*>~";

    fn po_map() -> FieldMap {
        FieldMap::new("850")
            .with_field("poNumber", "BEG03".parse::<PathExpr>().unwrap())
            .with_field("quantity", "PO102".parse::<PathExpr>().unwrap())
            .with_field("releaseNumber", "BEG04".parse::<PathExpr>().unwrap())
    }

    fn parse(body: &str) -> Interchange {
        X12Parser
            .parse(format!("{ISA}{body}IEA*1*000000001~").as_bytes())
            .unwrap()
    }

    #[test]
    fn missing_values_are_none() {
        let interchange = parse("GS*PO~ST*850*1~BEG*00*SA*PO1~PO1*1*5*EA~SE*4*1~GE*1*1~");
        let record = build_record(&interchange, &po_map()).unwrap();

        assert_eq!(record.get("poNumber"), Some("PO1"));
        assert_eq!(record.get("quantity"), Some("5"));
        assert!(record.is_mapped("releaseNumber"));
        assert_eq!(record.get("releaseNumber"), None);
        assert!(!record.is_mapped("invoiceQty"));
        assert_eq!(record.discarded_transactions(), 0);
    }

    #[test]
    fn only_the_first_transaction_is_kept() {
        let interchange = parse(
            "GS*PO~ST*850*1~BEG*00*SA*PO1~SE*3*1~ST*850*2~BEG*00*SA*PO2~SE*3*2~GE*2*1~\
             GS*PO~ST*850*3~BEG*00*SA*PO3~SE*3*3~GE*1*2~",
        );
        let record = build_record(&interchange, &po_map()).unwrap();

        assert_eq!(record.get("poNumber"), Some("PO1"));
        assert_eq!(record.transactions_seen(), 3);
        assert_eq!(record.discarded_transactions(), 2);
    }

    #[test]
    fn repeated_segments_keep_the_first_value() {
        let interchange =
            parse("GS*PO~ST*850*1~BEG*00*SA*PO1~PO1*1*5*EA~PO1*2*7*EA~SE*5*1~GE*1*1~");
        let record = build_record(&interchange, &po_map()).unwrap();

        assert_eq!(record.get("quantity"), Some("5"));
    }

    #[test]
    fn interchange_without_transactions_is_malformed() {
        let interchange = X12Parser
            .parse(format!("{ISA}IEA*0*000000001~").as_bytes())
            .unwrap();

        assert!(matches!(
            build_record(&interchange, &po_map()),
            Err(PipelineError::MalformedDocument(ParseError::NoTransactions))
        ));
    }

    #[test]
    fn json_export_uses_null_for_missing_fields() {
        let record = CanonicalRecord::new("850")
            .with_field("poNumber", Some("PO1"))
            .with_field("releaseNumber", None);

        assert_eq!(
            record.to_json(),
            serde_json::json!({ "poNumber": "PO1", "releaseNumber": null })
        );
    }
}
