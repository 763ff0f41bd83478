//! Oracle call parameters derived from a canonical record
use super::error::PipelineError;
use super::record::CanonicalRecord;

pub const PO_NUMBER: &str = "poNumber";
pub const ITEM_NUMBER: &str = "itemNumber";

/// Where a document sits in the order lifecycle. Each kind maps to exactly one status code and
/// one quantity field; anything else falls through to `Unsupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PurchaseOrder,
    ShipNotice,
    Invoice,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleParams {
    pub key: String, // doc type code followed by the PO number
    pub doc_type: u16,
    pub reference: String,
    pub item_code: String,
    pub item_qty: u64,
    pub status: i8,
}

impl DocumentKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "850" => DocumentKind::PurchaseOrder,
            "856" => DocumentKind::ShipNotice,
            "810" => DocumentKind::Invoice,
            _ => DocumentKind::Unsupported,
        }
    }

    pub fn status(self) -> i8 {
        match self {
            DocumentKind::Invoice => 0,
            DocumentKind::PurchaseOrder => 1,
            DocumentKind::ShipNotice => 2,
            DocumentKind::Unsupported => -1,
        }
    }

    /// Canonical field holding the line quantity for this kind of document.
    pub fn quantity_field(self) -> Option<&'static str> {
        match self {
            DocumentKind::PurchaseOrder => Some("quantity"),
            DocumentKind::ShipNotice => Some("shippedQty"),
            DocumentKind::Invoice => Some("invoiceQty"),
            DocumentKind::Unsupported => None,
        }
    }
}

fn required<'a>(
    record: &'a CanonicalRecord,
    doc_type: &str,
    field: &str,
) -> Result<&'a str, PipelineError> {
    record
        .get(field)
        .ok_or_else(|| PipelineError::MissingField {
            doc_type: doc_type.to_string(),
            field: field.to_string(),
        })
}

fn quantity(record: &CanonicalRecord, doc_type: &str, field: &str) -> Result<u64, PipelineError> {
    let raw = required(record, doc_type, field)?;
    raw.trim()
        .parse::<u64>()
        .map_err(|_| PipelineError::InvalidQuantity {
            doc_type: doc_type.to_string(),
            field: field.to_string(),
            value: raw.to_string(),
        })
}

pub fn derive_params(
    record: &CanonicalRecord,
    doc_type: &str,
) -> Result<OracleParams, PipelineError> {
    // the default state still needs a numeric code: `doc_type` travels as a uint argument, so a
    // mapped but non-numeric code stops here instead of falling through to status -1
    let code: u16 = doc_type
        .parse()
        .map_err(|_| PipelineError::InvalidDocumentCode(doc_type.to_string()))?;
    let po_number = required(record, doc_type, PO_NUMBER)?;
    let item_number = required(record, doc_type, ITEM_NUMBER)?;

    let kind = DocumentKind::from_code(doc_type);
    let item_qty = match kind.quantity_field() {
        Some(field) => quantity(record, doc_type, field)?,
        None => {
            tracing::warn!(doc_type, "Unsupported document type, recording status -1");
            0
        }
    };

    Ok(OracleParams {
        key: format!("{doc_type}{po_number}"),
        doc_type: code,
        reference: po_number.to_string(),
        item_code: item_number.to_string(),
        item_qty,
        status: kind.status(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(doc_type: &str, qty_field: &str, qty: &str) -> CanonicalRecord {
        CanonicalRecord::new(doc_type)
            .with_field(PO_NUMBER, Some("PO123"))
            .with_field(ITEM_NUMBER, Some("ITEM1"))
            .with_field(qty_field, Some(qty))
    }

    #[test]
    fn status_and_quantity_follow_the_document_kind() {
        // (state, code, quantity field, expected qty, expected status)
        let table = [
            ("ship-notice", "856", "shippedQty", 7, 2),
            ("purchase-order", "850", "quantity", 10, 1),
            ("invoice", "810", "invoiceQty", 3, 0),
            ("unknown-code", "997", "quantity", 0, -1),
        ];

        for (state, code, field, qty, status) in table {
            // the unsupported row still carries a quantity, which must be ignored
            let text = if qty == 0 { "5".to_string() } else { qty.to_string() };
            let rec = record(code, field, &text);
            let params = derive_params(&rec, code).unwrap();

            assert_eq!(params.item_qty, qty, "{state}");
            assert_eq!(params.status, status, "{state}");
            assert_eq!(params.key, format!("{code}PO123"), "{state}");
            assert_eq!(params.reference, "PO123", "{state}");
            assert_eq!(params.item_code, "ITEM1", "{state}");
        }
    }

    #[test]
    fn purchase_order_params() {
        let params = derive_params(&record("850", "quantity", "10"), "850").unwrap();
        assert_eq!(
            params,
            OracleParams {
                key: "850PO123".into(),
                doc_type: 850,
                reference: "PO123".into(),
                item_code: "ITEM1".into(),
                item_qty: 10,
                status: 1,
            }
        );
    }

    #[test]
    fn quantity_from_the_wrong_field_is_ignored() {
        // a ship notice only reads shippedQty
        let rec = record("856", "quantity", "10");
        let err = derive_params(&rec, "856").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingField { ref field, .. } if field == "shippedQty"
        ));
    }

    #[test]
    fn non_numeric_quantity_is_an_error_not_zero() {
        let err = derive_params(&record("850", "quantity", "ten"), "850").unwrap_err();
        match err {
            PipelineError::InvalidQuantity {
                doc_type,
                field,
                value,
            } => {
                assert_eq!(doc_type, "850");
                assert_eq!(field, "quantity");
                assert_eq!(value, "ten");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            derive_params(&record("810", "invoiceQty", "-4"), "810"),
            Err(PipelineError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn unsupported_doc_type_skips_quantity_parsing() {
        let params = derive_params(&record("940", "quantity", "not a number"), "940").unwrap();
        assert_eq!(params.item_qty, 0);
        assert_eq!(params.status, -1);
        assert_eq!(params.doc_type, 940);
    }

    #[test]
    fn missing_po_number_names_the_field() {
        let rec = CanonicalRecord::new("850")
            .with_field(PO_NUMBER, None)
            .with_field(ITEM_NUMBER, Some("ITEM1"));
        let err = derive_params(&rec, "850").unwrap_err();
        assert!(err.to_string().contains("poNumber"));
    }

    #[test]
    fn non_numeric_doc_type_code_is_rejected() {
        let err = derive_params(&record("PO", "quantity", "1"), "PO").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDocumentCode(code) if code == "PO"));
    }

    #[test]
    fn unsupported_non_numeric_code_does_not_take_the_default_state() {
        assert_eq!(DocumentKind::from_code("X12"), DocumentKind::Unsupported);
        let err = derive_params(&record("X12", "quantity", "1"), "X12").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidDocumentCode);
    }
}
