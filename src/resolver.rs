//! Transaction set code lookup
use super::error::PipelineError;
use super::query::PathExpr;
use super::x12::Interchange;

/// The transaction set identifier code (ST01), e.g. `850` for a purchase order.
pub fn resolve_doc_type(interchange: &Interchange) -> Result<String, PipelineError> {
    let path = PathExpr::element("ST", 1);

    interchange
        .query(&path)
        .into_iter()
        .next()
        .map(|found| found.value)
        .ok_or(PipelineError::NoDocTypeFound)
}
