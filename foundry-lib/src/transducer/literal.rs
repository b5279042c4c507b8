use crate::error::ProcessorError;
use crate::graph::Term;
use crate::namespace::NamespaceTable;
use crate::record::Record;
use crate::schema::DatatypeNode;

/// Interpret `node` as a typed literal for `record`.
///
/// The node only acts as a literal when the record's `val_source` field is
/// non-empty or the embedded `value` is truthy. When that guard holds, the
/// record field wins whenever the record carries it, otherwise the constant
/// is used. `Ok(None)` means the guard rejected the node and the caller has to
/// fall back to a resource interpretation.
pub fn build_literal(
    node: &DatatypeNode,
    record: &Record,
    namespaces: &NamespaceTable,
) -> Result<Option<Term>, ProcessorError> {
    let from_record = node
        .val_source
        .as_deref()
        .and_then(|field| record.get(field));
    let constant = node.value.as_ref();

    let guard =
        from_record.is_some_and(|v| !v.is_empty()) || constant.is_some_and(|c| c.is_truthy());
    if !guard {
        return Ok(None);
    }

    let lexical = match (from_record, constant) {
        (Some(value), _) => value,
        (None, Some(constant)) => constant.as_str(),
        (None, None) => {
            return Err(ProcessorError::MissingLiteralSource {
                datatype: node.datatype.clone(),
            })
        }
    };

    let datatype = namespaces.resolve(&node.datatype)?;
    Ok(Some(Term::typed(lexical, datatype)))
}
