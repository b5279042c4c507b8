use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::{Record, XmlElement};
use crate::schema::MappingNode;

/// Flattens an XML document into the flat records a mapping expects.
///
/// The field vocabulary is discovered from the mapping: every `varids` entry
/// becomes a single-valued field read from the document root (empty when
/// absent), and every `val_source` becomes a path whose matching leaf texts
/// are the field's candidate values.
pub struct RecordNormalizer {
    varid_fields: BTreeSet<String>,
    val_source_fields: BTreeSet<String>,
}

impl RecordNormalizer {
    pub fn new(root: &MappingNode) -> Self {
        let varid_fields = root.varid_fields();
        let val_source_fields = root.val_source_fields();
        tracing::debug!(
            "Discovered varids {:?} and val_sources {:?}",
            varid_fields,
            val_source_fields
        );
        Self {
            varid_fields,
            val_source_fields,
        }
    }

    pub fn varid_fields(&self) -> &BTreeSet<String> {
        &self.varid_fields
    }

    pub fn val_source_fields(&self) -> &BTreeSet<String> {
        &self.val_source_fields
    }

    pub fn normalize(&self, document: &XmlElement) -> Vec<Record> {
        let mut base = Record::new();
        for varid in &self.varid_fields {
            let value = document
                .find(varid)
                .and_then(|e| e.text.as_deref())
                .map(str::trim)
                .unwrap_or("");
            base.insert(varid.as_str(), value);
        }

        let mut candidates = BTreeMap::new();
        for val_source in &self.val_source_fields {
            let mut seen = HashSet::new();
            let values: Vec<String> = document
                .find_texts(val_source)
                .into_iter()
                .filter(|v| seen.insert(v.clone()))
                .collect();
            if values.is_empty() {
                tracing::debug!("No values found at '{}'", val_source);
            }
            candidates.insert(val_source.clone(), values);
        }

        expand_records(base, &candidates)
    }
}

/// Build the base record from the first candidate of every field, then one
/// extra record per additional candidate, varying that single field.
///
/// Fields are visited in key order. With `k` multi-valued fields of `n_i`
/// candidates this yields `1 + Σ(n_i - 1)` records rather than the full
/// cross product; records that duplicate an earlier one are dropped.
pub fn expand_records(
    mut base: Record,
    candidates: &BTreeMap<String, Vec<String>>,
) -> Vec<Record> {
    for (field, values) in candidates {
        base.insert(
            field.as_str(),
            values.first().map(String::as_str).unwrap_or(""),
        );
    }

    let mut seen: HashSet<Record> = HashSet::new();
    seen.insert(base.clone());
    let mut records = vec![base.clone()];

    for (field, values) in candidates {
        for extra in values.iter().skip(1) {
            let mut record = base.clone();
            record.insert(field.as_str(), extra.as_str());
            if seen.insert(record.clone()) {
                records.push(record);
            }
        }
    }

    tracing::debug!("Expanded document into {} records", records.len());
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingState;
    use serde_json::json;

    fn mapping() -> MappingNode {
        MappingNode::from_value(
            &json!({
                "uri": "Publication",
                "varids": ["ID"],
                "type": "kwg-ont:Publication",
                "connections": [
                    {"p": "dcterms:title", "o": {"datatype": "xsd:string", "val_source": "Title"}},
                    {"p": "dcterms:creator", "o": {
                        "uri": "Author",
                        "varids": ["Authors/Author"],
                        "connections": [
                            {"p": "kwg-ont:hasName", "o": {"datatype": "xsd:string", "val_source": "Authors/Author"}}
                        ]
                    }},
                    {"p": "kwg-ont:hasKeyword", "o": {"datatype": "xsd:string", "val_source": "Keywords/Keyword"}},
                    {"p": "kwg-ont:hasEditor", "o": {"datatype": "xsd:string", "val_source": "Editor"}},
                ]
            }),
            "root",
            &mut ProcessingState::new(),
        )
        .unwrap()
    }

    const DOC: &str = r#"<Record>
  <ID>42</ID>
  <Title>  Seismic hazard  </Title>
  <Authors><Author>Smith</Author><Author>Jones</Author><Author>Smith</Author></Authors>
  <Keywords><Keyword>earthquake</Keyword><Keyword> </Keyword><Keyword>hazard</Keyword><Keyword>risk</Keyword></Keywords>
</Record>"#;

    #[test]
    fn test_base_record_takes_first_values() {
        let document = XmlElement::parse(DOC).unwrap();
        let records = RecordNormalizer::new(&mapping()).normalize(&document);
        let base = &records[0];
        assert_eq!(base.get("ID"), Some("42"));
        assert_eq!(base.get("Title"), Some("Seismic hazard"));
        assert_eq!(base.get("Authors/Author"), Some("Smith"));
        assert_eq!(base.get("Keywords/Keyword"), Some("earthquake"));
        // Missing paths normalize to empty strings rather than failing.
        assert_eq!(base.get("Editor"), Some(""));
    }

    #[test]
    fn test_expansion_varies_one_field_at_a_time() {
        let document = XmlElement::parse(DOC).unwrap();
        let records = RecordNormalizer::new(&mapping()).normalize(&document);

        // Authors: 2 distinct values, keywords: 3 distinct values -> 1 + 1 + 2.
        assert_eq!(records.len(), 4);
        let pairs: Vec<(&str, &str)> = records
            .iter()
            .map(|r| {
                (
                    r.get("Authors/Author").unwrap_or_default(),
                    r.get("Keywords/Keyword").unwrap_or_default(),
                )
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Smith", "earthquake"),
                ("Jones", "earthquake"),
                ("Smith", "hazard"),
                ("Smith", "risk"),
            ]
        );
        // Never the full cross product.
        assert!(!pairs.contains(&("Jones", "hazard")));
    }

    #[test]
    fn test_expansion_count_is_bounded() {
        let candidates: BTreeMap<String, Vec<String>> = [
            ("a", vec!["1", "2", "3"]),
            ("b", vec!["x", "y"]),
            ("c", vec!["only"]),
            ("d", vec![]),
            ("e", vec!["p", "q", "r", "s"]),
        ]
        .into_iter()
        .map(|(k, vs)| (k.to_string(), vs.into_iter().map(str::to_string).collect()))
        .collect();

        let records = expand_records(Record::new(), &candidates);
        assert_eq!(records.len(), 1 + (3 - 1) + (2 - 1) + (1 - 1) + (4 - 1));
        assert!(records.iter().all(|r| r.get("d") == Some("")));
        let unique: HashSet<&Record> = records.iter().collect();
        assert_eq!(unique.len(), records.len());
    }

    #[test]
    fn test_val_source_overrides_varid_of_same_name() {
        let document = XmlElement::parse(DOC).unwrap();
        let normalizer = RecordNormalizer::new(&mapping());
        assert!(normalizer.varid_fields().contains("Authors/Author"));
        assert!(normalizer.val_source_fields().contains("Authors/Author"));
        let records = normalizer.normalize(&document);
        assert_eq!(records[1].get("Authors/Author"), Some("Jones"));
    }
}
