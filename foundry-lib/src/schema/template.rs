pub const BASIC_MAPPING: &str = r#"# Root mapping - applied to every record of the data file
root:
  # Identifier stem; bare names resolve in the <prefix>-r namespace
  uri: ex-r:Event
  # Record fields appended (percent-encoded) to make the identifier unique
  varids:
    - id
  # Class of the minted node (a single name or a list)
  type: ex-ont:Event
  connections:
    # A literal value read from the record
    - p: ex-ont:hasName
      o:
        datatype: xsd:string
        val_source: name
"#;

pub const FULL_MAPPING: &str = r#"# Root mapping - applied to every record of the data file
root:
  # Identifier stem; bare names resolve in the <prefix>-r namespace
  uri: ex-r:Event
  # Record fields appended (percent-encoded) to make the identifier unique
  varids:
    - id
  # Optional suffix appended after the varids
  appellation: event
  # A single class or a list of classes
  type:
    - ex-ont:Event
    - sosa:FeatureOfInterest
  connections:
    # Literal read from the record; 'val_source' may be a slash path for XML
    - p: ex-ont:hasMagnitude
      o:
        datatype: xsd:decimal
        val_source: mag
    # Literal embedded in the mapping
    - p: ex-ont:hasSource
      o:
        datatype: xsd:string
        value: USGS
    # Nested node; 'inv' adds one reverse edge from the child back to this node
    - p:
        - ex-ont:locatedIn
        - geo:sfWithin
      inv: ex-ont:locationOf
      o:
        uri: ex-r:Place
        varids:
          - place_id
        type: ex-ont:Place
    # A reference to an identifier minted elsewhere (e.g. a controlled vocabulary)
    - p: ex-ont:hasCategory
      o: ex-r:Category.Earthquake
    # A node with no type; 'ref: true' silences the untyped-instance warning
    - p: ex-ont:reportedBy
      o:
        uri: ex-r:Agency
        varids:
          - agency
        ref: true

# Controlled vocabularies - emitted once per data file, independent of records
cvs:
  - type: ex-ont:Category
    uri: ex-r:Category
    instances:
      - Earthquake
      - Aftershock
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::NamespaceTable;
    use crate::schema::MappingSchema;

    #[test]
    fn test_templates_are_valid_mappings() {
        let namespaces = NamespaceTable::new("https://example.org/", "ex").unwrap();
        for template in [BASIC_MAPPING, FULL_MAPPING] {
            let schema = MappingSchema::from_yaml_str(template).unwrap();
            schema.validate(&namespaces).unwrap();
        }
    }
}
