use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::ProcessorError;
use crate::graph::{Graph, Term, Triple};
use crate::namespace::{NamespaceTable, RDF_TYPE};

/// Writes graph fragments as Turtle, abbreviating identifiers with the
/// prefixes of the namespace table.
pub struct TurtleSerializer<'a> {
    namespaces: &'a NamespaceTable,
}

impl<'a> TurtleSerializer<'a> {
    pub fn new(namespaces: &'a NamespaceTable) -> Self {
        Self { namespaces }
    }

    pub fn serialize(&self, graph: &Graph) -> String {
        let mut used_prefixes = BTreeSet::new();
        let mut body = String::new();

        let mut triples = graph.sorted();
        // Subject blocks stay sorted; within a block rdf:type comes first.
        triples.sort_by(|a, b| {
            (&a.subject, a.predicate != RDF_TYPE, &a.predicate, &a.object).cmp(&(
                &b.subject,
                b.predicate != RDF_TYPE,
                &b.predicate,
                &b.object,
            ))
        });

        let mut blocks: Vec<(&Term, Vec<&Triple>)> = Vec::new();
        for triple in triples {
            match blocks.last_mut() {
                Some((subject, group)) if *subject == &triple.subject => group.push(triple),
                _ => blocks.push((&triple.subject, vec![triple])),
            }
        }

        for (subject, group) in blocks {
            if subject.is_literal() {
                tracing::warn!(
                    "Literal {} used as a subject; the fragment is not valid Turtle",
                    subject
                );
            }
            body.push_str(&self.render_term(subject, &mut used_prefixes));

            let mut predicates: Vec<(&str, Vec<&Term>)> = Vec::new();
            for triple in group {
                match predicates.last_mut() {
                    Some((predicate, objects)) if *predicate == triple.predicate => {
                        objects.push(&triple.object)
                    }
                    _ => predicates.push((triple.predicate.as_str(), vec![&triple.object])),
                }
            }

            let last = predicates.len().saturating_sub(1);
            for (i, (predicate, objects)) in predicates.into_iter().enumerate() {
                let predicate = if predicate == RDF_TYPE {
                    "a".to_string()
                } else {
                    self.render_iri(predicate, &mut used_prefixes)
                };
                let objects = objects
                    .into_iter()
                    .map(|o| self.render_term(o, &mut used_prefixes))
                    .collect::<Vec<_>>()
                    .join(",\n        ");
                let separator = if i == last { " ." } else { " ;" };
                if i == 0 {
                    body.push_str(&format!(" {} {}{}\n", predicate, objects, separator));
                } else {
                    body.push_str(&format!("    {} {}{}\n", predicate, objects, separator));
                }
            }
            body.push('\n');
        }

        let mut output = String::new();
        for prefix in &used_prefixes {
            if let Some(namespace) = self.namespaces.namespace(prefix) {
                output.push_str(&format!("@prefix {}: <{}> .\n", prefix, namespace));
            }
        }
        if !used_prefixes.is_empty() {
            output.push('\n');
        }
        output.push_str(&body);
        output
    }

    pub async fn save_fragment(
        &self,
        graph: &Graph,
        output_dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, ProcessorError> {
        let turtle = self.serialize(graph);

        tokio::fs::create_dir_all(output_dir).await?;
        let output_path = output_dir.join(file_name);
        tokio::fs::write(&output_path, turtle).await?;

        tracing::info!(
            "Serialized {} triples to {}",
            graph.len(),
            output_path.display()
        );
        Ok(output_path)
    }

    fn render_term(&self, term: &Term, used_prefixes: &mut BTreeSet<String>) -> String {
        match term {
            Term::Iri(iri) => self.render_iri(iri, used_prefixes),
            Term::Literal { value, datatype } => format!(
                "\"{}\"^^{}",
                escape_turtle_string(value),
                self.render_iri(datatype, used_prefixes)
            ),
        }
    }

    fn render_iri(&self, iri: &str, used_prefixes: &mut BTreeSet<String>) -> String {
        let compacted = self
            .namespaces
            .compact(iri)
            .and_then(|(prefix, local)| Some((prefix, turtle_local_name(local)?)));
        match compacted {
            Some((prefix, local)) => {
                used_prefixes.insert(prefix.to_string());
                format!("{}:{}", prefix, local)
            }
            None => format!("<{}>", iri),
        }
    }
}

/// Render `local` as a Turtle PN_LOCAL, or `None` when it cannot be written
/// as a prefixed name. A leading `.` or `-` and a trailing `.` are escaped.
fn turtle_local_name(local: &str) -> Option<String> {
    let bytes = local.as_bytes();
    let last = local.char_indices().last().map(|(idx, _)| idx);
    let mut out = String::with_capacity(local.len() + 2);
    for (idx, c) in local.char_indices() {
        match c {
            '%' => {
                let hex_ok = bytes.get(idx + 1).is_some_and(u8::is_ascii_hexdigit)
                    && bytes.get(idx + 2).is_some_and(u8::is_ascii_hexdigit);
                if !hex_ok {
                    return None;
                }
                out.push(c);
            }
            '.' | '-' if idx == 0 => {
                out.push('\\');
                out.push(c);
            }
            '.' if Some(idx) == last => out.push_str("\\."),
            '.' | ':' => out.push(c),
            c if is_pn_chars(c) => out.push(c),
            _ => return None,
        }
    }
    Some(out)
}

fn is_pn_chars_base(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | 'a'..='z'
        | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{02FF}'
        | '\u{0370}'..='\u{037D}'
        | '\u{037F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_pn_chars(c: char) -> bool {
    is_pn_chars_base(c)
        || matches!(c,
            '_' | '-' | '0'..='9' | '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

fn escape_turtle_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
