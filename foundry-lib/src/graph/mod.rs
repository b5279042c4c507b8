//! In-memory graph fragments.
//!
//! One `Graph` holds the assertions produced for exactly one record (or one
//! controlled vocabulary block). Triples keep insertion order and adding a
//! triple that is already present is a no-op.

mod turtle;

pub use turtle::TurtleSerializer;

use std::collections::HashSet;
use std::fmt;

/// Object (or, for inverse edges, subject) of an assertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(String),
    Literal { value: String, datatype: String },
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: datatype.into(),
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Literal { value, datatype } => write!(f, "{:?}^^<{}>", value, datatype),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an assertion. Returns `false` if it was already present.
    pub fn add(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    pub fn add_triple(&mut self, subject: Term, predicate: impl Into<String>, object: Term) -> bool {
        self.add(Triple::new(subject, predicate, object))
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.seen.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Triples sorted by subject, predicate, object.
    pub fn sorted(&self) -> Vec<&Triple> {
        let mut triples: Vec<&Triple> = self.triples.iter().collect();
        triples.sort();
        triples
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Term> {
        self.triples.iter().map(|t| &t.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_triples_are_ignored() {
        let mut graph = Graph::new();
        let s = Term::iri("http://example.org/a");
        let o = Term::typed("5.6", "http://www.w3.org/2001/XMLSchema#decimal");
        assert!(graph.add_triple(s.clone(), "http://example.org/p", o.clone()));
        assert!(!graph.add_triple(s.clone(), "http://example.org/p", o.clone()));
        assert_eq!(graph.len(), 1);
        assert!(graph.contains(&Triple::new(s, "http://example.org/p", o)));
    }

    #[test]
    fn test_sorted_is_independent_of_insertion_order() {
        let mut first = Graph::new();
        let mut second = Graph::new();
        let a = Triple::new(Term::iri("urn:a"), "urn:p", Term::iri("urn:b"));
        let b = Triple::new(Term::iri("urn:b"), "urn:p", Term::iri("urn:a"));
        first.add(a.clone());
        first.add(b.clone());
        second.add(b);
        second.add(a);
        assert_eq!(first.sorted(), second.sorted());
        assert_ne!(first.triples(), second.triples());
    }
}
