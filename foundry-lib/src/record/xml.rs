//! Minimal element tree for hierarchical input.
//!
//! Only element names, their leading text and their children are kept;
//! attributes, comments and processing instructions are dropped. Names are
//! kept as written, so a prefixed element `dc:title` matches the path step
//! `dc:title`.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ProcessorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    /// Text before the first child element, if any.
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn parse(contents: &str) -> Result<Self, ProcessorError> {
        let mut reader = Reader::from_str(contents);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    stack.push(XmlElement::new(name));
                }
                Event::Empty(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    attach(&mut stack, &mut root, XmlElement::new(name));
                }
                Event::End(ref e) => {
                    let element = stack.pop().ok_or_else(|| {
                        ProcessorError::Xml(format!(
                            "Unexpected closing tag </{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        ))
                    })?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(ref e) => {
                    let text = e
                        .unescape()
                        .map_err(|err| ProcessorError::Xml(err.to_string()))?;
                    push_text(&mut stack, &text);
                }
                Event::CData(ref e) => {
                    let text = String::from_utf8_lossy(e).to_string();
                    push_text(&mut stack, &text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ProcessorError::Xml(format!(
                "Unclosed element <{}>",
                open.name
            )));
        }
        root.ok_or_else(|| ProcessorError::Xml("Document has no root element".into()))
    }

    /// Elements reached from `self` by a slash-delimited path of child tag
    /// names. `*` matches any child. Empty steps are skipped.
    pub fn find_all(&self, path: &str) -> Vec<&XmlElement> {
        let mut elements = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            elements = elements
                .into_iter()
                .flat_map(|e| e.children.iter())
                .filter(|child| step == "*" || child.name == step)
                .collect();
            if elements.is_empty() {
                break;
            }
        }
        elements
    }

    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        self.find_all(path).into_iter().next()
    }

    /// Trimmed, non-empty text of every element matching `path`, in document order.
    pub fn find_texts(&self, path: &str) -> Vec<String> {
        self.find_all(path)
            .into_iter()
            .filter_map(|e| e.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn push_text(stack: &mut [XmlElement], text: &str) {
    if let Some(current) = stack.last_mut() {
        if current.children.is_empty() {
            current
                .text
                .get_or_insert_with(String::new)
                .push_str(text);
        }
    }
}
