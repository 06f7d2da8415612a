use std::io::{BufReader, Read};

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::SobsError;

// `text` is the character data before the first child, `None` for `<TAG/>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn require_attribute(&self, name: &str) -> Result<&str, SobsError> {
        self.attribute(name)
            .ok_or_else(|| SobsError::MissingAttribute {
                element: self.tag.clone(),
                attribute: name.to_string(),
            })
    }

    // `*` matches any child.
    pub fn find_all<'a>(&'a self, path: &str) -> Vec<&'a Element> {
        let mut current = vec![self];
        for segment in path.split('/') {
            current = current
                .into_iter()
                .flat_map(|element| {
                    element
                        .children
                        .iter()
                        .filter(move |child| segment == "*" || child.tag == segment)
                })
                .collect();
        }
        current
    }

    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    // More than one match is an error.
    pub fn at_most_one(&self, path: &str) -> Result<Option<String>, SobsError> {
        match self.find_all(path).as_slice() {
            [] => Ok(None),
            [element] => Ok(element.text().map(str::to_string)),
            matches => Err(SobsError::AmbiguousField {
                path: path.to_string(),
                count: matches.len(),
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }

    fn from_start(start: &BytesStart<'_>, decoder: Decoder) -> Result<Self, String> {
        let decode = |bytes: &[u8]| {
            decoder
                .decode(bytes)
                .map(|text| text.into_owned())
                .map_err(|err| err.to_string())
        };
        let tag = decode(start.name().as_ref())?;
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| err.to_string())?;
            let key = decode(attribute.key.as_ref())?;
            let value = attribute
                .decode_and_unescape_value(decoder)
                .map_err(|err| err.to_string())?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            tag,
            attributes,
            text: None,
            children: Vec::new(),
        })
    }

    fn push_text(&mut self, text: &str) {
        if !self.children.is_empty() {
            return;
        }
        self.text.get_or_insert_with(String::new).push_str(text);
    }
}

pub fn parse<R: Read>(entry: &str, reader: R) -> Result<Element, SobsError> {
    let fail = |message: String| SobsError::Xml {
        entry: entry.to_string(),
        message,
    };

    let mut reader = Reader::from_reader(BufReader::new(reader));
    let mut buf = Vec::with_capacity(8192);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| fail(err.to_string()))?;

        match event {
            Event::Start(ref start) => {
                stack.push(Element::from_start(start, reader.decoder()).map_err(fail)?);
            }
            Event::Empty(ref start) => {
                let element = Element::from_start(start, reader.decoder()).map_err(fail)?;
                attach(&mut stack, &mut root, element).map_err(fail)?;
            }
            Event::End(ref end) => {
                let element = stack.pop().ok_or_else(|| {
                    fail(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(end.name().as_ref())
                    ))
                })?;
                attach(&mut stack, &mut root, element).map_err(fail)?;
            }
            Event::Text(ref text) => {
                let text = text.unescape().map_err(|err| fail(err.to_string()))?;
                match stack.last_mut() {
                    Some(current) => current.push_text(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(fail(format!("text outside the root element: {text:?}"))),
                }
            }
            Event::CData(ref data) => {
                let text = reader
                    .decoder()
                    .decode(data)
                    .map_err(|err| fail(err.to_string()))?;
                match stack.last_mut() {
                    Some(current) => current.push_text(&text),
                    None => return Err(fail("CDATA outside the root element".to_string())),
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(fail(format!("document ends inside <{}>", open.tag)));
    }
    root.ok_or_else(|| fail("document has no root element".to_string()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(format!("second root element <{}>", element.tag));
    }
    *root = Some(element);
    Ok(())
}
