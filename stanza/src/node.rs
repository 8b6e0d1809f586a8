// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The attributed tree every stanza is built from.

use core::fmt;

use log::warn;
use minidom::Element;

use crate::Error;

/// One node of a stanza tree.
///
/// A node has a name, an ordered list of attributes whose keys are unique,
/// an ordered list of children it owns, and an optional text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StanzaNode {
    name: String,
    value: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<StanzaNode>,
    raw_mode: bool,
}

impl StanzaNode {
    /// Create an empty node called `name`.
    pub fn new<N: Into<String>>(name: N) -> StanzaNode {
        StanzaNode {
            name: name.into(),
            value: None,
            attributes: Vec::new(),
            children: Vec::new(),
            raw_mode: false,
        }
    }

    /// Builder-style helper setting the text value.
    pub fn with_value<V: Into<String>>(mut self, value: V) -> StanzaNode {
        self.value = Some(value.into());
        self
    }

    /// Builder-style helper setting an attribute.
    pub fn with_attribute<K: Into<String>, V: Into<String>>(
        mut self,
        name: K,
        value: V,
    ) -> StanzaNode {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style helper appending a child.
    pub fn with_child(mut self, child: StanzaNode) -> StanzaNode {
        self.children.push(child);
        self
    }

    /// The element name, e.g. `message` or `stream:error`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The text value, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Replace the text value. `None` clears it.
    pub fn set_value<V: Into<String>>(&mut self, value: Option<V>) {
        self.value = value.map(Into::into);
    }

    /// Whether the text value is serialised as markup instead of text.
    pub fn raw_mode(&self) -> bool {
        self.raw_mode
    }

    /// Serialise the text value as markup, for payloads such as XHTML bodies
    /// that already are a well-formed fragment.
    pub fn set_raw_mode(&mut self, raw_mode: bool) {
        self.raw_mode = raw_mode;
    }

    /// Look an attribute up by key.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute. An existing key keeps its position and gets the new
    /// value, a new key goes at the end.
    pub fn set_attribute<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Remove an attribute, returning its former value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// Iterate over `(key, value)` pairs in order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// The direct children, in document order.
    pub fn children(&self) -> &[StanzaNode] {
        &self.children
    }

    /// Append a new child called `name` and return it.
    pub fn add_child<N: Into<String>>(
        &mut self,
        name: N,
        value: Option<&str>,
    ) -> &mut StanzaNode {
        let mut child = StanzaNode::new(name);
        child.set_value(value);
        self.append_child(child)
    }

    /// Append an existing node as the last child and return it.
    pub fn append_child(&mut self, child: StanzaNode) -> &mut StanzaNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// First direct child called `name`.
    pub fn child(&self, name: &str) -> Option<&StanzaNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Mutable variant of [`child`][`Self::child`].
    pub fn child_mut(&mut self, name: &str) -> Option<&mut StanzaNode> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    /// Search all descendants in pre-order: each child is checked before
    /// its own subtree, and a subtree is exhausted before the next sibling.
    pub fn find_child(&self, name: &str) -> Option<&StanzaNode> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_child(name) {
                return Some(found);
            }
        }
        None
    }

    /// Mutable variant of [`find_child`][`Self::find_child`].
    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut StanzaNode> {
        let path = self.find_path(name)?;
        let mut node = self;
        for index in path {
            node = &mut node.children[index];
        }
        Some(node)
    }

    fn find_path(&self, name: &str) -> Option<Vec<usize>> {
        for (index, child) in self.children.iter().enumerate() {
            if child.name == name {
                return Some(vec![index]);
            }
            if let Some(mut rest) = child.find_path(name) {
                rest.insert(0, index);
                return Some(rest);
            }
        }
        None
    }
}

/// Namespace of a root node that carries no `xmlns` attribute.
pub const DEFAULT_NS: &str = "jabber:client";

/// Namespace bound to the `stream` prefix unless a node rebinds it with an
/// `xmlns:stream` attribute.
pub const STREAM_NS: &str = "http://etherx.jabber.org/streams";

// Bound to the `xml` and `xmlns` prefixes, never declarable.
const RESERVED_NS: [&str; 2] = [
    "http://www.w3.org/XML/1998/namespace",
    "http://www.w3.org/2000/xmlns/",
];

#[derive(Clone)]
struct Scope<'a> {
    default_ns: &'a str,
    prefixes: Vec<(&'a str, &'a str)>,
}

impl<'a> Scope<'a> {
    fn lookup(&self, prefix: &str) -> Option<&'a str> {
        self.prefixes
            .iter()
            .rev()
            .find(|(declared, _)| *declared == prefix)
            .map(|(_, ns)| *ns)
    }
}

fn split_name(name: &str) -> Result<(Option<&str>, &str), Error> {
    let invalid = || Error::InvalidName(name.to_owned());
    let checked = <&rxml::NameStr>::try_from(name).map_err(|_| invalid())?;
    let (prefix, local) = checked.split_name().map_err(|_| invalid())?;
    Ok((prefix.map(|prefix| prefix.as_str()), local.as_str()))
}

fn build<'a>(node: &'a StanzaNode, parent: &Scope<'a>) -> Result<Element, Error> {
    let mut scope = parent.clone();
    let mut declared = Vec::new();
    for (key, value) in &node.attributes {
        let reserved = value == RESERVED_NS[0] || value == RESERVED_NS[1];
        if key == "xmlns" {
            if reserved {
                return Err(Error::InvalidName(key.clone()));
            }
            scope.default_ns = value.as_str();
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            if reserved || prefix == "xml" || prefix == "xmlns" {
                return Err(Error::InvalidName(key.clone()));
            }
            <&rxml::NcNameStr>::try_from(prefix).map_err(|_| Error::InvalidName(key.clone()))?;
            scope.prefixes.push((prefix, value.as_str()));
            declared.push((prefix, value.as_str()));
        }
    }

    let (prefix, local) = split_name(&node.name)?;
    let ns = match prefix {
        None => scope.default_ns,
        Some(prefix) => match scope.lookup(prefix) {
            Some(ns) => ns,
            None if prefix == "stream" => {
                scope.prefixes.push((prefix, STREAM_NS));
                declared.push((prefix, STREAM_NS));
                STREAM_NS
            }
            None => return Err(Error::InvalidName(node.name.clone())),
        },
    };

    let mut builder = Element::builder(local, ns);
    for (prefix, ns) in declared {
        builder = builder.prefix(Some(prefix.to_owned()), ns)?;
    }
    for (key, value) in &node.attributes {
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        split_name(key)?;
        builder = builder.attr(key.as_str(), value.as_str());
    }
    if let Some(value) = &node.value {
        if node.raw_mode {
            // The payload must be a well-formed fragment; prefixes it uses
            // have to be declared inside it.
            let wrapped = format!("<raw>{}</raw>", value);
            let mut fragment = Element::from_reader_with_prefixes(
                wrapped.as_bytes(),
                scope.default_ns.to_owned(),
            )?;
            builder = builder.append_all(fragment.take_nodes());
        } else {
            builder = builder.append(value.as_str());
        }
    }
    for child in &node.children {
        builder = builder.append(build(child, &scope)?);
    }
    Ok(builder.build())
}

impl StanzaNode {
    /// Convert this subtree into a minidom element.
    ///
    /// The namespace of each node is its `xmlns` attribute, else its
    /// parent's, else [`DEFAULT_NS`] at the root. `xmlns:prefix` attributes
    /// become prefix declarations, and a `stream:` name is bound to
    /// [`STREAM_NS`] when no ancestor declared that prefix. In raw mode the
    /// text value is parsed as a markup fragment in the node's namespace.
    pub fn to_element(&self) -> Result<Element, Error> {
        let root = Scope {
            default_ns: DEFAULT_NS,
            prefixes: Vec::new(),
        };
        build(self, &root)
    }

    /// Serialise this subtree as XML.
    ///
    /// Element names and attribute keys must be valid XML names. minidom
    /// escapes attribute values and text, and writes attributes sorted by
    /// key.
    pub fn to_xml(&self) -> Result<String, Error> {
        let mut buffer = Vec::new();
        self.to_element()?.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Same output as [`StanzaNode::to_xml`]. A node that cannot be serialised
/// makes formatting fail, so `to_string()` panics on it.
impl fmt::Display for StanzaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_xml() {
            Ok(xml) => f.write_str(&xml),
            Err(e) => {
                warn!("Cannot serialise <{}>: {}", self.name, e);
                Err(fmt::Error)
            }
        }
    }
}

fn convert(element: &Element, parent_ns: Option<&str>) -> StanzaNode {
    let mut node = StanzaNode::new(element.name());
    let ns = element.ns();
    if parent_ns != Some(ns.as_str()) {
        node.set_attribute("xmlns", ns.as_str());
    }
    for (key, value) in element.attrs() {
        node.set_attribute(key, value);
    }
    let text = element.text();
    if !text.trim().is_empty() {
        node.value = Some(text);
    }
    for child in element.children() {
        node.children.push(convert(child, Some(ns.as_str())));
    }
    node
}

/// Ingest a tree parsed by minidom, e.g. by a stream engine built on it.
///
/// The root namespace becomes an `xmlns` attribute, as does the namespace
/// of any child that differs from its parent's.
///
/// A node holds a single text value, so mixed content is flattened: the
/// direct text pieces of an element are joined into its value, which is
/// serialised ahead of the children. `<body>a<b/>c</body>` comes back as
/// `<body>ac<b/></body>`.
impl From<&Element> for StanzaNode {
    fn from(element: &Element) -> StanzaNode {
        convert(element, None)
    }
}
