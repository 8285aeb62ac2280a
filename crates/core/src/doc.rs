// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Thin cursor over roxmltree nodes, plus `derivedFrom` chain resolution.

use roxmltree::{Document, Node};

use crate::{SyncError, SyncResult};

/// An element node with SVD-flavored accessors.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Element<'a, 'input> {
    node: Node<'a, 'input>,
}

impl<'a, 'input> Element<'a, 'input> {
    pub(crate) fn root(document: &'a Document<'input>) -> Element<'a, 'input> {
        Element {
            node: document.root_element(),
        }
    }

    pub(crate) fn tag(&self) -> &'a str {
        self.node.tag_name().name()
    }

    /// Child elements in document order.
    pub(crate) fn children(&self) -> impl Iterator<Item = Element<'a, 'input>> {
        self.node
            .children()
            .filter(Node::is_element)
            .map(|node| Element { node })
    }

    /// First child element with the given tag.
    pub(crate) fn child(&self, tag: &str) -> Option<Element<'a, 'input>> {
        self.children().find(|child| child.tag() == tag)
    }

    /// Trimmed text of the first child with the given tag; empty text
    /// counts as absent.
    pub(crate) fn child_text(&self, tag: &str) -> Option<&'a str> {
        self.child(tag).and_then(|child| child.text())
    }

    /// Trimmed element text; empty text counts as absent.
    pub(crate) fn text(&self) -> Option<&'a str> {
        let text = self.node.text()?.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Trimmed attribute value; empty counts as absent.
    pub(crate) fn attribute(&self, name: &str) -> Option<&'a str> {
        let value = self.node.attribute(name)?.trim();
        (!value.is_empty()).then_some(value)
    }
}

/// Builds the derivation chain for an element: itself first, then each
/// `derivedFrom` source in declaration order. Sources are same-container
/// siblings found by name. Dotted source paths, unknown sources, and
/// cycles abort the run.
pub(crate) fn derivation_chain<'a, 'input>(
    element: Element<'a, 'input>,
    container: Element<'a, 'input>,
    sibling_tag: &str,
    what: &str,
) -> SyncResult<Vec<Element<'a, 'input>>> {
    let mut chain = vec![element];
    let mut seen: Vec<&str> = Vec::new();
    let mut current = element;
    loop {
        let Some(source_name) = current.attribute("derivedFrom") else {
            return Ok(chain);
        };
        if source_name.contains('.') {
            return Err(SyncError::Unsupported(format!(
                "{} '{}' derives from the dotted path '{}'",
                what,
                element.child_text("name").unwrap_or("?"),
                source_name
            )));
        }
        if seen.contains(&source_name) {
            return Err(SyncError::MalformedDocument(format!(
                "circular derivedFrom through '{source_name}'"
            )));
        }
        seen.push(source_name);
        let source = container
            .children()
            .filter(|sibling| sibling.tag() == sibling_tag)
            .find(|sibling| sibling.child_text("name") == Some(source_name));
        let Some(source) = source else {
            return Err(SyncError::MalformedDocument(format!(
                "{} '{}' derives from unknown '{}'",
                what,
                element.child_text("name").unwrap_or("?"),
                source_name
            )));
        };
        chain.push(source);
        current = source;
    }
}

/// First present occurrence of a scalar tag along a derivation chain.
pub(crate) fn chain_text<'a>(chain: &[Element<'a, '_>], tag: &str) -> Option<&'a str> {
    chain.iter().find_map(|element| element.child_text(tag))
}

/// First present occurrence of a child element along a derivation chain.
pub(crate) fn chain_child<'a, 'input>(
    chain: &[Element<'a, 'input>],
    tag: &str,
) -> Option<Element<'a, 'input>> {
    chain.iter().find_map(|element| element.child(tag))
}
