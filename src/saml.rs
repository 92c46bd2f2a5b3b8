use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use roxmltree::Node;
use scraper::{Html, Selector};

use crate::aws::{normalize_roles, AwsRole};
use crate::error::{Error, Result};

const ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
const ROLE_ATTRIBUTE: &str = "https://aws.amazon.com/SAML/Attributes/Role";

static INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input").expect("static selector"));

/// A base64 `SAMLResponse`, kept exactly as the identity provider sent it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SAMLAssertion {
    base64: String,
}

impl SAMLAssertion {
    pub fn new(base64: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
        }
    }

    /// Pulls the assertion out of the hidden `SAMLResponse` form field.
    ///
    /// The last matching `input` wins. A field without a value gives an empty
    /// assertion rather than [`Error::AssertionNotFound`].
    pub fn from_html(body: &str) -> Result<Self> {
        let document = Html::parse_document(body);

        let element = document
            .select(&INPUT_SELECTOR)
            .filter(|input| input.value().attr("name") == Some("SAMLResponse"))
            .last()
            .ok_or(Error::AssertionNotFound)?;

        let value = element.value().attr("value").unwrap_or_default();
        Ok(Self::new(value))
    }

    pub fn as_base64(&self) -> &str {
        &self.base64
    }

    pub fn decode(&self) -> Result<String> {
        let compact: String = self
            .base64
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD.decode(compact)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Every AWS role the assertion grants, in document order, each as
    /// `(role, principal)`.
    pub fn extract_roles(&self) -> Result<Vec<AwsRole>> {
        let xml = self.decode()?;
        let doc = roxmltree::Document::parse(&xml)?;

        let raw = doc
            .descendants()
            .filter(|n| is_assertion_element(n, "Attribute"))
            .filter(|n| n.attribute("Name") == Some(ROLE_ATTRIBUTE))
            .flat_map(|attribute| {
                attribute
                    .descendants()
                    .filter(|n| is_assertion_element(n, "AttributeValue"))
            })
            .map(|value| value.text().unwrap_or_default().parse::<AwsRole>())
            .collect::<Result<Vec<_>>>()?;

        log::debug!("found {} role attribute values", raw.len());

        normalize_roles(&raw)
    }
}

fn is_assertion_element(node: &Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(ASSERTION_NS)
        && node.tag_name().name() == name
}
