use crate::node::elements::{
    FORMATTING_HTML_ELEMENTS, SPECIAL_HTML_ELEMENTS, SPECIAL_MATHML_ELEMENTS, SPECIAL_SVG_ELEMENTS,
};
use crate::node::{HTML_NAMESPACE, MATHML_NAMESPACE, SVG_NAMESPACE};
use std::fmt;

/// Attribute map of an element: insertion-ordered with unique keys. The
/// first occurrence of a name wins its position; overwriting a value keeps
/// the original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrMap {
    entries: Vec<(String, String)>,
}

impl AttrMap {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Inserts or overwrites an attribute. Returns false when the name was
    /// already present (the value is replaced in place).
    pub fn insert(&mut self, name: &str, value: &str) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == name) {
            entry.1 = value.to_owned();
            return false;
        }
        self.entries.push((name.to_owned(), value.to_owned()));
        true
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(k, _)| k != name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Compares contents ignoring attribute order
    pub fn eq_ignore_order(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for AttrMap {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut map = Self::new();
        for (k, v) in pairs {
            map.insert(k, v);
        }
        map
    }
}

/// Data of an element node
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name (local name)
    pub name: String,
    /// Namespace URI of the element
    pub namespace: Option<String>,
    /// Attributes, in source order
    pub attributes: AttrMap,
}

impl fmt::Display for ElementData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

impl ElementData {
    #[must_use]
    pub fn new(name: &str, namespace: Option<&str>, attributes: AttrMap) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.unwrap_or(HTML_NAMESPACE).into()),
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(HTML_NAMESPACE)
    }

    pub fn is_namespace(&self, namespace: &str) -> bool {
        self.namespace() == namespace
    }

    /// True when this element is not in the HTML namespace
    pub fn is_foreign(&self) -> bool {
        !self.is_namespace(HTML_NAMESPACE)
    }

    pub fn attributes(&self) -> &AttrMap {
        &self.attributes
    }

    pub fn add_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name, value);
    }

    /// MathML text integration points allow HTML content directly inside
    pub fn is_mathml_integration_point(&self) -> bool {
        self.is_namespace(MATHML_NAMESPACE) && ["mi", "mo", "mn", "ms", "mtext"].contains(&self.name())
    }

    /// HTML integration points switch parsing back to the HTML rules
    pub fn is_html_integration_point(&self) -> bool {
        if self.is_namespace(MATHML_NAMESPACE) && self.name() == "annotation-xml" {
            return matches!(
                self.attributes.get("encoding").map(str::to_ascii_lowercase).as_deref(),
                Some("text/html" | "application/xhtml+xml")
            );
        }
        self.is_namespace(SVG_NAMESPACE) && ["foreignObject", "desc", "title"].contains(&self.name())
    }

    /// True when the element belongs to the "special" category of its
    /// namespace (terminates scope walks and end-tag searches)
    pub fn is_special(&self) -> bool {
        if self.is_namespace(HTML_NAMESPACE) {
            return SPECIAL_HTML_ELEMENTS.contains(self.name());
        }
        if self.is_namespace(MATHML_NAMESPACE) {
            return SPECIAL_MATHML_ELEMENTS.contains(self.name());
        }
        if self.is_namespace(SVG_NAMESPACE) {
            return SPECIAL_SVG_ELEMENTS.contains(self.name());
        }
        false
    }

    pub fn is_formatting(&self) -> bool {
        self.is_namespace(HTML_NAMESPACE) && FORMATTING_HTML_ELEMENTS.contains(self.name())
    }

    /// Same tag, namespace and attribute contents (order-insensitive).
    /// Used by the Noah's-Ark clause of the formatting list.
    pub fn matches_tag_and_attrs_without_order(&self, other: &Self) -> bool {
        self.name == other.name
            && self.namespace == other.namespace
            && self.attributes.eq_ignore_order(&other.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_map_preserves_order() {
        let mut attrs = AttrMap::new();
        attrs.insert("b", "2");
        attrs.insert("a", "1");
        attrs.insert("c", "3");
        attrs.insert("b", "overwritten");

        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(attrs.get("b"), Some("overwritten"));
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn attr_map_eq_ignore_order() {
        let a = AttrMap::from([("x", "1"), ("y", "2")]);
        let b = AttrMap::from([("y", "2"), ("x", "1")]);
        assert!(a.eq_ignore_order(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn mathml_integration_point() {
        let mi = ElementData::new("mi", Some(MATHML_NAMESPACE), AttrMap::new());
        assert!(mi.is_mathml_integration_point());
        assert!(!mi.is_html_integration_point());

        let annotation = ElementData::new(
            "annotation-xml",
            Some(MATHML_NAMESPACE),
            AttrMap::from([("encoding", "text/html")]),
        );
        assert!(annotation.is_html_integration_point());

        let annotation_other = ElementData::new(
            "annotation-xml",
            Some(MATHML_NAMESPACE),
            AttrMap::from([("encoding", "text/plain")]),
        );
        assert!(!annotation_other.is_html_integration_point());
    }

    #[test]
    fn svg_integration_point() {
        let foreign_object = ElementData::new("foreignObject", Some(SVG_NAMESPACE), AttrMap::new());
        assert!(foreign_object.is_html_integration_point());

        let circle = ElementData::new("circle", Some(SVG_NAMESPACE), AttrMap::new());
        assert!(!circle.is_html_integration_point());
    }

    #[test]
    fn special_per_namespace() {
        let div = ElementData::new("div", Some(HTML_NAMESPACE), AttrMap::new());
        assert!(div.is_special());

        let svg_title = ElementData::new("title", Some(SVG_NAMESPACE), AttrMap::new());
        assert!(svg_title.is_special());

        let svg_circle = ElementData::new("circle", Some(SVG_NAMESPACE), AttrMap::new());
        assert!(!svg_circle.is_special());
    }
}
