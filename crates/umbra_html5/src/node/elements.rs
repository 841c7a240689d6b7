use phf::{phf_set, Set};

/// HTML elements that are "special" for tree construction: they terminate
/// the any-other-end-tag walk and the implied-end-tag search.
pub static SPECIAL_HTML_ELEMENTS: Set<&'static str> = phf_set! {
    "address", "applet", "area", "article", "aside", "base", "basefont",
    "bgsound", "blockquote", "body", "br", "button", "caption", "center",
    "col", "colgroup", "dd", "details", "dir", "div", "dl", "dt", "embed",
    "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset",
    "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr",
    "html", "iframe", "img", "input", "keygen", "li", "link", "listing",
    "main", "marquee", "menu", "meta", "nav", "noembed", "noframes",
    "noscript", "object", "ol", "p", "param", "plaintext", "pre", "script",
    "search", "section", "select", "source", "style", "summary", "table",
    "tbody", "td", "template", "textarea", "tfoot", "th", "thead", "title",
    "tr", "track", "ul", "wbr", "xmp",
};

/// MathML elements that are "special"
pub static SPECIAL_MATHML_ELEMENTS: Set<&'static str> = phf_set! {
    "mi", "mo", "mn", "ms", "mtext", "annotation-xml",
};

/// SVG elements that are "special"
pub static SPECIAL_SVG_ELEMENTS: Set<&'static str> = phf_set! {
    "foreignObject", "desc", "title",
};

/// HTML formatting elements, tracked on the active formatting elements list
pub static FORMATTING_HTML_ELEMENTS: Set<&'static str> = phf_set! {
    "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small",
    "strike", "strong", "tt", "u",
};

/// Void elements: serialized without an end tag
pub static VOID_HTML_ELEMENTS: Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
};

/// Elements whose text children are serialized without escaping
pub static RAW_TEXT_HTML_ELEMENTS: Set<&'static str> = phf_set! {
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
};

/// Every built-in HTML element name. An inserted HTML element whose name is
/// not in this set is a candidate for custom-element upgrade.
pub static KNOWN_HTML_ELEMENTS: Set<&'static str> = phf_set! {
    "a", "abbr", "address", "area", "article", "aside", "audio", "b",
    "base", "basefont", "bdi", "bdo", "bgsound", "big", "blockquote",
    "body", "br", "button", "canvas", "caption", "center", "cite", "code",
    "col", "colgroup", "data", "datalist", "dd", "del", "details", "dfn",
    "dialog", "dir", "div", "dl", "dt", "em", "embed", "fieldset",
    "figcaption", "figure", "font", "footer", "form", "frame", "frameset",
    "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr",
    "html", "i", "iframe", "image", "img", "input", "ins", "kbd", "keygen",
    "label", "legend", "li", "link", "listing", "main", "map", "mark",
    "marquee", "menu", "meta", "meter", "nav", "nobr", "noembed",
    "noframes", "noscript", "object", "ol", "optgroup", "option", "output",
    "p", "param", "picture", "plaintext", "pre", "progress", "q", "rb",
    "rp", "rt", "rtc", "ruby", "s", "samp", "script", "search", "section",
    "select", "slot", "small", "source", "span", "strike", "strong",
    "style", "sub", "summary", "sup", "table", "tbody", "td", "template",
    "textarea", "tfoot", "th", "thead", "time", "title", "tr", "track",
    "tt", "u", "ul", "var", "video", "wbr", "xmp",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_sets() {
        assert!(SPECIAL_HTML_ELEMENTS.contains("div"));
        assert!(!SPECIAL_HTML_ELEMENTS.contains("span"));
        assert!(SPECIAL_MATHML_ELEMENTS.contains("annotation-xml"));
        assert!(SPECIAL_SVG_ELEMENTS.contains("foreignObject"));
    }

    #[test]
    fn formatting_and_void() {
        assert!(FORMATTING_HTML_ELEMENTS.contains("b"));
        assert!(!FORMATTING_HTML_ELEMENTS.contains("div"));
        assert!(VOID_HTML_ELEMENTS.contains("br"));
        assert!(!VOID_HTML_ELEMENTS.contains("p"));
    }

    #[test]
    fn custom_element_names_are_unknown() {
        assert!(KNOWN_HTML_ELEMENTS.contains("article"));
        assert!(!KNOWN_HTML_ELEMENTS.contains("my-widget"));
        assert!(!KNOWN_HTML_ELEMENTS.contains("blink"));
    }
}
