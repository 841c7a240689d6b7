use crate::node::{XLINK_NAMESPACE, XMLNS_NAMESPACE, XML_NAMESPACE};
use phf::{phf_map, Map};

/// MathML attribute names that keep their mixed-case form even though the
/// tokenizer lowercases everything
pub static MATHML_ADJUSTMENTS: Map<&'static str, &'static str> = phf_map! {
    "definitionurl" => "definitionURL",
};

/// SVG attribute names with their camelCase form restored
pub static SVG_ADJUSTMENTS_ATTRIBUTES: Map<&'static str, &'static str> = phf_map! {
    "attributename" => "attributeName",
    "attributetype" => "attributeType",
    "basefrequency" => "baseFrequency",
    "baseprofile" => "baseProfile",
    "calcmode" => "calcMode",
    "clippathunits" => "clipPathUnits",
    "diffuseconstant" => "diffuseConstant",
    "edgemode" => "edgeMode",
    "filterunits" => "filterUnits",
    "glyphref" => "glyphRef",
    "gradienttransform" => "gradientTransform",
    "gradientunits" => "gradientUnits",
    "kernelmatrix" => "kernelMatrix",
    "kernelunitlength" => "kernelUnitLength",
    "keypoints" => "keyPoints",
    "keysplines" => "keySplines",
    "keytimes" => "keyTimes",
    "lengthadjust" => "lengthAdjust",
    "limitingconeangle" => "limitingConeAngle",
    "markerheight" => "markerHeight",
    "markerunits" => "markerUnits",
    "markerwidth" => "markerWidth",
    "maskcontentunits" => "maskContentUnits",
    "maskunits" => "maskUnits",
    "numoctaves" => "numOctaves",
    "pathlength" => "pathLength",
    "patterncontentunits" => "patternContentUnits",
    "patterntransform" => "patternTransform",
    "patternunits" => "patternUnits",
    "pointsatx" => "pointsAtX",
    "pointsaty" => "pointsAtY",
    "pointsatz" => "pointsAtZ",
    "preservealpha" => "preserveAlpha",
    "preserveaspectratio" => "preserveAspectRatio",
    "primitiveunits" => "primitiveUnits",
    "refx" => "refX",
    "refy" => "refY",
    "repeatcount" => "repeatCount",
    "repeatdur" => "repeatDur",
    "requiredextensions" => "requiredExtensions",
    "requiredfeatures" => "requiredFeatures",
    "specularconstant" => "specularConstant",
    "specularexponent" => "specularExponent",
    "spreadmethod" => "spreadMethod",
    "startoffset" => "startOffset",
    "stddeviation" => "stdDeviation",
    "stitchtiles" => "stitchTiles",
    "surfacescale" => "surfaceScale",
    "systemlanguage" => "systemLanguage",
    "tablevalues" => "tableValues",
    "targetx" => "targetX",
    "targety" => "targetY",
    "textlength" => "textLength",
    "viewbox" => "viewBox",
    "viewtarget" => "viewTarget",
    "xchannelselector" => "xChannelSelector",
    "ychannelselector" => "yChannelSelector",
    "zoomandpan" => "zoomAndPan",
};

/// SVG tag names with their camelCase form restored
pub static SVG_ADJUSTMENTS_TAGS: Map<&'static str, &'static str> = phf_map! {
    "altglyph" => "altGlyph",
    "altglyphdef" => "altGlyphDef",
    "altglyphitem" => "altGlyphItem",
    "animatecolor" => "animateColor",
    "animatemotion" => "animateMotion",
    "animatetransform" => "animateTransform",
    "clippath" => "clipPath",
    "feblend" => "feBlend",
    "fecolormatrix" => "feColorMatrix",
    "fecomponenttransfer" => "feComponentTransfer",
    "fecomposite" => "feComposite",
    "feconvolvematrix" => "feConvolveMatrix",
    "fediffuselighting" => "feDiffuseLighting",
    "fedisplacementmap" => "feDisplacementMap",
    "fedistantlight" => "feDistantLight",
    "fedropshadow" => "feDropShadow",
    "feflood" => "feFlood",
    "fefunca" => "feFuncA",
    "fefuncb" => "feFuncB",
    "fefuncg" => "feFuncG",
    "fefuncr" => "feFuncR",
    "fegaussianblur" => "feGaussianBlur",
    "feimage" => "feImage",
    "femerge" => "feMerge",
    "femergenode" => "feMergeNode",
    "femorphology" => "feMorphology",
    "feoffset" => "feOffset",
    "fepointlight" => "fePointLight",
    "fespecularlighting" => "feSpecularLighting",
    "fespotlight" => "feSpotLight",
    "fetile" => "feTile",
    "feturbulence" => "feTurbulence",
    "foreignobject" => "foreignObject",
    "glyphref" => "glyphRef",
    "lineargradient" => "linearGradient",
    "radialgradient" => "radialGradient",
    "textpath" => "textPath",
};

/// Namespaced attributes on foreign elements: (prefix, local name, namespace)
pub static XML_ADJUSTMENTS: Map<&'static str, (&'static str, &'static str, &'static str)> = phf_map! {
    "xlink:actuate" => ("xlink", "actuate", XLINK_NAMESPACE),
    "xlink:arcrole" => ("xlink", "arcrole", XLINK_NAMESPACE),
    "xlink:href" => ("xlink", "href", XLINK_NAMESPACE),
    "xlink:role" => ("xlink", "role", XLINK_NAMESPACE),
    "xlink:show" => ("xlink", "show", XLINK_NAMESPACE),
    "xlink:title" => ("xlink", "title", XLINK_NAMESPACE),
    "xlink:type" => ("xlink", "type", XLINK_NAMESPACE),
    "xml:lang" => ("xml", "lang", XML_NAMESPACE),
    "xml:space" => ("xml", "space", XML_NAMESPACE),
    "xmlns" => ("", "xmlns", XMLNS_NAMESPACE),
    "xmlns:xlink" => ("xmlns", "xlink", XMLNS_NAMESPACE),
};
