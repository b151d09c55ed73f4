// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Name adjustments for SVG and MathML content.
//!
//! The tokenizer lowercases every tag and attribute name, but SVG uses
//! camel case and a few attributes live in the XLink, XML and XMLNS
//! namespaces. These tables restore the canonical spelling.

use crate::interface::{Namespace, QualName};
use crate::tokenizer::Tag;
use crate::LocalName;

use phf::phf_map;

static SVG_TAG_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
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

static SVG_ATTRIBUTES: phf::Map<&'static str, &'static str> = phf_map! {
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

static MATHML_ATTRIBUTES: phf::Map<&'static str, &'static str> = phf_map! {
    "definitionurl" => "definitionURL",
};

/// Prefix, namespace and local name for each namespaced foreign attribute.
static FOREIGN_ATTRIBUTES: phf::Map<&'static str, (&'static str, Namespace, &'static str)> = phf_map! {
    "xlink:actuate" => ("xlink", Namespace::XLink, "actuate"),
    "xlink:arcrole" => ("xlink", Namespace::XLink, "arcrole"),
    "xlink:href" => ("xlink", Namespace::XLink, "href"),
    "xlink:role" => ("xlink", Namespace::XLink, "role"),
    "xlink:show" => ("xlink", Namespace::XLink, "show"),
    "xlink:title" => ("xlink", Namespace::XLink, "title"),
    "xlink:type" => ("xlink", Namespace::XLink, "type"),
    "xml:lang" => ("xml", Namespace::Xml, "lang"),
    "xml:space" => ("xml", Namespace::Xml, "space"),
    "xmlns" => ("", Namespace::XmlNs, "xmlns"),
    "xmlns:xlink" => ("xmlns", Namespace::XmlNs, "xlink"),
};

pub(crate) fn adjust_svg_tag_name(tag: &mut Tag) {
    if let Some(&fixed) = SVG_TAG_NAMES.get(&*tag.name) {
        tag.name = LocalName::from(fixed);
    }
}

fn adjust_attribute_names(tag: &mut Tag, table: &phf::Map<&'static str, &'static str>) {
    for attr in tag.attrs.iter_mut() {
        if attr.name.ns != Namespace::None {
            continue;
        }
        if let Some(&fixed) = table.get(&*attr.name.local) {
            attr.name = QualName::attr(fixed);
        }
    }
}

pub(crate) fn adjust_svg_attributes(tag: &mut Tag) {
    adjust_attribute_names(tag, &SVG_ATTRIBUTES);
}

pub(crate) fn adjust_mathml_attributes(tag: &mut Tag) {
    adjust_attribute_names(tag, &MATHML_ATTRIBUTES);
}

pub(crate) fn adjust_foreign_attributes(tag: &mut Tag) {
    for attr in tag.attrs.iter_mut() {
        if attr.name.ns != Namespace::None {
            continue;
        }
        if let Some(&(prefix, ns, local)) = FOREIGN_ATTRIBUTES.get(&*attr.name.local) {
            let prefix = if prefix.is_empty() {
                None
            } else {
                Some(LocalName::from(prefix))
            };
            attr.name = QualName::new(prefix, ns, LocalName::from(local));
        }
    }
}

/// Apply every adjustment that a start tag entering `ns` needs.
pub(crate) fn adjust_for_namespace(tag: &mut Tag, ns: Namespace) {
    match ns {
        Namespace::Svg => {
            adjust_svg_tag_name(tag);
            adjust_svg_attributes(tag);
        },
        Namespace::MathMl => adjust_mathml_attributes(tag),
        _ => (),
    }
    adjust_foreign_attributes(tag);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interface::Attribute;
    use crate::tokenizer::StartTag;
    use tendril::StrTendril;

    fn tag(name: &str, attrs: &[&str]) -> Tag {
        Tag {
            kind: StartTag,
            name: LocalName::from(name),
            self_closing: false,
            attrs: attrs
                .iter()
                .map(|a| Attribute {
                    name: QualName::attr(a),
                    value: StrTendril::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn svg_names_are_recased() {
        let mut t = tag("foreignobject", &["viewbox", "class"]);
        adjust_for_namespace(&mut t, Namespace::Svg);
        assert_eq!(&*t.name, "foreignObject");
        assert_eq!(&*t.attrs[0].name.local, "viewBox");
        assert_eq!(&*t.attrs[1].name.local, "class");
    }

    #[test]
    fn mathml_leaves_tag_names_alone() {
        let mut t = tag("clippath", &["definitionurl"]);
        adjust_for_namespace(&mut t, Namespace::MathMl);
        assert_eq!(&*t.name, "clippath");
        assert_eq!(&*t.attrs[0].name.local, "definitionURL");
    }

    #[test]
    fn xlink_and_xmlns_get_namespaces() {
        let mut t = tag("svg", &["xlink:href", "xmlns", "xmlns:xlink"]);
        adjust_for_namespace(&mut t, Namespace::Svg);
        let href = &t.attrs[0].name;
        assert_eq!(href.ns, Namespace::XLink);
        assert_eq!(href.prefix.as_deref(), Some("xlink"));
        assert_eq!(&*href.local, "href");
        assert_eq!(t.attrs[1].name, QualName::new(None, Namespace::XmlNs, LocalName::from("xmlns")));
        assert_eq!(t.attrs[2].name.prefix.as_deref(), Some("xmlns"));
    }
}
