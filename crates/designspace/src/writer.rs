//! Writing designspace XML.

use std::{borrow::Cow, path::Path};

use log::warn;
use quick_xml::{
    Writer,
    escape::escape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event, attributes::Attribute},
    name::QName,
};

use crate::{
    config::{DEFAULT_LANGUAGE, SUPPORTED_MAJOR_VERSION},
    document::{Document, GlyphOverride, Instance, Source},
    error::{Error, Result},
    location::{AxisValue, Location},
    reader::major_version,
    rules::Rule,
};

const INDENT_SIZE: usize = 4;

type Attrs = Vec<(&'static str, String)>;

/// Formats a number the way it is stored: integral values without a decimal
/// point, everything else at full precision.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Escapes an attribute value. Whitespace other than spaces is written as a
/// character reference so readers do not normalize it away.
fn attribute_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in escape(value).chars() {
        match c {
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            other => out.push(other),
        }
    }
    out
}

fn start<'a>(name: &'a str, attrs: &'a [(&'static str, String)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for (key, value) in attrs {
        element.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Owned(attribute_value(value).into_bytes()),
        });
    }
    element
}

/// Indented XML output on top of a quick-xml writer.
struct EventWriter {
    inner: Writer<Vec<u8>>,
    depth: usize,
}

impl EventWriter {
    fn new() -> Result<Self> {
        let mut writer = Self { inner: Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE), depth: 0 };
        writer.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(writer)
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.inner.write_event(event).map_err(Error::xml_write)
    }

    fn open(&mut self, name: &str, attrs: Attrs) -> Result<()> {
        self.event(Event::Start(start(name, &attrs)))?;
        self.depth += 1;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: Attrs) -> Result<()> {
        self.event(Event::Empty(start(name, &attrs)))
    }

    fn text(&mut self, name: &str, attrs: Attrs, text: &str) -> Result<()> {
        self.event(Event::Start(start(name, &attrs)))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.depth = self.depth.saturating_sub(1);
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// Inserts pre-rendered markup as the only content of `name`, indenting
    /// every line.
    fn raw(&mut self, name: &str, markup: &str) -> Result<()> {
        let inner = " ".repeat((self.depth + 1) * INDENT_SIZE);
        let mut content = String::new();
        for line in markup.lines() {
            content.push('\n');
            content.push_str(&inner);
            content.push_str(line);
        }
        content.push('\n');
        content.push_str(&" ".repeat(self.depth * INDENT_SIZE));

        self.event(Event::Start(BytesStart::new(name)))?;
        self.event(Event::Text(BytesText::from_escaped(content)))?;
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn finish(self) -> Result<String> {
        let mut out = String::from_utf8(self.inner.into_inner()).map_err(Error::xml_write)?;
        out.push('\n');
        Ok(out)
    }
}

/// Refuses to replace a document that declares a newer major format.
pub(crate) fn check_overwrite(path: &Path) -> Result<()> {
    let Ok(existing) = std::fs::read_to_string(path) else {
        return Ok(());
    };
    let found = match roxmltree::Document::parse(&existing) {
        Ok(xml) => xml.root_element().attribute("format").map(str::to_string),
        Err(e) => {
            warn!("{} is not readable XML ({e}), overwriting it", path.display());
            None
        }
    };
    if let Some(found) = found
        && major_version(&found).is_some_and(|major| major > SUPPORTED_MAJOR_VERSION)
    {
        return Err(Error::NewerFormat {
            path: path.to_path_buf(),
            found,
            supported: SUPPORTED_MAJOR_VERSION.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn write_document(doc: &Document) -> Result<String> {
    let mut w = EventWriter::new()?;
    w.open("designspace", vec![("format", doc.format_version.clone())])?;
    DocumentWriter { doc, defaults: doc.default_location() }.write(&mut w)?;
    w.close("designspace")?;
    w.finish()
}

struct DocumentWriter<'a> {
    doc: &'a Document,
    defaults: Location,
}

impl DocumentWriter<'_> {
    fn write(&self, w: &mut EventWriter) -> Result<()> {
        if !self.doc.axes.is_empty() {
            self.write_axes(w)?;
        }
        if !self.doc.rules.is_empty() {
            w.open("rules", vec![])?;
            for rule in &self.doc.rules {
                write_rule(w, rule)?;
            }
            w.close("rules")?;
        }
        if !self.doc.sources.is_empty() {
            w.open("sources", vec![])?;
            for source in &self.doc.sources {
                self.write_source(w, source)?;
            }
            w.close("sources")?;
        }
        if !self.doc.instances.is_empty() {
            w.open("instances", vec![])?;
            for instance in &self.doc.instances {
                self.write_instance(w, instance)?;
            }
            w.close("instances")?;
        }
        if !self.doc.lib.is_empty() {
            write_lib(w, &self.doc.lib)?;
        }
        Ok(())
    }

    fn write_axes(&self, w: &mut EventWriter) -> Result<()> {
        w.open("axes", vec![])?;
        for axis in &self.doc.axes {
            let mut attrs = vec![
                ("tag", axis.tag.to_string().trim_end().to_string()),
                ("name", axis.name.clone()),
                ("minimum", format_number(axis.minimum)),
                ("maximum", format_number(axis.maximum)),
                ("default", format_number(axis.default)),
            ];
            if axis.hidden {
                attrs.push(("hidden", "1".to_string()));
            }
            if axis.map.is_empty() && axis.label_names.is_empty() {
                w.empty("axis", attrs)?;
                continue;
            }
            w.open("axis", attrs)?;
            let mut labels: Vec<_> = axis.label_names.iter().collect();
            labels.sort();
            for (language, name) in labels {
                w.text("labelname", vec![("xml:lang", language.clone())], name)?;
            }
            for (input, output) in &axis.map {
                w.empty("map", vec![("input", format_number(*input)), ("output", format_number(*output))])?;
            }
            w.close("axis")?;
        }
        w.close("axes")
    }

    /// Writes `location` completed with the axis defaults. Undeclared axes are
    /// dropped.
    fn write_location(&self, w: &mut EventWriter, location: &Location) -> Result<()> {
        let full = if self.doc.axes.is_empty() { location.clone() } else { location.merged_over(&self.defaults) };
        w.open("location", vec![])?;
        let names: Vec<&str> = if self.doc.axes.is_empty() {
            full.axis_names().collect()
        } else {
            self.doc.axes.names().collect()
        };
        for name in names {
            let Some(value) = full.get(name) else { continue };
            let mut attrs = vec![("name", name.to_string()), ("xvalue", format_number(value.x()))];
            if let AxisValue::Anisotropic(_, y) = value {
                attrs.push(("yvalue", format_number(y)));
            }
            w.empty("dimension", attrs)?;
        }
        w.close("location")
    }

    fn write_source(&self, w: &mut EventWriter, source: &Source) -> Result<()> {
        let mut attrs = Attrs::new();
        if let Some(filename) = &source.filename {
            attrs.push(("filename", filename.clone()));
        }
        if !source.has_temporary_name() {
            attrs.push(("name", source.name.clone()));
        }
        push_opt(&mut attrs, "familyname", &source.family_name);
        push_opt(&mut attrs, "stylename", &source.style_name);
        push_opt(&mut attrs, "layer", &source.layer_name);
        w.open("source", attrs)?;
        if source.copy_lib {
            w.empty("lib", vec![("copy", "1".into())])?;
        }
        if source.copy_info || source.mute_info {
            let mut info = Attrs::new();
            if source.copy_info {
                info.push(("copy", "1".into()));
            }
            if source.mute_info {
                info.push(("mute", "1".into()));
            }
            w.empty("info", info)?;
        }
        if source.copy_groups {
            w.empty("groups", vec![("copy", "1".into())])?;
        }
        if source.copy_features {
            w.empty("features", vec![("copy", "1".into())])?;
        }
        if source.mute_kerning {
            w.empty("kerning", vec![("mute", "1".into())])?;
        }
        for glyph in &source.muted_glyph_names {
            w.empty("glyph", vec![("name", glyph.clone()), ("mute", "1".into())])?;
        }
        self.write_location(w, &source.location)?;
        w.close("source")
    }

    fn write_instance(&self, w: &mut EventWriter, instance: &Instance) -> Result<()> {
        let mut attrs = Attrs::new();
        push_opt(&mut attrs, "name", &instance.name);
        push_opt(&mut attrs, "familyname", &instance.family_name);
        push_opt(&mut attrs, "stylename", &instance.style_name);
        push_opt(&mut attrs, "filename", &instance.filename);
        push_opt(&mut attrs, "postscriptfontname", &instance.postscript_font_name);
        push_opt(&mut attrs, "stylemapfamilyname", &instance.style_map_family_name);
        push_opt(&mut attrs, "stylemapstylename", &instance.style_map_style_name);
        w.open("instance", attrs)?;

        for (element, names) in [
            ("stylename", &instance.localised_style_name),
            ("familyname", &instance.localised_family_name),
            ("stylemapstylename", &instance.localised_style_map_style_name),
            ("stylemapfamilyname", &instance.localised_style_map_family_name),
        ] {
            let mut names: Vec<_> = names.iter().filter(|(lang, _)| *lang != DEFAULT_LANGUAGE).collect();
            names.sort();
            for (language, name) in names {
                w.text(element, vec![("xml:lang", language.clone())], name)?;
            }
        }
        if let Some(location) = &instance.location {
            self.write_location(w, location)?;
        }
        if !instance.glyphs.is_empty() {
            w.open("glyphs", vec![])?;
            let mut glyphs: Vec<_> = instance.glyphs.iter().collect();
            glyphs.sort_by(|a, b| a.0.cmp(b.0));
            for (name, glyph) in glyphs {
                self.write_glyph(w, name, glyph)?;
            }
            w.close("glyphs")?;
        }
        if instance.kerning {
            w.empty("kerning", vec![])?;
        }
        if instance.info {
            w.empty("info", vec![])?;
        }
        if !instance.lib.is_empty() {
            write_lib(w, &instance.lib)?;
        }
        w.close("instance")
    }

    fn write_glyph(&self, w: &mut EventWriter, name: &str, glyph: &GlyphOverride) -> Result<()> {
        let mut attrs = vec![("name", name.to_string())];
        if glyph.mute {
            attrs.push(("mute", "1".into()));
        }
        if let Some(unicodes) = &glyph.unicodes {
            let hex: Vec<String> = unicodes.iter().map(|u| format!("0x{u:04X}")).collect();
            attrs.push(("unicode", hex.join(" ")));
        }
        if glyph.instance_location.is_none() && glyph.note.is_none() && glyph.masters.is_none() {
            return w.empty("glyph", attrs);
        }
        w.open("glyph", attrs)?;
        if let Some(location) = &glyph.instance_location {
            self.write_location(w, location)?;
        }
        if let Some(note) = &glyph.note {
            w.text("note", vec![], note)?;
        }
        if let Some(masters) = &glyph.masters {
            w.open("masters", vec![])?;
            for master in masters {
                let mut attrs = Attrs::new();
                push_opt(&mut attrs, "glyphname", &master.glyph_name);
                push_opt(&mut attrs, "source", &master.source);
                match &master.location {
                    Some(location) => {
                        w.open("master", attrs)?;
                        self.write_location(w, location)?;
                        w.close("master")?;
                    }
                    None => w.empty("master", attrs)?,
                }
            }
            w.close("masters")?;
        }
        w.close("glyph")
    }
}

fn push_opt(attrs: &mut Attrs, key: &'static str, value: &Option<String>) {
    if let Some(value) = value {
        attrs.push((key, value.clone()));
    }
}

fn write_rule(w: &mut EventWriter, rule: &Rule) -> Result<()> {
    let mut attrs = Attrs::new();
    push_opt(&mut attrs, "name", &rule.name);
    w.open("rule", attrs)?;
    for set in &rule.condition_sets {
        let bounded: Vec<_> = set.iter().filter(|c| c.is_bounded()).collect();
        if bounded.is_empty() {
            warn!("rule '{}' has a condition set without bounded conditions, not writing it", rule.display_name());
            continue;
        }
        w.open("conditionset", vec![])?;
        for condition in bounded {
            let mut attrs = vec![("name", condition.name.clone())];
            if let Some(min) = condition.minimum {
                attrs.push(("minimum", format_number(min)));
            }
            if let Some(max) = condition.maximum {
                attrs.push(("maximum", format_number(max)));
            }
            w.empty("condition", attrs)?;
        }
        w.close("conditionset")?;
    }
    for (from, to) in &rule.subs {
        w.empty("sub", vec![("name", from.clone()), ("with", to.clone())])?;
    }
    w.close("rule")
}

/// Renders a plist dictionary with the plist crate and embeds its `<dict>`.
fn write_lib(w: &mut EventWriter, lib: &plist::Dictionary) -> Result<()> {
    let mut buffer = Vec::new();
    plist::Value::Dictionary(lib.clone()).to_writer_xml(&mut buffer)?;
    let rendered = String::from_utf8_lossy(&buffer);
    let start = rendered
        .find("<plist")
        .and_then(|i| rendered[i..].find('>').map(|j| i + j + 1))
        .unwrap_or(0);
    let end = rendered.rfind("</plist>").unwrap_or(rendered.len());
    w.raw("lib", rendered[start..end].trim())
}

#[cfg(test)]
mod tests {
    use font_types::Tag;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{axis::Axis, rules::Condition};

    #[test]
    fn numbers() {
        assert_eq!(format_number(400.0), "400");
        assert_eq!(format_number(-1.0), "-1");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333333333");
    }

    #[test]
    fn escapes_attributes() {
        assert_eq!(attribute_value(r#"A & "B" <C>"#), "A &amp; &quot;B&quot; &lt;C&gt;");
        assert_eq!(attribute_value("line1\nline2\tend"), "line1&#10;line2&#9;end");
    }

    #[test]
    fn multiline_names_survive_a_round_trip() {
        let mut doc = sample();
        doc.add_rule(
            Rule::new("line1\nline2")
                .with_condition_set(vec![Condition::between("weight", 500.0, 900.0)])
                .with_sub("a", "a.alt"),
        );
        let mut instance = Instance::new(Location::new()).with_style_name("Bold\tItalic");
        instance.localised_style_name.insert("de".into(), "Fett\nKursiv".into());
        doc.add_instance(instance).unwrap();

        let xml = doc.to_xml_string().unwrap();
        let back = Document::from_xml_str(&xml, None, crate::ReadOptions::new()).unwrap().document;
        assert_eq!(back.rules[0].name.as_deref(), Some("line1\nline2"));
        assert_eq!(back.instances[0].style_name.as_deref(), Some("Bold\tItalic"));
        assert_eq!(back.instances[0].localised_style_name.get("de").map(String::as_str), Some("Fett\nKursiv"));
    }

    #[test]
    fn sets_without_bounded_conditions_are_not_written() {
        let mut doc = sample();
        doc.add_rule(
            Rule::new("r")
                .with_condition_set(vec![Condition::new("weight", None, None)])
                .with_condition_set(Vec::new())
                .with_condition_set(vec![Condition::new("width", None, Some(75.0))])
                .with_sub("a", "a.alt"),
        );
        let xml = doc.to_xml_string().unwrap();
        assert!(!xml.contains("<conditionset/>"), "{xml}");
        assert_eq!(xml.matches("<conditionset>").count(), 1, "{xml}");

        let back = Document::from_xml_str(&xml, None, crate::ReadOptions::new()).unwrap().document;
        assert_eq!(back.rules[0].condition_sets, vec![vec![Condition::new("width", None, Some(75.0))]]);
    }

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.add_axis(
            Axis::new("weight", Tag::new(b"wght"), 100.0, 400.0, 900.0).with_map([(100.0, 20.0), (900.0, 180.0)]),
        )
        .unwrap();
        doc.add_axis(Axis::new("width", Tag::new(b"wdth"), 50.0, 100.0, 100.0)).unwrap();
        doc
    }

    #[test]
    fn writes_full_locations() {
        let mut doc = sample();
        doc.add_source(Source::new("light", Location::new().with("weight", 100.0))).unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.contains(r#"<dimension name="weight" xvalue="100"/>"#));
        assert!(xml.contains(r#"<dimension name="width" xvalue="100"/>"#));
    }

    #[test]
    fn temporary_names_are_not_written() {
        let mut doc = sample();
        doc.add_source(Source::new("temp_master.0", Location::new())).unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert!(!xml.contains("temp_master"));
    }

    #[test]
    fn unbounded_conditions_are_not_written() {
        let mut doc = sample();
        doc.add_rule(
            Rule::new("r")
                .with_condition_set(vec![
                    Condition::new("weight", None, None),
                    Condition::new("width", Some(60.0), None),
                ])
                .with_sub("a", "a.alt"),
        );
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.contains(r#"<condition name="width" minimum="60"/>"#));
        assert!(!xml.contains(r#"<condition name="weight""#));
    }

    #[test]
    fn english_localised_names_stay_in_attributes() {
        let mut doc = sample();
        let mut instance = Instance::new(Location::new()).with_style_name("Bold");
        instance.localised_style_name.insert("en".into(), "Bold".into());
        instance.localised_style_name.insert("de".into(), "Fett".into());
        doc.add_instance(instance).unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.contains(r#"<stylename xml:lang="de">Fett</stylename>"#));
        assert!(!xml.contains(r#"xml:lang="en""#));
        assert!(xml.contains("<kerning/>"));
        assert!(xml.contains("<info/>"));
    }

    #[test]
    fn newer_format_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.designspace");
        std::fs::write(&path, r#"<designspace format="6.0"/>"#).unwrap();
        let err = sample().write(&path).unwrap_err();
        assert!(matches!(err, Error::NewerFormat { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Persistence);
    }
}
