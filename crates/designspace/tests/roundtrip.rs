//! Reading, writing and re-reading complete documents.

use std::path::PathBuf;

use mutatio_designspace::{
    Axis, Condition, DefaultSource, Document, GlyphMaster, GlyphOverride, Instance, Location,
    Rule, Source, Tag,
};
use pretty_assertions::assert_eq;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn location(weight: f64, width: f64) -> Location {
    Location::new().with("weight", weight).with("width", width)
}

fn build(dir: &std::path::Path) -> Document {
    let mut doc = Document::new();
    doc.add_axis(
        Axis::new("weight", Tag::new(b"wght"), 100.0, 400.0, 900.0)
            .with_map([(100.0, 20.0), (400.0, 66.0), (900.0, 180.0)])
            .with_label_name("de", "Stärke"),
    )
    .unwrap();
    doc.add_axis(Axis::new("width", Tag::new(b"wdth"), 50.0, 100.0, 100.0).hidden(true)).unwrap();
    doc.lib.insert("com.example.key".into(), plist::Value::String("value & more".into()));

    doc.add_rule(
        Rule::new("heavy dollar")
            .with_condition_set(vec![Condition::between("weight", 650.0, 900.0)])
            .with_condition_set(vec![Condition::new("width", None, Some(75.0))])
            .with_sub("dollar", "dollar.nostroke"),
    );

    let mut regular = Source::new("regular", location(400.0, 100.0))
        .with_path(dir.join("masters/Regular.ufo"))
        .with_family_name("Demo")
        .with_style_name("Regular");
    regular.copy_info = true;
    regular.copy_lib = true;
    regular.copy_groups = true;
    regular.copy_features = true;
    doc.add_source(regular).unwrap();

    let mut bold = Source::new("bold", location(900.0, 100.0))
        .with_path(dir.join("masters/Bold.ufo"))
        .with_layer("public.background");
    bold.mute_kerning = true;
    bold.mute_info = true;
    bold.muted_glyph_names.insert("A".into());
    doc.add_source(bold).unwrap();

    let mut condensed = Source::new("condensed", Location::new().with("width", (50.0, 60.5)));
    condensed.path = Some(dir.join("masters/Condensed.ufo"));
    doc.add_source(condensed).unwrap();

    let mut instance = Instance::new(location(650.0, 75.0))
        .with_name("medium")
        .with_path(dir.join("instances/Demo-Medium.ufo"))
        .with_family_name("Demo & Co")
        .with_style_name("Medium")
        .with_glyph("arrow", GlyphOverride { mute: true, unicodes: Some(vec![0x2192]), ..Default::default() })
        .with_glyph(
            "b",
            GlyphOverride {
                note: Some("alternate master".into()),
                instance_location: Some(location(500.0, 100.0)),
                masters: Some(vec![GlyphMaster {
                    source: Some("bold".into()),
                    glyph_name: Some("b.alt".into()),
                    location: Some(location(900.0, 100.0)),
                }]),
                ..Default::default()
            },
        );
    instance.postscript_font_name = Some("Demo-Medium".into());
    instance.style_map_family_name = Some("Demo Medium".into());
    instance.style_map_style_name = Some("regular".into());
    instance.localised_style_name.insert("de".into(), "Mittel".into());
    instance.localised_family_name.insert("ja".into(), "デモ".into());
    instance.lib.insert("public.count".into(), plist::Value::Integer(7i64.into()));
    doc.add_instance(instance).unwrap();
    doc
}

#[test]
fn write_then_read_preserves_document() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("family/Demo.designspace");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    let mut doc = build(dir.path());
    doc.write(&path).unwrap();
    assert_eq!(doc.sources[0].filename.as_deref(), Some("../masters/Regular.ufo"));

    let read = Document::read(&path).unwrap();
    assert_eq!(read.format_version, "4.0");
    assert_eq!(read.axes, doc.axes);
    assert_eq!(read.rules, doc.rules);
    assert_eq!(read.lib, doc.lib);

    assert_eq!(read.sources.len(), 3);
    for (read, written) in read.sources.iter().zip(&doc.sources) {
        assert_eq!(read.name, written.name);
        assert_eq!(read.filename, written.filename);
        assert_eq!(read.path, written.path);
        assert_eq!(read.layer_name, written.layer_name);
        assert_eq!(read.muted_glyph_names, written.muted_glyph_names);
        assert_eq!(
            (read.copy_info, read.copy_lib, read.copy_groups, read.copy_features),
            (written.copy_info, written.copy_lib, written.copy_groups, written.copy_features)
        );
        assert_eq!((read.mute_info, read.mute_kerning), (written.mute_info, written.mute_kerning));
        assert_eq!(read.location, written.location.merged_over(&doc.default_location()));
    }

    let instance = &read.instances[0];
    let written = &doc.instances[0];
    assert_eq!(instance.name, written.name);
    assert_eq!(instance.family_name.as_deref(), Some("Demo & Co"));
    assert_eq!(instance.postscript_font_name, written.postscript_font_name);
    assert_eq!(instance.style_map_family_name, written.style_map_family_name);
    assert_eq!(instance.style_map_style_name, written.style_map_style_name);
    assert_eq!(instance.localised_style_name, written.localised_style_name);
    assert_eq!(instance.localised_family_name, written.localised_family_name);
    assert_eq!(instance.location, written.location);
    assert_eq!(instance.glyphs, written.glyphs);
    assert_eq!(instance.lib, written.lib);
    assert_eq!(instance.path, Some(dir.path().join("instances/Demo-Medium.ufo")));
}

#[test]
fn written_text_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Demo.designspace");
    let mut doc = build(dir.path());
    doc.write(&path).unwrap();
    let first = std::fs::read_to_string(&path).unwrap();

    let mut again = Document::read(&path).unwrap();
    again.write(&path).unwrap();
    let second = std::fs::read_to_string(&path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn anisotropic_dimension_survives() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Demo.designspace");
    let mut doc = build(dir.path());
    doc.write(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains(r#"<dimension name="width" xvalue="50" yvalue="60.5"/>"#));
}

#[test]
fn default_source_after_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Demo.designspace");
    let mut doc = build(dir.path());
    doc.write(&path).unwrap();
    let read = Document::read(&path).unwrap();
    assert!(matches!(read.find_default(), DefaultSource::Found { index: 0, .. }));
    assert_eq!(read.default_source().map(|s| s.name.as_str()), Some("regular"));
}

#[test]
fn read_missing_file() {
    let err = Document::read(PathBuf::from("/definitely/not/here.designspace")).unwrap_err();
    assert_eq!(err.kind(), mutatio_designspace::ErrorKind::Persistence);
}

#[test]
fn open_condition_sets_do_not_survive() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Open.designspace");
    let mut doc = Document::new();
    doc.add_axis(Axis::new("weight", Tag::new(b"wght"), 100.0, 400.0, 900.0)).unwrap();
    doc.add_rule(
        Rule::new("open")
            .with_condition_set(Vec::new())
            .with_condition_set(vec![Condition::new("weight", None, None)])
            .with_sub("a", "b"),
    );
    let weight = Location::new().with("weight", 100.0);
    assert_eq!(doc.process_rules(&weight, &["a"]), vec!["a"]);

    doc.write(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("conditionset"), "{text}");

    let read = Document::read(&path).unwrap();
    assert!(read.rules[0].condition_sets.is_empty());
    assert_eq!(read.process_rules(&weight, &["a"]), vec!["a"]);
}

#[test]
fn multiline_text_survives() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Demo.designspace");
    let mut doc = build(dir.path());
    doc.rules[0].name = Some("heavy\ndollar".into());
    doc.instances[0].family_name = Some("Demo\tCo".into());
    doc.write(&path).unwrap();

    let read = Document::read(&path).unwrap();
    assert_eq!(read.rules[0].name.as_deref(), Some("heavy\ndollar"));
    assert_eq!(read.instances[0].family_name.as_deref(), Some("Demo\tCo"));
}
