use std::path::PathBuf;

use mutatio_designspace::{
    Axis, Condition, Document, GlyphMaster, GlyphOverride, Instance, Location, Rule, Source, Tag,
};
use mutatio_processor::{
    Processor, ProcessorOptions, ProblemKind,
    math::{GlyphOutline, InfoValues, KerningTable, MemoryArtifact, MemoryLoader, MemoryWriter},
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn weight(value: f64) -> Location {
    Location::new().with("weight", value)
}

fn document() -> Document {
    let mut doc = Document::new();
    doc.add_axis(Axis::new("weight", Tag::new(b"wght"), 100.0, 400.0, 900.0)).unwrap();
    let mut regular = Source::new("Regular", weight(400.0)).with_path("/src/Regular.ufo");
    regular.copy_info = true;
    doc.add_source(regular).unwrap();
    doc.add_source(Source::new("Bold", weight(900.0)).with_path("/src/Bold.ufo")).unwrap();
    let medium = Instance::new(weight(650.0)).with_name("Medium").with_family_name("Test").with_path("/out/Medium.ufo");
    doc.add_instance(medium).unwrap();
    doc
}

fn regular() -> MemoryArtifact {
    MemoryArtifact::new()
        .with_glyph("a", GlyphOutline::new(500.0).with_contour([(0.0, 0.0), (100.0, 0.0)]))
        .with_glyph("a.alt", GlyphOutline::new(520.0).with_contour([(0.0, 0.0), (50.0, 0.0)]))
        .with_glyph("aacute", GlyphOutline::new(500.0).with_component("a", (10.0, 0.0)))
        .with_layer_glyph("support", "a", GlyphOutline::new(560.0).with_contour([(0.0, 0.0), (160.0, 0.0)]))
        .with_unicodes("a", [0x61])
        .with_unicodes("aacute", [0xE1])
        .with_info(InfoValues::default().with_value("ascender", 700.0).with_text("copyright", "(c) Test"))
        .with_kerning(KerningTable::default().with_pair("a", "v", -40.0))
}

fn bold() -> MemoryArtifact {
    MemoryArtifact::new()
        .with_glyph("a", GlyphOutline::new(600.0).with_contour([(0.0, 0.0), (201.0, 0.0)]))
        .with_glyph("a.alt", GlyphOutline::new(620.0).with_contour([(0.0, 0.0), (150.0, 0.0)]))
        .with_glyph("aacute", GlyphOutline::new(600.0).with_component("a", (30.0, 0.0)))
        .with_info(InfoValues::default().with_value("ascender", 800.0))
        .with_kerning(KerningTable::default().with_pair("a", "v", -80.0))
}

fn loader() -> MemoryLoader {
    MemoryLoader::new().with("/src/Regular.ufo", regular()).with("/src/Bold.ufo", bold())
}

fn options() -> ProcessorOptions {
    ProcessorOptions::new().process_rules(false)
}

#[test]
fn interpolates_every_part() {
    init();
    let doc = document();
    let mut processor = Processor::new(&doc, loader(), options());
    processor.load_sources();
    assert_eq!(processor.glyph_names(), ["a", "a.alt", "aacute"]);

    let built = processor.make_instance(&doc.instances[0]);
    let a = built.glyph("a").unwrap();
    assert_eq!(a.width, 550.0);
    assert_eq!(a.contours[0][1].x, 150.5);
    assert_eq!(built.glyph("aacute").unwrap().components[0].offset.x, 20.0);
    assert_eq!(built.unicodes.get("a"), Some(&vec![0x61]));
    assert_eq!(built.unicodes.get("aacute"), Some(&vec![0xE1]));
    assert_eq!(built.unicodes.get("a.alt"), None);

    let info = built.info.as_ref().unwrap();
    assert_eq!(info.values.get("ascender"), Some(&750.0));
    assert_eq!(info.text.get("copyright").map(String::as_str), Some("(c) Test"));
    assert_eq!(built.donors.info.as_deref(), Some("Regular"));
    assert_eq!(built.kerning.as_ref().unwrap().get("a", "v"), Some(-60.0));
    assert_eq!(built.names.family_name.as_deref(), Some("Test"));
    assert_eq!(built.glyph_order, ["a", "a.alt", "aacute"]);
    assert_eq!(built.location, weight(650.0));
    assert!(processor.problems().is_empty());
}

#[test]
fn rounds_geometry() {
    let doc = document();
    let mut processor = Processor::new(&doc, loader(), options().round_geometry(true));
    processor.load_sources();
    let built = processor.make_instance(&doc.instances[0]);
    assert_eq!(built.glyph("a").unwrap().contours[0][1].x, 151.0);
}

#[test]
fn muted_glyph() {
    let doc = document();
    let mut processor = Processor::new(&doc, loader(), options());
    processor.load_sources();
    let overrides = GlyphOverride { mute: true, note: Some("later".into()), ..Default::default() };
    let instance = Instance::new(weight(650.0)).with_glyph("a", overrides);
    let built = processor.make_instance(&instance);
    let a = &built.glyphs["a"];
    assert!(a.is_muted());
    assert_eq!(a.note.as_deref(), Some("later"));
    assert_eq!(built.unicodes.get("a"), None);
}

#[test]
fn unicode_override() {
    let doc = document();
    let mut processor = Processor::new(&doc, loader(), options());
    processor.load_sources();
    let overrides = GlyphOverride { unicodes: Some(vec![0x41, 0x61]), ..Default::default() };
    let built = processor.make_instance(&Instance::new(weight(650.0)).with_glyph("a", overrides));
    assert_eq!(built.unicodes.get("a"), Some(&vec![0x41, 0x61]));
}

#[test]
fn glyph_instance_location() {
    let doc = document();
    let mut processor = Processor::new(&doc, loader(), options());
    processor.load_sources();
    let overrides = GlyphOverride { instance_location: Some(weight(900.0)), ..Default::default() };
    let built = processor.make_instance(&Instance::new(weight(650.0)).with_glyph("a", overrides));
    assert_eq!(built.glyph("a").unwrap().width, 600.0);
    assert_eq!(built.glyph("a.alt").unwrap().width, 570.0);
}

#[test]
fn explicit_glyph_masters() {
    let doc = document();
    let mut processor = Processor::new(&doc, loader(), options());
    processor.load_sources();
    let masters = vec![
        GlyphMaster { source: Some("Regular".into()), glyph_name: Some("a".into()), location: None },
        GlyphMaster { source: Some("Bold".into()), glyph_name: Some("a".into()), location: Some(weight(900.0)) },
    ];
    let overrides = GlyphOverride { masters: Some(masters), ..Default::default() };
    let built = processor.make_instance(&Instance::new(weight(650.0)).with_glyph("a.alt", overrides));
    assert_eq!(built.glyph("a.alt").unwrap().width, 550.0);
    assert!(processor.problems().is_empty());
}

#[test]
fn missing_source_is_a_problem() {
    init();
    let doc = document();
    let loader = MemoryLoader::new().with("/src/Regular.ufo", regular());
    let mut processor = Processor::new(&doc, loader, options());
    processor.load_sources();
    let problems = processor.problems();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].kind, ProblemKind::Resolution);
    assert_eq!(problems[0].subject, "Bold");

    let built = processor.make_instance(&doc.instances[0]);
    assert_eq!(built.glyph("a").unwrap().width, 500.0);
}

#[test]
fn muted_source_data() {
    let mut doc = document();
    doc.sources[1].mute_kerning = true;
    doc.sources[1].mute_info = true;
    doc.sources[1].muted_glyph_names.insert("a".into());
    let mut processor = Processor::new(&doc, loader(), options());
    processor.load_sources();
    let built = processor.make_instance(&doc.instances[0]);
    assert_eq!(built.kerning.unwrap().get("a", "v"), Some(-40.0));
    assert_eq!(built.info.unwrap().values.get("ascender"), Some(&700.0));
    assert_eq!(built.glyphs["a"].geometry.as_ref().unwrap().width, 500.0);
    assert_eq!(built.glyphs["a.alt"].geometry.as_ref().unwrap().width, 570.0);
}

#[test]
fn layer_sources() {
    let mut doc = document();
    let mut support =
        Source::new("Regular support", weight(650.0)).with_path("/src/Regular.ufo").with_layer("support");
    support.mute_info = true;
    support.mute_kerning = true;
    doc.add_source(support).unwrap();
    let mut processor = Processor::new(&doc, loader(), options());
    processor.load_sources();
    let built = processor.make_instance(&doc.instances[0]);
    assert_eq!(built.glyph("a").unwrap().width, 560.0);
    assert_eq!(built.glyph("a.alt").unwrap().width, 570.0);
    assert_eq!(built.info.unwrap().values.get("ascender"), Some(&750.0));
}

fn rule_document() -> Document {
    let mut doc = document();
    let heavy = Rule::new("heavy")
        .with_condition_set(vec![Condition::between("weight", 600.0, 900.0)])
        .with_sub("a", "a.alt");
    doc.add_rule(heavy);
    doc
}

#[test]
fn rules_swap_glyphs() {
    let doc = rule_document();
    let mut processor = Processor::new(&doc, loader(), ProcessorOptions::default());
    processor.load_sources();
    let built = processor.make_instance(&doc.instances[0]);

    // The alternate shape now lives under "a" and keeps the code point of "a".
    assert_eq!(built.glyph("a").unwrap().width, 570.0);
    assert_eq!(built.glyph("a.alt").unwrap().width, 550.0);
    assert_eq!(built.unicodes.get("a"), Some(&vec![0x61]));
    // The composite still shows the original "a" shape.
    assert_eq!(built.glyph("aacute").unwrap().components[0].base, "a.alt");
    let kerning = built.kerning.as_ref().unwrap();
    assert_eq!(kerning.get("a.alt", "v"), Some(-60.0));
    assert_eq!(kerning.get("a", "v"), None);
    assert!(built.glyphs.keys().all(|name| !name.contains("swap")));
    assert!(processor.problems().is_empty());
}

#[rstest]
#[case(400.0, 500.0)]
#[case(525.0, 525.0)]
fn rules_outside_conditions(#[case] at: f64, #[case] expected_width: f64) {
    let doc = rule_document();
    let mut processor = Processor::new(&doc, loader(), ProcessorOptions::default());
    processor.load_sources();
    let built = processor.make_instance(&Instance::new(weight(at)));
    assert_eq!(built.glyph("a").unwrap().width, expected_width);
}

#[test]
fn rule_to_missing_glyph() {
    let mut doc = document();
    let broken = Rule::new("broken")
        .with_condition_set(vec![Condition::between("weight", 100.0, 900.0)])
        .with_sub("a", "a.ss01");
    doc.add_rule(broken);
    let mut processor = Processor::new(&doc, loader(), ProcessorOptions::default());
    processor.load_sources();
    let built = processor.make_instance(&doc.instances[0]);
    assert_eq!(built.glyph("a").unwrap().width, 550.0);
    let problems = processor.problems();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].kind, ProblemKind::Resolution);
}

#[test]
fn generate_writes_instances() {
    init();
    let mut doc = document();
    doc.add_instance(Instance::new(weight(900.0)).with_name("Black").with_path("/out/Black.ufo")).unwrap();
    doc.add_instance(Instance::new(weight(100.0)).with_name("Unsaved")).unwrap();
    let writer = MemoryWriter::new(3);
    let mut processor = Processor::new(&doc, loader(), options());
    let report = processor.generate(&writer);

    assert_eq!(report.written, [PathBuf::from("/out/Medium.ufo"), PathBuf::from("/out/Black.ufo")]);
    assert_eq!(report.skipped, 1);
    assert!(report.problems.is_empty());
    let written = writer.written();
    assert_eq!(written[&PathBuf::from("/out/Black.ufo")].glyph("a").unwrap().width, 600.0);
}

#[test]
fn generate_refuses_newer_targets() {
    let doc = document();
    let writer = MemoryWriter::new(2).with_existing("/out/Medium.ufo", 3);
    let mut processor = Processor::new(&doc, loader(), options());
    let report = processor.generate(&writer);

    assert!(report.written.is_empty());
    assert_eq!(report.skipped, 1);
    assert_eq!(report.problems.len(), 1);
    assert_eq!(report.problems[0].kind, ProblemKind::Persistence);
    assert!(writer.written().is_empty());
}

#[test]
fn generate_reports_missing_default() {
    let mut doc = document();
    doc.sources[0].location = weight(300.0);
    doc.sources[0].copy_info = false;
    let mut processor = Processor::new(&doc, loader(), options());
    let report = processor.generate(&MemoryWriter::new(3));
    assert!(report.problems.iter().any(|p| p.kind == ProblemKind::Structural));
    assert!(report.problems.iter().any(|p| p.kind == ProblemKind::Model));
    assert_eq!(report.written.len(), 1);
}
