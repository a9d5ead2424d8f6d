//! Command behavior against documents on disk.

use std::{fs, path::PathBuf};

use mutatio_cli::{
    commands::{describe, normalize, roundtrip, source_factors, substitutions},
    io::{expand_inputs, read_document},
};
use mutatio_designspace::Location;
use mutatio_varmodel::{ModelOptions, Strategy};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const DOCUMENT: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<designspace format="4.1">
  <axes>
    <axis tag="wght" name="weight" minimum="100" maximum="900" default="400"/>
  </axes>
  <rules>
    <rule name="heavy">
      <conditionset>
        <condition name="weight" minimum="600" maximum="900"/>
      </conditionset>
      <sub name="a" with="a.alt"/>
    </rule>
  </rules>
  <sources>
    <source filename="masters/Regular.ufo" name="Regular" familyname="Test" stylename="Regular">
      <info copy="1"/>
      <location>
        <dimension name="weight" xvalue="400"/>
      </location>
    </source>
    <source filename="masters/Bold.ufo" name="Bold" familyname="Test" stylename="Bold">
      <location>
        <dimension name="weight" xvalue="900"/>
      </location>
    </source>
  </sources>
  <instances>
    <instance name="Medium" familyname="Test" stylename="Medium" filename="instances/Medium.ufo">
      <location>
        <dimension name="weight" xvalue="650"/>
      </location>
    </instance>
  </instances>
</designspace>
"#;

fn fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Test.designspace");
    fs::write(&path, DOCUMENT).unwrap();
    (dir, path)
}

fn names(glyphs: &[&str]) -> Vec<String> {
    glyphs.iter().map(|name| name.to_string()).collect()
}

#[test]
fn directories_expand_to_designspaces() {
    let (dir, path) = fixture();
    fs::write(dir.path().join("notes.txt"), "not a designspace").unwrap();
    assert_eq!(expand_inputs(&[dir.path().to_path_buf()]).unwrap(), vec![path.clone()]);
    assert_eq!(expand_inputs(std::slice::from_ref(&path)).unwrap(), vec![path]);
}

#[test]
fn empty_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(expand_inputs(&[dir.path().to_path_buf()]).is_err());
}

#[test]
fn describe_lists_every_section() {
    let (_dir, path) = fixture();
    let text = describe(&read_document(&path).unwrap(), &path);
    assert!(text.contains("  weight [wght] 100 / 400 / 900"), "{text}");
    assert!(text.contains("  Regular {weight: 400} masters/Regular.ufo, copies info"), "{text}");
    assert!(text.contains("  Medium {weight: 650} instances/Medium.ufo"), "{text}");
    assert!(text.contains("  heavy: 1 condition set, 1 substitution"), "{text}");
    assert!(text.ends_with("default: Regular (at the default location)"), "{text}");
}

#[test]
fn rules_substitute_inside_conditions() {
    let (_dir, path) = fixture();
    let document = read_document(&path).unwrap();
    let glyphs = names(&["a", "b"]);

    let heavy = substitutions(&document, &Location::new().with("weight", 700.0), &glyphs);
    assert_eq!(heavy, vec![("a".to_string(), "a.alt".to_string()), ("b".to_string(), "b".to_string())]);

    let regular = substitutions(&document, &Location::new(), &glyphs);
    assert_eq!(regular, vec![("a".to_string(), "a".to_string()), ("b".to_string(), "b".to_string())]);
}

#[test]
fn factors_for_both_strategies() {
    let (_dir, path) = fixture();
    let document = read_document(&path).unwrap();
    let location = Location::new().with("weight", 650.0);
    for strategy in [Strategy::Mutator, Strategy::Supports] {
        let weights = source_factors(&document, &location, ModelOptions::new().strategy(strategy)).unwrap();
        assert_eq!(weights, vec![("Regular".to_string(), 0.5), ("Bold".to_string(), 0.5)], "{strategy:?}");
    }
}

#[test]
fn factors_need_a_default_source() {
    let (_dir, path) = fixture();
    let mut document = read_document(&path).unwrap();
    document.sources.remove(0);
    assert!(source_factors(&document, &Location::new(), ModelOptions::default()).is_err());
}

#[test]
fn roundtrip_preserves_the_document() {
    let (dir, path) = fixture();
    let output = dir.path().join("copy/Test.designspace");
    roundtrip(&path, &output).unwrap();

    let original = read_document(&path).unwrap();
    let copy = read_document(&output).unwrap();
    assert_eq!(copy.axes, original.axes);
    assert_eq!(copy.rules, original.rules);
    assert_eq!(copy.sources.len(), 2);
    assert_eq!(copy.sources[0].path, original.sources[0].path);
    assert_eq!(copy.sources[0].filename.as_deref(), Some("../masters/Regular.ufo"));
}

#[test]
fn normalize_writes_unit_coordinates() {
    let (dir, path) = fixture();
    let output = dir.path().join("Normalized.designspace");
    normalize(&path, &output).unwrap();

    let document = read_document(&output).unwrap();
    let weight = document.axes.get("weight").unwrap();
    assert_eq!((weight.minimum, weight.default, weight.maximum), (-1.0, 0.0, 1.0));
    assert_eq!(document.sources[1].location.value("weight"), Some(1.0));
    assert_eq!(document.instances[0].location.as_ref().and_then(|l| l.value("weight")), Some(0.5));
    assert_eq!(document.rules[0].condition_sets[0][0].minimum, Some(0.4));
}
