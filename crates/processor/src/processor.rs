//! Builds instances from a document and its loaded sources.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use mutatio_designspace::{DefaultSource, Document, GlyphMaster, Instance, Location, Source};
use mutatio_varmodel::{CacheKey, Interpolable, ModelError, ModelOptions, SharedMutatorCache, VariationModel};
use rayon::prelude::*;

use crate::{
    artifact::{ArtifactLoader, GlyphGeometry, InstanceWriter, SourceArtifact},
    config::{INFO_KEY, KERNING_KEY},
    instance::{BuiltGlyph, BuiltInstance, InstanceNames},
    problem::Problem,
    rename::{scratch_name, swap_names},
};

type Info<L> = <<L as ArtifactLoader>::Artifact as SourceArtifact>::Info;
type Kerning<L> = <<L as ArtifactLoader>::Artifact as SourceArtifact>::Kerning;
type Glyph<L> = <<L as ArtifactLoader>::Artifact as SourceArtifact>::Glyph;

/// The instance type produced for artifact type `A`.
pub type InstanceOf<A> =
    BuiltInstance<<A as SourceArtifact>::Info, <A as SourceArtifact>::Kerning, <A as SourceArtifact>::Glyph>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorOptions {
    pub model: ModelOptions,
    /// Round interpolated glyph geometry to integers.
    pub round_geometry: bool,
    /// Apply the document's substitution rules to built instances.
    pub process_rules: bool,
    /// Decompose components before building glyph models.
    pub decompose: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self { model: ModelOptions::default(), round_geometry: false, process_rules: true, decompose: false }
    }
}

impl ProcessorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: ModelOptions) -> Self {
        self.model = model;
        self
    }

    pub fn round_geometry(mut self, round: bool) -> Self {
        self.round_geometry = round;
        self
    }

    pub fn process_rules(mut self, process: bool) -> Self {
        self.process_rules = process;
        self
    }

    pub fn decompose(mut self, decompose: bool) -> Self {
        self.decompose = decompose;
        self
    }
}

/// Outcome of [`Processor::generate`].
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub written: Vec<PathBuf>,
    /// Instances without a path, or whose write was refused or failed.
    pub skipped: usize,
    pub problems: Vec<Problem>,
}

impl GenerateReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.skipped
    }

    pub fn all_succeeded(&self) -> bool {
        self.skipped == 0 && self.problems.is_empty()
    }
}

/// Loads the sources of a document once and builds instances from them.
///
/// Variation models are cached per data kind and glyph. Problems never abort
/// a run: they are logged and collected, and the affected value is left out.
pub struct Processor<'a, L: ArtifactLoader> {
    document: &'a Document,
    loader: L,
    options: ProcessorOptions,
    artifacts: IndexMap<String, L::Artifact>,
    glyph_names: Vec<String>,
    loaded: bool,
    info_models: SharedMutatorCache<VariationModel<Info<L>>>,
    kerning_models: SharedMutatorCache<VariationModel<Kerning<L>>>,
    glyph_models: SharedMutatorCache<VariationModel<Glyph<L>>>,
    problems: Mutex<Vec<Problem>>,
}

impl<'a, L: ArtifactLoader> Processor<'a, L> {
    pub fn new(document: &'a Document, loader: L, options: ProcessorOptions) -> Self {
        Self {
            document,
            loader,
            options,
            artifacts: IndexMap::new(),
            glyph_names: Vec::new(),
            loaded: false,
            info_models: SharedMutatorCache::new(),
            kerning_models: SharedMutatorCache::new(),
            glyph_models: SharedMutatorCache::new(),
            problems: Mutex::new(Vec::new()),
        }
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Union of the glyph names of all loaded sources, in first-seen order.
    pub fn glyph_names(&self) -> &[String] {
        &self.glyph_names
    }

    pub fn artifact(&self, source: &str) -> Option<&L::Artifact> {
        self.artifacts.get(source)
    }

    fn report(&self, problem: Problem) {
        warn!("{problem}");
        self.problems.lock().unwrap_or_else(PoisonError::into_inner).push(problem);
    }

    /// Problems collected so far.
    pub fn problems(&self) -> Vec<Problem> {
        self.problems.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn take_problems(&mut self) -> Vec<Problem> {
        std::mem::take(self.problems.get_mut().unwrap_or_else(PoisonError::into_inner))
    }

    /// Loads every source not loaded yet. A source that cannot be loaded is
    /// recorded as a problem and stays absent.
    pub fn load_sources(&mut self) {
        let document = self.document;
        for source in &document.sources {
            if self.artifacts.contains_key(&source.name) {
                continue;
            }
            let Some(path) = source.path.as_deref() else {
                self.report(Problem::resolution(&source.name, "source has no path"));
                continue;
            };
            match self.loader.load(path) {
                Ok(artifact) => {
                    info!("loaded source '{}' from {}", source.name, path.display());
                    self.artifacts.insert(source.name.clone(), artifact);
                }
                Err(e) => self.report(Problem::from_load(&source.name, &e)),
            }
        }
        let names: IndexSet<String> = self.artifacts.values().flat_map(|artifact| artifact.glyph_names()).collect();
        self.glyph_names = names.into_iter().collect();
        self.loaded = true;
    }

    fn loaded_sources(&self) -> impl Iterator<Item = (&'a Source, &L::Artifact)> {
        self.document
            .sources
            .iter()
            .filter_map(|source| self.artifacts.get(&source.name).map(|artifact| (source, artifact)))
    }

    fn build_model<V: Interpolable>(&self, items: Vec<(Location, V)>) -> Result<VariationModel<V>, ModelError> {
        let bias = self.document.default_location();
        VariationModel::build(items, &self.document.axes, Some(&bias), self.options.model)
    }

    /// Model over the font info of every loaded source that does not mute it.
    pub fn info_model(&self) -> Result<Arc<VariationModel<Info<L>>>, ModelError> {
        self.info_models.get_or_build(CacheKey::new(INFO_KEY, false), || {
            let items = self
                .loaded_sources()
                .filter(|(source, _)| !source.mute_info)
                .map(|(source, artifact)| (source.location.clone(), artifact.info()))
                .collect();
            self.build_model(items)
        })
    }

    /// Model over the kerning of every loaded source that does not mute it.
    pub fn kerning_model(&self) -> Result<Arc<VariationModel<Kerning<L>>>, ModelError> {
        self.kerning_models.get_or_build(CacheKey::new(KERNING_KEY, false), || {
            let items = self
                .loaded_sources()
                .filter(|(source, _)| !source.mute_kerning)
                .map(|(source, artifact)| (source.location.clone(), artifact.kerning()))
                .collect();
            self.build_model(items)
        })
    }

    /// Model over glyph `name` in every loaded source that has it and does
    /// not mute it. A source layer the artifact lacks falls back to the
    /// default layer.
    pub fn glyph_model(&self, name: &str, decompose: bool) -> Result<Arc<VariationModel<Glyph<L>>>, ModelError> {
        self.glyph_models.get_or_build(CacheKey::new(name, decompose), || {
            let items = self
                .loaded_sources()
                .filter(|(source, _)| !source.is_glyph_muted(name))
                .filter_map(|(source, artifact)| {
                    let layer = match source.layer_name.as_deref() {
                        Some(layer) if artifact.has_layer(layer) => Some(layer),
                        Some(layer) => {
                            debug!("source '{}' has no layer '{layer}', using the default layer", source.name);
                            None
                        }
                        None => None,
                    };
                    artifact.glyph(layer, name, decompose).map(|glyph| (source.location.clone(), glyph))
                })
                .collect();
            self.build_model(items)
        })
    }

    /// Uncached model over per-glyph masters given by an instance.
    fn explicit_glyph_model(
        &self,
        subject: &str,
        name: &str,
        masters: &[GlyphMaster],
    ) -> Result<VariationModel<Glyph<L>>, ModelError> {
        let mut items = Vec::new();
        for master in masters {
            let Some(source_name) = master.source.as_deref() else {
                self.report(Problem::structural(subject, "glyph master without a source"));
                continue;
            };
            let Some(artifact) = self.artifacts.get(source_name) else {
                self.report(Problem::resolution(subject, format!("source '{source_name}' is not loaded")));
                continue;
            };
            let glyph_name = master.glyph_name.as_deref().unwrap_or(name);
            let Some(glyph) = artifact.glyph(None, glyph_name, self.options.decompose) else {
                self.report(Problem::resolution(subject, format!("source '{source_name}' has no glyph '{glyph_name}'")));
                continue;
            };
            let location = master
                .location
                .clone()
                .or_else(|| self.document.source(source_name).map(|source| source.location.clone()))
                .unwrap_or_default();
            items.push((location, glyph));
        }
        self.build_model(items)
    }

    /// Code points of `name` in the default source, or else in the first
    /// source that maps it.
    fn neutral_unicodes(&self, name: &str) -> Vec<u32> {
        let default = self
            .document
            .find_default()
            .index()
            .and_then(|index| self.artifacts.get(&self.document.sources[index].name))
            .map(|artifact| artifact.unicodes(name))
            .filter(|unicodes| !unicodes.is_empty());
        default
            .or_else(|| {
                self.loaded_sources()
                    .map(|(_, artifact)| artifact.unicodes(name))
                    .find(|unicodes| !unicodes.is_empty())
            })
            .unwrap_or_default()
    }

    fn copy_donors(&self, built: &mut InstanceOf<L::Artifact>) {
        for (source, artifact) in self.loaded_sources() {
            if source.copy_info {
                if let Some(info) = built.info.as_mut() {
                    artifact.copy_info_into(info);
                }
                built.donors.info = Some(source.name.clone());
            }
            if source.copy_lib {
                for (key, value) in artifact.lib() {
                    built.lib.insert(key, value);
                }
                built.donors.lib = Some(source.name.clone());
            }
            if source.copy_groups {
                built.groups = artifact.groups();
                built.donors.groups = Some(source.name.clone());
            }
            if source.copy_features {
                built.features = artifact.features();
                built.donors.features = Some(source.name.clone());
            }
        }
    }

    fn build_glyph(
        &self,
        instance: &Instance,
        label: &str,
        name: &str,
        location: &Location,
    ) -> Option<(BuiltGlyph<Glyph<L>>, Vec<u32>)> {
        let overrides = instance.glyphs.get(name);
        let note = overrides.and_then(|o| o.note.clone());
        if overrides.is_some_and(|o| o.mute) {
            return Some((BuiltGlyph::muted(note), Vec::new()));
        }

        let subject = format!("{label}/{name}");
        let glyph_location = overrides.and_then(|o| o.instance_location.as_ref()).unwrap_or(location);
        let masters = overrides.and_then(|o| o.masters.as_deref()).filter(|masters| !masters.is_empty());
        let geometry = match masters {
            Some(masters) => self
                .explicit_glyph_model(&subject, name, masters)
                .map(|model| model.make_instance(glyph_location)),
            None => self
                .glyph_model(name, self.options.decompose)
                .map(|model| model.make_instance(glyph_location)),
        };
        let geometry = match geometry {
            Ok(geometry) if self.options.round_geometry => geometry.round(),
            Ok(geometry) => geometry,
            Err(e) => {
                self.report(Problem::from_model(subject, &e));
                return None;
            }
        };
        let unicodes = overrides.and_then(|o| o.unicodes.clone()).unwrap_or_else(|| self.neutral_unicodes(name));
        Some((BuiltGlyph { geometry: Some(geometry), note }, unicodes))
    }

    fn apply_rules(&self, built: &mut InstanceOf<L::Artifact>, location: &Location, label: &str) {
        let substituted = self.document.process_rules(location, self.glyph_names.as_slice());
        for (old, new) in self.glyph_names.iter().zip(&substituted) {
            if old == new {
                continue;
            }
            let scratch = scratch_name(old, &*built);
            if let Err(e) = swap_names(built, old, new, &scratch) {
                self.report(Problem::from_swap(format!("{label}/{old}"), &e));
            }
        }
    }

    /// Builds `instance` from the loaded sources.
    pub fn make_instance(&self, instance: &Instance) -> InstanceOf<L::Artifact> {
        let label = instance.label();
        let location = instance.location.clone().unwrap_or_default();
        let mut built = BuiltInstance::new(InstanceNames::from(instance), location.clone());

        if instance.kerning {
            match self.kerning_model() {
                Ok(model) => built.kerning = Some(model.make_instance(&location)),
                Err(e) => self.report(Problem::from_model(format!("{label} kerning"), &e)),
            }
        }
        if instance.info {
            match self.info_model() {
                Ok(model) => built.info = Some(model.make_instance(&location)),
                Err(e) => self.report(Problem::from_model(format!("{label} info"), &e)),
            }
        }
        self.copy_donors(&mut built);
        for (key, value) in instance.lib.iter() {
            built.lib.insert(key.clone(), value.clone());
        }

        built.glyph_order = self.glyph_names.clone();
        for name in &self.glyph_names {
            if let Some((glyph, unicodes)) = self.build_glyph(instance, &label, name, &location) {
                if !unicodes.is_empty() {
                    built.unicodes.insert(name.clone(), unicodes);
                }
                built.glyphs.insert(name.clone(), glyph);
            }
        }

        if self.options.process_rules {
            self.apply_rules(&mut built, &location, &label);
        }
        debug!("built instance {label} with {} glyphs", built.glyphs.len());
        built
    }

    fn generate_one<W>(&self, instance: &Instance, path: &Path, writer: &W) -> bool
    where
        W: InstanceWriter<L::Artifact>,
    {
        let label = instance.label();
        let version = writer.format_version();
        if let Some(existing) = writer.existing_format_version(path)
            && existing > version
        {
            self.report(Problem::persistence(
                label,
                format!("cannot overwrite format {existing} at {} with format {version}", path.display()),
            ));
            return false;
        }
        let built = self.make_instance(instance);
        match writer.write(&built, path) {
            Ok(()) => {
                info!("generated {label} at {}", path.display());
                true
            }
            Err(e) => {
                self.report(Problem::from_write(label, &e));
                false
            }
        }
    }

    /// Builds and writes every instance that has a path, in parallel.
    pub fn generate<W>(&mut self, writer: &W) -> GenerateReport
    where
        L: Sync,
        W: InstanceWriter<L::Artifact> + Sync,
    {
        if !self.loaded {
            self.load_sources();
        }
        match self.document.find_default() {
            DefaultSource::Found { .. } => {}
            DefaultSource::Ambiguous { candidates } => {
                let names: Vec<&str> =
                    candidates.iter().map(|&i| self.document.sources[i].name.as_str()).collect();
                self.report(Problem::structural("document", format!("ambiguous default source: {}", names.join(", "))));
            }
            DefaultSource::Missing => self.report(Problem::structural("document", "no default source")),
        }

        let this = &*self;
        let outcomes: Vec<Option<PathBuf>> = self
            .document
            .instances
            .par_iter()
            .map(|instance| {
                let path = instance.path.as_deref()?;
                this.generate_one(instance, path, writer).then(|| path.to_path_buf())
            })
            .collect();

        let written: Vec<PathBuf> = outcomes.iter().flatten().cloned().collect();
        let skipped = outcomes.len() - written.len();
        info!("generate: {} written, {skipped} skipped", written.len());
        GenerateReport { written, skipped, problems: self.take_problems() }
    }
}
