//! The plots drawn for every sample, as data.

use std::path::PathBuf;

use nb_core::ImageSink;
use nb_viz_render::{Hist2dMeta, HistStyle, LegendLocation, PlotMeta, PlotRenderer, Role, Series};
use tracing::info;

use crate::aggregate::{AggregatedSample, FieldSpec};
use crate::config::ModuleConfig;

const NUMBER_PRIMARIES: FieldSpec = FieldSpec::event("NumberPrimaries");
const NUMBER_PRIMARIES_TRACK_LIKE: FieldSpec = FieldSpec::event("NumberPrimariesTrackLike");
const NUMBER_PRIMARIES_SHOWER_LIKE: FieldSpec = FieldSpec::event("NumberPrimariesShowerLike");

const NUMBER_MC_TRACKS: FieldSpec = FieldSpec::event("NumberMCTracks");
const MC_TRACK_LENGTH: FieldSpec = FieldSpec::object("MCTrackLength");
const MC_TRACK_MOMENTUM: FieldSpec = FieldSpec::object("MCTrackMomentum");
const NUMBER_MC_SHOWERS: FieldSpec = FieldSpec::event("NumberMCShowers");
const MC_SHOWER_ENERGY: FieldSpec = FieldSpec::object("MCShowerEnergy");

const NUMBER_HITS: FieldSpec = FieldSpec::event("NumberHits");
const HIT_WIRES: FieldSpec = FieldSpec::event("HitWires");
const HIT_START_TIME: FieldSpec = FieldSpec::object("HitStartTime");
const HIT_PEAK_AMP: FieldSpec = FieldSpec::object("HitPeakAmp");
const HIT_RMS: FieldSpec = FieldSpec::object("HitRMS");
const HIT_INTEGRAL: FieldSpec = FieldSpec::object("HitIntegral");

const NUMBER_TRACKS: FieldSpec = FieldSpec::event("NumberTracks");
const TRACK_LENGTH: FieldSpec = FieldSpec::object("TrackLength");
const TRACK_MOMENTUM: FieldSpec = FieldSpec::object("TrackMomentum");
const NUMBER_SHOWERS: FieldSpec = FieldSpec::event("NumberShowers");
const SHOWER_ENERGY: FieldSpec = FieldSpec::object("ShowerEnergy");

const TRACK_MULTIPLICITY_DIFF: FieldSpec = FieldSpec::event("TrackMultiplicityDiff");
const SHOWER_MULTIPLICITY_DIFF: FieldSpec = FieldSpec::event("ShowerMultiplicityDiff");

const TRUE_EVENT_MOMENTUM: FieldSpec = FieldSpec::event("TrueEventMomentum");
const TRUE_EVENT_ENERGY: FieldSpec = FieldSpec::event("TrueEventEnergy");
const TRUE_EVENT_INVARIANT_MASS: FieldSpec = FieldSpec::event("TrueEventInvariantMass");
const MC_RECO_EVENT_MOMENTUM: FieldSpec = FieldSpec::event("MCRecoEventMomentum");
const MC_RECO_EVENT_ENERGY: FieldSpec = FieldSpec::event("MCRecoEventEnergy");
const MC_RECO_EVENT_INVARIANT_MASS: FieldSpec = FieldSpec::event("MCRecoEventInvariantMass");
// One entry per reconstructed vertex.
const RECO_EVENT_MOMENTUM: FieldSpec = FieldSpec::object("RecoEventMomentum");
const RECO_EVENT_ENERGY: FieldSpec = FieldSpec::object("RecoEventEnergy");
const RECO_EVENT_INVARIANT_MASS: FieldSpec = FieldSpec::object("RecoEventInvariantMass");

/// Series layout of one plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlotKind {
    Single(Role, FieldSpec),
    Pair([(Role, FieldSpec); 2]),
    /// Truth, MC-reco, reconstructed.
    Triple([FieldSpec; 3]),
    /// A multiplicity difference drawn through the bare figure interface.
    Difference(FieldSpec),
    /// `y` against `x`; the plot's range and bins apply to `x`.
    Density { x: FieldSpec, y: FieldSpec, y_range: (f64, f64), y_bins: usize },
}

impl PlotKind {
    fn fields(&self) -> Vec<FieldSpec> {
        match *self {
            PlotKind::Single(_, f) | PlotKind::Difference(f) => vec![f],
            PlotKind::Pair([(_, a), (_, b)]) => vec![a, b],
            PlotKind::Triple(fs) => fs.to_vec(),
            PlotKind::Density { x, y, .. } => vec![x, y],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotSpec {
    pub name: &'static str,
    pub kind: PlotKind,
    pub title: &'static str,
    pub xlabel: &'static str,
    pub ylabel: &'static str,
    pub range: (f64, f64),
    pub bins: usize,
    /// matplotlib legend `loc` code.
    pub legend: u8,
    pub log: bool,
}

impl PlotSpec {
    fn meta(&self, legend: LegendLocation) -> PlotMeta<'static> {
        PlotMeta {
            title: self.title,
            xlabel: self.xlabel,
            ylabel: self.ylabel,
            range: self.range,
            bins: self.bins,
            legend,
            log: self.log,
        }
    }
}

const fn plot(
    name: &'static str,
    kind: PlotKind,
    title: &'static str,
    xlabel: &'static str,
    ylabel: &'static str,
    range: (f64, f64),
    bins: usize,
) -> PlotSpec {
    PlotSpec { name, kind, title, xlabel, ylabel, range, bins, legend: 1, log: false }
}

use PlotKind::*;
use Role::{McReco, Reco, Truth};

pub const CATALOG: &[PlotSpec] = &[
    // Primaries
    plot("NumberPrimaries", Single(Truth, NUMBER_PRIMARIES), "Number of primary particles", "Number of primaries", "Number of events", (0.0, 20.0), 20),
    plot("NumberPrimariesTrackLike", Single(Truth, NUMBER_PRIMARIES_TRACK_LIKE), "Number of track-like primaries", "Number of primaries", "Number of events", (0.0, 20.0), 20),
    plot("NumberPrimariesShowerLike", Single(Truth, NUMBER_PRIMARIES_SHOWER_LIKE), "Number of shower-like primaries", "Number of primaries", "Number of events", (0.0, 20.0), 20),
    // Tracks
    plot("TrackMultiplicity", Pair([(McReco, NUMBER_MC_TRACKS), (Reco, NUMBER_TRACKS)]), "Track multiplicity", "Number of tracks", "Number of events", (0.0, 20.0), 20),
    plot("TrackLength", Pair([(McReco, MC_TRACK_LENGTH), (Reco, TRACK_LENGTH)]), "Track length", "Track length [cm]", "Number of tracks", (0.0, 100.0), 50),
    plot("TrackMomentum", Pair([(McReco, MC_TRACK_MOMENTUM), (Reco, TRACK_MOMENTUM)]), "Track momentum", "Track momentum [GeV]", "Number of tracks", (0.0, 1.0), 50),
    // Showers
    plot("ShowerMultiplicity", Pair([(McReco, NUMBER_MC_SHOWERS), (Reco, NUMBER_SHOWERS)]), "Shower multiplicity", "Number of showers", "Number of events", (0.0, 20.0), 20),
    plot("ShowerEnergy", Pair([(McReco, MC_SHOWER_ENERGY), (Reco, SHOWER_ENERGY)]), "Shower energy", "Shower energy [GeV]", "Number of showers", (0.0, 1.0), 50),
    // Hits
    plot("NumberHits", Single(Reco, NUMBER_HITS), "Number of hits", "Number of hits", "Number of events", (0.0, 10000.0), 50),
    plot("HitWires", Single(Reco, HIT_WIRES), "Number of hit wires", "Number of hit wires", "Number of events", (0.0, 10000.0), 50),
    plot("HitStartTime", Single(Reco, HIT_START_TIME), "Hit start time", "Start time [TDC]", "Number of hits", (0.0, 3000.0), 60),
    plot("HitPeakAmp", Single(Reco, HIT_PEAK_AMP), "Hit peak amplitude", "Peak amplitude [ADC]", "Number of hits", (0.0, 200.0), 50),
    plot("HitRMS", Single(Reco, HIT_RMS), "Hit RMS", "RMS [TDC]", "Number of hits", (0.0, 50.0), 50),
    plot("HitIntegral", Single(Reco, HIT_INTEGRAL), "Hit integral", "Integral [ADC x TDC]", "Number of hits", (0.0, 1000.0), 50),
    // Multiplicity differences
    plot("TrackMultiplicityDiff", Difference(TRACK_MULTIPLICITY_DIFF), "Track multiplicity difference", "Track multiplicity (mcreco-reco)", "Number of events", (0.0, 20.0), 20),
    plot("ShowerMultiplicityDiff", Difference(SHOWER_MULTIPLICITY_DIFF), "Shower multiplicity difference", "Shower multiplicity (mcreco-reco)", "Number of events", (0.0, 20.0), 20),
    // Event kinematics
    plot("EventMomentum", Triple([TRUE_EVENT_MOMENTUM, MC_RECO_EVENT_MOMENTUM, RECO_EVENT_MOMENTUM]), "Event momentum", "Momentum [GeV]", "Number of events", (0.0, 2.0), 50),
    plot("EventEnergy", Triple([TRUE_EVENT_ENERGY, MC_RECO_EVENT_ENERGY, RECO_EVENT_ENERGY]), "Event energy", "Energy [GeV]", "Number of events", (0.0, 2.0), 50),
    plot("EventInvariantMass", Triple([TRUE_EVENT_INVARIANT_MASS, MC_RECO_EVENT_INVARIANT_MASS, RECO_EVENT_INVARIANT_MASS]), "Event invariant mass", "Invariant mass [GeV]", "Number of events", (0.0, 2.0), 50),
    // Correlations
    plot("TrackLengthVsMomentum", Density { x: TRACK_LENGTH, y: TRACK_MOMENTUM, y_range: (0.0, 1.0), y_bins: 50 }, "Track length vs. momentum", "Track length [cm]", "Track momentum [GeV]", (0.0, 100.0), 50),
];

/// Legend label of the multiplicity-difference plots.
const DIFFERENCE_LABEL: &str = "mcreco-reco";

/// Fields to aggregate for `catalog`, each once, in first-use order.
///
/// With per-module differences enabled the difference fields are read as
/// per-module fields.
pub fn fields(catalog: &[PlotSpec], modules: &ModuleConfig) -> Vec<FieldSpec> {
    let mut out: Vec<FieldSpec> = Vec::new();
    for spec in catalog {
        for mut f in spec.kind.fields() {
            if modules.per_module && matches!(spec.kind, Difference(_)) {
                f = FieldSpec::per_module(f.name);
            }
            if !out.iter().any(|o| o.name == f.name) {
                out.push(f);
            }
        }
    }
    out
}

/// Render every plot of `catalog`. Returns the written paths in order.
pub fn render_all<S: ImageSink>(
    renderer: &mut PlotRenderer<S>,
    catalog: &[PlotSpec],
    sample: &AggregatedSample,
    modules: &ModuleConfig,
) -> nb_viz_render::Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(catalog.len());
    for spec in catalog {
        let legend = LegendLocation::from_code(spec.legend)?;
        let meta = spec.meta(legend);
        let series = move |f: FieldSpec| sample.series(f.name);
        match spec.kind {
            Single(role, f) => {
                info!("Making plot \"{}\"...", spec.title);
                written.push(renderer.render_single(spec.name, Series::new(role, series(f)), &meta)?);
            }
            Pair([(ra, a), (rb, b)]) => {
                info!("Making plot \"{}\"...", spec.title);
                written.push(renderer.render_pair(
                    spec.name,
                    Series::new(ra, series(a)),
                    Series::new(rb, series(b)),
                    &meta,
                )?);
            }
            Triple([truth, mcreco, reco]) => {
                info!("Making plot \"{}\"...", spec.title);
                let triple = [
                    Series::new(Truth, series(truth)),
                    Series::new(McReco, series(mcreco)),
                    Series::new(Reco, series(reco)),
                ];
                written.push(renderer.render_triple(spec.name, triple, &meta)?);
            }
            Difference(f) if modules.per_module => {
                for (m, values) in sample.module_series(f.name).iter().enumerate() {
                    let module = modules.name(m);
                    let name = format!("{}_{module}", spec.name);
                    let title = format!("{} ({module})", spec.title);
                    info!("Making plot \"{name}\"...");
                    written.push(draw_difference(renderer, &name, &title, values, &meta)?);
                }
            }
            Difference(f) => {
                info!("Making plot \"{}\"...", spec.name);
                written.push(draw_difference(renderer, spec.name, spec.title, series(f), &meta)?);
            }
            Density { x, y, y_range, y_bins } => {
                info!("Making plot \"{}\"...", spec.title);
                let meta2 = Hist2dMeta {
                    title: spec.title,
                    xlabel: spec.xlabel,
                    ylabel: spec.ylabel,
                    x_range: spec.range,
                    x_bins: spec.bins,
                    y_range,
                    y_bins,
                    log: spec.log,
                };
                written.push(renderer.render_hist2d(spec.name, series(x), series(y), &meta2)?);
            }
        }
    }
    Ok(written)
}

/// Difference plots go through the figure directly, then the bare finalize.
fn draw_difference<S: ImageSink>(
    renderer: &mut PlotRenderer<S>,
    name: &str,
    title: &str,
    values: &[f64],
    meta: &PlotMeta<'_>,
) -> nb_viz_render::Result<PathBuf> {
    let fig = renderer.figure_mut();
    if let Err(e) = fig.hist(values, meta.range, meta.bins, HistStyle::new(Truth.color(), DIFFERENCE_LABEL)) {
        fig.clear();
        return Err(e);
    }
    fig.title(title);
    fig.xlabel(meta.xlabel);
    fig.ylabel(meta.ylabel);
    fig.legend(meta.legend);
    fig.set_log(meta.log);
    renderer.draw_plot(name)
}

/// Log the size of every aggregated series and a run summary.
pub fn log_summary(sample: &AggregatedSample) {
    for (name, len) in sample.series_sizes() {
        info!("{name} size is {len}");
    }
    info!(
        sample = %sample.sample,
        files_read = sample.files_read,
        files_skipped = sample.files_skipped,
        events = sample.events,
        "aggregation finished"
    );
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Arc;

    use nb_core::{Column, JaggedColumn, Table};
    use nb_viz_render::VizConfig;
    use nb_viz_render::font::FontHandle;

    use super::*;
    use crate::aggregate::{FieldKind, SeriesAccumulator};

    #[derive(Default)]
    struct Recorder {
        saved: Vec<PathBuf>,
    }

    impl ImageSink for Recorder {
        fn save_image(&mut self, _image: &[u8], path: &Path) -> nb_core::Result<()> {
            self.saved.push(path.to_path_buf());
            Ok(())
        }
    }

    fn renderer() -> PlotRenderer<Recorder> {
        PlotRenderer::new(VizConfig::default(), "plots/s", Recorder::default(), Arc::new(FontHandle::empty()))
    }

    /// One event with every catalog field filled.
    fn sample_for(fields: &[FieldSpec], modules: usize) -> AggregatedSample {
        let mut table = Table::new(1);
        for f in fields {
            let column = match f.kind {
                FieldKind::Event => Column::Scalar(vec![1.0]),
                FieldKind::Object => Column::Jagged(JaggedColumn::from_rows([vec![0.5, 0.75]])),
                FieldKind::PerModule => Column::Jagged(JaggedColumn::from_rows([vec![1.0; modules]])),
            };
            table.insert(f.name, column);
        }
        let mut acc = SeriesAccumulator::new(fields);
        acc.append(Path::new("anahist_0.root"), &table, fields).unwrap();
        acc.finish("s")
    }

    #[test]
    fn names_unique_and_legends_valid() {
        let mut names: Vec<_> = CATALOG.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
        assert!(CATALOG.iter().all(|p| LegendLocation::from_code(p.legend).is_ok()));
        assert!(CATALOG.iter().all(|p| p.range.0 < p.range.1 && p.bins > 0));
    }

    #[test]
    fn fields_listed_once() {
        let fs = fields(CATALOG, &ModuleConfig::default());
        let mut names: Vec<_> = fs.iter().map(|f| f.name).collect();
        let n = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), n);
        assert!(fs.contains(&FieldSpec::object("TrackLength")));
        assert!(fs.contains(&FieldSpec::event("TrackMultiplicityDiff")));
        assert!(fs.contains(&FieldSpec::object("RecoEventEnergy")));
    }

    #[test]
    fn per_module_switches_difference_fields() {
        let modules = ModuleConfig { per_module: true, names: BTreeMap::new() };
        let fs = fields(CATALOG, &modules);
        assert!(fs.contains(&FieldSpec::per_module("TrackMultiplicityDiff")));
        assert!(fs.contains(&FieldSpec::per_module("ShowerMultiplicityDiff")));
        assert!(fs.contains(&FieldSpec::event("NumberTracks")));
    }

    #[test]
    fn one_image_per_catalog_entry() {
        let modules = ModuleConfig::default();
        let sample = sample_for(&fields(CATALOG, &modules), 0);
        let mut r = renderer();
        let written = render_all(&mut r, CATALOG, &sample, &modules).unwrap();
        assert_eq!(written.len(), CATALOG.len());
        assert_eq!(r.sink().saved, written);
        assert_eq!(written[0], PathBuf::from("plots/s/NumberPrimaries.png"));
        assert!(r.figure().is_blank());
    }

    #[test]
    fn per_module_plots_are_named_by_module() {
        let mut names = BTreeMap::new();
        names.insert(1, "north".to_string());
        let modules = ModuleConfig { per_module: true, names };
        let diff_only: Vec<PlotSpec> =
            CATALOG.iter().copied().filter(|p| matches!(p.kind, Difference(_))).collect();
        let sample = sample_for(&fields(&diff_only, &modules), 2);
        let mut r = renderer();
        let written = render_all(&mut r, &diff_only, &sample, &modules).unwrap();
        let names: Vec<_> = written.iter().filter_map(|p| p.file_name()?.to_str()).collect();
        assert_eq!(
            names,
            vec![
                "TrackMultiplicityDiff_module0.png",
                "TrackMultiplicityDiff_north.png",
                "ShowerMultiplicityDiff_module0.png",
                "ShowerMultiplicityDiff_north.png",
            ]
        );
    }
}
