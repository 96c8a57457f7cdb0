/// Warning run orchestration
///
/// One run covers one province:
///
/// 1. join the grid with its maximum elevations into the node pool;
/// 2. evaluate the province's towns in record order (warnings consume nodes);
/// 3. propagate warnings to unwarned neighboring towns;
/// 4. write the `.warnings` and `.notifications` files;
/// 5. optionally scan the elevation time series for the earliest onset in
///    each warned town and write the `.earliest` file;
/// 6. optionally render the province's triangles to KML / GeoJSON.

use std::fs;
use std::path::PathBuf;

use crate::alert::neighbors;
use crate::alert::{onset, report, RegionOutcome, RunContext};
use crate::analysis::NodePool;
use crate::config::{EventConfig, OutputConfig, SearchSettings, SurgeConfig};
use crate::ingest::adcirc::{self, Fort14File, Fort63Reader, Maxele63File};
use crate::ingest::boundaries::{self, GeoJsonBoundaries};
use crate::ingest::{ElevationSource, MeshSource, PolygonSource, TimeSeriesSource};
use crate::logging::{self, Stage};
use crate::model::{AdminLevel, EarliestSurge, Notification, Region, Result, SurgeError, Triangle, Warning};
use crate::render::geojson::{self, GeoJsonWriter};
use crate::render::kml::{self, KmlWriter};
use crate::render as maps;

// ---------------------------------------------------------------------------
// Inputs and results
// ---------------------------------------------------------------------------

/// Everything a run reads from.
pub struct RunInputs<'a> {
    pub mesh: &'a mut dyn MeshSource,
    pub elevations: &'a mut dyn ElevationSource,
    pub towns: &'a mut dyn PolygonSource,
    pub barangays: &'a mut dyn PolygonSource,
    /// Province outlines; enable shoreline estimates and maps.
    pub provinces: Option<&'a mut dyn PolygonSource>,
    /// Elevation time series for the onset scan.
    pub time_series: Option<&'a mut dyn TimeSeriesSource>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub skip_onset: bool,
    pub skip_render: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub scope: String,
    pub outcomes: Vec<(String, RegionOutcome)>,
    pub warnings: Vec<Warning>,
    /// Nearest-point notices first, then neighbor notices.
    pub notifications: Vec<Notification>,
    /// Earliest surge per warned town with the hierarchy path of where it hit.
    pub onsets: Vec<(EarliestSurge, Vec<String>)>,
    pub pool_remaining: usize,
    pub files: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

pub fn run(
    scope: &str,
    inputs: RunInputs<'_>,
    settings: SearchSettings,
    output: &OutputConfig,
    event: &EventConfig,
    options: RunOptions,
) -> Result<RunSummary> {
    let RunInputs {
        mesh,
        elevations,
        towns,
        barangays,
        provinces,
        time_series,
    } = inputs;

    let mesh = mesh.load_mesh()?;
    let pool = NodePool::from_mesh(&mesh, elevations.load_max_elevations()?)?;
    logging::info(
        Stage::Mesh,
        None,
        &format!(
            "{}: {} nodes ({} wet), {} triangles",
            mesh.title.trim(),
            pool.len(),
            pool.nodes().iter().filter(|n| n.is_measured()).count(),
            mesh.triangles.len()
        ),
    );
    if pool.is_empty() {
        logging::warn(Stage::Mesh, Some(scope), "grid has no nodes; every town will be skipped");
    }

    let towns = boundaries::in_province(towns.load_regions(AdminLevel::Town)?, scope);
    let barangays = boundaries::in_province(barangays.load_regions(AdminLevel::Barangay)?, scope);
    let outline = match provinces {
        Some(source) => boundaries::in_province(source.load_regions(AdminLevel::Province)?, scope)
            .into_iter()
            .next(),
        None => None,
    };
    logging::info(
        Stage::Boundaries,
        Some(scope),
        &format!(
            "{} towns, {} barangays, province outline {}",
            towns.len(),
            barangays.len(),
            if outline.is_some() { "loaded" } else { "not available" }
        ),
    );
    if towns.is_empty() {
        logging::warn(Stage::Boundaries, Some(scope), "no towns in scope; check scope.province");
    }

    // Warnings and nearest-point notices.
    let mut ctx = RunContext::new(pool, settings);
    let outcomes = ctx.evaluate_regions(&towns, &barangays, outline.as_ref())?;

    // Neighbor propagation.
    let graph = neighbors::load_or_build(&output.neighbor_cache_dir, scope, &towns)?;
    let asymmetric = graph.asymmetric_pairs();
    if !asymmetric.is_empty() {
        logging::warn(
            Stage::Neighbors,
            Some(scope),
            &format!("{} one-way neighbor entries in cache, e.g. {:?}", asymmetric.len(), asymmetric[0]),
        );
    }
    let mut notifications = std::mem::take(&mut ctx.notifications);
    notifications.extend(
        neighbors::propagate(&graph, &ctx.warnings)
            .into_iter()
            .map(Notification::Neighbors),
    );

    let mut files = vec![
        report::write_warnings(&output.directory, scope, &ctx.warnings)?,
        report::write_notifications(&output.directory, scope, &notifications)?,
    ];

    // Earliest onset.
    let mut onsets = Vec::new();
    match time_series {
        Some(series) if !options.skip_onset => {
            let warned: Vec<Region> = towns
                .iter()
                .filter(|t| ctx.warnings.iter().any(|w| w.region == t.name()))
                .cloned()
                .collect();
            let flagged = onset::flag_regions(&warned, &ctx.pool, &settings)?;
            let surges = onset::scan_earliest_onset(series, &flagged, &ctx.pool)?;
            let located = onset::locate_onsets(&surges, &warned, &barangays);
            for (surge, place) in surges.into_iter().zip(located) {
                let path = match place {
                    Some(barangay) => barangay.path.clone(),
                    None => warned
                        .iter()
                        .find(|t| t.name() == surge.region)
                        .map(|t| t.path.clone())
                        .unwrap_or_else(|| vec![surge.region.clone()]),
                };
                onsets.push((surge, path));
            }
            files.push(report::write_earliest(&output.directory, scope, &onsets)?);
        }
        Some(_) => logging::debug(Stage::Onset, Some(scope), "onset scan skipped"),
        None => logging::debug(Stage::Onset, Some(scope), "no time series configured"),
    }

    // Maps.
    if !options.skip_render && (output.kml || output.geojson) {
        match &outline {
            Some(province) => files.extend(render_maps(&ctx.pool, &mesh.triangles, province, output, event)?),
            None => logging::info(Stage::Render, Some(scope), "no province outline, maps skipped"),
        }
    }

    for path in &files {
        logging::info(Stage::System, Some(scope), &format!("wrote {}", path.display()));
    }

    Ok(RunSummary {
        scope: scope.to_string(),
        outcomes: towns
            .iter()
            .map(|t| t.name().to_string())
            .zip(outcomes)
            .collect(),
        warnings: ctx.warnings,
        notifications,
        onsets,
        pool_remaining: ctx.pool.live_count(),
        files,
    })
}

fn render_maps(
    pool: &NodePool,
    triangles: &[Triangle],
    province: &Region,
    output: &OutputConfig,
    event: &EventConfig,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&output.directory).map_err(|e| SurgeError::io(&output.directory, e))?;
    let mut written = Vec::new();

    if output.kml {
        let path = output.directory.join(kml::file_name(
            &event.typhoon_name,
            &event.event_id,
            &event.max_surge_id,
            province.name(),
        ));
        let mut writer = KmlWriter::create(&path)?;
        let count = maps::render_triangles(pool, triangles, province, &mut writer)?;
        logging::info(Stage::Render, Some(province.name()), &format!("{} triangles to KML", count));
        written.push(path);
    }

    if output.geojson {
        let path = output
            .directory
            .join(geojson::file_name(&event.typhoon_name, province.name()));
        let mut writer = GeoJsonWriter::new(&path);
        let count = maps::render_triangles(pool, triangles, province, &mut writer)?;
        logging::info(Stage::Render, Some(province.name()), &format!("{} triangles to GeoJSON", count));
        written.push(path);
    }

    Ok(written)
}

// ---------------------------------------------------------------------------
// File-backed run
// ---------------------------------------------------------------------------

/// Runs with the file sources named in `config`.
pub fn run_from_config(config: &SurgeConfig, options: RunOptions) -> Result<RunSummary> {
    let inputs = &config.inputs;
    let mut mesh = Fort14File::new(&inputs.mesh);
    let mut elevations = Maxele63File::new(&inputs.max_elevation);
    let mut towns = GeoJsonBoundaries::new(&inputs.towns);
    let mut barangays = GeoJsonBoundaries::new(&inputs.barangays);
    let mut provinces = inputs.provinces.as_ref().map(GeoJsonBoundaries::new);

    let mut series = match &inputs.time_series {
        Some(path) if !options.skip_onset => {
            let reference_time = match (config.reference_time_override()?, &inputs.model_parameters) {
                (Some(t), _) => t,
                (None, Some(fort15)) => adcirc::read_reference_time(fort15)?,
                (None, None) => {
                    return Err(SurgeError::malformed(
                        path.display().to_string(),
                        0,
                        "no reference time: set event.reference_time or inputs.model_parameters",
                    ));
                }
            };
            Some(Fort63Reader::open(path, reference_time)?)
        }
        _ => None,
    };

    run(
        &config.scope.province,
        RunInputs {
            mesh: &mut mesh,
            elevations: &mut elevations,
            towns: &mut towns,
            barangays: &mut barangays,
            provinces: provinces.as_mut().map(|p| p as &mut dyn PolygonSource),
            time_series: series.as_mut().map(|s| s as &mut dyn TimeSeriesSource),
        },
        config.search,
        &config.output,
        &config.event,
        options,
    )
}
