use std::env;
use std::path::PathBuf;

use camera::Easing;
use catalog::{JsonFileSource, LocationSource};
use clustering::{ClusterOrder, GeoClusterer};
use engine::{EngineConfig, FrameOutput, GlobeEngine};
use flight::{FlightEvent, FlightPath, FlightStatus};
use foundation::math::Vec3;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Frames simulated before `fly` gives up on a journey that never completes.
const MAX_SIMULATED_FRAMES: u64 = 1_000_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "cluster" => cmd_cluster(args),
        "fly" => cmd_fly(args),
        "project" => cmd_project(args),
        _ => Err(usage()),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig, String> {
    EngineConfig::load(path.as_deref()).map_err(|e| e.to_string())
}

fn value_of<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_f64(s: &str, flag: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .map_err(|e| format!("{flag}: invalid number {s:?}: {e}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let payload = serde_json::to_string_pretty(value).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}

fn cmd_cluster(args: Vec<String>) -> Result<(), String> {
    // atlas cluster <locations.json> [--radius-km N] [--order input|canonical] [--config FILE]
    if args.is_empty() {
        return Err(usage());
    }

    let input = PathBuf::from(&args[0]);
    let mut config_path: Option<PathBuf> = None;
    let mut radius_km: Option<f64> = None;
    let mut order: Option<ClusterOrder> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => config_path = Some(PathBuf::from(value_of(&args, &mut i, "--config")?)),
            "--radius-km" => {
                radius_km = Some(parse_f64(value_of(&args, &mut i, "--radius-km")?, "--radius-km")?)
            }
            "--order" => {
                order = Some(match value_of(&args, &mut i, "--order")? {
                    "input" => ClusterOrder::Input,
                    "canonical" => ClusterOrder::Canonical,
                    other => {
                        return Err(format!(
                            "--order: expected input or canonical, got {other:?}"
                        ));
                    }
                })
            }
            s => return Err(format!("unknown arg: {s}\n\n{}", usage())),
        }
        i += 1;
    }

    let mut cluster_config = load_config(config_path)?.cluster;
    if let Some(radius_km) = radius_km {
        cluster_config.radius_km = radius_km;
    }
    if let Some(order) = order {
        cluster_config.order = order;
    }

    let locations = JsonFileSource::new(&input)
        .locations()
        .map_err(|e| e.to_string())?;
    let clusters = GeoClusterer::new(cluster_config).cluster(&locations);
    info!(
        input = %input.display(),
        locations = locations.len(),
        clusters = clusters.len(),
        "clustered"
    );
    print_json(&clusters)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlightReport {
    stops: usize,
    segments: usize,
    dropped: usize,
    frames: u64,
    engine_time_ms: f64,
    completed: bool,
    events: Vec<FlightEvent>,
    samples: Vec<FrameOutput>,
}

fn cmd_fly(args: Vec<String>) -> Result<(), String> {
    // atlas fly <locations.json> [--speed X] [--fps N] [--sample-every N] [--follow]
    //           [--great-circle] [--easing NAME] [--config FILE]
    if args.is_empty() {
        return Err(usage());
    }

    let input = PathBuf::from(&args[0]);
    let mut config_path: Option<PathBuf> = None;
    let mut speed: Option<f64> = None;
    let mut fps = 60.0;
    let mut sample_every: u64 = 30;
    let mut follow = false;
    let mut great_circle = false;
    let mut easing: Option<Easing> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => config_path = Some(PathBuf::from(value_of(&args, &mut i, "--config")?)),
            "--speed" => speed = Some(parse_f64(value_of(&args, &mut i, "--speed")?, "--speed")?),
            "--fps" => fps = parse_f64(value_of(&args, &mut i, "--fps")?, "--fps")?,
            "--sample-every" => {
                let v = value_of(&args, &mut i, "--sample-every")?;
                sample_every = v
                    .parse::<u64>()
                    .map_err(|e| format!("--sample-every: {e}"))?;
            }
            "--follow" => follow = true,
            "--great-circle" => great_circle = true,
            "--easing" => {
                easing = Some(
                    value_of(&args, &mut i, "--easing")?
                        .parse::<Easing>()
                        .map_err(|e| e.to_string())?,
                )
            }
            s => return Err(format!("unknown arg: {s}\n\n{}", usage())),
        }
        i += 1;
    }
    if !(fps.is_finite() && fps > 0.0) {
        return Err(format!("--fps must be positive, got {fps}"));
    }

    let mut config = load_config(config_path)?;
    if follow {
        config.flight.camera_follows_plane = true;
    }
    if great_circle {
        config.flight.path = FlightPath::GreatCircle;
    }
    if let Some(easing) = easing {
        config.camera.easing = easing;
    }

    let mut engine = GlobeEngine::new(config);
    let dropped = engine
        .load_from(&JsonFileSource::new(&input))
        .map_err(|e| e.to_string())?;
    if let Some(speed) = speed {
        engine.set_speed(speed);
    }
    engine.show_overview();
    engine.play().map_err(|e| e.to_string())?;

    let step_ms = 1000.0 / fps;
    let mut host_ms = 0.0;
    let mut events = Vec::new();
    let mut samples = Vec::new();
    let mut frames = 0u64;
    let mut engine_time_ms = 0.0;
    while frames < MAX_SIMULATED_FRAMES {
        let Some(out) = engine.frame(host_ms) else {
            break;
        };
        frames += 1;
        host_ms += step_ms;
        engine_time_ms = out.time_ms;
        events.extend(out.events.iter().cloned());

        let done = out.flight.status == FlightStatus::Completed;
        if sample_every > 0 && (out.frame_index % sample_every == 0 || done) {
            samples.push(out);
        }
        if done {
            break;
        }
    }

    let state = engine.flight_state();
    let report = FlightReport {
        stops: engine.flight().locations().len(),
        segments: engine.flight().segment_count(),
        dropped,
        frames,
        engine_time_ms,
        completed: state.status == FlightStatus::Completed,
        events,
        samples,
    };
    info!(
        frames = report.frames,
        segments = report.segments,
        completed = report.completed,
        "flight simulated"
    );
    print_json(&report)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Projected {
    lat: f64,
    lng: f64,
    altitude: f64,
    xyz: [f64; 3],
    radius: f64,
    unprojected: [f64; 3],
}

fn cmd_project(args: Vec<String>) -> Result<(), String> {
    // atlas project <lat> <lng> [altitude] [--config FILE]
    let mut positional: Vec<f64> = Vec::new();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => config_path = Some(PathBuf::from(value_of(&args, &mut i, "--config")?)),
            s => positional.push(parse_f64(s, "coordinate")?),
        }
        i += 1;
    }
    let (lat, lng, altitude) = match positional.as_slice() {
        [lat, lng] => (*lat, *lng, 0.0),
        [lat, lng, altitude] => (*lat, *lng, *altitude),
        _ => return Err(usage()),
    };

    let sphere = load_config(config_path)?.projection.sphere();
    let xyz: Vec3 = sphere.project(lat, lng, altitude);
    let (u_lat, u_lng, u_alt) = sphere.unproject(xyz);
    print_json(&Projected {
        lat,
        lng,
        altitude,
        xyz: xyz.as_array(),
        radius: xyz.length(),
        unprojected: [u_lat, u_lng, u_alt],
    })
}

fn usage() -> String {
    let exe = env::args().next().unwrap_or_else(|| "atlas".to_string());
    format!(
        "Usage:\n  {exe} cluster <locations.json> [--radius-km N] [--order input|canonical] [--config FILE]\n  {exe} fly <locations.json> [--speed X] [--fps N] [--sample-every N] [--follow] [--great-circle] [--easing NAME] [--config FILE]\n  {exe} project <lat> <lng> [altitude] [--config FILE]\n\nNotes:\n- Location files are JSON arrays of {{id, name, latitude, longitude, visitDate, albumCount, photoCount}}.\n- Settings come from defaults, then --config, then ATLAS_* environment variables, then flags.\n- Output is JSON on stdout; logs go to stderr (set RUST_LOG=debug for detail).\n"
    )
}
