use std::env;
use std::path::Path;

use formats::{Coordinate, CountryCatalog, CountrySummary};
use foundation::math::{LatLng, Vec3, normalize_lng, sphere_point_to_lat_lng};
use scene::camera::SELECTION_ALTITUDE;
use scene::{CameraPose, CountryHit, locate_country, locate_lat_lng, search_countries};
use serde_json::{Value, json};

const DEFAULT_SEARCH_LIMIT: usize = 10;

fn main() {
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

    let out = match cmd.as_str() {
        "countries" => cmd_countries(&args),
        "locate" => cmd_locate(&args),
        "lookup" => cmd_lookup(&args),
        "search" => cmd_search(&args),
        "fingerprint" => cmd_fingerprint(&args),
        _ => Err(usage()),
    }?;

    let payload = serde_json::to_string_pretty(&out).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}

fn load(path: &str) -> Result<CountryCatalog, String> {
    CountryCatalog::load(Path::new(path)).map_err(|e| e.to_string())
}

fn parse_f64(name: &str, s: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{name} must be a finite number, got {s:?}"))
}

fn cmd_countries(args: &[String]) -> Result<Value, String> {
    // globe countries <path>
    let [path] = args else {
        return Err(usage());
    };
    let catalog = load(path)?;
    let out: Vec<CountrySummary> = catalog
        .countries()
        .iter()
        .map(CountrySummary::from_record)
        .collect();
    serde_json::to_value(out).map_err(|e| format!("json: {e}"))
}

fn hit_json(coordinate: Option<LatLng>, hit: Option<CountryHit<'_>>) -> Value {
    let country = hit.map(|h| {
        CountrySummary::from_record(h.record())
            .with_camera(CameraPose::looking_at(h.coordinate(), SELECTION_ALTITUDE))
    });
    json!({
        "coordinate": coordinate.map(Coordinate::from),
        "country": country,
    })
}

fn cmd_locate(args: &[String]) -> Result<Value, String> {
    // globe locate <path> <x> <y> <z>
    let [path, x, y, z] = args else {
        return Err(usage());
    };
    let point = Vec3::new(parse_f64("x", x)?, parse_f64("y", y)?, parse_f64("z", z)?);
    let catalog = load(path)?;
    let set = catalog.countries();
    Ok(hit_json(sphere_point_to_lat_lng(point), locate_country(&set, point)))
}

fn cmd_lookup(args: &[String]) -> Result<Value, String> {
    // globe lookup <path> <lat> <lng>
    let [path, lat, lng] = args else {
        return Err(usage());
    };
    let coordinate = LatLng::new(parse_f64("lat", lat)?, normalize_lng(parse_f64("lng", lng)?));
    if !(-90.0..=90.0).contains(&coordinate.lat) {
        return Err(format!("lat must be within [-90, 90], got {}", coordinate.lat));
    }
    let catalog = load(path)?;
    let set = catalog.countries();
    Ok(hit_json(Some(coordinate), locate_lat_lng(&set, coordinate)))
}

fn cmd_search(args: &[String]) -> Result<Value, String> {
    // globe search <path> <query> [--limit N]
    let mut positional: Vec<&str> = Vec::new();
    let mut limit = DEFAULT_SEARCH_LIMIT;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => {
                i += 1;
                let v = args.get(i).ok_or("--limit requires a value")?;
                limit = v
                    .parse::<usize>()
                    .map_err(|_| format!("--limit must be a non-negative integer, got {v:?}"))?;
            }
            s if s.starts_with("--") => {
                return Err(format!("unknown arg: {s}\n\n{}", usage()));
            }
            s => positional.push(s),
        }
        i += 1;
    }

    let &[path, query] = positional.as_slice() else {
        return Err(usage());
    };
    let catalog = load(path)?;
    let set = catalog.countries();
    let out: Vec<Value> = search_countries(&set, query, limit)
        .iter()
        .map(|m| {
            json!({
                "match": format!("{:?}", m.kind).to_lowercase(),
                "country": CountrySummary::from(m),
            })
        })
        .collect();
    Ok(Value::Array(out))
}

fn cmd_fingerprint(args: &[String]) -> Result<Value, String> {
    // globe fingerprint <path>
    let [path] = args else {
        return Err(usage());
    };
    let catalog = load(path)?;
    let set = catalog.countries();
    let unsupported: Vec<&str> = set
        .iter()
        .filter(|r| r.boundary.parts().is_empty())
        .map(|r| r.name.as_str())
        .collect();
    Ok(json!({
        "fingerprint": catalog.fingerprint().as_str(),
        "count": set.len(),
        "withoutBoundary": unsupported,
        "duplicateNames": set.duplicate_names(),
    }))
}

fn usage() -> String {
    let exe = env::args().next().unwrap_or_else(|| "globe".to_string());
    format!(
        "Usage:\n  {exe} countries <countries.geojson>\n  {exe} locate <countries.geojson> <x> <y> <z>\n  {exe} lookup <countries.geojson> <lat> <lng>\n  {exe} search <countries.geojson> <query> [--limit N]\n  {exe} fingerprint <countries.geojson>\n\nNotes:\n- Points for `locate` are in the globe's local frame; any radius works.\n- Output is JSON on stdout.\n"
    )
}
