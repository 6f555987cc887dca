use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geo::Coordinates;

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceRecord {
    pub position: Coordinates,
    pub non_service_cost: f64,
    pub pcc: f64,
    pub cores: u32,
    pub memory: f64,
    pub storage: f64,
    pub workload: f64,
    pub service: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerRecord {
    pub position: Coordinates,
    pub activation_cost: f64,
    pub pcc_per_core: f64,
    pub cores: u32,
    pub memory: f64,
    pub storage: f64,
    pub unit_processing_ms: f64,
}

/// Supplies the raw entities of a scenario.
pub trait DataSource {
    fn devices(&mut self, count: usize) -> Result<Vec<DeviceRecord>>;
    fn edge_servers(&mut self, count: usize) -> Result<Vec<ServerRecord>>;
    fn cloud_servers(&mut self, count: usize) -> Result<Vec<ServerRecord>>;
}

const DEVICE_HEADER: &str = "# LAT LON CND PCC PCN MEM STO S_d SVC";
const SERVER_HEADER: &str = "# LAT LON CSC PCC PCN MEM STO T_p";

/// Parses a whitespace-delimited device table. Rows starting with `#` are
/// headers; malformed rows are logged and skipped.
pub fn parse_devices(text: &str) -> Vec<DeviceRecord> {
    parse_rows(text, "device", |fields| {
        Ok(DeviceRecord {
            position: Coordinates::new(field(fields, 1)?, field(fields, 2)?),
            non_service_cost: field(fields, 3)?,
            pcc: field(fields, 4)?,
            cores: field(fields, 5)?,
            memory: field(fields, 6)?,
            storage: field(fields, 7)?,
            workload: field(fields, 8)?,
            service: field(fields, 9)?,
        })
    })
}

pub fn parse_servers(text: &str) -> Vec<ServerRecord> {
    parse_rows(text, "server", |fields| {
        Ok(ServerRecord {
            position: Coordinates::new(field(fields, 1)?, field(fields, 2)?),
            activation_cost: field(fields, 3)?,
            pcc_per_core: field(fields, 4)?,
            cores: field(fields, 5)?,
            memory: field(fields, 6)?,
            storage: field(fields, 7)?,
            unit_processing_ms: field(fields, 8)?,
        })
    })
}

fn parse_rows<T, F>(text: &str, kind: &str, parse: F) -> Vec<T>
where
    F: Fn(&[&str]) -> std::result::Result<T, String>,
{
    let mut records = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let fields = line.split_whitespace().collect::<Vec<_>>();
        match fields.first() {
            None => continue,
            Some(&"#") => continue,
            Some(_) => {}
        }
        match parse(&fields) {
            Ok(record) => records.push(record),
            Err(reason) => warn!(kind, line = line_no + 1, %reason, "skipping malformed record"),
        }
    }
    records
}

fn field<T: FromStr>(fields: &[&str], idx: usize) -> std::result::Result<T, String> {
    let raw = fields
        .get(idx)
        .ok_or_else(|| format!("missing column {}", idx))?;
    raw.parse()
        .map_err(|_| format!("invalid value '{}' in column {}", raw, idx))
}

pub fn render_devices(records: &[DeviceRecord]) -> String {
    let mut out = String::from(DEVICE_HEADER);
    out.push('\n');
    for (idx, r) in records.iter().enumerate() {
        out.push_str(&format!(
            "{} {:.6} {:.6} {:.6} {:.6} {} {:.6} {:.6} {:.6} {}\n",
            idx + 1,
            r.position.lat,
            r.position.lon,
            r.non_service_cost,
            r.pcc,
            r.cores,
            r.memory,
            r.storage,
            r.workload,
            r.service
        ));
    }
    out
}

pub fn render_servers(records: &[ServerRecord]) -> String {
    let mut out = String::from(SERVER_HEADER);
    out.push('\n');
    for (idx, r) in records.iter().enumerate() {
        out.push_str(&format!(
            "{} {:.6} {:.6} {:.6} {:.6} {} {:.6} {:.6} {:.6}\n",
            idx + 1,
            r.position.lat,
            r.position.lon,
            r.activation_cost,
            r.pcc_per_core,
            r.cores,
            r.memory,
            r.storage,
            r.unit_processing_ms
        ));
    }
    out
}

/// Bounding box entities are scattered in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Default for Region {
    fn default() -> Self {
        // Greater Milan.
        Self {
            lat_min: 45.40,
            lat_max: 45.55,
            lon_min: 9.05,
            lon_max: 9.30,
        }
    }
}

impl Region {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Coordinates {
        Coordinates::new(
            rng.gen_range(self.lat_min..=self.lat_max),
            rng.gen_range(self.lon_min..=self.lon_max),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
struct ServiceProfile {
    id: u32,
    non_service_cost: f64,
    pcc: f64,
    cores: u32,
    memory: f64,
    storage: f64,
    workload: f64,
}

const SERVICE_PROFILES: u32 = 5;
/// (cores, pcc per core, activation cost)
const EDGE_TIERS: [(u32, f64, f64); 5] = [
    (2, 1.6, 0.00085),
    (4, 2.3, 0.00097),
    (6, 2.9, 0.00121),
    (8, 3.0, 0.00138),
    (10, 3.0, 0.00153),
];
const CLOUD_SITES: [(f64, f64); 5] = [
    (39.9612, -82.9988),
    (50.1109, 8.6821),
    (53.3498, -6.2603),
    (48.8566, 2.3522),
    (59.3293, 18.0686),
];
const CLOUD_CORES: u32 = 64;
const CLOUD_PCC_PER_CORE: f64 = 3.5;
const CLOUD_ACTIVATION_COST: f64 = 0.0125;
const CLOUD_MEMORY: f64 = 2048.0;
const CLOUD_STORAGE: f64 = 20_000.0;
/// Processing time per workload unit is this constant over per-core capacity.
const PROCESSING_SCALE: f64 = 12.5;

/// Draws a fresh synthetic scenario from a seeded generator.
pub struct SyntheticSource {
    rng: StdRng,
    region: Region,
    services: Vec<ServiceProfile>,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self::with_region(seed, Region::default())
    }

    pub fn with_region(seed: u64, region: Region) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            region,
            services: Vec::new(),
        }
    }

    fn services(&mut self) -> &[ServiceProfile] {
        if self.services.is_empty() {
            self.services = (1..=SERVICE_PROFILES)
                .map(|id| generate_service(id, &mut self.rng))
                .collect();
        }
        &self.services
    }
}

fn generate_service<R: Rng + ?Sized>(id: u32, rng: &mut R) -> ServiceProfile {
    let tasks = rng.gen_range(1..=4);
    let cores = rng.gen_range(1..=4u32);
    let workload = rng.gen_range(0.00484..=12.0);
    let mut pcc = 0.0;
    let mut memory = 0.0;
    let mut storage = 0.0;
    for _ in 0..tasks {
        pcc += rng.gen_range(0.00001..=2.5);
        memory += rng.gen_range(0.00001..=2.5);
        storage += rng.gen_range(0.00001..=15.0);
    }

    let core_cost = match cores {
        1 => 3.0,
        2 => 5.0,
        3 => 7.0,
        _ => 9.0,
    };
    let pcc_cost = if pcc < 2.5 {
        0.3
    } else if pcc < 5.0 {
        0.5
    } else if pcc < 7.5 {
        0.7
    } else {
        0.9
    };

    ServiceProfile {
        id,
        non_service_cost: core_cost + pcc_cost,
        pcc,
        cores,
        memory,
        storage,
        workload,
    }
}

impl DataSource for SyntheticSource {
    fn devices(&mut self, count: usize) -> Result<Vec<DeviceRecord>> {
        let region = self.region;
        let services = self.services().to_vec();
        let records = (0..count)
            .map(|_| {
                let position = region.sample(&mut self.rng);
                let profile = &services[self.rng.gen_range(0..services.len())];
                DeviceRecord {
                    position,
                    non_service_cost: profile.non_service_cost,
                    pcc: profile.pcc,
                    cores: profile.cores,
                    memory: profile.memory,
                    storage: profile.storage,
                    workload: profile.workload,
                    service: profile.id,
                }
            })
            .collect();
        Ok(records)
    }

    fn edge_servers(&mut self, count: usize) -> Result<Vec<ServerRecord>> {
        let region = self.region;
        let records = (0..count)
            .map(|_| {
                let position = region.sample(&mut self.rng);
                let (cores, pcc_per_core, activation_cost) =
                    EDGE_TIERS[self.rng.gen_range(0..EDGE_TIERS.len())];
                ServerRecord {
                    position,
                    activation_cost,
                    pcc_per_core,
                    cores,
                    memory: self.rng.gen_range(0.00001..=125.0),
                    storage: self.rng.gen_range(0.00001..=1000.0),
                    unit_processing_ms: PROCESSING_SCALE / pcc_per_core,
                }
            })
            .collect();
        Ok(records)
    }

    fn cloud_servers(&mut self, count: usize) -> Result<Vec<ServerRecord>> {
        let records = (0..count)
            .map(|idx| {
                let (lat, lon) = CLOUD_SITES[idx % CLOUD_SITES.len()];
                ServerRecord {
                    position: Coordinates::new(lat, lon),
                    activation_cost: CLOUD_ACTIVATION_COST,
                    pcc_per_core: CLOUD_PCC_PER_CORE,
                    cores: CLOUD_CORES,
                    memory: CLOUD_MEMORY,
                    storage: CLOUD_STORAGE,
                    unit_processing_ms: PROCESSING_SCALE / CLOUD_PCC_PER_CORE,
                }
            })
            .collect();
        Ok(records)
    }
}

/// Serves tables from `root`, keyed by entity count. Missing tables are
/// produced by the inner source and written back, so later runs with the same
/// counts see identical data.
pub struct CachedSource<S> {
    root: PathBuf,
    inner: S,
}

impl<S: DataSource> CachedSource<S> {
    pub fn new(root: impl Into<PathBuf>, inner: S) -> Self {
        Self {
            root: root.into(),
            inner,
        }
    }

    pub fn devices_path(&self, count: usize) -> PathBuf {
        self.root
            .join("devices")
            .join(format!("Devices_{}.txt", count))
    }

    pub fn edge_path(&self, count: usize) -> PathBuf {
        self.root.join("servers").join(format!("EC_{}.txt", count))
    }

    pub fn cloud_path(&self, count: usize) -> PathBuf {
        self.root.join("servers").join(format!("CC_{}.txt", count))
    }
}

fn read_table(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    debug!(path = %path.display(), "reading cached table");
    fs::read_to_string(path)
        .map(Some)
        .map_err(|err| Error::DataIo(format!("failed to read '{}': {}", path.display(), err)))
}

fn write_table(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            Error::DataIo(format!(
                "failed to create '{}': {}",
                parent.display(),
                err
            ))
        })?;
    }
    debug!(path = %path.display(), "writing table");
    fs::write(path, contents)
        .map_err(|err| Error::DataIo(format!("failed to write '{}': {}", path.display(), err)))
}

impl<S: DataSource> DataSource for CachedSource<S> {
    fn devices(&mut self, count: usize) -> Result<Vec<DeviceRecord>> {
        let path = self.devices_path(count);
        if let Some(text) = read_table(&path)? {
            return Ok(parse_devices(&text));
        }
        let text = render_devices(&self.inner.devices(count)?);
        write_table(&path, &text)?;
        Ok(parse_devices(&text))
    }

    fn edge_servers(&mut self, count: usize) -> Result<Vec<ServerRecord>> {
        let path = self.edge_path(count);
        if let Some(text) = read_table(&path)? {
            return Ok(parse_servers(&text));
        }
        let text = render_servers(&self.inner.edge_servers(count)?);
        write_table(&path, &text)?;
        Ok(parse_servers(&text))
    }

    fn cloud_servers(&mut self, count: usize) -> Result<Vec<ServerRecord>> {
        let path = self.cloud_path(count);
        if let Some(text) = read_table(&path)? {
            return Ok(parse_servers(&text));
        }
        let text = render_servers(&self.inner.cloud_servers(count)?);
        write_table(&path, &text)?;
        Ok(parse_servers(&text))
    }
}
