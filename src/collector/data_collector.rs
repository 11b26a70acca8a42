use crate::agents::{Vehicle, VehicleID};
use crate::log_main;
use crate::verbose::{EVENT_COLLECTOR_FINALIZE, EVENT_COLLECTOR_FLUSH};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Rows buffered in memory before a flush to disk.
const DEFAULT_WATERMARK: usize = 3_000_000;

const VEHICLE_DATA_FILE: &str = "vehicle_data.csv";
const TRAVEL_TIMES_FILE: &str = "travel_times.csv";
const SETTINGS_FILE: &str = "simulation_settings.json";

/// Custom error types for `DataCollector`.
#[derive(Debug)]
pub enum CollectorError {
    /// A filesystem operation failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The settings document could not be serialized.
    Json(serde_json::Error),
    /// A death was reported for a vehicle with no recorded birth.
    UnknownVehicle(VehicleID),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectorError::Io { path, source } => {
                write!(f, "I/O failure at '{}': {}", path.display(), source)
            }
            CollectorError::Json(source) => {
                write!(f, "Can't serialize the settings document: {}", source)
            }
            CollectorError::UnknownVehicle(vehicle_id) => {
                write!(
                    f,
                    "No birth time recorded for vehicle with ID '{}'",
                    vehicle_id
                )
            }
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectorError::Io { source, .. } => Some(source),
            CollectorError::Json(source) => Some(source),
            CollectorError::UnknownVehicle(_) => None,
        }
    }
}

/// Schema of `travel_times.csv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelTimeFormat {
    /// Header `Travel Times`, one travel time per row.
    #[default]
    Simple,
    /// Header `Time,Traveltime`, departure time and travel time per row.
    Timestamped,
}

impl TravelTimeFormat {
    /// Parses the configuration value; `simple` is the explicit default
    /// spelling.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "simple" => Some(TravelTimeFormat::Simple),
            "timestamped" => Some(TravelTimeFormat::Timestamped),
            _ => None,
        }
    }

    fn header(&self) -> &'static str {
        match self {
            TravelTimeFormat::Simple => "Travel Times",
            TravelTimeFormat::Timestamped => "Time,Traveltime",
        }
    }
}

/// One per-tick, per-vehicle state sample.
#[derive(Debug, Clone, Copy)]
struct SampleRow {
    time: f64,
    vehicle_id: VehicleID,
    lane_index: usize,
    position: f64,
    velocity: f64,
}

/// One completed journey.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelRecord {
    pub vehicle_id: VehicleID,
    pub birth_time: f64,
    pub death_time: f64,
    pub travel_time: f64,
}

/// Append-only sink for per-tick samples and completed travel times.
///
/// Samples and travel records are buffered in memory and flushed to CSV
/// files once the buffer crosses a watermark (or on finalize). The collector
/// owns its output directory for the duration of a run and is the sole
/// writer to the files in it.
#[derive(Debug)]
pub struct DataCollector {
    path: PathBuf,
    samples: Vec<SampleRow>,
    travel_records: Vec<TravelRecord>,
    /// Birth times by vehicle id; entries are kept after death so a repeated
    /// death report cannot panic
    birth_times: HashMap<VehicleID, f64>,
    current_time: f64,
    watermark: usize,
    travel_time_format: TravelTimeFormat,
    samples_collected: u64,
    deaths_recorded: u64,
}

impl DataCollector {
    /// Constructs a new `DataCollectorBuilder` for the given simulation id.
    ///
    /// # Example
    /// ```no_run
    /// use multilane_traffic_sim_core::collector::DataCollector;
    ///
    /// let collector = DataCollector::new("gipps_model_mul_lane").build().unwrap();
    /// println!("Writing to {}", collector.path().display());
    /// ```
    pub fn new(simulation_id: impl Into<String>) -> DataCollectorBuilder {
        DataCollectorBuilder {
            simulation_id: simulation_id.into(),
            base_dir: None,
            watermark: DEFAULT_WATERMARK,
            travel_time_format: TravelTimeFormat::default(),
        }
    }

    /// The output directory of this run.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of samples recorded so far.
    pub fn samples_collected(&self) -> u64 {
        self.samples_collected
    }

    /// Total number of travel records so far.
    pub fn deaths_recorded(&self) -> u64 {
        self.deaths_recorded
    }

    /// Updates the time stamp used by subsequent samples.
    pub fn set_current_time(&mut self, simulation_time: f64) {
        self.current_time = simulation_time;
    }

    /// Records the birth time of a vehicle.
    pub fn on_birth(&mut self, vehicle: &Vehicle, simulation_time: f64) {
        self.birth_times.insert(vehicle.id, simulation_time);
    }

    /// Appends one state sample for the vehicle, flushing to disk when the
    /// buffer crosses the watermark.
    pub fn on_sample(
        &mut self,
        vehicle: &Vehicle,
        lane_index: usize,
    ) -> Result<(), CollectorError> {
        self.samples.push(SampleRow {
            time: self.current_time,
            vehicle_id: vehicle.id,
            lane_index,
            position: vehicle.position,
            velocity: vehicle.velocity,
        });
        self.samples_collected += 1;
        if self.samples.len() >= self.watermark {
            log_main!(
                EVENT_COLLECTOR_FLUSH,
                "Sample buffer reached the watermark",
                buffered = self.samples.len()
            );
            self.flush()?;
        }
        Ok(())
    }

    /// Records the travel time of a departed vehicle.
    ///
    /// The birth entry is looked up but not removed, so the registry stays
    /// idempotent; an unknown id is a fatal error.
    pub fn on_death(
        &mut self,
        vehicle: &Vehicle,
        simulation_time: f64,
    ) -> Result<(), CollectorError> {
        let birth_time = *self
            .birth_times
            .get(&vehicle.id)
            .ok_or(CollectorError::UnknownVehicle(vehicle.id))?;
        self.travel_records.push(TravelRecord {
            vehicle_id: vehicle.id,
            birth_time,
            death_time: simulation_time,
            travel_time: simulation_time - birth_time,
        });
        self.deaths_recorded += 1;
        Ok(())
    }

    /// Flushes both buffers and writes the settings document next to the CSV
    /// files.
    pub fn finalize(&mut self, settings: &serde_json::Value) -> Result<(), CollectorError> {
        self.flush()?;
        let path = self.path.join(SETTINGS_FILE);
        let file = fs::File::create(&path).map_err(|source| CollectorError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), settings)
            .map_err(CollectorError::Json)?;
        log_main!(
            EVENT_COLLECTOR_FINALIZE,
            "Collector finalized",
            samples = self.samples_collected,
            travel_times = self.deaths_recorded
        );
        Ok(())
    }

    /// Appends both buffers to their CSV files and clears them.
    fn flush(&mut self) -> Result<(), CollectorError> {
        if !self.samples.is_empty() {
            let path = self.path.join(VEHICLE_DATA_FILE);
            let mut writer = append_writer(&path)?;
            for row in &self.samples {
                writeln!(
                    writer,
                    "{},{},{},{},{}",
                    row.time, row.vehicle_id, row.lane_index, row.position, row.velocity
                )
                .map_err(|source| CollectorError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
            writer.flush().map_err(|source| CollectorError::Io {
                path: path.clone(),
                source,
            })?;
            self.samples.clear();
        }

        if !self.travel_records.is_empty() {
            let path = self.path.join(TRAVEL_TIMES_FILE);
            let mut writer = append_writer(&path)?;
            for record in &self.travel_records {
                let line = match self.travel_time_format {
                    TravelTimeFormat::Simple => format!("{}", record.travel_time),
                    TravelTimeFormat::Timestamped => {
                        format!("{},{}", record.death_time, record.travel_time)
                    }
                };
                writeln!(writer, "{}", line).map_err(|source| CollectorError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
            writer.flush().map_err(|source| CollectorError::Io {
                path: path.clone(),
                source,
            })?;
            self.travel_records.clear();
        }

        Ok(())
    }
}

fn append_writer(path: &Path) -> Result<BufWriter<fs::File>, CollectorError> {
    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|source| CollectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(BufWriter::new(file))
}

/// A builder pattern implementation for constructing `DataCollector` objects.
///
/// Building resolves the output directory and writes the CSV headers, so an
/// unwritable output location fails before the first tick.
pub struct DataCollectorBuilder {
    simulation_id: String,
    base_dir: Option<PathBuf>,
    watermark: usize,
    travel_time_format: TravelTimeFormat,
}

impl DataCollectorBuilder {
    /// Overrides the output root; the default is `tmp` under the current
    /// working directory.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Overrides the flush watermark (rows buffered before writing).
    pub fn with_watermark(mut self, watermark: usize) -> Self {
        self.watermark = watermark.max(1);
        self
    }

    /// Selects the `travel_times.csv` schema.
    pub fn with_travel_time_format(mut self, travel_time_format: TravelTimeFormat) -> Self {
        self.travel_time_format = travel_time_format;
        self
    }

    /// Resolves the output directory, writes the file headers and builds the
    /// collector.
    pub fn build(self) -> Result<DataCollector, CollectorError> {
        let base_dir = match self.base_dir {
            Some(dir) => dir,
            None => {
                let cwd = std::env::current_dir().map_err(|source| CollectorError::Io {
                    path: PathBuf::from("."),
                    source,
                })?;
                cwd.join("tmp")
            }
        };
        let path = resolve_output_dir(&base_dir, &self.simulation_id)?;

        write_file(
            &path.join(VEHICLE_DATA_FILE),
            "time,vehicle_id,lane_index,position,velocity\n",
        )?;
        write_file(
            &path.join(TRAVEL_TIMES_FILE),
            &format!("{}\n", self.travel_time_format.header()),
        )?;

        Ok(DataCollector {
            path,
            samples: Vec::new(),
            travel_records: Vec::new(),
            birth_times: HashMap::new(),
            current_time: 0.0,
            watermark: self.watermark,
            travel_time_format: self.travel_time_format,
            samples_collected: 0,
            deaths_recorded: 0,
        })
    }
}

/// Picks `<base>/<id>` when that directory is absent or empty, otherwise
/// `<base>/<id>_<n>` with the smallest `n >= 2` producing an absent path.
fn resolve_output_dir(base_dir: &Path, simulation_id: &str) -> Result<PathBuf, CollectorError> {
    let io_err = |path: &Path, source| CollectorError::Io {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(base_dir).map_err(|source| io_err(base_dir, source))?;

    let preferred = base_dir.join(simulation_id);
    if !preferred.exists() {
        fs::create_dir(&preferred).map_err(|source| io_err(&preferred, source))?;
        return Ok(preferred);
    }
    let is_empty = fs::read_dir(&preferred)
        .map_err(|source| io_err(&preferred, source))?
        .next()
        .is_none();
    if is_empty {
        return Ok(preferred);
    }

    let mut suffix = 2u32;
    loop {
        let candidate = base_dir.join(format!("{}_{}", simulation_id, suffix));
        if !candidate.exists() {
            fs::create_dir(&candidate).map_err(|source| io_err(&candidate, source))?;
            return Ok(candidate);
        }
        suffix += 1;
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), CollectorError> {
    fs::write(path, contents).map_err(|source| CollectorError::Io {
        path: path.to_path_buf(),
        source,
    })
}
