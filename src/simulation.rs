//! # Drift Simulation Batch Runner
//!
//! Runs an external particle-drift engine once per seed location and
//! collects a result per location. A failing location is logged and
//! recorded; the batch moves on to the next one.
//!
//! The engine itself is a black box behind [`DriftEngine`]. The bundled
//! [`CommandEngine`] hands each [`SimulationJob`] as JSON to an external
//! program on stdin (for instance a small script wrapping a Python drift
//! model) and treats a zero exit status as success.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use chrono::{TimeZone, Utc};
//! use nc2drift::input::JobConfig;
//! use nc2drift::simulation::{BatchRunner, CommandEngine};
//!
//! let config = JobConfig::from_file("baltic.yaml")?;
//! let simulation = config.simulation.as_ref().expect("no simulation section");
//! let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
//! let jobs = simulation.to_jobs(start, Some(config.output_path.as_ref()))?;
//!
//! let mut engine = CommandEngine::new("run_drift.py", vec![]);
//! let report = BatchRunner::new(true).run(&mut engine, jobs);
//! println!("{} of {} locations finished", report.succeeded().len(), report.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::{DateTime, Duration, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors that can occur while preparing or running a simulation
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Engine failed for '{job}' (exit code {code:?}): {stderr}")]
    EngineFailed {
        job: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to start engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Reader dataset not found: {0}")]
    MissingReader(PathBuf),

    #[error("Invalid simulation setup: {0}")]
    InvalidJob(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What happens to particles that hit the coastline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoastlineAction {
    Stranding,
    Previous,
    None,
}

impl CoastlineAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoastlineAction::Stranding => "stranding",
            CoastlineAction::Previous => "previous",
            CoastlineAction::None => "none",
        }
    }
}

/// Named engine options, passed through uninterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub vertical_mixing: bool,
    pub stokes_drift: bool,
    pub coastline_action: CoastlineAction,
    /// m²/s
    pub horizontal_diffusivity: f64,
    /// m, only relevant with vertical mixing
    pub wind_drift_depth: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            vertical_mixing: false,
            stokes_drift: true,
            coastline_action: CoastlineAction::Stranding,
            horizontal_diffusivity: 1.0,
            wind_drift_depth: 0.5,
        }
    }
}

impl EngineSettings {
    /// Settings as the engine's `section:key` configuration map.
    pub fn to_config_map(&self) -> BTreeMap<&'static str, serde_json::Value> {
        BTreeMap::from([
            ("drift:vertical_mixing", self.vertical_mixing.into()),
            ("drift:stokes_drift", self.stokes_drift.into()),
            (
                "general:coastline_action",
                self.coastline_action.as_str().into(),
            ),
            (
                "drift:horizontal_diffusivity",
                self.horizontal_diffusivity.into(),
            ),
            ("drift:wind_drift_depth", self.wind_drift_depth.into()),
        ])
    }
}

/// A named seeding location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Where, how many and when particles are released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedSpec {
    pub lon: f64,
    pub lat: f64,
    /// m
    pub radius: f64,
    pub number: usize,
    pub time_window: TimeWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    pub end_time: DateTime<Utc>,
    pub time_step_seconds: i64,
    pub time_step_output_seconds: i64,
    pub outfile: PathBuf,
}

/// One engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationJob {
    pub name: String,
    pub seed: SeedSpec,
    pub readers: Vec<PathBuf>,
    pub settings: EngineSettings,
    pub run: RunSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub radius: f64,
    pub number: usize,
    /// Particles are released continuously over this many hours
    pub seeding_hours: i64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        SeedConfig {
            radius: 50.0,
            number: 1000,
            seeding_hours: 24 * 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<i64>,
    pub time_step_hours: i64,
    pub output_step_hours: i64,
    pub output_dir: PathBuf,
    /// Output file is `<output_dir>/<location>_<suffix>.nc`
    pub file_suffix: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            end_time: None,
            duration_hours: None,
            time_step_hours: 3,
            output_step_hours: 3,
            output_dir: PathBuf::from("outfiles"),
            file_suffix: "wind_stranding_output".to_string(),
        }
    }
}

/// External program used by [`CommandEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Simulation section of a job configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Additional environment datasets (e.g. ocean currents)
    #[serde(default)]
    pub readers: Vec<PathBuf>,
    /// Append the transcoded wind file to the readers
    #[serde(default = "default_true")]
    pub use_transcoded_wind: bool,
    pub locations: Vec<Location>,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_command: Option<EngineCommand>,
}

fn default_true() -> bool {
    true
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.locations.is_empty() {
            return Err(SimulationError::InvalidJob("no locations configured".to_string()));
        }
        let mut seen = HashSet::new();
        for location in &self.locations {
            if location.name.trim().is_empty() {
                return Err(SimulationError::InvalidJob("location with empty name".to_string()));
            }
            if location.name.contains(['/', '\\']) {
                return Err(SimulationError::InvalidJob(format!(
                    "location name '{}' must not contain path separators",
                    location.name
                )));
            }
            if !seen.insert(location.name.as_str()) {
                return Err(SimulationError::InvalidJob(format!(
                    "duplicate location '{}'",
                    location.name
                )));
            }
            if !(-90.0..=90.0).contains(&location.lat) || !location.lon.is_finite() {
                return Err(SimulationError::InvalidJob(format!(
                    "location '{}' has invalid coordinates ({}, {})",
                    location.name, location.lon, location.lat
                )));
            }
        }
        if self.seed.number == 0 || self.seed.radius < 0.0 || self.seed.seeding_hours < 0 {
            return Err(SimulationError::InvalidJob(
                "seed needs a positive particle count, non-negative radius and duration".to_string(),
            ));
        }
        if self.run.time_step_hours <= 0 || self.run.output_step_hours <= 0 {
            return Err(SimulationError::InvalidJob("time steps must be positive".to_string()));
        }
        if self.run.end_time.is_none() && self.run.duration_hours.is_none() {
            return Err(SimulationError::InvalidJob(
                "run needs either end_time or duration_hours".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds one job per location, all starting at `start`.
    pub fn to_jobs(
        &self,
        start: DateTime<Utc>,
        wind_path: Option<&Path>,
    ) -> Result<Vec<SimulationJob>, SimulationError> {
        self.validate()?;

        let end_time = match (self.run.end_time, self.run.duration_hours) {
            (Some(end), _) => end,
            (None, Some(hours)) => offset(start, hours, "duration_hours")?,
            (None, None) => {
                return Err(SimulationError::InvalidJob(
                    "run needs either end_time or duration_hours".to_string(),
                ));
            }
        };
        if end_time <= start {
            return Err(SimulationError::InvalidJob(format!(
                "end time {} is not after start {}",
                end_time, start
            )));
        }

        let mut readers = self.readers.clone();
        if self.use_transcoded_wind
            && let Some(wind) = wind_path
        {
            readers.push(wind.to_path_buf());
        }
        if readers.is_empty() {
            return Err(SimulationError::InvalidJob("no reader datasets".to_string()));
        }

        let seeding_end = offset(start, self.seed.seeding_hours, "seeding_hours")?;
        let time_step_seconds = to_seconds(self.run.time_step_hours, "time_step_hours")?;
        let time_step_output_seconds = to_seconds(self.run.output_step_hours, "output_step_hours")?;
        let jobs = self
            .locations
            .iter()
            .map(|location| SimulationJob {
                name: location.name.clone(),
                seed: SeedSpec {
                    lon: location.lon,
                    lat: location.lat,
                    radius: self.seed.radius,
                    number: self.seed.number,
                    time_window: TimeWindow {
                        start,
                        end: seeding_end,
                    },
                },
                readers: readers.clone(),
                settings: self.engine.clone(),
                run: RunSpec {
                    end_time,
                    time_step_seconds,
                    time_step_output_seconds,
                    outfile: self
                        .run
                        .output_dir
                        .join(format!("{}_{}.nc", location.name, self.run.file_suffix)),
                },
            })
            .collect();
        Ok(jobs)
    }
}

/// `start` shifted by `hours`, or `InvalidJob` when that leaves chrono's range.
fn offset(start: DateTime<Utc>, hours: i64, field: &str) -> Result<DateTime<Utc>, SimulationError> {
    Duration::try_hours(hours)
        .and_then(|delta| start.checked_add_signed(delta))
        .ok_or_else(|| SimulationError::InvalidJob(format!("{} = {} is out of range", field, hours)))
}

fn to_seconds(hours: i64, field: &str) -> Result<i64, SimulationError> {
    hours
        .checked_mul(3600)
        .ok_or_else(|| SimulationError::InvalidJob(format!("{} = {} is out of range", field, hours)))
}

/// A drift simulation engine.
pub trait DriftEngine {
    fn name(&self) -> &str;

    /// Runs one job and returns the path of the produced output.
    fn run(&mut self, job: &SimulationJob) -> Result<PathBuf, SimulationError>;
}

/// Document written to the engine's stdin.
#[derive(Serialize)]
struct EngineRequest<'a> {
    job: &'a SimulationJob,
    config: BTreeMap<&'static str, serde_json::Value>,
}

/// Runs an external program per job, feeding it the job as JSON on stdin.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        CommandEngine {
            program: program.to_string(),
            args,
        }
    }

    pub fn from_command(command: &EngineCommand) -> Self {
        Self::new(&command.program, command.args.clone())
    }

    /// JSON request sent for `job`.
    pub fn request_body(job: &SimulationJob) -> Result<Vec<u8>, SimulationError> {
        let request = EngineRequest {
            job,
            config: job.settings.to_config_map(),
        };
        Ok(serde_json::to_vec_pretty(&request)?)
    }
}

impl DriftEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&mut self, job: &SimulationJob) -> Result<PathBuf, SimulationError> {
        let body = Self::request_body(job)?;
        if let Some(parent) = job.run.outfile.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        debug!("Starting {} {:?} for '{}'", self.program, self.args, job.name);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SimulationError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&body) {
                // The engine may exit without reading its input.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(SimulationError::EngineFailed {
                job: job.name.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(job.run.outfile.clone())
    }
}

/// Outcome of one job in a batch.
#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub result: Result<PathBuf, SimulationError>,
}

/// Per-location results of a batch, in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> Vec<(&str, &Path)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|p| (o.name.as_str(), p.as_path())))
            .collect()
    }

    pub fn failed(&self) -> Vec<(&str, &SimulationError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
            .collect()
    }

    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Runs jobs one after another, isolating failures per job.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(show_progress: bool) -> Self {
        BatchRunner { show_progress }
    }

    pub fn run<E: DriftEngine + ?Sized>(&self, engine: &mut E, jobs: Vec<SimulationJob>) -> BatchReport {
        let progress = if self.show_progress {
            ProgressBar::new(jobs.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
            progress.set_style(style);
        }

        let mut report = BatchReport::default();
        for job in jobs {
            progress.set_message(job.name.clone());
            info!("Running simulation for {} with {}", job.name, engine.name());

            let result = check_readers(&job).and_then(|_| engine.run(&job));
            match &result {
                Ok(outfile) => info!("Finished {} -> {}", job.name, outfile.display()),
                Err(e) => error!("Error during run for {}: {}", job.name, e),
            }
            report.outcomes.push(JobOutcome {
                name: job.name,
                result,
            });
            progress.inc(1);
        }
        progress.finish_and_clear();
        report
    }
}

fn check_readers(job: &SimulationJob) -> Result<(), SimulationError> {
    match job.readers.iter().find(|path| !path.exists()) {
        Some(missing) => Err(SimulationError::MissingReader(missing.clone())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
    }

    fn config(readers: Vec<PathBuf>, output_dir: &Path) -> SimulationConfig {
        SimulationConfig {
            readers,
            use_transcoded_wind: false,
            locations: vec![
                Location {
                    name: "Stockholm".to_string(),
                    lon: 19.5,
                    lat: 59.154416,
                },
                Location {
                    name: "Gdansk".to_string(),
                    lon: 18.827874,
                    lat: 54.461684,
                },
                Location {
                    name: "Riga".to_string(),
                    lon: 24.000448,
                    lat: 57.076058,
                },
            ],
            engine: EngineSettings::default(),
            seed: SeedConfig::default(),
            run: RunConfig {
                duration_hours: Some(24 * 31),
                output_dir: output_dir.to_path_buf(),
                ..RunConfig::default()
            },
            engine_command: None,
        }
    }

    /// Fails for the named locations, succeeds for the rest.
    struct ScriptedEngine {
        fail_for: Vec<&'static str>,
        calls: Vec<String>,
    }

    impl DriftEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        fn run(&mut self, job: &SimulationJob) -> Result<PathBuf, SimulationError> {
            self.calls.push(job.name.clone());
            if self.fail_for.contains(&job.name.as_str()) {
                Err(SimulationError::EngineFailed {
                    job: job.name.clone(),
                    code: Some(1),
                    stderr: "boom".to_string(),
                })
            } else {
                Ok(job.run.outfile.clone())
            }
        }
    }

    #[test]
    fn test_default_engine_settings() {
        let map = EngineSettings::default().to_config_map();
        assert_eq!(map["drift:vertical_mixing"], serde_json::json!(false));
        assert_eq!(map["drift:stokes_drift"], serde_json::json!(true));
        assert_eq!(map["general:coastline_action"], serde_json::json!("stranding"));
        assert_eq!(map["drift:horizontal_diffusivity"], serde_json::json!(1.0));
        assert_eq!(map["drift:wind_drift_depth"], serde_json::json!(0.5));
    }

    #[test]
    fn test_to_jobs() {
        let out = PathBuf::from("outfiles");
        let cfg = config(vec![PathBuf::from("x_current.nc")], &out);
        let jobs = cfg.to_jobs(start(), Some(Path::new("wind.nc"))).unwrap();
        assert_eq!(jobs.len(), 3);

        let job = &jobs[0];
        assert_eq!(job.name, "Stockholm");
        assert_eq!(job.readers, vec![PathBuf::from("x_current.nc")]);
        assert_eq!(job.seed.number, 1000);
        assert_eq!(job.seed.time_window.end - job.seed.time_window.start, Duration::hours(168));
        assert_eq!(job.run.end_time, start() + Duration::hours(744));
        assert_eq!(job.run.time_step_seconds, 10800);
        assert_eq!(
            job.run.outfile,
            PathBuf::from("outfiles/Stockholm_wind_stranding_output.nc")
        );
    }

    #[test]
    fn test_to_jobs_appends_wind_reader() {
        let mut cfg = config(vec![PathBuf::from("x.nc"), PathBuf::from("y.nc")], Path::new("o"));
        cfg.use_transcoded_wind = true;
        let jobs = cfg.to_jobs(start(), Some(Path::new("wind.nc"))).unwrap();
        assert_eq!(
            jobs[1].readers,
            vec![PathBuf::from("x.nc"), PathBuf::from("y.nc"), PathBuf::from("wind.nc")]
        );
    }

    #[test]
    fn test_invalid_configs() {
        let mut cfg = config(vec![PathBuf::from("x.nc")], Path::new("o"));
        cfg.run.duration_hours = None;
        assert!(matches!(cfg.validate(), Err(SimulationError::InvalidJob(_))));

        let mut cfg = config(vec![PathBuf::from("x.nc")], Path::new("o"));
        cfg.locations[2].name = "Stockholm".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = config(vec![PathBuf::from("x.nc")], Path::new("o"));
        cfg.run.end_time = Some(start());
        assert!(cfg.to_jobs(start(), None).is_err());

        let cfg = config(vec![], Path::new("o"));
        assert!(cfg.to_jobs(start(), None).is_err());
    }

    #[test]
    fn test_location_name_cannot_leave_output_dir() {
        for name in ["../escape", "nested/name", "back\\slash"] {
            let mut cfg = config(vec![PathBuf::from("x.nc")], Path::new("o"));
            cfg.locations[0].name = name.to_string();
            assert!(
                matches!(cfg.to_jobs(start(), None), Err(SimulationError::InvalidJob(_))),
                "name {:?} was accepted",
                name
            );
        }
    }

    #[test]
    fn test_out_of_range_durations_are_rejected() {
        let mut cfg = config(vec![PathBuf::from("x.nc")], Path::new("o"));
        cfg.run.duration_hours = Some(i64::MAX);
        assert!(matches!(cfg.to_jobs(start(), None), Err(SimulationError::InvalidJob(_))));

        let mut cfg = config(vec![PathBuf::from("x.nc")], Path::new("o"));
        cfg.seed.seeding_hours = i64::MAX / 2;
        assert!(matches!(cfg.to_jobs(start(), None), Err(SimulationError::InvalidJob(_))));

        let mut cfg = config(vec![PathBuf::from("x.nc")], Path::new("o"));
        cfg.run.time_step_hours = i64::MAX / 1000;
        assert!(matches!(cfg.to_jobs(start(), None), Err(SimulationError::InvalidJob(_))));

        let mut cfg = config(vec![PathBuf::from("x.nc")], Path::new("o"));
        cfg.run.output_step_hours = i64::MAX;
        assert!(matches!(cfg.to_jobs(start(), None), Err(SimulationError::InvalidJob(_))));
    }

    #[test]
    fn test_batch_continues_after_failure() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let reader = dir.path().join("current.nc");
        std::fs::write(&reader, b"")?;
        let jobs = config(vec![reader], dir.path()).to_jobs(start(), None)?;

        let mut engine = ScriptedEngine {
            fail_for: vec!["Gdansk"],
            calls: Vec::new(),
        };
        let report = BatchRunner::new(false).run(&mut engine, jobs);

        assert_eq!(engine.calls, vec!["Stockholm", "Gdansk", "Riga"]);
        assert_eq!(report.len(), 3);
        assert!(!report.is_complete_success());
        let ok: Vec<&str> = report.succeeded().iter().map(|(name, _)| *name).collect();
        assert_eq!(ok, vec!["Stockholm", "Riga"]);
        let failed = report.failed();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "Gdansk");
        Ok(())
    }

    #[test]
    fn test_missing_reader_skips_engine() {
        let jobs = config(vec![PathBuf::from("/nonexistent/current.nc")], Path::new("o"))
            .to_jobs(start(), None)
            .unwrap();
        let mut engine = ScriptedEngine {
            fail_for: vec![],
            calls: Vec::new(),
        };
        let report = BatchRunner::new(false).run(&mut engine, jobs);
        assert!(engine.calls.is_empty());
        assert!(report
            .failed()
            .iter()
            .all(|(_, e)| matches!(e, SimulationError::MissingReader(_))));
    }

    #[test]
    fn test_request_body_carries_settings() {
        let jobs = config(vec![PathBuf::from("x.nc")], Path::new("o"))
            .to_jobs(start(), None)
            .unwrap();
        let body = CommandEngine::request_body(&jobs[0]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["job"]["name"], "Stockholm");
        assert_eq!(value["config"]["general:coastline_action"], "stranding");
        assert_eq!(value["job"]["seed"]["radius"], 50.0);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_engine_protocol() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let captured = dir.path().join("request.json");
        let jobs = config(vec![PathBuf::from("x.nc")], dir.path()).to_jobs(start(), None)?;

        let mut engine = CommandEngine::new(
            "sh",
            vec![
                "-c".to_string(),
                "cat > \"$0\"".to_string(),
                captured.to_string_lossy().to_string(),
            ],
        );
        let outfile = engine.run(&jobs[0])?;
        assert_eq!(outfile, jobs[0].run.outfile);

        let request: serde_json::Value = serde_json::from_slice(&std::fs::read(&captured)?)?;
        assert_eq!(request["job"]["name"], "Stockholm");

        let mut failing = CommandEngine::new(
            "sh",
            vec!["-c".to_string(), "echo nope >&2; exit 3".to_string()],
        );
        match failing.run(&jobs[1]) {
            Err(SimulationError::EngineFailed { job, code, stderr }) => {
                assert_eq!(job, "Gdansk");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "nope");
            }
            other => panic!("Expected EngineFailed, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_missing_program() {
        let dir = tempdir().unwrap();
        let jobs = config(vec![PathBuf::from("x.nc")], dir.path())
            .to_jobs(start(), None)
            .unwrap();
        let mut engine = CommandEngine::new("nc2drift-no-such-engine", vec![]);
        assert!(matches!(
            engine.run(&jobs[0]),
            Err(SimulationError::Spawn { .. })
        ));
    }
}
