// vitrack_sim/src/simulation/runner.rs

use serde::Serialize;
use tracing::{debug, info};
use vitrack_core::estimation::{BodyTracker, StateEstimator};
use vitrack_core::messages::ModuleInput;
use vitrack_core::state::PoseState;
use vitrack_core::types::{BodyHandle, SensorHandle};

use crate::error::SimError;
use crate::simulation::config::ScenarioConfig;
use crate::simulation::prng::SimulationRng;
use crate::simulation::sensors::SimulatedSensor;
use crate::simulation::state_error::{ErrorStats, PoseError};
use crate::simulation::truth::GroundTruth;

/// What a finished run reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub body: String,
    pub steps: u64,
    pub measurements: u64,
    pub dropped: u64,
    pub applied: u64,
    pub rejected_outliers: u64,
    pub rejected_invalid: u64,
    pub errors: ErrorStats,
    pub final_estimate_trustworthy: bool,
}

/// Drives one body through a scenario: ground truth, sensors, tracker.
pub struct SimulationRunner {
    config: ScenarioConfig,
    truth: GroundTruth,
    sensors: Vec<SimulatedSensor>,
    tracker: BodyTracker,
    rng: SimulationRng,
    stats: ErrorStats,
    measurements: u64,
    dropped: u64,
    next_report: f64,
}

impl SimulationRunner {
    pub fn new(config: ScenarioConfig) -> Result<Self, SimError> {
        config.validate()?;
        info!(
            "Setting up body '{}' with {} sensor(s), seed {}",
            config.body.name,
            config.sensors.len(),
            config.simulation.seed
        );

        let body = BodyHandle(0);
        let sensors = config
            .sensors
            .iter()
            .enumerate()
            .map(|(i, sensor)| SimulatedSensor::from_config(sensor, SensorHandle(i as u64)))
            .collect::<Result<Vec<_>, _>>()?;

        // The tracker starts at the true start pose, at rest.
        let mut state = PoseState::new()
            .with_position(config.body.start.translation)
            .with_orientation(config.body.start.rotation);
        state.reset_covariance(config.tracker.initial_covariance);
        let tracker = BodyTracker::with_state(body, config.tracker.clone(), state, 0.0)?;

        Ok(Self {
            truth: GroundTruth::new(&config.body),
            rng: SimulationRng::seeded(config.simulation.seed),
            next_report: config.simulation.report_interval_seconds,
            config,
            sensors,
            tracker,
            stats: ErrorStats::default(),
            measurements: 0,
            dropped: 0,
        })
    }

    pub fn tracker(&self) -> &BodyTracker {
        &self.tracker
    }

    pub fn stats(&self) -> &ErrorStats {
        &self.stats
    }

    /// Advances the run to `now`: feeds every sensor reading that fell due
    /// since the last step in timestamp order, then predicts to `now`.
    pub fn step(&mut self, now: f64) -> Result<(), SimError> {
        // --- 1. Collect due readings across all sensors ---
        let mut due: Vec<(f64, usize)> = Vec::new();
        for (index, sensor) in self.sensors.iter_mut().enumerate() {
            due.extend(sensor.schedule.drain_due(now).into_iter().map(|t| (t, index)));
        }
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        // --- 2. Feed them to the tracker ---
        for (timestamp, index) in due {
            let truth = self.truth.at(timestamp);
            let body = self.tracker.handle();
            match self.sensors[index].observe(body, timestamp, &truth, &mut self.rng) {
                Some(message) => {
                    self.measurements += 1;
                    let outcome =
                        self.tracker.process(&ModuleInput::Measurement { message: &message })?;
                    debug!(
                        sensor = %self.sensors[index].name,
                        t = timestamp,
                        ?outcome,
                        "fed measurement"
                    );
                }
                None => self.dropped += 1,
            }
        }

        // --- 3. Bring the estimate to the current time ---
        self.tracker.process(&ModuleInput::TimeStep { current_time: now })?;

        // --- 4. Score it ---
        let estimate = self.tracker.estimate();
        let error = PoseError::between(&self.truth.at(now).pose, &estimate.pose);
        self.stats.record(error);
        if now + 1e-9 >= self.next_report {
            info!(
                "Body '{}' State Error | t: {:.2}s | Pos Err: {:.3}m | Att Err: {:.3}°",
                self.config.body.name, now, error.position, error.attitude_deg
            );
            self.next_report += self.config.simulation.report_interval_seconds;
        }
        Ok(())
    }

    /// Runs the whole scenario.
    pub fn run(mut self) -> Result<RunSummary, SimError> {
        let sim = &self.config.simulation;
        let steps = (sim.duration_seconds * sim.step_hz).round() as u64;
        let step_hz = sim.step_hz;
        info!("Running {} steps at {:.1} Hz", steps, step_hz);

        for k in 1..=steps {
            self.step(k as f64 / step_hz)?;
        }

        let summary = RunSummary {
            body: self.config.body.name.clone(),
            steps,
            measurements: self.measurements,
            dropped: self.dropped,
            applied: self.tracker.applied_count(),
            rejected_outliers: self.tracker.rejected_outlier_count(),
            rejected_invalid: self.tracker.rejected_invalid_count(),
            final_estimate_trustworthy: self.tracker.estimate().is_trustworthy(),
            errors: self.stats,
        };
        info!(
            "Run complete | {} measurements ({} dropped) | applied {} | outliers {} | invalid {} | RMS Pos Err: {:.4}m | RMS Att Err: {:.3}°",
            summary.measurements,
            summary.dropped,
            summary.applied,
            summary.rejected_outliers,
            summary.rejected_invalid,
            summary.errors.rms_position(),
            summary.errors.rms_attitude_deg()
        );
        Ok(summary)
    }
}
