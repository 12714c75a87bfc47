//! Classic cart-pole balancing task

use std::io::Write;

use anyhow::{anyhow, bail, Result};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::env::{Environment, Render, Transition};

const GRAVITY: f64 = 9.8;
const CART_MASS: f64 = 1.0;
const POLE_MASS: f64 = 0.1;
const POLE_HALF_LENGTH: f64 = 0.5;
const FORCE_MAG: f64 = 10.0;
const TAU: f64 = 0.02;
const RENDER_WIDTH: usize = 61;

/// Cart-pole thresholds and reset noise
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CartPoleConfig {
    /// Cart position beyond which the episode ends
    pub x_threshold: f64,
    /// Pole angle (degrees) beyond which the episode ends
    pub theta_threshold_degrees: f64,
    /// Initial state is uniform in `±init_range`
    pub init_range: f64,
    /// Seed for reset noise; entropy when unset
    pub seed: Option<u64>,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            x_threshold: 2.4,
            theta_threshold_degrees: 12.0,
            init_range: 0.05,
            seed: None,
        }
    }
}

impl CartPoleConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.x_threshold > 0.0 && self.x_threshold.is_finite()) {
            bail!("x_threshold must be positive and finite, got {}", self.x_threshold);
        }
        if !(self.theta_threshold_degrees > 0.0 && self.theta_threshold_degrees.is_finite()) {
            bail!(
                "theta_threshold_degrees must be positive and finite, got {}",
                self.theta_threshold_degrees
            );
        }
        if !(self.init_range >= 0.0 && self.init_range.is_finite()) {
            bail!("init_range must be finite and not negative, got {}", self.init_range);
        }
        Ok(())
    }
}

/// Observation is `[x, x_dot, theta, theta_dot]`; action 0 pushes left, 1 pushes right.
pub struct CartPole {
    config: CartPoleConfig,
    rng: StdRng,
    state: [f64; 4],
    done: bool,
    ticks: usize,
}

impl CartPole {
    pub fn new(config: CartPoleConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            state: [0.0; 4],
            // Stepping before the first reset is an error
            done: true,
            ticks: 0,
        }
    }

    pub const OBSERVATION_SIZE: usize = 4;
    pub const ACTION_COUNT: usize = 2;

    pub fn state(&self) -> [f64; 4] {
        self.state
    }

    /// Steps taken since the last reset
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    fn theta_threshold(&self) -> f64 {
        self.config.theta_threshold_degrees.to_radians()
    }

    fn is_terminal(&self) -> bool {
        let [x, _, theta, _] = self.state;
        x.abs() > self.config.x_threshold || theta.abs() > self.theta_threshold()
    }

    fn render_line(&self) -> String {
        let [x, _, theta, _] = self.state;
        let half = (RENDER_WIDTH / 2) as f64;
        let offset = (x / self.config.x_threshold * half).round() as i64;
        let column = (half as i64 + offset).clamp(0, RENDER_WIDTH as i64 - 1) as usize;

        let mut track: Vec<char> = vec!['-'; RENDER_WIDTH];
        track[column] = if theta < -0.05 {
            '\\'
        } else if theta > 0.05 {
            '/'
        } else {
            '|'
        };
        let track: String = track.into_iter().collect();
        format!("[{track}] t={:<4} x={x:+.3} theta={:+.2}deg", self.ticks, theta.to_degrees())
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new(CartPoleConfig::default())
    }
}

impl Environment for CartPole {
    type Observation = Vec<f64>;
    type Action = usize;

    fn reset(&mut self) -> Result<Vec<f64>> {
        let range = self.config.init_range.abs();
        if range > 0.0 {
            let dist = Uniform::new_inclusive(-range, range);
            for value in &mut self.state {
                *value = dist.sample(&mut self.rng);
            }
        } else {
            self.state = [0.0; 4];
        }
        self.done = false;
        self.ticks = 0;
        Ok(self.state.to_vec())
    }

    fn step(&mut self, action: &usize) -> Result<Transition<Vec<f64>>> {
        if self.done {
            bail!("cart-pole stepped after the episode ended; call reset first");
        }
        let force = match action {
            0 => -FORCE_MAG,
            1 => FORCE_MAG,
            other => return Err(anyhow!("invalid cart-pole action {other}, expected 0 or 1")),
        };

        let [x, x_dot, theta, theta_dot] = self.state;
        let (sin_theta, cos_theta) = theta.sin_cos();

        let total_mass = CART_MASS + POLE_MASS;
        let pole_mass_length = POLE_MASS * POLE_HALF_LENGTH;

        let temp = (force + pole_mass_length * theta_dot * theta_dot * sin_theta) / total_mass;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_HALF_LENGTH * (4.0 / 3.0 - POLE_MASS * cos_theta * cos_theta / total_mass));
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        self.state = [
            x + TAU * x_dot,
            x_dot + TAU * x_acc,
            theta + TAU * theta_dot,
            theta_dot + TAU * theta_acc,
        ];
        self.ticks += 1;
        self.done = self.is_terminal();

        Ok(
            Transition::new(self.state.to_vec(), 1.0, self.done)
                .with_info(serde_json::json!({ "ticks": self.ticks })),
        )
    }
}

impl Render for CartPole {
    fn render(&mut self) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", self.render_line())?;
        Ok(())
    }
}
