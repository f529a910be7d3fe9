use crate::animation::curve::AnimationCurve;
use crate::animation::ease::Ease;
use crate::foundation::error::{TagweaveError, TagweaveResult};

/// Shape of the rising or falling half of a wave, mapping `[0, 1]` progress to `[0, 1]`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveCurve {
    /// Closed-form ease.
    Ease(Ease),
    /// Keyframed curve over `[0, 1]`.
    Keyed(AnimationCurve),
}

impl WaveCurve {
    /// Normalized value at progress `u`.
    pub fn eval(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        match self {
            Self::Ease(e) => e.apply(u),
            Self::Keyed(c) => c.evaluate(u),
        }
    }
}

impl Default for WaveCurve {
    fn default() -> Self {
        Self::Ease(Ease::InOutSine)
    }
}

/// Which dwell phases a wave has, derived from its waits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveMode {
    /// No dwell; oscillates through `[-A, A]`.
    Wave,
    /// Dwells at the crest only; stays in `[-A, 0]`.
    InvertedPulse,
    /// Dwells at the trough only; stays in `[0, A]`.
    Pulse,
    /// Dwells at both extremes; stays in `[0, A]`.
    OneDirectionalPulse,
}

impl WaveMode {
    fn from_waits(crest_wait: f64, trough_wait: f64) -> Self {
        match (crest_wait > 0.0, trough_wait > 0.0) {
            (false, false) => Self::Wave,
            (true, false) => Self::InvertedPulse,
            (false, true) => Self::Pulse,
            (true, true) => Self::OneDirectionalPulse,
        }
    }
}

/// Construction parameters for a [`Wave`]. Durations are in seconds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WaveParams {
    /// Shape of the rise from trough to crest.
    pub up_curve: WaveCurve,
    /// Shape of the fall from crest to trough (sampled as `1 - curve`).
    pub down_curve: WaveCurve,
    /// Seconds spent rising.
    pub up_period: f64,
    /// Seconds spent falling.
    pub down_period: f64,
    /// Peak magnitude.
    pub amplitude: f64,
    /// Seconds held at the crest.
    pub crest_wait: f64,
    /// Seconds held at the trough.
    pub trough_wait: f64,
    /// Phase propagation speed; an offset of `velocity` delays the wave by one second.
    pub velocity: f64,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            up_curve: WaveCurve::default(),
            down_curve: WaveCurve::default(),
            up_period: 0.5,
            down_period: 0.5,
            amplitude: 1.0,
            crest_wait: 0.0,
            trough_wait: 0.0,
            velocity: 1.0,
        }
    }
}

/// Immutable periodic waveform.
///
/// One cycle is rise, crest dwell, fall, trough dwell. Phase time at a given offset is
/// `time - offset / velocity`, so characters further along lag behind.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "WaveParams", into = "WaveParams")]
pub struct Wave {
    params: WaveParams,
    mode: WaveMode,
    period: f64,
}

impl Wave {
    /// Validate `params` and derive the cycle.
    pub fn new(params: WaveParams) -> TagweaveResult<Self> {
        let numbers = [
            ("up_period", params.up_period),
            ("down_period", params.down_period),
            ("amplitude", params.amplitude),
            ("crest_wait", params.crest_wait),
            ("trough_wait", params.trough_wait),
            ("velocity", params.velocity),
        ];
        if let Some((name, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(TagweaveError::animation(format!("wave {name} must be finite")));
        }
        if params.up_period < 0.0 || params.down_period < 0.0 {
            return Err(TagweaveError::animation("wave periods must be >= 0"));
        }
        if params.up_period + params.down_period <= 0.0 {
            return Err(TagweaveError::animation(
                "wave up_period + down_period must be > 0",
            ));
        }
        if params.crest_wait < 0.0 || params.trough_wait < 0.0 {
            return Err(TagweaveError::animation("wave waits must be >= 0"));
        }
        if params.velocity <= 0.0 {
            return Err(TagweaveError::animation("wave velocity must be > 0"));
        }

        let mode = WaveMode::from_waits(params.crest_wait, params.trough_wait);
        let period = params.up_period + params.down_period + params.crest_wait + params.trough_wait;
        Ok(Self {
            params,
            mode,
            period,
        })
    }

    /// Symmetric sine-like oscillation with the given full `period` and `amplitude`.
    pub fn oscillation(period: f64, amplitude: f64) -> TagweaveResult<Self> {
        Self::new(WaveParams {
            up_period: period / 2.0,
            down_period: period / 2.0,
            amplitude,
            ..WaveParams::default()
        })
    }

    /// Construction parameters.
    pub fn params(&self) -> &WaveParams {
        &self.params
    }

    /// Mode implied by the waits.
    pub fn mode(&self) -> WaveMode {
        self.mode
    }

    /// Peak magnitude.
    pub fn amplitude(&self) -> f64 {
        self.params.amplitude
    }

    /// Propagation speed.
    pub fn velocity(&self) -> f64 {
        self.params.velocity
    }

    /// Seconds per full cycle.
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Cycles per second.
    pub fn frequency(&self) -> f64 {
        1.0 / self.period
    }

    /// Distance (in offset units) between two points in the same phase.
    pub fn wavelength(&self) -> f64 {
        self.params.velocity * self.period
    }

    /// Seconds the direction stays positive per cycle: rise plus crest dwell.
    pub fn effective_up_period(&self) -> f64 {
        self.params.up_period + self.params.crest_wait
    }

    /// Seconds the direction stays negative per cycle: fall plus trough dwell.
    pub fn effective_down_period(&self) -> f64 {
        self.params.down_period + self.params.trough_wait
    }

    /// Value and direction (`+1` rising/at crest, `-1` falling/at trough) at `time` for a
    /// point `offset` along the wave.
    pub fn evaluate(&self, time: f64, offset: f64) -> (f64, i8) {
        match self.mode {
            WaveMode::Wave => self.evaluate_as_wave(time, offset),
            WaveMode::InvertedPulse => self.evaluate_as_inverted_pulse(time, offset),
            WaveMode::Pulse => self.evaluate_as_pulse(time, offset),
            WaveMode::OneDirectionalPulse => self.evaluate_as_one_directional_pulse(time, offset),
        }
    }

    /// Sample the cycle mapped onto `[-A, A]`.
    pub fn evaluate_as_wave(&self, time: f64, offset: f64) -> (f64, i8) {
        let (n, dir) = self.sample(time, offset);
        ((2.0 * n - 1.0) * self.params.amplitude, dir)
    }

    /// Sample the cycle mapped onto `[-A, 0]`.
    pub fn evaluate_as_inverted_pulse(&self, time: f64, offset: f64) -> (f64, i8) {
        let (n, dir) = self.sample(time, offset);
        ((n - 1.0) * self.params.amplitude, dir)
    }

    /// Sample the cycle mapped onto `[0, A]`.
    pub fn evaluate_as_pulse(&self, time: f64, offset: f64) -> (f64, i8) {
        let (n, dir) = self.sample(time, offset);
        (n * self.params.amplitude, dir)
    }

    /// Sample the cycle mapped onto `[0, A]`; the dwell at both ends is what sets it apart.
    pub fn evaluate_as_one_directional_pulse(&self, time: f64, offset: f64) -> (f64, i8) {
        self.evaluate_as_pulse(time, offset)
    }

    /// Net extrema crossed in `(time - delta, time]`: crests count `+1`, troughs `-1`.
    ///
    /// Counts are additive over adjacent intervals, so one call spanning several periods gives
    /// the same answer as many small calls.
    pub fn passed_extrema(&self, time: f64, delta: f64, offset: f64) -> i8 {
        if delta.is_nan() || delta <= 0.0 {
            return 0;
        }
        let end = self.phase_time(time, offset);
        let start = end - delta;
        let crest = self.params.up_period;
        let trough = crest + self.params.crest_wait + self.params.down_period;
        let net = self.instants_between(start, end, crest) - self.instants_between(start, end, trough);
        net.clamp(-1, 1) as i8
    }

    fn phase_time(&self, time: f64, offset: f64) -> f64 {
        time - offset / self.params.velocity
    }

    fn instants_between(&self, start: f64, end: f64, phase: f64) -> i64 {
        let p = self.period;
        ((end - phase) / p).floor() as i64 - ((start - phase) / p).floor() as i64
    }

    /// Normalized height in `[0, 1]` and direction at phase time.
    fn sample(&self, time: f64, offset: f64) -> (f64, i8) {
        let p = &self.params;
        let tau = self.phase_time(time, offset).rem_euclid(self.period);

        let crest_at = p.up_period;
        let fall_at = crest_at + p.crest_wait;
        let trough_at = fall_at + p.down_period;

        if tau < crest_at {
            (p.up_curve.eval(tau / p.up_period), 1)
        } else if tau < fall_at {
            (1.0, 1)
        } else if tau < trough_at {
            (1.0 - p.down_curve.eval((tau - fall_at) / p.down_period), -1)
        } else {
            (0.0, -1)
        }
    }
}

impl TryFrom<WaveParams> for Wave {
    type Error = TagweaveError;

    fn try_from(params: WaveParams) -> TagweaveResult<Self> {
        Self::new(params)
    }
}

impl From<Wave> for WaveParams {
    fn from(wave: Wave) -> Self {
        wave.params
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/wave.rs"]
mod tests;
