use kurbo::{CubicBez, ParamCurve, ParamCurveDeriv, Point, Vec2};

use crate::foundation::error::{TagweaveError, TagweaveResult};

const DEFAULT_WEIGHT: f64 = 1.0 / 3.0;
const SOLVE_EPS: f64 = 1e-9;
const MAX_REPARAM_ITERS: usize = 8;

/// A weighted keyframe: value at `time` plus the tangent handles on either side.
///
/// Weights are fractions of the neighbouring segment's duration, so `1/3` reproduces a plain
/// Hermite handle.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Key time.
    pub time: f64,
    /// Key value.
    pub value: f64,
    /// Slope arriving at the key.
    pub in_tangent: f64,
    /// Slope leaving the key.
    pub out_tangent: f64,
    /// Length of the incoming handle as a fraction of the previous segment, in `[0, 1]`.
    pub in_weight: f64,
    /// Length of the outgoing handle as a fraction of the next segment, in `[0, 1]`.
    pub out_weight: f64,
}

impl Keyframe {
    /// Flat keyframe with default weights.
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
            in_weight: DEFAULT_WEIGHT,
            out_weight: DEFAULT_WEIGHT,
        }
    }

    /// Set both tangents to `slope`.
    pub fn with_slope(mut self, slope: f64) -> Self {
        self.in_tangent = slope;
        self.out_tangent = slope;
        self
    }
}

/// Piecewise cubic curve over weighted keyframes, evaluated as `y(x)`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationCurve {
    keys: Vec<Keyframe>,
}

impl AnimationCurve {
    /// Build a curve from keyframes sorted by strictly increasing time.
    pub fn new(keys: Vec<Keyframe>) -> TagweaveResult<Self> {
        if keys.is_empty() {
            return Err(TagweaveError::animation("curve needs at least one keyframe"));
        }
        for k in &keys {
            let finite = [
                k.time,
                k.value,
                k.in_tangent,
                k.out_tangent,
                k.in_weight,
                k.out_weight,
            ]
            .iter()
            .all(|v| v.is_finite());
            if !finite {
                return Err(TagweaveError::animation("keyframe values must be finite"));
            }
            if !(0.0..=1.0).contains(&k.in_weight) || !(0.0..=1.0).contains(&k.out_weight) {
                return Err(TagweaveError::animation("keyframe weights must be in [0, 1]"));
            }
        }
        if keys.windows(2).any(|w| w[1].time <= w[0].time) {
            return Err(TagweaveError::animation(
                "keyframe times must be strictly increasing",
            ));
        }
        Ok(Self { keys })
    }

    /// Straight line from `(0, 0)` to `(1, 1)`.
    pub fn linear() -> Self {
        Self {
            keys: vec![
                Keyframe::new(0.0, 0.0).with_slope(1.0),
                Keyframe::new(1.0, 1.0).with_slope(1.0),
            ],
        }
    }

    /// Keyframes in time order.
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Time of the first key.
    pub fn start_time(&self) -> f64 {
        self.keys[0].time
    }

    /// Time of the last key.
    pub fn end_time(&self) -> f64 {
        self.keys[self.keys.len() - 1].time
    }

    /// Value at `t`; clamps to the end keys outside the keyed range.
    pub fn evaluate(&self, t: f64) -> f64 {
        let first = &self.keys[0];
        let last = &self.keys[self.keys.len() - 1];
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }
        let i = self.keys.partition_point(|k| k.time <= t);
        segment_bezier(&self.keys[i - 1], &self.keys[i]).map_or(first.value, |bez| {
            let s = solve_for_x(&bez, t);
            bez.eval(s).y
        })
    }

    /// Convert contiguous x-monotone Bézier segments into keyframes.
    ///
    /// Handles that point backwards in x collapse onto their key; longer handles are clamped to
    /// the segment's time range.
    pub fn from_bezier_segments(segments: &[CubicBez]) -> TagweaveResult<Self> {
        let Some(first) = segments.first() else {
            return Err(TagweaveError::animation("no bezier segments"));
        };
        let mut keys = vec![Keyframe::new(first.p0.x, first.p0.y)];
        for (i, seg) in segments.iter().enumerate() {
            let span = seg.p3.x - seg.p0.x;
            if !span.is_finite() || span <= 0.0 {
                return Err(TagweaveError::animation(format!(
                    "segment {i} does not advance in x"
                )));
            }
            if i > 0 && (seg.p0 - segments[i - 1].p3).hypot() > 1e-6 * span.max(1.0) {
                return Err(TagweaveError::animation(format!(
                    "segment {i} does not start where segment {} ends",
                    i - 1
                )));
            }
            let (out_tangent, out_weight) = handle(seg.p1 - seg.p0, span);
            let (in_tangent, in_weight) = handle(seg.p3 - seg.p2, span);

            let prev = keys.len() - 1;
            keys[prev].out_tangent = out_tangent;
            keys[prev].out_weight = out_weight;

            let mut next = Keyframe::new(seg.p3.x, seg.p3.y);
            next.in_tangent = in_tangent;
            next.in_weight = in_weight;
            keys.push(next);
        }
        Self::new(keys)
    }

    /// Interpret `points` as `3n + 1` control points of `n` contiguous cubic segments.
    pub fn from_control_points(points: &[Point]) -> TagweaveResult<Self> {
        if points.len() < 4 || (points.len() - 1) % 3 != 0 {
            return Err(TagweaveError::animation(
                "control point count must be 3n + 1 with n >= 1",
            ));
        }
        let segments: Vec<CubicBez> = points
            .windows(4)
            .step_by(3)
            .map(|w| CubicBez::new(w[0], w[1], w[2], w[3]))
            .collect();
        Self::from_bezier_segments(&segments)
    }

    /// Fit a smooth curve through samples sorted by increasing x.
    ///
    /// `tolerance` bounds each sample's Euclidean distance to the fitted Bézier path, not the
    /// vertical error `|evaluate(x) - y|`. Where the data is steep the vertical error can be
    /// several times larger than `tolerance`.
    pub fn fit_points(points: &[Point], tolerance: f64) -> TagweaveResult<Self> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(TagweaveError::animation("fit tolerance must be finite and > 0"));
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(TagweaveError::animation("fit points must be finite"));
        }
        if points.windows(2).any(|w| w[1].x <= w[0].x) {
            return Err(TagweaveError::animation(
                "fit points must have strictly increasing x",
            ));
        }
        match points {
            [] => Err(TagweaveError::animation("no points to fit")),
            [p] => Self::new(vec![Keyframe::new(p.x, p.y)]),
            _ => Self::from_bezier_segments(&fit_cubic_beziers(points, tolerance)),
        }
    }
}

fn handle(v: Vec2, span: f64) -> (f64, f64) {
    if v.x <= SOLVE_EPS * span {
        return (0.0, 0.0);
    }
    (v.y / v.x, (v.x / span).min(1.0))
}

fn segment_bezier(k0: &Keyframe, k1: &Keyframe) -> Option<CubicBez> {
    let dx = k1.time - k0.time;
    if dx <= 0.0 {
        return None;
    }
    let h0 = k0.out_weight * dx;
    let h1 = k1.in_weight * dx;
    Some(CubicBez::new(
        Point::new(k0.time, k0.value),
        Point::new(k0.time + h0, k0.value + k0.out_tangent * h0),
        Point::new(k1.time - h1, k1.value - k1.in_tangent * h1),
        Point::new(k1.time, k1.value),
    ))
}

/// Parameter `s` with `bez.eval(s).x == x`, by bracketed Newton iteration.
fn solve_for_x(bez: &CubicBez, x: f64) -> f64 {
    let (mut lo, mut hi) = (0.0, 1.0);
    let span = bez.p3.x - bez.p0.x;
    let mut s = ((x - bez.p0.x) / span).clamp(0.0, 1.0);
    let deriv = bez.deriv();
    for _ in 0..64 {
        let err = bez.eval(s).x - x;
        if err.abs() <= SOLVE_EPS * span.max(1.0) {
            break;
        }
        if err > 0.0 {
            hi = s;
        } else {
            lo = s;
        }
        let dx = deriv.eval(s).x;
        let newton = s - err / dx;
        s = if dx.abs() > SOLVE_EPS && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
    }
    s
}

/// Fit cubic Béziers through `points` so every sample lies within `error` of the result.
///
/// Chord-length parameterisation and least-squares handle lengths, refined by Newton
/// reparameterisation; segments that stay too far off are split at the worst sample.
pub fn fit_cubic_beziers(points: &[Point], error: f64) -> Vec<CubicBez> {
    let mut pts: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if pts.last().is_none_or(|q| (p - *q).hypot() > 0.0) {
            pts.push(p);
        }
    }
    let mut out = Vec::new();
    if pts.len() < 2 {
        return out;
    }
    let n = pts.len();
    let t1 = unit(pts[1] - pts[0]).unwrap_or(Vec2::new(1.0, 0.0));
    let t2 = unit(pts[n - 2] - pts[n - 1]).unwrap_or(Vec2::new(-1.0, 0.0));
    fit_cubic(&pts, t1, t2, error, &mut out);
    out
}

fn fit_cubic(pts: &[Point], t1: Vec2, t2: Vec2, error: f64, out: &mut Vec<CubicBez>) {
    let n = pts.len();
    let (first, last) = (pts[0], pts[n - 1]);
    if n == 2 {
        let dist = (last - first).hypot() / 3.0;
        out.push(CubicBez::new(first, first + t1 * dist, last + t2 * dist, last));
        return;
    }

    let mut u = chord_length_parameterize(pts);
    let mut bez = generate_bezier(pts, &u, t1, t2);
    let (mut max_err, mut split) = max_error(pts, &bez, &u);
    if max_err < error {
        out.push(bez);
        return;
    }

    if max_err < error * 4.0 {
        for _ in 0..MAX_REPARAM_ITERS {
            u = reparameterize(pts, &u, &bez);
            bez = generate_bezier(pts, &u, t1, t2);
            (max_err, split) = max_error(pts, &bez, &u);
            if max_err < error {
                out.push(bez);
                return;
            }
        }
    }

    let center = unit(pts[split - 1] - pts[split + 1])
        .or_else(|| unit(pts[split - 1] - pts[split]))
        .unwrap_or(-t1);
    fit_cubic(&pts[..=split], t1, center, error, out);
    fit_cubic(&pts[split..], -center, t2, error, out);
}

fn unit(v: Vec2) -> Option<Vec2> {
    let len = v.hypot();
    (len > 1e-12).then(|| v / len)
}

fn chord_length_parameterize(pts: &[Point]) -> Vec<f64> {
    let mut u = Vec::with_capacity(pts.len());
    u.push(0.0);
    for w in pts.windows(2) {
        let prev = u[u.len() - 1];
        u.push(prev + (w[1] - w[0]).hypot());
    }
    let total = u[u.len() - 1];
    if total > 0.0 {
        for v in &mut u {
            *v /= total;
        }
    }
    u
}

fn bernstein(u: f64) -> [f64; 4] {
    let m = 1.0 - u;
    [m * m * m, 3.0 * u * m * m, 3.0 * u * u * m, u * u * u]
}

fn generate_bezier(pts: &[Point], u: &[f64], t1: Vec2, t2: Vec2) -> CubicBez {
    let first = pts[0];
    let last = pts[pts.len() - 1];

    let mut c = [[0.0; 2]; 2];
    let mut x = [0.0; 2];
    for (p, &ui) in pts.iter().zip(u) {
        let b = bernstein(ui);
        let a0 = t1 * b[1];
        let a1 = t2 * b[2];
        c[0][0] += a0.dot(a0);
        c[0][1] += a0.dot(a1);
        c[1][1] += a1.dot(a1);
        let base = first.to_vec2() * (b[0] + b[1]) + last.to_vec2() * (b[2] + b[3]);
        let tmp = p.to_vec2() - base;
        x[0] += a0.dot(tmp);
        x[1] += a1.dot(tmp);
    }
    c[1][0] = c[0][1];

    let det_c0_c1 = c[0][0] * c[1][1] - c[1][0] * c[0][1];
    let det_c0_x = c[0][0] * x[1] - c[1][0] * x[0];
    let det_x_c1 = x[0] * c[1][1] - x[1] * c[0][1];
    let (alpha_l, alpha_r) = if det_c0_c1.abs() > 1e-12 {
        (det_x_c1 / det_c0_c1, det_c0_x / det_c0_c1)
    } else {
        (0.0, 0.0)
    };

    let seg_len = (last - first).hypot();
    let eps = 1e-6 * seg_len;
    if alpha_l < eps || alpha_r < eps {
        let dist = seg_len / 3.0;
        return CubicBez::new(first, first + t1 * dist, last + t2 * dist, last);
    }
    CubicBez::new(first, first + t1 * alpha_l, last + t2 * alpha_r, last)
}

/// Largest distance from a sample to the curve, and the interior index where it occurs.
fn max_error(pts: &[Point], bez: &CubicBez, u: &[f64]) -> (f64, usize) {
    let n = pts.len();
    let mut split = n / 2;
    let mut max = 0.0;
    for i in 1..n - 1 {
        let d = (bez.eval(u[i]) - pts[i]).hypot();
        if d >= max {
            max = d;
            split = i;
        }
    }
    (max, split)
}

fn reparameterize(pts: &[Point], u: &[f64], bez: &CubicBez) -> Vec<f64> {
    let d1 = bez.deriv();
    let d2 = d1.deriv();
    pts.iter()
        .zip(u)
        .map(|(p, &ui)| {
            let d = bez.eval(ui) - *p;
            let q1 = d1.eval(ui).to_vec2();
            let q2 = d2.eval(ui).to_vec2();
            let num = d.dot(q1);
            let den = q1.dot(q1) + d.dot(q2);
            if den.abs() < 1e-12 {
                ui
            } else {
                (ui - num / den).clamp(0.0, 1.0)
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/animation/curve.rs"]
mod tests;
