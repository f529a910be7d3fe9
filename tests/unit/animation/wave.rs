use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn pulse(up: f64, crest: f64, down: f64, trough: f64) -> Wave {
    Wave::new(WaveParams {
        up_curve: WaveCurve::Ease(Ease::Linear),
        down_curve: WaveCurve::Ease(Ease::Linear),
        up_period: up,
        down_period: down,
        crest_wait: crest,
        trough_wait: trough,
        amplitude: 2.0,
        velocity: 1.0,
    })
    .unwrap()
}

#[test]
fn oscillation_spans_minus_a_to_a() {
    let w = Wave::oscillation(1.0, 2.0).unwrap();
    assert_eq!(w.mode(), WaveMode::Wave);
    assert_eq!(w.evaluate(0.0, 0.0), (-2.0, 1));
    assert_eq!(w.evaluate(0.5, 0.0), (2.0, -1));
    let (mid, dir) = w.evaluate(0.25, 0.0);
    assert!(close(mid, 0.0));
    assert_eq!(dir, 1);
}

#[test]
fn zero_wait_wave_repeats_every_period() {
    let w = Wave::oscillation(1.0, 1.5).unwrap();
    for t in [0.0, 0.125, 0.25, 0.75] {
        assert_eq!(w.evaluate(t, 0.0), w.evaluate(t + w.period(), 0.0), "t={t}");
    }
    for t in [0.1, 0.37, 0.93, 12.4] {
        let (a, da) = w.evaluate(t, 0.0);
        let (b, db) = w.evaluate(t + w.period(), 0.0);
        assert!(close(a, b), "t={t}");
        assert_eq!(da, db);
    }
}

#[test]
fn negative_time_wraps_euclidean() {
    let w = Wave::oscillation(1.0, 1.0).unwrap();
    assert_eq!(w.evaluate(-0.75, 0.0), w.evaluate(0.25, 0.0));
}

#[test]
fn offset_delays_by_offset_over_velocity() {
    let w = Wave::new(WaveParams {
        velocity: 2.0,
        ..WaveParams::default()
    })
    .unwrap();
    let (a, _) = w.evaluate(0.8, 1.0);
    let (b, _) = w.evaluate(0.3, 0.0);
    assert!(close(a, b));
    assert!(close(w.wavelength(), 2.0));
}

#[test]
fn modes_follow_waits() {
    assert_eq!(pulse(0.5, 0.0, 0.5, 0.0).mode(), WaveMode::Wave);
    assert_eq!(pulse(0.5, 0.2, 0.5, 0.0).mode(), WaveMode::InvertedPulse);
    assert_eq!(pulse(0.5, 0.0, 0.5, 0.2).mode(), WaveMode::Pulse);
    assert_eq!(pulse(0.5, 0.2, 0.5, 0.2).mode(), WaveMode::OneDirectionalPulse);
}

#[test]
fn mode_ranges_hold_over_a_cycle() {
    let cases = [
        (pulse(0.25, 0.0, 0.25, 0.0), -2.0, 2.0),
        (pulse(0.25, 0.25, 0.25, 0.0), -2.0, 0.0),
        (pulse(0.25, 0.0, 0.25, 0.25), 0.0, 2.0),
        (pulse(0.25, 0.25, 0.25, 0.25), 0.0, 2.0),
    ];
    for (w, lo, hi) in cases {
        for i in 0..200 {
            let (v, _) = w.evaluate(f64::from(i) * 0.01, 0.0);
            assert!(v >= lo - 1e-12 && v <= hi + 1e-12, "{:?} t={i} v={v}", w.mode());
        }
    }
}

#[test]
fn dwell_phases_hold_extremes_and_direction() {
    let w = pulse(0.25, 0.25, 0.25, 0.25);
    assert_eq!(w.evaluate(0.3, 0.0), (2.0, 1));
    assert_eq!(w.evaluate(0.6, 0.0).1, -1);
    assert_eq!(w.evaluate(0.9, 0.0), (0.0, -1));
    assert!(close(w.effective_up_period(), 0.5));
    assert!(close(w.effective_down_period(), 0.5));
    assert!(close(w.period(), 1.0));
    assert!(close(w.frequency(), 1.0));
}

#[test]
fn keyed_curves_shape_the_rise() {
    let w = Wave::new(WaveParams {
        up_curve: WaveCurve::Keyed(crate::animation::curve::AnimationCurve::linear()),
        trough_wait: 0.5,
        ..WaveParams::default()
    })
    .unwrap();
    let (v, dir) = w.evaluate(0.25, 0.0);
    assert!(close(v, 0.5));
    assert_eq!(dir, 1);
}

#[test]
fn passed_extrema_reports_crest_and_trough() {
    let w = Wave::oscillation(1.0, 1.0).unwrap();
    assert_eq!(w.passed_extrema(0.6, 0.2, 0.0), 1);
    assert_eq!(w.passed_extrema(1.1, 0.2, 0.0), -1);
    assert_eq!(w.passed_extrema(0.3, 0.1, 0.0), 0);
    assert_eq!(w.passed_extrema(0.6, 0.0, 0.0), 0);
    // Offset shifts the instants.
    assert_eq!(w.passed_extrema(0.6, 0.2, 0.5), -1);
}

#[test]
fn one_three_period_call_matches_three_single_period_calls() {
    let w = pulse(0.2, 0.0, 0.3, 0.5);
    let p = w.period();
    let whole = w.passed_extrema(3.3, 3.0 * p, 0.0);
    let split: i8 = (0..3)
        .map(|k| w.passed_extrema(3.3 - f64::from(k) * p, p, 0.0))
        .sum();
    assert_eq!(whole, split);
}

#[test]
fn extrema_are_additive_for_uneven_deltas() {
    let w = pulse(0.2, 0.0, 0.3, 0.5);
    assert_eq!(w.passed_extrema(3.3, 2.5, 0.0), 1);
    let pieces = w.passed_extrema(1.8, 1.0, 0.0)
        + w.passed_extrema(2.8, 1.0, 0.0)
        + w.passed_extrema(3.3, 0.5, 0.0);
    assert_eq!(pieces, 1);
}

#[test]
fn construction_rejects_invalid_params() {
    let bad = [
        WaveParams {
            up_period: 0.0,
            down_period: 0.0,
            ..WaveParams::default()
        },
        WaveParams {
            velocity: 0.0,
            ..WaveParams::default()
        },
        WaveParams {
            crest_wait: -1.0,
            ..WaveParams::default()
        },
        WaveParams {
            amplitude: f64::NAN,
            ..WaveParams::default()
        },
        WaveParams {
            up_period: -0.5,
            down_period: 1.0,
            ..WaveParams::default()
        },
    ];
    for params in bad {
        assert!(Wave::new(params).is_err());
    }
}

#[test]
fn serde_goes_through_validation() {
    let w = pulse(0.2, 0.1, 0.3, 0.4);
    let json = serde_json::to_string(&w).unwrap();
    let back: Wave = serde_json::from_str(&json).unwrap();
    assert_eq!(back, w);

    let err = serde_json::from_str::<Wave>(r#"{"velocity": 0.0}"#);
    assert!(err.is_err());
}
