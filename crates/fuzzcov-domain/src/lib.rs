//! Pure time-series alignment and averaging engine for fuzzcov.
//!
//! This crate has no side effects. It turns validated runs into step series,
//! merges their time domains, resamples them with previous-value semantics,
//! and averages them pointwise.
//!
//! Coverage is a non-decreasing step function of time, so every lookup here
//! uses the right-continuous rule: the value at `t` is the value of the last
//! breakpoint at or before `t`. Nothing is ever interpolated linearly.

use fuzzcov_types::{
    AVERAGED_LABEL_PREFIX, LabeledSeries, Mode, Run, StepSeries, StepSeriesError, UnifiedAxis,
};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by the engine.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// A validated run produced an invalid step series.
    #[error("internal consistency failure: step series for run '{label}' is invalid: {source}")]
    InvalidSeries {
        label: String,
        #[source]
        source: StepSeriesError,
    },

    /// Averaging was requested over zero runs.
    #[error("cannot average zero runs")]
    NoRuns,

    /// A resampled series does not line up with the unified axis.
    #[error(
        "internal consistency failure: resampled series {index} has {found} values, expected {expected}"
    )]
    InternalConsistency {
        index: usize,
        expected: usize,
        found: usize,
    },

    /// The averaged columns did not form a valid step series.
    #[error("internal consistency failure: averaged series is invalid: {0}")]
    InvalidAggregate(StepSeriesError),
}

// ============================================================================
// Extractor
// ============================================================================

/// Convert a run into its step series, in percent.
///
/// Each sample becomes `(time, coverage * 100)` and a terminal point
/// `(end_time, last_value)` is appended so the curve reaches the run's real
/// termination. When `end_time` equals the last sample time the terminal
/// point is dropped instead of duplicated.
///
/// # Examples
///
/// ```
/// use fuzzcov_domain::extract;
/// use fuzzcov_types::{CoverageSample, Run};
///
/// let run = Run::new(
///     "a.json",
///     vec![CoverageSample::new(0.0, 0.0), CoverageSample::new(5.0, 0.2)],
///     Some(12.0),
/// )
/// .unwrap();
///
/// let series = extract(&run).unwrap();
/// assert_eq!(series.times(), &[0.0, 5.0, 12.0]);
/// assert_eq!(series.values(), &[0.0, 20.0, 20.0]);
/// ```
pub fn extract(run: &Run) -> Result<StepSeries, EngineError> {
    let samples = run.samples();
    let mut times = Vec::with_capacity(samples.len() + 1);
    let mut values = Vec::with_capacity(samples.len() + 1);

    for sample in samples {
        times.push(sample.time);
        values.push(sample.cumulative_coverage * 100.0);
    }

    if let Some(last) = run.last_sample()
        && run.end_time() > last.time
    {
        times.push(run.end_time());
        values.push(last.cumulative_coverage * 100.0);
    }

    // `Run::new` already guarantees increasing times, so a failure here is an
    // engine defect rather than bad input.

    StepSeries::new(times, values).map_err(|source| EngineError::InvalidSeries {
        label: run.label().to_string(),
        source,
    })
}

// ============================================================================
// Time-Axis Unifier
// ============================================================================

/// Merge the breakpoints of every series into one sorted axis without duplicates.
///
/// The result is a superset of each input's times, so every coverage change
/// of every run lands exactly on an axis point.
pub fn unify(series_list: &[StepSeries]) -> UnifiedAxis {
    let capacity = series_list.iter().map(StepSeries::len).sum();
    let mut times = Vec::with_capacity(capacity);
    for series in series_list {
        times.extend_from_slice(series.times());
    }
    UnifiedAxis::new(times)
}

// ============================================================================
// Step Resampler
// ============================================================================

/// Evaluate `series` at every axis point using previous-value semantics.
///
/// For query `t` the result is `values[i]` with `i` the largest index such
/// that `times[i] <= t`. Points before the first breakpoint read as `0.0`
/// (no coverage yet); points past the last breakpoint hold the last value.
///
/// Both sequences are sorted, so a single forward merge covers the axis in
/// `O(|axis| + |series|)`.
pub fn resample(series: &StepSeries, axis: &UnifiedAxis) -> Vec<f64> {
    let times = series.times();
    let values = series.values();
    let mut seen = 0usize;

    axis.as_slice()
        .iter()
        .map(|&t| {
            while seen < times.len() && times[seen] <= t {
                seen += 1;
            }
            match seen {
                0 => 0.0,
                n => values[n - 1],
            }
        })
        .collect()
}

// ============================================================================
// Averager
// ============================================================================

/// Pointwise arithmetic mean of index-aligned resampled series.
///
/// Every inner sequence must hold exactly `axis_len` values. A mismatch can
/// only come from a resampler defect and is reported as
/// [`EngineError::InternalConsistency`].
pub fn average(resampled: &[Vec<f64>], axis_len: usize) -> Result<Vec<f64>, EngineError> {
    if resampled.is_empty() {
        return Err(EngineError::NoRuns);
    }

    let mut sums = vec![0.0f64; axis_len];
    for (index, values) in resampled.iter().enumerate() {
        if values.len() != axis_len {
            return Err(EngineError::InternalConsistency {
                index,
                expected: axis_len,
                found: values.len(),
            });
        }
        for (sum, value) in sums.iter_mut().zip(values) {
            *sum += value;
        }
    }

    let count = resampled.len() as f64;
    Ok(sums.into_iter().map(|sum| sum / count).collect())
}

/// Unify, resample and average a set of step series into one series.
pub fn aggregate(series_list: &[StepSeries]) -> Result<StepSeries, EngineError> {
    if series_list.is_empty() {
        return Err(EngineError::NoRuns);
    }

    let axis = unify(series_list);
    let resampled: Vec<Vec<f64>> = series_list
        .iter()
        .map(|series| resample(series, &axis))
        .collect();
    let means = average(&resampled, axis.len())?;

    StepSeries::new(axis.into_inner(), means).map_err(EngineError::InvalidAggregate)
}

// ============================================================================
// Mode Selection
// ============================================================================

/// Legend label for the averaged curve.
pub fn averaged_label<'a>(labels: impl IntoIterator<Item = &'a str>) -> String {
    let joined: Vec<&str> = labels.into_iter().collect();
    format!("{}{}", AVERAGED_LABEL_PREFIX, joined.join(", "))
}

/// Build the series to plot for the requested mode.
///
/// [`Mode::PerRun`] keeps each run's native breakpoints; [`Mode::Average`]
/// yields a single curve on the unified axis.
pub fn build_series(runs: &[Run], mode: Mode) -> Result<Vec<LabeledSeries>, EngineError> {
    if runs.is_empty() {
        return Err(EngineError::NoRuns);
    }

    let extracted = runs.iter().map(extract).collect::<Result<Vec<_>, _>>()?;

    match mode {
        Mode::PerRun => Ok(runs
            .iter()
            .zip(extracted)
            .map(|(run, series)| LabeledSeries {
                label: run.label().to_string(),
                series,
            })
            .collect()),
        Mode::Average => {
            let series = aggregate(&extracted)?;
            Ok(vec![LabeledSeries {
                label: averaged_label(runs.iter().map(Run::label)),
                series,
            }])
        }
    }
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use fuzzcov_types::CoverageSample;
    use proptest::prelude::*;

    /// Strategy producing valid runs: increasing times, non-decreasing coverage.
    fn arb_run() -> impl Strategy<Value = Run> {
        (
            0.0f64..10.0,
            prop::collection::vec((0.001f64..50.0, 0.0f64..0.1), 1..40),
            0.0f64..20.0,
        )
            .prop_map(|(start, steps, tail)| {
                let mut time = start;
                let mut coverage = 0.0f64;
                let mut samples = Vec::with_capacity(steps.len());
                for (dt, dc) in steps {
                    samples.push(CoverageSample::new(time, coverage));
                    time += dt;
                    coverage = (coverage + dc).min(1.0);
                }
                let last = samples[samples.len() - 1].time;
                Run::new("arb", samples, Some(last + tail)).expect("strategy builds valid runs")
            })
    }

    proptest! {
        #[test]
        fn extracted_series_is_monotone(run in arb_run()) {
            let series = extract(&run).unwrap();
            prop_assert!(series.times().windows(2).all(|w| w[0] < w[1]));
            prop_assert!(series.values().windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(series.end_time(), run.end_time());
        }

        #[test]
        fn resample_matches_binary_search_lookup(
            run in arb_run(),
            queries in prop::collection::vec(0.0f64..2500.0, 0..60),
        ) {
            let series = extract(&run).unwrap();
            let axis = UnifiedAxis::new(queries);
            let merged = resample(&series, &axis);
            let looked_up: Vec<f64> = axis.as_slice().iter().map(|&t| series.value_at(t)).collect();
            prop_assert_eq!(merged, looked_up);
        }

        #[test]
        fn unified_axis_is_strict_superset(runs in prop::collection::vec(arb_run(), 1..6)) {
            let series: Vec<StepSeries> = runs.iter().map(|r| extract(r).unwrap()).collect();
            let axis = unify(&series);
            prop_assert!(axis.as_slice().windows(2).all(|w| w[0] < w[1]));
            for s in &series {
                for t in s.times() {
                    prop_assert!(axis.as_slice().binary_search_by(|a| a.total_cmp(t)).is_ok());
                }
            }
        }

        #[test]
        fn resampling_onto_own_axis_is_identity(run in arb_run()) {
            let series = extract(&run).unwrap();
            let axis = unify(std::slice::from_ref(&series));
            prop_assert_eq!(resample(&series, &axis), series.values().to_vec());
        }

        #[test]
        fn average_is_order_independent(runs in prop::collection::vec(arb_run(), 2..6)) {
            let series: Vec<StepSeries> = runs.iter().map(|r| extract(r).unwrap()).collect();
            let mut reversed = series.clone();
            reversed.reverse();
            let forward = aggregate(&series).unwrap();
            let backward = aggregate(&reversed).unwrap();
            prop_assert_eq!(forward.times(), backward.times());
            for (a, b) in forward.values().iter().zip(backward.values()) {
                prop_assert!((a - b).abs() < 1e-9);
            }
        }

        #[test]
        fn average_stays_within_bounds(runs in prop::collection::vec(arb_run(), 1..6)) {
            let series: Vec<StepSeries> = runs.iter().map(|r| extract(r).unwrap()).collect();
            let out = aggregate(&series).unwrap();
            prop_assert!(out.values().iter().all(|v| (0.0..=100.0 + 1e-9).contains(v)));
            prop_assert!(out.values().windows(2).all(|w| w[0] <= w[1] + 1e-9));
        }
    }
}
