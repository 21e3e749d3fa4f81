//! Run scoring
use labdriver_core::{RunData, Scenario, MAX_SCORE};

const ERROR_RATE_PENALTY: i64 = 40;
const P95_PENALTY: i64 = 40;
const P99_TAIL_PENALTY: i64 = 10;

/// Grade a run against its scenario's thresholds.
///
/// Starts at 100 and subtracts:
/// - up to 40 for an error rate above `max_err_rate` (`floor(40 * errRate)`),
/// - up to 40 for a P95 above `max_p95_ms` (`floor(40 * (p95 / max_p95_ms - 1))`),
/// - a flat 10 when P99 exceeds twice `max_p95_ms`.
///
/// Never fails; a run without requests has an error rate of zero. Returns the score and a
/// one-line summary.
pub fn score(data: &RunData, scenario: &Scenario) -> (u8, String) {
    let err_rate = data.error_rate();
    let p95 = data.latencies.p95_ms();
    let p99 = data.latencies.p99_ms();

    let mut score = MAX_SCORE as i64;

    if err_rate > scenario.max_err_rate {
        score -= penalty(ERROR_RATE_PENALTY as f64 * err_rate, ERROR_RATE_PENALTY);
    }

    if p95 > scenario.max_p95_ms {
        let ratio = p95 / scenario.max_p95_ms;
        score -= penalty(P95_PENALTY as f64 * (ratio - 1.), P95_PENALTY);
    }

    if p99 > scenario.max_p95_ms * 2. {
        score -= P99_TAIL_PENALTY;
    }

    let score = score.clamp(0, MAX_SCORE as i64) as u8;

    let line = format!(
        "SCORE {}: {}/100 | p95={:.0}ms errRate={:.1}% reqs={}",
        scenario.name,
        score,
        p95,
        err_rate * 100.,
        data.requests
    );

    (score, line)
}

// NOTE: `as` saturates, so an infinite ratio (zero threshold) lands on `max`.
fn penalty(raw: f64, max: i64) -> i64 {
    if raw.is_nan() {
        return 0;
    }
    (raw.floor() as i64).clamp(0, max)
}
