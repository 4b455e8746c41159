//! Financial helpers for annualizing investment costs.

/// Capital Recovery Factor: converts an overnight cost into an equal annual
/// payment over `years` at interest `rate`.
///
/// CRF = r(1+r)^n / ((1+r)^n - 1), or 1/n without discounting.
/// [`ModelData::validate`](crate::ModelData::validate) rejects zero
/// lifetimes; a zero here is clamped to one year.
pub fn capital_recovery_factor(rate: f64, years: u32) -> f64 {
    let n = years.max(1) as f64;
    if rate.abs() < 1e-10 {
        1.0 / n
    } else {
        rate * (1.0 + rate).powf(n) / ((1.0 + rate).powf(n) - 1.0)
    }
}
