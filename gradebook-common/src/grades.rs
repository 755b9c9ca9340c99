//! Grade averaging
//!
//! Grades are on a /20 scale. Values are clamped to [0, 20] at ingestion;
//! nothing here re-validates the range.

/// Value and optional weight of one grade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeSample {
    pub value: f64,
    pub coef: Option<f64>,
}

impl GradeSample {
    pub fn new(value: f64) -> Self {
        Self { value, coef: None }
    }

    pub fn weighted(value: f64, coef: f64) -> Self {
        Self {
            value,
            coef: Some(coef),
        }
    }
}

/// Average of a grade set, rounded to two decimals
///
/// Without any positive coefficient the plain mean is used. Otherwise the
/// coefficient-weighted mean is used, with a missing coefficient counting as 1.
///
/// Returns `None` for an empty set, and for a weighted set whose coefficients
/// sum to zero. An absent average is never reported as 0.
///
/// # Examples
///
/// ```
/// use gradebook_common::grades::{average, GradeSample};
///
/// let plain = [GradeSample::new(10.0), GradeSample::new(15.0)];
/// assert_eq!(average(&plain), Some(12.5));
///
/// let weighted = [GradeSample::weighted(10.0, 2.0), GradeSample::new(16.0)];
/// assert_eq!(average(&weighted), Some(12.0));
///
/// assert_eq!(average(&[]), None);
/// ```
pub fn average(grades: &[GradeSample]) -> Option<f64> {
    if grades.is_empty() {
        return None;
    }

    let has_coef = grades.iter().any(|g| g.coef.is_some_and(|c| c > 0.0));
    if !has_coef {
        let sum: f64 = grades.iter().map(|g| g.value).sum();
        return Some(round2(sum / grades.len() as f64));
    }

    let (total, coef_sum) = grades.iter().fold((0.0, 0.0), |(total, coef_sum), g| {
        let c = g.coef.unwrap_or(1.0);
        (total + g.value * c, coef_sum + c)
    });

    if coef_sum == 0.0 {
        return None;
    }
    Some(round2(total / coef_sum))
}

/// Round half away from zero at two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
