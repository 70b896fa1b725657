use crate::errors::{DomainError, Result};

/// Parse a retention time token into seconds.
///
/// Accepted forms are `"<number>m"` (minutes), `"<number>s"` (seconds) and a
/// bare `"<number>"` (seconds).
pub fn time_str_secs(token: &str) -> Result<f64> {
    let trimmed = token.trim();
    let (number, factor) = match trimmed.as_bytes().last() {
        Some(b'm') => (&trimmed[..trimmed.len() - 1], 60.0),
        Some(b's') => (&trimmed[..trimmed.len() - 1], 1.0),
        Some(_) => (trimmed, 1.0),
        None => return Err(DomainError::InvalidTimeString(token.to_string()).into()),
    };
    let value: f64 = number
        .parse()
        .map_err(|_| DomainError::InvalidTimeString(token.to_string()))?;
    Ok(value * factor)
}

/// Convert a time duration in seconds to a point count on a chromatogram
/// sampled every `time_step` seconds, rounded to the nearest odd integer >= 1
/// so windows stay symmetric.
pub fn duration_to_odd_points(duration_secs: f64, time_step: f64) -> usize {
    let raw = (duration_secs / time_step).round() as i64;
    nearest_odd(raw.max(1) as usize)
}

pub fn nearest_odd(points: usize) -> usize {
    if points % 2 == 1 {
        points
    } else {
        points + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_str_secs_minutes() {
        assert_eq!(time_str_secs("1.5m").unwrap(), 90.0);
        assert_eq!(time_str_secs("12m").unwrap(), 720.0);
    }

    #[test]
    fn test_time_str_secs_seconds() {
        assert_eq!(time_str_secs("90s").unwrap(), 90.0);
        assert_eq!(time_str_secs("90").unwrap(), 90.0);
        assert_eq!(time_str_secs(" 45.5 ").unwrap(), 45.5);
    }

    #[test]
    fn test_time_str_secs_rejects_garbage() {
        for bad in ["", "m", "12h", "twelve", "1.5mm"] {
            assert!(time_str_secs(bad).is_err(), "expected {:?} to fail", bad);
        }
    }

    #[test]
    fn test_duration_to_odd_points() {
        // 90 s at one scan per second -> 91 points (odd already)
        assert_eq!(duration_to_odd_points(90.0, 1.0), 91);
        // 90 s at 0.9 s per scan -> 100 points, bumped to 101
        assert_eq!(duration_to_odd_points(90.0, 0.9), 101);
        // Tiny durations clamp to a single point
        assert_eq!(duration_to_odd_points(0.001, 1.0), 1);
    }
}
