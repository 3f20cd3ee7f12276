use std::str::FromStr;

use crate::prelude::*;

pub fn non_zero_usize(value: &str) -> Result<usize> {
    match FromStr::from_str(value)? {
        value if value >= 1 => Ok(value),
        _ => Err(anyhow!("expected a positive number")),
    }
}

pub fn non_negative_f64(value: &str) -> Result<f64> {
    match f64::from_str(value)? {
        value if value >= 0.0 => Ok(value),
        _ => Err(anyhow!("expected a non-negative number")),
    }
}

pub fn positive_f64(value: &str) -> Result<f64> {
    match f64::from_str(value)? {
        value if value > 0.0 => Ok(value),
        _ => Err(anyhow!("expected a positive number")),
    }
}

pub fn sample_rate(value: &str) -> Result<f32> {
    match f32::from_str(value)? {
        value if (0.0..=1.0).contains(&value) => Ok(value),
        _ => Err(anyhow!("expected a number between 0 and 1")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_usize_ok() -> Result {
        assert_eq!(non_zero_usize("1")?, 1);
        assert!(non_zero_usize("0").is_err());
        assert!(non_zero_usize("-1").is_err());
        Ok(())
    }

    #[test]
    fn non_negative_f64_ok() -> Result {
        assert_eq!(non_negative_f64("0")?, 0.0);
        assert_eq!(non_negative_f64("0.5")?, 0.5);
        assert!(non_negative_f64("-0.5").is_err());
        assert!(non_negative_f64("NaN").is_err());
        Ok(())
    }

    #[test]
    fn positive_f64_ok() -> Result {
        assert_eq!(positive_f64("1e-3")?, 0.001);
        assert!(positive_f64("0").is_err());
        assert!(positive_f64("x").is_err());
        Ok(())
    }

    #[test]
    fn sample_rate_ok() -> Result {
        assert_eq!(sample_rate("0.25")?, 0.25);
        assert!(sample_rate("1.5").is_err());
        Ok(())
    }
}
