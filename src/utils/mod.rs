pub mod cache;

pub use cache::Cache;

/// ERC-20 `decimals()` is a `uint8`. Explorer values outside that range,
/// or fractional ones, mark a malformed token.
pub fn token_decimals(raw: Option<f64>, default: u8) -> Option<u8> {
    match raw {
        None => Some(default),
        Some(d) if d.fract() == 0.0 && (0.0..=u8::MAX as f64).contains(&d) => Some(d as u8),
        Some(_) => None,
    }
}

/// Convert an integer amount in base units into a decimal amount. `None`
/// when either side is not a finite number.
pub fn scale_amount(raw: f64, decimals: u8) -> Option<f64> {
    let scaled = raw / 10f64.powi(i32::from(decimals));
    (raw.is_finite() && scaled.is_finite()).then_some(scaled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_amount() {
        assert_eq!(scale_amount(1_500_000.0, 6), Some(1.5));
        assert_eq!(scale_amount(5e16, 18), Some(0.05));
        assert_eq!(scale_amount(42.0, 0), Some(42.0));
        assert_eq!(scale_amount(f64::INFINITY, 18), None);
        assert_eq!(scale_amount(f64::NAN, 6), None);
    }

    #[test]
    fn test_token_decimals_bounds() {
        assert_eq!(token_decimals(None, 18), Some(18));
        assert_eq!(token_decimals(Some(6.0), 18), Some(6));
        assert_eq!(token_decimals(Some(255.0), 18), Some(255));
        assert_eq!(token_decimals(Some(256.0), 18), None);
        assert_eq!(token_decimals(Some(3_000_000_000.0), 18), None);
        assert_eq!(token_decimals(Some(4_294_967_295.0), 18), None);
        assert_eq!(token_decimals(Some(-1.0), 18), None);
        assert_eq!(token_decimals(Some(6.5), 18), None);
        assert_eq!(token_decimals(Some(f64::NAN), 18), None);
    }
}
