//! Guarded arithmetic for stateful metric derivations.
//!
//! Counter and rate derivations routinely hit transient states that are not
//! errors: a first collect with no history, a counter reset, clock skew
//! between cycles. These three primitives absorb all of that — any missing
//! operand, negative result, or zero divisor collapses to `None`, and the
//! affected key is simply not reported this cycle. This module is the only
//! place numeric safety is enforced.
//!
//! Each operation logs with the metric key and hostname so a dropped value
//! can be traced back to the device that produced it.

/// `minuend - subtrahend`, or `None` on a missing operand or negative result.
pub fn subtract(
    key: &str,
    minuend: Option<f64>,
    subtrahend: Option<f64>,
    hostname: &str,
) -> Option<f64> {
    let result = minuend? - subtrahend?;
    if result < 0.0 {
        log::warn!(
            "host {}: negative subtraction result {} for {}; discarding value this cycle",
            hostname,
            result,
            key
        );
        return None;
    }
    Some(result)
}

/// `dividend / divisor`, or `None` on a missing operand, zero divisor or
/// negative result.
pub fn divide(
    key: &str,
    dividend: Option<f64>,
    divisor: Option<f64>,
    hostname: &str,
) -> Option<f64> {
    let dividend = dividend?;
    let divisor = divisor?;
    if divisor == 0.0 {
        log::debug!("host {}: zero divisor for {}; skipping", hostname, key);
        return None;
    }
    let result = dividend / divisor;
    if result < 0.0 {
        log::warn!(
            "host {}: negative division result {} for {}; discarding value this cycle",
            hostname,
            result,
            key
        );
        return None;
    }
    Some(result)
}

/// `a * b`, or `None` on a missing operand or negative result.
pub fn multiply(key: &str, a: Option<f64>, b: Option<f64>, hostname: &str) -> Option<f64> {
    let result = a? * b?;
    if result < 0.0 {
        log::warn!(
            "host {}: negative multiplication result {} for {}; discarding value this cycle",
            hostname,
            result,
            key
        );
        return None;
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "hw.energy";
    const HOST: &str = "host-1";

    #[test]
    fn test_subtract() {
        assert_eq!(subtract(KEY, Some(10.0), Some(4.0), HOST), Some(6.0));
        assert_eq!(subtract(KEY, Some(10.0), Some(10.0), HOST), Some(0.0));
    }

    #[test]
    fn test_subtract_guards() {
        assert_eq!(subtract(KEY, None, Some(4.0), HOST), None);
        assert_eq!(subtract(KEY, Some(4.0), None, HOST), None);
        // Counter reset: lower current than previous must not go negative.
        assert_eq!(subtract(KEY, Some(4.0), Some(10.0), HOST), None);
    }

    #[test]
    fn test_divide() {
        assert_eq!(divide(KEY, Some(50.0), Some(2.0), HOST), Some(25.0));
    }

    #[test]
    fn test_divide_guards() {
        assert_eq!(divide(KEY, Some(50.0), Some(0.0), HOST), None);
        assert_eq!(divide(KEY, None, Some(2.0), HOST), None);
        assert_eq!(divide(KEY, Some(50.0), None, HOST), None);
        assert_eq!(divide(KEY, Some(50.0), Some(-2.0), HOST), None);
    }

    #[test]
    fn test_multiply() {
        assert_eq!(multiply(KEY, Some(10.0), Some(1.5), HOST), Some(15.0));
        assert_eq!(multiply(KEY, Some(10.0), Some(0.0), HOST), Some(0.0));
    }

    #[test]
    fn test_multiply_guards() {
        assert_eq!(multiply(KEY, None, Some(1.0), HOST), None);
        assert_eq!(multiply(KEY, Some(1.0), None, HOST), None);
        assert_eq!(multiply(KEY, Some(-3.0), Some(2.0), HOST), None);
    }
}
