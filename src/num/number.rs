use std::str::FromStr;

use bigdecimal::BigDecimal;
use smol_str::SmolStr;

// Numbers live in the arena as their JSON text. Parsed numbers keep their
// source text; natives are formatted through itoa/ryu, so `1.0_f64` is
// written `1.0` and `1e21_f64` is written `1e21`.

/// Struct and field name serde_json uses to carry the exact text of a number
/// under `arbitrary_precision`.
pub(crate) const RAW_NUMBER_TOKEN: &str = "$serde_json::private::Number";

pub(crate) fn integer_text<I: itoa::Integer>(value: I) -> SmolStr {
    let mut buffer = itoa::Buffer::new();
    SmolStr::new(buffer.format(value))
}

/// Returns `None` for NaN and infinities, which JSON cannot represent.
pub(crate) fn f64_text(value: f64) -> Option<SmolStr> {
    if !value.is_finite() {
        return None;
    }
    let mut buffer = ryu::Buffer::new();
    Some(SmolStr::new(buffer.format_finite(value)))
}

pub(crate) fn f32_text(value: f32) -> Option<SmolStr> {
    if !value.is_finite() {
        return None;
    }
    let mut buffer = ryu::Buffer::new();
    Some(SmolStr::new(buffer.format_finite(value)))
}

/// Integer readers reject fractions and exponents, matching how strict JSON
/// readers treat `1.0` as "not an integer".
pub(crate) fn parse_integer<T: FromStr>(text: &str) -> Option<T> {
    text.parse().ok()
}

pub(crate) fn parse_f64(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub(crate) fn parse_f32(text: &str) -> Option<f32> {
    text.parse::<f32>().ok().filter(|value| value.is_finite())
}

/// Reads `text` as an `f64` only when ryu writes that `f64` back as the same
/// text, so handing out the float loses nothing.
pub(crate) fn exact_f64(text: &str) -> Option<f64> {
    let value = parse_f64(text)?;
    let mut buffer = ryu::Buffer::new();
    (buffer.format_finite(value) == text).then_some(value)
}

pub(crate) fn parse_decimal(text: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn integers_format_without_fraction() {
        assert_eq!(integer_text(-42i32), "-42");
        assert_eq!(integer_text(u64::MAX), "18446744073709551615");
    }

    #[rstest::rstest]
    #[case(1.0, "1.0")]
    #[case(0.5, "0.5")]
    #[case(-2.25, "-2.25")]
    fn plain_floats_match_serde_json(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(f64_text(value).as_deref(), Some(expected));
        assert_eq!(serde_json::to_string(&value).unwrap(), expected);
    }

    #[rstest::rstest]
    #[case(1e21, "1e21")]
    #[case(1.5e-9, "1.5e-9")]
    fn large_and_small_floats_use_exponents(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(f64_text(value).as_deref(), Some(expected));
    }

    #[rstest::rstest]
    #[case("1.5", Some(1.5))]
    #[case("1.50", None)]
    #[case("2e3", None)]
    #[case("0.1000000000000000000001", None)]
    fn exact_floats_round_trip_their_text(#[case] text: &str, #[case] expected: Option<f64>) {
        assert_eq!(exact_f64(text), expected);
    }

    #[rstest::rstest]
    fn non_finite_floats_have_no_text() {
        assert_eq!(f64_text(f64::NAN), None);
        assert_eq!(f32_text(f32::INFINITY), None);
    }

    #[rstest::rstest]
    #[case("5", Some(5))]
    #[case("-7", Some(-7))]
    #[case("1.0", None)]
    #[case("1e2", None)]
    #[case("2147483648", None)]
    fn integer_parsing_is_strict(#[case] text: &str, #[case] expected: Option<i32>) {
        assert_eq!(parse_integer::<i32>(text), expected);
    }

    #[rstest::rstest]
    fn unsigned_parsing_rejects_negative() {
        assert_eq!(parse_integer::<u8>("-1"), None);
        assert_eq!(parse_integer::<u8>("255"), Some(255));
        assert_eq!(parse_integer::<u8>("256"), None);
    }

    #[rstest::rstest]
    fn f32_overflow_is_rejected() {
        assert_eq!(parse_f32("1e39"), None);
        assert_eq!(parse_f32("1.5"), Some(1.5));
        assert_eq!(parse_f64("1e308"), Some(1e308));
    }

    #[rstest::rstest]
    fn decimals_keep_precision() {
        let value = parse_decimal("0.1000000000000000000001").unwrap();
        assert_eq!(value.to_string(), "0.1000000000000000000001");
        assert!(parse_decimal("abc").is_none());
    }
}
