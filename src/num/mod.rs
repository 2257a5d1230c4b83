pub(crate) mod number;

pub(crate) use number::{
    exact_f64, f32_text, f64_text, integer_text, parse_decimal, parse_f32, parse_f64,
    parse_integer, RAW_NUMBER_TOKEN,
};
