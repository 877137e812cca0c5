/// Convert degrees Celsius to degrees Fahrenheit.
pub fn convert_c_to_f(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_points() {
        assert_eq!(convert_c_to_f(0.0), 32.0);
        assert_eq!(convert_c_to_f(100.0), 212.0);
        assert_eq!(convert_c_to_f(-40.0), -40.0);
    }

    #[test]
    fn chip_range_maps_to_fahrenheit_range() {
        assert_eq!(convert_c_to_f(1023.75), 1874.75);
        assert_eq!(convert_c_to_f(52.0), 125.6);
    }

    #[test]
    fn matches_formula_for_every_quarter_degree() {
        for count in 0..4096u16 {
            let c = f32::from(count) / 4.0;
            assert_eq!(convert_c_to_f(c), c * 9.0 / 5.0 + 32.0);
        }
    }
}
