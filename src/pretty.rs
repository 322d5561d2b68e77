const BYTE_UNITS: &[&str] = &["b", "kb", "mb", "gb", "tb", "pb"];
const UNIT: f64 = 1024.0;

pub fn bytes(num: usize) -> String {
    if num < 1024 {
        return format!("{}{}", num, BYTE_UNITS[0]);
    }

    let mut num = num as f64;
    let mut idx = 0;

    while num >= UNIT && idx < BYTE_UNITS.len() - 1 {
        num /= UNIT;
        idx += 1;
    }

    format!("{:.2}{}", num, BYTE_UNITS[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_bytes() {
        let params: Vec<(usize, &str)> = vec![
            (0, "0b"),
            (1, "1b"),
            (999, "999b"),
            (1678, "1.64kb"),
            (14_368_916, "13.70mb"),
            (1_186_806_872, "1.11gb"),
            (4_819_255_296, "4.49gb"),
        ];

        for (num, expected) in params {
            let actual = bytes(num);
            assert_eq!(
                expected, actual,
                "expected {} should be {}, got {}",
                num, expected, actual
            );
        }
    }
}
