use damper_core::{Frame, encode_command, parse_frame};
use damper_traits::Prediction;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case("Time: 12.345 | Raw: X = -0.120, Y = 0.003, Z = 0.998", 12.345, -0.12, 0.003, 0.998)]
#[case("Time: 0.000 | Raw: X = 1, Y = 2, Z = 3", 0.0, 1.0, 2.0, 3.0)]
#[case("boot ok Time: 1.5 | Raw: X = +0.5, Y = -2.25, Z = 0.0", 1.5, 0.5, -2.25, 0.0)]
#[case("Time: 7.1 | Raw: X = 0.1, Y = 0.2, Z = 0.3 ", 7.1, 0.1, 0.2, 0.3)]
#[case("Time: 7.1 | Raw: X = 0.1, Y = 0.2, Z = -0.3\r", 7.1, 0.1, 0.2, -0.3)]
#[case("Time: 7.1 | Raw: X = 0.1, Y = 0.2, Z = 0.3 [ok]", 7.1, 0.1, 0.2, 0.3)]
#[case(
    "Time: 3.2 | Raw: X = 0.1Time: 3.210 | Raw: X = -0.120, Y = 0.003, Z = 0.998",
    3.21,
    -0.12,
    0.003,
    0.998
)]
fn valid_lines_parse_exactly(
    #[case] line: &str,
    #[case] t: f64,
    #[case] x: f64,
    #[case] y: f64,
    #[case] z: f64,
) {
    assert_eq!(
        parse_frame(line),
        Some(Frame {
            device_time_s: t,
            x,
            y,
            z
        })
    );
}

#[rstest]
#[case("")]
#[case("IMU ready")]
#[case("Time: 1.0 | Raw: X = 1, Y = 2")]
#[case("Time: 1.0 | Raw: X = 1, Y = 2, Z = ")]
#[case("Time: 1.0 | Raw: X = a, Y = 2, Z = 3")]
#[case("Time: 1.0 | Raw: X = 1e5, Y = 2, Z = 3")]
#[case("Time: 1.0 | Raw: X = 1, Y = 2, Z = 3.0abc")]
#[case("Time: 1.0 | Raw: X = 1, Y = 2, Z = 0.9981.2")]
#[case("Time: -1.0 | Raw: X = 1, Y = 2, Z = 3")]
#[case("Time: 1.0 | Raw: X = inf, Y = 2, Z = 3")]
#[case("Time: 1.0 | Raw: X = NaN, Y = 2, Z = 3")]
#[case("time: 1.0 | raw: x = 1, y = 2, z = 3")]
fn non_frames_are_rejected(#[case] line: &str) {
    assert_eq!(parse_frame(line), None);
}

#[test]
fn frame_cut_before_z_value_is_rejected() {
    let full = "Time: 3.250 | Raw: X = -0.1204, Y = 0.0031, Z = 0.9987";
    let z_start = full.rfind("Z = ").unwrap() + "Z = ".len();
    for cut in 0..=z_start {
        let head = &full[..cut];
        assert_eq!(parse_frame(head), None, "accepted truncated {head:?}");
    }
    assert!(parse_frame(full).is_some());
}

#[test]
fn commands_are_one_number_per_line() {
    assert_eq!(encode_command(&Prediction::Value(0.25)), "0.25\n");
    assert_eq!(encode_command(&Prediction::Value(-3.0)), "-3\n");
    assert_eq!(encode_command(&Prediction::Class(2)), "2\n");
    assert_eq!(encode_command(&Prediction::default()), "0\n");
}

proptest! {
    #[test]
    fn parser_never_panics(s in ".{0,120}") {
        let _ = parse_frame(&s);
    }

    #[test]
    fn rendered_fields_are_recovered(
        t in 0.0f64..1.0e6,
        x in -1.0e3f64..1.0e3,
        y in -1.0e3f64..1.0e3,
        z in -1.0e3f64..1.0e3,
    ) {
        let line = format!("Time: {t} | Raw: X = {x}, Y = {y}, Z = {z}");
        let f = parse_frame(&line).expect("well-formed frame");
        prop_assert_eq!(f.device_time_s, t);
        prop_assert_eq!(f.x, x);
        prop_assert_eq!(f.y, y);
        prop_assert_eq!(f.z, z);
    }
}
