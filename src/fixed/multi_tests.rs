use super::super::types::Q31;
use super::*;
use num_complex::Complex64;
use std::vec;
use std::vec::Vec;

fn reference_dft(x: &[Complex64]) -> Vec<Complex64> {
    let n = x.len();
    (0..n)
        .map(|k| {
            x.iter().enumerate().fold(Complex64::new(0.0, 0.0), |acc, (j, &v)| {
                let angle = -2.0 * PI * ((j * k) % n) as f64 / n as f64;
                acc + v * Complex64::new(libm::cos(angle), libm::sin(angle))
            })
        })
        .collect()
}

fn dist(a: Complex64, b: Complex64) -> f64 {
    libm::hypot(a.re - b.re, a.im - b.im)
}

fn test_signal(n: usize) -> Vec<ComplexQ31> {
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            ComplexQ31::new(
                Q31::from_f64(0.3 * libm::sin(2.0 * PI * 7.0 * t) + 0.2 * libm::cos(2.0 * PI * 2.0 * t)),
                Q31::from_f64(0.25 * libm::sin(2.0 * PI * 3.0 * t + 0.4)),
            )
        })
        .collect()
}

#[test]
fn test_plan_sizes() {
    let plan = FftMultiPlan::new(24).unwrap();
    assert_eq!((plan.num_ffts(), plan.fft_size(), plan.log2n()), (3, 8, 3));
    assert_eq!(FftProcess::size(&plan), 24);

    let plan = FftMultiPlan::new(512).unwrap();
    assert_eq!((plan.num_ffts(), plan.fft_size()), (1, 512));

    assert!(FftMultiPlan::new(3072).is_ok());
    assert_eq!(FftMultiPlan::new(20).unwrap_err(), FftError::UnsupportedSize(20));
    assert_eq!(FftMultiPlan::new(36).unwrap_err(), FftError::UnsupportedSize(36));
    assert_eq!(FftMultiPlan::new(3).unwrap_err(), FftError::UnsupportedSize(3));
    assert_eq!(FftMultiPlan::new(0).unwrap_err(), FftError::UnsupportedSize(0));
    assert_eq!(FftMultiPlan::new(6144).unwrap_err(), FftError::SizeTooLarge(6144));
    assert_eq!(FftMultiPlan::new(2048).unwrap_err(), FftError::SizeTooLarge(2048));
}

#[test]
fn test_dft3_of_impulse() {
    let a = ComplexQ31::from_bits(3 << 20, -(3 << 20));
    let y = dft3([a, ComplexQ31::ZERO, ComplexQ31::ZERO]);
    for v in y {
        assert_eq!(v, ComplexQ31::from_bits(1 << 20, -(1 << 20)));
    }
}

#[test]
fn test_dft3_of_constant() {
    // all energy goes to y0
    let a = ComplexQ31::from_bits(3 << 20, 0);
    let y = dft3([a, a, a]);
    assert!((y[0].re.to_bits() - (3 << 20)).abs() <= 2);
    for v in &y[1..] {
        assert!(v.re.to_bits().abs() <= 2 && v.im.to_bits().abs() <= 2, "{:?}", v);
    }
}

#[test]
fn test_composite_matches_reference_dft() {
    for &n in &[6usize, 12, 48, 96] {
        let plan = FftMultiPlan::new(n).unwrap();
        let signal = test_signal(n);
        let mut input = signal.clone();
        let mut output = vec![ComplexQ31::ZERO; n];
        plan.execute(&mut input, &mut output, false).unwrap();

        let reference: Vec<Complex64> = signal.iter().map(|&c| Complex64::from(c)).collect();
        let expected = reference_dft(&reference);
        for (k, (got, exp)) in output.iter().zip(expected.iter()).enumerate() {
            let d = dist(Complex64::from(*got), *exp / n as f64);
            assert!(d < 1e-7, "n = {}, bin {}: {:?} vs {}", n, k, got, exp / n as f64);
        }
    }
}

#[test]
fn test_composite_tone_lands_in_expected_bin() {
    let n = 96;
    let plan = FftMultiPlan::new(n).unwrap();
    let mut input: Vec<ComplexQ31> = (0..n)
        .map(|i| ComplexQ31::new(Q31::from_f64(0.9 * libm::cos(2.0 * PI * 5.0 * i as f64 / n as f64)), Q31::ZERO))
        .collect();
    let mut output = vec![ComplexQ31::ZERO; n];
    plan.execute(&mut input, &mut output, false).unwrap();

    for (k, x) in output.iter().enumerate() {
        let mag = libm::hypot(x.re.to_f64(), x.im.to_f64());
        if k == 5 || k == n - 5 {
            assert!(libm::fabs(mag - 0.45) < 1e-6, "bin {} = {}", k, mag);
        } else {
            assert!(mag < 1e-7, "bin {} = {}", k, mag);
        }
    }
}

#[test]
fn test_inverse_impulse_gives_constant() {
    let n = 24;
    let plan = FftMultiPlan::new(n).unwrap();
    let mut input = vec![ComplexQ31::ZERO; n];
    input[0] = ComplexQ31::from_bits(536870912, 0);
    let mut output = vec![ComplexQ31::ZERO; n];
    plan.execute(&mut input, &mut output, true).unwrap();

    for x in &output {
        assert!((x.re.to_bits() - 536870912).abs() < 16, "{:?}", x);
        assert!(x.im.to_bits().abs() < 16, "{:?}", x);
    }
}

#[test]
fn test_composite_round_trip() {
    for log2m in 1..=10 {
        let n = 3usize << log2m;
        let m = n / 3;
        let plan = FftMultiPlan::new(n).unwrap();
        let signal = test_signal(n);
        let mut input = signal.clone();
        let mut spectrum = vec![ComplexQ31::ZERO; n];
        let mut output = vec![ComplexQ31::ZERO; n];

        plan.execute(&mut input, &mut spectrum, false).unwrap();
        plan.execute(&mut spectrum, &mut output, true).unwrap();

        let tol = (36.0 * (m * m) as f64 + 64.0) / 2147483648.0;
        for (a, b) in signal.iter().zip(output.iter()) {
            let d = dist(Complex64::from(*a), Complex64::from(*b));
            assert!(d < tol, "n = {}: {:?} vs {:?}", n, a, b);
        }
    }
}

#[test]
fn test_power_of_two_delegates_to_single_plan() {
    let n = 64;
    let multi = FftMultiPlan::new(n).unwrap();
    let single = FftPlan::<ComplexQ31>::new(n).unwrap();
    let signal = test_signal(n);

    let (mut in_a, mut in_b) = (signal.clone(), signal.clone());
    let mut out_a = vec![ComplexQ31::ZERO; n];
    let mut out_b = vec![ComplexQ31::ZERO; n];
    multi.execute(&mut in_a, &mut out_a, false).unwrap();
    single.execute(&mut in_b, &mut out_b, false).unwrap();
    assert_eq!(out_a, out_b);
}

#[test]
fn test_short_buffers_are_rejected() {
    let plan = FftMultiPlan::new(48).unwrap();
    let mut input = vec![ComplexQ31::ZERO; 47];
    let mut output = vec![ComplexQ31::ZERO; 48];
    assert_eq!(plan.execute(&mut input, &mut output, false), Err(FftError::BufferTooSmall));
}
