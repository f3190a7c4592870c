//! Direct-path leakage from a second radar facing the receiver.

use approx::assert_abs_diff_eq;
use num_complex::Complex64;
use radar_baseband::waveform::PerPulse;
use radar_baseband::{
    run_simulation, Radar, RadarOptions, Receiver, ReceiverConfig, SimulationOptions, Target,
    Transmitter, TransmitterConfig, WaveformConfig,
};

fn receiver() -> Receiver {
    Receiver::new(ReceiverConfig {
        fs: 6e5,
        noise_figure: 12.0,
        rf_gain: 20.0,
        load_resistor: 500.0,
        baseband_gain: 30.0,
        bb_type: Default::default(),
        channels: None,
    })
    .unwrap()
}

fn transmitter(f: Vec<f64>, pulses: usize) -> Transmitter {
    Transmitter::new(TransmitterConfig {
        waveform: WaveformConfig {
            f,
            t: vec![0.0, 80e-6],
            pulses,
            prp: Some(PerPulse::Scalar(100e-6)),
            f_offset: None,
        },
        tx_power: 10.0,
        phase_noise: None,
        channels: None,
    })
    .unwrap()
}

#[test]
fn opposing_chirp_leaks_at_the_crossing_sample() {
    let radar = Radar::new(transmitter(vec![24.075e9, 24.175e9], 1), receiver()).unwrap();
    // a down-chirp radar 20 m ahead, facing back at the receiver
    let interferer = Radar::with_options(
        transmitter(vec![24.175e9, 24.075e9], 3),
        receiver(),
        RadarOptions::default()
            .with_location([20.0, 0.0, 0.0])
            .with_rotation([180.0, 0.0, 0.0]),
    )
    .unwrap();

    let options = SimulationOptions {
        noise: false,
        interference: Some(&interferer),
    };
    let result = run_simulation(&radar, &[Target::point([10.0, 0.0, 0.0], 20.0)], &options);

    let cube = result.interference.expect("interference cube requested");
    assert_eq!(cube.dim(), (1, 1, 48));

    // the two chirps sweep through each other once; only the sample where
    // their beat falls inside the receiver band survives
    for (k, z) in cube.iter().enumerate() {
        if k == 24 {
            assert_abs_diff_eq!(z.re, -0.01325275, epsilon = 1e-6);
            assert_abs_diff_eq!(z.im, 0.00434838, epsilon = 1e-6);
        } else {
            assert_eq!(*z, Complex64::new(0.0, 0.0));
        }
    }

    // the target echo itself is untouched by the interference output
    assert!(result.baseband.iter().any(|z| z.norm() > 1e-3));
}

#[test]
fn identical_chirps_leak_everywhere_in_band() {
    let radar = Radar::new(transmitter(vec![24.075e9, 24.175e9], 1), receiver()).unwrap();
    let interferer = Radar::with_options(
        transmitter(vec![24.075e9, 24.175e9], 1),
        receiver(),
        RadarOptions::default().with_location([20.0, 0.0, 0.0]),
    )
    .unwrap();

    let options = SimulationOptions {
        noise: false,
        interference: Some(&interferer),
    };
    let result = run_simulation(&radar, &[], &options);
    let cube = result.interference.unwrap();

    // an aligned chirp beats at the propagation delay only, well inside the
    // band; the very first sample precedes the interferer's first emission
    let nonzero = cube.iter().filter(|z| z.norm() > 0.0).count();
    assert_eq!(nonzero, cube.len() - 1);
    assert_eq!(cube[(0, 0, 0)], Complex64::new(0.0, 0.0));
}

#[test]
fn silent_interferer_produces_an_empty_cube() {
    let radar = Radar::new(transmitter(vec![24.075e9, 24.175e9], 1), receiver()).unwrap();
    // the interferer pulses are all over before the primary samples begin
    let interferer = Radar::with_options(
        transmitter(vec![24.175e9, 24.075e9], 1),
        receiver(),
        RadarOptions::default().with_location([1e7, 0.0, 0.0]),
    )
    .unwrap();

    let options = SimulationOptions {
        noise: false,
        interference: Some(&interferer),
    };
    let result = run_simulation(&radar, &[], &options);
    let cube = result.interference.unwrap();
    for z in cube.iter() {
        assert_eq!(*z, Complex64::new(0.0, 0.0));
    }
}
