//! End-to-end baseband checks against known single-target baselines.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::s;
use num_complex::Complex64;
use radar_baseband::antenna::{EnvelopeConfig, RxChannelConfig, TxChannelConfig};
use radar_baseband::waveform::PerPulse;
use radar_baseband::{
    run_simulation, Radar, RadarOptions, Receiver, ReceiverConfig, SimulationOptions, Target,
    Transmitter, TransmitterConfig, WaveformConfig,
};

fn chirp_waveform() -> WaveformConfig {
    WaveformConfig {
        f: vec![24.075e9, 24.175e9],
        t: vec![0.0, 80e-6],
        pulses: 3,
        prp: Some(PerPulse::Scalar(100e-6)),
        f_offset: None,
    }
}

fn transmitter_with(waveform: WaveformConfig, channels: Vec<TxChannelConfig>) -> Transmitter {
    Transmitter::new(TransmitterConfig {
        waveform,
        tx_power: 10.0,
        phase_noise: None,
        channels: (!channels.is_empty()).then_some(channels),
    })
    .unwrap()
}

fn receiver_with(channels: Vec<RxChannelConfig>) -> Receiver {
    Receiver::new(ReceiverConfig {
        fs: 6e4,
        noise_figure: 12.0,
        rf_gain: 20.0,
        load_resistor: 500.0,
        baseband_gain: 30.0,
        bb_type: Default::default(),
        channels: (!channels.is_empty()).then_some(channels),
    })
    .unwrap()
}

fn simple_radar() -> Radar {
    Radar::new(transmitter_with(chirp_waveform(), vec![]), receiver_with(vec![])).unwrap()
}

fn no_noise() -> SimulationOptions<'static> {
    SimulationOptions {
        noise: false,
        interference: None,
    }
}

fn assert_row(actual: ndarray::ArrayView1<Complex64>, expected: &[(f64, f64)]) {
    assert_eq!(actual.len(), expected.len());
    for (got, want) in actual.iter().zip(expected) {
        assert_abs_diff_eq!(got.re, want.0, epsilon = 1e-6);
        assert_abs_diff_eq!(got.im, want.1, epsilon = 1e-6);
    }
}

const ROW_10M: [(f64, f64); 4] = [
    (0.02167872, 0.01755585),
    (-0.02789397, 0.00031774),
    (0.02127319, -0.01804511),
    (-0.00486305, 0.02746863),
];

#[test]
fn single_static_target() {
    let radar = simple_radar();
    let result = run_simulation(&radar, &[Target::point([10.0, 0.0, 0.0], 20.0)], &no_noise());

    assert_eq!(result.baseband.dim(), (1, 3, 4));
    for p in 0..3 {
        assert_row(result.baseband.slice(s![0, p, ..]), &ROW_10M);
    }

    let dt = 1.0 / 6e4;
    for p in 0..3 {
        for k in 0..4 {
            assert_relative_eq!(
                result.timestamp[(0, p, k)],
                p as f64 * 100e-6 + k as f64 * dt,
                epsilon = 1e-12
            );
        }
    }
}

#[test]
fn single_target_with_speed() {
    let radar = simple_radar();
    let targets = [Target::point([10.0, 0.0, 0.0], 20.0).with_speed([-10.0, 0.0, 0.0])];
    let result = run_simulation(&radar, &targets, &no_noise());

    assert_row(
        result.baseband.slice(s![0, 0, ..]),
        &[
            (0.02167872, 0.01755585),
            (-0.02744737, 0.00498684),
            (0.01411165, -0.02406532),
            (0.00905771, 0.02638727),
        ],
    );
    assert_row(
        result.baseband.slice(s![0, 1, ..]),
        &[
            (0.02640989, -0.00900021),
            (-0.01037674, 0.02590099),
            (-0.01289851, -0.02474305),
            (0.02717966, 0.00631729),
        ],
    );
    assert_row(
        result.baseband.slice(s![0, 2, ..]),
        &[
            (0.0064492, -0.02715153),
            (0.01641852, 0.02256727),
            (-0.02782096, -0.0022126),
            (0.01977469, -0.01969556),
        ],
    );
}

#[test]
fn target_phase_negates_the_echo() {
    let radar = simple_radar();
    let targets = [Target::point([10.0, 0.0, 0.0], 20.0).with_phase(180.0)];
    let result = run_simulation(&radar, &targets, &no_noise());
    for p in 0..3 {
        assert_row(
            result.baseband.slice(s![0, p, ..]),
            &[
                (-0.02167872, -0.01755585),
                (0.02789397, -0.00031774),
                (-0.02127319, 0.01804511),
                (0.00486305, -0.02746863),
            ],
        );
    }
}

#[test]
fn two_targets_superpose() {
    let radar = simple_radar();
    let targets = [
        Target::point([10.0, 10.0, 0.0], 20.0),
        Target::point([10.0, -10.0, 0.0], 20.0),
    ];
    let result = run_simulation(&radar, &targets, &no_noise());
    for p in 0..3 {
        assert_row(
            result.baseband.slice(s![0, p, ..]),
            &[
                (-0.02016184, 0.01927887),
                (-0.01555017, 0.0231596),
                (-0.01021256, 0.02595917),
                (-0.00439816, 0.02754689),
            ],
        );
    }
}

#[test]
fn transmit_delay_shifts_echo_and_timestamps() {
    let tx = transmitter_with(
        chirp_waveform(),
        vec![TxChannelConfig {
            delay: 10e-6,
            ..Default::default()
        }],
    );
    let radar = Radar::new(tx, receiver_with(vec![])).unwrap();
    let targets = [Target::point([10.0, 0.0, 0.0], 20.0).with_speed([10.0, 0.0, 0.0])];
    let result = run_simulation(&radar, &targets, &no_noise());

    assert_row(
        result.baseband.slice(s![0, 0, ..]),
        &[
            (0.01979939, 0.01965013),
            (-0.02697143, -0.00711575),
            (0.02691655, -0.00731703),
            (-0.01966141, 0.01978426),
        ],
    );
    assert_row(
        result.baseband.slice(s![0, 1, ..]),
        &[
            (-0.00608537, 0.02721766),
            (-0.00831702, -0.02661969),
            (0.02049118, 0.01891667),
            (-0.02719477, -0.00617424),
        ],
    );
    assert_relative_eq!(result.timestamp[(0, 0, 0)], 10e-6);
    assert_relative_eq!(result.timestamp[(0, 1, 0)], 110e-6);
}

#[test]
fn offset_transmit_channel() {
    let tx = transmitter_with(
        chirp_waveform(),
        vec![TxChannelConfig {
            location: [5.0, 0.0, 0.0],
            ..Default::default()
        }],
    );
    let radar = Radar::new(tx, receiver_with(vec![])).unwrap();
    let result = run_simulation(&radar, &[Target::point([10.0, 0.0, 0.0], 20.0)], &no_noise());
    for p in 0..3 {
        assert_row(
            result.baseband.slice(s![0, p, ..]),
            &[
                (-0.04858788, -0.0274211),
                (-0.03965778, -0.03924231),
                (-0.02793127, -0.04829641),
                (-0.01423527, -0.05394494),
            ],
        );
    }
}

#[test]
fn platform_location_shortens_the_path() {
    let radar = Radar::with_options(
        transmitter_with(chirp_waveform(), vec![]),
        receiver_with(vec![]),
        RadarOptions::default().with_location([5.0, 0.0, 0.0]),
    )
    .unwrap();
    let result = run_simulation(&radar, &[Target::point([10.0, 0.0, 0.0], 20.0)], &no_noise());
    for p in 0..3 {
        assert_row(
            result.baseband.slice(s![0, p, ..]),
            &[
                (0.10501874, 0.03770757),
                (-0.00014794, -0.11158303),
                (-0.10491838, 0.03798591),
                (0.07132042, 0.08581488),
            ],
        );
    }
}

#[test]
fn moving_platform_equals_closing_target() {
    let radar = Radar::with_options(
        transmitter_with(chirp_waveform(), vec![]),
        receiver_with(vec![]),
        RadarOptions::default().with_speed([10.0, 0.0, 0.0]),
    )
    .unwrap();
    let moving_platform = run_simulation(&radar, &[Target::point([10.0, 0.0, 0.0], 20.0)], &no_noise());

    let static_radar = simple_radar();
    let closing = [Target::point([10.0, 0.0, 0.0], 20.0).with_speed([-10.0, 0.0, 0.0])];
    let closing_target = run_simulation(&static_radar, &closing, &no_noise());

    for (a, b) in moving_platform
        .baseband
        .iter()
        .zip(closing_target.baseband.iter())
    {
        assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-9);
        assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-9);
    }
}

#[test]
fn two_frames_with_closing_target() {
    let radar = Radar::with_options(
        transmitter_with(chirp_waveform(), vec![]),
        receiver_with(vec![]),
        RadarOptions::default().with_frame_time(vec![0.0, 1.0]),
    )
    .unwrap();
    let targets = [Target::point([10.0, 0.0, 0.0], 20.0).with_speed([-5.0, 0.0, 0.0])];
    let result = run_simulation(&radar, &targets, &no_noise());

    assert_eq!(result.baseband.dim(), (2, 3, 4));
    assert_row(
        result.baseband.slice(s![0, 0, ..]),
        &[
            (0.02167872, 0.01755585),
            (-0.02776898, 0.00266167),
            (0.01794666, -0.02135753),
            (0.0021659, 0.02781297),
        ],
    );
    assert_row(
        result.baseband.slice(s![1, 0, ..]),
        &[
            (0.10501874, 0.03770757),
            (-0.00952841, -0.11117929),
            (-0.09706953, 0.0550451),
            (0.09053554, 0.06524264),
        ],
    );
    assert_row(
        result.baseband.slice(s![1, 2, ..]),
        &[
            (0.08788114, -0.06883071),
            (-0.09925872, -0.05108129),
            (-0.00491581, 0.11152694),
            (0.10336885, -0.04216794),
        ],
    );

    // the target is 5 m closer in frame 1, two inverse-square paths
    let peak = |frame: usize| {
        result
            .baseband
            .slice(s![frame, 0, ..])
            .iter()
            .map(|z| z.norm())
            .fold(0.0, f64::max)
    };
    assert_relative_eq!(peak(1) / peak(0), 4.0, epsilon = 0.01);

    assert_relative_eq!(result.timestamp[(1, 0, 0)], 1.0);
    assert_relative_eq!(result.timestamp[(1, 0, 1)], 1.0 + 1.0 / 6e4, epsilon = 1e-12);
}

#[test]
fn per_pulse_frequency_offset() {
    let waveform = WaveformConfig {
        f_offset: Some(PerPulse::List(vec![0.0, 1e6, 2e6])),
        ..chirp_waveform()
    };
    let radar = Radar::new(transmitter_with(waveform, vec![]), receiver_with(vec![])).unwrap();
    let result = run_simulation(&radar, &[Target::point([10.0, 0.0, 0.0], 20.0)], &no_noise());

    assert_row(result.baseband.slice(s![0, 0, ..]), &ROW_10M);
    assert_row(
        result.baseband.slice(s![0, 1, ..]),
        &[
            (0.01265615, 0.02485824),
            (-0.02560738, -0.0110622),
            (0.0267748, -0.00782435),
            (-0.01562117, 0.02311037),
        ],
    );
    assert_row(
        result.baseband.slice(s![0, 2, ..]),
        &[
            (0.00144308, 0.02785612),
            (-0.01888737, -0.02052591),
            (0.02764021, 0.00375025),
            (-0.02367378, 0.0147512),
        ],
    );
}

#[test]
fn varying_prp_schedule() {
    let waveform = WaveformConfig {
        prp: Some(PerPulse::List(vec![100e-6, 110e-6, 130e-6])),
        ..chirp_waveform()
    };
    let radar = Radar::new(transmitter_with(waveform, vec![]), receiver_with(vec![])).unwrap();
    let targets = [Target::point([10.0, 0.0, 0.0], 20.0).with_speed([-10.0, 0.0, 0.0])];
    let result = run_simulation(&radar, &targets, &no_noise());

    assert_row(
        result.baseband.slice(s![0, 2, ..]),
        &[
            (3.68112133e-3, -2.76636615e-2),
            (1.86106825e-2, 2.07971934e-2),
            (-2.79027789e-2, 6.06322561e-4),
            (1.76845982e-2, -2.15925827e-2),
        ],
    );
    assert_relative_eq!(result.timestamp[(0, 1, 0)], 100e-6);
    assert_relative_eq!(result.timestamp[(0, 2, 0)], 210e-6);
}

#[test]
fn pulse_modulation_codes() {
    let tx = transmitter_with(
        chirp_waveform(),
        vec![TxChannelConfig {
            pulse_amp: Some(vec![0.0, 1.0, 2.0]),
            pulse_phase: Some(vec![0.0, 180.0, 0.0]),
            ..Default::default()
        }],
    );
    let radar = Radar::new(tx, receiver_with(vec![])).unwrap();
    let result = run_simulation(&radar, &[Target::point([10.0, 0.0, 0.0], 20.0)], &no_noise());

    for z in result.baseband.slice(s![0, 0, ..]).iter() {
        assert_eq!(*z, Complex64::new(0.0, 0.0));
    }
    assert_row(
        result.baseband.slice(s![0, 1, ..]),
        &[
            (-0.02167872, -0.01755585),
            (0.02789397, -0.00031774),
            (-0.02127319, 0.01804511),
            (0.00486305, -0.02746863),
        ],
    );
    assert_row(
        result.baseband.slice(s![0, 2, ..]),
        &[
            (0.04335744, 0.0351117),
            (-0.05578795, 0.00063547),
            (0.04254638, -0.03609022),
            (-0.0097261, 0.05493725),
        ],
    );
}

#[test]
fn waveform_modulation_envelope() {
    let tx = transmitter_with(
        chirp_waveform(),
        vec![TxChannelConfig {
            modulation: Some(EnvelopeConfig {
                t: vec![0.0, 10e-6, 20e-6, 30e-6, 40e-6],
                amp: Some(vec![0.0, 1.0, 0.0, 3.0, 4.0]),
                phase: Some(vec![0.0, 90.0, 180.0, -90.0, -180.0]),
            }),
            ..Default::default()
        }],
    );
    let radar = Radar::new(tx, receiver_with(vec![])).unwrap();
    let result = run_simulation(&radar, &[Target::point([10.0, 0.0, 0.0], 20.0)], &no_noise());

    for p in 0..3 {
        assert_row(
            result.baseband.slice(s![0, p, ..]),
            &[
                (2.16787192e-2, 1.75558522e-2),
                (-3.17739199e-4, -2.78939752e-2),
                (-5.41353471e-2, -6.38195699e-2),
                (1.94522680e-2, -1.09874502e-1),
            ],
        );
    }
}

#[test]
fn azimuth_pattern_weights_the_echo() {
    let pattern_channel = TxChannelConfig {
        azimuth_angles: vec![-46.0, 0.0, 46.0],
        azimuth_pattern: vec![-10.0, -10.0, 10.0],
        ..Default::default()
    };
    let tx = transmitter_with(chirp_waveform(), vec![pattern_channel]);
    let radar = Radar::new(tx, receiver_with(vec![])).unwrap();

    let result = run_simulation(&radar, &[Target::point([10.0, 10.0, 0.0], 20.0)], &no_noise());
    assert_row(
        result.baseband.slice(s![0, 0, ..]),
        &[
            (-3.03223341e-2, 2.89941793e-2),
            (-2.33866600e-2, 3.48305974e-2),
            (-1.53592223e-2, 3.90410127e-2),
            (-6.61476738e-3, 4.14288696e-2),
        ],
    );

    let result = run_simulation(&radar, &[Target::point([10.0, -10.0, 0.0], 20.0)], &no_noise());
    assert_row(
        result.baseband.slice(s![0, 0, ..]),
        &[
            (-3.18787849e-3, 3.04824557e-3),
            (-2.45871014e-3, 3.66184581e-3),
            (-1.61476139e-3, 4.10449948e-3),
            (-6.95430456e-4, 4.35554208e-3),
        ],
    );
}

#[test]
fn elevation_pattern_weights_the_echo() {
    let pattern_channel = TxChannelConfig {
        elevation_angles: vec![-46.0, 0.0, 46.0],
        elevation_pattern: vec![-10.0, 10.0, 10.0],
        ..Default::default()
    };
    let tx = transmitter_with(chirp_waveform(), vec![pattern_channel]);
    let radar = Radar::new(tx, receiver_with(vec![])).unwrap();

    let result = run_simulation(&radar, &[Target::point([10.0, 0.0, 10.0], 20.0)], &no_noise());
    assert_row(
        result.baseband.slice(s![0, 0, ..]),
        &[
            (-1.00809569e-2, 9.63939886e-3),
            (-7.77512415e-3, 1.15797732e-2),
            (-5.10632388e-3, 1.29795670e-2),
            (-2.19914419e-3, 1.37734334e-2),
        ],
    );

    let result = run_simulation(&radar, &[Target::point([10.0, 0.0, -10.0], 20.0)], &no_noise());
    assert_row(
        result.baseband.slice(s![0, 0, ..]),
        &[
            (-1.05984142e-3, 1.01341909e-3),
            (-8.17422265e-4, 1.21741650e-3),
            (-5.36843239e-4, 1.36458105e-3),
            (-2.31202666e-4, 1.44804262e-3),
        ],
    );
}

#[test]
fn arbitrary_waveform_profile() {
    let waveform = WaveformConfig {
        f: vec![24.075e9, 24.175e9, 26e9, 28e9, 26e9],
        t: vec![0.0, 20e-6, 40e-6, 60e-6, 80e-6],
        pulses: 3,
        prp: Some(PerPulse::Scalar(100e-6)),
        f_offset: None,
    };
    let radar = Radar::new(transmitter_with(waveform, vec![]), receiver_with(vec![])).unwrap();
    let result = run_simulation(&radar, &[Target::point([10.0, 0.0, 0.0], 20.0)], &no_noise());

    for p in 0..3 {
        assert_row(
            result.baseband.slice(s![0, p, ..]),
            &[
                (2.09112680e-2, 1.51912953e-2),
                (-1.39324696e-2, -2.17702290e-2),
                (-5.51337195e-4, -2.58409096e-2),
                (2.55635349e-2, 3.81605379e-3),
            ],
        );
    }
}

#[test]
fn mimo_virtual_channels() {
    let tx = transmitter_with(
        chirp_waveform(),
        vec![
            TxChannelConfig {
                location: [0.0, 0.0, 0.0],
                ..Default::default()
            },
            TxChannelConfig {
                location: [0.012, 0.0, 0.0],
                ..Default::default()
            },
        ],
    );
    let rx = receiver_with(vec![
        RxChannelConfig {
            location: [0.0, 0.0, 0.0],
            ..Default::default()
        },
        RxChannelConfig {
            location: [0.006, 0.0, 0.0],
            ..Default::default()
        },
    ]);
    let radar = Radar::new(tx, rx).unwrap();
    let result = run_simulation(&radar, &[Target::point([0.0, 10.0, 0.0], 20.0)], &no_noise());

    assert_eq!(result.baseband.dim(), (4, 3, 4));
    let expected: [[(f64, f64); 2]; 4] = [
        [(2.16787192e-2, 1.75558522e-2), (-2.78939752e-2, 3.17739199e-4)],
        [(2.16627616e-2, 1.75755310e-2), (-2.78942475e-2, 2.92382919e-4)],
        [(2.16147817e-2, 1.76344806e-2), (-2.78949261e-2, 2.16312778e-4)],
        [(2.15987527e-2, 1.76541013e-2), (-2.78951062e-2, 1.90955694e-4)],
    ];
    for (ch, row) in expected.iter().enumerate() {
        assert_row(result.baseband.slice(s![ch, 0, ..2]), &row[..]);
    }
}
