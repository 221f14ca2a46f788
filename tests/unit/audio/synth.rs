use super::*;

fn synth() -> MusicSynth {
    MusicSynth::new(8_000).unwrap()
}

#[test]
fn output_length_is_duration_plus_margin() {
    let pcm = synth().render(10.3).unwrap();
    assert_eq!(pcm.channels, 1);
    assert_eq!(pcm.sample_rate, 8_000);
    assert_eq!(pcm.frames(), ((10.3 + MUSIC_TAIL_MARGIN_SECS) * 8_000.0_f64).round() as usize);
}

#[test]
fn chord_root_advances_every_four_beats_and_cycles() {
    let roots = (0..20).map(MusicSynth::root_hz).collect::<Vec<_>>();
    assert_eq!(&roots[0..4], &[220.00; 4]);
    assert_eq!(&roots[4..8], &[174.61; 4]);
    assert_eq!(&roots[8..12], &[130.81; 4]);
    assert_eq!(&roots[12..16], &[196.00; 4]);
    assert_eq!(roots[16], 220.00);
}

#[test]
fn envelope_shape() {
    assert_eq!(MusicSynth::envelope(0.0), 0.0);
    assert!((MusicSynth::envelope(0.025) - 0.5).abs() < 1e-6);
    assert_eq!(MusicSynth::envelope(ATTACK_SECS), 1.0);
    assert_eq!(MusicSynth::envelope(0.2), 1.0);
    assert!((MusicSynth::envelope(0.375) - 0.5).abs() < 1e-6);
    assert!(MusicSynth::envelope(0.4999) < 0.01);
    assert_eq!(MusicSynth::envelope(BEAT_SECS), 0.0);
    assert_eq!(MusicSynth::envelope(-0.1), 0.0);
}

#[test]
fn every_beat_starts_silent_and_stays_in_range() {
    let pcm = synth().render(3.0).unwrap();
    let beat = (BEAT_SECS * 8_000.0) as usize;
    for b in 0..(pcm.frames() / beat) {
        assert_eq!(pcm.interleaved_f32[b * beat], 0.0, "beat {b}");
    }
    assert!(pcm.interleaved_f32.iter().all(|s| s.abs() <= 1.0));
    assert!(pcm.interleaved_f32.iter().any(|s| s.abs() > 0.3));
}

#[test]
fn rendering_is_deterministic() {
    assert_eq!(synth().render(2.0).unwrap(), synth().render(2.0).unwrap());
}

#[test]
fn zero_duration_still_renders_the_margin() {
    let pcm = synth().render(0.0).unwrap();
    assert_eq!(pcm.frames(), 8_000);
    assert_eq!(MusicSynth::beat_count(1.0), 2);
}

#[test]
fn invalid_inputs_are_rejected() {
    assert!(MusicSynth::new(0).is_err());
    assert!(synth().render(f64::NAN).is_err());
    assert!(synth().render(-1.0).is_err());
}
