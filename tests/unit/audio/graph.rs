use super::*;

fn constant(sample_rate: u32, channels: u16, secs: f64, v: f32) -> Arc<AudioPcm> {
    let frames = (secs * f64::from(sample_rate)) as usize;
    Arc::new(AudioPcm {
        sample_rate,
        channels,
        interleaved_f32: vec![v; frames * usize::from(channels)],
    })
}

fn graph() -> AudioMixGraph {
    AudioMixGraph::new(1_000, 2).unwrap()
}

#[test]
fn no_sources_is_silence_of_requested_length() {
    let g = graph();
    assert!(g.is_silent());
    let out = g.render(2.0);
    assert_eq!(out.len(), 2_000 * 2);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn buses_apply_fixed_gains() {
    let music_only = graph().with_music(constant(1_000, 1, 1.0, 1.0)).render(1.0);
    assert!((music_only[10] - MUSIC_GAIN).abs() < 1e-6);
    assert!((music_only[11] - MUSIC_GAIN).abs() < 1e-6);

    let voice_only = graph().with_voice(constant(1_000, 2, 1.0, 0.5)).render(1.0);
    assert!((voice_only[10] - 0.5 * VOICE_GAIN).abs() < 1e-6);
}

#[test]
fn buses_sum() {
    let g = graph()
        .with_music(constant(1_000, 1, 1.0, 1.0))
        .with_voice(constant(1_000, 2, 1.0, 0.5));
    assert!(g.has(Bus::Music) && g.has(Bus::Voice));
    let out = g.render(1.0);
    assert!((out[100] - (MUSIC_GAIN + 0.5 * VOICE_GAIN)).abs() < 1e-6);
}

#[test]
fn short_voice_ends_early_without_stretching() {
    let out = graph().with_voice(constant(1_000, 2, 0.5, 1.0)).render(1.0);
    assert!(out[2 * 400] > 0.0);
    assert_eq!(out[2 * 600], 0.0);
    assert_eq!(out.len(), 2_000);
}

#[test]
fn other_source_rates_keep_natural_duration() {
    // 0.5 s at 2 kHz still lasts 0.5 s at a 1 kHz mix rate.
    let out = graph().with_voice(constant(2_000, 1, 0.5, 1.0)).render(1.0);
    assert!(out[2 * 450] > 0.0);
    assert_eq!(out[2 * 550], 0.0);
}

#[test]
fn output_is_clamped() {
    let out = graph().with_voice(constant(1_000, 2, 1.0, 4.0)).render(0.1);
    assert!(out.iter().all(|&s| s <= 1.0));
    assert_eq!(out[0], 1.0);
}

#[test]
fn f32le_file_holds_every_sample() {
    let dir = std::env::temp_dir().join(format!("slidecast_graph_{}", std::process::id()));
    let path = dir.join("mix.f32le");
    graph()
        .with_music(constant(1_000, 1, 1.0, 1.0))
        .render_to_f32le(0.25, &path)
        .unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 250 * 2 * 4);
    let first = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    assert!((first - MUSIC_GAIN).abs() < 1e-6);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn invalid_graph_shapes_are_rejected() {
    assert!(AudioMixGraph::new(0, 2).is_err());
    assert!(AudioMixGraph::new(48_000, 3).is_err());
}

#[test]
fn manifest_shares_bus_sources() {
    let music = constant(1_000, 1, 1.0, 0.25);
    let voice = constant(1_000, 2, 1.0, 0.5);
    let g = graph()
        .with_music(Arc::clone(&music))
        .with_voice(Arc::clone(&voice));
    let manifest = g.manifest(1_000);
    assert_eq!(manifest.segments.len(), 2);
    assert!(Arc::ptr_eq(&manifest.segments[0].source, &music));
    assert!(Arc::ptr_eq(&manifest.segments[1].source, &voice));
}
