use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use super::*;
use crate::assets::images::MAX_IMAGES;
use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig, SinkFactory};
use crate::foundation::core::FrameIndex;

fn opts(sink: SinkFactory) -> SessionOpts {
    SessionOpts {
        release_delay: Duration::ZERO,
        downscale: 10,
        sink,
        ..SessionOpts::default()
    }
}

fn style(title: &str) -> StyleConfig {
    StyleConfig {
        title: title.to_owned(),
        benefits: "fast\nsimple".to_owned(),
        seconds_per_slide: 1.0,
        ..StyleConfig::default()
    }
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([200, 40, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Writes its output file at `begin`.
struct FileSink {
    path: PathBuf,
}

impl FrameSink for FileSink {
    fn begin(&mut self, _cfg: SinkConfig) -> SlidecastResult<()> {
        std::fs::write(&self.path, b"encoded").unwrap();
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> SlidecastResult<()> {
        Ok(())
    }

    fn end(&mut self) -> SlidecastResult<()> {
        Ok(())
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// File sink factory whose `fail_on`-th call (0-based) fails.
fn file_factory(fail_on: Option<usize>) -> SinkFactory {
    let calls = Arc::new(AtomicUsize::new(0));
    Arc::new(move |path: &Path| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if fail_on == Some(n) {
            return Err(SlidecastError::encoding("encoder unavailable"));
        }
        Ok(Box::new(FileSink {
            path: path.to_path_buf(),
        }) as Box<dyn FrameSink>)
    })
}

/// In-memory sink whose `begin` blocks until the test releases it.
struct GatedSink {
    gate: Arc<Mutex<mpsc::Receiver<()>>>,
}

impl FrameSink for GatedSink {
    fn begin(&mut self, _cfg: SinkConfig) -> SlidecastResult<()> {
        let _ = self.gate.lock().unwrap().recv();
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> SlidecastResult<()> {
        Ok(())
    }

    fn end(&mut self) -> SlidecastResult<()> {
        Ok(())
    }
}

fn wait_for(ws: &Workspace, state: SessionState) {
    for _ in 0..500 {
        if ws.state() == state {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("workspace never reached {state}, stuck at {}", ws.state());
}

#[test]
fn render_publishes_an_artifact() {
    let sink = InMemorySink::new();
    let ws = Workspace::new(opts(sink.factory()));
    assert_eq!(ws.state(), SessionState::Idle);
    assert!(ws.music_enabled());

    let info = ws.render_blocking(style("Acme Rocket")).unwrap();
    assert_eq!(ws.state(), SessionState::Complete);
    assert_eq!(info.download_name, "acme-rocket-promo.mp4");
    assert_eq!(info.stats.frames_total, 69);
    assert!(info.path.is_none());
    assert_eq!(ws.artifact(), Some(info.clone()));
    assert!(ws.registry().is_live(info.id));
    assert_eq!(sink.frame_count(), 69);
}

#[test]
fn invalid_style_is_rejected_without_a_state_change() {
    let ws = Workspace::new(opts(InMemorySink::new().factory()));
    let bad = StyleConfig {
        seconds_per_slide: 0.2,
        ..StyleConfig::default()
    };
    assert!(matches!(
        ws.start_render(bad),
        Err(SlidecastError::Validation(_))
    ));
    assert_eq!(ws.state(), SessionState::Idle);
    assert!(ws.last_error().is_none());
}

#[test]
fn active_render_rejects_a_second_start_and_mutations() {
    let (release, gate) = mpsc::channel::<()>();
    let gate = Arc::new(Mutex::new(gate));
    let factory: SinkFactory = Arc::new(move |_: &Path| {
        Ok(Box::new(GatedSink { gate: gate.clone() }) as Box<dyn FrameSink>)
    });
    let ws = Workspace::new(opts(factory));

    let task = ws.start_render(style("first")).unwrap();
    wait_for(&ws, SessionState::Rendering);

    assert!(matches!(
        ws.start_render(style("second")),
        Err(SlidecastError::ConcurrentRender(_))
    ));
    assert!(matches!(
        ws.add_image("a.png", png_bytes()),
        Err(SlidecastError::Busy(_))
    ));
    assert!(matches!(ws.set_music_enabled(false), Err(SlidecastError::Busy(_))));
    assert!(matches!(ws.reset(), Err(SlidecastError::Busy(_))));
    assert!(!task.is_finished());
    assert_eq!(ws.state(), SessionState::Rendering);

    release.send(()).unwrap();
    let info = task.wait().unwrap();
    assert_eq!(info.download_name, "first-promo.mp4");
    assert_eq!(ws.state(), SessionState::Complete);
}

#[test]
fn new_artifact_replaces_and_releases_the_old_one() {
    let ws = Workspace::new(opts(file_factory(None)));
    let first = ws.render_blocking(style("one")).unwrap();
    let first_path = first.path.clone().unwrap();
    assert!(first_path.is_file());
    assert_eq!(first.byte_len, 7);

    let second = ws.render_blocking(style("two")).unwrap();
    assert_ne!(first.id, second.id);
    assert!(!ws.registry().is_live(first.id));
    assert!(!first_path.exists());
    assert!(second.path.as_deref().unwrap().is_file());

    ws.reset().unwrap();
    assert!(!second.path.unwrap().exists());
}

#[test]
fn failed_render_keeps_the_previous_artifact() {
    let ws = Workspace::new(opts(file_factory(Some(1))));
    let first = ws.render_blocking(style("keep me")).unwrap();

    let err = ws.render_blocking(style("broken")).unwrap_err();
    assert!(matches!(err, SlidecastError::Encoding(_)));
    assert_eq!(ws.state(), SessionState::Failed);
    assert!(ws.last_error().unwrap().contains("encoder unavailable"));
    assert_eq!(ws.artifact(), Some(first.clone()));
    assert!(first.path.as_deref().unwrap().is_file());

    // A failed session does not block the next one.
    ws.render_blocking(style("again")).unwrap();
    assert_eq!(ws.state(), SessionState::Complete);
    assert!(ws.last_error().is_none());
    ws.reset().unwrap();
}

#[test]
fn saved_artifact_outlives_the_workspace_copy() {
    let ws = Workspace::new(opts(file_factory(None)));
    ws.render_blocking(style("save")).unwrap();
    let dest = std::env::temp_dir().join(format!(
        "slidecast_ws_save_{}/out.mp4",
        std::process::id()
    ));
    assert_eq!(ws.save_artifact(&dest).unwrap(), 7);
    ws.reset().unwrap();
    assert!(dest.is_file());
    assert!(matches!(
        ws.save_artifact(&dest),
        Err(SlidecastError::Validation(_))
    ));
    let _ = std::fs::remove_dir_all(dest.parent().unwrap());
}

#[test]
fn in_flight_save_keeps_the_file_while_the_workspace_moves_on() {
    let ws = Workspace::new(opts(file_factory(None)));
    let info = ws.render_blocking(style("busy save")).unwrap();
    let path = info.path.clone().unwrap();

    // What save_artifact holds while copying.
    let in_flight = ws.lock().artifact.clone().unwrap();

    ws.reset().unwrap();
    assert_eq!(ws.state(), SessionState::Idle);
    assert!(ws.artifact().is_none());
    assert!(path.is_file());

    let dest = std::env::temp_dir().join(format!(
        "slidecast_ws_inflight_{}/out.mp4",
        std::process::id()
    ));
    assert_eq!(in_flight.save_to(&dest).unwrap(), 7);
    drop(in_flight);
    assert!(!path.exists());
    assert!(!ws.registry().is_live(info.id));
    let _ = std::fs::remove_dir_all(dest.parent().unwrap());
}

#[test]
fn reset_releases_every_handle() {
    let registry = ResourceRegistry::with_seed(11);
    let ws = Workspace::with_registry(registry.clone(), opts(InMemorySink::new().factory()));
    ws.add_image("a.png", png_bytes()).unwrap().unwrap();
    ws.add_image("b.png", png_bytes()).unwrap().unwrap();
    ws.set_voice(VoiceOrigin::recording(), b"voice".to_vec()).unwrap();
    ws.render_blocking(style("reset")).unwrap();
    assert_eq!(registry.live_count(), 4);

    ws.reset().unwrap();
    assert_eq!(registry.live_count(), 0);
    assert_eq!(ws.state(), SessionState::Idle);
    assert!(ws.artifact().is_none());
    assert!(ws.image_ids().is_empty());
    assert!(ws.voice_id().is_none());
    let (acquired, released) = registry.totals();
    assert_eq!(acquired, released);
}

#[test]
fn replacing_the_voice_revokes_the_old_handle() {
    let ws = Workspace::new(opts(InMemorySink::new().factory()));
    let first = ws
        .set_voice(
            VoiceOrigin::Upload {
                name: "take1.wav".to_owned(),
            },
            b"a".to_vec(),
        )
        .unwrap();
    let second = ws.set_voice(VoiceOrigin::recording(), b"b".to_vec()).unwrap();
    assert!(!ws.registry().is_live(first));
    assert!(ws.registry().is_live(second));
    assert_eq!(ws.voice_id(), Some(second));

    ws.clear_voice().unwrap();
    assert!(!ws.registry().is_live(second));
    assert!(ws.voice_id().is_none());
}

#[test]
fn uploads_past_the_limit_are_ignored() {
    let ws = Workspace::new(opts(InMemorySink::new().factory()));
    for i in 0..MAX_IMAGES {
        assert!(ws.add_image(format!("{i}.png"), png_bytes()).unwrap().is_some());
    }
    assert_eq!(ws.add_image("extra.png", png_bytes()).unwrap(), None);
    assert_eq!(ws.image_ids().len(), MAX_IMAGES);
    assert_eq!(ws.registry().live_count_of(ResourceKind::Image), MAX_IMAGES);
}

#[test]
fn preview_draws_without_touching_the_session() {
    let ws = Workspace::new(opts(InMemorySink::new().factory()));
    ws.add_image("a.png", png_bytes()).unwrap();
    let s = style("preview");

    let start = ws.preview_frame(&s, 0, 0.0).unwrap();
    let settled = ws.preview_frame(&s, 0, 1.0).unwrap();
    assert_eq!((start.width, start.height), (108, 192));
    assert_eq!(settled, ws.preview_frame(&s, 0, 1.0).unwrap());
    assert_eq!(ws.state(), SessionState::Idle);

    assert!(ws.preview_frame(&s, 1, 0.5).is_ok());
    assert!(matches!(
        ws.preview_frame(&s, 2, 0.5),
        Err(SlidecastError::Validation(_))
    ));
}
