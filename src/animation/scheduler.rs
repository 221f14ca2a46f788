use std::time::{Duration, Instant};

use crate::animation::ease;
use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Target rendering rate.
pub const FPS: u32 = 30;
/// Frames held after the last slide so trailing audio/video is not truncated (0.3 s at 30 fps).
pub const TAIL_FRAMES: u64 = 9;
/// Entrance speed-up: the eased entrance completes at `1 / 1.2` of the slide duration.
pub const ENTRANCE_SPEEDUP: f64 = 1.2;

/// Frame layout of one session: slide frames followed by held tail frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramePlan {
    fps: Fps,
    frames_per_slide: u64,
    slide_count: u64,
    tail_frames: u64,
}

/// Per-frame animation state handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Absolute frame index.
    pub index: FrameIndex,
    /// 0-based slide index.
    pub slide: usize,
    /// Linear position within the slide, `[0, 1)`.
    pub fraction: f64,
    /// Eased entrance value, `[0, 1]`.
    pub eased: f64,
    /// `true` for tail frames: the previous frame is held, nothing is redrawn.
    pub hold: bool,
}

impl FramePlan {
    /// Plan for `slide_count` slides of `seconds_per_slide` each at `fps`.
    pub fn new(seconds_per_slide: f64, slide_count: usize, fps: Fps) -> SlidecastResult<Self> {
        if !seconds_per_slide.is_finite() || seconds_per_slide <= 0.0 {
            return Err(SlidecastError::validation(
                "seconds_per_slide must be finite and > 0",
            ));
        }
        if slide_count == 0 {
            return Err(SlidecastError::validation("frame plan needs at least one slide"));
        }
        Ok(Self {
            fps,
            frames_per_slide: fps.secs_to_frames_round(seconds_per_slide).max(1),
            slide_count: slide_count as u64,
            tail_frames: TAIL_FRAMES,
        })
    }

    /// Frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// `round(seconds_per_slide * fps)`, at least one.
    pub fn frames_per_slide(&self) -> u64 {
        self.frames_per_slide
    }

    /// Frames that invoke the renderer.
    pub fn slide_frames(&self) -> u64 {
        self.frames_per_slide * self.slide_count
    }

    /// `frames_per_slide * slide_count + tail_frames`.
    pub fn total_frames(&self) -> u64 {
        self.slide_frames() + self.tail_frames
    }

    /// Whole session as a frame range starting at 0.
    pub fn range(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(self.total_frames()),
        }
    }

    /// Session duration in seconds, tail included.
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.total_frames())
    }

    /// Animation state for frame `idx`. Indices past the slides map to held tail frames.
    pub fn tick(&self, idx: FrameIndex) -> FrameTick {
        let n = idx.0;
        if n >= self.slide_frames() {
            return FrameTick {
                index: idx,
                slide: (self.slide_count - 1) as usize,
                fraction: 1.0,
                eased: 1.0,
                hold: true,
            };
        }

        let slide = n / self.frames_per_slide;
        let fraction = (n % self.frames_per_slide) as f64 / self.frames_per_slide as f64;
        FrameTick {
            index: idx,
            slide: slide as usize,
            fraction,
            eased: entrance_eased(fraction),
            hold: false,
        }
    }
}

/// `out_cubic(min(1, fraction * ENTRANCE_SPEEDUP))`.
pub fn entrance_eased(fraction: f64) -> f64 {
    ease::out_cubic((fraction * ENTRANCE_SPEEDUP).min(1.0))
}

/// Whether a tick fired at its scheduled time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickTiming {
    /// On or ahead of schedule.
    OnTime,
    /// Behind schedule. The frame is still produced exactly once.
    Late,
}

/// Source of rendering-clock ticks.
pub trait FrameClock: Send {
    /// Called once before the first tick.
    fn start(&mut self);
    /// Block until frame `idx` is due.
    fn wait_for(&mut self, idx: FrameIndex) -> TickTiming;
}

/// Paces ticks against the wall clock at the plan's frame rate.
#[derive(Debug)]
pub struct RealtimeClock {
    frame: Duration,
    origin: Option<Instant>,
}

impl RealtimeClock {
    /// Clock ticking at `fps`.
    pub fn new(fps: Fps) -> Self {
        Self {
            frame: Duration::from_secs_f64(fps.frame_duration_secs()),
            origin: None,
        }
    }
}

impl FrameClock for RealtimeClock {
    fn start(&mut self) {
        self.origin = Some(Instant::now());
    }

    fn wait_for(&mut self, idx: FrameIndex) -> TickTiming {
        let origin = *self.origin.get_or_insert_with(Instant::now);
        let due = origin + self.frame.saturating_mul(idx.0.min(u64::from(u32::MAX)) as u32);
        let now = Instant::now();
        if now > due + self.frame {
            return TickTiming::Late;
        }
        if due > now {
            std::thread::sleep(due - now);
        }
        TickTiming::OnTime
    }
}

/// Ticks immediately; the encoder's backpressure is the only pacing.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineClock;

impl FrameClock for OfflineClock {
    fn start(&mut self) {}

    fn wait_for(&mut self, _idx: FrameIndex) -> TickTiming {
        TickTiming::OnTime
    }
}

/// Clock selection for a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    /// One tick per 1/30 s of wall time.
    Realtime,
    /// As fast as the capture stream accepts frames.
    #[default]
    Offline,
}

impl ClockMode {
    /// Build the clock for this mode.
    pub fn clock(self, fps: Fps) -> Box<dyn FrameClock> {
        match self {
            Self::Realtime => Box::new(RealtimeClock::new(fps)),
            Self::Offline => Box::new(OfflineClock),
        }
    }
}

/// Counters reported by [`run_schedule`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    /// Ticks driven, tail included.
    pub ticks: u64,
    /// Ticks that invoked the renderer.
    pub drawn: u64,
    /// Tail ticks that held the previous frame.
    pub held: u64,
    /// Ticks that fired behind schedule.
    pub late: u64,
}

/// Drive exactly `plan.total_frames()` ticks in increasing order.
///
/// `on_tick` runs once per tick; it is the only code touching the drawing surface and it is never
/// re-entered. A late tick is counted and still delivered once.
pub fn run_schedule(
    plan: &FramePlan,
    clock: &mut dyn FrameClock,
    mut on_tick: impl FnMut(&FrameTick) -> SlidecastResult<()>,
) -> SlidecastResult<ScheduleStats> {
    let mut stats = ScheduleStats::default();
    let range = plan.range();
    clock.start();
    for n in range.start.0..range.end.0 {
        let idx = FrameIndex(n);
        if clock.wait_for(idx) == TickTiming::Late {
            stats.late += 1;
        }
        let tick = plan.tick(idx);
        on_tick(&tick)?;
        stats.ticks += 1;
        if tick.hold {
            stats.held += 1;
        } else {
            stats.drawn += 1;
        }
    }
    if stats.late > 0 {
        tracing::warn!(late = stats.late, "render clock fell behind schedule");
    }
    Ok(stats)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/scheduler.rs"]
mod tests;
