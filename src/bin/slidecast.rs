use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "slidecast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one slide as a PNG.
    Frame(FrameArgs),
    /// Render the promo MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Slide index (0-based).
    #[arg(long, default_value_t = 0)]
    slide: usize,

    /// Entrance progress between 0 and 1.
    #[arg(long, default_value_t = 1.0)]
    progress: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Divide the preset size by this factor.
    #[arg(long, default_value_t = 1)]
    draft: u32,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Divide the preset size by this factor.
    #[arg(long, default_value_t = 1)]
    draft: u32,

    /// Pace frames at wall-clock speed instead of as fast as possible.
    #[arg(long)]
    realtime: bool,

    /// x264 constant rate factor.
    #[arg(long, default_value_t = 20)]
    crf: u8,
}

/// On-disk project: style plus asset paths relative to the project file.
#[derive(serde::Deserialize, Debug)]
#[serde(default, deny_unknown_fields)]
struct ProjectConfig {
    style: slidecast::StyleConfig,
    images: Vec<PathBuf>,
    voice: Option<PathBuf>,
    music: bool,
    font: Option<PathBuf>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            style: slidecast::StyleConfig::default(),
            images: Vec::new(),
            voice: None,
            music: true,
            font: None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn read_project(path: &Path) -> anyhow::Result<ProjectConfig> {
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    let project: ProjectConfig = serde_json::from_reader(BufReader::new(f))
        .map_err(|e| slidecast::SlidecastError::serde(e.to_string()))
        .with_context(|| format!("parse project '{}'", path.display()))?;
    Ok(project)
}

fn read_bytes(root: &Path, rel: &Path) -> anyhow::Result<(String, Vec<u8>)> {
    let path = root.join(rel);
    let bytes = std::fs::read(&path).with_context(|| format!("read '{}'", path.display()))?;
    let name = rel
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((name, bytes))
}

/// Build a workspace holding every asset the project names.
fn load_workspace(
    project: &ProjectConfig,
    root: &Path,
    mut opts: slidecast::SessionOpts,
) -> anyhow::Result<slidecast::Workspace> {
    if let Some(font) = &project.font {
        let (_, bytes) = read_bytes(root, font)?;
        opts.font = Some(Arc::new(bytes));
    }
    let ws = slidecast::Workspace::new(opts);

    for rel in &project.images {
        let (name, bytes) = read_bytes(root, rel)?;
        if ws.add_image(name.clone(), bytes)?.is_none() {
            eprintln!("skipping '{name}': image limit reached");
        }
    }
    if let Some(rel) = &project.voice {
        let (name, bytes) = read_bytes(root, rel)?;
        ws.set_voice(slidecast::VoiceOrigin::Upload { name }, bytes)?;
    }
    ws.set_music_enabled(project.music)?;
    Ok(ws)
}

fn project_root(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let project = read_project(&args.project)?;
    let opts = slidecast::SessionOpts {
        downscale: args.draft,
        ..slidecast::SessionOpts::default()
    };
    let ws = load_workspace(&project, project_root(&args.project), opts)?;
    let frame = ws.preview_frame(&project.style, args.slide, args.progress)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let data = if frame.premultiplied {
        unpremultiply(&frame.data)
    } else {
        frame.data
    };
    image::save_buffer_with_format(
        &args.out,
        &data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    if !slidecast::is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg not found on PATH");
    }
    let project = read_project(&args.project)?;
    let opts = slidecast::SessionOpts {
        downscale: args.draft,
        clock: if args.realtime {
            slidecast::ClockMode::Realtime
        } else {
            slidecast::ClockMode::Offline
        },
        sink: slidecast::FfmpegEncodeOpts {
            crf: args.crf,
            ..slidecast::FfmpegEncodeOpts::default()
        }
        .factory(),
        ..slidecast::SessionOpts::default()
    };
    let ws = load_workspace(&project, project_root(&args.project), opts)?;

    let info = ws.render_blocking(project.style.clone())?;
    let bytes = ws.save_artifact(&args.out)?;
    eprintln!(
        "wrote {} ({} frames, {bytes} bytes, suggested name {})",
        args.out.display(),
        info.stats.frames_total,
        info.download_name
    );
    ws.reset()?;
    Ok(())
}

fn unpremultiply(premul: &[u8]) -> Vec<u8> {
    let mut out = premul.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    out
}
