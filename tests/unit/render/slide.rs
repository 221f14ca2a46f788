use super::*;
use crate::assets::text::{ApproxMeasure, TextLayoutEngine};

const SMALL: Canvas = Canvas {
    width: 120,
    height: 200,
};
const NEUTRAL: [u8; 4] = [0x0f, 0x17, 0x2a, 255];

// Brand equal to the dark neutral makes the backdrop a flat color.
fn flat_style() -> StyleConfig {
    StyleConfig {
        brand_color: "#0f172a".to_owned(),
        ..StyleConfig::default()
    }
}

fn red_image() -> Arc<PreparedImage> {
    Arc::new(PreparedImage {
        width: 2,
        height: 2,
        rgba8_premul: Arc::new([255u8, 0, 0, 255].repeat(4)),
    })
}

fn renderer(style: &StyleConfig, benefits: &str, images: &[Option<Arc<PreparedImage>>]) -> FrameRenderer {
    let deck = SlideDeck::build(benefits, &[]);
    FrameRenderer::new(SMALL, style, &deck, images, None).unwrap()
}

fn near(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b).all(|(&x, y)| x.abs_diff(y) <= 2)
}

fn draw(r: &mut FrameRenderer, s: &mut DrawingSurface, slide: usize, eased: f64) -> crate::render::surface::FrameRGBA {
    r.draw(s, slide, eased).unwrap();
    s.read_frame()
}

#[test]
fn layout_scales_with_height() {
    let portrait = SlideLayout::for_canvas(Canvas {
        width: 1080,
        height: 1920,
    });
    assert_eq!(portrait.title_px, 72.0);
    assert_eq!(portrait.body_px, 56.0);

    let landscape = SlideLayout::for_canvas(Canvas {
        width: 1920,
        height: 1080,
    });
    assert!((landscape.title_px - 40.5).abs() < 1e-4);
    assert!((landscape.card.y0 - 360.0).abs() < 1e-9);
    assert!((landscape.card.y1 - 720.0).abs() < 1e-9);
}

#[test]
fn title_offset_settles_from_sixteen_pixels() {
    let l = SlideLayout::for_canvas(SMALL);
    assert!((l.title_top_at(0.0) - l.title_top_at(1.0) - 16.0).abs() < 1e-9);
    assert!(l.title_top_at(0.5) > l.title_top_at(1.0));
    assert_eq!(l.title_top_at(3.0), l.title_top_at(1.0));
}

#[test]
fn backdrop_runs_from_brand_to_dark_neutral() {
    let style = StyleConfig {
        brand_color: "#ff0000".to_owned(),
        ..StyleConfig::default()
    };
    let mut r = renderer(&style, "one", &[]);
    let mut s = DrawingSurface::acquire(SMALL).unwrap();
    let f = draw(&mut r, &mut s, 0, 1.0);

    assert!(near(f.pixel(0, 0).unwrap(), [255, 0, 0, 255]));
    assert!(near(f.pixel(119, 199).unwrap(), NEUTRAL));
}

#[test]
fn card_lightens_the_middle_third() {
    let mut r = renderer(&flat_style(), "one", &[]);
    let mut s = DrawingSurface::acquire(SMALL).unwrap();
    let f = draw(&mut r, &mut s, 0, 1.0);

    let inside = f.pixel(105, 130).unwrap();
    let outside = f.pixel(105, 150).unwrap();
    assert!(near(outside, NEUTRAL), "{outside:?}");
    assert!(inside[0] > outside[0] + 20, "{inside:?}");
    assert_eq!(inside[3], 255);
}

#[test]
fn cta_pill_is_white_and_sits_below_the_text() {
    let mut r = renderer(&flat_style(), "one\ntwo", &[]);
    let l = *r.layout();
    let pill = r.cta_rect(0).unwrap();
    let text_bottom = l.card.y0 + l.card_inset + l.line_height;
    assert!(pill.y0 >= text_bottom);

    let mut s = DrawingSurface::acquire(SMALL).unwrap();
    let f = draw(&mut r, &mut s, 0, 1.0);
    let c = pill.center();
    let px = f.pixel(c.x as u32, c.y as u32).unwrap();
    assert!(px.iter().all(|&v| v >= 250), "{px:?}");
}

#[test]
fn cta_pill_is_sized_to_label_plus_padding() {
    let r = renderer(&flat_style(), "one", &[]);
    let l = *r.layout();
    let label = ApproxMeasure::default().measure("Try it free", l.cta_px);
    let pill = r.cta_rect(0).unwrap();
    assert!((pill.width() - (f64::from(label) + 2.0 * l.cta_pad_x)).abs() < 1e-3);
}

#[test]
fn slide_image_is_drawn_at_quarter_opacity() {
    let mut r = renderer(&flat_style(), "one\ntwo", &[Some(red_image())]);
    assert!(r.has_image(0));
    assert!(!r.has_image(1));
    let mut s = DrawingSurface::acquire(SMALL).unwrap();

    let with_image = draw(&mut r, &mut s, 0, 1.0).pixel(2, 2).unwrap();
    // 0.25 * 255 + 0.75 * 15 ~= 75
    assert!((65..=85).contains(&with_image[0]), "{with_image:?}");
    assert!(with_image[1] < 23);

    let without = draw(&mut r, &mut s, 1, 1.0).pixel(2, 2).unwrap();
    assert!(near(without, NEUTRAL), "{without:?}");
}

#[test]
fn same_inputs_produce_same_pixels() {
    let mut r = renderer(&flat_style(), "one\ntwo", &[Some(red_image())]);
    let mut s = DrawingSurface::acquire(SMALL).unwrap();

    let a = draw(&mut r, &mut s, 0, 0.3);
    let _ = draw(&mut r, &mut s, 1, 1.0);
    let b = draw(&mut r, &mut s, 0, 0.3);
    assert_eq!(a, b);
}

#[test]
fn long_benefits_wrap_inside_the_card() {
    let text = "Automate the boring parts of onboarding so your whole team can focus on customers";
    let r = renderer(&flat_style(), text, &[]);
    let l = *r.layout();
    let lines = r.lines(0).unwrap();
    assert!(lines.len() > 1);
    for line in lines {
        let w = ApproxMeasure::default().measure(line, l.body_px);
        assert!(w <= l.text_max_width() as f32 || !line.contains(' '), "{line}");
    }
}

#[test]
fn empty_benefits_render_one_empty_line() {
    let mut r = renderer(&flat_style(), "  \n", &[]);
    assert_eq!(r.slide_count(), 1);
    assert_eq!(r.lines(0).unwrap(), [String::new()]);
    let mut s = DrawingSurface::acquire(SMALL).unwrap();
    r.draw(&mut s, 0, 0.0).unwrap();
}

#[test]
fn bad_arguments_are_rejected() {
    let mut r = renderer(&flat_style(), "one", &[]);
    let mut s = DrawingSurface::acquire(SMALL).unwrap();
    assert!(matches!(
        r.draw(&mut s, 1, 1.0),
        Err(SlidecastError::Validation(_))
    ));

    let mut other = DrawingSurface::acquire(Canvas {
        width: 60,
        height: 100,
    })
    .unwrap();
    assert!(matches!(
        r.draw(&mut other, 0, 1.0),
        Err(SlidecastError::Validation(_))
    ));
}

#[test]
fn invalid_brand_color_fails_construction() {
    let style = StyleConfig {
        brand_color: "not-a-color".to_owned(),
        ..StyleConfig::default()
    };
    let deck = SlideDeck::build("one", &[]);
    assert!(FrameRenderer::new(SMALL, &style, &deck, &[], None).is_err());
}

const PREVIEW: Canvas = Canvas {
    width: 360,
    height: 640,
};

fn dejavu() -> Arc<Vec<u8>> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/fonts/DejaVuSans.ttf");
    Arc::new(std::fs::read(path).unwrap())
}

/// Pixels inside the title line box that are clearly lighter than the backdrop.
fn lit_title_pixels(f: &crate::render::surface::FrameRGBA, l: &SlideLayout) -> usize {
    let y0 = l.title_top as u32;
    let y1 = (l.title_top + f64::from(l.title_px) * 1.2) as u32;
    let x0 = l.pad as u32;
    let x1 = f.width - l.pad as u32;
    (y0..y1)
        .flat_map(|y| (x0..x1).map(move |x| (x, y)))
        .filter(|&(x, y)| f.pixel(x, y).is_some_and(|px| px[0] > 128))
        .count()
}

#[test]
fn font_bytes_draw_title_glyphs() {
    let deck = SlideDeck::build("one", &[]);
    let mut with_font =
        FrameRenderer::new(PREVIEW, &flat_style(), &deck, &[], Some(dejavu())).unwrap();
    let mut without = FrameRenderer::new(PREVIEW, &flat_style(), &deck, &[], None).unwrap();
    let l = *with_font.layout();
    let mut s = DrawingSurface::acquire(PREVIEW).unwrap();

    let drawn = draw(&mut with_font, &mut s, 0, 1.0);
    assert!(lit_title_pixels(&drawn, &l) > 20);

    let bare = draw(&mut without, &mut s, 0, 1.0);
    assert_eq!(lit_title_pixels(&bare, &l), 0);
    assert!(near(bare.pixel(l.pad as u32 + 4, l.title_top as u32 + 8).unwrap(), NEUTRAL));
}

#[test]
fn font_wrapped_lines_fit_the_card() {
    let text = "Automate the boring parts of onboarding so your whole team can focus on customers";
    let deck = SlideDeck::build(text, &[]);
    let r = FrameRenderer::new(PREVIEW, &flat_style(), &deck, &[], Some(dejavu())).unwrap();
    let l = *r.layout();
    let lines = r.lines(0).unwrap();
    assert!(lines.len() > 1);

    let mut engine = TextLayoutEngine::new(dejavu()).unwrap();
    for line in lines {
        let w = engine.measure(line, l.body_px);
        assert!(w <= l.text_max_width() as f32 || !line.contains(' '), "{line}: {w}");
    }
    assert_eq!(lines.join(" "), text);
}
