//! The software rasterizer and the blitter-backed renderer must produce the
//! same pixels for the same draw calls.

use std::rc::Rc;

use embedded_graphics::mono_font::ascii::FONT_6X10;
use tactile_core::cache::AssetCache;
use tactile_core::input::{GestureThresholds, Publisher};
use tactile_core::pages::{GalleryScene, HomeScene};
use tactile_core::pixel_data::{CompressedResource, PixelData};
use tactile_core::render::{MemoryBlitter, Renderer, SoftwareRenderer, SurfaceRenderer, SwapOp};
use tactile_core::scene::{Scene, SceneContext};
use tactile_core::{BlendOp, Color, ColorDepth, Point, Rect, Size};

const SCREEN: Size = Size::new(96, 64);

fn gradient() -> PixelData {
    let colors: Vec<Color> = (0..16u32 * 12)
        .map(|i| Color::rgba((i * 7) as u8, (i * 3) as u8, 200, (i * 11) as u8))
        .collect();
    PixelData::from_colors(1, 16, 12, &colors).unwrap()
}

fn glyph() -> PixelData {
    let bytes = (0..8u32 * 8).map(|i| (i * 4) as u8).collect();
    PixelData::new(2, 8, 8, ColorDepth::Alpha, bytes).unwrap()
}

fn draw_list<R: Renderer>(r: &mut R) {
    r.fill_rect(Rect::new(0, 0, 96, 64), Color::rgb(20, 30, 40));
    r.set_blend_op(BlendOp::SourceAlpha);
    r.fill_rect(Rect::new(10, 10, 50, 40), Color::rgba(255, 0, 0, 128));
    r.set_blend_op(BlendOp::Add);
    r.fill_rect(Rect::new(30, 20, 70, 60), Color::rgba(0, 200, 0, 90));
    r.set_blend_op(BlendOp::SourceAlpha);

    r.draw_rectangle(Rect::new(2, 2, 40, 30), Color::WHITE, false);
    r.draw_line(Point::new(0, 63), Point::new(95, 0), Color::rgba(255, 255, 0, 200));

    r.set_clip(Rect::new(5, 5, 60, 50));
    r.draw_text("Hi there", Point::new(8, 40), &FONT_6X10, Color::WHITE);

    let texture = r
        .create_texture(Rc::new(gradient()))
        .unwrap()
        .with_offset(Point::new(50, 40));
    r.draw_texture(&texture).unwrap();

    let mut tinted = r
        .create_texture(Rc::new(glyph()))
        .unwrap()
        .with_tint(Color::rgb(0, 128, 255))
        .with_offset(Point::new(-3, 50));
    r.draw_texture(&tinted).unwrap();
    tinted.set_source(Rect::new(2, 2, 6, 6));
    tinted.set_blend(BlendOp::Add);
    tinted.set_offset(Point::new(20, 20));
    r.draw_texture(&tinted).unwrap();

    r.reset_clip();
    r.draw_pixel_data(&gradient(), Rect::new(4, 4, 12, 10), Point::new(80, 55), Color::WHITE);
    r.blend_pixel(Point::new(1, 1), Color::rgba(0, 0, 255, 77));
    r.set_pixel(Point::new(95, 63), Color::rgb(1, 2, 3));
}

#[test]
fn test_reused_asset_id_draws_the_new_buffer() {
    let mut software = SoftwareRenderer::new(SCREEN);
    let mut surface = SurfaceRenderer::new(MemoryBlitter::new(SCREEN));
    let red = PixelData::from_colors(1, 4, 4, &[Color::RED; 16]).unwrap();
    let blue = PixelData::from_colors(1, 4, 4, &[Color::BLUE; 16]).unwrap();

    for r in [&mut software as &mut dyn Renderer, &mut surface] {
        r.draw_pixel_data(&red, red.bounds(), Point::zero(), Color::WHITE);
        r.draw_pixel_data(&blue, blue.bounds(), Point::new(4, 4), Color::WHITE);
    }
    assert_eq!(surface.get_pixel(Point::new(4, 4)), Color::BLUE);
    for p in Rect::screen(SCREEN).points() {
        assert_eq!(software.get_pixel(p), surface.get_pixel(p), "back buffer differs at {:?}", p);
    }
}

#[test]
fn test_backends_render_identical_frames() {
    let mut software = SoftwareRenderer::new(SCREEN);
    let mut surface = SurfaceRenderer::new(MemoryBlitter::new(SCREEN));

    draw_list(&mut software);
    draw_list(&mut surface);
    for p in Rect::screen(SCREEN).points() {
        assert_eq!(software.get_pixel(p), surface.get_pixel(p), "back buffer differs at {:?}", p);
    }

    software.swap_buffer(SwapOp::Copy, Color::BLACK).unwrap();
    surface.swap_buffer(SwapOp::Copy, Color::BLACK).unwrap();
    assert_eq!(software.front(), surface.blitter().front());
}

#[test]
fn test_swap_ops_agree() {
    for op in [SwapOp::Clear, SwapOp::Copy, SwapOp::NoClear] {
        let mut software = SoftwareRenderer::new(SCREEN);
        let mut surface = SurfaceRenderer::new(MemoryBlitter::new(SCREEN));
        for r in [&mut software as &mut dyn Renderer, &mut surface] {
            r.fill_rect(Rect::new(0, 0, 10, 10), Color::RED);
            r.swap_buffer(op, Color::BLUE).unwrap();
            r.fill_rect(Rect::new(5, 5, 20, 20), Color::GREEN);
            r.swap_buffer(op, Color::BLUE).unwrap();
        }
        assert_eq!(software.front(), surface.blitter().front(), "{:?}", op);
    }
}

static ART: [u8; 8] = [3, 250, 120, 10, 1, 10, 120, 250];
static TABLE: [CompressedResource; 1] = [CompressedResource {
    id: 7,
    width: 2,
    height: 2,
    depth: ColorDepth::Rgb,
    uncompressed: false,
    data: &ART,
}];

fn render_scene<R: Renderer>(renderer: &mut R, mut scene: Box<dyn Scene>) {
    let mut cache = AssetCache::new();
    let mut ctx = SceneContext {
        cache: &mut cache,
        textures: &mut *renderer,
        screen: Rect::new(0, 0, 320, 240),
        assets: &TABLE,
        thresholds: GestureThresholds::default(),
        events: Publisher::default(),
    };
    scene.init(&mut ctx).unwrap();
    assert!(scene.graph_mut().render(renderer) > 0);
    renderer.swap_buffer(SwapOp::Copy, Color::BLACK).unwrap();
}

#[test]
fn test_demo_scenes_render_identically() {
    let screen = Size::new(320, 240);
    let scenes: [fn(Rect) -> Box<dyn Scene>; 2] = [
        |area| Box::new(HomeScene::new(area)),
        |area| Box::new(GalleryScene::new(area)),
    ];
    for make in scenes {
        let mut software = SoftwareRenderer::new(screen);
        let mut surface = SurfaceRenderer::new(MemoryBlitter::new(screen));
        render_scene(&mut software, make(Rect::screen(screen)));
        render_scene(&mut surface, make(Rect::screen(screen)));
        assert_eq!(software.front(), surface.blitter().front());
    }
}
