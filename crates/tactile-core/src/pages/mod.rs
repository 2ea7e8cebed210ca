//! Demo scenes shipped with the engine
//!
//! Both binaries register these so the simulator and the device show the
//! same screens.

pub mod gallery;
pub mod home;

use alloc::boxed::Box;

pub use gallery::GalleryScene;
pub use home::HomeScene;

use crate::color::Color;
use crate::geometry::Rect;
use crate::scene::{SceneId, SceneManager};

pub const HOME_SCENE: SceneId = 1;
pub const GALLERY_SCENE: SceneId = 2;

/// Custom action codes understood by the demo scenes.
pub const ACTION_INCREMENT: u16 = 1;
pub const ACTION_RESET: u16 = 2;
pub const ACTION_QUIT: u16 = 3;

/// Page header height in pixels
pub const HEADER_HEIGHT_PX: i32 = 36;

/// Standard button height in pixels
pub const BUTTON_HEIGHT_PX: i32 = 40;

/// Gap between stacked controls in pixels
pub const SPACING_PX: i32 = 8;

pub const BACKGROUND: Color = Color::rgb(0x10, 0x14, 0x1c);
pub const HEADER_BACKGROUND: Color = Color::rgb(0x1f, 0x2a, 0x3a);

/// Register every demo scene with `scenes`.
pub fn register_all(scenes: &mut SceneManager) {
    scenes.register(HOME_SCENE, |screen| Box::new(HomeScene::new(screen)));
    scenes.register(GALLERY_SCENE, |screen| Box::new(GalleryScene::new(screen)));
}

/// Header strip at the top of `screen`.
pub fn header_area(screen: Rect) -> Rect {
    Rect::new(screen.left(), screen.top(), screen.right(), screen.top() + HEADER_HEIGHT_PX)
}

/// `index`-th full-width button row below the header.
pub fn button_row(screen: Rect, index: i32) -> Rect {
    let top = screen.top() + HEADER_HEIGHT_PX + SPACING_PX + index * (BUTTON_HEIGHT_PX + SPACING_PX);
    Rect::new(
        screen.left() + SPACING_PX,
        top,
        screen.right() - SPACING_PX,
        top + BUTTON_HEIGHT_PX,
    )
}
