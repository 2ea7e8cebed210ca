use core::fmt::Write as _;

use log::{info, warn};

use super::{BACKGROUND, BUTTON_HEIGHT_PX, GALLERY_SCENE, HEADER_BACKGROUND, SPACING_PX, header_area};
use crate::error::Result;
use crate::geometry::Rect;
use crate::scene::{Action, Button, Control, Scene, SceneContext, SceneGraph, SceneId, Style, TextSize};

/// Most assets shown at once.
pub const GALLERY_SLOTS: usize = 6;
const COLUMNS: i32 = 3;

/// Grid of the compiled-in assets, each drawn through the texture cache.
pub struct GalleryScene {
    graph: SceneGraph,
    shown: usize,
}

impl GalleryScene {
    pub fn new(screen: Rect) -> Self {
        Self {
            graph: SceneGraph::new(screen, BACKGROUND),
            shown: 0,
        }
    }

    /// Number of assets that decoded and got a tile.
    pub fn shown(&self) -> usize {
        self.shown
    }

    fn tile(grid: Rect, index: usize) -> Rect {
        let rows = GALLERY_SLOTS.div_ceil(COLUMNS as usize) as i32;
        let width = (grid.width() as i32 - SPACING_PX * (COLUMNS + 1)) / COLUMNS;
        let height = (grid.height() as i32 - SPACING_PX * (rows + 1)) / rows;
        let (column, row) = (index as i32 % COLUMNS, index as i32 / COLUMNS);
        let left = grid.left() + SPACING_PX + column * (width + SPACING_PX);
        let top = grid.top() + SPACING_PX + row * (height + SPACING_PX);
        Rect::new(left, top, left + width.max(0), top + height.max(0))
    }
}

impl Scene for GalleryScene {
    fn id(&self) -> SceneId {
        GALLERY_SCENE
    }

    fn init(&mut self, ctx: &mut SceneContext<'_>) -> Result<()> {
        let screen = ctx.screen;
        let root = self.graph.root();
        let header = header_area(screen);

        self.graph.add(
            root,
            Control::panel(header).with_style(Style::new().with_background(HEADER_BACKGROUND)),
        )?;
        let back = Rect::new(header.left(), header.top(), header.left() + 100, header.bottom());
        self.graph.add(root, Control::button(back, Button::new("Back", Some(Action::GoBack)).with_size(TextSize::Small)))?;

        let grid = Rect::new(screen.left(), header.bottom(), screen.right(), screen.bottom() - BUTTON_HEIGHT_PX / 2);
        for (slot, resource) in ctx.assets.iter().take(GALLERY_SLOTS).enumerate() {
            let area = Self::tile(grid, slot);
            let texture = ctx
                .cache
                .make_pixel_data(resource)
                .and_then(|pixels| ctx.cache.make_texture(&mut *ctx.textures, pixels, None).cloned());
            match texture {
                Ok(texture) => {
                    self.graph.add(root, Control::image(area, texture).with_clip(area))?;
                    self.shown += 1;
                }
                Err(e) => {
                    warn!("Asset {} not shown: {}", resource.id, e);
                    let mut text = heapless::String::<32>::new();
                    write!(text, "#{} unavailable", resource.id).ok();
                    self.graph.add(root, Control::label(area, &text, TextSize::Small))?;
                }
            }
        }

        info!("Gallery showing {} of {} assets", self.shown, ctx.assets.len());
        Ok(())
    }

    fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }
}
