use core::fmt::Write as _;

use log::{debug, info};

use super::{
    ACTION_INCREMENT, ACTION_QUIT, ACTION_RESET, BACKGROUND, GALLERY_SCENE, HEADER_BACKGROUND, HOME_SCENE,
    button_row, header_area,
};
use crate::color::Color;
use crate::error::Result;
use crate::geometry::Rect;
use crate::input::GfxEvent;
use crate::scene::{
    Action, Button, Control, ControlId, Label, Scene, SceneContext, SceneGraph, SceneId, Style, TextAlign, TextSize,
    Widget,
};

/// Landing screen: a title, a tap counter and navigation buttons.
pub struct HomeScene {
    graph: SceneGraph,
    counter: Option<ControlId>,
    taps: u32,
}

impl HomeScene {
    pub fn new(screen: Rect) -> Self {
        Self {
            graph: SceneGraph::new(screen, BACKGROUND),
            counter: None,
            taps: 0,
        }
    }

    pub fn taps(&self) -> u32 {
        self.taps
    }

    fn show_taps(&mut self) -> Result<()> {
        let Some(counter) = self.counter else {
            return Ok(());
        };
        let mut text = heapless::String::<32>::new();
        write!(text, "Tapped {} times", self.taps).ok();
        self.graph.tree_mut().set_text(counter, &text)
    }
}

impl Scene for HomeScene {
    fn id(&self) -> SceneId {
        HOME_SCENE
    }

    fn init(&mut self, ctx: &mut SceneContext<'_>) -> Result<()> {
        let screen = ctx.screen;
        let root = self.graph.root();

        let header = self.graph.add(
            root,
            Control::panel(header_area(screen)).with_style(Style::new().with_background(HEADER_BACKGROUND)),
        )?;
        self.graph.add(
            header,
            Control::new(
                header_area(screen),
                Widget::Label(Label::new("tactile", TextSize::Large).with_align(TextAlign::Center)),
            ),
        )?;

        self.graph.add(
            root,
            Control::button(
                button_row(screen, 0),
                Button::new("Gallery", Some(Action::SetActiveScene(GALLERY_SCENE))),
            ),
        )?;
        self.graph.add(
            root,
            Control::button(
                button_row(screen, 1),
                Button::new("Count", Some(Action::Custom(ACTION_INCREMENT)))
                    .with_long_press(Action::Custom(ACTION_RESET)),
            ),
        )?;
        self.graph.add(
            root,
            Control::button(button_row(screen, 2), Button::new("Quit", Some(Action::Custom(ACTION_QUIT)))),
        )?;

        // Transparent label: repainting it repaints the root behind it.
        let counter = self.graph.add(
            root,
            Control::new(
                button_row(screen, 3),
                Widget::Label(Label::new("", TextSize::Medium).with_align(TextAlign::Center)),
            )
            .with_style(Style::new().with_foreground(Color::rgb(0xc8, 0xd0, 0xdc))),
        )?;
        self.counter = Some(counter);
        self.show_taps()?;

        info!("Home scene ready with {} assets available", ctx.assets.len());
        Ok(())
    }

    fn deinit(&mut self) {
        self.counter = None;
    }

    fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    fn on_action(&mut self, action: &Action, ctx: &mut SceneContext<'_>) -> Result<bool> {
        match action {
            Action::Custom(ACTION_INCREMENT) => {
                self.taps = self.taps.saturating_add(1);
                self.show_taps()?;
                Ok(true)
            }
            Action::Custom(ACTION_RESET) => {
                debug!("Counter reset after {} taps", self.taps);
                self.taps = 0;
                self.show_taps()?;
                Ok(true)
            }
            Action::Custom(ACTION_QUIT) => {
                ctx.events.publish(GfxEvent::Quit);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
