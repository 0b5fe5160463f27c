//! # Viewer
//!
//! Native window showing the session's frame buffer.
//!
//! Each repaint drains pending gamepad events, steps the session once, and
//! uploads only the damaged region of the frame buffer to the GPU texture.
//! The window closes when the user closes it, when the quit flag is raised
//! (Ctrl+C), or when the device reader stops sending.
//!
//! With history enabled, a second viewport shows the [`HistoryStrip`] fed by
//! the session's history channel. Closing it hides the strip for the rest of
//! the run; the pad window keeps going.

use std::time::{Duration, Instant};

use eframe::egui;
use egui::{Color32, ColorImage, TextureHandle, TextureOptions, ViewportCommand};
use image::Rgba;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver};
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::error::{PadError, Result};
use crate::history::{HistoryRecord, HistoryStrip};
use crate::input::RawEvent;
use crate::render::{FrameBuffer, Rect};
use crate::session::Session;

/// Seconds between measured fps updates.
const MEASURE_WINDOW: Duration = Duration::from_secs(1);

/// Repaint scheduling plus a once-per-second fps measurement.
#[derive(Debug, Clone)]
pub struct FramePacer {
    period: Duration,
    window_start: Option<Instant>,
    frames_in_window: u32,
    measured: Option<f32>,
}

impl FramePacer {
    /// Creates a pacer for `fps` frames per second (minimum 1).
    #[must_use]
    pub fn new(fps: u32) -> Self {
        Self {
            period: Duration::from_secs(1) / fps.max(1),
            window_start: None,
            frames_in_window: 0,
            measured: None,
        }
    }

    /// Delay until the next frame should run.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Records a frame at `now`.
    ///
    /// Returns the measured rate whenever a measurement window completes.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            self.frames_in_window = 1;
            return None;
        };

        self.frames_in_window += 1;
        let elapsed = now.duration_since(start);
        if elapsed < MEASURE_WINDOW {
            return None;
        }

        // Frames completed inside the window, excluding the one that closed it
        let fps = (self.frames_in_window - 1) as f32 / elapsed.as_secs_f32();
        self.measured = Some(fps);
        self.window_start = Some(now);
        self.frames_in_window = 1;
        Some(fps)
    }

    /// Last completed measurement.
    #[must_use]
    pub fn measured(&self) -> Option<f32> {
        self.measured
    }
}

/// Builds the window title shown for `skin` at the measured rate.
#[must_use]
pub fn window_title(skin: &str, fps: Option<f32>) -> String {
    match fps {
        Some(fps) => format!("padview - {} ({:.0} fps)", skin, fps),
        None => format!("padview - {}", skin),
    }
}

fn texture_options(anti_aliasing: bool) -> TextureOptions {
    if anti_aliasing {
        TextureOptions::LINEAR
    } else {
        TextureOptions::NEAREST
    }
}

/// Copies `rect` of the frame buffer into an egui image.
fn region_image(frame: &FrameBuffer, rect: Rect) -> ColorImage {
    let pixels = crate::render::surface::crop(frame.pixels(), rect);
    ColorImage::from_rgba_unmultiplied(
        [pixels.width() as usize, pixels.height() as usize],
        pixels.as_raw(),
    )
}

/// Text painted over the newest history row while its state is held.
fn counter_text(elapsed_frames: u64) -> Option<String> {
    (elapsed_frames > 0).then(|| elapsed_frames.to_string())
}

/// Paints the held-frame counter in white over the skin background color.
fn paint_counter(painter: &egui::Painter, origin: egui::Pos2, text: String, background: Rgba<u8>) {
    let [r, g, b, _] = background.0;
    let galley = painter.layout_no_wrap(text, egui::FontId::monospace(14.0), Color32::WHITE);
    painter.rect_filled(
        egui::Rect::from_min_size(origin, galley.size()),
        0.0,
        Color32::from_rgb(r, g, b),
    );
    painter.galley(origin, galley, Color32::WHITE);
}

/// The history strip, the channel feeding it, and its texture.
pub struct HistoryView {
    strip: HistoryStrip,
    records: Receiver<HistoryRecord>,
    texture: Option<TextureHandle>,
    open: bool,
}

impl HistoryView {
    #[must_use]
    pub fn new(strip: HistoryStrip, records: Receiver<HistoryRecord>) -> Self {
        Self {
            strip,
            records,
            texture: None,
            open: true,
        }
    }

    /// Applies every queued record without waiting. Returns how many.
    fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(record) = self.records.try_recv() {
            self.strip.record(record);
            applied += 1;
        }
        applied
    }

    fn upload(&mut self, ctx: &egui::Context, options: TextureOptions) {
        let damage = self.strip.flip();
        let canvas = self.strip.canvas();
        match self.texture.as_mut() {
            None => {
                let full = crate::render::surface::image_rect(canvas.pixels());
                self.texture = Some(ctx.load_texture("history", region_image(canvas, full), options));
            }
            Some(texture) => {
                if let Some(rect) = damage {
                    texture.set_partial(
                        [rect.x as usize, rect.y as usize],
                        region_image(canvas, rect),
                        options,
                    );
                }
            }
        }
    }

    fn show(&mut self, ctx: &egui::Context) {
        let Some(texture) = self.texture.clone() else {
            return;
        };
        let counter = counter_text(self.strip.elapsed_frames());
        let background = self.strip.background();
        let size = texture.size_vec2();

        let draw = |ui: &mut egui::Ui| {
            let response = ui.image(egui::load::SizedTexture::from_handle(&texture));
            if let Some(text) = counter.clone() {
                paint_counter(ui.painter(), response.rect.min, text, background);
            }
        };

        let closed = ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("history"),
            egui::ViewportBuilder::default()
                .with_title("padview - history")
                .with_inner_size(size)
                .with_resizable(false),
            |ctx, class| {
                if class == egui::ViewportClass::Embedded {
                    egui::Window::new("History").show(ctx, draw);
                    return false;
                }
                egui::CentralPanel::default()
                    .frame(egui::Frame::NONE)
                    .show(ctx, draw);
                ctx.input(|input| input.viewport().close_requested())
            },
        );

        if closed {
            info!("History window closed");
            self.open = false;
        }
    }

    /// Runs the history part of one frame.
    fn update(&mut self, ctx: &egui::Context, options: TextureOptions) {
        let applied = self.drain();
        if !self.open {
            return;
        }
        if applied > 0 {
            trace!(applied, "history records applied");
        }
        self.upload(ctx, options);
        self.show(ctx);
    }
}

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub skin_name: String,
    pub fps: u32,
    pub anti_aliasing: bool,
}

/// The eframe application.
pub struct PadViewer {
    session: Session,
    events: UnboundedReceiver<RawEvent>,
    quit: watch::Receiver<bool>,
    texture: Option<TextureHandle>,
    texture_options: TextureOptions,
    pacer: FramePacer,
    skin_name: String,
    closing: bool,
    history: Option<HistoryView>,
}

impl PadViewer {
    #[must_use]
    pub fn new(
        session: Session,
        events: UnboundedReceiver<RawEvent>,
        quit: watch::Receiver<bool>,
        history: Option<HistoryView>,
        options: &ViewerOptions,
    ) -> Self {
        Self {
            session,
            events,
            quit,
            texture: None,
            texture_options: texture_options(options.anti_aliasing),
            pacer: FramePacer::new(options.fps),
            skin_name: options.skin_name.clone(),
            closing: false,
            history,
        }
    }

    /// Takes every queued event without waiting.
    ///
    /// The flag is true once the reader has gone away.
    fn drain_events(&mut self) -> (Vec<RawEvent>, bool) {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => return (events, false),
                Err(TryRecvError::Disconnected) => return (events, true),
            }
        }
    }

    fn upload(&mut self, ctx: &egui::Context, damage: Option<Rect>) {
        match self.texture.as_mut() {
            None => {
                let frame = self.session.frame();
                let full = crate::render::surface::image_rect(frame.pixels());
                self.texture = Some(ctx.load_texture(
                    "pad",
                    region_image(frame, full),
                    self.texture_options,
                ));
            }
            Some(texture) => {
                let Some(rect) = damage else {
                    return;
                };
                texture.set_partial(
                    [rect.x as usize, rect.y as usize],
                    region_image(self.session.frame(), rect),
                    self.texture_options,
                );
            }
        }
    }
}

impl eframe::App for PadViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let (events, disconnected) = self.drain_events();
        let damage = self.session.step(events);
        self.upload(ctx, damage);

        if !self.closing && (disconnected || *self.quit.borrow()) {
            info!("Input ended, closing viewer");
            self.closing = true;
            ctx.send_viewport_cmd(ViewportCommand::Close);
        }

        if let Some(fps) = self.pacer.tick(Instant::now()) {
            debug!("Measured {:.1} fps", fps);
            ctx.send_viewport_cmd(ViewportCommand::Title(window_title(
                &self.skin_name,
                Some(fps),
            )));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if let Some(texture) = &self.texture {
                    ui.image(egui::load::SizedTexture::from_handle(texture));
                }
            });

        if let Some(history) = self.history.as_mut() {
            history.update(ctx, self.texture_options);
        }

        ctx.request_repaint_after(self.pacer.period());
    }
}

/// Opens the window and runs until it closes. Blocks the calling thread.
///
/// # Errors
///
/// Returns [`PadError::Display`] if the window cannot be created.
pub fn run(
    session: Session,
    events: UnboundedReceiver<RawEvent>,
    quit: watch::Receiver<bool>,
    history: Option<HistoryView>,
    options: ViewerOptions,
) -> Result<()> {
    let [width, height] = [
        session.frame().pixels().width(),
        session.frame().pixels().height(),
    ];

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(window_title(&options.skin_name, None))
            .with_inner_size([width as f32, height as f32])
            .with_resizable(false),
        ..Default::default()
    };

    info!("Opening {}x{} viewer at {} fps", width, height, options.fps);
    eframe::run_native(
        "padview",
        native_options,
        Box::new(move |_cc| {
            Ok(Box::new(PadViewer::new(session, events, quit, history, &options)))
        }),
    )
    .map_err(|e| PadError::Display(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use crate::render::{Point, Surface};

    // ==================== Pacer Tests ====================

    #[test]
    fn test_pacer_period() {
        assert_eq!(FramePacer::new(50).period(), Duration::from_millis(20));
        assert_eq!(FramePacer::new(1).period(), Duration::from_secs(1));
    }

    #[test]
    fn test_pacer_zero_fps_clamped() {
        assert_eq!(FramePacer::new(0).period(), Duration::from_secs(1));
    }

    #[test]
    fn test_pacer_measures_once_per_window() {
        let mut pacer = FramePacer::new(60);
        let start = Instant::now();

        assert_eq!(pacer.tick(start), None);
        for i in 1..30 {
            assert_eq!(pacer.tick(start + Duration::from_millis(i * 20)), None);
        }
        assert!(pacer.measured().is_none());

        // 30 frames completed in 1 second
        let fps = pacer.tick(start + Duration::from_secs(1)).unwrap();
        assert!((fps - 30.0).abs() < 0.01);
        assert_eq!(pacer.measured(), Some(fps));

        // A new window starts
        assert_eq!(pacer.tick(start + Duration::from_millis(1100)), None);
    }

    // ==================== Helper Tests ====================

    #[test]
    fn test_window_title() {
        assert_eq!(window_title("gamecube", None), "padview - gamecube");
        assert_eq!(
            window_title("gamecube", Some(59.6)),
            "padview - gamecube (60 fps)"
        );
    }

    #[test]
    fn test_texture_filtering() {
        assert_eq!(texture_options(true), TextureOptions::LINEAR);
        assert_eq!(texture_options(false), TextureOptions::NEAREST);
    }

    #[test]
    fn test_counter_text() {
        assert_eq!(counter_text(0), None);
        assert_eq!(counter_text(1), Some("1".to_string()));
        assert_eq!(counter_text(240), Some("240".to_string()));
    }

    // ==================== History View Tests ====================

    fn history_view(capacity: usize) -> (HistoryView, crate::history::HistoryPublisher) {
        let skin = crate::skin::Skin::from_toml(
            r#"
            background = "bg"
            background_color = [0, 0, 0]
            size = [8, 4]
            "#,
        )
        .unwrap();
        let strip = HistoryStrip::with_loader(&skin, 2, |_| {
            Ok(std::sync::Arc::new(RgbaImage::from_pixel(8, 4, Rgba([9, 9, 9, 255]))))
        })
        .unwrap();
        let (publisher, records) = crate::history::channel(capacity);
        (HistoryView::new(strip, records), publisher)
    }

    #[test]
    fn test_history_view_drains_every_record() {
        let (mut view, mut publisher) = history_view(8);
        publisher.publish(HistoryRecord::Changed(crate::input::InputState::new()));
        publisher.publish(HistoryRecord::Unchanged { elapsed_frames: 1 });
        publisher.publish(HistoryRecord::Unchanged { elapsed_frames: 2 });

        assert_eq!(view.drain(), 3);
        assert_eq!(view.strip.entries(), 1);
        assert_eq!(view.strip.elapsed_frames(), 2);
        assert_eq!(view.drain(), 0);
    }

    #[test]
    fn test_region_image_copies_damage() {
        let mut frame = FrameBuffer::new(20, 10);
        let dot = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        frame.blit(&dot, Point::new(4, 5), None);

        let image = region_image(&frame, Rect::new(4, 5, 3, 2));
        assert_eq!(image.size, [3, 2]);
        assert_eq!(image.pixels[0], egui::Color32::from_rgb(10, 20, 30));
    }
}
