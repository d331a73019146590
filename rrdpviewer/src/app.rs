use crossbeam_channel::Receiver;
use egui::{ColorImage, Context, TextureHandle, TextureOptions};
use platform_input::{InputCommand, InputTranslator};
use rdp_common::Debouncer;
use rdp_engine::loopback::{LoopbackBehavior, LoopbackEngine};
use rdp_session::{
    event_channel, ConnectionProfile, SessionController, SessionEvent, SessionState,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Quiet period between the last window resize and the resolution request.
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(200);

pub struct RdpViewerApp {
    session: SessionController,
    event_rx: Receiver<SessionEvent>,
    profile: ConnectionProfile,
    error_message: Option<String>,

    // Desktop presentation
    texture: Option<TextureHandle>,
    texture_dirty: bool,
    desktop_size: (u32, u32),

    // Input
    translator: InputTranslator,
    resize_debounce: Debouncer,

    // Local clipboard bridge
    clipboard: Option<arboard::Clipboard>,
    last_local_clipboard: String,
}

impl RdpViewerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        profile: ConnectionProfile,
        autoconnect: bool,
    ) -> Self {
        // The in-process engine stands in for a network transport.
        let engine = LoopbackEngine::new(LoopbackBehavior::default());
        let (event_tx, event_rx) = event_channel();
        let session = SessionController::new(engine, event_tx);

        let clipboard = match arboard::Clipboard::new() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("clipboard unavailable: {}", e);
                None
            }
        };

        let mut app = Self {
            session,
            event_rx,
            profile,
            error_message: None,
            texture: None,
            texture_dirty: false,
            desktop_size: (0, 0),
            translator: InputTranslator::new(),
            resize_debounce: Debouncer::new(RESIZE_DEBOUNCE),
            clipboard,
            last_local_clipboard: String::new(),
        };
        if autoconnect {
            app.connect();
        }
        app
    }

    fn connect(&mut self) {
        self.error_message = None;
        if let Err(err) = self.session.connect(&self.profile) {
            self.error_message = Some(err.to_string());
        }
    }

    fn process_events(&mut self, ctx: &Context) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                SessionEvent::FrameReady => {
                    self.texture_dirty = true;
                    ctx.request_repaint();
                }
                SessionEvent::Resized => {
                    if let Some(fb) = self.session.framebuffer() {
                        let fb = fb.read();
                        self.desktop_size = (fb.width(), fb.height());
                    }
                    info!(
                        "Desktop resized to {}x{}",
                        self.desktop_size.0, self.desktop_size.1
                    );
                    self.texture = None;
                    self.texture_dirty = true;
                    ctx.request_repaint();
                }
                SessionEvent::ConnectionError => {
                    let detail = self
                        .session
                        .last_error()
                        .map(|err| err.to_string())
                        .unwrap_or_else(|| "connection failed".into());
                    info!("Connection error: {}", detail);
                    self.error_message = Some(detail);
                    ctx.request_repaint();
                }
                SessionEvent::Disconnected => {
                    info!("Disconnected");
                    self.texture = None;
                    ctx.request_repaint();
                }
            }
        }
    }

    /// Re-upload the desktop into the egui texture after a paint cycle.
    fn update_texture(&mut self, ctx: &Context) {
        if !self.texture_dirty {
            return;
        }
        let Some(fb) = self.session.framebuffer() else {
            return;
        };
        let image = {
            let fb = fb.read();
            self.desktop_size = (fb.width(), fb.height());
            bgra_to_color_image(fb.data(), fb.width() as usize, fb.height() as usize)
        };
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture("desktop", image, TextureOptions::NEAREST))
            }
        }
        self.texture_dirty = false;
    }

    /// Move text between the local clipboard and the session.
    fn sync_clipboard(&mut self) {
        if !self.session.is_connected() {
            return;
        }
        let Some(clipboard) = &mut self.clipboard else {
            return;
        };
        if let Some(text) = self.session.received_clipboard_text() {
            debug!("clipboard text received ({} chars)", text.chars().count());
            self.last_local_clipboard = text.clone();
            if let Err(e) = clipboard.set_text(text) {
                warn!("failed to set local clipboard: {}", e);
            }
        }
        if let Ok(text) = clipboard.get_text() {
            if text != self.last_local_clipboard {
                self.last_local_clipboard = text.clone();
                if let Err(e) = self.session.send_clipboard_text(text) {
                    warn!("failed to offer clipboard text: {}", e);
                }
            }
        }
    }

    fn forward_input(&mut self, commands: Vec<InputCommand>) {
        for command in commands {
            let result = match command {
                InputCommand::Keyboard { flags, code } => {
                    self.session.send_keyboard_event(flags, code)
                }
                InputCommand::Mouse { flags, x, y } => self.session.send_mouse_event(flags, x, y),
            };
            if let Err(e) = result {
                warn!("input send failed: {}", e);
            }
        }
    }

    fn render_desktop(&mut self, ui: &mut egui::Ui) {
        let available = ui.available_size();
        let (width, height) = self.desktop_size;

        // Follow the window size, debounced so a drag produces one request.
        if self.profile.dynamic_resolution && width > 0 {
            let want = (available.x as u32, available.y as u32);
            if want != (width, height) && Some(want) != self.translator.pending_resize() {
                self.translator.window_resized(want.0, want.1);
                self.resize_debounce.trigger();
            }
        }

        let Some(texture_id) = self.texture.as_ref().map(|t| t.id()) else {
            ui.centered_and_justified(|ui| {
                ui.spinner();
            });
            return;
        };

        let size = egui::vec2(width as f32, height as f32);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
        ui.painter().image(
            texture_id,
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let origin = rect.min;
        let max_x = width.saturating_sub(1) as f32;
        let max_y = height.saturating_sub(1) as f32;
        self.translator.set_coord_mapper(move |x, y| {
            (
                (x - origin.x).clamp(0.0, max_x) as u16,
                (y - origin.y).clamp(0.0, max_y) as u16,
            )
        });

        if response.hovered() || response.has_focus() {
            let events = ui.input(|i| i.events.clone());
            let mut commands = Vec::new();
            for event in &events {
                commands.extend(self.translator.handle_event(event));
            }
            self.forward_input(commands);
        }
    }

    fn render_connect_dialog(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("Connect to a remote desktop");
            ui.add_space(10.0);

            egui::Grid::new("connect_form").num_columns(2).show(ui, |ui| {
                ui.label("Server:");
                ui.text_edit_singleline(&mut self.profile.hostname);
                ui.end_row();

                ui.label("Username:");
                ui.text_edit_singleline(&mut self.profile.username);
                ui.end_row();

                ui.label("Password:");
                ui.add(egui::TextEdit::singleline(&mut self.profile.password).password(true));
                ui.end_row();
            });

            ui.checkbox(
                &mut self.profile.dynamic_resolution,
                "Resize desktop with window",
            );
            ui.checkbox(&mut self.profile.redirect_clipboard, "Share clipboard");

            ui.add_space(10.0);
            let can_connect = !self.profile.hostname.is_empty();
            if ui
                .add_enabled(can_connect, egui::Button::new("Connect"))
                .clicked()
            {
                self.connect();
            }

            if let Some(err) = &self.error_message {
                ui.add_space(10.0);
                ui.colored_label(egui::Color32::RED, err);
            }
        });
    }

    fn render_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!("Server: {}", self.profile.hostname));
            ui.separator();
            ui.label(format!("{:?}", self.session.state()));
            if self.session.is_connected() {
                ui.separator();
                ui.label(format!(
                    "Size: {}x{}",
                    self.desktop_size.0, self.desktop_size.1
                ));
            }
            if let Some(err) = &self.error_message {
                ui.separator();
                ui.colored_label(egui::Color32::RED, err);
            }
        });
    }
}

impl eframe::App for RdpViewerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.process_events(ctx);
        self.update_texture(ctx);
        self.sync_clipboard();

        // A fired debounce turns the latched window size into one
        // resolution request.
        if self.resize_debounce.poll() {
            if let Some((width, height)) = self.translator.pending_resize() {
                match self.session.request_resolution_change(width, height) {
                    Ok(true) => debug!("requested {}x{}", width, height),
                    Ok(false) => debug!("resolution request suppressed"),
                    Err(e) => warn!("resolution request failed: {}", e),
                }
            }
            self.translator.clear_pending_resize();
        }

        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("Session", |ui| {
                    if ui.button("Disconnect").clicked() {
                        self.session.disconnect();
                        ui.close_menu();
                    }
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.render_status_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.session.state() {
            SessionState::Connected => self.render_desktop(ui),
            SessionState::Connecting | SessionState::Disconnecting => {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            }
            SessionState::Idle | SessionState::Failed => self.render_connect_dialog(ui),
        });

        if self.session.is_connected() || self.resize_debounce.is_pending() {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.session.disconnect();
    }
}

/// Convert the BGRA back-store into the RGBA image egui uploads.
fn bgra_to_color_image(data: &[u8], width: usize, height: usize) -> ColorImage {
    let mut pixels = Vec::with_capacity(width * height);
    for px in data.chunks_exact(4).take(width * height) {
        pixels.push(egui::Color32::from_rgba_unmultiplied(px[2], px[1], px[0], 255));
    }
    ColorImage {
        size: [width, height],
        pixels,
    }
}
