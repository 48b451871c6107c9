//! Main viewer application: wgpu model rendering with egui panels on top.

use crate::clock::FrameClock;
use crate::export::write_export;
use crate::panels::{self, RenderStats, ToolbarState};
use crate::picking;
use crate::viewport::{Viewport, ViewportAction, ViewportEvent, ViewportPhase};
use anyhow::{Context, Result};
use glview_core::{ViewerConfig, ViewerError};
use glview_render::{ModelRenderer, RenderContext, RendererOptions, SCREENSHOT_FILE_NAME};
use glview_session::{FileIntake, PageShell, Toast, Toasts};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Per-notch zoom factor for the mouse wheel
const ZOOM_STEP: f32 = 0.95;

/// Mouse buttons held for orbiting (left) and panning (right)
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct DragButtons {
    orbit: bool,
    pan: bool,
}

impl DragButtons {
    /// Track a button edge. A release always ends the drag, even when egui
    /// took the event; a press only starts one if the viewport received it.
    fn on_button(&mut self, button: MouseButton, state: ElementState, consumed: bool) {
        let held = match button {
            MouseButton::Left => &mut self.orbit,
            MouseButton::Right => &mut self.pan,
            _ => return,
        };
        match state {
            ElementState::Released => *held = false,
            ElementState::Pressed if !consumed => *held = true,
            ElementState::Pressed => {}
        }
    }
}

/// Run the viewer. `initial_file`, if any, goes through the normal upload
/// path once the window is up.
pub fn run(config: ViewerConfig, initial_file: Option<PathBuf>) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(config, initial_file);
    event_loop.run_app(&mut app)?;

    Ok(())
}

/// The main viewer application
pub struct ViewerApp {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_context: Option<RenderContext>,
    renderer: Option<ModelRenderer>,

    // Upload lifecycle
    shell: PageShell,
    intake: FileIntake,
    toasts: Toasts,
    viewport: Viewport,
    pending_drops: Vec<PathBuf>,
    initial_file: Option<PathBuf>,

    // Input state
    drag: DragButtons,
    last_mouse_pos: Option<(f64, f64)>,

    // egui state
    egui_ctx: egui::Context,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,

    render_stats: RenderStats,
    show_stats: bool,
    clock: FrameClock,
}

impl ViewerApp {
    fn new(config: ViewerConfig, initial_file: Option<PathBuf>) -> Self {
        let viewport = Viewport::new(config.auto_rotate_speed);
        let show_stats = config.show_stats;
        Self {
            config,
            window: None,
            render_context: None,
            renderer: None,
            shell: PageShell::default(),
            intake: FileIntake::new(),
            toasts: Toasts::new(),
            viewport,
            pending_drops: Vec::new(),
            initial_file,
            drag: DragButtons::default(),
            last_mouse_pos: None,
            egui_ctx: egui::Context::default(),
            egui_winit: None,
            egui_renderer: None,
            render_stats: RenderStats::new(),
            show_stats,
            clock: FrameClock::new(),
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title("glview")
            .with_inner_size(PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("Failed to create viewer window")?,
        );
        self.window = Some(window.clone());

        let render_context = pollster::block_on(RenderContext::new(window.clone()))
            .context("Failed to initialize viewer render context")?;

        self.viewport.camera.aspect = render_context.aspect_ratio();

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &render_context.device,
            render_context.config.format,
            None,
            1,
            false,
        );

        let renderer =
            ModelRenderer::for_context(&render_context, RendererOptions::from(&self.config));

        self.render_context = Some(render_context);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);

        if let Some(path) = self.initial_file.take() {
            self.intake
                .submit_path(&path, &mut self.shell, &mut self.toasts);
        }

        Ok(())
    }

    /// Drops, decode progress, hover and animation for this frame.
    fn update(&mut self) {
        let dt = self.clock.tick();

        if !self.pending_drops.is_empty() {
            let paths = std::mem::take(&mut self.pending_drops);
            self.intake
                .on_drop(&paths, &mut self.shell, &mut self.toasts);
        }

        let (Some(context), Some(renderer)) = (&self.render_context, &mut self.renderer) else {
            return;
        };

        if self.viewport.sync(&self.shell) {
            renderer.clear_model();
        }

        match self.viewport.poll() {
            Some(ViewportEvent::Decoded(result)) => {
                renderer.load_model(&context.device, &context.queue, &result);
            }
            Some(ViewportEvent::Failed(err)) => self.toasts.push_error(&err),
            None => {}
        }

        let hovered = match (self.last_mouse_pos, renderer.model_bounds()) {
            (Some((x, y)), Some(bounds)) => picking::cursor_over_model(
                (x as f32, y as f32),
                (context.config.width as f32, context.config.height as f32),
                &self.viewport.camera,
                &bounds,
                &renderer.model_matrix(),
            ),
            _ => false,
        };
        self.viewport.set_hovered(hovered);

        self.viewport.update(dt);
        renderer.set_model_rotation(self.viewport.model_rotation());

        self.toasts.prune(Instant::now());
    }

    fn render(&mut self) {
        self.update();

        let Some(context) = &mut self.render_context else {
            return;
        };

        let output = match context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                context.reconfigure();
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.render_stats.record_frame();

        if let (Some(context), Some(renderer)) = (&self.render_context, &mut self.renderer) {
            renderer.render_to(
                &context.device,
                &context.queue,
                &context.depth_view,
                &self.viewport.camera,
                &view,
            );
        }

        let (action, browse) = self.render_egui(&view);

        output.present();

        if browse {
            self.browse();
        }
        if let Some(action) = action {
            self.apply_action(action);
        }
    }

    /// Build and draw the UI. Returns the requested viewport action and
    /// whether the file picker should open.
    fn render_egui(&mut self, target_view: &wgpu::TextureView) -> (Option<ViewportAction>, bool) {
        let Some(window) = self.window.clone() else {
            return (None, false);
        };
        let (Some(context), Some(egui_winit)) = (&self.render_context, &mut self.egui_winit)
        else {
            return (None, false);
        };

        let raw_input = egui_winit.take_egui_input(&window);

        // Borrow disjoint fields for the UI closure
        let phase = self.viewport.phase().clone();
        let active_file = self.shell.active().map(|a| a.file().clone());
        let stats = self.renderer.as_ref().and_then(|r| r.model_stats().copied());
        let toasts = &self.toasts;
        let render_stats = &self.render_stats;
        let show_stats = self.show_stats;
        let drag_over = self.intake.is_drag_over();
        let uploading = self.intake.is_uploading();
        let environment = self.renderer.as_ref().map(|r| r.environment());
        let shadows = self.renderer.as_ref().map(|r| r.shadows_enabled());

        let mut action = None;
        let mut browse = false;
        let mut new_environment = None;
        let mut new_shadows = None;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::SidePanel::left("upload_panel")
                .default_width(300.0)
                .resizable(true)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        browse |= panels::upload_panel(ui, drag_over, uploading);
                        ui.add_space(12.0);

                        match &active_file {
                            Some(file) => panels::model_info_ui(ui, file, stats.as_ref()),
                            None => panels::welcome_card(ui),
                        }
                        ui.add_space(12.0);

                        if let (Some(mut env), Some(mut shadows_on)) = (environment, shadows) {
                            ui.collapsing("Stage", |ui| {
                                egui::ComboBox::from_label("Environment")
                                    .selected_text(env.to_string())
                                    .show_ui(ui, |ui| {
                                        for preset in glview_core::EnvironmentPreset::ALL {
                                            ui.selectable_value(&mut env, preset, preset.name());
                                        }
                                    });
                                ui.checkbox(&mut shadows_on, "Shadows");
                            });
                            if Some(env) != environment {
                                new_environment = Some(env);
                            }
                            if Some(shadows_on) != shadows {
                                new_shadows = Some(shadows_on);
                            }
                        }

                        panels::features_ui(ui);
                        panels::technical_details_ui(ui);
                    });
                });

            egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let toolbar = ToolbarState {
                        has_model: matches!(phase, ViewportPhase::Ready { .. }),
                        has_file: active_file.is_some(),
                    };
                    if let Some(a) = panels::toolbar_ui(ui, toolbar) {
                        action = Some(a);
                    }
                    if show_stats {
                        ui.separator();
                        render_stats.ui(ui);
                    }
                });
            });

            match &phase {
                ViewportPhase::Empty => panels::empty_placeholder(ctx),
                ViewportPhase::Loading { progress, .. } => panels::loading_overlay(ctx, progress),
                ViewportPhase::Ready { .. } => panels::hint_overlay(ctx),
                ViewportPhase::Failed { message, .. } => {
                    if let Some(a) = panels::failed_overlay(ctx, message) {
                        action = Some(a);
                    }
                }
            }

            if drag_over {
                panels::drop_overlay(ctx);
            }

            panels::toasts_ui(ctx, toasts);
        });

        egui_winit.handle_platform_output(&window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [context.config.width, context.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let Some(egui_renderer) = &mut self.egui_renderer else {
            return (action, browse);
        };

        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui Encoder"),
            });

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(&context.device, &context.queue, *id, image_delta);
        }

        egui_renderer.update_buffers(
            &context.device,
            &context.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        context.queue.submit(std::iter::once(encoder.finish()));

        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        if let Some(renderer) = &mut self.renderer {
            if let Some(env) = new_environment {
                log::info!("Environment: {}", env);
                renderer.set_environment(env);
            }
            if let Some(enabled) = new_shadows {
                renderer.set_shadows(enabled);
            }
        }

        (action, browse)
    }

    /// Open the file picker and submit the chosen file.
    fn browse(&mut self) {
        if self.intake.is_uploading() {
            return;
        }
        let picked = rfd::FileDialog::new()
            .set_title("Choose GLB File")
            .add_filter("GLB", &["glb"])
            .pick_file();
        if let Some(path) = picked {
            self.intake
                .submit_path(&path, &mut self.shell, &mut self.toasts);
        }
    }

    fn apply_action(&mut self, action: ViewportAction) {
        log::debug!("Viewport action {:?}", action);
        match action {
            ViewportAction::ResetCamera => self.viewport.reset_camera(),
            ViewportAction::ClearModel => self.shell.reset(),
            ViewportAction::RetryUpload => self.browse(),
            ViewportAction::Screenshot => match self.screenshot() {
                Ok(path) => self.toasts.push(Toast::success(
                    "Screenshot saved",
                    path.display().to_string(),
                )),
                Err(err) => {
                    log::error!("Screenshot failed: {}", err);
                    self.toasts.push_error(&err);
                }
            },
            ViewportAction::DownloadOriginal => {
                let Some(active) = self.shell.active() else {
                    return;
                };
                let file = active.file();
                match write_export(&self.config.export_dir, &file.name, &file.bytes) {
                    Ok(path) => self.toasts.push(Toast::success(
                        "Download complete",
                        path.display().to_string(),
                    )),
                    Err(err) => {
                        log::error!("Download of {} failed: {}", file.name, err);
                        self.toasts.push_error(&err);
                    }
                }
            }
        }
    }

    /// Render the current view offscreen at window size and save it.
    fn screenshot(&mut self) -> glview_core::Result<PathBuf> {
        let (Some(context), Some(renderer)) = (&self.render_context, &mut self.renderer) else {
            return Err(ViewerError::ExportError("renderer not ready".to_string()));
        };
        let frame = renderer
            .capture(
                &context.device,
                &context.queue,
                context.config.width,
                context.config.height,
                &self.viewport.camera,
            )
            .map_err(|e| ViewerError::ExportError(e.to_string()))?;
        let png = frame
            .encode_png()
            .map_err(|e| ViewerError::ExportError(e.to_string()))?;
        write_export(&self.config.export_dir, SCREENSHOT_FILE_NAME, &png)
    }

    fn viewport_height(&self) -> f32 {
        self.render_context
            .as_ref()
            .map(|c| c.config.height as f32)
            .unwrap_or(self.config.window_height as f32)
            .max(1.0)
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.initialize(event_loop) {
                log::error!("Failed to initialize viewer: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // File drags are ours regardless of where egui thinks the pointer is
        match &event {
            WindowEvent::HoveredFile(_) => {
                self.intake.drag_enter();
                return;
            }
            WindowEvent::HoveredFileCancelled => {
                self.intake.drag_leave();
                return;
            }
            WindowEvent::DroppedFile(path) => {
                // Several files dropped at once arrive as separate events
                self.pending_drops.push(path.clone());
                return;
            }
            _ => {}
        }

        let consumed = match (&mut self.egui_winit, &self.window) {
            (Some(egui_winit), Some(window)) => egui_winit.on_window_event(window, &event).consumed,
            _ => false,
        };
        if let WindowEvent::MouseInput { state, button, .. } = &event {
            self.drag.on_button(*button, *state, consumed);
        }
        if consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.viewport.teardown();
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(context) = &mut self.render_context {
                    context.resize(new_size);
                    self.viewport.camera.aspect = context.aspect_ratio();
                }
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if key_event.state == ElementState::Pressed && !key_event.repeat {
                    match key_event.physical_key {
                        PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                        PhysicalKey::Code(KeyCode::KeyR) => {
                            self.apply_action(ViewportAction::ResetCamera)
                        }
                        PhysicalKey::Code(KeyCode::F1) => self.show_stats = !self.show_stats,
                        _ => {}
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let Some((last_x, last_y)) = self.last_mouse_pos {
                    let dx = (position.x - last_x) as f32;
                    let dy = (position.y - last_y) as f32;

                    if self.drag.orbit {
                        self.viewport.camera.rotate(-dx * 0.01, dy * 0.01);
                    }

                    if self.drag.pan {
                        let scale = 2.0 / self.viewport_height();
                        self.viewport.camera.pan(-dx * scale, dy * scale);
                    }
                }
                self.last_mouse_pos = Some((position.x, position.y));
            }

            WindowEvent::CursorLeft { .. } => {
                self.last_mouse_pos = None;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.viewport.camera.zoom_by(ZOOM_STEP.powf(scroll));
            }

            WindowEvent::PinchGesture { delta, .. } => {
                self.viewport.camera.zoom_by(1.0 / (1.0 + delta as f32).max(0.1));
            }

            WindowEvent::RedrawRequested => {
                self.render();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_over_ui_ends_drag() {
        let mut drag = DragButtons::default();
        drag.on_button(MouseButton::Left, ElementState::Pressed, false);
        drag.on_button(MouseButton::Right, ElementState::Pressed, false);
        assert!(drag.orbit && drag.pan);

        // Released over the side panel: egui consumes both
        drag.on_button(MouseButton::Left, ElementState::Released, true);
        drag.on_button(MouseButton::Right, ElementState::Released, true);
        assert_eq!(drag, DragButtons::default());
    }

    #[test]
    fn test_press_on_ui_does_not_start_drag() {
        let mut drag = DragButtons::default();
        drag.on_button(MouseButton::Left, ElementState::Pressed, true);
        assert!(!drag.orbit);
        drag.on_button(MouseButton::Middle, ElementState::Pressed, false);
        assert_eq!(drag, DragButtons::default());
    }
}
