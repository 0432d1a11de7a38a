use ccd_rig::animation::{BoneChannel, ClipSource, KeyframeSample};
use ccd_rig::dynamics::SpringPreset;
use ccd_rig::ik::Propagation;
use ccd_rig::math::Transform;
use ccd_rig::render::{screen_to_ndc, Camera, DebugRenderer, GpuContext, OrbitController};
use ccd_rig::sim::{FrameSnapshot, SimulationConfig, SimulationContext, TargetMode};
use ccd_rig::skeleton::Skeleton;
use glam::{Mat4, Quat, Vec2, Vec3};
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// A three-bone tail swinging on a two second loop.
fn demo_clip() -> ccd_rig::Result<ClipSource> {
    let swing = |angle: f32, offset: Vec3| {
        BoneChannel::new(
            vec![KeyframeSample::new(offset, 0.0)],
            vec![
                KeyframeSample::new(Quat::from_rotation_z(-angle), 0.0),
                KeyframeSample::new(Quat::from_rotation_z(angle), 1.0),
                KeyframeSample::new(Quat::from_rotation_z(-angle), 2.0),
            ],
            vec![KeyframeSample::new(Vec3::ONE, 0.0)],
        )
    };

    Ok(ClipSource::new()
        .with_bone("base", None, BoneChannel::constant(Transform::IDENTITY))
        .with_bone("tail.1", Some("base"), swing(0.3, Vec3::new(0.0, 0.0, 0.0))?)
        .with_bone("tail.2", Some("tail.1"), swing(0.4, Vec3::new(0.0, 0.6, 0.0))?)
        .with_bone("tail.3", Some("tail.2"), swing(0.5, Vec3::new(0.0, 0.5, 0.0))?)
        .with_bone("tail.tip", Some("tail.3"), swing(0.0, Vec3::new(0.0, 0.4, 0.0))?))
}

enum UiAction {
    ToggleAnimation,
    ToggleSpring,
    Preset(SpringPreset),
    Propagation(Propagation),
    LockedTail(usize),
}

struct Gpu {
    window: Arc<Window>,
    context: GpuContext,
    renderer: DebugRenderer,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct App {
    gpu: Option<Gpu>,
    sim: SimulationContext,
    frame: FrameSnapshot,
    camera: Camera,
    orbit: OrbitController,
    preset: SpringPreset,
    start: Instant,
    last_frame: Instant,
    cursor: Vec2,
    dragging_target: bool,
    orbiting: bool,
    gui_hovered: bool,
}

impl App {
    fn new(sim: SimulationContext) -> Self {
        let mut camera = Camera::default();
        let orbit = OrbitController::new(Vec3::new(0.3, 0.6, 0.0), 5.0);
        orbit.update_camera(&mut camera);

        Self {
            gpu: None,
            sim,
            frame: FrameSnapshot::default(),
            camera,
            orbit,
            preset: SpringPreset::default(),
            start: Instant::now(),
            last_frame: Instant::now(),
            cursor: Vec2::ZERO,
            dragging_target: false,
            orbiting: false,
            gui_hovered: false,
        }
    }

    fn now(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn std::error::Error>> {
        let attributes = Window::default_attributes()
            .with_title("CCD IK Demo")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let context = pollster::block_on(GpuContext::new(window.clone()))?;
        self.camera.set_aspect(context.aspect_ratio());

        let renderer = DebugRenderer::new(&context);
        let egui_state = egui_winit::State::new(
            egui::Context::default(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(&context.device, context.config.format, None, 1, false);

        self.gpu = Some(Gpu {
            window,
            context,
            renderer,
            egui_state,
            egui_renderer,
        });
        Ok(())
    }

    fn pick_target(&mut self) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        let size = gpu.context.size;
        let ndc = screen_to_ndc(self.cursor, size.width, size.height);
        if let Some(point) = self.camera.screen_to_world_on_plane(ndc, Vec3::Z, 0.0) {
            self.sim.set_target(point);
        }
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::ToggleAnimation => self.sim.toggle_animation(self.now()),
            UiAction::ToggleSpring => self.sim.toggle_spring(),
            UiAction::Preset(preset) => {
                self.preset = preset;
                self.sim.set_spring_preset(preset);
            }
            UiAction::Propagation(propagation) => {
                self.sim.solver_mut().config_mut().propagation = propagation;
            }
            UiAction::LockedTail(locked) => {
                self.sim.solver_mut().config_mut().locked_tail = locked;
            }
        }
    }

    fn redraw(&mut self) {
        let now = self.now();
        let dt = self.last_frame.elapsed().as_secs_f32();
        self.last_frame = Instant::now();

        self.orbit.update();
        self.orbit.update_camera(&mut self.camera);
        self.frame = self.sim.step(now, dt);

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let output = match gpu.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.context.reconfigure();
                return;
            }
            Err(e) => {
                log::error!("surface error: {:?}", e);
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let raw_input = gpu.egui_state.take_egui_input(&gpu.window);
        let egui_ctx = gpu.egui_state.egui_ctx().clone();
        let mut actions = Vec::new();
        let config = *self.sim.solver().config();
        let joint_count = self.frame.joints.len();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            draw_panel(ctx, &self.frame, &config, joint_count, self.preset, &mut actions);
        });
        self.gui_hovered = egui_ctx.is_pointer_over_area();
        gpu.egui_state
            .handle_platform_output(&gpu.window, full_output.platform_output);

        gpu.renderer
            .render(&gpu.context, &view, &self.frame, &self.camera);

        let primitives = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.context.size.width, gpu.context.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };
        for (id, delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.context.device, &gpu.context.queue, *id, delta);
        }
        render_egui(gpu, &view, &primitives, &screen);
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();

        for action in actions {
            self.apply(action);
        }
    }
}

fn render_egui(
    gpu: &mut Gpu,
    view: &wgpu::TextureView,
    primitives: &[egui::ClippedPrimitive],
    screen: &egui_wgpu::ScreenDescriptor,
) {
    let context = &gpu.context;
    let mut encoder = context
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Egui Encoder"),
        });

    gpu.egui_renderer
        .update_buffers(&context.device, &context.queue, &mut encoder, primitives, screen);

    {
        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Egui Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
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
        let mut pass = pass.forget_lifetime();
        gpu.egui_renderer.render(&mut pass, primitives, screen);
    }

    context.queue.submit(std::iter::once(encoder.finish()));
}

fn draw_panel(
    ctx: &egui::Context,
    frame: &FrameSnapshot,
    config: &ccd_rig::ik::SolverConfig,
    joint_count: usize,
    preset: SpringPreset,
    actions: &mut Vec<UiAction>,
) {
    egui::Window::new("CCD Controls")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!("Target mode: {:?}", frame.mode));
            ui.horizontal(|ui| {
                let animating = frame.mode == TargetMode::Animated;
                if ui.selectable_label(animating, "Animate [Space]").clicked() {
                    actions.push(UiAction::ToggleAnimation);
                }
                let springing = frame.mode == TargetMode::Spring;
                if ui.selectable_label(springing, "Spring [Enter]").clicked() {
                    actions.push(UiAction::ToggleSpring);
                }
            });

            ui.separator();
            ui.label("Spring preset:");
            ui.horizontal(|ui| {
                for candidate in SpringPreset::ALL {
                    if ui
                        .selectable_label(preset == candidate, candidate.label())
                        .clicked()
                    {
                        actions.push(UiAction::Preset(candidate));
                    }
                }
            });

            ui.separator();
            ui.label("Solver:");
            ui.horizontal(|ui| {
                for (mode, name) in [
                    (Propagation::UniformDelta, "Uniform delta"),
                    (Propagation::Rigid, "Rigid"),
                ] {
                    if ui.selectable_label(config.propagation == mode, name).clicked() {
                        actions.push(UiAction::Propagation(mode));
                    }
                }
            });
            let mut locked = config.locked_tail;
            let max_locked = joint_count.saturating_sub(1);
            if ui
                .add(egui::Slider::new(&mut locked, 0..=max_locked).text("Locked tail"))
                .changed()
            {
                actions.push(UiAction::LockedTail(locked));
            }

            ui.separator();
            ui.monospace(format!(
                "iterations {:>3}  distance {:.4}  {}",
                frame.solve.iterations,
                frame.solve.final_distance,
                if frame.solve.converged { "converged" } else { "" }
            ));
            ui.monospace(format!(
                "target ({:.2}, {:.2}, {:.2})",
                frame.target.x, frame.target.y, frame.target.z
            ));

            ui.separator();
            ui.small("Left drag: Move target");
            ui.small("Right drag: Orbit camera");
            ui.small("Scroll: Zoom");
        });
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            log::error!("failed to initialise graphics: {}", e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(gpu) = &mut self.gpu {
            if gpu.egui_state.on_window_event(&gpu.window, &event).consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.context.resize(size);
                    self.camera.set_aspect(gpu.context.aspect_ratio());
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    match code {
                        KeyCode::Escape => event_loop.exit(),
                        KeyCode::Space => self.apply(UiAction::ToggleAnimation),
                        KeyCode::Enter | KeyCode::NumpadEnter => {
                            self.apply(UiAction::ToggleSpring)
                        }
                        _ => {}
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                if pressed && self.gui_hovered {
                    return;
                }
                match button {
                    MouseButton::Left => {
                        self.dragging_target = pressed;
                        if pressed {
                            self.pick_target();
                        }
                    }
                    MouseButton::Right => self.orbiting = pressed,
                    _ => {}
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let cursor = Vec2::new(position.x as f32, position.y as f32);
                let delta = cursor - self.cursor;
                self.cursor = cursor;

                if self.dragging_target {
                    self.pick_target();
                } else if self.orbiting {
                    self.orbit.rotate(delta.x, delta.y);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                if !self.gui_hovered {
                    let scroll = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                    };
                    self.orbit.zoom(scroll);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }
    }
}

fn build_simulation() -> ccd_rig::Result<SimulationContext> {
    let skeleton = Skeleton::load(&demo_clip()?)?;
    let config =
        SimulationConfig::default().skeleton_root(Mat4::from_translation(Vec3::new(-1.5, -0.5, 0.0)));
    Ok(SimulationContext::new(config)?.with_skeleton(skeleton))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let sim = match build_simulation() {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("failed to build the scene: {}", e);
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(sim);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop terminated: {}", e);
    }
}
