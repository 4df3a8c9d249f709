use std::env;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use log::info;
use pollster::block_on;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{WindowAttributes, WindowId};

use orrery::{Demo, LightRig, MaterialConstants, RenderInitError, Renderer};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    let demo = Demo::new();
    println!(
        "Loaded {} models; the scene emits {} draw calls per frame",
        demo.library().len(),
        demo.redraw().len()
    );

    if options.summary_only {
        run_headless(demo, options.frames)
    } else {
        match run_interactive(demo) {
            Ok(()) => Ok(()),
            Err(err) => {
                if err.downcast_ref::<WindowInitError>().is_some()
                    || err.downcast_ref::<RenderInitError>().is_some()
                {
                    eprintln!(
                        "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                    );
                    run_headless(Demo::new(), options.frames)
                } else {
                    Err(err)
                }
            }
        }
    }
}

/// Steps the animation at a fixed 60 Hz timebase without a GPU and prints
/// the resulting draw list.  The fixed timebase keeps the output
/// reproducible run to run.
fn run_headless(mut demo: Demo, frames: u32) -> Result<()> {
    demo.set_animating(true);
    let mut draws = demo.redraw();
    for k in 0..frames {
        if let Some(frame_draws) = demo.tick(k as f64 / 60.0) {
            draws = frame_draws;
        }
    }

    let sample = demo.sample();
    println!(
        "Stepped {frames} frames: frame={:.0} sway={:.4} drift={:.4}",
        sample.frame, sample.sway, sample.drift
    );
    println!("Draw list at frame {:.0}:", sample.frame);
    for draw in &draws {
        let position = draw.transform.w_axis;
        println!(
            " - {} pos=({:.2}, {:.2}, {:.2}) color=({:.2}, {:.2}, {:.2})",
            demo.library().get(draw.model).name,
            position.x,
            position.y,
            position.z,
            draw.color[0],
            draw.color[1],
            draw.color[2]
        );
    }
    Ok(())
}

fn run_interactive(demo: Demo) -> Result<()> {
    let event_loop = EventLoop::new()
        .map_err(|err| WindowInitError::new("event loop", err))
        .context("no display available")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App {
        demo,
        renderer: None,
        lights: LightRig::default(),
        material: MaterialConstants::default(),
        started: Instant::now(),
        dragging: false,
        cursor: None,
        error: None,
    };
    event_loop.run_app(&mut app).context("event loop failed")?;

    if let Some(err) = app.error {
        return Err(err);
    }
    Ok(())
}

struct App {
    demo: Demo,
    renderer: Option<Renderer>,
    lights: LightRig,
    material: MaterialConstants,
    started: Instant,
    dragging: bool,
    cursor: Option<(f64, f64)>,
    error: Option<anyhow::Error>,
}

impl App {
    fn init_renderer(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title("Orrery")
                    .with_inner_size(LogicalSize::new(1280.0, 720.0)),
            )
            .map_err(|err| WindowInitError::new("window", err))?;
        let renderer = block_on(Renderer::new(Arc::new(window), self.demo.library()))?;
        renderer.update_globals(
            self.demo.camera.projection(renderer.aspect()),
            &self.lights,
            &self.material,
        );
        self.renderer = Some(renderer);
        Ok(())
    }

    fn request_redraw(&self) {
        if let Some(renderer) = &self.renderer {
            renderer.window().request_redraw();
        }
    }

    fn refresh_globals(&self) {
        if let Some(renderer) = &self.renderer {
            renderer.update_globals(
                self.demo.camera.projection(renderer.aspect()),
                &self.lights,
                &self.material,
            );
        }
    }

    fn redraw_frame(&mut self) -> Result<()> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        let now = self.started.elapsed().as_secs_f64();
        let draws = match self.demo.tick(now) {
            Some(draws) => draws,
            // Paused: traverse at the frozen clock so camera moves and
            // resizes still repaint.
            None => self.demo.redraw(),
        };
        let view = self.demo.camera.view_matrix();
        if let Err(err) = renderer.render(view, &draws) {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    let size = renderer.window().inner_size();
                    renderer.resize(size);
                }
                wgpu::SurfaceError::OutOfMemory => {
                    return Err(anyhow!("GPU is out of memory"));
                }
                other => {
                    info!("skipping frame: {other:?}");
                }
            }
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        if let Err(err) = self.init_renderer(event_loop) {
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if window_id != renderer.window_id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                renderer.resize(size);
                self.refresh_globals();
                self.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => {
                    let run = !self.demo.is_animating();
                    self.demo.set_animating(run);
                    self.request_redraw();
                }
                KeyCode::KeyR => {
                    self.demo.reset();
                    self.refresh_globals();
                    self.request_redraw();
                }
                _ => {}
            },
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.dragging {
                    if let Some((last_x, last_y)) = self.cursor {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        self.demo.camera.drag(dx, dy);
                        self.request_redraw();
                    }
                }
                self.cursor = Some((position.x, position.y));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                };
                self.demo.camera.zoom(amount);
                self.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw_frame() {
                    self.error = Some(err);
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // While animating, keep scheduling frames; otherwise redraws only
        // happen in response to input or resizes.
        if self.demo.is_animating() {
            self.request_redraw();
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to initialize {stage}: {source}")]
struct WindowInitError {
    stage: &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl WindowInitError {
    fn new(
        stage: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            stage,
            source: Box::new(source),
        }
    }
}

struct CliOptions {
    summary_only: bool,
    frames: u32,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut summary_only = false;
        let mut frames = 120;
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                "--frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--frames expects a number"))?;
                    frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count: {value}"))?;
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Usage: orrery [--summary-only] [--frames N]"
                    ));
                }
            }
        }
        Ok(Self {
            summary_only,
            frames,
        })
    }
}
