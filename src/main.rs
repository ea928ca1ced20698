#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = desktop::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

/// Native window, headless fallback and CLI glue.
#[cfg(not(target_arch = "wasm32"))]
mod desktop {
    use std::any::Any;
    use std::fmt;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use glam::Vec2;
    use log::info;
    use pollster::block_on;
    use winit::application::ApplicationHandler;
    use winit::dpi::LogicalSize;
    use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
    use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
    use winit::keyboard::Key;
    use winit::window::{Window, WindowId};

    use glowcube::config::{WINDOW_SIZE, WINDOW_TITLE};
    use glowcube::loader::now_ms;
    use glowcube::{print_final_state, AppState, CliOptions, DragMode, FontLoad, Renderer};

    pub fn run() -> Result<()> {
        let options = CliOptions::parse()?;
        if options.summary_only {
            return run_headless(&options);
        }
        match run_interactive(&options) {
            Ok(()) => Ok(()),
            Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                run_headless(&options)
            }
            Err(err) => Err(err),
        }
    }

    /// Loads the font, replays `--keys` and prints the resulting scene.
    fn run_headless(options: &CliOptions) -> Result<()> {
        let load = FontLoad::spawn_file(&options.font_path, options.font_timeout);
        let (width, height) = WINDOW_SIZE;
        let mut app = AppState::new(width, height, Some(load));
        while app.font_pending() {
            if !app.poll_font(now_ms()) {
                thread::sleep(Duration::from_millis(5));
            }
        }

        let mut buf = [0u8; 4];
        for key in options.keys.chars() {
            app.handle_key(key.encode_utf8(&mut buf));
        }
        print_final_state(&app);
        Ok(())
    }

    fn run_interactive(options: &CliOptions) -> Result<()> {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
        panic::set_hook(default_hook);
        let event_loop = event_loop
            .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
            .map_err(|err| WindowInitError::from_error("event loop", err))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut runner = WindowRunner::new(options.clone());
        event_loop
            .run_app(&mut runner)
            .context("event loop terminated abnormally")?;

        if let Some(app) = runner.app.as_ref() {
            print_final_state(app);
        }
        match runner.last_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Native window, renderer and application state. Everything is created on
    /// the first `resumed` call.
    struct WindowRunner {
        options: CliOptions,
        window: Option<Arc<Window>>,
        renderer: Option<Renderer>,
        app: Option<AppState>,
        cursor: Vec2,
        last_error: Option<anyhow::Error>,
    }

    impl WindowRunner {
        fn new(options: CliOptions) -> Self {
            Self {
                options,
                window: None,
                renderer: None,
                app: None,
                cursor: Vec2::ZERO,
                last_error: None,
            }
        }

        fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
            let (width, height) = WINDOW_SIZE;
            let attributes = Window::default_attributes()
                .with_title(WINDOW_TITLE)
                .with_inner_size(LogicalSize::new(width as f64, height as f64));
            let window = Arc::new(
                event_loop
                    .create_window(attributes)
                    .map_err(|err| WindowInitError::from_error("window", err))?,
            );

            let size = window.inner_size();
            let renderer = block_on(Renderer::new(
                Arc::clone(&window),
                size.width.max(1),
                size.height.max(1),
            ))?;
            let load = FontLoad::spawn_file(&self.options.font_path, self.options.font_timeout);
            info!("window ready at {}x{}", size.width, size.height);

            self.app = Some(AppState::new(size.width, size.height, Some(load)));
            self.renderer = Some(renderer);
            self.window = Some(window);
            Ok(())
        }

        fn redraw(&mut self) -> Result<()> {
            let (Some(renderer), Some(app)) = (self.renderer.as_mut(), self.app.as_mut()) else {
                return Ok(());
            };
            app.poll_font(now_ms());
            renderer.render(&app.frame())
        }

        fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
            self.last_error = Some(err);
            event_loop.exit();
        }
    }

    impl ApplicationHandler for WindowRunner {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            if self.window.is_some() {
                return;
            }
            if let Err(err) = self.init(event_loop) {
                self.fail(event_loop, err);
            }
        }

        fn window_event(
            &mut self,
            event_loop: &ActiveEventLoop,
            _id: WindowId,
            event: WindowEvent,
        ) {
            match event {
                WindowEvent::CloseRequested => event_loop.exit(),
                WindowEvent::Resized(size) => {
                    if let Some(renderer) = self.renderer.as_mut() {
                        renderer.resize(size.width, size.height);
                    }
                }
                WindowEvent::RedrawRequested => {
                    if let Err(err) = self.redraw() {
                        self.fail(event_loop, err);
                    }
                }
                event => {
                    if let Some(app) = self.app.as_mut() {
                        forward_input(app, &mut self.cursor, event);
                    }
                }
            }
        }

        fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
        }
    }

    fn forward_input(app: &mut AppState, cursor: &mut Vec2, event: WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if let Key::Character(text) = &event.logical_key {
                    app.handle_key(text.as_str());
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let mode = match button {
                    MouseButton::Left => DragMode::Rotate,
                    MouseButton::Right => DragMode::Pan,
                    _ => return,
                };
                match state {
                    ElementState::Pressed => app.pointer_down(*cursor, mode),
                    ElementState::Released => app.pointer_up(),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                *cursor = Vec2::new(position.x as f32, position.y as f32);
                app.pointer_move(*cursor);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scrolling up as positive, DOM wheel events as negative.
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(offset) => -offset.y as f32,
                };
                app.wheel(delta);
            }
            _ => {}
        }
    }

    #[derive(Debug)]
    struct WindowInitError {
        message: String,
    }

    impl WindowInitError {
        fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
            Self {
                message: format!("failed to initialize {stage}: {}", panic_message(panic)),
            }
        }

        fn from_error(stage: &str, err: impl fmt::Display) -> Self {
            Self {
                message: format!("failed to initialize {stage}: {err}"),
            }
        }
    }

    impl fmt::Display for WindowInitError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.message)
        }
    }

    impl std::error::Error for WindowInitError {}

    fn panic_message(panic: Box<dyn Any + Send>) -> String {
        match panic.downcast::<String>() {
            Ok(msg) => *msg,
            Err(panic) => match panic.downcast::<&'static str>() {
                Ok(msg) => (*msg).to_string(),
                Err(_) => "unknown panic".into(),
            },
        }
    }
}
