use anyhow::{anyhow, Context, Result};
use glutin::{
    config::ConfigTemplateBuilder,
    context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version},
    display::{GetGlDisplay, GlDisplay},
    prelude::*,
    surface::{Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::info;
use raw_window_handle::HasRawWindowHandle;
use simple_logger::SimpleLogger;
use std::{ffi::CString, num::NonZeroU32, path::PathBuf, ptr};
use winit::{
    dpi::LogicalSize,
    event::{Event, KeyEvent, WindowEvent},
    event_loop::{EventLoop, EventLoopBuilder},
    keyboard::PhysicalKey,
    window::{Window, WindowBuilder},
};

use hello_opengl::{
    config::{self, AppConfig},
    input::{parse_key_code, CloseOnKey, ErrorHandler, InputAction, KeyHandler, LogErrorHandler},
    TriangleDemo,
};

struct App {
    window: Window,
    gl_context: PossiblyCurrentContext,
    gl_surface: Surface<WindowSurface>,
    demo: Option<TriangleDemo>,
    keys: Box<dyn KeyHandler>,
    errors: Box<dyn ErrorHandler>,
}

impl App {
    fn new(config: &AppConfig) -> Result<(Self, EventLoop<()>)> {
        let event_loop = EventLoopBuilder::new().build()?;
        let window_builder = WindowBuilder::new()
            .with_title(config.window.title.as_str())
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
            .with_resizable(config.window.resizable);

        let template = ConfigTemplateBuilder::new();
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

        let (window, gl_config) = display_builder
            .build(&event_loop, template, |configs| {
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() {
                            config
                        } else {
                            accum
                        }
                    })
                    .expect("glutin offers at least one config")
            })
            .map_err(|e| anyhow!("Failed to create display: {}", e))?;

        let window = window.context("Failed to create window")?;
        let raw_window_handle = window.raw_window_handle();

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(
                config.context.major,
                config.context.minor,
            ))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_window_handle));

        let gl_display = gl_config.display();

        let gl_context = unsafe {
            gl_display
                .create_context(&gl_config, &context_attributes)
                .context("Failed to create OpenGL context")?
        };

        let attrs = window.build_surface_attributes(<_>::default());
        let gl_surface = unsafe {
            gl_display
                .create_window_surface(&gl_config, &attrs)
                .context("Failed to create GL surface")?
        };

        let gl_context = gl_context
            .make_current(&gl_surface)
            .context("Failed to make context current")?;

        let mut errors: Box<dyn ErrorHandler> = Box::new(LogErrorHandler);

        let interval = if config.context.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = gl_surface.set_swap_interval(&gl_context, interval) {
            errors.on_error(&e);
        }

        gl::load_with(|symbol| match CString::new(symbol) {
            Ok(symbol) => gl_display.get_proc_address(symbol.as_c_str()) as *const _,
            Err(_) => ptr::null(),
        });

        let size = window.inner_size();
        unsafe {
            gl::Viewport(0, 0, size.width as i32, size.height as i32);
        }

        let close_key = parse_key_code(&config.input.close_key).unwrap_or_else(|| {
            log::warn!(
                "Unknown close key '{}', using Space",
                config.input.close_key
            );
            CloseOnKey::default().key
        });

        let demo = TriangleDemo::new(config)?;

        Ok((
            Self {
                window,
                gl_context,
                gl_surface,
                demo: Some(demo),
                keys: Box::new(CloseOnKey { key: close_key }),
                errors,
            },
            event_loop,
        ))
    }

    /// Returns true when the window should close.
    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => true,
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => self.keys.on_key(*code, *state) == InputAction::Close,
            WindowEvent::Resized(size) => {
                if let (Some(width), Some(height)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                {
                    self.gl_surface.resize(&self.gl_context, width, height);
                    unsafe {
                        gl::Viewport(0, 0, size.width as i32, size.height as i32);
                    }
                }
                false
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                false
            }
            _ => false,
        }
    }

    fn redraw(&mut self) {
        let size = self.window.inner_size();
        let aspect_ratio = size.width as f32 / size.height.max(1) as f32;

        if let Some(demo) = &mut self.demo {
            demo.render(aspect_ratio);
        }

        if let Err(e) = self.gl_surface.swap_buffers(&self.gl_context) {
            self.errors.on_error(&e);
        }
    }

    /// Releases GL objects while the context is still current.
    fn cleanup(&mut self) {
        if let Some(demo) = self.demo.take() {
            info!("Shutting down after {} frames", demo.frames());
            drop(demo);
        }
    }
}

fn load_config() -> Result<(AppConfig, PathBuf)> {
    match std::env::args_os().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            Ok((AppConfig::from_file(&path)?, path))
        }
        None => {
            let path = config::core::get_config_path()?;
            Ok((config::core::load_or_create_config(&path)?, path))
        }
    }
}

fn main() -> Result<()> {
    let (config, config_path) = load_config()?;

    SimpleLogger::new().with_level(config.log_level()).init()?;
    info!("Initializing application with config {:?}", config_path);

    let (mut app, event_loop) = App::new(&config)?;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => {
            if app.handle_window_event(&event) {
                elwt.exit();
            }
        }
        Event::AboutToWait => {
            app.window.request_redraw();
        }
        Event::LoopExiting => {
            app.cleanup();
        }
        _ => (),
    })?;

    Ok(())
}
