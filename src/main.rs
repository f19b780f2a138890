use anyhow::Result;
use log::info;
use std::time::Instant;
use winit::{
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

use sweep_arena::engine::game_loop::{GameLoop, LoopConfig, LoopState};
use sweep_arena::game::{Arena, ArenaConfig};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("Starting Sweep Arena...");

    let mut arena = Arena::new(&ArenaConfig::default())?;
    let mut game_loop = GameLoop::new(LoopConfig::default());
    if game_loop.start(&mut arena) == LoopState::Stopped {
        return Ok(());
    }

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Sweep Arena")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
        .with_resizable(true)
        .build(&event_loop)?;

    info!("Window created successfully");

    // Main event loop
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                info!("Close requested, shutting down...");
                elwt.exit();
            }
            Event::WindowEvent {
                event: WindowEvent::KeyboardInput { event, .. },
                ..
            } => {
                arena.input_mut().process_keyboard_event(&event);
            }
            Event::WindowEvent {
                event: WindowEvent::RedrawRequested,
                ..
            } => {
                if game_loop.advance(Instant::now(), &mut arena) == LoopState::Stopped {
                    info!(
                        "Game over after {:.1}s, {} player hits",
                        arena.elapsed(),
                        arena.hits()
                    );
                    elwt.exit();
                }
            }
            Event::AboutToWait => {
                // Request redraw on next frame
                window.request_redraw();
            }
            _ => {}
        })
        .map_err(|e| anyhow::anyhow!("Event loop error: {}", e))?;

    Ok(())
}
