use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;

use cadence_engine::frame::ScheduleOptions;
use cadence_engine::logging::{LoggingConfig, init_logging};
use cadence_engine::sched::{FrameScheduler, SchedulerConfig};
use cadence_engine::time::SystemTicks;

/// Simulated travel distance of the progress marker, in pixels.
const TRACK_WIDTH: f64 = 900.0;

/// Simulated duration of the progress animation, in milliseconds.
const TRACK_DURATION: f64 = 2_000.0;

fn lerp(start: f64, end: f64, t: f64) -> f64 {
    start + (end - start) * t
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    println!();
    println!("  cadence playground");
    println!("  30 fps fixed step, phases: read / update / render");
    println!();

    let config = SchedulerConfig {
        fps: Some(30.0),
        ..SchedulerConfig::default()
    };
    let source = SystemTicks::with_interval(Duration::from_millis(2));
    let mut frame = FrameScheduler::with_source(config, source)?;

    // One-shot probes, one per phase; they run on the first frame only.
    frame.register_at(
        "read",
        |state, _| log::info!("phase 1: read (t = {:.0} ms)", state.timestamp),
        ScheduleOptions::default(),
    )?;
    frame.register_at(
        "update",
        |state, _| log::info!("phase 2: update (delta = {:.2} ms)", state.delta),
        ScheduleOptions::default(),
    )?;
    frame.register_at(
        "render",
        |_, _| log::info!("phase 3: render"),
        ScheduleOptions::default(),
    )?;

    // Recurring counter that retires itself after 100 updates.
    let updates = Rc::new(Cell::new(0u32));
    let update_handle = Rc::new(Cell::new(None));

    let counter = Rc::clone(&updates);
    let own_handle = Rc::clone(&update_handle);
    let on_update = frame.register_at(
        "update",
        move |_, ctx| {
            counter.set(counter.get() + 1);
            if counter.get() >= 100 {
                if let Some(handle) = own_handle.get() {
                    ctx.cancel(handle);
                }
            }
        },
        ScheduleOptions {
            recurring: true,
            ..ScheduleOptions::default()
        },
    )?;
    update_handle.set(Some(on_update));

    // Progress animation: lerp across the track, then reset the scheduler.
    let begun = Rc::new(Cell::new(None::<f64>));
    let updates_view = Rc::clone(&updates);
    frame.register_at(
        "render",
        move |state, ctx| {
            let start = begun.get().unwrap_or_else(|| {
                begun.set(Some(state.timestamp));
                state.timestamp
            });

            let progress = ((state.timestamp - start) / TRACK_DURATION).min(1.0);
            let position = lerp(0.0, TRACK_WIDTH, progress);

            print!(
                "\r  updates {:>3}  t {:>7.0} ms  x {:>6.1} px",
                updates_view.get(),
                state.timestamp,
                position,
            );
            let _ = std::io::stdout().flush();

            if progress >= 1.0 {
                println!();
                log::info!("render loop done, clearing the scheduler");
                ctx.clear();
            }
        },
        ScheduleOptions {
            recurring: true,
            ..ScheduleOptions::default()
        },
    )?;

    // Pump a few frames by hand, then simulate a hidden tab. The paused gap
    // must not count toward the animation's elapsed time.
    for _ in 0..20 {
        if !frame.is_armed() {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
        frame.tick();
    }

    frame.pause();
    log::info!("paused (simulated visibility change)");
    std::thread::sleep(Duration::from_millis(300));
    frame.resume();
    log::info!("resumed");

    // Drive the loop to completion; the render process clears everything
    // once the marker reaches the end of the track.
    frame.run();

    println!();
    println!("  final state: {:?}", frame.state());
    Ok(())
}
