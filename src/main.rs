use std::env;
use std::fs;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::info;
use rand::Rng;

use seismoscope::types::GRAVITY_EARTH;
use seismoscope::{launch, CsvGraphStore, PngRenderer, Session, VisualizerConfig};

const CANVAS_WIDTH: u32 = 480;
const CANVAS_HEIGHT: u32 = 800;

fn load_config() -> Result<VisualizerConfig> {
    match env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {path}"))?;
            VisualizerConfig::from_json(&text)
                .with_context(|| format!("failed to parse config file {path}"))
        }
        None => Ok(VisualizerConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let config = load_config()?;

    let surface = Arc::new(Mutex::new(PngRenderer::new(CANVAS_WIDTH, CANVAS_HEIGHT)));
    let store =
        CsvGraphStore::new("saved-graphs").context("failed to prepare the graph directory")?;

    let Session {
        mut controller,
        mut feed,
        render_thread,
    } = launch(config, Arc::clone(&surface), store);
    controller.resize_surface(CANVAS_WIDTH, CANVAS_HEIGHT);

    // Simulated sensor at 50 Hz: gravity on z, a shake burst on x plus
    // mild noise everywhere, roughly what a phone on a desk picks up
    // when someone knocks on it.
    let producer = thread::spawn(move || {
        let mut rng = rand::thread_rng();
        for i in 0..250 {
            let t = i as f32 / 50.0;
            let burst = if (2.0..4.0).contains(&t) { 6.0 } else { 0.3 };
            let x = (t * 12.0).sin() * burst + rng.gen_range(-0.05..0.05);
            let y = rng.gen_range(-0.05..0.05);
            let z = -GRAVITY_EARTH + rng.gen_range(-0.1..0.1);
            feed.update(x, y, z);
            thread::sleep(Duration::from_millis(20));
        }
    });
    producer
        .join()
        .map_err(|_| anyhow!("sensor simulation thread panicked"))?;

    let row = controller.save().context("saving the captured graph failed")?;
    info!("captured graph stored with id {row}");

    controller.stop();
    render_thread
        .join()
        .map_err(|_| anyhow!("render thread panicked"))?;

    let surface = surface
        .lock()
        .map_err(|_| anyhow!("render surface poisoned"))?;
    if let Some(png) = surface.last_png() {
        fs::write("trace.png", png).context("failed to write trace.png")?;
        info!("wrote trace.png ({} bytes)", png.len());
    }
    Ok(())
}
