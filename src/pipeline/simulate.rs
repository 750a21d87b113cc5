//! Generator loop: tick the dynamics engine at a fixed rate and append every
//! sample to the shared telemetry log.

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::core::pacing::Ticker;
use crate::pipeline::signals::SignalHandler;
use crate::sim::dynamics::DynamicsEngine;
use crate::stream::appender::SampleAppender;
use crate::stream::sample::format_ts;

/// Run the generator until a shutdown signal arrives.
///
/// The in-progress tick always completes (generate, append, flush) before the
/// loop exits, so the log never ends in a torn line on clean shutdown.
pub fn run(cfg: &Config, signals: &SignalHandler) -> Result<()> {
    let sim = &cfg.simulator;
    let mut engine = DynamicsEngine::new(sim.vehicle_id.clone(), sim.rate_hz, sim.seed);
    let mut appender = SampleAppender::open(&cfg.paths.telemetry_log)?;
    let mut ticker = Ticker::from_rate_hz(sim.rate_hz);

    eprintln!(
        "[DTP-SIM] started: vehicle={} rate={}Hz seed={} out={}",
        sim.vehicle_id,
        sim.rate_hz,
        sim.seed,
        appender.path().display()
    );

    while !signals.should_shutdown() {
        let sample = engine.tick();
        appender.append(&sample)?;
        println!(
            "{} speed={:.2}km/h rpm={} thr={:.1}% brk={:.1}% steer={:.2}deg",
            format_ts(sample.ts),
            sample.speed_kmh,
            sample.rpm,
            sample.throttle_pct,
            sample.brake_pct,
            sample.steer_deg
        );
        ticker.wait();
    }

    appender.sync()?;
    eprintln!(
        "[DTP-SIM] stopped: {} samples written to {}",
        appender.lines_written(),
        appender.path().display()
    );
    Ok(())
}
