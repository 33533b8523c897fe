//! Sampling and publishing pipeline.
//!
//! ```text
//!  DHT22 sampler ──▶ humidity queue ─┐
//!                                    ├──▶ publisher ──▶ PublishPort
//!  battery sampler ─▶ battery queue ─┘        ▲
//!                                   LinkControl (pause / resume)
//! ```
//!
//! [`Pipeline::start`] creates the queues, spawns every task and hands
//! back a [`PipelineHandle`].  The battery sampler is only spawned when a
//! gauge was brought up; the rest of the pipeline runs without it.

pub mod control;
pub mod publisher;
pub mod queue;
pub mod sampler;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{error, info};

use crate::app::ports::{PublishPort, SensorPort};
use crate::config::SystemConfig;
use crate::drivers::task_pin::{Core, TaskSpec, spawn_task};
use crate::error::{Error, Result};
use crate::sensors::{BatteryReading, HumidityReading};

use control::{LinkControl, PublishGate, StopSignal};
use publisher::Publisher;
use queue::{QUEUE_DEPTH, reading_queue};
use sampler::{Sampler, SamplerStats, StatsSnapshot};

/// Everything the pipeline takes ownership of at start.
pub struct PipelineContext<H, B, P> {
    pub config: SystemConfig,
    pub humidity: H,
    /// `None` when the gauge was not found at boot.
    pub battery: Option<B>,
    pub sink: P,
}

pub struct Pipeline;

impl Pipeline {
    /// Spawn the publisher and the samplers described by `ctx`.
    pub fn start<H, B, P>(ctx: PipelineContext<H, B, P>) -> Result<PipelineHandle<P>>
    where
        H: SensorPort<Reading = HumidityReading> + Send + 'static,
        B: SensorPort<Reading = BatteryReading> + Send + 'static,
        P: PublishPort + Send + 'static,
    {
        ctx.config.validate()?;
        let cfg = ctx.config;

        let (humidity_tx, humidity_rx) = reading_queue::<HumidityReading, QUEUE_DEPTH>("humidity");
        let (battery_tx, battery_rx) = reading_queue::<BatteryReading, QUEUE_DEPTH>("battery");
        let gate = Arc::new(PublishGate::new());
        let stop = StopSignal::new();

        let publisher = Publisher::new(ctx.sink, humidity_rx, battery_rx, Arc::clone(&gate));
        let delivered = publisher.delivered();
        let publisher = spawn_task(
            TaskSpec {
                name: "publisher",
                core: Core::Pro,
                priority: cfg.publisher_priority,
                stack_kb: cfg.publisher_stack_kb,
            },
            move || publisher.run(),
        )
        .map_err(|e| {
            error!("PIPELINE: publisher spawn failed: {}", e);
            Error::Init("publisher task")
        })?;

        let mut handle = PipelineHandle {
            gate,
            stop,
            humidity_stats: Arc::new(SamplerStats::default()),
            battery_stats: None,
            delivered,
            samplers: Vec::new(),
            publisher: Some(publisher),
        };

        let humidity = Sampler::new(ctx.humidity, humidity_tx, Duration::from_millis(u64::from(cfg.dht_period_ms)));
        handle.humidity_stats = humidity.stats();
        if let Err(e) = handle.spawn_sampler("dht_sampler", &cfg, humidity) {
            return Err(handle.abort(e));
        }

        match ctx.battery {
            Some(gauge) => {
                let battery = Sampler::new(gauge, battery_tx, Duration::from_millis(u64::from(cfg.battery_period_ms)));
                handle.battery_stats = Some(battery.stats());
                if let Err(e) = handle.spawn_sampler("battery_sampler", &cfg, battery) {
                    return Err(handle.abort(e));
                }
            }
            None => info!("PIPELINE: no battery monitor, battery sampler not started"),
        }

        info!("PIPELINE: running ({} sampler tasks)", handle.samplers.len());
        Ok(handle)
    }
}

/// Control surface of a running pipeline.
pub struct PipelineHandle<P> {
    gate: Arc<PublishGate>,
    stop: StopSignal,
    humidity_stats: Arc<SamplerStats>,
    battery_stats: Option<Arc<SamplerStats>>,
    delivered: Arc<AtomicU32>,
    samplers: Vec<JoinHandle<()>>,
    publisher: Option<JoinHandle<P>>,
}

impl<P> PipelineHandle<P> {
    fn spawn_sampler<S>(&mut self, name: &'static str, cfg: &SystemConfig, sampler: Sampler<S, QUEUE_DEPTH>) -> Result<()>
    where
        S: SensorPort + Send + 'static,
        S::Reading: Into<crate::sensors::Reading>,
    {
        let stop = self.stop.clone();
        let spec = TaskSpec {
            name,
            core: Core::App,
            priority: cfg.sampler_priority,
            stack_kb: cfg.sampler_stack_kb,
        };
        match spawn_task(spec, move || {
            sampler.run(&stop);
        }) {
            Ok(task) => {
                self.samplers.push(task);
                Ok(())
            }
            Err(e) => {
                error!("PIPELINE: {} spawn failed: {}", name, e);
                Err(Error::Init(name))
            }
        }
    }

    /// Tear down a partly started pipeline and hand back `err`.  Tasks
    /// already running are joined, so none of them outlives `start`.
    fn abort(self, err: Error) -> Error {
        if let Err(e) = self.join() {
            error!("PIPELINE: teardown after failed start: {}", e);
        }
        err
    }

    /// Pause / resume handle for the publisher.
    pub fn link(&self) -> LinkControl {
        LinkControl::new(Arc::clone(&self.gate))
    }

    pub fn humidity_stats(&self) -> StatsSnapshot {
        self.humidity_stats.snapshot()
    }

    /// `None` when no battery sampler is running.
    pub fn battery_stats(&self) -> Option<StatsSnapshot> {
        self.battery_stats.as_ref().map(|s| s.snapshot())
    }

    pub fn has_battery(&self) -> bool {
        self.battery_stats.is_some()
    }

    /// Readings handed to the sink so far.
    pub fn delivered(&self) -> u32 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Ask every task to finish.  Queued readings are not drained.
    pub fn stop(&self) {
        self.stop.stop();
        self.gate.stop();
    }

    /// Stop and wait for every task.  Returns the sink.
    pub fn join(mut self) -> Result<P> {
        self.stop();
        for task in self.samplers.drain(..) {
            task.join().map_err(|_| Error::Task("sampler"))?;
        }
        let publisher = self.publisher.take().ok_or(Error::Task("publisher"))?;
        publisher.join().map_err(|_| Error::Task("publisher"))
    }
}
