//! Modcore - audio, render and UI wiring

use std::{thread, time::Duration};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};

use modcore::{
    engine::{block_ring, ModulationEngine, Processors, TickHandler},
    io::DacSink,
    GateFlags, ModulatorSettings, BLOCK_SIZE, SAMPLE_RATE,
};

use crate::ui::{ControlMessage, GateCommand, StatusUpdate, UiApp};

/// Desktop ring: deeper than the firmware's so the render thread can sleep
/// between passes and still stay ahead of a large device buffer.
const HOST_BLOCKS: usize = 128;
const GATE_QUEUE_SIZE: usize = HOST_BLOCKS * BLOCK_SIZE * 2;
const SCOPE_RING_SIZE: usize = 8192;
const RENDER_SLEEP: Duration = Duration::from_millis(1);

/// A tap holds the gate high for 10 ms.
const TAP_GATE_TICKS: u32 = SAMPLE_RATE / 100;
/// Internal clock: 2 Hz with a 10 ms pulse.
const CLOCK_PERIOD_TICKS: u32 = SAMPLE_RATE / 2;
const CLOCK_GATE_TICKS: u32 = SAMPLE_RATE / 100;

/// Main application builder
pub struct Modcore {
    settings: ModulatorSettings,
}

impl Modcore {
    pub fn new() -> Self {
        Self {
            settings: ModulatorSettings::default(),
        }
    }

    /// Initial function, control mode and knob positions
    pub fn settings(mut self, settings: ModulatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Run the application (takes over the terminal, plays audio)
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        if sample_rate != SAMPLE_RATE {
            log::warn!(
                "device runs at {sample_rate} Hz, modulation is tuned for {SAMPLE_RATE} Hz; \
                 rates and times will be off by {:.3}x",
                sample_rate as f64 / SAMPLE_RATE as f64
            );
        }
        log::info!(
            "output: {sample_rate} Hz, {channels} channels, {HOST_BLOCKS} blocks of {BLOCK_SIZE}"
        );

        // --- Cross-thread rings ---
        let (playback, render) = block_ring::<HOST_BLOCKS, BLOCK_SIZE>();
        let (gate_tx, gate_rx) = RingBuffer::<GateFlags>::new(GATE_QUEUE_SIZE);
        let (gate_cmd_tx, gate_cmd_rx) = RingBuffer::<GateCommand>::new(16);
        let (control_tx, control_rx) = RingBuffer::<ControlMessage>::new(64);
        let (status_tx, status_rx) = RingBuffer::<StatusUpdate>::new(16);
        let (scope_tx, scope_rx) = RingBuffer::<i16>::new(SCOPE_RING_SIZE);

        // --- Render loop ---
        let mut processors = Processors::new();
        processors.apply_settings(&self.settings);
        let engine = ModulationEngine::new(processors, render, gate_rx);
        let render_thread = thread::Builder::new()
            .name("modcore-render".into())
            .spawn(move || render_loop(engine, control_rx, status_tx))
            .wrap_err("failed to spawn render thread")?;

        // --- Tick source ---
        let stream = device
            .build_output_stream(
                &config.into(),
                {
                    let mut tick = TickHandler::new(playback, gate_tx);
                    let mut gate = GateSource::new(gate_cmd_rx);
                    let mut out = FrameSink {
                        sample: 0,
                        scope: scope_tx,
                    };
                    move |data: &mut [f32], _| {
                        gate.poll();
                        for frame in data.chunks_mut(channels) {
                            let (high, from_button) = gate.next_level();
                            tick.on_tick(high, from_button, &mut out);
                            frame.fill(out.sample as f32 / 32768.0);
                        }
                    }
                },
                |err| log::error!("stream error: {err}"),
                None,
            )
            .wrap_err("failed to build output stream")?;

        stream.play().wrap_err("failed to start output stream")?;

        // --- UI ---
        let mut app = UiApp::new(
            control_tx,
            gate_cmd_tx,
            scope_rx,
            status_rx,
            StatusUpdate {
                settings: self.settings,
                ..StatusUpdate::default()
            },
        );
        let mut terminal = ratatui::init();
        let result = app.run(&mut terminal);
        ratatui::restore();

        drop(stream);
        if render_thread.join().is_err() {
            log::error!("render thread panicked");
        }
        result
    }
}

impl Default for Modcore {
    fn default() -> Self {
        Self::new()
    }
}

fn render_loop<const N: usize, const B: usize>(
    mut engine: ModulationEngine<Consumer<GateFlags>, N, B>,
    mut control_rx: Consumer<ControlMessage>,
    mut status_tx: Producer<StatusUpdate>,
) {
    let mut blocks_rendered = 0u64;
    loop {
        while let Ok(message) = control_rx.pop() {
            let processors = engine.processors_mut();
            match message {
                ControlMessage::SetFunction(function) => processors.set_function(function),
                ControlMessage::SetParameter { index, value } => {
                    processors.set_parameter(index, value)
                }
                ControlMessage::SetControlMode(mode) => processors.set_control_mode(mode),
                ControlMessage::CycleEnvelopeMode => {
                    processors.cycle_envelope_mode();
                }
                ControlMessage::CycleAttackShape => {
                    processors.cycle_envelope_shape(true);
                }
                ControlMessage::CycleDecayShape => {
                    processors.cycle_envelope_shape(false);
                }
                ControlMessage::ToggleHardReset => {
                    processors.toggle_envelope_hard_reset();
                }
                ControlMessage::Reseed => {
                    let seed = rand::random::<u32>();
                    processors.turing_mut().reseed(seed);
                }
                ControlMessage::Quit => {
                    log::info!("render loop stopped after {blocks_rendered} blocks");
                    return;
                }
            }
        }

        blocks_rendered += engine.render_pending() as u64;

        let processors = engine.processors();
        let _ = status_tx.push(StatusUpdate {
            settings: processors.settings(),
            period: processors.period(),
            envelope_mode: processors.shaped_envelope().mode().name(),
            attack_shape: processors.shaped_envelope().attack_shape().name(),
            decay_shape: processors.shaped_envelope().decay_shape().name(),
            hard_reset: processors.shaped_envelope().hard_reset(),
            blocks_rendered,
        });

        thread::sleep(RENDER_SLEEP);
    }
}

/// Gate level per tick, from the tap button or the internal clock.
struct GateSource {
    commands: Consumer<GateCommand>,
    button_ticks: u32,
    clock_running: bool,
    clock_counter: u32,
}

impl GateSource {
    fn new(commands: Consumer<GateCommand>) -> Self {
        Self {
            commands,
            button_ticks: 0,
            clock_running: false,
            clock_counter: 0,
        }
    }

    fn poll(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                GateCommand::Tap => self.button_ticks = TAP_GATE_TICKS,
                GateCommand::ToggleClock => {
                    self.clock_running = !self.clock_running;
                    self.clock_counter = 0;
                }
            }
        }
    }

    /// `(high, from_button)` for the next tick.
    fn next_level(&mut self) -> (bool, bool) {
        if self.button_ticks > 0 {
            self.button_ticks -= 1;
            return (true, true);
        }
        if !self.clock_running {
            return (false, false);
        }
        let high = self.clock_counter < CLOCK_GATE_TICKS;
        self.clock_counter = (self.clock_counter + 1) % CLOCK_PERIOD_TICKS;
        (high, false)
    }
}

/// Keeps the latest tick's sample for the device and copies it to the scope.
struct FrameSink {
    sample: i16,
    scope: Producer<i16>,
}

impl DacSink for FrameSink {
    fn write(&mut self, sample: i16) {
        self.sample = sample;
        self.scope.write(sample);
    }
}
