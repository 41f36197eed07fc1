//! TUI module for modcore
//!
//! Shows the live function, its knobs and an oscilloscope of the output.

mod panel;
mod scope;
pub mod state;

use std::{thread, time::Duration};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use modcore::ControlMode;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};

pub use state::{ControlMessage, GateCommand, StatusUpdate};

use panel::render_panel;
use scope::render_scope;

/// Samples kept for the oscilloscope
const SCOPE_LEN: usize = 2048;
/// Knob step for the arrow keys; page keys move 8 steps
const KNOB_STEP: u16 = 0x0400;

/// UI application state
pub struct UiApp {
    control_tx: Producer<ControlMessage>,
    gate_tx: Producer<GateCommand>,
    scope_rx: Consumer<i16>,
    status_rx: Consumer<StatusUpdate>,
    status: StatusUpdate,
    scope: Vec<i16>,
    /// Knob the arrow keys move
    selected: usize,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        control_tx: Producer<ControlMessage>,
        gate_tx: Producer<GateCommand>,
        scope_rx: Consumer<i16>,
        status_rx: Consumer<StatusUpdate>,
        initial: StatusUpdate,
    ) -> Self {
        Self {
            control_tx,
            gate_tx,
            scope_rx,
            status_rx,
            status: initial,
            scope: vec![0; SCOPE_LEN],
            selected: 0,
            should_quit: false,
        }
    }

    /// Run the UI event loop, then stop the render thread
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_scope();
            self.poll_status();

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        for _ in 0..100 {
            if self.control_tx.push(ControlMessage::Quit).is_ok() {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }

    fn poll_scope(&mut self) {
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.push(sample);
        }
        if self.scope.len() > SCOPE_LEN {
            let excess = self.scope.len() - SCOPE_LEN;
            self.scope.drain(0..excess);
        }
    }

    fn poll_status(&mut self) {
        // Keep only the latest snapshot
        while let Ok(status) = self.status_rx.pop() {
            self.status = status;
        }
    }

    fn send(&mut self, message: ControlMessage) {
        if self.control_tx.push(message).is_err() {
            log::warn!("control ring full, dropped {message:?}");
        }
    }

    fn nudge_knob(&mut self, delta: i32) {
        let index = self.selected;
        let current = self.status.settings.parameters[index] as i32;
        let value = (current + delta).clamp(0, u16::MAX as i32) as u16;
        // show the new value right away, the render thread confirms it
        self.status.settings.parameters[index] = value;
        self.send(ControlMessage::SetParameter { index, value });
    }

    fn handle_key(&mut self, key: KeyCode) {
        let settings = self.status.settings;
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::Right => {
                self.send(ControlMessage::SetFunction(settings.function.next()))
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.send(ControlMessage::SetFunction(settings.function.previous()))
            }
            KeyCode::Char(c @ '1'..='4') => self.selected = (c as u8 - b'1') as usize,
            KeyCode::Up => self.nudge_knob(KNOB_STEP as i32),
            KeyCode::Down => self.nudge_knob(-(KNOB_STEP as i32)),
            KeyCode::PageUp => self.nudge_knob(8 * KNOB_STEP as i32),
            KeyCode::PageDown => self.nudge_knob(-8 * KNOB_STEP as i32),
            KeyCode::Char('m') => {
                let mode = match settings.control_mode {
                    ControlMode::Half => ControlMode::Full,
                    ControlMode::Full => ControlMode::Half,
                };
                self.send(ControlMessage::SetControlMode(mode));
            }
            KeyCode::Char('e') => self.send(ControlMessage::CycleEnvelopeMode),
            KeyCode::Char('a') => self.send(ControlMessage::CycleAttackShape),
            KeyCode::Char('d') => self.send(ControlMessage::CycleDecayShape),
            KeyCode::Char('h') => self.send(ControlMessage::ToggleHardReset),
            KeyCode::Char('r') => self.send(ControlMessage::Reseed),
            KeyCode::Char(' ') => {
                let _ = self.gate_tx.push(GateCommand::Tap);
            }
            KeyCode::Char('c') => {
                let _ = self.gate_tx.push(GateCommand::ToggleClock);
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(9), // Function and knobs
                Constraint::Min(8),    // Scope
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        render_panel(frame, chunks[0], &self.status, self.selected);
        render_scope(frame, chunks[1], &self.scope);

        let help = Paragraph::new(
            " [Q] Quit  [Tab] Function  [1-4] Knob  [↑↓ PgUp PgDn] Turn  [M] Mode  \
             [Space] Tap  [C] Clock  [E] Env mode  [A/D] Env shapes  [H] Hard reset  [R] Reseed",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[2]);
    }
}
