//! Panel widget - active function, control mode, knobs and clock period

use modcore::{ControlMode, ProcessorFunction, SAMPLE_RATE};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use super::StatusUpdate;

/// Render the function header and one gauge per knob
pub fn render_panel(frame: &mut Frame, area: Rect, status: &StatusUpdate, selected: usize) {
    let block = Block::default().title(" modcore ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let settings = &status.settings;
    let mode = match settings.control_mode {
        ControlMode::Half => "half (2 knobs)",
        ControlMode::Full => "full (4 knobs)",
    };

    let mut spans = vec![
        Span::styled(
            format!(" {}  ", settings.function.name()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{mode}  "), Style::default().fg(Color::White)),
    ];
    if let Some(period) = status.period {
        spans.push(Span::styled(
            format!("{}  ", describe_period(period)),
            Style::default().fg(Color::Green),
        ));
    }
    if settings.function == ProcessorFunction::ShapedEnvelope {
        spans.push(Span::styled(
            format!(
                "env {} {}/{}{}  ",
                status.envelope_mode,
                status.attack_shape,
                status.decay_shape,
                if status.hard_reset { " hard" } else { "" }
            ),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled(
        format!("blocks {}", status.blocks_rendered),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(
        Paragraph::new(Line::from(spans)),
        Rect { height: 1, ..inner },
    );

    let live_knobs = match settings.control_mode {
        ControlMode::Half => 2,
        ControlMode::Full => 4,
    };
    for (index, &value) in settings.parameters.iter().enumerate() {
        let row = inner.y + 2 + index as u16;
        if row >= inner.y + inner.height {
            break;
        }
        let color = if index == selected {
            Color::Magenta
        } else if index < live_knobs {
            Color::Blue
        } else {
            Color::DarkGray
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(color))
            .ratio(value as f64 / u16::MAX as f64)
            .label(format!("knob {}  {value:#06x}", index + 1));
        frame.render_widget(
            gauge,
            Rect {
                y: row,
                height: 1,
                ..inner
            },
        );
    }
}

fn describe_period(period: u32) -> String {
    if period == 0 {
        return "no clock".to_string();
    }
    let hz = SAMPLE_RATE as f64 / period as f64;
    format!("period {period} ticks ({hz:.2} Hz)")
}
