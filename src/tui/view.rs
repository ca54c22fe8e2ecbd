use miniacid::audio::MiniAcid;
use miniacid::shared::{DrumVoice, NUM_303_VOICES, NUM_DRUM_VOICES, SEQ_STEPS};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

/// Everything the status view shows, copied out of the engine so the lock
/// is held only for the copy and never while drawing.
#[derive(Clone, Debug, Default)]
pub struct StatusSnapshot {
    pub scene: String,
    pub playing: bool,
    pub bpm: f32,
    pub step: Option<usize>,
    pub song_mode: bool,
    pub song_row: usize,
    pub song_len: usize,
    pub lead_muted: [bool; NUM_303_VOICES],
    pub lead_delay: [bool; NUM_303_VOICES],
    pub lead_pattern: [Option<usize>; NUM_303_VOICES],
    pub drum_pattern: Option<usize>,
    pub drum_muted: [bool; NUM_DRUM_VOICES],
    pub message: Option<String>,
}

impl StatusSnapshot {
    pub fn capture(engine: &MiniAcid) -> Self {
        Self {
            scene: engine.current_scene_name().to_string(),
            playing: engine.is_playing(),
            bpm: engine.bpm(),
            step: engine.current_step(),
            song_mode: engine.song_mode_enabled(),
            song_row: engine.song_playhead_position(),
            song_len: engine.song_length(),
            lead_muted: std::array::from_fn(|i| engine.is_synth_muted(i)),
            lead_delay: std::array::from_fn(|i| engine.is_synth_delay_enabled(i)),
            lead_pattern: std::array::from_fn(|i| engine.display_synth_pattern_index(i)),
            drum_pattern: engine.display_drum_pattern_index(),
            drum_muted: DrumVoice::ALL.map(|v| engine.is_drum_muted(v)),
            message: None,
        }
    }
}

pub fn render(frame: &mut Frame, area: Rect, state: &StatusSnapshot) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // transport
            Constraint::Length(3), // step ruler
            Constraint::Length(5), // tracks
            Constraint::Min(1),    // key help
        ])
        .split(area);

    draw_transport(frame, sections[0], state);
    draw_steps(frame, sections[1], state);
    draw_tracks(frame, sections[2], state);
    draw_help(frame, sections[3], state);
}

fn slot_label(slot: Option<usize>) -> String {
    slot.map_or_else(|| "--".to_string(), |p| format!("P{}", p + 1))
}

fn draw_transport(frame: &mut Frame, area: Rect, state: &StatusSnapshot) {
    let status = if state.playing { "PLAY" } else { "STOP" };
    let mode = if state.song_mode {
        format!("song {}/{}", state.song_row + 1, state.song_len)
    } else {
        "pattern".to_string()
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(status, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  {:.0} bpm  {mode}", state.bpm)),
        ]),
        Line::from(format!("scene: {}", state.scene)),
    ];
    let block = Block::default().borders(Borders::ALL).title(" miniacid ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_steps(frame: &mut Frame, area: Rect, state: &StatusSnapshot) {
    let spans: Vec<Span> = (0..SEQ_STEPS)
        .map(|i| {
            let style = match state.step {
                Some(s) if s == i => Style::default().fg(Color::Black).bg(Color::Yellow),
                _ if i % 4 == 0 => Style::default().fg(Color::White),
                _ => Style::default().fg(Color::DarkGray),
            };
            Span::styled(format!("{:>3}", i + 1), style)
        })
        .collect();
    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_tracks(frame: &mut Frame, area: Rect, state: &StatusSnapshot) {
    let muted = |m: bool| if m { Style::default().fg(Color::DarkGray) } else { Style::default().fg(Color::Green) };
    let mut lines = Vec::new();
    for (i, name) in ["lead A", "lead B"].iter().enumerate() {
        let delay = if state.lead_delay[i] { " dly" } else { "" };
        lines.push(Line::from(Span::styled(
            format!("{name} {}{delay}", slot_label(state.lead_pattern[i])),
            muted(state.lead_muted[i]),
        )));
    }
    let mut kit = vec![Span::raw(format!("drums  {} ", slot_label(state.drum_pattern)))];
    for voice in DrumVoice::ALL {
        kit.push(Span::styled(format!("{} ", voice.label()), muted(state.drum_muted[voice.index()])));
    }
    lines.push(Line::from(kit));
    let block = Block::default().borders(Borders::ALL).title(" tracks ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_help(frame: &mut Frame, area: Rect, state: &StatusSnapshot) {
    let mut lines = vec![Line::from(
        "space play/stop  a/b leads  1-8 drums  d delay  +/- tempo  r/R random  m song  s save  q quit",
    )];
    if let Some(msg) = &state.message {
        lines.push(Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Red))));
    }
    frame.render_widget(Paragraph::new(lines), area);
}
