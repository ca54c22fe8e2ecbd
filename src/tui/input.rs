use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use miniacid::shared::DrumVoice;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    TogglePlay,
    ToggleLeadMute(usize),
    ToggleDrumMute(DrumVoice),
    ToggleLeadDelay(usize),
    TempoUp,
    TempoDown,
    RandomizeLead(usize),
    RandomizeDrums,
    ToggleSongMode,
    Save,
    Quit,
}

// poll the terminal for one key press and map it to an engine action
pub fn poll_input(timeout: Duration) -> anyhow::Result<Option<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }
        return Ok(handle_key(key.code));
    }
    Ok(None)
}

fn handle_key(code: KeyCode) -> Option<InputEvent> {
    let event = match code {
        KeyCode::Esc | KeyCode::Char('q') => InputEvent::Quit,
        KeyCode::Char(' ') => InputEvent::TogglePlay,
        KeyCode::Char('a') => InputEvent::ToggleLeadMute(0),
        KeyCode::Char('b') => InputEvent::ToggleLeadMute(1),
        // 1-8 map straight onto the kit, kick first
        KeyCode::Char(c @ '1'..='8') => {
            let idx = c as usize - '1' as usize;
            InputEvent::ToggleDrumMute(DrumVoice::from_index(idx))
        }
        KeyCode::Char('d') => InputEvent::ToggleLeadDelay(0),
        KeyCode::Char('+') | KeyCode::Char('=') => InputEvent::TempoUp,
        KeyCode::Char('-') => InputEvent::TempoDown,
        KeyCode::Char('r') => InputEvent::RandomizeLead(0),
        KeyCode::Char('R') => InputEvent::RandomizeDrums,
        KeyCode::Char('m') => InputEvent::ToggleSongMode,
        KeyCode::Char('s') => InputEvent::Save,
        _ => return None,
    };
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_pick_drum_voices() {
        assert_eq!(handle_key(KeyCode::Char('1')), Some(InputEvent::ToggleDrumMute(DrumVoice::Kick)));
        assert_eq!(handle_key(KeyCode::Char('8')), Some(InputEvent::ToggleDrumMute(DrumVoice::Clap)));
        assert_eq!(handle_key(KeyCode::Char('9')), None);
    }

    #[test]
    fn shift_r_randomizes_drums() {
        assert_eq!(handle_key(KeyCode::Char('r')), Some(InputEvent::RandomizeLead(0)));
        assert_eq!(handle_key(KeyCode::Char('R')), Some(InputEvent::RandomizeDrums));
    }
}
