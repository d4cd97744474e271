use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};

use crate::app::{ActiveRun, App, CompletionReport};
use crate::session::activity::ActivitySession;
use crate::session::policy::Phase;

/// How a terminal run ended.
pub enum PlayOutcome {
    Finished(Option<CompletionReport>),
    /// Left early; the run stays saved and resumes next time.
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub color: Option<Color>,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }
}

pub type Line = Vec<Span>;

enum Flow {
    Continue,
    Quit,
}

/// Drive the app's active run in raw mode until it finishes or the learner
/// quits. The terminal is restored on every exit path.
pub fn run(app: &mut App) -> Result<PlayOutcome> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let result = run_loop(app, &mut stdout);

    disable_raw_mode()?;
    execute!(stdout, Show, LeaveAlternateScreen)?;
    result
}

fn run_loop(app: &mut App, out: &mut impl Write) -> Result<PlayOutcome> {
    let poll_interval = Duration::from_secs(app.config.poll_interval_secs);
    let mut status = String::new();
    loop {
        let Some(active) = app.active() else {
            return Ok(PlayOutcome::Finished(None));
        };
        if active.session.is_done() {
            return Ok(PlayOutcome::Finished(app.complete_session()));
        }
        draw(out, &render_lines(active, &status))?;

        if !event::poll(poll_interval)? {
            if app.poll_remote() {
                log::debug!("state refreshed while playing");
            }
            continue;
        }
        if let Event::Key(key) = event::read()?
            && let Flow::Quit = handle_key(app, key, &mut status)
        {
            return Ok(PlayOutcome::Quit);
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, status: &mut String) -> Flow {
    if key.kind != KeyEventKind::Press {
        return Flow::Continue;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => return Flow::Quit,
        KeyCode::Char('c') if ctrl => return Flow::Quit,
        KeyCode::Char('r') if ctrl => match app.restart_activity() {
            Ok(()) => *status = "Starting over.".to_string(),
            Err(e) => log::warn!("restart failed: {e}"),
        },
        KeyCode::Char(d) if ctrl && d.is_ascii_digit() => {
            if let Some(index) = slot_for_digit(d) {
                app.remove_letter(index);
            }
        }
        KeyCode::Char('?') => {
            if let Some(word) = app.peek() {
                *status = format!("psst: {word}");
            }
        }
        KeyCode::Char(ch) if is_word_char(ch) => {
            status.clear();
            app.type_letter(ch);
        }
        KeyCode::Backspace => {
            app.delete_letter();
        }
        KeyCode::Enter => enter(app, status),
        _ => {}
    }
    Flow::Continue
}

fn enter(app: &mut App, status: &mut String) {
    let Some(session) = app.active().map(|a| &a.session) else {
        return;
    };
    let phase = session.phase;
    let retry = session.last_correct == Some(false) && session.policy().allow_retry;
    match phase {
        Phase::Study | Phase::Prompt => {
            app.begin();
        }
        Phase::Typing => {
            if let Some(outcome) = app.submit() {
                *status = match (outcome.correct, app.active().map(|a| a.session.phase)) {
                    (true, _) => "Correct!".to_string(),
                    (false, Some(Phase::Typing)) => "Not quite, try again.".to_string(),
                    (false, _) => String::new(),
                };
            }
        }
        Phase::Feedback => {
            if retry {
                app.retry();
            } else {
                app.next();
            }
            status.clear();
        }
        Phase::Done => {}
    }
}

/// Ctrl+1 removes the first letter, Ctrl+0 the tenth.
fn slot_for_digit(d: char) -> Option<usize> {
    let n = d.to_digit(10)? as usize;
    Some(if n == 0 { 9 } else { n - 1 })
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphabetic() || ch == '\'' || ch == '-'
}

fn draw(out: &mut impl Write, lines: &[Line]) -> Result<()> {
    queue!(out, Clear(ClearType::All))?;
    for (row, line) in lines.iter().enumerate() {
        queue!(out, MoveTo(0, row as u16))?;
        for span in line {
            match span.color {
                Some(color) => {
                    queue!(out, SetForegroundColor(color), Print(&span.text), ResetColor)?
                }
                None => queue!(out, Print(&span.text))?,
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Screen contents for the current state of a run.
pub fn render_lines(active: &ActiveRun, status: &str) -> Vec<Line> {
    let session = &active.session;
    let mut lines: Vec<Line> = vec![
        vec![
            Span::colored(session.activity.label(), Color::Cyan),
            Span::plain(format!(" - {}", active.list_name)),
            Span::plain(format!(
                "   word {}/{}",
                (session.current_index + 1).min(session.words.len()),
                session.words.len()
            )),
        ],
        Vec::new(),
    ];

    let Some(word) = session.current_word() else {
        lines.push(vec![Span::colored("All done!", Color::Green)]);
        return lines;
    };

    match session.phase {
        Phase::Study => {
            lines.push(vec![
                Span::plain("Study this word: "),
                Span::colored(word.word.clone(), Color::Yellow),
            ]);
            if !word.definition.is_empty() {
                lines.push(vec![Span::plain(format!("  {}", word.definition))]);
            }
            if !word.example.is_empty() {
                lines.push(vec![Span::plain(format!("  \"{}\"", word.example))]);
            }
        }
        Phase::Prompt => {
            lines.push(vec![Span::plain(format!(
                "Get ready to spell a {}-letter word.",
                word.letter_count()
            ))]);
            if !word.definition.is_empty() {
                lines.push(vec![Span::plain(format!("  Hint: {}", word.definition))]);
            }
        }
        Phase::Typing => lines.push(typing_line(session, active.highlight_on)),
        Phase::Feedback => {
            lines.push(typing_line(session, false));
            lines.push(match session.last_correct {
                Some(true) => vec![Span::colored("Correct!", Color::Green)],
                _ => vec![
                    Span::colored("Not quite. The word is ", Color::Red),
                    Span::colored(word.word.clone(), Color::Yellow),
                ],
            });
        }
        Phase::Done => {}
    }

    lines.push(Vec::new());
    if !status.is_empty() {
        lines.push(vec![Span::plain(status)]);
    }
    lines.push(vec![Span::colored(footer(session), Color::DarkGrey)]);
    lines
}

fn typing_line(session: &ActivitySession, highlight_on: bool) -> Line {
    let Some(word) = session.current_word() else {
        return Vec::new();
    };
    let marks = session.letter_marks();
    let mark_color = |slot: usize| -> Option<Color> {
        if !highlight_on {
            return None;
        }
        match marks.get(slot).copied().flatten() {
            Some(true) => Some(Color::Green),
            Some(false) => Some(Color::Red),
            None => None,
        }
    };
    let typed_span = |slot: usize| -> Span {
        match session.typed.get(slot) {
            Some(ch) => Span {
                text: format!("{ch} "),
                color: mark_color(slot),
            },
            None => Span::plain("_ "),
        }
    };

    let mut line = vec![Span::plain("  ")];
    if session.policy().uses_blanks {
        let blanks = session.current_blanks();
        let mut slot = 0;
        for (i, ch) in word.word.chars().enumerate() {
            if blanks.contains(&i) {
                line.push(typed_span(slot));
                slot += 1;
            } else {
                line.push(Span::colored(format!("{ch} "), Color::DarkGrey));
            }
        }
    } else {
        let shown = session.capacity().max(session.typed.len());
        line.extend((0..shown).map(typed_span));
    }
    line
}

fn footer(session: &ActivitySession) -> String {
    match session.phase {
        Phase::Study | Phase::Prompt => {
            "Enter: start spelling   ?: peek   Ctrl+R: start over   Esc: quit".to_string()
        }
        Phase::Typing => {
            "Enter: check   Backspace: delete   Ctrl+N: clear letter N   ?: peek   Esc: quit"
                .to_string()
        }
        Phase::Feedback if session.last_correct == Some(false) && session.policy().allow_retry => {
            "Enter: try again   Esc: quit".to_string()
        }
        Phase::Feedback => "Enter: next word   Esc: quit".to_string(),
        Phase::Done => String::new(),
    }
}
