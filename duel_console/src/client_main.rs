// Improvement potential. Support mouse input: click on a piece to see the hint, click on a
//   destination square to move.

use std::fmt;
use std::io;
use std::mem;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::bail;
use crossterm::style::{self, Stylize};
use crossterm::{cursor, event as term_event, execute, terminal};
use duel_chess::coord::Coord;
use duel_chess::presentation::Presenter;
use duel_chess::session::{
    MoveAttempt, MoveAttemptOutcome, NotableEvent, PairingError, PhaseKind, Session,
    TurnCommandError,
};
use duel_chess::ticker::Ticker;
use duel_chess::transport::TransportEvent;
use duel_chess::{TimeControl, UtcDateTime};
use scopeguard::defer;

use crate::network;
use crate::tui::{TerminalBoard, TerminalControls};


const TICK_INTERVAL: Duration = Duration::from_millis(100);


pub struct ClientConfig {
    pub server_address: String,
}

pub enum IncomingEvent {
    Network(TransportEvent),
    Terminal(term_event::Event),
    Tick,
}

enum CommandOutcome {
    Continue,
    Quit,
}

type TuiPresenter = Presenter<TerminalBoard, TerminalControls>;


fn writeln_raw(stdout: &mut io::Stdout, v: impl fmt::Display) -> io::Result<()> {
    let s = v.to_string();
    // Note. Not using `lines()` because it removes trailing new line.
    for line in s.split('\n') {
        execute!(
            stdout,
            style::Print(line),
            terminal::Clear(terminal::ClearType::UntilNewLine),
            cursor::MoveToNextLine(1),
            cursor::Hide
        )?;
    }
    Ok(())
}

fn render(
    stdout: &mut io::Stdout, presenter: &mut TuiPresenter, keyboard_input: &str,
    command_error: &Option<String>,
) -> io::Result<()> {
    if presenter.widget_mut().take_needs_clear() {
        execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    }
    execute!(stdout, cursor::MoveTo(0, 0))?;
    writeln_raw(stdout, presenter.controls().top())?;
    writeln_raw(stdout, presenter.widget().render())?;
    writeln_raw(stdout, presenter.controls().bottom())?;
    writeln_raw(stdout, "")?;
    let input_enabled = presenter.last_view().is_some_and(|view| {
        view.promotion_prompt.is_some() || view.board.as_ref().is_some_and(|board| board.input_enabled)
    });
    let input_style = if input_enabled { style::Color::White } else { style::Color::DarkGrey };
    writeln_raw(stdout, format!("> {keyboard_input}▂").with(input_style))?;
    for line in presenter.controls().footer() {
        writeln_raw(stdout, line)?;
    }
    if let Some(err) = command_error {
        writeln_raw(stdout, err.clone().with(style::Color::Red))?;
    }
    // Note. Don't clear the whole screen on every frame to avoid blinking.
    execute!(stdout, terminal::Clear(terminal::ClearType::FromCursorDown))?;
    Ok(())
}

// Parses "e2e4" or "e7e8q".
fn parse_coordinate_move(input: &str) -> Option<MoveAttempt> {
    if !input.is_ascii() || !(4..=5).contains(&input.len()) {
        return None;
    }
    let from = Coord::from_algebraic(&input[0..2])?;
    let to = Coord::from_algebraic(&input[2..4])?;
    Some(match input.get(4..) {
        Some(choice) if !choice.is_empty() => MoveAttempt::with_promotion(from, to, choice),
        _ => MoveAttempt::new(from, to),
    })
}

fn parse_move(session: &Session, input: &str) -> Result<MoveAttempt, String> {
    if let Some(attempt) = parse_coordinate_move(input) {
        return Ok(attempt);
    }
    let game = session.game().ok_or_else(|| "Cannot make turn: no game in progress".to_owned())?;
    let turn = game
        .alt_game()
        .local()
        .algebraic_to_turn(input)
        .map_err(|err| format!("Illegal turn '{input}': {err:?}"))?;
    Ok(match turn.promote_to {
        Some(kind) => MoveAttempt::with_promotion(
            turn.from,
            turn.to,
            &kind.to_full_algebraic().to_string(),
        ),
        None => MoveAttempt::new(turn.from, turn.to),
    })
}

fn describe_turn_error(input: &str, err: &TurnCommandError) -> String {
    match err {
        TurnCommandError::NoGameInProgress => "Cannot make turn: no game in progress".to_owned(),
        TurnCommandError::GameOver => "Cannot make turn: the game is over".to_owned(),
        TurnCommandError::NotYourTurn => "Wait for your turn".to_owned(),
        TurnCommandError::PromotionPending => "Choose a piece to promote to first".to_owned(),
        TurnCommandError::NoPromotionPending => "Nothing to promote".to_owned(),
        TurnCommandError::NotConnected => "Cannot make turn: not connected".to_owned(),
        TurnCommandError::IllegalTurn(err) => format!("Illegal turn '{input}': {err:?}"),
    }
}

fn execute_input(
    session: &mut Session, presenter: &mut TuiPresenter, input: &str, now: UtcDateTime,
) -> Result<CommandOutcome, String> {
    let input = input.trim();
    let promotion_pending = session.game().is_some_and(|game| game.pending_promotion().is_some());
    if let Some(cmd) = input.strip_prefix('/') {
        let mut words = cmd.split_whitespace();
        match (words.next(), words.next()) {
            (Some("quit"), None) => return Ok(CommandOutcome::Quit),
            (Some("play"), None) => match session.request_pairing(now) {
                Ok(()) => {}
                Err(PairingError::GameInProgress) => return Err("Already playing".to_owned()),
                Err(PairingError::Connection(err)) => return Err(format!("Cannot play: {err}")),
            },
            (Some("dismiss"), None) => session.dismiss_notice(),
            (Some("hint"), Some(square)) => {
                let from = Coord::from_algebraic(square)
                    .ok_or_else(|| format!("Not a square: '{square}'"))?;
                presenter.widget_mut().set_highlighted(session.legal_destinations(from));
            }
            _ => return Err(format!("Unknown command: '{cmd}'")),
        }
    } else if promotion_pending {
        let choice = if input.is_empty() { None } else { Some(input) };
        session.choose_promotion(choice, now).map_err(|err| describe_turn_error(input, &err))?;
    } else if !input.is_empty() {
        let attempt = parse_move(session, input)?;
        match session.attempt_move(attempt, now) {
            Ok(MoveAttemptOutcome::Sent { .. } | MoveAttemptOutcome::AwaitingPromotion) => {}
            Err(err) => return Err(describe_turn_error(input, &err)),
        }
    }
    Ok(CommandOutcome::Continue)
}

pub fn run(config: ClientConfig) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel();
    let connector = network::WebSocketConnector::new(config.server_address, tx.clone());
    let mut session: Session = Session::new(Box::new(connector), TimeControl::default());
    let mut presenter = Presenter::new(TerminalBoard::new(), TerminalControls::new());

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
    defer! {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), terminal::LeaveAlternateScreen, cursor::Show);
    };

    let tx_local = tx.clone();
    thread::spawn(move || {
        loop {
            match term_event::read() {
                Ok(ev) => {
                    if tx_local.send(IncomingEvent::Terminal(ev)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    log::error!("Cannot read terminal input: {err}");
                    return;
                }
            }
        }
    });

    // Only exists while a game is active, so that no ticks reach a finished game.
    let mut ticker: Option<Ticker> = None;
    let mut keyboard_input = String::new();
    let mut command_error = None;
    presenter.update(&session, UtcDateTime::now());
    render(&mut stdout, &mut presenter, &keyboard_input, &command_error)?;
    for event in &rx {
        let now = UtcDateTime::now();
        match event {
            IncomingEvent::Network(event) => session.process_transport_event(event, now),
            IncomingEvent::Terminal(term_event::Event::Key(event)) => {
                if event.kind != term_event::KeyEventKind::Press {
                    continue;
                }
                match event.code {
                    term_event::KeyCode::Char(ch) => keyboard_input.push(ch),
                    term_event::KeyCode::Backspace => {
                        keyboard_input.pop();
                    }
                    term_event::KeyCode::Esc => session.cancel_promotion(),
                    term_event::KeyCode::Enter => {
                        let input = mem::take(&mut keyboard_input);
                        command_error = None;
                        match execute_input(&mut session, &mut presenter, &input, now) {
                            Ok(CommandOutcome::Continue) => {}
                            Ok(CommandOutcome::Quit) => return Ok(()),
                            Err(err) => command_error = Some(err),
                        }
                    }
                    _ => {}
                }
            }
            IncomingEvent::Terminal(term_event::Event::Resize(..)) => presenter.on_resize(),
            IncomingEvent::Terminal(_) => {}
            IncomingEvent::Tick => session.tick(now),
        }
        while let Some(event) = session.next_notable_event() {
            presenter.on_notable_event(&event);
            match event {
                NotableEvent::MoveSent { .. } | NotableEvent::TurnMade { .. } => {
                    presenter.widget_mut().set_highlighted(vec![]);
                }
                NotableEvent::TimeoutClaimed(force) => {
                    log::info!("Claimed timeout for {force}");
                }
                NotableEvent::PairingRequested
                | NotableEvent::GameStarted { .. }
                | NotableEvent::MoveRejected(_)
                | NotableEvent::PromotionRequested { .. }
                | NotableEvent::PromotionCancelled
                | NotableEvent::GameOver(_) => {}
            }
        }
        match (session.phase_kind(), ticker.is_some()) {
            (PhaseKind::Active, false) => {
                let tx_tick = tx.clone();
                ticker = Some(Ticker::start(TICK_INTERVAL, move || {
                    tx_tick.send(IncomingEvent::Tick).is_ok()
                }));
            }
            (PhaseKind::Idle | PhaseKind::Seeking | PhaseKind::Ended, true) => ticker = None,
            _ => {}
        }
        presenter.update(&session, now);
        render(&mut stdout, &mut presenter, &keyboard_input, &command_error)?;
    }
    bail!("Unexpected end of events stream");
}
