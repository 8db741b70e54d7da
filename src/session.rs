// Client side of one game session: from the pairing request to the final result.
//
// The server is the sole authority over game state, turn order and clocks. The session
// forwards local moves after checking them against the rules, mirrors confirmed moves and
// keeps both clocks in sync with the deadlines the server sends. Everything the UI needs to
// react to is reported through `NotableEvent`s; everything it needs to draw can be read from
// the session at any time.

use std::collections::VecDeque;
use std::mem;

use enum_map::enum_map;

use crate::altered_game::{AlteredGame, RemoteMoveError, TurnConfirmation};
use crate::board::{Board, TurnError, TurnMove};
use crate::coord::Coord;
use crate::dual_clock::DualClock;
use crate::error::{ConnectionError, ProtocolError};
use crate::event::{ClientMessage, ServerMessage, VictoryReason};
use crate::force::Force;
use crate::oracle::MoveOracle;
use crate::piece::PieceKind;
use crate::rules::TimeControl;
use crate::transport::{ConnectionId, Connector, Transport, TransportEvent};
use crate::utc_time::UtcDateTime;


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PhaseKind {
    Idle,
    Seeking,
    Active,
    Ended,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameOutcome {
    Victory { winner: Force, reason: VictoryReason },
    Draw,
    // Opponent left while we were still waiting for the game to start.
    Cancelled,
    ConnectionLost,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TurnCommandError {
    NoGameInProgress,
    GameOver,
    NotYourTurn,
    PromotionPending,
    NoPromotionPending,
    NotConnected,
    IllegalTurn(TurnError),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PairingError {
    GameInProgress,
    Connection(ConnectionError),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MoveAttempt {
    pub from: Coord,
    pub to: Coord,
    // Free-form user choice: "q", "knight", etc. Anything unrecognized means queen.
    pub promotion: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MoveAttemptOutcome {
    Sent { san: String },
    // The move is a promotion and no piece was chosen. Call `choose_promotion` or
    // `cancel_promotion` to continue.
    AwaitingPromotion,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NotableEvent {
    PairingRequested,
    GameStarted { my_force: Force },
    MoveSent { san: String },
    // Local move was not sent. The piece should be returned to its square.
    MoveRejected(TurnCommandError),
    PromotionRequested { from: Coord, to: Coord },
    PromotionCancelled,
    TurnMade { san: String, colour: Force, confirmation: TurnConfirmation },
    TimeoutClaimed(Force),
    GameOver(GameOutcome),
}

#[derive(Clone, Debug)]
pub struct GameState<O: MoveOracle = Board> {
    my_force: Force,
    my_name: String,
    opponent_name: String,
    // Game state including unconfirmed local changes.
    alt_game: AlteredGame<O>,
    clocks: DualClock,
    // Once set, no further move attempts are accepted.
    abandoned_or_timed_out: bool,
    pending_promotion: Option<(Coord, Coord)>,
}

#[derive(Clone, Debug)]
pub enum Phase<O: MoveOracle = Board> {
    Idle,
    Seeking,
    Active(GameState<O>),
    Ended {
        // `None` if the session ended before a game started.
        game: Option<GameState<O>>,
        outcome: GameOutcome,
        notice_dismissed: bool,
    },
}

pub struct Session<O: MoveOracle = Board> {
    connector: Box<dyn Connector>,
    transport: Option<Box<dyn Transport>>,
    next_connection_id: u64,
    time_control: TimeControl,
    phase: Phase<O>,
    notable_events: VecDeque<NotableEvent>,
}


impl GameOutcome {
    pub fn notice(&self) -> String {
        match self {
            GameOutcome::Victory { winner, reason } => format!("{winner} win by {reason}"),
            GameOutcome::Draw => "Draw".to_owned(),
            GameOutcome::Cancelled => "Opponent left before the game started".to_owned(),
            GameOutcome::ConnectionLost => "Connection lost".to_owned(),
        }
    }
}

impl MoveAttempt {
    pub fn new(from: Coord, to: Coord) -> Self { MoveAttempt { from, to, promotion: None } }
    pub fn with_promotion(from: Coord, to: Coord, choice: &str) -> Self {
        MoveAttempt { from, to, promotion: Some(choice.to_owned()) }
    }
}

impl<O: MoveOracle> GameState<O> {
    pub fn my_force(&self) -> Force { self.my_force }
    pub fn my_name(&self) -> &str { &self.my_name }
    pub fn opponent_name(&self) -> &str { &self.opponent_name }
    pub fn alt_game(&self) -> &AlteredGame<O> { &self.alt_game }
    pub fn clocks(&self) -> &DualClock { &self.clocks }
    pub fn abandoned_or_timed_out(&self) -> bool { self.abandoned_or_timed_out }
    pub fn pending_promotion(&self) -> Option<(Coord, Coord)> { self.pending_promotion }
    pub fn board_encoding(&self) -> String { self.alt_game.local().encoding() }

    pub fn is_my_turn(&self) -> bool { self.alt_game.local().active_force() == self.my_force }

    fn check_can_move(&self) -> Result<(), TurnCommandError> {
        if self.abandoned_or_timed_out || !self.alt_game.local().status().is_active() {
            Err(TurnCommandError::GameOver)
        } else if !self.is_my_turn() {
            Err(TurnCommandError::NotYourTurn)
        } else {
            Ok(())
        }
    }
}

impl<O: MoveOracle> Phase<O> {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Seeking => PhaseKind::Seeking,
            Phase::Active(_) => PhaseKind::Active,
            Phase::Ended { .. } => PhaseKind::Ended,
        }
    }
}

impl<O: MoveOracle> Session<O> {
    pub fn new(connector: Box<dyn Connector>, time_control: TimeControl) -> Self {
        Session {
            connector,
            transport: None,
            next_connection_id: 1,
            time_control,
            phase: Phase::Idle,
            notable_events: VecDeque::new(),
        }
    }

    pub fn phase(&self) -> &Phase<O> { &self.phase }
    pub fn phase_kind(&self) -> PhaseKind { self.phase.kind() }
    pub fn time_control(&self) -> &TimeControl { &self.time_control }
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.transport.as_ref().map(|t| t.connection_id())
    }

    // The current game, or the game that has just finished.
    pub fn game(&self) -> Option<&GameState<O>> {
        match &self.phase {
            Phase::Active(game) => Some(game),
            Phase::Ended { game, .. } => game.as_ref(),
            Phase::Idle | Phase::Seeking => None,
        }
    }
    pub fn outcome(&self) -> Option<&GameOutcome> {
        match &self.phase {
            Phase::Ended { outcome, .. } => Some(outcome),
            Phase::Idle | Phase::Seeking | Phase::Active(_) => None,
        }
    }
    pub fn notice(&self) -> Option<String> {
        match &self.phase {
            Phase::Ended { outcome, notice_dismissed: false, .. } => Some(outcome.notice()),
            _ => None,
        }
    }

    pub fn next_notable_event(&mut self) -> Option<NotableEvent> { self.notable_events.pop_front() }

    pub fn request_pairing(&mut self, now: UtcDateTime) -> Result<(), PairingError> {
        match self.phase {
            Phase::Idle | Phase::Ended { .. } => {}
            Phase::Seeking | Phase::Active(_) => return Err(PairingError::GameInProgress),
        }
        if self.transport.is_none() {
            let connection_id = ConnectionId(self.next_connection_id);
            self.next_connection_id += 1;
            match self.connector.connect(connection_id) {
                Ok(transport) => self.transport = Some(transport),
                Err(err) => {
                    log::warn!("Cannot connect: {err}");
                    self.phase = Phase::Ended {
                        game: None,
                        outcome: GameOutcome::ConnectionLost,
                        notice_dismissed: false,
                    };
                    self.notable_events.push_back(NotableEvent::GameOver(GameOutcome::ConnectionLost));
                    return Err(PairingError::Connection(err));
                }
            }
        }
        log::info!("Looking for an opponent");
        self.phase = Phase::Seeking;
        self.notable_events.push_back(NotableEvent::PairingRequested);
        self.send(ClientMessage::FindOpponent, now).map_err(PairingError::Connection)
    }

    pub fn attempt_move(
        &mut self, attempt: MoveAttempt, now: UtcDateTime,
    ) -> Result<MoveAttemptOutcome, TurnCommandError> {
        let result = self.attempt_move_impl(attempt, now);
        if let Err(err) = &result {
            self.notable_events.push_back(NotableEvent::MoveRejected(err.clone()));
        }
        result
    }

    pub fn choose_promotion(
        &mut self, choice: Option<&str>, now: UtcDateTime,
    ) -> Result<String, TurnCommandError> {
        let result = self.choose_promotion_impl(choice, now);
        if let Err(err) = &result {
            self.notable_events.push_back(NotableEvent::MoveRejected(err.clone()));
        }
        result
    }

    pub fn cancel_promotion(&mut self) {
        if let Phase::Active(game) = &mut self.phase {
            if game.pending_promotion.take().is_some() {
                self.notable_events.push_back(NotableEvent::PromotionCancelled);
            }
        }
    }

    // Squares where the piece from `from` can go. Empty unless a local move is possible now.
    pub fn legal_destinations(&self, from: Coord) -> Vec<Coord> {
        match &self.phase {
            Phase::Active(game)
                if game.check_can_move().is_ok() && game.pending_promotion.is_none() =>
            {
                game.alt_game.local().legal_destinations(from)
            }
            _ => vec![],
        }
    }

    pub fn dismiss_notice(&mut self) {
        if let Phase::Ended { notice_dismissed, .. } = &mut self.phase {
            *notice_dismissed = true;
        }
    }

    // Should be called periodically while a game is active.
    pub fn tick(&mut self, now: UtcDateTime) {
        let Phase::Active(game) = &mut self.phase else {
            return;
        };
        let Some(force) = game.clocks.tick(now) else {
            return;
        };
        self.notable_events.push_back(NotableEvent::TimeoutClaimed(force));
        // Failure is handled inside `send`: it ends the game.
        let _ = self.send(ClientMessage::EndIfTimeout, now);
    }

    pub fn process_transport_event(&mut self, event: TransportEvent, now: UtcDateTime) {
        if self.connection_id() != Some(event.connection_id()) {
            log::debug!("Ignoring event from an old connection: {event:?}");
            return;
        }
        match event {
            TransportEvent::Text { frame, .. } => match ServerMessage::decode(&frame) {
                Ok(message) => self.process_server_message(message, now),
                Err(err) => log::warn!("Ignoring server message: {err}"),
            },
            TransportEvent::NonText { description, .. } => {
                log::warn!("Ignoring server message: {}", ProtocolError::NotText(description));
            }
            TransportEvent::Closed { .. } => {
                log::info!("Connection closed by server");
                self.on_connection_lost(now);
            }
        }
    }

    pub fn process_server_message(&mut self, message: ServerMessage, now: UtcDateTime) {
        match message {
            ServerMessage::Start {
                colour,
                client,
                opponent,
                white_deadline,
                black_deadline,
            } => {
                if !matches!(self.phase, Phase::Seeking) {
                    log::warn!("Ignoring game start: not looking for a game");
                    return;
                }
                let mut clocks = if white_deadline.is_none() && black_deadline.is_none() {
                    DualClock::new(self.time_control.clone())
                } else {
                    let deadlines = enum_map! {
                        Force::White => white_deadline,
                        Force::Black => black_deadline,
                    };
                    DualClock::with_deadlines(self.time_control.clone(), deadlines, now)
                };
                clocks.start(Force::White, white_deadline, now);
                log::info!(
                    "Game started: {client} ({colour}) vs {opponent}, {} per side",
                    self.time_control
                );
                self.phase = Phase::Active(GameState {
                    my_force: colour,
                    my_name: client,
                    opponent_name: opponent,
                    alt_game: AlteredGame::new(),
                    clocks,
                    abandoned_or_timed_out: false,
                    pending_promotion: None,
                });
                self.notable_events.push_back(NotableEvent::GameStarted { my_force: colour });
            }
            ServerMessage::Moved { san, colour, deadline } => {
                let Phase::Active(game) = &mut self.phase else {
                    log::warn!("Ignoring move {san}: no game in progress");
                    return;
                };
                match game.alt_game.apply_remote_move(colour, &san) {
                    Ok(confirmation) => {
                        // The same path serves opponent moves and echoes of our own moves.
                        game.clocks.start(colour.opponent(), deadline, now);
                        if confirmation == TurnConfirmation::Discarded {
                            game.pending_promotion = None;
                        }
                        self.notable_events.push_back(NotableEvent::TurnMade {
                            san,
                            colour,
                            confirmation,
                        });
                    }
                    Err(RemoteMoveError::Stale) => {
                        log::warn!("Ignoring stale move {san} by {colour}");
                    }
                    Err(RemoteMoveError::Invalid(err)) => {
                        log::warn!("Ignoring move {san} by {colour}: {err:?}");
                    }
                }
            }
            ServerMessage::Win { winner_colour, by } => {
                let outcome = GameOutcome::Victory {
                    winner: winner_colour,
                    reason: VictoryReason::from_protocol(&by),
                };
                self.end_game_by_server(outcome, now);
            }
            ServerMessage::Draw => self.end_game_by_server(GameOutcome::Draw, now),
            ServerMessage::Abandoned => {
                let outcome = match &self.phase {
                    Phase::Active(game) => GameOutcome::Victory {
                        winner: game.my_force,
                        reason: VictoryReason::Abandonment,
                    },
                    Phase::Idle | Phase::Seeking | Phase::Ended { .. } => GameOutcome::Cancelled,
                };
                self.end_game_by_server(outcome, now);
            }
        }
    }

    fn attempt_move_impl(
        &mut self, attempt: MoveAttempt, now: UtcDateTime,
    ) -> Result<MoveAttemptOutcome, TurnCommandError> {
        let game = match &mut self.phase {
            Phase::Active(game) => game,
            Phase::Ended { .. } => return Err(TurnCommandError::GameOver),
            Phase::Idle | Phase::Seeking => return Err(TurnCommandError::NoGameInProgress),
        };
        game.check_can_move()?;
        if game.pending_promotion.is_some() {
            return Err(TurnCommandError::PromotionPending);
        }
        let MoveAttempt { from, to, promotion } = attempt;
        let promote_to = if game.alt_game.local().is_promotion(from, to) {
            match promotion {
                Some(choice) => {
                    Some(PieceKind::from_promotion_choice(&choice).unwrap_or(PieceKind::Queen))
                }
                None => {
                    game.pending_promotion = Some((from, to));
                    self.notable_events.push_back(NotableEvent::PromotionRequested { from, to });
                    return Ok(MoveAttemptOutcome::AwaitingPromotion);
                }
            }
        } else {
            None
        };
        let san = self.send_move(TurnMove { from, to, promote_to }, now)?;
        Ok(MoveAttemptOutcome::Sent { san })
    }

    fn choose_promotion_impl(
        &mut self, choice: Option<&str>, now: UtcDateTime,
    ) -> Result<String, TurnCommandError> {
        let Phase::Active(game) = &mut self.phase else {
            return Err(TurnCommandError::NoPromotionPending);
        };
        let (from, to) = game.pending_promotion.take().ok_or(TurnCommandError::NoPromotionPending)?;
        let promote_to = choice.and_then(PieceKind::from_promotion_choice).unwrap_or(PieceKind::Queen);
        self.send_move(TurnMove { from, to, promote_to: Some(promote_to) }, now)
    }

    fn send_move(&mut self, mv: TurnMove, now: UtcDateTime) -> Result<String, TurnCommandError> {
        let Phase::Active(game) = &mut self.phase else {
            return Err(TurnCommandError::NoGameInProgress);
        };
        let san = game.alt_game.try_local_move(mv).map_err(TurnCommandError::IllegalTurn)?;
        // Only our clock is stopped. The opponent's clock starts when the server confirms the
        // move and tells us the opponent's deadline.
        game.clocks.stop(game.my_force, now);
        self.send(ClientMessage::Move { san: san.clone() }, now)
            .map_err(|_| TurnCommandError::NotConnected)?;
        self.notable_events.push_back(NotableEvent::MoveSent { san: san.clone() });
        Ok(san)
    }

    fn send(&mut self, message: ClientMessage, now: UtcDateTime) -> Result<(), ConnectionError> {
        let Some(transport) = self.transport.as_mut() else {
            self.on_connection_lost(now);
            return Err(ConnectionError::Closed);
        };
        if let Err(err) = transport.send(&message) {
            log::warn!("Cannot send {message:?}: {err}");
            self.on_connection_lost(now);
            return Err(err);
        }
        Ok(())
    }

    fn on_connection_lost(&mut self, now: UtcDateTime) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        match self.phase {
            Phase::Seeking | Phase::Active(_) => self.end_game(GameOutcome::ConnectionLost, now),
            Phase::Idle | Phase::Ended { .. } => {}
        }
    }

    fn end_game_by_server(&mut self, outcome: GameOutcome, now: UtcDateTime) {
        match self.phase {
            Phase::Seeking | Phase::Active(_) => self.end_game(outcome, now),
            Phase::Idle | Phase::Ended { .. } => {
                log::warn!("Ignoring game result {outcome:?}: no game in progress");
            }
        }
    }

    fn end_game(&mut self, outcome: GameOutcome, now: UtcDateTime) {
        let game = match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Active(mut game) => {
                game.clocks.stop_all(now);
                game.abandoned_or_timed_out = true;
                game.pending_promotion = None;
                Some(game)
            }
            Phase::Seeking => None,
            phase @ (Phase::Idle | Phase::Ended { .. }) => {
                self.phase = phase;
                return;
            }
        };
        log::info!("Game over: {}", outcome.notice());
        self.phase = Phase::Ended {
            game,
            outcome: outcome.clone(),
            notice_dismissed: false,
        };
        self.notable_events.push_back(NotableEvent::GameOver(outcome));
    }
}
