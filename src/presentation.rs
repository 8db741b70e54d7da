// Maps session state onto the UI. `SessionView` is a pure function of the session and the
// current time: projecting the same state twice yields the same view. Apart from the last
// rendered view, the only state kept outside the session is what the board widget holds.

use crate::clock::{ClockShowing, LowTimeLevel};
use crate::coord::Coord;
use crate::force::Force;
use crate::oracle::MoveOracle;
use crate::session::{NotableEvent, Phase, Session};
use crate::utc_time::UtcDateTime;


pub trait BoardWidget {
    // Orientation the widget was constructed with, `None` before the first `construct`.
    fn orientation(&self) -> Option<Force>;
    fn construct(&mut self, orientation: Force, encoding: &str);
    fn redraw(&mut self, encoding: &str);
    // Removes the board. `orientation` returns `None` afterwards.
    fn clear(&mut self);
    // Returns a dragged piece to where it came from after a rejected drop.
    fn snapback(&mut self);
    fn resize(&mut self);
}

pub trait Controls {
    fn render(&mut self, view: &SessionView);
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ActionControlView {
    pub visible: bool,
    pub enabled: bool,
    pub busy: bool,
    pub label: &'static str,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ClockView {
    pub text: String,
    pub is_active: bool,
    pub out_of_time: bool,
    pub low_time_level: LowTimeLevel,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BoardView {
    pub orientation: Force,
    pub encoding: String,
    pub input_enabled: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SessionView {
    pub action: ActionControlView,
    pub my_label: Option<String>,
    pub opponent_label: Option<String>,
    pub my_clock: Option<ClockView>,
    pub opponent_clock: Option<ClockView>,
    pub board: Option<BoardView>,
    pub notice: Option<String>,
    pub promotion_prompt: Option<(Coord, Coord)>,
}

impl From<ClockShowing> for ClockView {
    fn from(showing: ClockShowing) -> Self {
        ClockView {
            text: showing.ui_string(),
            is_active: showing.is_active,
            out_of_time: showing.out_of_time,
            low_time_level: showing.low_time_level,
        }
    }
}

fn action_control<O: MoveOracle>(phase: &Phase<O>) -> ActionControlView {
    match phase {
        Phase::Idle => ActionControlView {
            visible: true,
            enabled: true,
            busy: false,
            label: "Find opponent",
        },
        Phase::Seeking => ActionControlView {
            visible: true,
            enabled: false,
            busy: true,
            label: "Finding opponent...",
        },
        Phase::Active(_) => ActionControlView {
            visible: false,
            enabled: false,
            busy: false,
            label: "",
        },
        Phase::Ended { .. } => ActionControlView {
            visible: true,
            enabled: true,
            busy: false,
            label: "Play Again",
        },
    }
}

pub fn project<O: MoveOracle>(session: &Session<O>, now: UtcDateTime) -> SessionView {
    let action = action_control(session.phase());
    let notice = session.notice();
    let Some(game) = session.game() else {
        return SessionView {
            action,
            my_label: None,
            opponent_label: None,
            my_clock: None,
            opponent_clock: None,
            board: None,
            notice,
            promotion_prompt: None,
        };
    };
    let my_force = game.my_force();
    let input_enabled = matches!(session.phase(), Phase::Active(_))
        && game.is_my_turn()
        && !game.abandoned_or_timed_out()
        && game.pending_promotion().is_none();
    SessionView {
        action,
        my_label: Some(format!("You ({})", game.my_name())),
        opponent_label: Some(game.opponent_name().to_owned()),
        my_clock: Some(game.clocks().clock(my_force).showing(now).into()),
        opponent_clock: Some(game.clocks().clock(my_force.opponent()).showing(now).into()),
        board: Some(BoardView {
            orientation: my_force,
            encoding: game.board_encoding(),
            input_enabled,
        }),
        notice,
        promotion_prompt: game.pending_promotion(),
    }
}

// Owns the board widget and the controls and keeps them in sync with the session.
pub struct Presenter<W: BoardWidget, C: Controls> {
    widget: W,
    controls: C,
    last_view: Option<SessionView>,
}

impl<W: BoardWidget, C: Controls> Presenter<W, C> {
    pub fn new(widget: W, controls: C) -> Self { Presenter { widget, controls, last_view: None } }

    pub fn widget(&self) -> &W { &self.widget }
    pub fn widget_mut(&mut self) -> &mut W { &mut self.widget }
    pub fn controls(&self) -> &C { &self.controls }
    pub fn last_view(&self) -> Option<&SessionView> { self.last_view.as_ref() }

    pub fn update<O: MoveOracle>(&mut self, session: &Session<O>, now: UtcDateTime) {
        let view = project(session, now);
        self.present(view);
    }

    // Pushes the view to the widget and the controls. The widget is reconstructed when the
    // orientation changes, i.e. when a new game starts with a different colour, and cleared
    // when there is no game to show.
    pub fn present(&mut self, view: SessionView) {
        match &view.board {
            Some(board) => {
                if self.widget.orientation() == Some(board.orientation) {
                    self.widget.redraw(&board.encoding);
                } else {
                    self.widget.construct(board.orientation, &board.encoding);
                }
            }
            None => {
                if self.widget.orientation().is_some() {
                    self.widget.clear();
                }
            }
        }
        self.controls.render(&view);
        self.last_view = Some(view);
    }

    // Reacts to events that are not visible in the state alone.
    pub fn on_notable_event(&mut self, event: &NotableEvent) {
        match event {
            NotableEvent::MoveRejected(_) | NotableEvent::PromotionCancelled => self.widget.snapback(),
            NotableEvent::PairingRequested
            | NotableEvent::GameStarted { .. }
            | NotableEvent::MoveSent { .. }
            | NotableEvent::PromotionRequested { .. }
            | NotableEvent::TurnMade { .. }
            | NotableEvent::TimeoutClaimed(_)
            | NotableEvent::GameOver(_) => {}
        }
    }

    pub fn on_resize(&mut self) { self.widget.resize(); }
}
