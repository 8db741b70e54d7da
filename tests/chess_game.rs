mod common;

use common::*;
use duel_chess::board::{Board, ChessGameStatus, DrawReason, TurnError};
use duel_chess::coord;
use duel_chess::fen::{STARTING_POSITION_FEN, board_to_fen};
use duel_chess::force::Force;
use duel_chess::oracle::MoveOracle;
use pretty_assertions::assert_eq;


#[test]
fn capture_notation() {
    // Capture marks + capture = ok.
    replay_log_from_start("1.Nc3 d5 2.Nxd5").unwrap();
    replay_log_from_start("1.e4 d5 2.exd5").unwrap();
    replay_log_from_start("1.e4 Nc6 2.e5 d5 3.exd6").unwrap();

    // No capture marks + capture = ok (capture mark is optional).
    replay_log_from_start("1.Nc3 d5 2.Nd5").unwrap();
    replay_log_from_start("1.e4 Nc6 2.e5 d5 3.ed6").unwrap();

    // Capture marks + no capture = fail (capture mark requires capture).
    assert_eq!(
        replay_log_from_start("1.Nxf3").unwrap_err(),
        TurnError::CaptureNotationRequiresCapture
    );
}

#[test]
fn wikipedia_example() {
    let board = replay_log_from_start("
        1.Nf3 Nf6 2.c4 g6 3.Nc3 Bg7 4.d4 O-O 5.Bf4 d5
        6.Qb3 dxc4 7.Qxc4 c6 8.e4 Nbd7 9.Rd1 Nb6 10.Qc5 Bg4
        11.Bg5 Na4 12.Qa3 Nxc3 13.bxc3 Nxe4 14.Bxe7 Qb6 15.Bc4 Nxc3
        16.Bc5 Rfe8+ 17.Kf1 Be6 18.Bxb6 Bxc4+ 19.Kg1 Ne2+ 20.Kf1 Nxd4+
        21.Kg1 Ne2+ 22.Kf1 Nc3+ 23.Kg1 axb6 24.Qb4 Ra4 25.Qxb6 Nxd1
        26.h3 Rxa2 27.Kh2 Nxf2 28.Re1 Rxe1 29.Qd8+ Bf8 30.Nxe1 Bd5
        31.Nf3 Ne4 32.Qb8 b5 33.h4 h5 34.Ne5 Kg7 35.Kg1 Bc5+
        36.Kf1 Ng3+ 37.Ke1 Bb4+ 38.Kd1 Bb3+ 39.Kc1 Ne2+ 40.Kb1 Nc3+
        41.Kc1 Rc2#
    ").unwrap();
    assert_eq!(board.status(), ChessGameStatus::Checkmate { winner: Force::Black });
    assert!(board.grid()[coord!(c2)].is(piece!(Black Rook)));
    assert!(board.grid()[coord!(c1)].is(piece!(White King)));
}

#[test]
fn game_over_rejects_moves() {
    let mut board = replay_log_from_start("1.f3 e5 2.g4 Qh4#").unwrap();
    assert_eq!(board.try_turn_algebraic("a3").unwrap_err(), TurnError::GameOver);
}

#[test]
fn stalemate() {
    // Shortest known stalemate (Sam Loyd).
    let board = replay_log_from_start("
        1.e3 a5 2.Qh5 Ra6 3.Qxa5 h5 4.h4 Rah6 5.Qxc7 f6 6.Qxd7+ Kf7
        7.Qxb7 Qd3 8.Qxb8 Qh7 9.Qxc8 Kg6 10.Qe6
    ").unwrap();
    assert_eq!(board.status(), ChessGameStatus::Draw(DrawReason::Stalemate));
}

// Replaying the same moves through the oracle interface (the way the session sees them)
// yields the same position as replaying the notation directly.
#[test]
fn oracle_replay_consistency() {
    let log = "e4 e5 Nf3 Nc6 Bb5 a6 Ba4 Nf6 O-O Be7 Re1 b5 Bb3 d6 c3 O-O h3 Nb8 d4 Nbd7";
    let expected = replay_log_from_start(log).unwrap();

    let mut local = <Board as MoveOracle>::starting_position();
    let mut confirmed = Board::starting_position();
    for san in log.split_whitespace() {
        let mv = confirmed.algebraic_to_turn(san).unwrap();
        let local_san = local.apply_move(mv).unwrap();
        assert_eq!(local_san, san);
        confirmed.apply_algebraic(&local_san).unwrap();
        assert_eq!(local.encoding(), confirmed.encoding());
    }
    assert_eq!(local.encoding(), board_to_fen(&expected));
    assert_ne!(local.encoding(), STARTING_POSITION_FEN);
}
