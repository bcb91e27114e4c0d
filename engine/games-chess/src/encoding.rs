//! Evaluator input encoding and policy indexing.
//!
//! The model sees a `(variants, 17, 8, 8)` tensor. Channel 0 carries the side
//! to move (+1 white / -1 black, negated in the rank-flipped variants), and
//! channels 1..=16 are one-hot piece planes:
//!
//! ```text
//!  1..=6   white pawn, knight, bishop, rook, queen, king
//!  7 / 8   white rook / king that still carry castling rights
//!  9..=14  black pawn .. king
//! 15 / 16  black rook / king that still carry castling rights
//! ```
//!
//! Variants are the four board reflections: identity, files mirrored, ranks
//! mirrored (colours swapped), and both. The policy index of a move is
//! `from * 64 + to`, remapped through the same reflection.

use shakmaty::uci::UciMove;
use shakmaty::{Chess, Color, Position, Role, Square};

/// Number of reflection variants in one evaluator input.
pub const NUM_VARIANTS: usize = 4;

/// Planes per variant.
pub const CHANNELS: usize = 17;

/// Floats per variant.
pub const INPUT_SIZE: usize = CHANNELS * 64;

/// Policy entries per variant (`from_square * 64 + to_square`).
pub const POLICY_SIZE: usize = 64 * 64;

const UNMOVED_ROOK: usize = 7;
const UNMOVED_KING: usize = 8;
const BLACK_OFFSET: usize = 8;

fn role_channel(role: Role) -> usize {
    match role {
        Role::Pawn => 1,
        Role::Knight => 2,
        Role::Bishop => 3,
        Role::Rook => 4,
        Role::Queen => 5,
        Role::King => 6,
    }
}

/// Per-square channel ids (0 = empty), indexed by square (a1 = 0, h8 = 63).
pub fn channel_array(pos: &Chess) -> [usize; 64] {
    let mut channels = [0usize; 64];
    let board = pos.board();
    for (i, slot) in channels.iter_mut().enumerate() {
        let sq = Square::new(i as u32);
        if let Some(piece) = board.piece_at(sq) {
            let offset = match piece.color {
                Color::White => 0,
                Color::Black => BLACK_OFFSET,
            };
            *slot = role_channel(piece.role) + offset;
        }
    }

    let rights = pos.castles().castling_rights();
    for (rook, king, offset) in [
        (Square::A1, Square::E1, 0),
        (Square::H1, Square::E1, 0),
        (Square::A8, Square::E8, BLACK_OFFSET),
        (Square::H8, Square::E8, BLACK_OFFSET),
    ] {
        if rights.contains(rook) {
            channels[rook as usize] = UNMOVED_ROOK + offset;
            channels[king as usize] = UNMOVED_KING + offset;
        }
    }
    channels
}

/// Map a square through a reflection variant.
#[inline]
fn reflect(square: usize, variant: usize) -> usize {
    let mut sq = square;
    if variant % 2 == 1 {
        sq ^= 7; // mirror files
    }
    if variant >= 2 {
        sq ^= 56; // mirror ranks
    }
    sq
}

#[inline]
fn swap_colors(channel: usize) -> usize {
    if channel > BLACK_OFFSET {
        channel - BLACK_OFFSET
    } else {
        channel + BLACK_OFFSET
    }
}

/// Encode all four reflection variants, flattened as `[variant][channel][rank][file]`.
pub fn model_input(pos: &Chess) -> Vec<f32> {
    let channels = channel_array(pos);
    let mut out = vec![0.0f32; NUM_VARIANTS * INPUT_SIZE];
    let white_to_move = pos.turn() == Color::White;

    for variant in 0..NUM_VARIANTS {
        let base = variant * INPUT_SIZE;
        let flipped = variant >= 2;

        let side = if white_to_move != flipped { 1.0 } else { -1.0 };
        out[base..base + 64].fill(side);

        for (sq, &channel) in channels.iter().enumerate() {
            if channel == 0 {
                continue;
            }
            let channel = if flipped {
                swap_colors(channel)
            } else {
                channel
            };
            out[base + channel * 64 + reflect(sq, variant)] = 1.0;
        }
    }
    out
}

/// Policy index of `mv` under `variant`, or `None` for the null move.
pub fn policy_index(mv: &UciMove, variant: usize) -> Option<usize> {
    match mv {
        UciMove::Normal { from, to, .. } => {
            let from = reflect(*from as usize, variant);
            let to = reflect(*to as usize, variant);
            Some(from * 64 + to)
        }
        UciMove::Put { .. } | UciMove::Null => None,
    }
}
