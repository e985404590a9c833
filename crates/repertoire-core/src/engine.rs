//! Position engine used to replay repertoire moves.
//!
//! The tree only stores [`MoveDescriptor`]s. Anything that needs a real
//! position (FENs for comments, deep links) goes through a [`Board`], which
//! is cheap to clone so side lines can be explored on a copy.

use serde::{Deserialize, Serialize};
use shakmaty::{
    fen::Fen, san::SanPlus, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, Move,
    Position,
};

use crate::error::RepertoireError;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

/// A move as it was applied to the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDescriptor {
    pub color: Side,
    pub from: String,
    pub to: String,
    pub san: String,
    /// Long algebraic notation (`e2e4`), the per-branch child key.
    pub lan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<char>,
}

/// Board simulator consumed by the serializer and the FEN index.
pub trait Board: Clone {
    fn fen(&self) -> String;

    /// Apply a move that was already validated when it entered the tree.
    fn play(&mut self, mv: &MoveDescriptor) -> Result<(), RepertoireError>;

    fn legal_moves(&self) -> Vec<MoveDescriptor>;
}

/// [`Board`] backed by shakmaty.
#[derive(Debug, Clone, Default)]
pub struct ChessBoard {
    pos: Chess,
}

impl ChessBoard {
    pub fn from_fen(fen: &str) -> Result<Self, RepertoireError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|e| RepertoireError::InvalidFen(format!("{fen}: {e}")))?;
        let pos = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| RepertoireError::InvalidFen(format!("{fen}: {e}")))?;
        Ok(Self { pos })
    }

    pub fn side_to_move(&self) -> Side {
        self.pos.turn().into()
    }

    /// Resolve a SAN token (check markers allowed) in the current position.
    pub fn describe_san(&self, san: &str) -> Result<MoveDescriptor, RepertoireError> {
        let illegal = || RepertoireError::IllegalSan {
            san: san.to_string(),
            fen: self.fen(),
        };
        let san_plus: SanPlus = san.trim().parse().map_err(|_| illegal())?;
        let mv = san_plus.san.to_move(&self.pos).map_err(|_| illegal())?;
        Ok(describe(&self.pos, mv))
    }

    pub fn describe_uci(&self, lan: &str) -> Result<MoveDescriptor, RepertoireError> {
        let mv = self.resolve_uci(lan)?;
        Ok(describe(&self.pos, mv))
    }

    /// Play a SAN move and return its descriptor.
    pub fn play_san(&mut self, san: &str) -> Result<MoveDescriptor, RepertoireError> {
        let descriptor = self.describe_san(san)?;
        self.play(&descriptor)?;
        Ok(descriptor)
    }

    fn resolve_uci(&self, lan: &str) -> Result<Move, RepertoireError> {
        let illegal = || RepertoireError::IllegalMove {
            lan: lan.to_string(),
            fen: self.fen(),
        };
        let uci: UciMove = lan.parse().map_err(|_| illegal())?;
        uci.to_move(&self.pos).map_err(|_| illegal())
    }
}

impl Board for ChessBoard {
    fn fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    fn play(&mut self, mv: &MoveDescriptor) -> Result<(), RepertoireError> {
        let legal = self.resolve_uci(&mv.lan)?;
        self.pos.play_unchecked(legal);
        Ok(())
    }

    fn legal_moves(&self) -> Vec<MoveDescriptor> {
        self.pos
            .legal_moves()
            .into_iter()
            .map(|m| describe(&self.pos, m))
            .collect()
    }
}

fn describe(pos: &Chess, mv: Move) -> MoveDescriptor {
    let san = SanPlus::from_move(pos.clone(), mv.clone()).to_string();
    let lan = mv.clone().to_uci(CastlingMode::Standard).to_string();
    MoveDescriptor {
        color: pos.turn().into(),
        from: lan.get(0..2).unwrap_or_default().to_string(),
        to: lan.get(2..4).unwrap_or_default().to_string(),
        san,
        promotion: mv.promotion().map(|role| role.char()),
        lan,
    }
}
