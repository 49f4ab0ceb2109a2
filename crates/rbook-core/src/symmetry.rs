//! 対称変換と正規化
//!
//! ブックは各局面の D4 対称類のうち辞書順最小の代表形だけを持つ。
//! 生成した局面をブックと照合するには正規形へ写し、得られた指し手を
//! 元の盤の向きへ戻す必要がある。ここでは盤面（u64 ペア）と指し手番号の
//! 両方に対する8変換と、その正規化・逆変換を提供する。

use crate::bitboard;
use crate::types::Move;

/// D4 の8変換
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
    FlipVertical,
    FlipHorizontal,
    FlipDiagA1H8,
    FlipDiagA8H1,
}

impl Transform {
    /// 正規化で試す順。identity は初期値として別扱い
    const CANDIDATES: [Transform; 7] = [
        Transform::Rotate90,
        Transform::Rotate180,
        Transform::Rotate270,
        Transform::FlipVertical,
        Transform::FlipHorizontal,
        Transform::FlipDiagA1H8,
        Transform::FlipDiagA8H1,
    ];

    /// 盤面へ適用する
    #[inline]
    pub const fn apply_board(self, x: u64) -> u64 {
        match self {
            Transform::Identity => x,
            Transform::Rotate90 => bitboard::rotate_90(x),
            Transform::Rotate180 => bitboard::rotate_180(x),
            Transform::Rotate270 => bitboard::rotate_270(x),
            Transform::FlipVertical => bitboard::flip_vertical(x),
            Transform::FlipHorizontal => bitboard::flip_horizontal(x),
            Transform::FlipDiagA1H8 => bitboard::flip_diag_a1h8(x),
            Transform::FlipDiagA8H1 => bitboard::flip_diag_a8h1(x),
        }
    }

    /// 逆変換。90度と270度が互いの逆、それ以外は自己逆
    #[inline]
    pub const fn inverse(self) -> Transform {
        match self {
            Transform::Rotate90 => Transform::Rotate270,
            Transform::Rotate270 => Transform::Rotate90,
            other => other,
        }
    }

    /// 指し手番号へ適用する。パスと「なし」はそのまま通す
    #[inline]
    pub const fn apply_move(self, mv: Move) -> Move {
        if !mv.is_square() {
            return mv;
        }
        let m = mv.index();
        let v = match self {
            Transform::Identity => m,
            Transform::Rotate90 => (m % 8) * 8 + (7 - m / 8),
            Transform::Rotate180 => 63 - m,
            Transform::Rotate270 => (7 - m % 8) * 8 + m / 8,
            Transform::FlipVertical => (7 - m / 8) * 8 + m % 8,
            Transform::FlipHorizontal => (m / 8) * 8 + (7 - m % 8),
            Transform::FlipDiagA1H8 => (m % 8) * 8 + m / 8,
            Transform::FlipDiagA8H1 => (7 - m % 8) * 8 + (7 - m / 8),
        };
        Move::new(v)
    }

    /// 指し手番号へ逆変換を適用する（非正規化）
    #[inline]
    pub const fn invert_move(self, mv: Move) -> Move {
        self.inverse().apply_move(mv)
    }

    /// ログ用の変換名
    pub const fn name(self) -> &'static str {
        match self {
            Transform::Identity => "identity",
            Transform::Rotate90 => "rotate_90",
            Transform::Rotate180 => "rotate_180",
            Transform::Rotate270 => "rotate_270",
            Transform::FlipVertical => "flip_vertical",
            Transform::FlipHorizontal => "flip_horizontal",
            Transform::FlipDiagA1H8 => "flip_diag_a1h8",
            Transform::FlipDiagA8H1 => "flip_diag_a8h1",
        }
    }
}

/// (my, opp) の8変換のうち辞書順最小のペアと、そこへ至る変換を返す。
/// 同値のときは先に試した方（identity が最優先）が残る
pub fn normalize(my: u64, opp: u64) -> ((u64, u64), Transform) {
    let mut min = (my, opp);
    let mut min_transform = Transform::Identity;
    for t in Transform::CANDIDATES {
        let candidate = (t.apply_board(my), t.apply_board(opp));
        if candidate < min {
            min = candidate;
            min_transform = t;
        }
    }
    log::debug!(
        "Final min transformation: {}, min_value: (my_stones=0x{:016x}, opponent_stones=0x{:016x})",
        min_transform.name(),
        min.0,
        min.1
    );
    (min, min_transform)
}
