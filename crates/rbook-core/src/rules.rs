//! 整合性判定ルール
//!
//! 4つのモードで子局面の記録評価値を検査する。
//! - mode 1: リーフ評価が全リンクの最大評価を上回っていないか
//! - mode 2: ノード評価が子手の最大評価と一致しているか
//! - mode 3: 親リンク評価と子ノード評価のネガマックス関係
//! - mode 4: 親リンク評価と子手最大評価のネガマックス関係

use crate::book::{Leaf, Position};
use crate::types::Move;

/// 親の評価値が引けなかったときの既定値
pub const PARENT_EVAL_DEFAULT: i8 = -64;

/// 検査ルール（mode 1〜4）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckRule {
    /// mode 1
    LeafOverLinks,
    /// mode 2
    NodeEvalMatchesBest,
    /// mode 3
    NegamaxEval,
    /// mode 4
    NegamaxBest,
}

impl CheckRule {
    pub fn from_mode(mode: u8) -> Option<CheckRule> {
        match mode {
            1 => Some(CheckRule::LeafOverLinks),
            2 => Some(CheckRule::NodeEvalMatchesBest),
            3 => Some(CheckRule::NegamaxEval),
            4 => Some(CheckRule::NegamaxBest),
            _ => None,
        }
    }

    pub const fn mode(self) -> u8 {
        match self {
            CheckRule::LeafOverLinks => 1,
            CheckRule::NodeEvalMatchesBest => 2,
            CheckRule::NegamaxEval => 3,
            CheckRule::NegamaxBest => 4,
        }
    }
}

/// 親局面の該当する手（リンク優先、なければリーフ）の評価値。
/// 見つからなければ -64
pub fn parent_eval_for_move(parent: &Position, mv: Move) -> i8 {
    for link in &parent.links {
        if link.mv == mv {
            return link.eval;
        }
    }
    if parent.leaf.mv == mv {
        log::info!(
            "Found matching leaf - move: {}, parent_eval: {}",
            mv,
            parent.leaf.eval
        );
        return parent.leaf.eval;
    }
    PARENT_EVAL_DEFAULT
}

/// リンク評価の最大値（-64 起点、リーフは含まない）
pub fn max_link_eval(position: &Position) -> i8 {
    let mut max = PARENT_EVAL_DEFAULT;
    for link in &position.links {
        if link.eval > max {
            max = link.eval;
        }
    }
    max
}

/// リーフが最大値計算に参加するか。空リーフ番兵と move=65 は不参加
#[inline]
pub fn leaf_participates(leaf: Leaf) -> bool {
    !leaf.is_absent() && !leaf.mv.is_none()
}

/// 子局面の指し手評価の最大値（リンクとリーフの双方から）
pub fn max_child_move_eval(child: &Position) -> i8 {
    let mut max = max_link_eval(child);
    if leaf_participates(child.leaf) && child.leaf.eval > max {
        max = child.leaf.eval;
    }
    max
}

/// 子局面が `rule` に照らして不整合かどうか。
/// `parent_eval` は [`parent_eval_for_move`] で引いた親側の評価値
pub fn judge_mismatch(rule: CheckRule, child: &Position, parent_eval: i8) -> bool {
    let mismatch = match rule {
        CheckRule::LeafOverLinks => {
            !child.links.is_empty() && child.leaf.eval > max_link_eval(child)
        }
        CheckRule::NodeEvalMatchesBest => child.eval != max_child_move_eval(child),
        CheckRule::NegamaxEval => parent_eval as i32 != -(child.eval as i32),
        CheckRule::NegamaxBest => {
            parent_eval as i32 != -(max_child_move_eval(child) as i32)
        }
    };
    if mismatch {
        log::debug!(
            "Mismatch detected: Mode {}: child_eval={}, max_child_move_eval={}, parent_eval={}",
            rule.mode(),
            child.eval,
            max_child_move_eval(child),
            parent_eval
        );
    }
    mismatch
}
