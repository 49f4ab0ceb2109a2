//! 深さ優先の整合性チェック
//!
//! 固定の初期局面を起点に、ブックに記録された指し手を順に適用しながら
//! 再帰的に降りていく。各フレームは非正規形の局面コピーと棋譜文字列を持ち、
//! 子局面は正規化してブックと照合したうえで指し手番号を元の向きへ戻す。
//!
//! visited フラグは2系統ある。フレーム内のコピーに立てるフラグは同一フレームでの
//! 再選択を防ぐだけで、探索全体の重複排除はブック側の正規形エントリに立てる
//! フラグが担う。対称経路で同じ正規形に合流しても、各 (局面, 指し手) は
//! 高々1回しか展開されない。

use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Result};

use crate::bitboard;
use crate::book::{Book, Leaf, LinkList, Position};
use crate::emit::MismatchWriter;
use crate::rules::{self, CheckRule};
use crate::symmetry;
use crate::types::Move;

/// 初期局面の自分側（黒番）
pub const ROOT_MY: u64 = 0x0000_0008_1000_0000;
/// 初期局面の相手側
pub const ROOT_OPP: u64 = 0x0000_0010_0800_0000;

/// 指し手を適用して子局面を合成する。
///
/// パスは盤面を入れ替えるだけ。通常手は石返しを適用して手番を交代する。
/// リンクとリーフは空のままで、ブック照合後に埋め直す
pub fn synthesize(current: &Position, mv: Move) -> Position {
    if mv.is_pass() {
        return Position {
            my: current.opp,
            opp: current.my,
            links: LinkList::new(),
            leaf: Leaf::default(),
            eval: -current.eval,
        };
    }
    let bit = mv.board_bit();
    let flipped = bitboard::flip_all(current.my, current.opp, bit);
    Position {
        my: current.opp ^ flipped,
        opp: current.my | bit | flipped,
        links: LinkList::new(),
        leaf: Leaf::default(),
        eval: -current.eval,
    }
}

/// ブック全体を検査する探索ドライバ
pub struct Checker<'a> {
    book: &'a mut Book,
    rule: CheckRule,
    writer: MismatchWriter,
    processed: u64,
}

impl<'a> Checker<'a> {
    pub fn new(book: &'a mut Book, rule: CheckRule, output_path: &Path) -> Checker<'a> {
        Checker {
            book,
            rule,
            writer: MismatchWriter::new(output_path),
            processed: 0,
        }
    }

    /// 初期局面から全探索する。処理したフレーム数を返す
    pub fn run(&mut self) -> Result<u64> {
        let Some(root) = self.book.get(ROOT_MY, ROOT_OPP).cloned() else {
            bail!("Initial position not found in book");
        };
        self.walk(root, String::new())?;

        println!("\r{} Links or Leaf processed (Final)", self.processed);
        log::warn!("Total Links or Leaf processed: {}", self.processed);
        Ok(self.processed)
    }

    fn walk(&mut self, mut current: Position, mut kifu: String) -> Result<()> {
        self.processed += 1;
        if self.processed == 1 || self.processed % 100_000 == 0 {
            print!("\r{} Links or Leaf processed", self.processed);
            let _ = io::stdout().flush();
        }

        // 直前の手がパスなら棋譜には残さない（盤面は既に入れ替わっている）
        if kifu.ends_with("Pass") {
            kifu.truncate(kifu.len() - 4);
            log::debug!("Pass detected, updated kifu: {}", kifu);
        }

        log::debug!("Current position: {}", current);
        log::debug!("Current kifu: {}", kifu);

        for i in 0..current.links.len() {
            if current.links[i].visited {
                continue;
            }
            current.links[i].visited = true;
            let link = current.links[i];
            log::debug!(
                "Unvisited link found: Move={}, Eval={}, Visited: False",
                link.mv,
                link.eval
            );
            self.step(&current, link.mv, &kifu)?;
        }

        let leaf = current.leaf;
        if !leaf.is_absent() && !leaf.mv.is_none() {
            if !leaf.visited {
                current.leaf.visited = true;
                log::debug!(
                    "Unvisited leaf found: Move={}, Eval={}, Visited: False",
                    leaf.mv,
                    leaf.eval
                );
                self.step(&current, leaf.mv, &kifu)?;
            }
        } else if leaf.mv.is_none() {
            log::debug!("Leaf with move value 65 encountered. Skipping processing.");
        }

        Ok(())
    }

    /// 1手ぶんの処理。子局面を合成・照合し、検査して再帰する
    fn step(&mut self, current: &Position, mv: Move, kifu: &str) -> Result<()> {
        if mv.is_none() {
            bail!("Invalid move (None) reached during traversal");
        }

        let child_raw = synthesize(current, mv);
        let new_kifu = format!("{}{}", kifu, mv.coord());
        log::debug!("Generated child position: {}", child_raw);
        log::debug!("New kifu: {}", new_kifu);

        // 親の正規形エントリに visited フラグを立てる（探索全体の重複排除）
        let ((parent_my, parent_opp), parent_transform) =
            symmetry::normalize(current.my, current.opp);
        let normalized_move = parent_transform.apply_move(mv);
        match self
            .book
            .mark_visited((parent_my, parent_opp), normalized_move)
        {
            None => bail!(
                "Parent position not found in book (my=0x{:016x}, opp=0x{:016x})",
                parent_my,
                parent_opp
            ),
            Some(true) => log::debug!(
                "Parent visited flag updated: move={}, visited=True",
                normalized_move
            ),
            Some(false) => log::debug!(
                "Parent book entry has no move {} to update",
                normalized_move
            ),
        }

        // 子局面を正規化してブックと照合する
        let ((child_my, child_opp), child_transform) =
            symmetry::normalize(child_raw.my, child_raw.opp);
        let Some(stored) = self.book.get(child_my, child_opp) else {
            log::debug!(
                "Child position not found in book: (my_stones: 0x{:016x}, opponent_stones: 0x{:016x})",
                child_my,
                child_opp
            );
            return Ok(());
        };

        // ブックの内容を取り込み、指し手番号を呼び出し側の盤の向きへ戻す
        let mut child = child_raw;
        child.eval = stored.eval;
        child.leaf = stored.leaf;
        child.links = stored.links.clone();
        for link in &mut child.links {
            link.mv = child_transform.invert_move(link.mv);
        }
        child.leaf.mv = child_transform.invert_move(child.leaf.mv);
        log::debug!("Final denormalized child position: {}", child);

        let parent_eval = rules::parent_eval_for_move(current, mv);
        if rules::judge_mismatch(self.rule, &child, parent_eval) {
            self.writer.emit(&child, &new_kifu, self.rule, parent_eval);
        }

        self.walk(child, new_kifu)
    }
}
