//! 不一致棋譜の出力
//!
//! 不整合を見つけた地点までの棋譜を1行ずつ追記する。出力先は実行をまたいで
//! 追記され続けるファイルで、空のときだけ先頭に UTF-8 BOM を書く。
//! 出力ファイルを開けなくても処理全体は止めない。

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::book::Position;
use crate::rules::{leaf_participates, CheckRule};
use crate::types::Move;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// 不一致棋譜の書き出し先
pub struct MismatchWriter {
    path: PathBuf,
}

impl MismatchWriter {
    pub fn new(path: &Path) -> MismatchWriter {
        MismatchWriter {
            path: path.to_path_buf(),
        }
    }

    /// 不整合と判定された子局面についての棋譜行を書き出す。
    ///
    /// mode 1 はリーフ手まで延ばした棋譜を1行。
    /// mode 2〜4 は閾値を超える手が見つかる場合（is_greater）はその全手を
    /// 1行ずつ、そうでなければ最大評価の手1つだけを書く。
    pub fn emit(&self, child: &Position, kifu: &str, rule: CheckRule, parent_eval: i8) {
        let mut file = match OpenOptions::new().append(true).create(true).open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                log::error!(
                    "Failed to open or create output file: {}: {}",
                    self.path.display(),
                    e
                );
                return;
            }
        };

        // 新規（空）ファイルなら BOM を先頭に書く
        if file.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
            if let Err(e) = file.write_all(UTF8_BOM) {
                log::error!("Failed to write BOM: {}", e);
                return;
            }
        }

        let mut write_line = |mv: Option<Move>| {
            let line = match mv {
                Some(mv) => format!("{}{}", kifu, mv.coord()),
                None => kifu.to_string(),
            };
            if let Err(e) = writeln!(file, "{}", line) {
                log::error!("Failed to write mismatch kifu: {}", e);
            } else {
                log::debug!("Mismatch found. Kifu: {}", line);
            }
        };

        // 出力側では i8 最小値を起点に最大評価を取り直す
        let mut max_eval = i32::from(i8::MIN);
        for link in &child.links {
            max_eval = max_eval.max(i32::from(link.eval));
        }
        let leaf_in_play = leaf_participates(child.leaf);
        if leaf_in_play {
            max_eval = max_eval.max(i32::from(child.leaf.eval));
        }

        let child_eval = i32::from(child.eval);
        let parent_eval = i32::from(parent_eval);
        let (is_greater, threshold) = match rule {
            CheckRule::LeafOverLinks => {
                write_line(Some(child.leaf.mv));
                return;
            }
            CheckRule::NodeEvalMatchesBest => (max_eval > child_eval, -child_eval),
            CheckRule::NegamaxEval => (-child_eval > parent_eval, -parent_eval),
            CheckRule::NegamaxBest => (-max_eval > parent_eval, -parent_eval),
        };

        if is_greater {
            // 閾値を超える手をすべて出力する
            for link in &child.links {
                if i32::from(link.eval) > threshold {
                    write_line(Some(link.mv));
                }
            }
            if leaf_in_play && i32::from(child.leaf.eval) > threshold {
                write_line(Some(child.leaf.mv));
            }
        } else {
            // 最大評価に一致する最初のリンク、無ければリーフ
            let mut chosen = None;
            for link in &child.links {
                if i32::from(link.eval) == max_eval {
                    chosen = Some(link.mv);
                    break;
                }
            }
            if chosen.is_none() && leaf_in_play && i32::from(child.leaf.eval) == max_eval {
                log::info!("Leaf evaluation used for max_child_move_eval");
                chosen = Some(child.leaf.mv);
            }
            // 出力対象の手が1つも無ければ棋譜だけを出力する
            write_line(chosen);
        }
    }
}
