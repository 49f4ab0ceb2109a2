//! リバーシのオープニングブック整合性チェック
//!
//! ブックをメモリ上の連想ストアへ読み込み、初期局面から記録された指し手を
//! 深さ優先でたどりながら、評価値の整合性を4つのルールで検査する。
//! 不整合を見つけた地点までの棋譜を出力ファイルへ追記する。
//!
//! - [`bitboard`]: 石返しと D4 対称変換のビット演算カーネル
//! - [`types`]: 指し手番号（升・パス・なし）
//! - [`symmetry`]: 正規化と指し手の（逆）変換
//! - [`book`]: ブックファイルの読み込みと連想ストア
//! - [`rules`]: 整合性判定ルール（mode 1〜4）
//! - [`emit`]: 不一致棋譜の出力
//! - [`traverse`]: 深さ優先の探索ドライバ

pub mod bitboard;
pub mod book;
pub mod emit;
pub mod rules;
pub mod symmetry;
pub mod traverse;
pub mod types;

pub use book::{Book, Leaf, Link, LinkList, Position};
pub use rules::CheckRule;
pub use symmetry::{normalize, Transform};
pub use traverse::{synthesize, Checker, ROOT_MY, ROOT_OPP};
pub use types::Move;
