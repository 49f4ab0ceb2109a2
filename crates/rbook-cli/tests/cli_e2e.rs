//! バイナリ全体の end-to-end テスト。
//! 小さなブックファイルを組み立てて実行し、出力とログを検証する。

use assert_cmd::prelude::*;
use byteorder::{LittleEndian, WriteBytesExt};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use rbook_core::{normalize, synthesize, Move, Position, ROOT_MY, ROOT_OPP};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

struct Entry {
    my: u64,
    opp: u64,
    eval: i16,
    /// 内部表現の指し手番号と評価値
    links: Vec<(u8, i8)>,
    leaf: (u8, i8),
}

/// 内部表現の指し手番号をファイル上の番号へ（180度回転）
fn to_disk_move(mv: u8) -> u8 {
    if mv >= 64 {
        mv
    } else {
        63 - mv
    }
}

fn write_book(path: &Path, entries: &[Entry]) {
    let mut buf = vec![0u8; 42];
    for entry in entries {
        buf.write_u64::<LittleEndian>(entry.my).unwrap();
        buf.write_u64::<LittleEndian>(entry.opp).unwrap();
        buf.extend_from_slice(&[0u8; 16]);
        buf.write_i16::<LittleEndian>(entry.eval).unwrap();
        buf.extend_from_slice(&[0u8; 4]);
        buf.write_u8(entry.links.len() as u8).unwrap();
        buf.write_u8(0).unwrap();
        for &(mv, eval) in &entry.links {
            buf.write_i8(eval).unwrap();
            buf.write_u8(to_disk_move(mv)).unwrap();
        }
        buf.write_i8(entry.leaf.1).unwrap();
        buf.write_u8(to_disk_move(entry.leaf.0)).unwrap();
    }
    fs::write(path, buf).unwrap();
}

struct Setup {
    dir: TempDir,
}

impl Setup {
    fn new(entries: &[Entry], config: &str) -> Setup {
        let dir = TempDir::new().unwrap();
        write_book(&dir.path().join("book.dat"), entries);
        fs::write(dir.path().join("config.ini"), config).unwrap();
        Setup { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("rbook").unwrap();
        cmd.args([
            "--book",
            self.path("book.dat").to_str().unwrap(),
            "--config",
            self.path("config.ini").to_str().unwrap(),
            "--output",
            self.path("mismatched_positions.txt").to_str().unwrap(),
            "--debug-log",
            self.path("debuglog.txt").to_str().unwrap(),
            "--positions",
            self.path("specified_positions.txt").to_str().unwrap(),
        ]);
        cmd
    }
}

fn root_entry(eval: i16, links: Vec<(u8, i8)>, leaf: (u8, i8)) -> Entry {
    Entry {
        my: ROOT_MY,
        opp: ROOT_OPP,
        eval,
        links,
        leaf,
    }
}

/// d3 の子局面の正規形キー
fn d3_child_key() -> (u64, u64) {
    let root = Position {
        my: ROOT_MY,
        opp: ROOT_OPP,
        ..Position::default()
    };
    let child = synthesize(&root, Move::new(19));
    let ((my, opp), _) = normalize(child.my, child.opp);
    (my, opp)
}

#[test]
fn root_only_book_terminates_without_output() {
    let setup = Setup::new(&[root_entry(0, vec![], (65, 0))], "mode=4\n");
    setup
        .command()
        .assert()
        .success()
        .stdout(predicate::str::contains("Links or Leaf processed (Final)"));

    assert!(!setup.path("mismatched_positions.txt").exists());
    let debug_log = fs::read(setup.path("debuglog.txt")).unwrap();
    assert!(debug_log.starts_with(UTF8_BOM));
    assert!(String::from_utf8_lossy(&debug_log).contains("[ERROR]"));
}

#[test]
fn consistent_two_ply_mode3_emits_nothing() {
    let (child_my, child_opp) = d3_child_key();
    let setup = Setup::new(
        &[
            root_entry(2, vec![(19, 2)], (65, 0)),
            Entry {
                my: child_my,
                opp: child_opp,
                eval: -2,
                links: vec![],
                leaf: (65, 0),
            },
        ],
        "mode=3\n",
    );
    setup.command().assert().success();
    assert!(!setup.path("mismatched_positions.txt").exists());
}

#[test]
fn inconsistent_two_ply_mode3_emits_d3() {
    let (child_my, child_opp) = d3_child_key();
    let setup = Setup::new(
        &[
            root_entry(2, vec![(19, 2)], (65, 0)),
            Entry {
                my: child_my,
                opp: child_opp,
                eval: 1,
                links: vec![],
                leaf: (65, 0),
            },
        ],
        "mode=3\n",
    );
    setup.command().assert().success();

    let bytes = fs::read(setup.path("mismatched_positions.txt")).unwrap();
    let text = std::str::from_utf8(bytes.strip_prefix(UTF8_BOM).expect("BOM")).unwrap();
    assert_eq!(text.lines().collect::<Vec<_>>(), vec!["d3"]);
}

#[test]
fn invalid_mode_fails_with_exit_code_one() {
    let setup = Setup::new(&[root_entry(0, vec![], (65, 0))], "mode=7\n");
    setup
        .command()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid mode (7)"));
}

#[test]
fn missing_root_position_fails() {
    let setup = Setup::new(&[], "mode=4\n");
    setup
        .command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Initial position not found"));
}

#[test]
fn out_of_range_eval_aborts_load() {
    let setup = Setup::new(&[root_entry(300, vec![], (65, 0))], "mode=4\n");
    setup
        .command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load book file"));
}

#[test]
fn missing_book_file_fails() {
    let setup = Setup::new(&[root_entry(0, vec![], (65, 0))], "mode=4\n");
    fs::remove_file(setup.path("book.dat")).unwrap();
    setup.command().assert().failure().code(1);
}

#[test]
fn mode5_dumps_specified_positions_into_debug_log() {
    let setup = Setup::new(&[root_entry(3, vec![(19, 2)], (65, 0))], "mode=5\n");
    fs::write(
        setup.path("specified_positions.txt"),
        "0000000810000000 0000001008000000\n0x1 0x2\nnot-hex\n",
    )
    .unwrap();
    setup.command().assert().success();

    let debug_log = String::from_utf8_lossy(&fs::read(setup.path("debuglog.txt")).unwrap())
        .into_owned();
    assert!(debug_log.contains("Position found - My stones: 0000000810000000"));
    assert!(debug_log.contains("eval_value: 3"));
    assert!(debug_log.contains("Position not found - My stones: 0x1"));
    assert!(debug_log.contains("Invalid line format: not-hex"));
}

#[test]
fn mode_override_from_cli_wins_over_config() {
    let (child_my, child_opp) = d3_child_key();
    let setup = Setup::new(
        &[
            root_entry(2, vec![(19, 2)], (65, 0)),
            Entry {
                my: child_my,
                opp: child_opp,
                eval: 1,
                links: vec![],
                leaf: (65, 0),
            },
        ],
        "mode=5\n",
    );
    let mut cmd = setup.command();
    cmd.args(["--mode", "3"]);
    cmd.assert().success();
    assert!(setup.path("mismatched_positions.txt").exists());
}

#[test]
fn auto_adjust_promotes_log_level() {
    // 記録された WARNING が引き金になってレベルが INFO まで下がる
    let setup = Setup::new(
        &[root_entry(0, vec![], (65, 0))],
        "log_level=WARNING\nauto_adjust_level=true\nadjusted_level=INFO\nmode=4\n",
    );
    setup.command().assert().success();

    let debug_log = String::from_utf8_lossy(&fs::read(setup.path("debuglog.txt")).unwrap())
        .into_owned();
    // 探索終了時の WARNING が引き金になる
    assert!(debug_log.contains("Total Links or Leaf processed"));
    assert!(debug_log.contains("Log level automatically adjusted from WARNING to INFO"));
    // 調整後の WARNING レベル出力（実行時間）も残る
    assert!(debug_log.contains("Total program execution time"));
}
