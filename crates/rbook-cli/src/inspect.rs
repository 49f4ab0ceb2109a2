//! 指定局面の照会 (mode 5)
//!
//! 1行につき `<my> <opp>` の16進キーを読み、ブックのエントリをデバッグログへ
//! 書き出す。既定のログレベルでも見えるよう ERROR レベルで出力する。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::ParseIntError;
use std::path::Path;

use rbook_core::Book;

pub fn read_specified_positions(book: &Book, input_path: &Path) {
    let file = match File::open(input_path) {
        Ok(f) => f,
        Err(e) => {
            log::error!("Failed to open input file: {}: {}", input_path.display(), e);
            return;
        }
    };

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("Failed to read input line: {}", e);
                return;
            }
        };

        let mut fields = line.split_whitespace();
        let (Some(my_str), Some(opp_str)) = (fields.next(), fields.next()) else {
            log::error!("Invalid line format: {}", line);
            continue;
        };

        let (Ok(my), Ok(opp)) = (parse_hex(my_str), parse_hex(opp_str)) else {
            log::error!("Error parsing hex values: {}", line);
            continue;
        };

        match book.get(my, opp) {
            Some(position) => log::error!(
                "Position found - My stones: {}, Opponent stones: {}\n{}",
                my_str,
                opp_str,
                position
            ),
            None => log::error!(
                "Position not found - My stones: {}, Opponent stones: {}",
                my_str,
                opp_str
            ),
        }
    }
}

fn parse_hex(s: &str) -> Result<u64, ParseIntError> {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u64::from_str_radix(s, 16)
}
