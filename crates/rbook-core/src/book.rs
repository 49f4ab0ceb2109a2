//! オープニングブックの読み込みと格納
//!
//! ブックファイルは 42 バイトのヘッダに続いてエントリがリトルエンディアンで
//! 並ぶ。ファイル上の指し手番号は内部表現と升の振り方が逆順なので、
//! 読み込み時に 180 度回転で内部表現へ揃える。
//! 読み込み後は (my, opp) をキーとするハッシュマップで、visited フラグ以外は
//! 不変として扱う。

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::time::Instant;

use byteorder::{LittleEndian, ReadBytesExt};
use smallvec::SmallVec;

use crate::symmetry::Transform;
use crate::types::Move;

/// ヘッダ長（読み飛ばす）
pub const BOOK_HEADER_LEN: usize = 42;

/// 1エントリの平均バイト数。エントリ数の見積もりに使う
const AVG_ENTRY_BYTES: f64 = 44.0720;
/// 見積もりエントリ数に掛ける負荷係数
const RESERVE_LOAD_FACTOR: f64 = 1.10;

const READER_BUF_CAP: usize = 128 * 1024; // 128 KiB

/// 局面から出るリンク手
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub mv: Move,
    pub eval: i8,
    pub visited: bool,
}

/// 局面に1つだけ記録されるリーフ手
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    pub mv: Move,
    pub eval: i8,
    pub visited: bool,
}

impl Leaf {
    /// 空リーフの番兵 (move=0, eval=0, visited=false)。
    /// 升番号 0 の実手と衝突するため、3フィールドすべてで判定する
    #[inline]
    pub const fn is_absent(self) -> bool {
        self.mv.index() == 0 && self.eval == 0 && !self.visited
    }
}

impl Default for Leaf {
    fn default() -> Self {
        Leaf {
            mv: Move::new(0),
            eval: 0,
            visited: false,
        }
    }
}

/// リンク列。典型的な分岐数では heap を使わない
pub type LinkList = SmallVec<[Link; 4]>;

/// ブックに記録された1局面
#[derive(Debug, Clone, Default)]
pub struct Position {
    pub my: u64,
    pub opp: u64,
    pub links: LinkList,
    pub leaf: Leaf,
    pub eval: i8,
}

// 等価性は盤面のみで決まる
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.my == other.my && self.opp == other.opp
    }
}

impl Eq for Position {}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "my_stones: 0x{:016x}, opponent_stones: 0x{:016x}, eval_value: {}\nLinks: ",
            self.my, self.opp, self.eval
        )?;
        for link in &self.links {
            write!(
                f,
                "{{move: {}, eval_link: {}, visited: {}}} ",
                link.mv,
                link.eval,
                if link.visited { "True" } else { "False" }
            )?;
        }
        write!(
            f,
            "\nLeaf: {{move: {}, eval: {}, visited: {}}}",
            self.leaf.mv,
            self.leaf.eval,
            if self.leaf.visited { "True" } else { "False" }
        )
    }
}

/// (my, opp) から局面を引く連想ストア
#[derive(Debug)]
pub struct Book {
    positions: HashMap<(u64, u64), Position>,
}

impl Book {
    pub fn new() -> Book {
        Book {
            positions: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Book {
        Book {
            positions: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn get(&self, my: u64, opp: u64) -> Option<&Position> {
        self.positions.get(&(my, opp))
    }

    pub fn insert(&mut self, position: Position) {
        self.positions
            .insert((position.my, position.opp), position);
    }

    /// 正規形キーの局面で、`mv` に一致する最初のリンク（なければリーフ）に
    /// visited フラグを立てる。
    ///
    /// 戻り値: キーが無ければ `None`（ブック破損）、あればフラグを更新できたか
    pub fn mark_visited(&mut self, key: (u64, u64), mv: Move) -> Option<bool> {
        let position = self.positions.get_mut(&key)?;
        for link in &mut position.links {
            if link.mv == mv {
                link.visited = true;
                return Some(true);
            }
        }
        if position.leaf.mv == mv {
            position.leaf.visited = true;
            return Some(true);
        }
        Some(false)
    }
}

impl Default for Book {
    fn default() -> Self {
        Book::new()
    }
}

/// ブックファイルを読み込む。
///
/// 評価値が i8 の範囲を超えるエントリがあれば即座にエラー（ブック破損）。
/// 末尾の不完全なエントリは捨てる。
pub fn load(path: &Path) -> io::Result<Book> {
    let total_start = Instant::now();

    let file = File::open(path)?;
    let file_size = file.metadata()?.len();
    log::info!("File size: {} bytes", file_size);

    let estimated_positions = (file_size as f64 / AVG_ENTRY_BYTES) as usize;
    let estimated_buckets = (estimated_positions as f64 * RESERVE_LOAD_FACTOR) as usize;
    log::debug!("Estimated number of positions: {}", estimated_positions);
    log::debug!("Estimated number of buckets: {}", estimated_buckets);

    let mut reader = BufReader::with_capacity(READER_BUF_CAP, file);

    let read_start = Instant::now();
    let book = read_from(&mut reader, estimated_buckets)?;
    log::info!("Actual number of positions loaded: {}", book.len());
    log::info!("File I/O time: {} ms", read_start.elapsed().as_millis());
    log::info!("Total load time: {} ms", total_start.elapsed().as_millis());

    Ok(book)
}

/// ヘッダ込みのストリームからブックを読み込む
pub fn read_from<R: Read>(reader: &mut R, capacity: usize) -> io::Result<Book> {
    let mut header = [0u8; BOOK_HEADER_LEN];
    reader.read_exact(&mut header)?;

    let mut book = Book::with_capacity(capacity);
    loop {
        let my = match reader.read_u64::<LittleEndian>() {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        };
        match read_entry_tail(reader, my) {
            Ok(position) => {
                book.insert(position);
                if book.len() % 100_000 == 0 {
                    print!("\r{} Loading Completed", book.len());
                    let _ = io::stdout().flush();
                }
            }
            // エントリ途中で切れたファイル末尾
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
    }
    println!("\r{} Loading Completed", book.len());

    Ok(book)
}

fn read_entry_tail<R: Read>(reader: &mut R, my: u64) -> io::Result<Position> {
    let opp = reader.read_u64::<LittleEndian>()?;
    skip(reader, 16)?; // win / draw / lose / line
    let raw_eval = reader.read_i16::<LittleEndian>()?;
    skip(reader, 4)?; // minvalue / maxvalue
    let n_links = reader.read_u8()?;
    skip(reader, 1)?; // level

    if !(-127..=127).contains(&raw_eval) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Value out of i8 range: {}", raw_eval),
        ));
    }

    let mut links = LinkList::new();
    for _ in 0..n_links {
        let eval = reader.read_i8()?;
        let mv = reader.read_u8()?;
        links.push(Link {
            mv: file_move_to_internal(mv),
            eval,
            visited: false,
        });
    }

    let leaf_eval = reader.read_i8()?;
    let leaf_move = reader.read_u8()?;

    Ok(Position {
        my,
        opp,
        links,
        leaf: Leaf {
            mv: file_move_to_internal(leaf_move),
            eval: leaf_eval,
            visited: false,
        },
        eval: raw_eval as i8,
    })
}

/// ファイル上の指し手番号を内部表現へ（180度回転、パスと「なし」はそのまま）
#[inline]
fn file_move_to_internal(raw: u8) -> Move {
    Transform::Rotate180.apply_move(Move::new(raw))
}

fn skip<R: Read>(reader: &mut R, n: usize) -> io::Result<()> {
    let mut buf = [0u8; 16];
    reader.read_exact(&mut buf[..n])
}
