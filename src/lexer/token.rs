use phf::phf_map;

pub(super) static KEYWORDS: phf::Map<&str, TokenKind> = phf_map! {
    "class" => TokenKind::Class,
    "int" => TokenKind::Int,
    "bool" => TokenKind::Bool,
    "nothing" => TokenKind::Nothing,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "if" => TokenKind::If,
    "print" => TokenKind::Print,
    "return" => TokenKind::Return,
    "new" => TokenKind::New,
    "and" => TokenKind::And,
    "not" => TokenKind::Not,
};

pub(super) static TWO_SYMBOLS_TOKENS: phf::Map<&str, TokenKind> = phf_map! {
    "<=" => TokenKind::LessEqual,
    "==" => TokenKind::DoubleEqual,
    "!=" => TokenKind::NotEqual,
};

pub(super) static ONE_SYMBOL_TOKENS: phf::Map<char, TokenKind> = phf_map! {
    '+' => TokenKind::Plus,
    '-' => TokenKind::Minus,
    '*' => TokenKind::Star,
    '/' => TokenKind::Slash,
    '<' => TokenKind::LessThan,
    '=' => TokenKind::Equal,
    '(' => TokenKind::OpenParen,
    ')' => TokenKind::CloseParen,
    '{' => TokenKind::OpenCurlyBrace,
    '}' => TokenKind::CloseCurlyBrace,
    ',' => TokenKind::Comma,
    ';' => TokenKind::SemiColon,
    ':' => TokenKind::Colon,
    '.' => TokenKind::Dot,
};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Unsigned literal; a leading `-` is a separate token, so `i32::MIN`
    /// has to be written as `-2147483647 - 1`.
    Num(i32),
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,

    LessThan,
    LessEqual,
    DoubleEqual,
    NotEqual,

    Equal,
    OpenParen,
    CloseParen,
    OpenCurlyBrace,
    CloseCurlyBrace,
    Comma,
    SemiColon,
    Colon,
    Dot,

    Class,
    Int,
    Bool,
    Nothing,
    True,
    False,
    If,
    Print,
    Return,
    New,
    And,
    Not,
}
