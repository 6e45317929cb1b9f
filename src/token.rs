use crate::util::*;

pub type Token = Annot<TokenKind>;

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Loc(start, end) = self.loc;
        write!(f, "{:?} at {}..={}", self.kind, start, end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    EOF,
    Ident(String),
    InstanceVar(String),
    Const(String),
    /// Unsigned; range-checked by the parser once a leading `-` is known.
    NumLit(u64),
    FloatLit(f64),
    StringLit(String),
    Symbol(String),
    Reserved(Reserved),
    Punct(Punct),
    LineTerm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reserved {
    Begin,
    Break,
    Class,
    Def,
    Do,
    Else,
    Elsif,
    End,
    Ensure,
    False,
    If,
    Next,
    Nil,
    Not,
    Rescue,
    Return,
    SelfValue,
    Then,
    True,
    Unless,
    While,
}

impl Reserved {
    pub const ALL: &'static [(&'static str, Reserved)] = &[
        ("begin", Reserved::Begin),
        ("break", Reserved::Break),
        ("class", Reserved::Class),
        ("def", Reserved::Def),
        ("do", Reserved::Do),
        ("else", Reserved::Else),
        ("elsif", Reserved::Elsif),
        ("end", Reserved::End),
        ("ensure", Reserved::Ensure),
        ("false", Reserved::False),
        ("if", Reserved::If),
        ("next", Reserved::Next),
        ("nil", Reserved::Nil),
        ("not", Reserved::Not),
        ("rescue", Reserved::Rescue),
        ("return", Reserved::Return),
        ("self", Reserved::SelfValue),
        ("then", Reserved::Then),
        ("true", Reserved::True),
        ("unless", Reserved::Unless),
        ("while", Reserved::While),
    ];

    /// Keyword text, used when a keyword appears as a method name (`obj.class`).
    pub fn as_str(self) -> &'static str {
        Reserved::ALL
            .iter()
            .find(|(_, r)| *r == self)
            .map(|(s, _)| *s)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Punct {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,

    Plus,
    Minus,
    Mul,
    Div,
    Rem,
    Pow,
    Shl,
    Assign,
    AssignOp(BinOp),
    Eq,
    TEq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Cmp,
    BitAnd,
    BitOr,
    Not,
    LAnd,
    LOr,

    FatArrow,
}

/// Operators that may be combined with `=` (`a += 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn method_name(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }
}

impl Punct {
    /// Method name of an operator that desugars to a method call.
    pub fn operator_name(self) -> Option<&'static str> {
        let name = match self {
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Mul => "*",
            Punct::Div => "/",
            Punct::Rem => "%",
            Punct::Pow => "**",
            Punct::Shl => "<<",
            Punct::Eq => "==",
            Punct::TEq => "===",
            Punct::Ne => "!=",
            Punct::Gt => ">",
            Punct::Ge => ">=",
            Punct::Lt => "<",
            Punct::Le => "<=",
            Punct::Cmp => "<=>",
            Punct::BitAnd => "&",
            Punct::BitOr => "|",
            Punct::Not => "!",
            _ => return None,
        };
        Some(name)
    }
}

impl Token {
    pub fn eof(pos: usize) -> Self {
        Annot::new(TokenKind::EOF, Loc(pos, pos))
    }

    /// Examine the token, and return true if it is a line terminator.
    pub fn is_line_term(&self) -> bool {
        self.kind == TokenKind::LineTerm
    }

    /// Examine the token, and return true if it is EOF.
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::EOF
    }

    /// Examine the token, and return true if it is a line terminator or ';' or EOF.
    pub fn is_term(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::LineTerm | TokenKind::EOF | TokenKind::Punct(Punct::Semi)
        )
    }
}
