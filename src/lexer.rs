use crate::error::{ParseErrKind, RubyError};
use crate::token::*;
use crate::util::*;
use fxhash::FxHashMap;

#[derive(Debug, Clone)]
pub struct Lexer {
    code: Vec<char>,
    len: usize,
    token_start_pos: usize,
    pos: usize,
    reserved: FxHashMap<&'static str, Reserved>,
}

#[derive(Debug, Clone)]
pub struct LexerResult {
    pub tokens: Vec<Token>,
    pub source_info: SourceInfo,
}

/// Operator method names that may follow ':' in a symbol literal, longest first.
const OPERATOR_SYMBOLS: &[&str] = &[
    "[]=", "===", "<=>", "[]", "==", "!=", "<=", ">=", "<<", "**", "-@", "+", "-", "*", "/", "%",
    "<", ">", "!", "&", "|",
];

impl Lexer {
    pub fn new(code_text: impl Into<String>) -> Self {
        let code = code_text.into().chars().collect::<Vec<char>>();
        let len = code.len();
        let reserved = Reserved::ALL.iter().cloned().collect();
        Lexer {
            code,
            len,
            token_start_pos: 0,
            pos: 0,
            reserved,
        }
    }

    pub fn tokenize(mut self, path: impl Into<String>) -> Result<LexerResult, RubyError> {
        let mut tokens: Vec<Token> = vec![];
        loop {
            if let Some(term) = self.skip_whitespace() {
                tokens.push(term);
            };
            self.token_start_pos = self.pos;
            let ch = match self.peek() {
                Some(ch) => ch,
                None => break,
            };
            self.pos += 1;

            let kind = if ch.is_ascii_alphabetic() || ch == '_' {
                let word = self.read_identifier(ch, true);
                match self.reserved.get(word.as_str()) {
                    Some(reserved) => TokenKind::Reserved(*reserved),
                    None if ch.is_ascii_uppercase() => TokenKind::Const(word),
                    None => TokenKind::Ident(word),
                }
            } else if ch.is_ascii_digit() {
                self.lex_number_literal(ch)?
            } else {
                match ch {
                    '#' => {
                        self.goto_eol();
                        continue;
                    }
                    '"' => self.lex_string_literal_double()?,
                    '\'' => self.lex_string_literal_single()?,
                    '@' => match self.peek() {
                        Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                            self.pos += 1;
                            let name = self.read_identifier(ch, false);
                            TokenKind::InstanceVar(format!("@{}", name))
                        }
                        _ => return Err(self.error_unexpected('@')),
                    },
                    ':' => self.lex_symbol()?,
                    '-' if self.is_unary_minus_name() => {
                        // `def -@`
                        self.pos += 1;
                        TokenKind::Ident("-@".to_string())
                    }
                    _ => TokenKind::Punct(self.lex_punct(ch)?),
                }
            };
            tokens.push(Annot::new(kind, self.cur_loc()));
        }
        tokens.push(Token::eof(self.len));
        Ok(LexerResult {
            tokens,
            source_info: SourceInfo::new(path, self.code),
        })
    }

    fn lex_punct(&mut self, ch: char) -> Result<Punct, RubyError> {
        let punct = match ch {
            ';' => Punct::Semi,
            ',' => Punct::Comma,
            '.' => Punct::Dot,
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            '%' => Punct::Rem,
            '+' => self.or_assign_op(Punct::Plus, BinOp::Add),
            '-' => self.or_assign_op(Punct::Minus, BinOp::Sub),
            '/' => self.or_assign_op(Punct::Div, BinOp::Div),
            '*' if self.consume('*') => Punct::Pow,
            '*' => self.or_assign_op(Punct::Mul, BinOp::Mul),
            '=' if self.consume('=') => self.either('=', Punct::TEq, Punct::Eq),
            '=' => self.either('>', Punct::FatArrow, Punct::Assign),
            '<' if self.consume('=') => self.either('>', Punct::Cmp, Punct::Le),
            '<' => self.either('<', Punct::Shl, Punct::Lt),
            '>' => self.either('=', Punct::Ge, Punct::Gt),
            '!' => self.either('=', Punct::Ne, Punct::Not),
            '&' => self.either('&', Punct::LAnd, Punct::BitAnd),
            '|' => self.either('|', Punct::LOr, Punct::BitOr),
            _ => return Err(self.error_unexpected(ch)),
        };
        Ok(punct)
    }

    /// `-@` not followed by an instance variable name.
    fn is_unary_minus_name(&self) -> bool {
        self.peek() == Some('@')
            && !self
                .peek_at(1)
                .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
    }

    fn or_assign_op(&mut self, punct: Punct, op: BinOp) -> Punct {
        self.either('=', Punct::AssignOp(op), punct)
    }

    /// `matched` if the next char is `next` (which is consumed), otherwise `other`.
    fn either(&mut self, next: char, matched: Punct, other: Punct) -> Punct {
        if self.consume(next) {
            matched
        } else {
            other
        }
    }

    /// Read the rest of an identifier whose first char `ch` was already consumed.
    /// Method-like names may end with '?' or '!' unless an '=' follows.
    fn read_identifier(&mut self, ch: char, allow_suffix: bool) -> String {
        let mut tok = ch.to_string();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                tok.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        if allow_suffix {
            if let Some(ch @ '?') | Some(ch @ '!') = self.peek() {
                if self.peek_at(1) != Some('=') {
                    tok.push(ch);
                    self.pos += 1;
                }
            }
        }
        tok
    }

    fn lex_number_literal(&mut self, ch: char) -> Result<TokenKind, RubyError> {
        let mut tok = ch.to_string();
        let mut is_float = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                tok.push(ch);
            } else if ch == '_' {
            } else if ch == '.'
                && !is_float
                && self.peek_at(1).map_or(false, |c| c.is_ascii_digit())
            {
                is_float = true;
                tok.push(ch);
            } else if (ch == 'e' || ch == 'E') && self.exponent_follows() {
                is_float = true;
                tok.push('e');
                self.pos += 1;
                if let Some(sign @ '+') | Some(sign @ '-') = self.peek() {
                    tok.push(sign);
                    self.pos += 1;
                }
                continue;
            } else {
                break;
            }
            self.pos += 1;
        }
        if is_float {
            match tok.parse::<f64>() {
                Ok(f) => Ok(TokenKind::FloatLit(f)),
                Err(_) => Err(self.error_syntax(format!("bad float literal {}", tok))),
            }
        } else {
            match tok.parse::<u64>() {
                Ok(i) => Ok(TokenKind::NumLit(i)),
                Err(_) => Err(self.error_syntax(format!("integer literal too big: {}", tok))),
            }
        }
    }

    fn exponent_follows(&self) -> bool {
        match self.peek_at(1) {
            Some(c) if c.is_ascii_digit() => true,
            Some('+') | Some('-') => self.peek_at(2).map_or(false, |c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn lex_string_literal_double(&mut self) -> Result<TokenKind, RubyError> {
        let mut s = String::new();
        loop {
            match self.get()? {
                '"' => break,
                '\\' => s.push(self.read_escaped_char()?),
                c => s.push(c),
            }
        }
        Ok(TokenKind::StringLit(s))
    }

    /// Single-quoted strings only recognize `\'` and `\\`.
    fn lex_string_literal_single(&mut self) -> Result<TokenKind, RubyError> {
        let mut s = String::new();
        loop {
            match self.get()? {
                '\'' => break,
                '\\' => match self.get()? {
                    c @ '\'' | c @ '\\' => s.push(c),
                    c => {
                        s.push('\\');
                        s.push(c);
                    }
                },
                c => s.push(c),
            }
        }
        Ok(TokenKind::StringLit(s))
    }

    fn read_escaped_char(&mut self) -> Result<char, RubyError> {
        let c = self.get()?;
        let ch = match c {
            '\'' | '"' | '?' | '\\' => c,
            'a' => '\x07',
            'b' => '\x08',
            'e' => '\x1b',
            'f' => '\x0c',
            'n' => '\x0a',
            'r' => '\x0d',
            's' => ' ',
            't' => '\x09',
            'v' => '\x0b',
            '0' => '\0',
            _ => c,
        };
        Ok(ch)
    }

    fn lex_symbol(&mut self) -> Result<TokenKind, RubyError> {
        match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                self.pos += 1;
                let mut name = self.read_identifier(ch, true);
                // Setter names (`:name=`), but not `:a==` or `:a=>`.
                if self.peek() == Some('=')
                    && !matches!(self.peek_at(1), Some('=') | Some('>'))
                    && !name.ends_with('?')
                    && !name.ends_with('!')
                {
                    name.push('=');
                    self.pos += 1;
                }
                Ok(TokenKind::Symbol(name))
            }
            Some('@') => {
                self.pos += 1;
                match self.peek() {
                    Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                        self.pos += 1;
                        let name = self.read_identifier(ch, false);
                        Ok(TokenKind::Symbol(format!("@{}", name)))
                    }
                    _ => Err(self.error_unexpected('@')),
                }
            }
            Some(_) => {
                for op in OPERATOR_SYMBOLS {
                    if self.starts_with(op) {
                        self.pos += op.chars().count();
                        return Ok(TokenKind::Symbol(op.to_string()));
                    }
                }
                Err(self.error_unexpected(':'))
            }
            None => Err(self.error_unexpected(':')),
        }
    }
}

impl Lexer {
    /// Get one char and move to the next.
    fn get(&mut self) -> Result<char, RubyError> {
        match self.peek() {
            Some(ch) => {
                self.pos += 1;
                Ok(ch)
            }
            None => Err(RubyError::new_parse_err(
                ParseErrKind::UnexpectedEOF,
                Loc(self.len, self.len),
            )),
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.code.get(self.pos + offset).cloned()
    }

    /// Consume the next char if it is `ch`.
    fn consume(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    /// Skip blanks and line breaks. A run containing line
    /// breaks yields a single LineTerm located at the first one.
    fn skip_whitespace(&mut self) -> Option<Token> {
        let mut res = None;
        while let Some(ch) = self.peek() {
            match ch {
                '\n' => {
                    if res.is_none() {
                        res = Some(Annot::new(TokenKind::LineTerm, Loc(self.pos, self.pos)));
                    }
                }
                '\\' if self.peek_at(1) == Some('\n') => self.pos += 1,
                ' ' | '\t' | '\r' => {}
                _ => break,
            }
            self.pos += 1;
        }
        res
    }

    fn goto_eol(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                return;
            }
            self.pos += 1;
        }
    }

    fn cur_loc(&self) -> Loc {
        let end = std::cmp::max(self.token_start_pos, self.pos - 1);
        Loc(self.token_start_pos, end)
    }

    fn error_unexpected(&self, ch: char) -> RubyError {
        RubyError::new_parse_err(ParseErrKind::UnexpectedChar(ch), self.cur_loc())
    }

    fn error_syntax(&self, msg: impl Into<String>) -> RubyError {
        RubyError::new_parse_err(ParseErrKind::SyntaxError(msg.into()), self.cur_loc())
    }
}
