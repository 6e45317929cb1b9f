use crate::error::{ParseErrKind, RubyError};
use crate::lexer::*;
use crate::node::*;
use crate::token::*;
use crate::stack::ensure_sufficient_stack;
use crate::util::*;
use fxhash::FxHashSet;
use std::convert::TryFrom;

#[derive(Debug)]
pub struct Parser<'a> {
    tokens: Vec<Token>,
    cursor: usize,
    prev_loc: Loc,
    pub source_info: SourceInfo,
    ident_table: &'a mut IdentifierTable,
    scopes: Vec<ParseContext>,
}

#[derive(Debug, Clone, PartialEq)]
struct ParseContext {
    lvar: FxHashSet<IdentId>,
    kind: ContextKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ContextKind {
    Top,
    Class,
    Method,
}

impl ParseContext {
    fn new(kind: ContextKind) -> Self {
        ParseContext {
            lvar: FxHashSet::default(),
            kind,
        }
    }
}

type ParseResult = Result<Node, RubyError>;

impl<'a> Parser<'a> {
    pub fn new(result: LexerResult, ident_table: &'a mut IdentifierTable) -> Self {
        Parser {
            tokens: result.tokens,
            cursor: 0,
            prev_loc: Loc(0, 0),
            source_info: result.source_info,
            ident_table,
            scopes: vec![ParseContext::new(ContextKind::Top)],
        }
    }

    /// Register local variables which already exist in the running program
    /// (used by the REPL, where each line is parsed separately).
    pub fn with_locals(mut self, locals: impl IntoIterator<Item = IdentId>) -> Self {
        if let Some(context) = self.scopes.last_mut() {
            context.lvar.extend(locals);
        }
        self
    }

    /// Tokenize and parse `code`.
    pub fn parse_program(
        code: &str,
        path: &str,
        ident_table: &'a mut IdentifierTable,
    ) -> Result<(Node, SourceInfo), RubyError> {
        let result = Lexer::new(code).tokenize(path)?;
        let mut parser = Parser::new(result, ident_table);
        let node = parser.parse()?;
        Ok((node, parser.source_info))
    }

    pub fn parse(&mut self) -> ParseResult {
        let node = self.parse_comp_stmt()?;
        let tok = self.peek();
        if tok.is_eof() {
            Ok(node)
        } else {
            Err(Self::error_unexpected(tok.loc()))
        }
    }
}

impl<'a> Parser<'a> {
    fn get_ident_id(&mut self, name: &str) -> IdentId {
        self.ident_table.get_ident_id(name)
    }

    fn declare_local(&mut self, id: IdentId) {
        if !self.is_local_var(id) {
            if let Some(context) = self.scopes.last_mut() {
                context.lvar.insert(id);
            }
        }
    }

    /// Method bodies see the locals of enclosing scopes, so the whole stack
    /// is searched.
    fn is_local_var(&self, id: IdentId) -> bool {
        self.scopes.iter().any(|c| c.lvar.contains(&id))
    }

    fn is_method_context(&self) -> bool {
        self.scopes
            .iter()
            .any(|c| c.kind == ContextKind::Method)
    }

    /// Index of the next token that is not a line terminator.
    fn significant(&self) -> usize {
        let mut i = self.cursor;
        while self.tokens[i].is_line_term() {
            i += 1;
        }
        i
    }

    /// The next token, looking past line breaks.
    fn peek(&self) -> &Token {
        &self.tokens[self.significant()]
    }

    /// The token at the cursor, which may be a line break.
    fn current(&self) -> &Token {
        &self.tokens[self.cursor]
    }

    fn at_punct(&self, punct: Punct) -> bool {
        self.current().kind == TokenKind::Punct(punct)
    }

    fn loc(&self) -> Loc {
        self.current().loc()
    }

    fn prev_loc(&self) -> Loc {
        self.prev_loc
    }

    /// Take the next token, looking past line breaks. Running into EOF
    /// means the program was cut short.
    fn get(&mut self) -> Result<Token, RubyError> {
        let i = self.significant();
        let tok = self.tokens[i].clone();
        if tok.is_eof() {
            return Err(Self::error_eof(tok.loc()));
        }
        self.cursor = i + 1;
        self.prev_loc = tok.loc();
        Ok(tok)
    }

    /// Take the token at the cursor. EOF is never consumed.
    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.cursor].clone();
        if !tok.is_eof() {
            self.cursor += 1;
            self.prev_loc = tok.loc();
        }
        tok
    }

    fn consume_punct(&mut self, expect: Punct) -> Result<bool, RubyError> {
        if self.peek().kind == TokenKind::Punct(expect) {
            self.get()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn consume_punct_here(&mut self, expect: Punct) -> Result<bool, RubyError> {
        if self.at_punct(expect) {
            self.get()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn consume_assign_op_here(&mut self) -> Option<BinOp> {
        if let TokenKind::Punct(Punct::AssignOp(op)) = self.current().kind {
            self.advance();
            Some(op)
        } else {
            None
        }
    }

    fn consume_reserved(&mut self, expect: Reserved) -> Result<bool, RubyError> {
        if self.peek().kind == TokenKind::Reserved(expect) {
            self.get()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn consume_reserved_here(&mut self, expect: Reserved) -> bool {
        if self.current().kind == TokenKind::Reserved(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip a run of newlines and ';'. False if there was none.
    fn consume_term(&mut self) -> bool {
        if !self.current().is_term() {
            return false;
        };
        while self.current().is_term() {
            if self.advance().is_eof() {
                return true;
            }
        }
        true
    }

    fn expect_reserved(&mut self, expect: Reserved) -> Result<(), RubyError> {
        match &self.get()?.kind {
            TokenKind::Reserved(reserved) if *reserved == expect => Ok(()),
            _ => Err(Self::error_syntax(
                self.prev_loc(),
                format!("expected '{}'", expect.as_str()),
            )),
        }
    }

    fn expect_punct(&mut self, expect: Punct) -> Result<(), RubyError> {
        match &self.get()?.kind {
            TokenKind::Punct(punct) if *punct == expect => Ok(()),
            _ => Err(Self::error_unexpected(self.prev_loc())),
        }
    }

    /// Get the next token and return its IdentId if it is an identifier.
    fn expect_ident(&mut self) -> Result<IdentId, RubyError> {
        match &self.get()?.kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                Ok(self.get_ident_id(&name))
            }
            _ => Err(Self::error_syntax(self.prev_loc(), "expected identifier")),
        }
    }

    /// True if whitespace separates the previous token and the next one.
    fn trailing_space(&self) -> bool {
        self.current().loc().0 > self.prev_loc.1 + 1
    }

    /// True if the token following `tok` (the next token) is followed by whitespace.
    fn has_trailing_space(&self, tok: &Token) -> bool {
        match self.tokens.get(self.cursor + 1) {
            Some(next) => next.loc().0 > tok.loc().1 + 1,
            None => true,
        }
    }

    /// True if '(' follows the previous token without a gap.
    fn trailing_lparen(&self) -> bool {
        self.at_punct(Punct::LParen) && !self.trailing_space()
    }

    fn error_unexpected(loc: Loc) -> RubyError {
        RubyError::new_parse_err(ParseErrKind::UnexpectedToken, loc)
    }

    fn error_syntax(loc: Loc, msg: impl Into<String>) -> RubyError {
        RubyError::new_parse_err(ParseErrKind::SyntaxError(msg.into()), loc)
    }

    fn error_eof(loc: Loc) -> RubyError {
        RubyError::new_parse_err(ParseErrKind::UnexpectedEOF, loc)
    }
}

impl<'a> Parser<'a> {
    fn is_stmt_end(tok: &Token) -> bool {
        match tok.kind {
            TokenKind::EOF => true,
            TokenKind::Reserved(reserved) => matches!(
                reserved,
                Reserved::Else
                    | Reserved::Elsif
                    | Reserved::End
                    | Reserved::Rescue
                    | Reserved::Ensure
                    | Reserved::Then
            ),
            TokenKind::Punct(Punct::RParen) => true,
            _ => false,
        }
    }

    fn parse_comp_stmt(&mut self) -> ParseResult {
        // COMP_STMT : (STMT (TERM STMT)*)? (TERM+)?
        self.consume_term();
        let loc = self.loc();
        let mut nodes = vec![];
        loop {
            if Self::is_stmt_end(self.peek()) {
                break;
            }
            let node = self.parse_stmt()?;
            nodes.push(node);
            if !self.consume_term() {
                break;
            }
        }
        Ok(Node::new_comp_stmt(nodes, loc))
    }

    fn parse_stmt(&mut self) -> ParseResult {
        // STMT : EXPR
        // | STMT [no-term] if EXPR
        // | STMT [no-term] unless EXPR
        // | STMT [no-term] while EXPR
        let mut node = self.parse_expr()?;
        loop {
            if self.consume_reserved_here(Reserved::If) {
                let loc = self.prev_loc();
                let cond = self.parse_expr()?;
                node = Node::new_if(cond, node, Node::new_nop(loc), loc);
            } else if self.consume_reserved_here(Reserved::Unless) {
                let loc = self.prev_loc();
                let cond = self.parse_expr()?;
                node = Node::new_if(cond, Node::new_nop(loc), node, loc);
            } else if self.consume_reserved_here(Reserved::While) {
                let loc = self.prev_loc();
                let cond = self.parse_expr()?;
                node = Node::new_while(cond, node, loc);
            } else {
                break;
            }
        }
        Ok(node)
    }

    fn parse_expr(&mut self) -> ParseResult {
        // EXPR : not EXPR
        // | ARG
        if self.consume_reserved(Reserved::Not)? {
            let loc = self.prev_loc();
            let node = self.parse_expr()?;
            return Ok(Node::new_not(node, loc));
        }
        self.parse_arg()
    }

    fn parse_arg(&mut self) -> ParseResult {
        ensure_sufficient_stack(|| self.parse_assignment())
    }

    fn parse_assignment(&mut self) -> ParseResult {
        let lhs = self.parse_arg_logical_or()?;
        if self.consume_punct_here(Punct::Assign)? {
            self.check_lhs(&lhs)?;
            let rhs = self.parse_arg()?;
            Ok(Node::new_assign(lhs, rhs))
        } else if let Some(op) = self.consume_assign_op_here() {
            // <lhs> <assign_op> <arg>  =>  <lhs> = <lhs> op <arg>
            self.check_lhs(&lhs)?;
            let rhs = self.parse_arg()?;
            let method = self.get_ident_id(op.method_name());
            let value = Node::new_binop(method, lhs.clone(), rhs);
            Ok(Node::new_assign(lhs, value))
        } else {
            Ok(lhs)
        }
    }

    fn parse_arg_logical_or(&mut self) -> ParseResult {
        let mut lhs = self.parse_arg_logical_and()?;
        while self.consume_punct_here(Punct::LOr)? {
            let rhs = self.parse_arg_logical_and()?;
            lhs = Node::new_or(lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_arg_logical_and(&mut self) -> ParseResult {
        let mut lhs = self.parse_arg_eq()?;
        while self.consume_punct_here(Punct::LAnd)? {
            let rhs = self.parse_arg_eq()?;
            lhs = Node::new_and(lhs, rhs);
        }
        Ok(lhs)
    }

    // 4==4==4 => SyntaxError
    fn parse_arg_eq(&mut self) -> ParseResult {
        let lhs = self.parse_arg_comp()?;
        for punct in &[Punct::Eq, Punct::TEq, Punct::Ne] {
            if self.consume_punct_here(*punct)? {
                let rhs = self.parse_arg_comp()?;
                return Ok(self.new_binop(*punct, lhs, rhs));
            }
        }
        Ok(lhs)
    }

    fn parse_arg_comp(&mut self) -> ParseResult {
        let mut lhs = self.parse_arg_bitor()?;
        'outer: loop {
            for punct in &[Punct::Ge, Punct::Gt, Punct::Le, Punct::Lt, Punct::Cmp] {
                if self.consume_punct_here(*punct)? {
                    let rhs = self.parse_arg_bitor()?;
                    lhs = self.new_binop(*punct, lhs, rhs);
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn parse_arg_bitor(&mut self) -> ParseResult {
        let mut lhs = self.parse_arg_bitand()?;
        while self.consume_punct_here(Punct::BitOr)? {
            let rhs = self.parse_arg_bitand()?;
            lhs = self.new_binop(Punct::BitOr, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_arg_bitand(&mut self) -> ParseResult {
        let mut lhs = self.parse_arg_shift()?;
        while self.consume_punct_here(Punct::BitAnd)? {
            let rhs = self.parse_arg_shift()?;
            lhs = self.new_binop(Punct::BitAnd, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_arg_shift(&mut self) -> ParseResult {
        let mut lhs = self.parse_arg_add()?;
        while self.consume_punct_here(Punct::Shl)? {
            let rhs = self.parse_arg_add()?;
            lhs = self.new_binop(Punct::Shl, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_arg_add(&mut self) -> ParseResult {
        let mut lhs = self.parse_arg_mul()?;
        'outer: loop {
            for punct in &[Punct::Plus, Punct::Minus] {
                if self.consume_punct_here(*punct)? {
                    let rhs = self.parse_arg_mul()?;
                    lhs = self.new_binop(*punct, lhs, rhs);
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn parse_arg_mul(&mut self) -> ParseResult {
        let mut lhs = self.parse_unary_minus()?;
        'outer: loop {
            for punct in &[Punct::Mul, Punct::Div, Punct::Rem] {
                if self.consume_punct_here(*punct)? {
                    let rhs = self.parse_unary_minus()?;
                    lhs = self.new_binop(*punct, lhs, rhs);
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn parse_unary_minus(&mut self) -> ParseResult {
        if !self.consume_punct(Punct::Minus)? {
            return self.parse_exponent();
        }
        let loc = self.prev_loc();
        // A numeric literal takes the sign itself (`-5.abs` is `(-5).abs`),
        // except before `**`: `-2 ** 2` is `-(2 ** 2)`.
        if !self.pow_follows_literal() {
            let literal_loc = loc.merge(self.current().loc());
            let literal = match self.current().kind {
                TokenKind::NumLit(num) => match i64::try_from(-i128::from(num)) {
                    Ok(i) => Some(Node::new_integer(i, literal_loc)),
                    Err(_) => return Err(Self::error_syntax(literal_loc, "integer literal too big")),
                },
                TokenKind::FloatLit(f) => Some(Node::new_float(-f, literal_loc)),
                _ => None,
            };
            if let Some(literal) = literal {
                self.advance();
                return self.parse_postfix(literal);
            }
        }
        let node = self.parse_unary_minus()?;
        let loc = loc.merge(node.loc());
        Ok(Node::new_send(Some(node), IdentId::_UMINUS, vec![], loc))
    }

    fn pow_follows_literal(&self) -> bool {
        self.tokens
            .get(self.cursor + 1)
            .map_or(false, |tok| tok.kind == TokenKind::Punct(Punct::Pow))
    }

    fn parse_exponent(&mut self) -> ParseResult {
        let lhs = self.parse_unary()?;
        if self.consume_punct_here(Punct::Pow)? {
            let rhs = self.parse_unary_minus()?;
            Ok(self.new_binop(Punct::Pow, lhs, rhs))
        } else {
            Ok(lhs)
        }
    }

    fn parse_unary(&mut self) -> ParseResult {
        if self.consume_punct(Punct::Not)? {
            let loc = self.prev_loc();
            let node = self.parse_unary()?;
            Ok(Node::new_not(node, loc))
        } else {
            self.parse_method_call()
        }
    }

    fn new_binop(&mut self, punct: Punct, lhs: Node, rhs: Node) -> Node {
        let name = punct.operator_name().unwrap_or("");
        let method = self.get_ident_id(name);
        Node::new_binop(method, lhs, rhs)
    }

    fn parse_method_call(&mut self) -> ParseResult {
        let node = self.parse_primary()?;
        self.parse_postfix(node)
    }

    /// Method calls and indexing chained onto `node`.
    fn parse_postfix(&mut self, mut node: Node) -> ParseResult {
        loop {
            node = if self.consume_punct(Punct::Dot)? {
                self.parse_primary_method(node)?
            } else if self.at_punct(Punct::LBracket) && !self.trailing_space() {
                self.get()?;
                let loc = self.prev_loc();
                let args = self.parse_args(Some(Punct::RBracket))?;
                let loc = loc.merge(self.prev_loc());
                Node::new_send(Some(node), IdentId::_INDEX, args, loc)
            } else {
                return Ok(node);
            };
        }
    }

    /// Parse a method call after '.'.
    fn parse_primary_method(&mut self, receiver: Node) -> ParseResult {
        let (id, loc) = self.parse_method_name()?;
        let args = if self.trailing_lparen() {
            self.get()?;
            self.parse_args(Some(Punct::RParen))?
        } else if self.is_command() {
            self.parse_args(None)?
        } else {
            vec![]
        };
        let loc = loc.merge(self.prev_loc());
        Ok(Node::new_send(Some(receiver), id, args, loc))
    }

    /// Parse method name. Keywords and operators are allowed after '.'.
    fn parse_method_name(&mut self) -> Result<(IdentId, Loc), RubyError> {
        let tok = self.get()?;
        let loc = tok.loc();
        let id = match &tok.kind {
            TokenKind::Ident(s) | TokenKind::Const(s) => self.get_ident_id(s),
            TokenKind::Reserved(r) => self.get_ident_id(r.as_str()),
            TokenKind::Punct(p) => self.parse_op_definable(*p)?,
            _ => {
                return Err(Self::error_syntax(
                    loc,
                    "method name must be an identifier",
                ))
            }
        };
        Ok((id, loc.merge(self.prev_loc())))
    }

    fn parse_op_definable(&mut self, punct: Punct) -> Result<IdentId, RubyError> {
        if punct == Punct::LBracket {
            if self.consume_punct_here(Punct::RBracket)? {
                if !self.trailing_space() && self.consume_punct_here(Punct::Assign)? {
                    return Ok(IdentId::_INDEX_ASSIGN);
                }
                return Ok(IdentId::_INDEX);
            }
            return Err(Self::error_syntax(self.loc(), "invalid operator"));
        }
        match punct.operator_name() {
            Some(name) => Ok(self.get_ident_id(name)),
            None => Err(Self::error_syntax(self.prev_loc(), "invalid operator")),
        }
    }

    fn parse_primary(&mut self) -> ParseResult {
        let tok = self.get()?;
        let loc = tok.loc();
        match tok.kind {
            TokenKind::Ident(name) => {
                let id = self.get_ident_id(&name);
                if self.trailing_lparen() {
                    // FNAME ( ARGS )
                    self.get()?;
                    let args = self.parse_args(Some(Punct::RParen))?;
                    let loc = loc.merge(self.prev_loc());
                    return Ok(Node::new_send(None, id, args, loc));
                };
                if self.is_local_var(id) {
                    Ok(Node::new_identifier(id, loc))
                } else if self.is_command() {
                    // FNAME ARGS
                    let args = self.parse_args(None)?;
                    Ok(Node::new_send(None, id, args, loc))
                } else {
                    Ok(Node::new_identifier(id, loc))
                }
            }
            TokenKind::InstanceVar(name) => {
                let id = self.get_ident_id(&name);
                Ok(Node::new_instance_var(id, loc))
            }
            TokenKind::Const(name) => {
                let id = self.get_ident_id(&name);
                if self.trailing_lparen() {
                    self.get()?;
                    let args = self.parse_args(Some(Punct::RParen))?;
                    let loc = loc.merge(self.prev_loc());
                    Ok(Node::new_send(None, id, args, loc))
                } else {
                    Ok(Node::new_const(id, loc))
                }
            }
            TokenKind::NumLit(num) => match i64::try_from(num) {
                Ok(i) => Ok(Node::new_integer(i, loc)),
                Err(_) => Err(Self::error_syntax(loc, "integer literal too big")),
            },
            TokenKind::FloatLit(num) => Ok(Node::new_float(num, loc)),
            TokenKind::StringLit(s) => Ok(Node::new_string(s, loc)),
            TokenKind::Symbol(name) => {
                let id = self.get_ident_id(&name);
                Ok(Node::new_symbol(id, loc))
            }
            TokenKind::Punct(Punct::LParen) => {
                let node = self.parse_comp_stmt()?;
                self.expect_punct(Punct::RParen)?;
                Ok(node)
            }
            TokenKind::Punct(Punct::LBracket) => {
                // Array literal
                let nodes = self.parse_args(Some(Punct::RBracket))?;
                let loc = loc.merge(self.prev_loc());
                Ok(Node::new_array(nodes, loc))
            }
            TokenKind::Reserved(reserved) => match reserved {
                Reserved::Nil => Ok(Node::new_nil(loc)),
                Reserved::True => Ok(Node::new_bool(true, loc)),
                Reserved::False => Ok(Node::new_bool(false, loc)),
                Reserved::SelfValue => Ok(Node::new_self(loc)),
                Reserved::If => {
                    let node = self.parse_if_then(loc)?;
                    self.expect_reserved(Reserved::End)?;
                    Ok(node)
                }
                Reserved::Unless => self.parse_unless(loc),
                Reserved::While => self.parse_while(loc),
                Reserved::Def => self.parse_def(loc),
                Reserved::Class => {
                    if self.is_method_context() {
                        return Err(Self::error_syntax(loc, "class definition in method body"));
                    }
                    self.parse_class(loc)
                }
                Reserved::Begin => self.parse_begin(loc),
                Reserved::Return => {
                    let val = self.parse_break_value(loc)?;
                    Ok(Node::new_return(val, loc))
                }
                Reserved::Break => {
                    let val = self.parse_break_value(loc)?;
                    Ok(Node::new_break(val, loc))
                }
                Reserved::Next => {
                    let val = self.parse_break_value(loc)?;
                    Ok(Node::new_next(val, loc))
                }
                _ => Err(Self::error_unexpected(loc)),
            },
            TokenKind::EOF => Err(Self::error_eof(loc)),
            _ => Err(Self::error_unexpected(loc)),
        }
    }

    /// Parse arguments up to `terminator`, or a command argument list when
    /// `terminator` is None.
    fn parse_args(&mut self, terminator: Option<Punct>) -> Result<NodeVec, RubyError> {
        let mut args = vec![];
        match terminator {
            Some(terminator) => loop {
                if self.consume_punct(terminator)? {
                    return Ok(args);
                }
                args.push(self.parse_arg()?);
                if !self.consume_punct(Punct::Comma)? {
                    self.expect_punct(terminator)?;
                    return Ok(args);
                }
            },
            None => loop {
                args.push(self.parse_arg()?);
                if !self.consume_punct_here(Punct::Comma)? {
                    return Ok(args);
                }
            },
        }
    }

    /// Decide whether an identifier followed by the next token starts a
    /// command call (`puts -1`, `foo 'bar'`) rather than an operand.
    fn is_command(&self) -> bool {
        let tok = self.current();
        if self.trailing_space() {
            match tok.kind {
                TokenKind::LineTerm | TokenKind::EOF => false,
                TokenKind::Punct(p) => match p {
                    Punct::LParen | Punct::LBracket | Punct::Not => true,
                    Punct::Minus | Punct::Mul => !self.has_trailing_space(tok),
                    _ => false,
                },
                TokenKind::Reserved(r) => !matches!(
                    r,
                    Reserved::Do
                        | Reserved::If
                        | Reserved::Unless
                        | Reserved::While
                        | Reserved::Then
                        | Reserved::End
                        | Reserved::Else
                        | Reserved::Elsif
                        | Reserved::Rescue
                        | Reserved::Ensure
                ),
                _ => true,
            }
        } else {
            matches!(
                tok.kind,
                TokenKind::InstanceVar(_) | TokenKind::StringLit(_) | TokenKind::NumLit(_)
            )
        }
    }

    /// Check whether `lhs` can be assigned to, and register new local variables.
    fn check_lhs(&mut self, lhs: &Node) -> Result<(), RubyError> {
        match &lhs.kind {
            NodeKind::Ident(id) => {
                self.declare_local(*id);
                Ok(())
            }
            NodeKind::InstanceVar(_) => Ok(()),
            NodeKind::Const(_) => {
                if self.is_method_context() {
                    Err(Self::error_syntax(lhs.loc(), "dynamic constant assignment"))
                } else {
                    Ok(())
                }
            }
            NodeKind::Send {
                receiver: Some(_),
                method,
                args,
            } if args.is_empty() || *method == IdentId::_INDEX => Ok(()),
            _ => Err(Self::error_syntax(lhs.loc(), "unexpected assignment")),
        }
    }

    fn parse_then(&mut self) -> Result<(), RubyError> {
        if self.consume_term() {
            self.consume_reserved(Reserved::Then)?;
            return Ok(());
        }
        self.expect_reserved(Reserved::Then)
    }

    fn parse_do(&mut self) -> Result<(), RubyError> {
        if self.consume_term() {
            self.consume_reserved(Reserved::Do)?;
            return Ok(());
        }
        self.expect_reserved(Reserved::Do)
    }

    fn parse_if_then(&mut self, loc: Loc) -> ParseResult {
        //  if EXPR THEN
        //      COMPSTMT
        //      (elsif EXPR THEN COMPSTMT)*
        //      [else COMPSTMT]
        //  end
        let cond = self.parse_expr()?;
        self.parse_then()?;
        let then_ = self.parse_comp_stmt()?;
        let else_ = if self.consume_reserved(Reserved::Elsif)? {
            let loc = self.prev_loc();
            self.parse_if_then(loc)?
        } else if self.consume_reserved(Reserved::Else)? {
            self.parse_comp_stmt()?
        } else {
            Node::new_nop(self.loc())
        };
        Ok(Node::new_if(cond, then_, else_, loc))
    }

    fn parse_unless(&mut self, loc: Loc) -> ParseResult {
        //  unless EXPR THEN
        //      COMPSTMT
        //      [else COMPSTMT]
        //  end
        let cond = self.parse_expr()?;
        self.parse_then()?;
        let then_ = self.parse_comp_stmt()?;
        let else_ = if self.consume_reserved(Reserved::Else)? {
            self.parse_comp_stmt()?
        } else {
            Node::new_nop(self.loc())
        };
        self.expect_reserved(Reserved::End)?;
        Ok(Node::new_if(cond, else_, then_, loc))
    }

    fn parse_while(&mut self, loc: Loc) -> ParseResult {
        let cond = self.parse_expr()?;
        self.parse_do()?;
        let body = self.parse_comp_stmt()?;
        self.expect_reserved(Reserved::End)?;
        let loc = loc.merge(self.prev_loc());
        Ok(Node::new_while(cond, body, loc))
    }

    /// Optional value of return/break/next.
    fn parse_break_value(&mut self, loc: Loc) -> ParseResult {
        let tok = self.current();
        if tok.is_term()
            || Self::is_stmt_end(tok)
            || tok.kind == TokenKind::Reserved(Reserved::If)
            || tok.kind == TokenKind::Reserved(Reserved::Unless)
            || tok.kind == TokenKind::Reserved(Reserved::While)
        {
            return Ok(Node::new_nil(loc));
        }
        self.parse_arg()
    }

    fn parse_def(&mut self, loc: Loc) -> ParseResult {
        //  def FNAME ARGDECL
        //      BODYSTMT
        //  end
        //  def (self | CONST) . FNAME ARGDECL
        //      BODYSTMT
        //  end
        let tok = self.get()?;
        let singleton = match &tok.kind {
            TokenKind::Reserved(Reserved::SelfValue) if self.at_punct(Punct::Dot) => {
                Some(Node::new_self(tok.loc()))
            }
            TokenKind::Const(name) if self.at_punct(Punct::Dot) => {
                let id = self.get_ident_id(name);
                Some(Node::new_const(id, tok.loc()))
            }
            _ => None,
        };
        let name = match singleton {
            Some(_) => {
                self.get()?;
                let tok = self.get()?;
                self.parse_method_def_name(&tok)?
            }
            None => self.parse_method_def_name(&tok)?,
        };

        self.scopes.push(ParseContext::new(ContextKind::Method));
        let params = self.parse_def_params()?;
        let body = self.parse_body_stmt()?;
        self.scopes.pop();
        self.expect_reserved(Reserved::End)?;
        let loc = loc.merge(self.prev_loc());
        match singleton {
            Some(singleton) => Ok(Node::new_singleton_method_decl(
                singleton, name, params, body, loc,
            )),
            None => Ok(Node::new_method_decl(name, params, body, loc)),
        }
    }

    /// Method definition name: an identifier (optionally a setter `name=`),
    /// a keyword, or an operator.
    fn parse_method_def_name(&mut self, tok: &Token) -> Result<IdentId, RubyError> {
        let name = match &tok.kind {
            TokenKind::Ident(s) | TokenKind::Const(s) => s.clone(),
            TokenKind::Reserved(r) => r.as_str().to_string(),
            TokenKind::Punct(p) => return self.parse_op_definable(*p),
            _ => return Err(Self::error_syntax(tok.loc(), "invalid method name")),
        };
        let is_setter = !name.ends_with('?')
            && !name.ends_with('!')
            && self.at_punct(Punct::Assign)
            && !self.trailing_space();
        if is_setter {
            self.get()?;
            Ok(self.get_ident_id(&format!("{}=", name)))
        } else {
            Ok(self.get_ident_id(&name))
        }
    }

    fn parse_def_params(&mut self) -> Result<Vec<Param>, RubyError> {
        if self.consume_term() {
            return Ok(vec![]);
        }
        let paren = self.consume_punct_here(Punct::LParen)?;
        let mut params = vec![];
        let has_params = if paren {
            !self.consume_punct(Punct::RParen)?
        } else {
            matches!(self.current().kind, TokenKind::Ident(_))
        };
        if has_params {
            loop {
                let loc = self.loc();
                let name = self.expect_ident()?;
                if params.iter().any(|p: &Param| p.name == name) {
                    return Err(Self::error_syntax(loc, "duplicated argument name"));
                }
                self.declare_local(name);
                let default = if self.consume_punct_here(Punct::Assign)? {
                    Some(self.parse_arg()?)
                } else {
                    if params.iter().any(|p: &Param| p.default.is_some()) {
                        return Err(Self::error_syntax(
                            loc,
                            "required argument after optional argument",
                        ));
                    }
                    None
                };
                params.push(Param::new(name, default));
                if !self.consume_punct(Punct::Comma)? {
                    break;
                }
            }
            if paren {
                self.expect_punct(Punct::RParen)?;
            }
        }
        self.consume_term();
        Ok(params)
    }

    fn parse_class(&mut self, loc: Loc) -> ParseResult {
        //  class CONST [< EXPR] TERM
        //      BODYSTMT
        //  end
        let tok = self.get()?;
        let name = match &tok.kind {
            TokenKind::Const(name) => self.get_ident_id(name),
            _ => {
                return Err(Self::error_syntax(
                    tok.loc(),
                    "class/module name must be CONSTANT",
                ))
            }
        };
        let superclass = if self.consume_punct_here(Punct::Lt)? {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.consume_term();
        self.scopes.push(ParseContext::new(ContextKind::Class));
        let body = self.parse_body_stmt()?;
        self.scopes.pop();
        self.expect_reserved(Reserved::End)?;
        let loc = loc.merge(self.prev_loc());
        Ok(Node::new_class_decl(name, superclass, body, loc))
    }

    fn parse_begin(&mut self, loc: Loc) -> ParseResult {
        let node = self.parse_body_stmt()?;
        self.expect_reserved(Reserved::End)?;
        match node.kind {
            NodeKind::Begin { .. } => Ok(node),
            // `begin ... end` without clauses is just a statement sequence.
            _ => {
                let loc = loc.merge(self.prev_loc());
                Ok(Node::new_comp_stmt(vec![node], loc))
            }
        }
    }

    /// BODYSTMT : COMPSTMT (rescue [CLASSES] [=> VAR] THEN COMPSTMT)* [else COMPSTMT] [ensure COMPSTMT]
    ///
    /// Shared by `begin`, `def` and `class` bodies. Returns a plain compound
    /// statement when no clause is present.
    fn parse_body_stmt(&mut self) -> ParseResult {
        let body = self.parse_comp_stmt()?;
        let loc = body.loc();
        let mut rescue = vec![];
        while self.consume_reserved(Reserved::Rescue)? {
            let mut param = None;
            let mut exception_list = vec![];
            if !self.consume_term() {
                if !self.at_punct(Punct::FatArrow) {
                    exception_list = self.parse_args(None)?;
                };
                if self.consume_punct_here(Punct::FatArrow)? {
                    let id = self.expect_ident()?;
                    self.declare_local(id);
                    param = Some(id);
                }
                self.parse_then()?;
            };
            let rescue_body = self.parse_comp_stmt()?;
            rescue.push(RescueEntry::new(exception_list, param, rescue_body));
        }
        let else_ = if self.consume_reserved(Reserved::Else)? {
            if rescue.is_empty() {
                return Err(Self::error_syntax(
                    self.prev_loc(),
                    "else without rescue is useless",
                ));
            }
            Some(self.parse_comp_stmt()?)
        } else {
            None
        };
        let ensure = if self.consume_reserved(Reserved::Ensure)? {
            Some(self.parse_comp_stmt()?)
        } else {
            None
        };
        if rescue.is_empty() && ensure.is_none() {
            return Ok(body);
        }
        let loc = loc.merge(self.prev_loc());
        let else_ = else_.unwrap_or_else(|| Node::new_nop(loc));
        let ensure = ensure.unwrap_or_else(|| Node::new_nop(loc));
        Ok(Node::new_begin(body, rescue, else_, ensure, loc))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(code: &str) -> Result<String, RubyError> {
        let mut table = IdentifierTable::new();
        let (node, _) = Parser::parse_program(code, "", &mut table)?;
        Ok(node.dump(&table))
    }

    fn assert_ast(code: &str, expected: &str) {
        match parse(code) {
            Ok(ast) => assert_eq!(expected, ast),
            Err(err) => panic!("{:?}", err),
        }
    }

    #[test]
    fn integer_and_float() {
        assert_ast("5", "(stmts 5)");
        assert_ast("123.4567", "(stmts 123.4567)");
        assert_ast("-3 - -2.5", "(stmts (send -3 - -2.5))");
        assert_ast("-9223372036854775808", "(stmts -9223372036854775808)");
        assert_ast("-5.abs", "(stmts (send -5 abs))");
        assert_ast("-a", "(stmts (send a -@))");
        assert!(parse("9223372036854775808").unwrap_err().is_parse_err());
        assert!(parse("-9223372036854775809").unwrap_err().is_parse_err());
        assert!(parse("99999999999999999999").unwrap_err().is_parse_err());
    }

    #[test]
    fn string_and_symbol() {
        assert_ast("'hello world'", r#"(stmts "hello world")"#);
        assert_ast(":foo\n:bar", "(stmts :foo :bar)");
    }

    #[test]
    fn bare_reference() {
        assert_ast("foo", "(stmts foo)");
    }

    #[test]
    fn call_expressions() {
        assert_ast("puts 'foo'", r#"(stmts (call puts "foo"))"#);
        assert_ast(
            "puts('foo', 'bar', 'baz')",
            r#"(stmts (call puts "foo" "bar" "baz"))"#,
        );
        assert_ast("puts()", "(stmts (call puts))");
        assert_ast("\nputs()\n", "(stmts (call puts))");
    }

    #[test]
    fn command_or_operator() {
        assert_ast("x = 3\nx -1", "(stmts (= x 3) (send x - 1))");
        assert_ast("puts -1", "(stmts (call puts -1))");
        assert_ast("a.b c, :d", "(stmts (send a b c :d))");
        assert_ast("a.b - c", "(stmts (send (send a b) - c))");
    }

    #[test]
    fn precedence() {
        assert_ast("1 + 2 * 3", "(stmts (send 1 + (send 2 * 3)))");
        assert_ast("-2 ** 2", "(stmts (send (send 2 ** 2) -@))");
        assert_ast(
            "a || b && !c == d",
            "(stmts (|| a (&& b (send (! c) == d))))",
        );
        assert_ast("[1, 2][0] = 5", "(stmts (= (send (array 1 2) [] 0) 5))");
    }

    #[test]
    fn assign_op() {
        assert_ast("a = 1; a += 2", "(stmts (= a 1) (= a (send a + 2)))");
        assert_ast("@x *= 2", "(stmts (= @x (send @x * 2)))");
    }

    #[test]
    fn if_unless_while() {
        assert_ast(
            "if a then 1 elsif b then 2 else 3 end",
            "(stmts (if a (stmts 1) (if b (stmts 2) (stmts 3))))",
        );
        assert_ast("x = 1 unless y", "(stmts (if y (stmts) (= x 1)))");
        assert_ast(
            "while i < 3 do i += 1 end",
            "(stmts (while (send i < 3) (stmts (= i (send i + 1)))))",
        );
    }

    #[test]
    fn method_definition() {
        assert_ast(
            "def foo(a, b = 2)\n a + b\nend",
            "(stmts (def foo (a (b 2)) (stmts (send a + b))))",
        );
        assert_ast("def x=(v); @x = v; end", "(stmts (def x= (v) (stmts (= @x v))))");
        assert_ast("def +(o) end", "(stmts (def + (o) (stmts)))");
        assert_ast("def [](i) end", "(stmts (def [] (i) (stmts)))");
        assert_ast("def self.create end", "(stmts (defs self create () (stmts)))");
    }

    #[test]
    fn class_definition() {
        assert_ast(
            "class Foo < Bar\n  def baz; end\nend",
            "(stmts (class Foo Bar (stmts (def baz () (stmts)))))",
        );
        assert_ast("class Foo; end", "(stmts (class Foo nil (stmts)))");
    }

    #[test]
    fn begin_rescue() {
        assert_ast(
            "begin\n  1\nrescue ArgumentError, TypeError => e\n  2\nelse\n  3\nensure\n  4\nend",
            "(stmts (begin (stmts 1) (rescue (ArgumentError TypeError) e (stmts 2)) (else (stmts 3)) (ensure (stmts 4))))",
        );
        assert_ast(
            "def f\n  g\nrescue\n  nil\nend",
            "(stmts (def f () (begin (stmts g) (rescue () (stmts nil)))))",
        );
    }

    #[test]
    fn return_break_next() {
        assert_ast("return", "(stmts (return nil))");
        assert_ast("return 1 if x", "(stmts (if x (return 1) (stmts)))");
        assert_ast(
            "while true; break 3; next; end",
            "(stmts (while true (stmts (break 3) (next nil))))",
        );
    }

    #[test]
    fn parse_errors() {
        let err = parse("def foo").unwrap_err();
        assert!(err.is_unexpected_eof());
        let err = parse("1 + )").unwrap_err();
        assert!(err.is_parse_err());
        let err = parse("def f; class A; end; end").unwrap_err();
        assert!(err.is_parse_err());
        let err = parse("end").unwrap_err();
        assert!(err.is_parse_err());
    }
}
