use fxhash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Annot<T> {
    pub kind: T,
    pub loc: Loc,
}

impl<T> Annot<T> {
    pub fn new(kind: T, loc: Loc) -> Self {
        Annot { kind, loc }
    }

    pub fn loc(&self) -> Loc {
        self.loc
    }
}

/// Character range `[start, end]` in the source code (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loc(pub usize, pub usize);

impl Loc {
    pub fn merge(&self, loc: Loc) -> Self {
        use std::cmp::*;
        Loc(min(self.0, loc.0), max(self.1, loc.1))
    }
}

//------------------------------------------------------------

/// Shared, interior-mutable handle to a heap payload.
///
/// Cloning a `Ref` clones the handle, not the payload. Equality and hashing
/// are by identity.
pub struct Ref<T>(Rc<RefCell<T>>);

impl<T> Ref<T> {
    pub fn new(info: T) -> Self {
        Ref(Rc::new(RefCell::new(info)))
    }

    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Address of the payload, used as `object_id`.
    pub fn id(&self) -> u64 {
        Rc::as_ptr(&self.0) as *const u8 as u64
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Ref(self.0.clone())
    }
}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for Ref<T> {}

impl<T> std::hash::Hash for Ref<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.try_borrow() {
            Ok(info) => write!(f, "{:?}", *info),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

//------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceInfo {
    pub path: String,
    pub code: Vec<char>,
    /// Per line: number, offset of its first char, offset of its last char.
    pub line_pos: Vec<(usize, usize, usize)>,
}

impl SourceInfo {
    pub fn new(path: impl Into<String>, code: Vec<char>) -> Self {
        let mut line_pos = vec![];
        let mut top = 0;
        let mut line_no = 1;
        for (i, ch) in code.iter().enumerate() {
            if *ch == '\n' {
                line_pos.push((line_no, top, i));
                line_no += 1;
                top = i + 1;
            }
        }
        line_pos.push((line_no, top, code.len()));
        SourceInfo {
            path: path.into(),
            code,
            line_pos,
        }
    }

    /// Line number (1-origin) of the position `pos`.
    pub fn line_no(&self, pos: usize) -> usize {
        self.line_pos
            .iter()
            .find(|(_, top, end)| *top <= pos && pos <= *end)
            .map(|line| line.0)
            .unwrap_or(1)
    }

    /// Render the lines covered by `loc` and mark the range with '^^^'.
    pub fn get_loc(&self, loc: &Loc) -> String {
        let mut res = String::new();
        for line in &self.line_pos {
            if line.2 < loc.0 || line.1 > loc.1 {
                continue;
            }
            let text: String = self.code[line.1..line.2].iter().collect();
            if self.path.is_empty() {
                res += &format!("{}\n", line.0);
            } else {
                res += &format!("{}:{}\n", self.path, line.0);
            }
            res += &text;
            res.push('\n');
            use std::cmp::*;
            let lead: String = self.code[line.1..max(loc.0, line.1)].iter().collect();
            let end = min(loc.1 + 1, line.2);
            let start = max(loc.0, line.1);
            let marked: String = if start < end {
                self.code[start..end].iter().collect()
            } else {
                String::from(" ")
            };
            res += &" ".repeat(console::measure_text_width(&lead));
            res += &"^".repeat(console::measure_text_width(&marked).max(1));
            res.push('\n');
        }
        res
    }

    pub fn show_loc(&self, loc: &Loc) {
        eprint!("{}", self.get_loc(loc));
    }
}

//------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentId(u32);

impl From<IdentId> for usize {
    fn from(id: IdentId) -> usize {
        id.0 as usize
    }
}

macro_rules! predefined_ids {
    ($($name:ident => $str:expr),* $(,)?) => {
        const PREDEFINED: &[&str] = &[$($str),*];
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        enum Predefined { $($name),* }
        impl IdentId {
            $(pub const $name: IdentId = IdentId(Predefined::$name as u32);)*
        }
    };
}

predefined_ids! {
    INITIALIZE => "initialize",
    NEW => "new",
    TO_S => "to_s",
    INSPECT => "inspect",
    _EQ => "==",
    _NEQ => "!=",
    _NOT => "!",
    METHOD_MISSING => "method_missing",
    MESSAGE => "@message",
    _INDEX => "[]",
    _INDEX_ASSIGN => "[]=",
    _UMINUS => "-@",
}

/// Interning table between identifier names and `IdentId`s.
///
/// One table is owned by each `Evaluator`; the parser borrows it while
/// producing the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierTable {
    table: FxHashMap<String, IdentId>,
    table_rev: Vec<String>,
}

impl Default for IdentifierTable {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierTable {
    pub fn new() -> Self {
        let mut table = IdentifierTable {
            table: FxHashMap::default(),
            table_rev: vec![],
        };
        for name in PREDEFINED {
            table.get_ident_id(*name);
        }
        table
    }

    pub fn get_ident_id(&mut self, name: &str) -> IdentId {
        match self.table.get(name) {
            Some(id) => *id,
            None => {
                let id = IdentId(self.table_rev.len() as u32);
                self.table.insert(name.to_string(), id);
                self.table_rev.push(name.to_string());
                id
            }
        }
    }

    /// Look up an already interned name without registering it.
    pub fn find_ident_id(&self, name: &str) -> Option<IdentId> {
        self.table.get(name).cloned()
    }

    pub fn get_name(&self, id: IdentId) -> &str {
        self.table_rev
            .get(id.0 as usize)
            .map(|s| s.as_str())
            .unwrap_or("<unknown>")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn predefined_ident() {
        let mut table = IdentifierTable::new();
        assert_eq!(IdentId::INITIALIZE, table.get_ident_id("initialize"));
        assert_eq!(IdentId::_INDEX_ASSIGN, table.get_ident_id("[]="));
        let foo = table.get_ident_id("foo");
        assert_eq!(foo, table.get_ident_id("foo"));
        assert_eq!("foo", table.get_name(foo));
        assert_eq!(None, table.find_ident_id("bar"));
    }

    #[test]
    fn source_loc() {
        let info = SourceInfo::new("", "a = 1\nfoo bar\n".chars().collect());
        assert_eq!(2, info.line_no(8));
        assert_eq!("2\nfoo bar\n    ^^^\n", info.get_loc(&Loc(10, 12)));
    }
}
