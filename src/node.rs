use crate::util::{Annot, IdentId, IdentifierTable, Loc};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    SelfValue,
    Nil,
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Symbol(IdentId),
    Array(NodeVec),

    /// Bare reference: a local variable or a zero-argument call on self.
    Ident(IdentId),
    InstanceVar(IdentId),
    Const(IdentId),

    Assign(Box<Node>, Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),

    CompStmt(NodeVec),
    If {
        cond: Box<Node>,
        then_: Box<Node>,
        else_: Box<Node>,
    },
    While {
        cond: Box<Node>,
        body: Box<Node>,
    },
    Begin {
        body: Box<Node>,
        rescue: Vec<RescueEntry>,
        else_: Box<Node>,
        ensure: Box<Node>,
    },
    Break(Box<Node>),
    Next(Box<Node>),
    Return(Box<Node>),

    MethodDef {
        name: IdentId,
        params: Rc<Vec<Param>>,
        body: Rc<Node>,
    },
    SingletonMethodDef {
        singleton: Box<Node>,
        name: IdentId,
        params: Rc<Vec<Param>>,
        body: Rc<Node>,
    },
    ClassDef {
        name: IdentId,
        superclass: Option<Box<Node>>,
        body: Box<Node>,
    },
    /// Method call. A missing receiver means a function-style call on self.
    Send {
        receiver: Option<Box<Node>>,
        method: IdentId,
        args: NodeVec,
    },
}

pub type Node = Annot<NodeKind>;
pub type NodeVec = Vec<Node>;

/// A formal parameter of a method definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: IdentId,
    pub default: Option<Node>,
}

impl Param {
    pub fn new(name: IdentId, default: Option<Node>) -> Self {
        Param { name, default }
    }
}

/// One `rescue` clause of a begin block.
#[derive(Debug, Clone, PartialEq)]
pub struct RescueEntry {
    /// Exception classes to match; empty means StandardError.
    pub exception_list: NodeVec,
    pub param: Option<IdentId>,
    pub body: Box<Node>,
}

impl RescueEntry {
    pub fn new(exception_list: NodeVec, param: Option<IdentId>, body: Node) -> Self {
        RescueEntry {
            exception_list,
            param,
            body: Box::new(body),
        }
    }
}

impl Node {
    pub fn new_nil(loc: Loc) -> Self {
        Node::new(NodeKind::Nil, loc)
    }

    pub fn new_integer(num: i64, loc: Loc) -> Self {
        Node::new(NodeKind::Integer(num), loc)
    }

    pub fn new_bool(b: bool, loc: Loc) -> Self {
        Node::new(NodeKind::Bool(b), loc)
    }

    pub fn new_float(num: f64, loc: Loc) -> Self {
        Node::new(NodeKind::Float(num), loc)
    }

    pub fn new_string(s: impl Into<String>, loc: Loc) -> Self {
        Node::new(NodeKind::String(s.into()), loc)
    }

    pub fn new_symbol(id: IdentId, loc: Loc) -> Self {
        Node::new(NodeKind::Symbol(id), loc)
    }

    pub fn new_array(nodes: NodeVec, loc: Loc) -> Self {
        Node::new(NodeKind::Array(nodes), loc)
    }

    pub fn new_self(loc: Loc) -> Self {
        Node::new(NodeKind::SelfValue, loc)
    }

    pub fn new_identifier(id: IdentId, loc: Loc) -> Self {
        Node::new(NodeKind::Ident(id), loc)
    }

    pub fn new_instance_var(id: IdentId, loc: Loc) -> Self {
        Node::new(NodeKind::InstanceVar(id), loc)
    }

    pub fn new_const(id: IdentId, loc: Loc) -> Self {
        Node::new(NodeKind::Const(id), loc)
    }

    pub fn new_comp_stmt(nodes: NodeVec, mut loc: Loc) -> Self {
        if let Some(node) = nodes.first() {
            loc = node.loc();
        };
        if let Some(node) = nodes.last() {
            loc = loc.merge(node.loc());
        };
        Node::new(NodeKind::CompStmt(nodes), loc)
    }

    pub fn new_nop(loc: Loc) -> Self {
        Node::new(NodeKind::CompStmt(vec![]), loc)
    }

    pub fn new_assign(lhs: Node, rhs: Node) -> Self {
        let loc = lhs.loc().merge(rhs.loc());
        Node::new(NodeKind::Assign(Box::new(lhs), Box::new(rhs)), loc)
    }

    pub fn new_and(lhs: Node, rhs: Node) -> Self {
        let loc = lhs.loc().merge(rhs.loc());
        Node::new(NodeKind::And(Box::new(lhs), Box::new(rhs)), loc)
    }

    pub fn new_or(lhs: Node, rhs: Node) -> Self {
        let loc = lhs.loc().merge(rhs.loc());
        Node::new(NodeKind::Or(Box::new(lhs), Box::new(rhs)), loc)
    }

    pub fn new_not(node: Node, loc: Loc) -> Self {
        let loc = loc.merge(node.loc());
        Node::new(NodeKind::Not(Box::new(node)), loc)
    }

    pub fn new_send(receiver: Option<Node>, method: IdentId, args: NodeVec, loc: Loc) -> Self {
        let loc = match args.last() {
            Some(arg) => loc.merge(arg.loc()),
            None => loc,
        };
        let loc = match &receiver {
            Some(receiver) => loc.merge(receiver.loc()),
            None => loc,
        };
        Node::new(
            NodeKind::Send {
                receiver: receiver.map(Box::new),
                method,
                args,
            },
            loc,
        )
    }

    /// Operator call `lhs op rhs`.
    pub fn new_binop(method: IdentId, lhs: Node, rhs: Node) -> Self {
        let loc = lhs.loc();
        Node::new_send(Some(lhs), method, vec![rhs], loc)
    }

    pub fn new_if(cond: Node, then_: Node, else_: Node, loc: Loc) -> Self {
        let loc = loc.merge(then_.loc()).merge(else_.loc());
        Node::new(
            NodeKind::If {
                cond: Box::new(cond),
                then_: Box::new(then_),
                else_: Box::new(else_),
            },
            loc,
        )
    }

    pub fn new_while(cond: Node, body: Node, loc: Loc) -> Self {
        let loc = loc.merge(body.loc());
        Node::new(
            NodeKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
            loc,
        )
    }

    pub fn new_begin(
        body: Node,
        rescue: Vec<RescueEntry>,
        else_: Node,
        ensure: Node,
        loc: Loc,
    ) -> Self {
        Node::new(
            NodeKind::Begin {
                body: Box::new(body),
                rescue,
                else_: Box::new(else_),
                ensure: Box::new(ensure),
            },
            loc,
        )
    }

    pub fn new_break(val: Node, loc: Loc) -> Self {
        let loc = loc.merge(val.loc());
        Node::new(NodeKind::Break(Box::new(val)), loc)
    }

    pub fn new_next(val: Node, loc: Loc) -> Self {
        let loc = loc.merge(val.loc());
        Node::new(NodeKind::Next(Box::new(val)), loc)
    }

    pub fn new_return(val: Node, loc: Loc) -> Self {
        let loc = loc.merge(val.loc());
        Node::new(NodeKind::Return(Box::new(val)), loc)
    }

    pub fn new_method_decl(name: IdentId, params: Vec<Param>, body: Node, loc: Loc) -> Self {
        Node::new(
            NodeKind::MethodDef {
                name,
                params: Rc::new(params),
                body: Rc::new(body),
            },
            loc,
        )
    }

    pub fn new_singleton_method_decl(
        singleton: Node,
        name: IdentId,
        params: Vec<Param>,
        body: Node,
        loc: Loc,
    ) -> Self {
        Node::new(
            NodeKind::SingletonMethodDef {
                singleton: Box::new(singleton),
                name,
                params: Rc::new(params),
                body: Rc::new(body),
            },
            loc,
        )
    }

    pub fn new_class_decl(name: IdentId, superclass: Option<Node>, body: Node, loc: Loc) -> Self {
        Node::new(
            NodeKind::ClassDef {
                name,
                superclass: superclass.map(Box::new),
                body: Box::new(body),
            },
            loc,
        )
    }

    pub fn is_nop(&self) -> bool {
        matches!(&self.kind, NodeKind::CompStmt(nodes) if nodes.is_empty())
    }
}

impl Node {
    /// Render the tree as an s-expression, e.g. `(call puts "foo")`.
    pub fn dump(&self, ident_table: &IdentifierTable) -> String {
        let name = |id: &IdentId| ident_table.get_name(*id).to_string();
        let list = |nodes: &[Node]| {
            nodes
                .iter()
                .map(|n| n.dump(ident_table))
                .collect::<Vec<_>>()
        };
        let sexp = |head: &str, items: Vec<String>| {
            if items.is_empty() {
                format!("({})", head)
            } else {
                format!("({} {})", head, items.join(" "))
            }
        };
        match &self.kind {
            NodeKind::SelfValue => "self".to_string(),
            NodeKind::Nil => "nil".to_string(),
            NodeKind::Integer(i) => i.to_string(),
            NodeKind::Float(f) => format!("{:?}", f),
            NodeKind::Bool(b) => b.to_string(),
            NodeKind::String(s) => format!("{:?}", s),
            NodeKind::Symbol(id) => format!(":{}", name(id)),
            NodeKind::Array(nodes) => sexp("array", list(nodes)),
            NodeKind::Ident(id) | NodeKind::InstanceVar(id) | NodeKind::Const(id) => name(id),
            NodeKind::Assign(lhs, rhs) => {
                sexp("=", vec![lhs.dump(ident_table), rhs.dump(ident_table)])
            }
            NodeKind::And(lhs, rhs) => {
                sexp("&&", vec![lhs.dump(ident_table), rhs.dump(ident_table)])
            }
            NodeKind::Or(lhs, rhs) => {
                sexp("||", vec![lhs.dump(ident_table), rhs.dump(ident_table)])
            }
            NodeKind::Not(node) => sexp("!", vec![node.dump(ident_table)]),
            NodeKind::CompStmt(nodes) => sexp("stmts", list(nodes)),
            NodeKind::If { cond, then_, else_ } => sexp(
                "if",
                vec![
                    cond.dump(ident_table),
                    then_.dump(ident_table),
                    else_.dump(ident_table),
                ],
            ),
            NodeKind::While { cond, body } => {
                sexp("while", vec![cond.dump(ident_table), body.dump(ident_table)])
            }
            NodeKind::Begin {
                body,
                rescue,
                else_,
                ensure,
            } => {
                let mut items = vec![body.dump(ident_table)];
                for entry in rescue {
                    let mut clause = vec![format!("({})", list(&entry.exception_list).join(" "))];
                    if let Some(param) = &entry.param {
                        clause.push(name(param));
                    }
                    clause.push(entry.body.dump(ident_table));
                    items.push(sexp("rescue", clause));
                }
                if !else_.is_nop() {
                    items.push(sexp("else", vec![else_.dump(ident_table)]));
                }
                if !ensure.is_nop() {
                    items.push(sexp("ensure", vec![ensure.dump(ident_table)]));
                }
                sexp("begin", items)
            }
            NodeKind::Break(val) => sexp("break", vec![val.dump(ident_table)]),
            NodeKind::Next(val) => sexp("next", vec![val.dump(ident_table)]),
            NodeKind::Return(val) => sexp("return", vec![val.dump(ident_table)]),
            NodeKind::MethodDef { name: id, params, body } => sexp(
                "def",
                vec![
                    name(id),
                    dump_params(params, ident_table),
                    body.dump(ident_table),
                ],
            ),
            NodeKind::SingletonMethodDef {
                singleton,
                name: id,
                params,
                body,
            } => sexp(
                "defs",
                vec![
                    singleton.dump(ident_table),
                    name(id),
                    dump_params(params, ident_table),
                    body.dump(ident_table),
                ],
            ),
            NodeKind::ClassDef {
                name: id,
                superclass,
                body,
            } => {
                let superclass = match superclass {
                    Some(node) => node.dump(ident_table),
                    None => "nil".to_string(),
                };
                sexp("class", vec![name(id), superclass, body.dump(ident_table)])
            }
            NodeKind::Send {
                receiver,
                method,
                args,
            } => match receiver {
                None => {
                    let mut items = vec![name(method)];
                    items.extend(list(args));
                    sexp("call", items)
                }
                Some(receiver) => {
                    let mut items = vec![receiver.dump(ident_table), name(method)];
                    items.extend(list(args));
                    sexp("send", items)
                }
            },
        }
    }
}

fn dump_params(params: &[Param], ident_table: &IdentifierTable) -> String {
    let params: Vec<String> = params
        .iter()
        .map(|param| {
            let name = ident_table.get_name(param.name);
            match &param.default {
                Some(default) => format!("({} {})", name, default.dump(ident_table)),
                None => name.to_string(),
            }
        })
        .collect();
    format!("({})", params.join(" "))
}
