//! The scope- and type-resolved AST consumed by the code generator.
//!
//! Every identifier occurrence already carries its [`IdUse`]: the declared
//! type, its declaration-order offset in the declaring frame, and how many
//! static links separate the use from that frame.

use std::fmt::Display;

use crate::{common::Location, types::Type};

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub var_decls: Vec<VarDecl>,
    pub stmt: Stmt,
    pub loc: Location,
}

/// `float x, y` or `bool b`.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub ty: Type,
    pub idents: Vec<Ident>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAttrs {
    pub ty: Type,
    /// Number of variables declared before this one in its scope.
    pub offset_count: u32,
    /// Declaration site.
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdUse {
    pub attrs: IdAttrs,
    pub levels_outward: u32,
}

/// A use of a declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub name: String,
    pub idu: IdUse,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign(Var, Expr, Location),
    Begin(Vec<VarDecl>, Vec<Stmt>, Location),
    If {
        cond: Expr,
        then: Box<Stmt>,
        els: Option<Box<Stmt>>,
        loc: Location,
    },
    While(Expr, Box<Stmt>, Location),
    Read(Var, Location),
    Write(Expr, Location),
    Skip(Location),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Number {
    pub text: String,
    pub value: f32,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Op(Operator, Box<Expr>, Box<Expr>, Location),
    Var(Var),
    Number(Number),
    Not(Box<Expr>, Location),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Mul,
    Div,

    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl VarDecl {
    pub fn new<I, S>(ty: Type, names: I, loc: Location) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let idents = names
            .into_iter()
            .map(|name| Ident {
                name: name.into(),
                loc: loc.clone(),
            })
            .collect();
        Self { ty, idents, loc }
    }
}

impl Var {
    pub fn new(name: impl Into<String>, ty: Type, offset_count: u32, levels_outward: u32) -> Self {
        let loc = Location::dummy();
        Self {
            name: name.into(),
            idu: IdUse {
                attrs: IdAttrs {
                    ty,
                    offset_count,
                    loc: loc.clone(),
                },
                levels_outward,
            },
            loc,
        }
    }

    pub fn at(mut self, loc: Location) -> Self {
        self.loc = loc;
        self
    }

    pub fn ty(&self) -> Type {
        self.idu.attrs.ty
    }
}

impl Number {
    pub fn new(text: impl Into<String>, value: f32, loc: Location) -> Self {
        Self {
            text: text.into(),
            value,
            loc,
        }
    }
}

impl Expr {
    pub fn loc(&self) -> &Location {
        match self {
            Expr::Op(_, _, _, loc) => loc,
            Expr::Var(var) => &var.loc,
            Expr::Number(num) => &num.loc,
            Expr::Not(_, loc) => loc,
        }
    }

    /// Static type of the expression as implied by its annotations.
    pub fn ty(&self) -> Type {
        match self {
            Expr::Op(op, _, _, _) if op.is_arith() => Type::Float,
            Expr::Op(..) | Expr::Not(..) => Type::Bool,
            Expr::Var(var) => var.ty(),
            Expr::Number(_) => Type::Float,
        }
    }
}

impl Stmt {
    pub fn loc(&self) -> &Location {
        match self {
            Stmt::Assign(_, _, loc)
            | Stmt::Begin(_, _, loc)
            | Stmt::While(_, _, loc)
            | Stmt::Read(_, loc)
            | Stmt::Write(_, loc)
            | Stmt::Skip(loc) => loc,
            Stmt::If { loc, .. } => loc,
        }
    }
}

impl Operator {
    pub fn is_arith(self) -> bool {
        matches!(
            self,
            Operator::Plus | Operator::Minus | Operator::Mul | Operator::Div
        )
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}
