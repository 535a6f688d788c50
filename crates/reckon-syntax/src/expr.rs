//! Expression AST nodes.
//! 表达式 AST 节点。

use std::fmt;
use std::sync::Arc;

use crate::Literal;
use reckon_common::Span;

/// An expression node.
/// 表达式节点。
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Build a node with no source position, for trees assembled in code.
    /// 构造没有源码位置的节点，用于在代码中手工组装语法树。
    pub fn synthetic(kind: NodeKind) -> Self {
        Self::new(kind, Span::DUMMY)
    }

    pub fn value(literal: impl Into<Literal>) -> Self {
        Self::synthetic(NodeKind::Value(literal.into()))
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::synthetic(NodeKind::Identifier(name.into()))
    }

    pub fn unary(op: UnaryOp, operand: Node) -> Self {
        Self::synthetic(NodeKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn binary(op: BinOp, left: Node, right: Node) -> Self {
        Self::synthetic(NodeKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn ternary(condition: Node, then_branch: Node, else_branch: Node) -> Self {
        Self::synthetic(NodeKind::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    pub fn call(name: impl Into<String>, args: Vec<Node>) -> Self {
        Self::synthetic(NodeKind::Call {
            name: name.into(),
            args: args.into_iter().map(Arc::new).collect(),
        })
    }
    /// Number of edges on the longest path down from this node. Walks an
    /// explicit stack, so arbitrarily deep trees are safe to measure.
    /// 计算树深度（非递归）。
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending: Vec<(&Node, usize)> = vec![(self, 0)];
        while let Some((node, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            let below = depth + 1;
            match &node.kind {
                NodeKind::Value(_) | NodeKind::Identifier(_) => {}
                NodeKind::Unary { operand, .. } => pending.push((operand.as_ref(), below)),
                NodeKind::Binary { left, right, .. } => {
                    pending.push((left.as_ref(), below));
                    pending.push((right.as_ref(), below));
                }
                NodeKind::Ternary {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    pending.push((condition.as_ref(), below));
                    pending.push((then_branch.as_ref(), below));
                    pending.push((else_branch.as_ref(), below));
                }
                NodeKind::Call { args, .. } => {
                    pending.extend(args.iter().map(|arg| (arg.as_ref(), below)));
                }
            }
        }
        deepest
    }
}

/// Node kind. The set is closed; the evaluator matches it exhaustively.
/// 节点类型。
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Literal value / 字面量
    Value(Literal),

    /// Parameter reference, plain `x` or bracketed `[x y]` / 参数引用
    Identifier(String),

    /// Unary operation `!a`, `-a`, `+a` or `~a` / 一元运算
    Unary { op: UnaryOp, operand: Box<Node> },

    /// Binary operation `a + b` / 二元运算
    Binary {
        op: BinOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// Conditional `cond ? a : b` / 条件表达式
    Ternary {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Box<Node>,
    },

    /// Function call `f(x, y)`. Arguments are shared so that resolution
    /// handlers can hold on to them as unevaluated expressions.
    /// 函数调用。参数以共享指针保存，供处理器作为未求值表达式持有。
    Call { name: String, args: Vec<Arc<Node>> },
}

/// Binary operators.
/// 二元运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Logical 逻辑运算
    And, // && and
    Or,  // || or

    // Comparison 比较运算
    Eq, // == =
    Ne, // != <>
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=

    // Arithmetic 算术运算
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Mod, // %
    Pow, // **

    // Bitwise 位运算
    BitAnd, // &
    BitOr,  // |
    BitXor, // ^
    Shl,    // <<
    Shr,    // >>
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr
        )
    }
}

/// Unary operators.
/// 一元运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,    // ! not 取反
    Neg,    // - 取负
    Plus,   // + 取正
    BitNot, // ~ 按位取反
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::BitNot => "~",
        }
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    let is_keyword = matches!(
        name.to_ascii_lowercase().as_str(),
        "and" | "or" | "not" | "true" | "false"
    );
    starts_well && !is_keyword && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Writes the tree back as expression source. Compound nodes are fully
/// parenthesized, so the output parses back to an equivalent expression.
/// Decimal literals read back as doubles.
/// 将语法树写回为表达式源码。
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Value(literal) => write!(f, "{}", literal),
            NodeKind::Identifier(name) if is_plain_identifier(name) => f.write_str(name),
            NodeKind::Identifier(name) => write!(f, "[{}]", name),
            NodeKind::Unary { op, operand } => write!(f, "{}({})", op.symbol(), operand),
            NodeKind::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            NodeKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "({} ? {} : {})", condition, then_branch, else_branch),
            NodeKind::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}
