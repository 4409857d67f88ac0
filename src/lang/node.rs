use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind tag of a syntax-tree node.
///
/// Tags the engine knows about get their own variant; anything else the
/// parser hands over is preserved verbatim in [`NodeKind::Other`] so the
/// compiler can name it when it refuses to compile it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    // ───────────────────────────── Scalars ──────────────────────────────
    Arg,
    Name,
    ScalarDNumber,
    ScalarLNumber,
    ScalarString,

    // ─────────────────────────── Unary forms ────────────────────────────
    ExprIsset,
    ExprPostInc,
    ExprPostDec,
    ExprPreInc,
    ExprPreDec,
    ExprVariable,
    ExprConstFetch,
    ExprBooleanNot,
    ExprUnaryMinus,
    ExprPrint,
    StmtEcho,
    StmtReturn,

    // ─────────────────────────── Binary forms ───────────────────────────
    ExprAssign,
    ExprAssignConcat,
    ExprAssignPlus,
    ExprAssignMinus,
    ExprAssignMul,
    ExprBooleanAnd,
    ExprBooleanOr,
    ExprSmaller,
    ExprSmallerOrEqual,
    ExprGreater,
    ExprGreaterOrEqual,
    ExprEqual,
    ExprNotEqual,
    ExprIdentical,
    ExprNotIdentical,
    ExprPlus,
    ExprMinus,
    ExprMul,
    ExprDiv,
    ExprMod,
    ExprConcat,
    ExprFuncCall,
    ExprInclude,

    // ───────────────────── Statements & declarations ────────────────────
    Param,
    StmtFunction,
    StmtIf,
    StmtElseIf,
    StmtElse,
    StmtWhile,
    StmtDo,
    StmtInlineHtml,

    /// A tag with no dedicated variant.
    Other(String),
}

impl NodeKind {
    /// Every kind with a dedicated variant.
    pub const KNOWN: &'static [NodeKind] = &[
        NodeKind::Arg,
        NodeKind::Name,
        NodeKind::ScalarDNumber,
        NodeKind::ScalarLNumber,
        NodeKind::ScalarString,
        NodeKind::ExprIsset,
        NodeKind::ExprPostInc,
        NodeKind::ExprPostDec,
        NodeKind::ExprPreInc,
        NodeKind::ExprPreDec,
        NodeKind::ExprVariable,
        NodeKind::ExprConstFetch,
        NodeKind::ExprBooleanNot,
        NodeKind::ExprUnaryMinus,
        NodeKind::ExprPrint,
        NodeKind::StmtEcho,
        NodeKind::StmtReturn,
        NodeKind::ExprAssign,
        NodeKind::ExprAssignConcat,
        NodeKind::ExprAssignPlus,
        NodeKind::ExprAssignMinus,
        NodeKind::ExprAssignMul,
        NodeKind::ExprBooleanAnd,
        NodeKind::ExprBooleanOr,
        NodeKind::ExprSmaller,
        NodeKind::ExprSmallerOrEqual,
        NodeKind::ExprGreater,
        NodeKind::ExprGreaterOrEqual,
        NodeKind::ExprEqual,
        NodeKind::ExprNotEqual,
        NodeKind::ExprIdentical,
        NodeKind::ExprNotIdentical,
        NodeKind::ExprPlus,
        NodeKind::ExprMinus,
        NodeKind::ExprMul,
        NodeKind::ExprDiv,
        NodeKind::ExprMod,
        NodeKind::ExprConcat,
        NodeKind::ExprFuncCall,
        NodeKind::ExprInclude,
        NodeKind::Param,
        NodeKind::StmtFunction,
        NodeKind::StmtIf,
        NodeKind::StmtElseIf,
        NodeKind::StmtElse,
        NodeKind::StmtWhile,
        NodeKind::StmtDo,
        NodeKind::StmtInlineHtml,
    ];

    /// The parser-facing tag, e.g. `Expr_Assign`.
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Arg => "Arg",
            NodeKind::Name => "Name",
            NodeKind::ScalarDNumber => "Scalar_DNumber",
            NodeKind::ScalarLNumber => "Scalar_LNumber",
            NodeKind::ScalarString => "Scalar_String",
            NodeKind::ExprIsset => "Expr_Isset",
            NodeKind::ExprPostInc => "Expr_PostInc",
            NodeKind::ExprPostDec => "Expr_PostDec",
            NodeKind::ExprPreInc => "Expr_PreInc",
            NodeKind::ExprPreDec => "Expr_PreDec",
            NodeKind::ExprVariable => "Expr_Variable",
            NodeKind::ExprConstFetch => "Expr_ConstFetch",
            NodeKind::ExprBooleanNot => "Expr_BooleanNot",
            NodeKind::ExprUnaryMinus => "Expr_UnaryMinus",
            NodeKind::ExprPrint => "Expr_Print",
            NodeKind::StmtEcho => "Stmt_Echo",
            NodeKind::StmtReturn => "Stmt_Return",
            NodeKind::ExprAssign => "Expr_Assign",
            NodeKind::ExprAssignConcat => "Expr_AssignConcat",
            NodeKind::ExprAssignPlus => "Expr_AssignPlus",
            NodeKind::ExprAssignMinus => "Expr_AssignMinus",
            NodeKind::ExprAssignMul => "Expr_AssignMul",
            NodeKind::ExprBooleanAnd => "Expr_BooleanAnd",
            NodeKind::ExprBooleanOr => "Expr_BooleanOr",
            NodeKind::ExprSmaller => "Expr_Smaller",
            NodeKind::ExprSmallerOrEqual => "Expr_SmallerOrEqual",
            NodeKind::ExprGreater => "Expr_Greater",
            NodeKind::ExprGreaterOrEqual => "Expr_GreaterOrEqual",
            NodeKind::ExprEqual => "Expr_Equal",
            NodeKind::ExprNotEqual => "Expr_NotEqual",
            NodeKind::ExprIdentical => "Expr_Identical",
            NodeKind::ExprNotIdentical => "Expr_NotIdentical",
            NodeKind::ExprPlus => "Expr_Plus",
            NodeKind::ExprMinus => "Expr_Minus",
            NodeKind::ExprMul => "Expr_Mul",
            NodeKind::ExprDiv => "Expr_Div",
            NodeKind::ExprMod => "Expr_Mod",
            NodeKind::ExprConcat => "Expr_Concat",
            NodeKind::ExprFuncCall => "Expr_FuncCall",
            NodeKind::ExprInclude => "Expr_Include",
            NodeKind::Param => "Param",
            NodeKind::StmtFunction => "Stmt_Function",
            NodeKind::StmtIf => "Stmt_If",
            NodeKind::StmtElseIf => "Stmt_ElseIf",
            NodeKind::StmtElse => "Stmt_Else",
            NodeKind::StmtWhile => "Stmt_While",
            NodeKind::StmtDo => "Stmt_Do",
            NodeKind::StmtInlineHtml => "Stmt_InlineHTML",
            NodeKind::Other(tag) => tag,
        }
    }

    /// Map a parser tag to its kind. Unknown tags become [`NodeKind::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Arg" => NodeKind::Arg,
            "Name" => NodeKind::Name,
            "Scalar_DNumber" => NodeKind::ScalarDNumber,
            "Scalar_LNumber" => NodeKind::ScalarLNumber,
            "Scalar_String" => NodeKind::ScalarString,
            "Expr_Isset" => NodeKind::ExprIsset,
            "Expr_PostInc" => NodeKind::ExprPostInc,
            "Expr_PostDec" => NodeKind::ExprPostDec,
            "Expr_PreInc" => NodeKind::ExprPreInc,
            "Expr_PreDec" => NodeKind::ExprPreDec,
            "Expr_Variable" => NodeKind::ExprVariable,
            "Expr_ConstFetch" => NodeKind::ExprConstFetch,
            "Expr_BooleanNot" => NodeKind::ExprBooleanNot,
            "Expr_UnaryMinus" => NodeKind::ExprUnaryMinus,
            "Expr_Print" => NodeKind::ExprPrint,
            "Stmt_Echo" => NodeKind::StmtEcho,
            "Stmt_Return" => NodeKind::StmtReturn,
            "Expr_Assign" => NodeKind::ExprAssign,
            "Expr_AssignConcat" => NodeKind::ExprAssignConcat,
            "Expr_AssignPlus" => NodeKind::ExprAssignPlus,
            "Expr_AssignMinus" => NodeKind::ExprAssignMinus,
            "Expr_AssignMul" => NodeKind::ExprAssignMul,
            "Expr_BooleanAnd" => NodeKind::ExprBooleanAnd,
            "Expr_BooleanOr" => NodeKind::ExprBooleanOr,
            "Expr_Smaller" => NodeKind::ExprSmaller,
            "Expr_SmallerOrEqual" => NodeKind::ExprSmallerOrEqual,
            "Expr_Greater" => NodeKind::ExprGreater,
            "Expr_GreaterOrEqual" => NodeKind::ExprGreaterOrEqual,
            "Expr_Equal" => NodeKind::ExprEqual,
            "Expr_NotEqual" => NodeKind::ExprNotEqual,
            "Expr_Identical" => NodeKind::ExprIdentical,
            "Expr_NotIdentical" => NodeKind::ExprNotIdentical,
            "Expr_Plus" => NodeKind::ExprPlus,
            "Expr_Minus" => NodeKind::ExprMinus,
            "Expr_Mul" => NodeKind::ExprMul,
            "Expr_Div" => NodeKind::ExprDiv,
            "Expr_Mod" => NodeKind::ExprMod,
            "Expr_Concat" => NodeKind::ExprConcat,
            "Expr_FuncCall" => NodeKind::ExprFuncCall,
            "Expr_Include" => NodeKind::ExprInclude,
            "Param" => NodeKind::Param,
            "Stmt_Function" => NodeKind::StmtFunction,
            "Stmt_If" => NodeKind::StmtIf,
            "Stmt_ElseIf" => NodeKind::StmtElseIf,
            "Stmt_Else" => NodeKind::StmtElse,
            "Stmt_While" => NodeKind::StmtWhile,
            "Stmt_Do" => NodeKind::StmtDo,
            "Stmt_InlineHTML" => NodeKind::StmtInlineHtml,
            other => NodeKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        NodeKind::from_tag(&tag)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Literal leaf value carried directly in a node field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Long(n) => write!(f, "{}", n),
            Scalar::Double(n) => write!(f, "{}", n),
            Scalar::String(s) => write!(f, "{}", s),
        }
    }
}

/// Content of a named node field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Child {
    Null,
    Node(Box<Node>),
    List(Vec<Child>),
    Scalar(Scalar),
}

/// Syntax-tree node as produced by the parser.
///
/// Serialized in the flat PHP-Parser JSON shape:
/// `{"nodeType": "Expr_Assign", "var": {...}, "expr": {...}}`.
///
/// Parser `attributes` (line and position info) are kept on read but play no
/// part in compilation and are not written back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "nodeType")]
    pub kind: NodeKind,

    #[serde(default, skip_serializing)]
    pub attributes: BTreeMap<String, serde_json::Value>,

    #[serde(flatten)]
    pub fields: BTreeMap<String, Child>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: &str, child: impl Into<Child>) -> Self {
        self.fields.insert(field.to_string(), child.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Child> {
        self.fields.get(name)
    }

    /// The scalar stored directly in `name`, if any.
    pub fn scalar(&self, name: &str) -> Option<&Scalar> {
        match self.fields.get(name) {
            Some(Child::Scalar(s)) => Some(s),
            _ => None,
        }
    }

    /// Truthiness of a boolean-ish field; absent means false.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(Child::Scalar(Scalar::Bool(true))))
    }

    /// Child nodes held in `name`, whether stored singly or as a list.
    pub fn nodes(&self, name: &str) -> Vec<&Node> {
        match self.fields.get(name) {
            Some(Child::Node(node)) => vec![node.as_ref()],
            Some(Child::List(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Child::Node(node) => Some(node.as_ref()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(Box::new(node))
    }
}

impl From<Vec<Node>> for Child {
    fn from(nodes: Vec<Node>) -> Self {
        Child::List(nodes.into_iter().map(Child::from).collect())
    }
}

impl From<Vec<Child>> for Child {
    fn from(items: Vec<Child>) -> Self {
        Child::List(items)
    }
}

impl From<Scalar> for Child {
    fn from(scalar: Scalar) -> Self {
        Child::Scalar(scalar)
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Child::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Child::Scalar(Scalar::String(s))
    }
}

impl From<i64> for Child {
    fn from(n: i64) -> Self {
        Child::Scalar(Scalar::Long(n))
    }
}

impl From<f64> for Child {
    fn from(n: f64) -> Self {
        Child::Scalar(Scalar::Double(n))
    }
}

impl From<bool> for Child {
    fn from(b: bool) -> Self {
        Child::Scalar(Scalar::Bool(b))
    }
}
