// simia-parser - AST nodes for Simia
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! Abstract syntax tree for Simia.
//!
//! Statements and expressions are closed sums; every node keeps the token it
//! originated from (used for diagnostics only). Each node supports two
//! operations: [`token_literal`](Statement::token_literal) and the `Display`
//! pretty form, which prints a re-parsable rendition of the source and is
//! also used to order hash-literal keys during compilation.

use std::fmt;

use crate::token::Token;

/// Root node: a sequence of statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn token_literal(&self) -> &str {
        match self.statements.first() {
            Some(stmt) => stmt.token_literal(),
            None => "",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let(LetStatement),
    Return(ReturnStatement),
    Expression(ExpressionStatement),
}

impl Statement {
    pub fn token_literal(&self) -> &str {
        match self {
            Statement::Let(s) => &s.token.literal,
            Statement::Return(s) => &s.token.literal,
            Statement::Expression(s) => &s.token.literal,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let(s) => write!(f, "{}", s),
            Statement::Return(s) => write!(f, "{}", s),
            Statement::Expression(s) => write!(f, "{}", s),
        }
    }
}

/// `let NAME = VALUE;`
#[derive(Debug, Clone, PartialEq)]
pub struct LetStatement {
    pub token: Token,
    pub name: Identifier,
    pub value: Expression,
}

impl fmt::Display for LetStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} = {};", self.token.literal, self.name, self.value)
    }
}

/// `return VALUE?;`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub token: Token,
    pub value: Option<Expression>,
}

impl fmt::Display for ReturnStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {};", self.token.literal, value),
            None => write!(f, "{};", self.token.literal),
        }
    }
}

/// An expression in statement position.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub token: Token,
    pub expression: Expression,
}

impl fmt::Display for ExpressionStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// `{ STMT* }` — appears as the body of `if`, `for` and `fn` nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub token: Token,
    pub statements: Vec<Statement>,
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Ident(Identifier),
    Int(IntegerLiteral),
    Bool(BooleanLiteral),
    Str(StringLiteral),
    Prefix(PrefixExpression),
    Infix(InfixExpression),
    If(IfExpression),
    For(ForExpression),
    In(InExpression),
    Function(FunctionLiteral),
    Call(CallExpression),
    Array(ArrayLiteral),
    Hash(HashLiteral),
    Index(IndexExpression),
    Assign(AssignExpression),
}

impl Expression {
    pub fn token_literal(&self) -> &str {
        match self {
            Expression::Ident(e) => &e.token.literal,
            Expression::Int(e) => &e.token.literal,
            Expression::Bool(e) => &e.token.literal,
            Expression::Str(e) => &e.token.literal,
            Expression::Prefix(e) => &e.token.literal,
            Expression::Infix(e) => &e.token.literal,
            Expression::If(e) => &e.token.literal,
            Expression::For(e) => &e.token.literal,
            Expression::In(e) => &e.token.literal,
            Expression::Function(e) => &e.token.literal,
            Expression::Call(e) => &e.token.literal,
            Expression::Array(e) => &e.token.literal,
            Expression::Hash(e) => &e.token.literal,
            Expression::Index(e) => &e.token.literal,
            Expression::Assign(e) => &e.token.literal,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Ident(e) => write!(f, "{}", e),
            Expression::Int(e) => write!(f, "{}", e.token.literal),
            Expression::Bool(e) => write!(f, "{}", e.token.literal),
            Expression::Str(e) => write!(f, "\"{}\"", e.value),
            Expression::Prefix(e) => write!(f, "({}{})", e.operator, e.right),
            Expression::Infix(e) => write!(f, "({} {} {})", e.left, e.operator, e.right),
            Expression::If(e) => write!(f, "{}", e),
            Expression::For(e) => write!(f, "{}", e),
            Expression::In(e) => write!(f, "({} in {})", e.element, e.iterable),
            Expression::Function(e) => write!(f, "{}", e),
            Expression::Call(e) => write!(f, "{}", e),
            Expression::Array(e) => write!(f, "{}", e),
            Expression::Hash(e) => write!(f, "{}", e),
            Expression::Index(e) => write!(f, "({}[{}])", e.left, e.index),
            Expression::Assign(e) => write!(f, "{} = {}", e.identifier, e.value),
        }
    }
}

/// A name.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub token: Token,
    pub value: String,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegerLiteral {
    pub token: Token,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLiteral {
    pub token: Token,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub token: Token,
    pub value: String,
}

/// `OP RIGHT` where OP is `!` or `-`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixExpression {
    pub token: Token,
    pub operator: String,
    pub right: Box<Expression>,
}

/// `LEFT OP RIGHT`.
#[derive(Debug, Clone, PartialEq)]
pub struct InfixExpression {
    pub token: Token,
    pub operator: String,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

/// `if (COND) { … } else { … }` — the alternative is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct IfExpression {
    pub token: Token,
    pub condition: Box<Expression>,
    pub consequence: BlockStatement,
    pub alternative: Option<BlockStatement>,
}

impl fmt::Display for IfExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if ({}) {{ {} }}", self.condition, self.consequence)?;
        if let Some(alt) = &self.alternative {
            write!(f, " else {{ {} }}", alt)?;
        }
        Ok(())
    }
}

/// `for (COND) { … }` — the condition is either a plain expression
/// (while-style) or an [`InExpression`] (for-each).
#[derive(Debug, Clone, PartialEq)]
pub struct ForExpression {
    pub token: Token,
    pub condition: Box<Expression>,
    pub body: BlockStatement,
}

impl fmt::Display for ForExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "for ({}) {{ {} }}", self.condition, self.body)
    }
}

/// `ELEMENT in ITERABLE` — only meaningful inside a `for` header.
#[derive(Debug, Clone, PartialEq)]
pub struct InExpression {
    pub token: Token,
    pub element: Box<Expression>,
    pub iterable: Box<Expression>,
}

/// `fn (PARAMS) { … }`; `name` is attached by the parser when the literal is
/// the value of a `let` statement, enabling compiled self-recursion.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub token: Token,
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
    pub name: Option<String>,
}

impl fmt::Display for FunctionLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token.literal)?;
        if let Some(name) = &self.name {
            write!(f, "<{}>", name)?;
        }
        let params: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
        write!(f, "({}) {{ {} }}", params.join(", "), self.body)
    }
}

/// `CALLEE(ARGS)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub token: Token,
    pub function: Box<Expression>,
    pub arguments: Vec<Expression>,
}

impl fmt::Display for CallExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.arguments.iter().map(|a| a.to_string()).collect();
        write!(f, "{}({})", self.function, args.join(", "))
    }
}

/// `[ELEMS]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub token: Token,
    pub elements: Vec<Expression>,
}

impl fmt::Display for ArrayLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elements: Vec<String> = self.elements.iter().map(|e| e.to_string()).collect();
        write!(f, "[{}]", elements.join(", "))
    }
}

/// `{ KEY: VALUE, … }` — pairs keep source order; keys are full expressions
/// that must evaluate to strings at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct HashLiteral {
    pub token: Token,
    pub pairs: Vec<(Expression, Expression)>,
}

impl fmt::Display for HashLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

/// `LEFT[INDEX]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    pub token: Token,
    pub left: Box<Expression>,
    pub index: Box<Expression>,
}

/// `IDENT = VALUE` — overwrites an existing binding; evaluates to nil.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpression {
    pub token: Token,
    pub identifier: Identifier,
    pub value: Box<Expression>,
}
