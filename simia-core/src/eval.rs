// simia-core - AST-walking evaluator for Simia
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! AST-walking evaluator.
//!
//! A recursive visitor over the AST with an explicit environment parameter.
//! Failures propagate as `Err` through `?`; the `return` statement travels
//! as the in-band [`Value::Return`] wrapper, which blocks pass through
//! untouched and function/program boundaries strip exactly once.

use std::rc::Rc;

use im::{OrdMap, Vector};

use simia_parser::ast::{
    BlockStatement, Expression, ForExpression, Identifier, InfixExpression, Program, Statement,
};

use crate::builtins;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::value::{Function, Value};

/// Hard cap on loop iterations; a coarse infinite-loop guard.
const LOOP_LIMIT: usize = 10_000;

/// Evaluate a program. The top level strips a `return` wrapper exactly once.
pub fn eval_program(program: &Program, env: &Env) -> Result<Value> {
    let mut result = Value::Nil;
    for statement in &program.statements {
        match eval_statement(statement, env)? {
            Value::Return(inner) => return Ok(*inner),
            other => result = other,
        }
    }
    Ok(result)
}

fn eval_statement(statement: &Statement, env: &Env) -> Result<Value> {
    match statement {
        Statement::Let(stmt) => {
            let value = eval_expression(&stmt.value, env)?;
            env.define(stmt.name.value.clone(), value);
            Ok(Value::Nil)
        }
        Statement::Return(stmt) => {
            let value = match &stmt.value {
                Some(expression) => eval_expression(expression, env)?,
                None => Value::Nil,
            };
            Ok(Value::Return(Box::new(value)))
        }
        Statement::Expression(stmt) => eval_expression(&stmt.expression, env),
    }
}

/// Evaluate a block. A `return` wrapper stops the block and is handed back
/// still wrapped so outer blocks keep short-circuiting.
fn eval_block(block: &BlockStatement, env: &Env) -> Result<Value> {
    let mut result = Value::Nil;
    for statement in &block.statements {
        result = eval_statement(statement, env)?;
        if matches!(result, Value::Return(_)) {
            return Ok(result);
        }
    }
    Ok(result)
}

fn eval_expression(expression: &Expression, env: &Env) -> Result<Value> {
    match expression {
        Expression::Int(literal) => Ok(Value::Int(literal.value)),
        Expression::Bool(literal) => Ok(Value::Bool(literal.value)),
        Expression::Str(literal) => Ok(Value::string(&literal.value)),
        Expression::Ident(identifier) => eval_identifier(identifier, env),
        Expression::Prefix(prefix) => {
            let right = eval_expression(&prefix.right, env)?;
            eval_prefix(&prefix.operator, right)
        }
        Expression::Infix(infix) => {
            if infix.operator == "|>" {
                return eval_pipeline(infix, env);
            }
            let left = eval_expression(&infix.left, env)?;
            let right = eval_expression(&infix.right, env)?;
            eval_infix(&infix.operator, left, right)
        }
        Expression::If(conditional) => {
            let condition = eval_expression(&conditional.condition, env)?;
            if condition.is_truthy() {
                eval_block(&conditional.consequence, env)
            } else if let Some(alternative) = &conditional.alternative {
                eval_block(alternative, env)
            } else {
                Ok(Value::Nil)
            }
        }
        Expression::For(looped) => eval_for(looped, env),
        // An `in` expression is only meaningful inside a `for` header;
        // anywhere else it evaluates to nil.
        Expression::In(_) => Ok(Value::Nil),
        Expression::Function(literal) => Ok(Value::Function(Rc::new(Function {
            parameters: literal.parameters.clone(),
            body: literal.body.clone(),
            env: env.clone(),
        }))),
        Expression::Call(call) => {
            let callee = eval_expression(&call.function, env)?;
            let arguments = eval_expressions(&call.arguments, env)?;
            apply_function(&callee, &arguments)
        }
        Expression::Array(literal) => {
            let elements = eval_expressions(&literal.elements, env)?;
            Ok(Value::Array(elements.into_iter().collect()))
        }
        Expression::Hash(literal) => {
            let mut pairs = OrdMap::new();
            for (key_expr, value_expr) in &literal.pairs {
                let key = match eval_expression(key_expr, env)? {
                    Value::Str(s) => s.to_string(),
                    other => return Err(Error::KeyNotString(other.type_name())),
                };
                let value = eval_expression(value_expr, env)?;
                pairs.insert(key, value);
            }
            Ok(Value::Hash(pairs))
        }
        Expression::Index(index) => {
            let left = eval_expression(&index.left, env)?;
            let idx = eval_expression(&index.index, env)?;
            eval_index(left, idx)
        }
        Expression::Assign(assign) => {
            let value = eval_expression(&assign.value, env)?;
            env.assign(&assign.identifier.value, value)?;
            Ok(Value::Nil)
        }
    }
}

fn eval_identifier(identifier: &Identifier, env: &Env) -> Result<Value> {
    if let Some(value) = env.lookup(&identifier.value) {
        return Ok(value);
    }
    if let Some(builtin) = builtins::lookup(&identifier.value) {
        return Ok(Value::Builtin(builtin));
    }
    Err(Error::IdentifierNotFound(identifier.value.clone()))
}

/// Evaluate argument expressions left-to-right; the first error aborts the
/// whole list.
fn eval_expressions(expressions: &[Expression], env: &Env) -> Result<Vec<Value>> {
    expressions
        .iter()
        .map(|expression| eval_expression(expression, env))
        .collect()
}

fn eval_prefix(operator: &str, right: Value) -> Result<Value> {
    match operator {
        "!" => Ok(eval_bang(right)),
        "-" => match right {
            Value::Int(n) => Ok(Value::Int(-n)),
            other => Err(Error::unknown_prefix("-", other.type_name())),
        },
        _ => Err(Error::unknown_prefix(operator, right.type_name())),
    }
}

fn eval_bang(right: Value) -> Value {
    match right {
        Value::Bool(b) => Value::Bool(!b),
        Value::Nil => Value::Bool(true),
        _ => Value::Bool(false),
    }
}

fn eval_infix(operator: &str, left: Value, right: Value) -> Result<Value> {
    // Infix expressions between different value types are not supported.
    if left.type_name() != right.type_name() {
        return Err(Error::type_mismatch(
            left.type_name(),
            operator,
            right.type_name(),
        ));
    }

    match (&left, &right) {
        (Value::Int(l), Value::Int(r)) => eval_integer_infix(operator, *l, *r),
        (Value::Str(l), Value::Str(r)) => {
            if operator == "+" {
                Ok(Value::string(format!("{}{}", l, r)))
            } else {
                Err(Error::unknown_infix("STRING", operator, "STRING"))
            }
        }
        _ => match operator {
            "==" => Ok(Value::Bool(left == right)),
            "!=" => Ok(Value::Bool(left != right)),
            _ => Err(Error::unknown_infix(
                left.type_name(),
                operator,
                right.type_name(),
            )),
        },
    }
}

fn eval_integer_infix(operator: &str, left: i64, right: i64) -> Result<Value> {
    match operator {
        "+" => Ok(Value::Int(left + right)),
        "-" => Ok(Value::Int(left - right)),
        "*" => Ok(Value::Int(left * right)),
        "/" => {
            if right == 0 {
                Err(Error::DivisionByZero)
            } else {
                Ok(Value::Int(left / right))
            }
        }
        "<" => Ok(Value::Bool(left < right)),
        ">" => Ok(Value::Bool(left > right)),
        "==" => Ok(Value::Bool(left == right)),
        "!=" => Ok(Value::Bool(left != right)),
        ".." => {
            if left == right {
                Err(Error::EmptyRange {
                    start: left,
                    end: right,
                })
            } else {
                Ok(Value::Range(left, right))
            }
        }
        _ => Err(Error::unknown_infix("INTEGER", operator, "INTEGER")),
    }
}

/// `L |> CALL` prepends L to CALL's arguments: the callee is evaluated
/// first, then L, then the remaining arguments.
fn eval_pipeline(infix: &InfixExpression, env: &Env) -> Result<Value> {
    let Expression::Call(call) = infix.right.as_ref() else {
        return Err(Error::PipelineTarget);
    };

    let callee = eval_expression(&call.function, env)?;
    let mut arguments = Vec::with_capacity(call.arguments.len() + 1);
    arguments.push(eval_expression(&infix.left, env)?);
    for argument in &call.arguments {
        arguments.push(eval_expression(argument, env)?);
    }
    apply_function(&callee, &arguments)
}

fn eval_for(looped: &ForExpression, env: &Env) -> Result<Value> {
    if let Expression::In(header) = looped.condition.as_ref() {
        let Expression::Ident(element) = header.element.as_ref() else {
            return Err(Error::internal(
                "expected identifier on left side of in-expression",
            ));
        };

        // The iterable is evaluated once, in the enclosing scope.
        let iterable = eval_expression(&header.iterable, env)?;
        let loop_env = env.enclosed();
        match iterable {
            Value::Range(start, end) => {
                eval_for_range(element, start, end, &looped.body, &loop_env)
            }
            Value::Array(elements) => {
                eval_for_array(element, &elements, &looped.body, &loop_env)
            }
            other => Err(Error::ForIterable(other.type_name())),
        }
    } else {
        let loop_env = env.enclosed();
        eval_for_condition(&looped.condition, &looped.body, &loop_env)
    }
}

fn eval_for_condition(
    condition: &Expression,
    body: &BlockStatement,
    env: &Env,
) -> Result<Value> {
    let mut iterations = 0;
    loop {
        if iterations > LOOP_LIMIT {
            return Err(Error::LoopLimit);
        }

        let test = eval_expression(condition, env)?;
        if !test.is_truthy() {
            return Ok(Value::Nil);
        }

        let result = eval_block(body, env)?;
        if matches!(result, Value::Return(_)) {
            return Ok(result);
        }
        iterations += 1;
    }
}

/// Iterate a range inclusive of its start and exclusive of its end,
/// stepping towards the end in either direction.
fn eval_for_range(
    element: &Identifier,
    start: i64,
    end: i64,
    body: &BlockStatement,
    env: &Env,
) -> Result<Value> {
    let step = if start < end { 1 } else { -1 };
    let mut current = start;
    let mut iterations = 0;

    while current != end {
        if iterations > LOOP_LIMIT {
            return Err(Error::LoopLimit);
        }

        env.define(element.value.clone(), Value::Int(current));
        let result = eval_block(body, env)?;
        if matches!(result, Value::Return(_)) {
            return Ok(result);
        }

        current += step;
        iterations += 1;
    }
    Ok(Value::Nil)
}

fn eval_for_array(
    element: &Identifier,
    elements: &Vector<Value>,
    body: &BlockStatement,
    env: &Env,
) -> Result<Value> {
    for value in elements {
        env.define(element.value.clone(), value.clone());
        let result = eval_block(body, env)?;
        if matches!(result, Value::Return(_)) {
            return Ok(result);
        }
    }
    Ok(Value::Nil)
}

/// Call a function value with already-evaluated arguments.
///
/// User functions extend their captured environment with positional
/// parameter bindings; surplus or missing arguments are ignored. A `return`
/// wrapper coming out of the body is stripped here.
pub fn apply_function(callee: &Value, arguments: &[Value]) -> Result<Value> {
    match callee {
        Value::Function(func) => {
            let call_env = func.env.enclosed();
            for (parameter, argument) in func.parameters.iter().zip(arguments) {
                call_env.define(parameter.value.clone(), argument.clone());
            }
            let result = eval_block(&func.body, &call_env)?;
            match result {
                Value::Return(inner) => Ok(*inner),
                other => Ok(other),
            }
        }
        Value::Builtin(builtin) => (builtin.func)(arguments),
        other => Err(Error::NotAFunction(other.type_name())),
    }
}

fn eval_index(left: Value, index: Value) -> Result<Value> {
    match (&left, &index) {
        (Value::Array(elements), Value::Int(i)) => {
            if *i < 0 || *i >= elements.len() as i64 {
                Ok(Value::Nil)
            } else {
                Ok(elements[*i as usize].clone())
            }
        }
        (Value::Hash(pairs), Value::Str(key)) => {
            Ok(pairs.get(key.as_ref()).cloned().unwrap_or(Value::Nil))
        }
        (Value::Hash(_), other) => Err(Error::KeyNotString(other.type_name())),
        _ => Err(Error::IndexNotSupported(left.type_name())),
    }
}
