use std::rc::Rc;

use bigdecimal::RoundingMode;
use num_bigint::BigInt;
use num_traits::{Pow, ToPrimitive, Zero};

use crate::ast::{self, BinaryOp};
use crate::builtins::Builtin;
use crate::runtime::scope::ScopeHandle;
use crate::runtime::value::Value;

use super::error::RuntimeError;

/// Control-flow marker for statement execution. `Return` propagates
/// through nested constructs until the enclosing call consumes it.
pub(super) enum ExecResult {
    Continue,
    Return(Value),
}

#[derive(Debug, Clone)]
pub(super) struct Variable {
    pub(super) mutable: bool,
    pub(super) value: Value,
}

/// A callable bound in scope: a built-in, or a declared function closed
/// over its defining scope.
#[derive(Clone)]
pub(super) enum Function {
    Builtin(Builtin),
    Declared {
        declaration: Rc<ast::Function>,
        scope: EvalScope,
    },
}

pub(super) type EvalScope = ScopeHandle<Variable, Function>;

/// Tree-walking evaluator. The scope handle is the implicit call stack:
/// block entry swaps in a child scope and every exit path swaps the
/// enclosing scope back.
pub(super) struct Evaluator {
    scope: EvalScope,
    pub(super) output: Vec<String>,
}

type EvalResult<T> = Result<T, RuntimeError>;

impl Evaluator {
    pub(super) fn new() -> Self {
        let scope = EvalScope::root();
        let print = Builtin::Print;
        scope.define_function(print.name(), print.arity(), Function::Builtin(print));
        Self {
            scope,
            output: Vec::new(),
        }
    }

    /// Defines globals, then functions, then invokes `main/0`.
    pub(super) fn eval_source(&mut self, source: &ast::Source) -> EvalResult<Value> {
        for global in &source.globals {
            self.eval_global(global)?;
        }
        for function in &source.functions {
            self.scope.define_function(
                &function.name,
                function.parameters.len(),
                Function::Declared {
                    declaration: Rc::new(function.clone()),
                    scope: self.scope.clone(),
                },
            );
        }
        let main = self
            .scope
            .lookup_function("main", 0)
            .ok_or_else(|| RuntimeError::UndefinedFunction {
                name: "main".to_string(),
                arity: 0,
            })?;
        self.call(main, Vec::new())
    }

    fn eval_global(&mut self, global: &ast::Global) -> EvalResult<()> {
        let value = match &global.value {
            Some(expression) => self.eval_expression(expression)?,
            None => Value::Nil,
        };
        self.scope.define_variable(
            &global.name,
            Variable {
                mutable: global.mutable,
                value,
            },
        );
        Ok(())
    }

    fn call(&mut self, function: Function, arguments: Vec<Value>) -> EvalResult<Value> {
        match function {
            Function::Builtin(Builtin::Print) => {
                let rendered = arguments
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                self.output.push(rendered);
                Ok(Value::Nil)
            }
            Function::Declared { declaration, scope } => {
                let call_scope = scope.child();
                for (parameter, value) in declaration.parameters.iter().zip(arguments) {
                    call_scope.define_variable(
                        parameter,
                        Variable {
                            mutable: false,
                            value,
                        },
                    );
                }
                let caller = std::mem::replace(&mut self.scope, call_scope);
                let result = self.exec_statements(&declaration.statements);
                self.scope = caller;
                match result? {
                    ExecResult::Continue => Ok(Value::Nil),
                    ExecResult::Return(value) => Ok(value),
                }
            }
        }
    }

    fn exec_statements(&mut self, statements: &[ast::Statement]) -> EvalResult<ExecResult> {
        for statement in statements {
            match self.exec_statement(statement)? {
                ExecResult::Continue => {}
                ExecResult::Return(value) => return Ok(ExecResult::Return(value)),
            }
        }
        Ok(ExecResult::Continue)
    }

    /// Executes a block in a fresh child scope, restoring the enclosing
    /// scope on every path.
    fn exec_block(&mut self, statements: &[ast::Statement]) -> EvalResult<ExecResult> {
        let enclosing = self.scope.clone();
        self.scope = enclosing.child();
        let result = self.exec_statements(statements);
        self.scope = enclosing;
        result
    }

    fn exec_statement(&mut self, statement: &ast::Statement) -> EvalResult<ExecResult> {
        match statement {
            ast::Statement::Expression(expression) => {
                self.eval_expression(expression)?;
                Ok(ExecResult::Continue)
            }
            ast::Statement::Declaration { name, value, .. } => {
                let value = match value {
                    Some(expression) => self.eval_expression(expression)?,
                    None => Value::Nil,
                };
                self.scope.define_variable(
                    name,
                    Variable {
                        mutable: true,
                        value,
                    },
                );
                Ok(ExecResult::Continue)
            }
            ast::Statement::Assignment { receiver, value } => {
                self.exec_assignment(receiver, value)?;
                Ok(ExecResult::Continue)
            }
            ast::Statement::If {
                condition,
                then_statements,
                else_statements,
            } => {
                if self.eval_boolean(condition)? {
                    self.exec_block(then_statements)
                } else {
                    self.exec_block(else_statements)
                }
            }
            ast::Statement::Switch { condition, cases } => self.exec_switch(condition, cases),
            ast::Statement::While {
                condition,
                statements,
            } => {
                while self.eval_boolean(condition)? {
                    if let ExecResult::Return(value) = self.exec_block(statements)? {
                        return Ok(ExecResult::Return(value));
                    }
                }
                Ok(ExecResult::Continue)
            }
            ast::Statement::Return(value) => {
                Ok(ExecResult::Return(self.eval_expression(value)?))
            }
        }
    }

    fn exec_assignment(
        &mut self,
        receiver: &ast::Expression,
        value: &ast::Expression,
    ) -> EvalResult<()> {
        let ast::Expression::Access { name, offset } = receiver else {
            return Err(RuntimeError::InvalidAssignmentReceiver);
        };
        let variable = self
            .scope
            .lookup_variable(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() })?;
        if !variable.mutable {
            return Err(RuntimeError::ImmutableAssignment { name: name.clone() });
        }
        let value = self.eval_expression(value)?;
        match offset {
            Some(offset) => {
                let index = self.eval_integer(offset)?;
                let Value::List(values) = &variable.value else {
                    return Err(RuntimeError::UnexpectedType {
                        expected: "IntegerIterable",
                        received: variable.value.type_name(),
                    });
                };
                let mut values = values.borrow_mut();
                let position = list_position(&index, values.len())?;
                values[position] = value;
            }
            None => {
                self.scope
                    .with_variable_mut(name, |variable| variable.value = value);
            }
        }
        Ok(())
    }

    /// Evaluates the scrutinee, then runs the first case whose value
    /// equals it, or the default case when nothing matched.
    fn exec_switch(
        &mut self,
        condition: &ast::Expression,
        cases: &[ast::Case],
    ) -> EvalResult<ExecResult> {
        let scrutinee = self.eval_expression(condition)?;
        let mut default_case = None;
        for case in cases {
            match &case.value {
                Some(expression) => {
                    if self.eval_expression(expression)? == scrutinee {
                        return self.exec_block(&case.statements);
                    }
                }
                None => default_case = Some(case),
            }
        }
        match default_case {
            Some(case) => self.exec_block(&case.statements),
            None => Ok(ExecResult::Continue),
        }
    }

    fn eval_expression(&mut self, expression: &ast::Expression) -> EvalResult<Value> {
        match expression {
            ast::Expression::Literal(literal) => Ok(literal_value(literal)),
            ast::Expression::Group(inner) => self.eval_expression(inner),
            ast::Expression::Binary { op, left, right } => self.eval_binary(*op, left, right),
            ast::Expression::Access { name, offset } => {
                self.eval_access(name, offset.as_deref())
            }
            ast::Expression::Call { name, arguments } => {
                let function = self
                    .scope
                    .lookup_function(name, arguments.len())
                    .ok_or_else(|| RuntimeError::UndefinedFunction {
                        name: name.clone(),
                        arity: arguments.len(),
                    })?;
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.eval_expression(argument)?);
                }
                self.call(function, values)
            }
            ast::Expression::List(values) => {
                let mut elements = Vec::with_capacity(values.len());
                for value in values {
                    elements.push(self.eval_expression(value)?);
                }
                Ok(Value::list(elements))
            }
        }
    }

    fn eval_access(&mut self, name: &str, offset: Option<&ast::Expression>) -> EvalResult<Value> {
        let variable = self
            .scope
            .lookup_variable(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: name.to_string(),
            })?;
        match offset {
            Some(offset) => {
                let index = self.eval_integer(offset)?;
                let Value::List(values) = &variable.value else {
                    return Err(RuntimeError::UnexpectedType {
                        expected: "IntegerIterable",
                        received: variable.value.type_name(),
                    });
                };
                let values = values.borrow();
                let position = list_position(&index, values.len())?;
                Ok(values[position].clone())
            }
            None => Ok(variable.value),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &ast::Expression,
        right: &ast::Expression,
    ) -> EvalResult<Value> {
        match op {
            // Short-circuit: the right side is only evaluated when the
            // left side leaves the result undecided.
            BinaryOp::And => {
                if !self.eval_boolean(left)? {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(self.eval_boolean(right)?))
            }
            BinaryOp::Or => {
                if self.eval_boolean(left)? {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(self.eval_boolean(right)?))
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                let equal = left == right;
                Ok(Value::Boolean(if op == BinaryOp::Equal {
                    equal
                } else {
                    !equal
                }))
            }
            BinaryOp::Less | BinaryOp::Greater => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                compare_values(op, left, right)
            }
            BinaryOp::Add => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                add_values(left, right)
            }
            BinaryOp::Subtract | BinaryOp::Multiply => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                numeric_values(op, left, right)
            }
            BinaryOp::Divide => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                divide_values(left, right)
            }
            BinaryOp::Power => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                power_values(left, right)
            }
        }
    }

    fn eval_boolean(&mut self, expression: &ast::Expression) -> EvalResult<bool> {
        match self.eval_expression(expression)? {
            Value::Boolean(value) => Ok(value),
            other => Err(RuntimeError::UnexpectedType {
                expected: "Boolean",
                received: other.type_name(),
            }),
        }
    }

    fn eval_integer(&mut self, expression: &ast::Expression) -> EvalResult<BigInt> {
        match self.eval_expression(expression)? {
            Value::Integer(value) => Ok(value),
            other => Err(RuntimeError::UnexpectedType {
                expected: "Integer",
                received: other.type_name(),
            }),
        }
    }
}

fn literal_value(literal: &ast::Literal) -> Value {
    match literal {
        ast::Literal::Nil => Value::Nil,
        ast::Literal::Boolean(value) => Value::Boolean(*value),
        ast::Literal::Integer(value) => Value::Integer(value.clone()),
        ast::Literal::Decimal(value) => Value::Decimal(value.clone()),
        ast::Literal::Character(value) => Value::Character(*value),
        ast::Literal::String(value) => Value::String(value.clone()),
    }
}

fn list_position(index: &BigInt, len: usize) -> EvalResult<usize> {
    index
        .to_usize()
        .filter(|position| *position < len)
        .ok_or_else(|| RuntimeError::IndexOutOfBounds {
            index: index.clone(),
            len,
        })
}

fn invalid_operands(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::InvalidOperands {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

/// `<` and `>` require both sides to share one comparable concrete type.
fn compare_values(op: BinaryOp, left: Value, right: Value) -> EvalResult<Value> {
    let ordering = match (&left, &right) {
        (Value::Integer(l), Value::Integer(r)) => l.cmp(r),
        (Value::Decimal(l), Value::Decimal(r)) => l.cmp(r),
        (Value::Character(l), Value::Character(r)) => l.cmp(r),
        (Value::String(l), Value::String(r)) => l.cmp(r),
        _ => return Err(invalid_operands(op, &left, &right)),
    };
    Ok(Value::Boolean(if op == BinaryOp::Less {
        ordering.is_lt()
    } else {
        ordering.is_gt()
    }))
}

/// `+` concatenates when either side is a String, rendering the other.
fn add_values(left: Value, right: Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::String(l), r) => Ok(Value::String(format!("{l}{r}"))),
        (l, Value::String(r)) => Ok(Value::String(format!("{l}{r}"))),
        (Value::Integer(l), Value::Integer(r)) => Ok(Value::Integer(l + r)),
        (Value::Decimal(l), Value::Decimal(r)) => Ok(Value::Decimal(l + r)),
        (l, r) => Err(invalid_operands(BinaryOp::Add, &l, &r)),
    }
}

fn numeric_values(op: BinaryOp, left: Value, right: Value) -> EvalResult<Value> {
    match (op, left, right) {
        (BinaryOp::Subtract, Value::Integer(l), Value::Integer(r)) => Ok(Value::Integer(l - r)),
        (BinaryOp::Multiply, Value::Integer(l), Value::Integer(r)) => Ok(Value::Integer(l * r)),
        (BinaryOp::Subtract, Value::Decimal(l), Value::Decimal(r)) => Ok(Value::Decimal(l - r)),
        (BinaryOp::Multiply, Value::Decimal(l), Value::Decimal(r)) => Ok(Value::Decimal(l * r)),
        (op, l, r) => Err(invalid_operands(op, &l, &r)),
    }
}

/// Integer division truncates toward zero; Decimal division keeps the
/// dividend's scale and rounds half-even.
fn divide_values(left: Value, right: Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => {
            if r.is_zero() {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Integer(l / r))
        }
        (Value::Decimal(l), Value::Decimal(r)) => {
            if r.is_zero() {
                return Err(RuntimeError::DivisionByZero);
            }
            let scale = l.fractional_digit_count();
            let quotient = (l / r).with_scale_round(scale, RoundingMode::HalfEven);
            Ok(Value::Decimal(quotient))
        }
        (l, r) => Err(invalid_operands(BinaryOp::Divide, &l, &r)),
    }
}

/// The exponent must fit in a signed 32-bit integer and be non-negative.
fn power_values(left: Value, right: Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => {
            let exponent = r
                .to_i32()
                .and_then(|exponent| u32::try_from(exponent).ok())
                .ok_or_else(|| RuntimeError::ExponentOutOfRange {
                    exponent: r.clone(),
                })?;
            Ok(Value::Integer(Pow::pow(&l, exponent)))
        }
        (l, r) => Err(invalid_operands(BinaryOp::Power, &l, &r)),
    }
}
