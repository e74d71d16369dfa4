use num_traits::ToPrimitive;
use thiserror::Error;

use crate::ast::{self, BinaryOp, Literal};
use crate::builtins::Builtin;
use crate::runtime::scope::ScopeHandle;
use crate::runtime::types::Type;

pub mod typed;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("Unknown type '{name}'")]
    UnknownType { name: String },
    #[error("Variable '{name}' is not defined")]
    UndefinedVariable { name: String },
    #[error("Function '{name}/{arity}' is not defined")]
    UndefinedFunction { name: String, arity: usize },
    #[error("Cannot assign a value of type {actual} to a target of type {target}")]
    NotAssignable { target: Type, actual: Type },
    #[error("Assignment receiver must be a variable access")]
    InvalidAssignmentReceiver,
    #[error("Assignment value type {actual} does not match receiver type {target}")]
    AssignmentTypeMismatch { target: Type, actual: Type },
    #[error("Only function calls may be used as statements")]
    InvalidExpressionStatement,
    #[error("Condition must be Boolean, got {actual}")]
    NonBooleanCondition { actual: Type },
    #[error("If statement requires a non-empty then branch")]
    EmptyThenBranch,
    #[error("Switch case value type {actual} does not match condition type {expected}")]
    CaseTypeMismatch { expected: Type, actual: Type },
    #[error("Only the last switch case may omit its value")]
    DefaultCaseNotLast,
    #[error("Integer literal '{literal}' is out of range")]
    IntegerOutOfRange { literal: String },
    #[error("Decimal literal '{literal}' is out of range")]
    DecimalOutOfRange { literal: String },
    #[error("Grouped expression must be a binary expression")]
    NonBinaryGroup,
    #[error("Invalid operand types {left} and {right} for '{op}'")]
    InvalidOperands {
        op: &'static str,
        left: Type,
        right: Type,
    },
    #[error("List offset must be Integer, got {actual}")]
    NonIntegerOffset { actual: Type },
    #[error("List literals are only allowed as LIST global initializers")]
    ListOutsideGlobal,
    #[error("Return statement outside of a function")]
    ReturnOutsideFunction,
    #[error("A main/0 function does not exist")]
    MissingMain,
    #[error("Multiple main/0 functions are defined")]
    DuplicateMain,
    #[error("The main/0 function must declare an Integer return type")]
    MainNotInteger,
}

pub type AnalyzeResult<T> = Result<T, AnalyzeError>;

/// What the analyzer tracks per variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub ty: Type,
    pub mutable: bool,
}

/// What the analyzer tracks per `(name, arity)` function.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub parameter_types: Vec<Type>,
    pub return_type: Type,
}

type AnalyzerScope = ScopeHandle<Variable, Signature>;

pub fn require_assignable(target: Type, actual: Type) -> AnalyzeResult<()> {
    if target.accepts(actual) {
        Ok(())
    } else {
        Err(AnalyzeError::NotAssignable { target, actual })
    }
}

/// Single-pass semantic analysis: resolves names against a scope tree
/// seeded with the built-ins, assigns a type to every expression, and
/// produces the typed tree the checks were made against.
pub struct Analyzer {
    scope: AnalyzerScope,
    return_type: Option<Type>,
}

impl Analyzer {
    pub fn new() -> Self {
        let scope = AnalyzerScope::root();
        let print = Builtin::Print;
        scope.define_function(
            print.name(),
            print.arity(),
            Signature {
                parameter_types: vec![Type::Any],
                return_type: Type::Nil,
            },
        );
        Self {
            scope,
            return_type: None,
        }
    }

    pub fn analyze_source(mut self, source: &ast::Source) -> AnalyzeResult<typed::Source> {
        let globals = source
            .globals
            .iter()
            .map(|global| self.analyze_global(global))
            .collect::<AnalyzeResult<Vec<_>>>()?;
        let functions = source
            .functions
            .iter()
            .map(|function| self.analyze_function(function))
            .collect::<AnalyzeResult<Vec<_>>>()?;
        check_main(source)?;
        Ok(typed::Source { globals, functions })
    }

    fn analyze_global(&mut self, global: &ast::Global) -> AnalyzeResult<typed::Global> {
        let ty = resolve_type(&global.type_name)?;
        let value = match &global.value {
            // A LIST declares its element type; the initializer list takes
            // that type and every element must fit it.
            Some(ast::Expression::List(values)) => Some(self.analyze_list(values, ty)?),
            Some(expression) => {
                let value = self.analyze_expression(expression)?;
                require_assignable(ty, value.ty)?;
                Some(value)
            }
            None => None,
        };
        self.scope.define_variable(
            &global.name,
            Variable {
                ty,
                mutable: global.mutable,
            },
        );
        Ok(typed::Global {
            name: global.name.clone(),
            ty,
            mutable: global.mutable,
            value,
        })
    }

    fn analyze_function(&mut self, function: &ast::Function) -> AnalyzeResult<typed::Function> {
        let parameter_types = function
            .parameter_type_names
            .iter()
            .map(|name| resolve_type(name))
            .collect::<AnalyzeResult<Vec<_>>>()?;
        let return_type = resolve_type(&function.return_type_name)?;
        self.scope.define_function(
            &function.name,
            function.parameters.len(),
            Signature {
                parameter_types: parameter_types.clone(),
                return_type,
            },
        );

        let enclosing = self.scope.clone();
        self.scope = enclosing.child();
        for (name, ty) in function.parameters.iter().zip(&parameter_types) {
            self.scope.define_variable(
                name,
                Variable {
                    ty: *ty,
                    mutable: false,
                },
            );
        }
        let previous_return = self.return_type.replace(return_type);
        let statements = self.analyze_statements(&function.statements);
        self.scope = enclosing;
        self.return_type = previous_return;

        Ok(typed::Function {
            name: function.name.clone(),
            parameters: function.parameters.clone(),
            parameter_types,
            return_type,
            statements: statements?,
        })
    }

    fn analyze_statements(
        &mut self,
        statements: &[ast::Statement],
    ) -> AnalyzeResult<Vec<typed::Statement>> {
        statements
            .iter()
            .map(|statement| self.analyze_statement(statement))
            .collect()
    }

    /// Analyzes a block in its own child scope, restoring the enclosing
    /// scope on every path.
    fn analyze_block(
        &mut self,
        statements: &[ast::Statement],
    ) -> AnalyzeResult<Vec<typed::Statement>> {
        let enclosing = self.scope.clone();
        self.scope = enclosing.child();
        let result = self.analyze_statements(statements);
        self.scope = enclosing;
        result
    }

    fn analyze_statement(&mut self, statement: &ast::Statement) -> AnalyzeResult<typed::Statement> {
        match statement {
            ast::Statement::Expression(expression) => {
                if !matches!(expression, ast::Expression::Call { .. }) {
                    return Err(AnalyzeError::InvalidExpressionStatement);
                }
                Ok(typed::Statement::Expression(
                    self.analyze_expression(expression)?,
                ))
            }
            ast::Statement::Declaration {
                name,
                type_name,
                value,
            } => {
                // An initializer's type wins; the declared name is only
                // consulted when there is no initializer.
                let (ty, value) = match value {
                    Some(expression) => {
                        let value = self.analyze_expression(expression)?;
                        (value.ty, Some(value))
                    }
                    None => (resolve_type(type_name)?, None),
                };
                self.scope.define_variable(name, Variable { ty, mutable: true });
                Ok(typed::Statement::Declaration {
                    name: name.clone(),
                    ty,
                    value,
                })
            }
            ast::Statement::Assignment { receiver, value } => {
                if !matches!(receiver, ast::Expression::Access { .. }) {
                    return Err(AnalyzeError::InvalidAssignmentReceiver);
                }
                let receiver = self.analyze_expression(receiver)?;
                let value = self.analyze_expression(value)?;
                if value.ty != receiver.ty {
                    return Err(AnalyzeError::AssignmentTypeMismatch {
                        target: receiver.ty,
                        actual: value.ty,
                    });
                }
                Ok(typed::Statement::Assignment { receiver, value })
            }
            ast::Statement::If {
                condition,
                then_statements,
                else_statements,
            } => {
                let condition = self.analyze_condition(condition)?;
                if then_statements.is_empty() {
                    return Err(AnalyzeError::EmptyThenBranch);
                }
                let then_statements = self.analyze_block(then_statements)?;
                let else_statements = self.analyze_block(else_statements)?;
                Ok(typed::Statement::If {
                    condition,
                    then_statements,
                    else_statements,
                })
            }
            ast::Statement::Switch { condition, cases } => {
                let condition = self.analyze_expression(condition)?;
                let mut typed_cases = Vec::with_capacity(cases.len());
                for (position, case) in cases.iter().enumerate() {
                    let value = match &case.value {
                        Some(expression) => {
                            let value = self.analyze_expression(expression)?;
                            if value.ty != condition.ty {
                                return Err(AnalyzeError::CaseTypeMismatch {
                                    expected: condition.ty,
                                    actual: value.ty,
                                });
                            }
                            Some(value)
                        }
                        None => {
                            if position + 1 != cases.len() {
                                return Err(AnalyzeError::DefaultCaseNotLast);
                            }
                            None
                        }
                    };
                    let statements = self.analyze_block(&case.statements)?;
                    typed_cases.push(typed::Case { value, statements });
                }
                Ok(typed::Statement::Switch {
                    condition,
                    cases: typed_cases,
                })
            }
            ast::Statement::While {
                condition,
                statements,
            } => {
                let condition = self.analyze_condition(condition)?;
                let statements = self.analyze_block(statements)?;
                Ok(typed::Statement::While {
                    condition,
                    statements,
                })
            }
            ast::Statement::Return(value) => {
                let value = self.analyze_expression(value)?;
                let target = self
                    .return_type
                    .ok_or(AnalyzeError::ReturnOutsideFunction)?;
                require_assignable(target, value.ty)?;
                Ok(typed::Statement::Return(value))
            }
        }
    }

    fn analyze_condition(&mut self, condition: &ast::Expression) -> AnalyzeResult<typed::Expression> {
        let condition = self.analyze_expression(condition)?;
        if condition.ty != Type::Boolean {
            return Err(AnalyzeError::NonBooleanCondition {
                actual: condition.ty,
            });
        }
        Ok(condition)
    }

    fn analyze_expression(
        &mut self,
        expression: &ast::Expression,
    ) -> AnalyzeResult<typed::Expression> {
        match expression {
            ast::Expression::Literal(literal) => {
                let ty = literal_type(literal)?;
                Ok(typed::Expression {
                    kind: typed::ExpressionKind::Literal(literal.clone()),
                    ty,
                })
            }
            ast::Expression::Group(inner) => {
                if !matches!(inner.as_ref(), ast::Expression::Binary { .. }) {
                    return Err(AnalyzeError::NonBinaryGroup);
                }
                let inner = self.analyze_expression(inner)?;
                let ty = inner.ty;
                Ok(typed::Expression {
                    kind: typed::ExpressionKind::Group(Box::new(inner)),
                    ty,
                })
            }
            ast::Expression::Binary { op, left, right } => {
                let left = self.analyze_expression(left)?;
                let right = self.analyze_expression(right)?;
                let ty = binary_type(*op, left.ty, right.ty)?;
                Ok(typed::Expression {
                    kind: typed::ExpressionKind::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    ty,
                })
            }
            ast::Expression::Access { name, offset } => {
                let offset = match offset {
                    Some(offset) => {
                        let offset = self.analyze_expression(offset)?;
                        if offset.ty != Type::Integer {
                            return Err(AnalyzeError::NonIntegerOffset { actual: offset.ty });
                        }
                        Some(Box::new(offset))
                    }
                    None => None,
                };
                let variable = self
                    .scope
                    .lookup_variable(name)
                    .ok_or_else(|| AnalyzeError::UndefinedVariable { name: name.clone() })?;
                Ok(typed::Expression {
                    kind: typed::ExpressionKind::Access {
                        name: name.clone(),
                        offset,
                    },
                    ty: variable.ty,
                })
            }
            ast::Expression::Call { name, arguments } => {
                let signature = self
                    .scope
                    .lookup_function(name, arguments.len())
                    .ok_or_else(|| AnalyzeError::UndefinedFunction {
                        name: name.clone(),
                        arity: arguments.len(),
                    })?;
                let mut typed_arguments = Vec::with_capacity(arguments.len());
                for (argument, parameter_type) in arguments.iter().zip(&signature.parameter_types)
                {
                    let argument = self.analyze_expression(argument)?;
                    require_assignable(*parameter_type, argument.ty)?;
                    typed_arguments.push(argument);
                }
                Ok(typed::Expression {
                    kind: typed::ExpressionKind::Call {
                        name: name.clone(),
                        arguments: typed_arguments,
                    },
                    ty: signature.return_type,
                })
            }
            ast::Expression::List(_) => Err(AnalyzeError::ListOutsideGlobal),
        }
    }

    fn analyze_list(
        &mut self,
        values: &[ast::Expression],
        element_type: Type,
    ) -> AnalyzeResult<typed::Expression> {
        let mut elements = Vec::with_capacity(values.len());
        for value in values {
            let element = self.analyze_expression(value)?;
            require_assignable(element_type, element.ty)?;
            elements.push(element);
        }
        Ok(typed::Expression {
            kind: typed::ExpressionKind::List(elements),
            ty: element_type,
        })
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_type(name: &str) -> AnalyzeResult<Type> {
    Type::from_name(name).ok_or_else(|| AnalyzeError::UnknownType {
        name: name.to_string(),
    })
}

/// A well-formed source contains exactly one `main/0`, returning Integer.
fn check_main(source: &ast::Source) -> AnalyzeResult<()> {
    let mut mains = source
        .functions
        .iter()
        .filter(|function| function.name == "main" && function.parameters.is_empty());
    let main = mains.next().ok_or(AnalyzeError::MissingMain)?;
    if mains.next().is_some() {
        return Err(AnalyzeError::DuplicateMain);
    }
    if main.return_type_name != "Integer" {
        return Err(AnalyzeError::MainNotInteger);
    }
    Ok(())
}

fn literal_type(literal: &Literal) -> AnalyzeResult<Type> {
    match literal {
        Literal::Nil => Ok(Type::Nil),
        Literal::Boolean(_) => Ok(Type::Boolean),
        Literal::Integer(value) => {
            if value.to_i32().is_none() {
                return Err(AnalyzeError::IntegerOutOfRange {
                    literal: value.to_string(),
                });
            }
            Ok(Type::Integer)
        }
        Literal::Decimal(value) => match value.to_f64() {
            Some(converted) if converted.is_finite() => Ok(Type::Decimal),
            _ => Err(AnalyzeError::DecimalOutOfRange {
                literal: value.to_string(),
            }),
        },
        Literal::Character(_) => Ok(Type::Character),
        Literal::String(_) => Ok(Type::String),
    }
}

fn binary_type(op: BinaryOp, left: Type, right: Type) -> AnalyzeResult<Type> {
    let invalid = || AnalyzeError::InvalidOperands {
        op: op.symbol(),
        left,
        right,
    };
    match op {
        BinaryOp::And | BinaryOp::Or => {
            if left == Type::Boolean && right == Type::Boolean {
                Ok(Type::Boolean)
            } else {
                Err(invalid())
            }
        }
        BinaryOp::Less | BinaryOp::Greater | BinaryOp::Equal | BinaryOp::NotEqual => {
            if left == right && Type::Comparable.accepts(left) {
                Ok(Type::Boolean)
            } else {
                Err(invalid())
            }
        }
        BinaryOp::Add => {
            if left == Type::String || right == Type::String {
                Ok(Type::String)
            } else if left == right && matches!(left, Type::Integer | Type::Decimal) {
                Ok(left)
            } else {
                Err(invalid())
            }
        }
        BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
            if left == right && matches!(left, Type::Integer | Type::Decimal) {
                Ok(left)
            } else {
                Err(invalid())
            }
        }
        BinaryOp::Power => {
            if left == Type::Integer && right == Type::Integer {
                Ok(Type::Integer)
            } else {
                Err(invalid())
            }
        }
    }
}

pub fn analyze(source: &ast::Source) -> AnalyzeResult<typed::Source> {
    Analyzer::new().analyze_source(source)
}
