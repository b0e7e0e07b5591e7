use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Option<Position>,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position: Some(position),
        }
    }

    /// Errors raised while lowering or executing have no source position;
    /// the AST does not carry spans.
    pub fn unpositioned(error_impl: ErrorImpl) -> Self {
        Error {
            internal_error: error_impl,
            position: None,
        }
    }

    pub fn get_position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(
            self.internal_error,
            ErrorImpl::UnexpectedTokenDetailed { .. }
                | ErrorImpl::ExpectedExpression { .. }
                | ErrorImpl::NumberParseError { .. }
                | ErrorImpl::DuplicateParameter { .. }
        )
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::ExpectedExpression { .. } => "ExpectedExpression",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::DuplicateParameter { .. } => "DuplicateParameter",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::UnknownOperator { .. } => "UnknownOperator",
            ErrorImpl::UnknownFunction { .. } => "UnknownFunction",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::MissingArguments { .. } => "MissingArguments",
            ErrorImpl::FunctionAlreadyDefined { .. } => "FunctionAlreadyDefined",
            ErrorImpl::IncompatibleRedeclaration { .. } => "IncompatibleRedeclaration",
            ErrorImpl::InvalidFunction { .. } => "InvalidFunction",
            ErrorImpl::Backend { .. } => "Backend",
            ErrorImpl::Execution { .. } => "Execution",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::ExpectedExpression { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, expected an expression",
                token
            )),
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, a number has at most one decimal point",
                token
            )),
            ErrorImpl::DuplicateParameter {
                parameter,
                function,
            } => ErrorTip::Suggestion(format!(
                "Parameter `{}` appears more than once in `{}`",
                parameter, function
            )),
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::UnknownOperator { operator } => ErrorTip::Suggestion(format!(
                "Operator `{}` parses but has no code generation rule",
                operator
            )),
            ErrorImpl::UnknownFunction { function } => ErrorTip::Suggestion(format!(
                "Function `{}` must be declared with `def` or `extern` before it is called",
                function
            )),
            ErrorImpl::UnexpectedArguments {
                function,
                expected,
                received,
            }
            | ErrorImpl::MissingArguments {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` expects {} arguments, received {}",
                function, expected, received
            )),
            ErrorImpl::FunctionAlreadyDefined { function } => {
                ErrorTip::Suggestion(format!("Function `{}` already has a body", function))
            }
            ErrorImpl::IncompatibleRedeclaration {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` was declared with {} parameters, redeclared with {}",
                function, expected, received
            )),
            ErrorImpl::InvalidFunction { .. }
            | ErrorImpl::Backend { .. }
            | ErrorImpl::Execution { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{} at {}:{}", self.internal_error, position.1, position.0),
            None => write!(f, "{}", self.internal_error),
        }
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    // Parsing
    #[error("unexpected token ({message}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("expected an expression, found {token:?}")]
    ExpectedExpression { token: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("duplicate parameter {parameter:?} in prototype {function:?}")]
    DuplicateParameter { parameter: String, function: String },

    // Lowering
    #[error("variable {variable:?} not declared")]
    VariableNotDeclared { variable: String },
    #[error("unknown binary operator {operator:?}")]
    UnknownOperator { operator: char },
    #[error("unknown function {function:?} referenced")]
    UnknownFunction { function: String },
    #[error("too many arguments to {function:?}: expected {expected}, received {received}")]
    UnexpectedArguments {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("missing arguments to {function:?}: expected {expected}, received {received}")]
    MissingArguments {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("function {function:?} cannot be redefined")]
    FunctionAlreadyDefined { function: String },
    #[error("function {function:?} redeclared with {received} parameters, previously {expected}")]
    IncompatibleRedeclaration {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("function {function:?} failed verification: {reason}")]
    InvalidFunction { function: String, reason: String },

    // Backend and execution
    #[error("backend error: {message}")]
    Backend { message: String },
    #[error("execution error: {message}")]
    Execution { message: String },
}
