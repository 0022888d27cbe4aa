//! This module defines functions operating on [DataValue].

pub mod generic;
pub mod numeric;

use delegate::delegate;

use crate::datavalues::DataValue;

use self::{
    generic::Equals,
    numeric::{
        NumericAbsolute, NumericAddition, NumericDivision, NumericMultiplication,
        NumericNegation, NumericRemainder, NumericSubtraction,
    },
};

/// Defines a unary function on [DataValue].
pub(crate) trait UnaryFunction {
    /// Evaluate this function on the given parameter.
    ///
    /// Returns `None` if the result of the operation is undefined.
    fn evaluate(&self, parameter: DataValue) -> Option<DataValue>;
}

/// Enum containing all implementations of [UnaryFunction]
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryFunctionEnum {
    NumericAbsolute(NumericAbsolute),
    NumericNegation(NumericNegation),
}

impl UnaryFunctionEnum {
    /// Name under which this function is printed.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NumericAbsolute(_) => "abs",
            Self::NumericNegation(_) => "-",
        }
    }
}

impl UnaryFunction for UnaryFunctionEnum {
    delegate! {
        to match self {
            Self::NumericAbsolute(function) => function,
            Self::NumericNegation(function) => function,
        } {
            fn evaluate(&self, parameter: DataValue) -> Option<DataValue>;
        }
    }
}

/// Defines a binary function on [DataValue]
pub(crate) trait BinaryFunction {
    /// Evaluate this function on the given parameters.
    ///
    /// Returns `None` if the result of the operation is undefined.
    fn evaluate(
        &self,
        parameter_first: DataValue,
        parameter_second: DataValue,
    ) -> Option<DataValue>;
}

/// Enum containing all implementations of [BinaryFunction]
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryFunctionEnum {
    Equals(Equals),
    NumericAddition(NumericAddition),
    NumericSubtraction(NumericSubtraction),
    NumericMultiplication(NumericMultiplication),
    NumericDivision(NumericDivision),
    NumericRemainder(NumericRemainder),
}

impl BinaryFunctionEnum {
    /// Infix symbol under which this function is printed.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equals(_) => "=",
            Self::NumericAddition(_) => "+",
            Self::NumericSubtraction(_) => "-",
            Self::NumericMultiplication(_) => "*",
            Self::NumericDivision(_) => "/",
            Self::NumericRemainder(_) => "%",
        }
    }
}

impl BinaryFunction for BinaryFunctionEnum {
    delegate! {
        to match self {
            Self::Equals(function) => function,
            Self::NumericAddition(function) => function,
            Self::NumericSubtraction(function) => function,
            Self::NumericMultiplication(function) => function,
            Self::NumericDivision(function) => function,
            Self::NumericRemainder(function) => function,
        } {
            fn evaluate(&self, first_parameter: DataValue, second_parameter: DataValue) -> Option<DataValue>;
        }
    }
}
