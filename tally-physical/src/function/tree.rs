//! This module defines a tree representation of expressions

use std::fmt::{self, Debug, Display};

use crate::{aggregates::operation::AggregateOperation, datavalues::DataValue, error::Error};

use super::definitions::{
    generic::Equals,
    numeric::{
        NumericAbsolute, NumericAddition, NumericDivision, NumericMultiplication,
        NumericNegation, NumericRemainder, NumericSubtraction,
    },
    BinaryFunctionEnum, UnaryFunctionEnum,
};

/// Leaf node of a [FunctionTree]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionLeaf<ReferenceType>
where
    ReferenceType: Debug + Clone,
{
    /// Constant value
    Constant(DataValue),
    /// Referenced value supplied when evaluating the [FunctionTree]
    Reference(ReferenceType),
}

/// Call of an aggregate function as it occurs in an output expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateCall<ReferenceType>
where
    ReferenceType: Debug + Clone,
{
    /// Aggregate function that is called
    pub operation: AggregateOperation,
    /// Argument of the call, `None` for `count(*)`
    pub argument: Option<Box<FunctionTree<ReferenceType>>>,
}

/// Tree structure representing a series of function applications
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionTree<ReferenceType>
where
    ReferenceType: Debug + Clone,
{
    /// Leaf node
    Leaf(FunctionLeaf<ReferenceType>),
    /// Application of a unary function
    Unary(UnaryFunctionEnum, Box<FunctionTree<ReferenceType>>),
    /// Application of a binary function
    Binary {
        /// Binary operation
        function: BinaryFunctionEnum,
        /// First parameter to the function
        left: Box<FunctionTree<ReferenceType>>,
        /// Second parameter to the function
        right: Box<FunctionTree<ReferenceType>>,
    },
    /// Call of an aggregate function
    Aggregate(AggregateCall<ReferenceType>),
}

/// Expression whose references are column names
pub type Expression = FunctionTree<String>;

/// Expression whose references are column positions
pub type BoundExpression = FunctionTree<usize>;

impl<ReferenceType> FunctionTree<ReferenceType>
where
    ReferenceType: Debug + Clone,
{
    /// Create a leaf node with a constant.
    pub fn constant<Value: Into<DataValue>>(constant: Value) -> Self {
        Self::Leaf(FunctionLeaf::Constant(constant.into()))
    }

    /// Create a leaf node with a reference.
    pub fn reference(reference: ReferenceType) -> Self {
        Self::Leaf(FunctionLeaf::Reference(reference))
    }

    fn binary(function: BinaryFunctionEnum, left: Self, right: Self) -> Self {
        Self::Binary {
            function,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a tree node for checking whether two values are equal to each other.
    pub fn equals(left: Self, right: Self) -> Self {
        Self::binary(BinaryFunctionEnum::Equals(Equals), left, right)
    }

    /// Create a tree node representing addition between numbers.
    pub fn numeric_addition(left: Self, right: Self) -> Self {
        Self::binary(
            BinaryFunctionEnum::NumericAddition(NumericAddition),
            left,
            right,
        )
    }

    /// Create a tree node representing subtraction between numbers.
    pub fn numeric_subtraction(left: Self, right: Self) -> Self {
        Self::binary(
            BinaryFunctionEnum::NumericSubtraction(NumericSubtraction),
            left,
            right,
        )
    }

    /// Create a tree node representing multiplication between numbers.
    pub fn numeric_multiplication(left: Self, right: Self) -> Self {
        Self::binary(
            BinaryFunctionEnum::NumericMultiplication(NumericMultiplication),
            left,
            right,
        )
    }

    /// Create a tree node representing division between numbers.
    ///
    /// Division by zero evaluates to `NULL`.
    pub fn numeric_division(left: Self, right: Self) -> Self {
        Self::binary(
            BinaryFunctionEnum::NumericDivision(NumericDivision),
            left,
            right,
        )
    }

    /// Create a tree node representing the remainder of a division between numbers.
    ///
    /// The result has the sign of the dividend.
    pub fn numeric_remainder(left: Self, right: Self) -> Self {
        Self::binary(
            BinaryFunctionEnum::NumericRemainder(NumericRemainder),
            left,
            right,
        )
    }

    /// Create a tree node representing the additive inverse of a number.
    pub fn numeric_negation(sub: Self) -> Self {
        Self::Unary(
            UnaryFunctionEnum::NumericNegation(NumericNegation),
            Box::new(sub),
        )
    }

    /// Create a tree node representing the absolute value of a number.
    pub fn numeric_absolute(sub: Self) -> Self {
        Self::Unary(
            UnaryFunctionEnum::NumericAbsolute(NumericAbsolute),
            Box::new(sub),
        )
    }

    /// Create a call of the given aggregate function.
    pub fn aggregate(operation: AggregateOperation, argument: Option<Self>) -> Self {
        Self::Aggregate(AggregateCall {
            operation,
            argument: argument.map(Box::new),
        })
    }

    /// Create a `count(*)` call.
    pub fn count_star() -> Self {
        Self::aggregate(AggregateOperation::CountStar, None)
    }

    /// Create a `count(argument)` call, counting non-null values.
    pub fn count(argument: Self) -> Self {
        Self::aggregate(AggregateOperation::Count, Some(argument))
    }

    /// Create a `sum(argument)` call.
    pub fn sum(argument: Self) -> Self {
        Self::aggregate(AggregateOperation::Sum, Some(argument))
    }

    /// Create an `avg(argument)` call.
    pub fn average(argument: Self) -> Self {
        Self::aggregate(AggregateOperation::Average, Some(argument))
    }

    /// Create a `min(argument)` call.
    pub fn min(argument: Self) -> Self {
        Self::aggregate(AggregateOperation::Min, Some(argument))
    }

    /// Create a `max(argument)` call.
    pub fn max(argument: Self) -> Self {
        Self::aggregate(AggregateOperation::Max, Some(argument))
    }

    /// Create a `count(distinct argument)` call.
    pub fn count_distinct(argument: Self) -> Self {
        Self::aggregate(AggregateOperation::CountDistinct, Some(argument))
    }

    /// Return whether this tree contains an aggregate call.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            FunctionTree::Leaf(_) => false,
            FunctionTree::Unary(_, sub) => sub.contains_aggregate(),
            FunctionTree::Binary { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            FunctionTree::Aggregate(_) => true,
        }
    }

    /// Return the references occurring in this tree, from left to right.
    pub fn references(&self) -> Vec<&ReferenceType> {
        fn collect<'a, R: Debug + Clone>(tree: &'a FunctionTree<R>, result: &mut Vec<&'a R>) {
            match tree {
                FunctionTree::Leaf(FunctionLeaf::Reference(reference)) => result.push(reference),
                FunctionTree::Leaf(FunctionLeaf::Constant(_)) => {}
                FunctionTree::Unary(_, sub) => collect(sub, result),
                FunctionTree::Binary { left, right, .. } => {
                    collect(left, result);
                    collect(right, result);
                }
                FunctionTree::Aggregate(call) => {
                    if let Some(argument) = &call.argument {
                        collect(argument, result);
                    }
                }
            }
        }

        let mut result = Vec::new();
        collect(self, &mut result);
        result
    }

    /// Create a new tree with the same structure by translating every reference.
    pub fn try_map_references<NewReference, Function>(
        &self,
        function: &mut Function,
    ) -> Result<FunctionTree<NewReference>, Error>
    where
        NewReference: Debug + Clone,
        Function: FnMut(&ReferenceType) -> Result<NewReference, Error>,
    {
        Ok(match self {
            FunctionTree::Leaf(FunctionLeaf::Constant(constant)) => {
                FunctionTree::Leaf(FunctionLeaf::Constant(constant.clone()))
            }
            FunctionTree::Leaf(FunctionLeaf::Reference(reference)) => {
                FunctionTree::Leaf(FunctionLeaf::Reference(function(reference)?))
            }
            FunctionTree::Unary(unary, sub) => {
                FunctionTree::Unary(*unary, Box::new(sub.try_map_references(function)?))
            }
            FunctionTree::Binary {
                function: binary,
                left,
                right,
            } => FunctionTree::Binary {
                function: *binary,
                left: Box::new(left.try_map_references(function)?),
                right: Box::new(right.try_map_references(function)?),
            },
            FunctionTree::Aggregate(call) => FunctionTree::Aggregate(AggregateCall {
                operation: call.operation,
                argument: match &call.argument {
                    Some(argument) => Some(Box::new(argument.try_map_references(function)?)),
                    None => None,
                },
            }),
        })
    }
}

impl Expression {
    /// Create a leaf node referencing the column with the given name.
    pub fn column(name: &str) -> Self {
        Self::reference(name.to_string())
    }

    /// Resolve every column name against the given [Schema][crate::tabular::Schema].
    ///
    /// # Errors
    /// Returns [Error::UnresolvedColumn] if a column does not exist in `schema`.
    pub fn bind(&self, schema: &crate::tabular::Schema) -> Result<BoundExpression, Error> {
        self.try_map_references(&mut |name: &String| schema.resolve(name))
    }
}

impl<ReferenceType> Display for FunctionTree<ReferenceType>
where
    ReferenceType: Debug + Clone + Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionTree::Leaf(FunctionLeaf::Constant(DataValue::String(string))) => {
                write!(f, "'{string}'")
            }
            FunctionTree::Leaf(FunctionLeaf::Constant(constant)) => write!(f, "{constant}"),
            FunctionTree::Leaf(FunctionLeaf::Reference(reference)) => write!(f, "{reference}"),
            FunctionTree::Unary(function, sub) => write!(f, "{}({sub})", function.name()),
            FunctionTree::Binary {
                function,
                left,
                right,
            } => write!(f, "({left} {} {right})", function.symbol()),
            FunctionTree::Aggregate(call) => match &call.argument {
                Some(argument) => write!(f, "{}({argument})", call.operation.name()),
                None => write!(f, "{}(*)", call.operation.name()),
            },
        }
    }
}
