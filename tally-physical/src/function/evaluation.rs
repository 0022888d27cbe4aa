//! This module defines the structures for evaluating expressions on rows.

use crate::{datavalues::DataValue, error::Error};

use super::{
    definitions::{BinaryFunction, BinaryFunctionEnum, UnaryFunction, UnaryFunctionEnum},
    tree::{BoundExpression, FunctionLeaf, FunctionTree},
};

/// A value pushed onto the evaluation stack of [StackProgram]
#[derive(Debug, Clone)]
enum StackValue {
    /// A constant value on the stack
    Constant(DataValue),
    /// A reference to a value of the row the program is evaluated on
    Reference(usize),
}

/// Operation performed in a [StackProgram]
#[derive(Debug, Clone)]
enum StackOperation {
    /// Push the given value onto the stack.
    Push(StackValue),
    /// Evaluate the given unary function on the top element in the stack.
    UnaryFunction(UnaryFunctionEnum),
    /// Evaluate the given binary function on the top two elements in the stack.
    BinaryFunction(BinaryFunctionEnum),
}

/// Representation of a [BoundExpression] as a stack program
///
/// This is the read-only evaluator handed out for a bound expression.
#[derive(Debug, Clone)]
pub struct StackProgram {
    size: usize,
    instructions: Vec<StackOperation>,
}

impl StackProgram {
    /// Constructs a new [`StackProgram`] from a list of [`StackOperation`].
    /// Computes the maximal stack height needed during evaluation.
    fn new(instructions: Vec<StackOperation>) -> Self {
        let mut max_height = 0;
        let mut current_height = 0usize;

        for instruction in instructions.iter() {
            match instruction {
                StackOperation::Push(_) => current_height += 1,
                StackOperation::UnaryFunction(_) => {}
                StackOperation::BinaryFunction(_) => current_height -= 1,
            }

            max_height = std::cmp::max(current_height, max_height);
        }

        debug_assert_eq!(current_height, 1);

        Self {
            size: max_height,
            instructions,
        }
    }

    /// Construct a [StackProgram] from a [BoundExpression].
    ///
    /// # Errors
    /// Returns [Error::NestedAggregate] if the expression contains an aggregate call,
    /// since those cannot be computed from a single row.
    pub fn from_function_tree(tree: &BoundExpression) -> Result<StackProgram, Error> {
        fn build_operations(
            term: &BoundExpression,
            operations: &mut Vec<StackOperation>,
        ) -> Result<(), Error> {
            match term {
                FunctionTree::Leaf(leaf) => operations.push(StackOperation::Push(match leaf {
                    FunctionLeaf::Constant(constant) => StackValue::Constant(constant.clone()),
                    FunctionLeaf::Reference(reference) => StackValue::Reference(*reference),
                })),
                FunctionTree::Unary(function, sub) => {
                    build_operations(sub, operations)?;

                    operations.push(StackOperation::UnaryFunction(*function));
                }
                FunctionTree::Binary {
                    function,
                    left,
                    right,
                } => {
                    build_operations(left, operations)?;
                    build_operations(right, operations)?;

                    operations.push(StackOperation::BinaryFunction(*function));
                }
                FunctionTree::Aggregate(_) => {
                    return Err(Error::NestedAggregate(term.to_string()));
                }
            }

            Ok(())
        }

        let mut term_operations = Vec::new();
        build_operations(tree, &mut term_operations)?;
        Ok(Self::new(term_operations))
    }

    /// Evaluate the stack program on the given row and return the result.
    ///
    /// If some function is undefined on its inputs (e.g. `NULL` operands,
    /// division by zero or values of the wrong type), the result is [DataValue::Null].
    ///
    /// # Panics
    /// Panics if the program references a column outside of `row`.
    pub fn evaluate(&self, row: &[DataValue]) -> DataValue {
        let mut stack = Vec::<DataValue>::with_capacity(self.size);

        for instruction in self.instructions.iter() {
            match instruction {
                StackOperation::Push(stack_value) => match stack_value {
                    StackValue::Constant(value) => stack.push(value.clone()),
                    StackValue::Reference(reference) => stack.push(row[*reference].clone()),
                },
                StackOperation::UnaryFunction(function) => {
                    let input = stack
                        .pop()
                        .expect("This program is valid, so the stack cannot be empty.");

                    stack.push(function.evaluate(input).unwrap_or(DataValue::Null));
                }
                StackOperation::BinaryFunction(function) => {
                    let second_input = stack
                        .pop()
                        .expect("This program is valid, so the stack cannot be empty.");
                    let first_input = stack
                        .pop()
                        .expect("This program is valid, so the stack cannot be empty.");

                    stack.push(
                        function
                            .evaluate(first_input, second_input)
                            .unwrap_or(DataValue::Null),
                    );
                }
            }
        }

        stack
            .pop()
            .expect("The final value is on the stack, since this program is valid.")
    }

    /// Return the column index if this program only reads a single column.
    fn as_reference(&self) -> Option<usize> {
        match self.instructions.as_slice() {
            [StackOperation::Push(StackValue::Reference(reference))] => Some(*reference),
            _ => None,
        }
    }
}

/// Evaluates a list of [BoundExpression]s against a row
///
/// This is the mutable-output evaluator:
/// results are written into a caller-provided buffer that can be reused between rows.
#[derive(Debug, Clone)]
pub struct Projection {
    programs: Vec<StackProgram>,
}

impl Projection {
    /// Compile the given expressions.
    pub fn new<'a, Iter>(expressions: Iter) -> Result<Self, Error>
    where
        Iter: IntoIterator<Item = &'a BoundExpression>,
    {
        let programs = expressions
            .into_iter()
            .map(StackProgram::from_function_tree)
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self { programs })
    }

    /// Return the number of values produced per row.
    pub fn arity(&self) -> usize {
        self.programs.len()
    }

    /// Evaluate all expressions on `row` and replace the content of `output` with the results.
    pub fn evaluate_into(&self, row: &[DataValue], output: &mut Vec<DataValue>) {
        output.clear();
        output.extend(self.programs.iter().map(|program| {
            // Plain column accesses are the common case for grouping keys
            match program.as_reference() {
                Some(reference) => row[reference].clone(),
                None => program.evaluate(row),
            }
        }));
    }

    /// Evaluate all expressions on `row` and return the results.
    pub fn evaluate(&self, row: &[DataValue]) -> Vec<DataValue> {
        let mut output = Vec::with_capacity(self.programs.len());
        self.evaluate_into(row, &mut output);
        output
    }
}
