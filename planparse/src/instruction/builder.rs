use crate::instruction::value::Value;
use crate::instruction::{Instruction, Operation};
use crate::parser::recognizer::Statement;

/// Host function name used for arithmetic right-hand sides.
pub const ARITHMETIC_EXPRESSION: &str = "arithmetic_expression";
pub const CREATE_LIST: &str = "create_list";
pub const CREATE_DICT: &str = "create_dict";

/// Build the instruction for a recognized statement at `step`.
pub fn build(step: usize, statement: Statement) -> Instruction {
    match statement {
        Statement::Arithmetic { target, expression } => {
            call(step, Some(target), ARITHMETIC_EXPRESSION.to_string(), vec![expression], None)
        }
        Statement::IndexedCall {
            target,
            function,
            arguments,
            index,
        } => call(step, Some(target), function, arguments, Some(index)),
        Statement::CallAssignment {
            target,
            function,
            arguments,
        } => call(step, Some(target), function, arguments, None),
        Statement::BareCall {
            function,
            arguments,
        } => call(step, None, function, arguments, None),
        Statement::ArrayAccess {
            target,
            collection,
            index,
        } => Instruction::new(step, Some(target), Operation::Extract { collection, index }),
        Statement::Assignment { target, value } => assign(step, target, value),
    }
}

fn call(
    step: usize,
    output: Option<String>,
    function: String,
    inputs: Vec<String>,
    result_index: Option<i64>,
) -> Instruction {
    Instruction::new(
        step,
        output,
        Operation::Call {
            function,
            inputs,
            result_index,
        },
    )
}

fn assign(step: usize, target: String, value: Value) -> Instruction {
    match value {
        Value::List(items) => call(step, Some(target), CREATE_LIST.to_string(), items, None),
        Value::Dict(entries) => call(step, Some(target), CREATE_DICT.to_string(), entries, None),
        Value::String(literal) | Value::Default(literal) => {
            Instruction::new(step, Some(target), Operation::Literal { value: literal })
        }
    }
}
