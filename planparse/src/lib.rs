//! Turns planner pseudocode into a flat, step-numbered instruction list.
//!
//! ```
//! use planparse::{InstructionKind, parse_plan};
//!
//! let plan = parse_plan("latest = data[-1]").unwrap();
//! assert_eq!(plan[0].kind(), InstructionKind::DataExtraction);
//! assert_eq!(plan[0].result_index(), Some(-1));
//! ```

pub mod instruction;
pub mod parser;

pub use instruction::{Instruction, InstructionKind, InstructionRecord};
pub use parser::{ParseError, ParseErrorKind, ParseOptions, Parser};

/// A parsed pseudocode block.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Instructions in source order, steps numbered from 1.
    pub instructions: Vec<Instruction>,
}

/// Parse `source` with default options.
pub fn parse_plan(source: &str) -> Result<Vec<Instruction>, ParseError> {
    Parser::new(source.to_string(), 0)
        .parse()
        .map(|plan| plan.instructions)
}
