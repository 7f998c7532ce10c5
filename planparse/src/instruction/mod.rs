pub mod builder;
pub mod value;

use std::fmt;

use serde::{Deserialize, Serialize};

/// How an executor dispatches an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionKind {
    /// Invoke the host function named by `function_name`.
    #[serde(rename = "function")]
    FunctionExecution,
    /// Index into the collection variable named by `function_name`.
    #[serde(rename = "data")]
    DataExtraction,
    /// Bind the literal held in `function_name`.
    #[serde(rename = "default")]
    DefaultValue,
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstructionKind::FunctionExecution => write!(f, "FunctionExecution"),
            InstructionKind::DataExtraction => write!(f, "DataExtraction"),
            InstructionKind::DefaultValue => write!(f, "DefaultValue"),
        }
    }
}

/// What an instruction does, one variant per [`InstructionKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operation {
    /// Host function call, optionally indexing into its result.
    Call {
        function: String,
        inputs: Vec<String>,
        result_index: Option<i64>,
    },
    /// `collection[index]`
    Extract { collection: String, index: i64 },
    /// A literal value bound as-is.
    Literal { value: String },
}

/// One step of a parsed plan. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "InstructionRecord")]
pub struct Instruction {
    step: usize,
    output: Option<String>,
    operation: Operation,
}

impl Instruction {
    pub(crate) fn new(step: usize, output: Option<String>, operation: Operation) -> Self {
        Instruction {
            step,
            output,
            operation,
        }
    }

    /// 1-based position in the plan.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn kind(&self) -> InstructionKind {
        match self.operation {
            Operation::Call { .. } => InstructionKind::FunctionExecution,
            Operation::Extract { .. } => InstructionKind::DataExtraction,
            Operation::Literal { .. } => InstructionKind::DefaultValue,
        }
    }

    /// The callee, the indexed collection, or the literal, depending on [`kind`](Self::kind).
    pub fn function_name(&self) -> &str {
        match &self.operation {
            Operation::Call { function, .. } => function,
            Operation::Extract { collection, .. } => collection,
            Operation::Literal { value } => value,
        }
    }

    /// Positional arguments. Empty for extractions and literals.
    pub fn inputs(&self) -> &[String] {
        match &self.operation {
            Operation::Call { inputs, .. } => inputs,
            Operation::Extract { .. } | Operation::Literal { .. } => &[],
        }
    }

    pub fn output_name(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn result_index(&self) -> Option<i64> {
        match self.operation {
            Operation::Call { result_index, .. } => result_index,
            Operation::Extract { index, .. } => Some(index),
            Operation::Literal { .. } => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "step:     {}", self.step)?;
        writeln!(f, "function: {}", self.function_name())?;
        if self.inputs().is_empty() {
            writeln!(f, "inputs:   -")?;
        } else {
            writeln!(f, "inputs:   [{}]", self.inputs().join(", "))?;
        }
        writeln!(f, "output:   {}", self.output_name().unwrap_or("-"))?;
        match self.result_index() {
            Some(index) => writeln!(f, "index:    {}", index)?,
            None => writeln!(f, "index:    -")?,
        }
        write!(f, "kind:     {}", self.kind())
    }
}

/// Flat, owned wire form of an [`Instruction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionRecord {
    pub step: usize,
    pub kind: InstructionKind,
    pub function_name: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_index: Option<i64>,
}

impl From<&Instruction> for InstructionRecord {
    fn from(instruction: &Instruction) -> Self {
        InstructionRecord {
            step: instruction.step(),
            kind: instruction.kind(),
            function_name: instruction.function_name().to_string(),
            inputs: instruction.inputs().to_vec(),
            output_name: instruction.output_name().map(str::to_string),
            result_index: instruction.result_index(),
        }
    }
}

impl From<Instruction> for InstructionRecord {
    fn from(instruction: Instruction) -> Self {
        InstructionRecord::from(&instruction)
    }
}
