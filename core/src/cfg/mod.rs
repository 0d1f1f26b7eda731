pub mod block;
pub mod graph;
pub mod lower;
pub mod op;
pub mod value;
pub mod verify;

pub use block::{BasicBlock, BlockName};
pub use graph::{ControlFlowGraph, Edge};
pub use lower::{BuildError, BuildErrorKind, BuiltinTypes, GraphBuilder, WellKnownTypes};
pub use op::{BlockOperand, Instruction, Operand};
pub use value::Constant;
pub use verify::{verify, Violation};
