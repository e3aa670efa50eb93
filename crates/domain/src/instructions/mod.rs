//! Cartridge editing through instruction batches

mod instruction;
mod processor;
mod sanitize;

pub use instruction::{parse_batch, EntityKind, Instruction, Operation, RawInstruction};
pub use processor::{apply_instructions, apply_raw_instructions, InstructionError};
pub use sanitize::{sanitize_trigger_ids, TriggerRename};
