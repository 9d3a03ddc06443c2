//! PT6964 Command Protocol
//!
//! This crate defines the command set of the PT6964 LED controller / key
//! scanner and the model of its 14-byte display memory. It performs no
//! I/O; the driver crate turns these bytes into clock edges.
//!
//! # Command Overview
//!
//! Every command is a single byte: fixed opcode bits OR'd with parameters.
//! ```text
//! ┌──────────────┬────────────┬──────────────────────────────────┐
//! │ Command      │ Opcode     │ Parameter bits                   │
//! ├──────────────┼────────────┼──────────────────────────────────┤
//! │ Mode         │ 0b00000000 │ 2-bit digit/segment layout       │
//! │ Action       │ 0b01000000 │ read, fixed address, test mode   │
//! │ Display ctrl │ 0b1000x000 │ x = on, 3-bit brightness         │
//! │ Address      │ 0b11000000 │ 4-bit RAM address (0–13)         │
//! └──────────────┴────────────┴──────────────────────────────────┘
//! ```
//!
//! Command bytes travel least-significant bit first; display data inside
//! a memory write travels most-significant bit first.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod memory;

pub use command::{
    build_action_byte, build_address_byte, build_command, build_mode_byte, build_power_byte,
    Brightness, Command, DisplayMode, ValidationError, DEFAULT_BRIGHTNESS, MAX_ADDRESS,
    MAX_BRIGHTNESS, MAX_COMMAND_PAYLOAD,
};
pub use memory::{changed_runs, DisplayMemory, Run, Runs, MAX_RUNS, MEMORY_SIZE};
