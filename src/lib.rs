//! Ember core: bytecode generation and call runtime for a lightweight
//! ECMAScript engine.
//!
//! This crate implements the three hardest pieces of a register-based
//! JS engine: the AST-to-bytecode lowering pass and its register
//! rewrite post-pass ([`codegen`], [`bytecode`]), the function
//! activation/call protocol ([`runtime`]), and the microtask job
//! queue ([`job`]). The parser, full opcode interpreter loop, garbage
//! collector, and host embedding layer are external collaborators;
//! this crate only defines the trait surface it needs from them
//! (see [`external`]).

#![warn(rust_2018_idioms)]

pub mod ast;
pub mod bytecode;
pub mod codegen;
pub mod error;
pub mod external;
pub mod job;
pub mod persist;
pub mod runtime;

pub use error::{EngineError, ErrorKind};
