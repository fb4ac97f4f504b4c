//! Process-wide constants for the register model (§3, §9).
//!
//! These mirror the "global state" design note: the register-region
//! boundaries and the code-cache trim threshold are process-wide
//! constants, not per-block configuration, because the virtual
//! register encoding the [`crate::codegen`] emitter produces is only
//! meaningful relative to them.

/// Size of the region of purely-temporary, already-physical registers.
///
/// Registers below this limit need no rewriting: the emitter hands
/// them out directly from a bump counter and they map 1:1 onto the
/// physical register file.
pub const REGULAR_REGISTER_LIMIT: u32 = 65536;

/// Size of the virtual region reserved for stack-allocated identifiers.
///
/// A virtual register `v` with `REGULAR_REGISTER_LIMIT <= v <
/// REGULAR_REGISTER_LIMIT + VARIABLE_LIMIT` addresses the `v -
/// REGULAR_REGISTER_LIMIT`'th identifier slot; see
/// [`crate::codegen::rewrite`] for how these are folded into the
/// physical file after emission.
pub const VARIABLE_LIMIT: u32 = 65536;

/// Sentinel meaning "no register" (`UINT_MAX` in the original design).
/// Never rewritten by the register-rewrite pass.
pub const NO_REGISTER: u32 = u32::MAX;

/// Sentinel for an unresolved jump target, used as the placeholder
/// value until a `break`/`continue`/loop-footer fixup patches it in.
pub const UNRESOLVED_JUMP: usize = usize::MAX;

/// Default total bytecode size, across all live `CodeBlock`s, above
/// which the activation protocol's code-cache trim (§4.5 step 4)
/// kicks in.
pub const DEFAULT_CODE_CACHE_TRIM_THRESHOLD: usize = 2 * 1024 * 1024;

/// Default maximum call-stack depth before the activation protocol's
/// stack guard (§4.5 step 1) raises `RangeError`.
pub const DEFAULT_MAX_CALL_STACK_DEPTH: usize = 8192;
