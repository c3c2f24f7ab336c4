//! The CAPS runtime: values, channels, the deterministic tick scheduler,
//! and AST-to-IR lowering.

pub mod channel;
pub mod eval;
pub mod exec;
pub mod ir;
pub mod lowering;
pub mod runtime;
pub mod scheduler;
pub mod trace;
pub mod value;

pub use channel::Channel;
pub use lowering::lower_program;
pub use runtime::{ProcStatus, ProcessInstance, Runtime};
pub use scheduler::{init_runtime, run_group, RunResult, RunStatus, DEFAULT_MAX_TICKS};
pub use trace::{NullTraceSink, TextTraceSink, TraceSink};
pub use value::{ResultValue, Value};
