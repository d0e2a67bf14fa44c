// Concurrent drivers around the synchronous core.

pub mod matrix;
