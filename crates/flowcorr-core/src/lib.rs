pub mod consts;
pub mod correlation;
pub mod error;
mod fft;
pub mod field;
pub mod flow;
pub mod frame;
pub mod io;
pub mod pipeline;
