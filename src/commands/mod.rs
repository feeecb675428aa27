mod process;

pub use process::ProcessCmd;
