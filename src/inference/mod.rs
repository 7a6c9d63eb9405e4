pub mod format;
pub mod prompts;
mod solver;

pub use solver::MathSolver;
