
mod veclike;
mod linalg;
mod operator;
mod prox;
mod solver_error;
mod pdhg;

pub use veclike::*;
pub use linalg::*;
pub use operator::*;
pub use prox::*;
pub use solver_error::*;
pub use pdhg::*;
