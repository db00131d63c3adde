pub mod model;
pub mod resolver;

pub use model::{BodySpec, Contract, ContractResource, MethodSpec, ParameterSchema, ResponseSpec};
pub use resolver::{resolve_method, split_segments, Resolution};
