/// Implementation of multi-scalar multiplication (MSM) over scalars and points.
pub mod msm;

/// Implementation of batch serialization functions for scalars and points.
pub mod serialization;
