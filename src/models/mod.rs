//! # 数据模型模块
//!
//! 定义固定尺寸线性代数类型、晶胞、结构因子网格和漫散射模型参数。
//!
//! ## 依赖关系
//! - 被 `diffuse/` 和 `commands/` 使用
//! - 子模块: linalg, lattice, grid, params

pub mod grid;
pub mod lattice;
pub mod linalg;
pub mod params;

pub use grid::{nearest_lattice_point, HklBounds, StructureFactorGrid};
pub use lattice::Lattice;
pub use linalg::{Mat3, Vec3};
pub use params::{DiffuseModel, DiffuseParams, GRADIENT_LABELS};
