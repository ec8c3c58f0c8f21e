//! # qdiffuse 核心库
//!
//! 布拉格反射附近的对称平均漫散射计算：Laue 群对称矩阵、单点强度与解析梯度、
//! 倒易空间直线扫描。
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── diffuse/   (Laue 对称性、强度计算、扫描与导出)
//!   │     ├── models/  (线性代数、晶胞、结构因子网格、模型参数)
//!   │     └── batch/   (并行执行)
//!   ├── utils/     (终端输出、进度条)
//!   └── error.rs   (错误处理)
//! ```

pub mod batch;
pub mod diffuse;
pub mod error;
pub mod models;
pub mod utils;

pub use diffuse::{
    gen_laue_mats, DiffuseContribution, DiffuseEvaluator, LaueGroup, PrincipalAxes, Stencil,
    SymmetryMatrixSet,
};
pub use error::{DiffuseError, Result};
