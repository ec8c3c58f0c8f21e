//! # 漫散射模型参数
//!
//! 六个可精修参数（γ₁, γ₂, γ₃, σ₁, σ₂, σ₃）以及由它们得到的各向异性张量：
//! - G：关联长度张量，G = diag(γ)
//! - U：均方位移张量，U = diag(σ²)
//! - ∂G/∂γᵢ：第 i 个对角元为 1 的单位矩阵投影
//!
//! 也可以直接给出任意对称张量 G, U 与导数集合。
//!
//! ## 依赖关系
//! - 被 `diffuse/evaluator.rs`, `commands/scan.rs` 使用
//! - 使用 `models/linalg.rs` 的 Mat3

use crate::error::{DiffuseError, Result};
use crate::models::linalg::Mat3;

use serde::{Deserialize, Serialize};

/// 梯度分量名称，顺序与 `DiffuseContribution::gradient` 一致
pub const GRADIENT_LABELS: [&str; 6] = [
    "d_gamma1", "d_gamma2", "d_gamma3", "d_sigma1", "d_sigma2", "d_sigma3",
];

/// 可精修的物理参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffuseParams {
    /// 关联长度（Å）
    pub gamma: [f64; 3],
    /// 位移标准差（Å）
    pub sigma: [f64; 3],
}

/// 漫散射模型张量，一张图像内只读共享
#[derive(Debug, Clone)]
pub struct DiffuseModel {
    g: Mat3,
    u: Mat3,
    dg_dgamma: [Mat3; 3],
    g_inv: Mat3,
    g_det: f64,
}

impl DiffuseModel {
    /// G = diag(γ), U = diag(σ²), ∂G/∂γᵢ = eᵢeᵢᵀ
    pub fn from_params(params: &DiffuseParams) -> Result<Self> {
        if params.gamma.iter().any(|g| !g.is_finite() || *g == 0.0) {
            return Err(DiffuseError::InvalidArgument(format!(
                "gamma must be finite and non-zero, got {:?}",
                params.gamma
            )));
        }
        if params.sigma.iter().any(|s| !s.is_finite()) {
            return Err(DiffuseError::InvalidArgument(format!(
                "sigma must be finite, got {:?}",
                params.sigma
            )));
        }

        let s = params.sigma;
        let g = Mat3::diag(params.gamma);
        let u = Mat3::diag([s[0] * s[0], s[1] * s[1], s[2] * s[2]]);
        let dg_dgamma = [
            Mat3::diag([1.0, 0.0, 0.0]),
            Mat3::diag([0.0, 1.0, 0.0]),
            Mat3::diag([0.0, 0.0, 1.0]),
        ];

        Self::from_tensors(g, u, dg_dgamma)
    }

    /// 直接使用给定张量
    ///
    /// G 必须可逆；U 的对角元必须非负（σ 导数需要对其开方）。
    pub fn from_tensors(g: Mat3, u: Mat3, dg_dgamma: [Mat3; 3]) -> Result<Self> {
        let g_inv = g
            .inverse()
            .ok_or_else(|| DiffuseError::SingularMatrix(format!("anisotropic G {:?}", g.0)))?;

        for i in 0..3 {
            let uii = u.get(i, i);
            if !uii.is_finite() || uii < 0.0 {
                return Err(DiffuseError::InvalidArgument(format!(
                    "U[{i}][{i}] must be finite and non-negative, got {uii}"
                )));
            }
        }

        Ok(Self {
            g,
            u,
            dg_dgamma,
            g_inv,
            g_det: g.determinant(),
        })
    }

    pub fn g(&self) -> &Mat3 {
        &self.g
    }

    pub fn u(&self) -> &Mat3 {
        &self.u
    }

    pub fn dg_dgamma(&self) -> &[Mat3; 3] {
        &self.dg_dgamma
    }

    pub fn g_inverse(&self) -> &Mat3 {
        &self.g_inv
    }

    pub fn g_determinant(&self) -> f64 {
        self.g_det
    }
}
