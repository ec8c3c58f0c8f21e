//! # 晶胞与取向矩阵
//!
//! 由晶胞参数构造实空间矩阵 A（行向量为 a, b, c），以及倒易空间映射 A⁻¹。
//! A⁻¹·H 给出 Miller 指数 H 对应的倒易矢量（不含 2π 因子）。
//!
//! ## 依赖关系
//! - 被 `commands/scan.rs` 使用
//! - 使用 `models/linalg.rs` 的 Mat3

use crate::error::{DiffuseError, Result};
use crate::models::linalg::Mat3;

use serde::{Deserialize, Serialize};

/// 晶格参数表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let cos_alpha = alpha.to_radians().cos();
        let cos_beta = beta.to_radians().cos();
        let cos_gamma = gamma.to_radians().cos();
        let sin_gamma = gamma.to_radians().sin();

        let a_vec = [a, 0.0, 0.0];
        let b_vec = [b * cos_gamma, b * sin_gamma, 0.0];

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).sqrt();

        Lattice {
            matrix: [a_vec, b_vec, [c1, c2, c3]],
        }
    }

    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let m = Mat3::from_rows(self.matrix);
        let (va, vb, vc) = (m.row(0), m.row(1), m.row(2));

        let a = va.norm();
        let b = vb.norm();
        let c = vc.norm();

        let alpha = (vb.dot(&vc) / (b * c)).acos().to_degrees();
        let beta = (va.dot(&vc) / (a * c)).acos().to_degrees();
        let gamma = (va.dot(&vb) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 晶胞体积
    pub fn volume(&self) -> f64 {
        Mat3::from_rows(self.matrix).determinant()
    }

    /// 实空间矩阵 A
    pub fn a_matrix(&self) -> Mat3 {
        Mat3::from_rows(self.matrix)
    }

    /// A⁻¹，列向量为倒易基矢 a*, b*, c*
    pub fn a_inverse(&self) -> Result<Mat3> {
        if self.matrix.iter().flatten().any(|v| !v.is_finite()) {
            return Err(DiffuseError::SingularMatrix(
                "cell vectors contain non-finite values".to_string(),
            ));
        }
        self.a_matrix().inverse().ok_or_else(|| {
            DiffuseError::SingularMatrix(format!("degenerate unit cell {:?}", self.matrix))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::linalg::Vec3;

    #[test]
    fn test_lattice_from_parameters_cubic() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        let (a, b, c, alpha, beta, gamma) = lattice.parameters();

        assert!((a - 5.0).abs() < 1e-6);
        assert!((b - 5.0).abs() < 1e-6);
        assert!((c - 5.0).abs() < 1e-6);
        assert!((alpha - 90.0).abs() < 1e-6);
        assert!((beta - 90.0).abs() < 1e-6);
        assert!((gamma - 90.0).abs() < 1e-6);
        assert!((lattice.volume().abs() - 125.0).abs() < 1e-6);
    }

    #[test]
    fn test_lattice_hexagonal() {
        let lattice = Lattice::from_parameters(3.0, 3.0, 5.0, 90.0, 90.0, 120.0);
        let (a, b, c, _, _, gamma) = lattice.parameters();

        assert!((a - 3.0).abs() < 0.01);
        assert!((b - 3.0).abs() < 0.01);
        assert!((c - 5.0).abs() < 0.01);
        assert!((gamma - 120.0).abs() < 0.01);
    }

    #[test]
    fn test_a_inverse_gives_reciprocal_vectors() {
        let lattice = Lattice::from_parameters(4.0, 5.0, 10.0, 90.0, 90.0, 90.0);
        let a_inv = lattice.a_inverse().unwrap();

        // 正交晶胞：|q(hkl)| = sqrt((h/a)² + (k/b)² + (l/c)²)
        let q = a_inv * Vec3::from_hkl([1, 1, 2]);
        let expected = (1.0 / 16.0 + 1.0 / 25.0 + 4.0 / 100.0_f64).sqrt();
        assert!((q.norm() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_a_inverse_monoclinic_orthogonality() {
        let lattice = Lattice::from_parameters(6.0, 7.0, 8.0, 90.0, 104.0, 90.0);
        let a = lattice.a_matrix();
        let a_inv = lattice.a_inverse().unwrap();

        // a_i · a*_j = δ_ij
        let prod = a * a_inv;
        assert!(prod.max_abs_diff(&Mat3::identity()) < 1e-12);
    }

    #[test]
    fn test_degenerate_cell_is_rejected() {
        let lattice = Lattice::from_vectors([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(matches!(
            lattice.a_inverse(),
            Err(DiffuseError::SingularMatrix(_))
        ));
    }
}
