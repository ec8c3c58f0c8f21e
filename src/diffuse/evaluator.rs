//! # 漫散射强度计算
//!
//! 对倒易空间中的一个采样点 H，在最近格点 H0 附近的模板窗口内，
//! 对所有 Laue 等效方向求和，得到对称平均的漫散射强度增量，
//! 以及（可选）对六个模型参数的解析梯度。
//!
//! ## 模型
//! 每个窗口偏移 n、每个对称矩阵 M：
//! ```text
//! Q0    = A⁻¹·M·H0
//! x     = 4π²·Q0ᵀ·U·Q0             (各向异性 Debye-Waller 指数)
//! ΔQ    = A⁻¹·M·(H - (H0 + n))
//! V     = G·ΔQ
//! I_pt  = e^(-x) · x · 8π·det(G) / (1 + 4π²·VᵀV)²
//! ```
//! 窗口内每点乘以 `(F_n/F0)² / N_mats / N_stencil`（F0 = 0 时比值取 1）。
//!
//! ## 边界
//! 整个窗口 `[H0 - dHH, H0 + dHH]` 必须落在网格内，否则贡献为零。
//! 靠近网格边缘的采样点因此会少计漫散射。
//!
//! ## 求和顺序
//! hh, kk, ll 升序（外层），对称矩阵序号升序（内层）。浮点结果依赖该顺序。
//!
//! ## 依赖关系
//! - 被 `diffuse/scan.rs` 调用
//! - 使用 `models/` 的 Mat3, Vec3, StructureFactorGrid, DiffuseModel
//! - 使用 `diffuse/laue.rs` 的 SymmetryMatrixSet

use crate::diffuse::laue::{SymmetryMatrixSet, MAX_LAUE_MATS};
use crate::error::{DiffuseError, Result};
use crate::models::{DiffuseModel, Mat3, StructureFactorGrid, Vec3};

use std::f64::consts::PI;
use std::ops::AddAssign;

/// 模板窗口半宽 dHH
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stencil {
    pub half_width: [i32; 3],
}

impl Stencil {
    pub fn new(half_width: [i32; 3]) -> Result<Self> {
        if half_width.iter().any(|&w| w < 0) {
            return Err(DiffuseError::InvalidArgument(format!(
                "stencil half width must be non-negative, got {:?}",
                half_width
            )));
        }
        Ok(Self { half_width })
    }

    /// 只取 H0 本身
    pub fn single_point() -> Self {
        Self {
            half_width: [0, 0, 0],
        }
    }

    /// 窗口内格点数 Π(2·dHH + 1)
    pub fn num_points(&self) -> usize {
        self.half_width
            .iter()
            .map(|&w| (2 * w + 1) as usize)
            .product()
    }
}

/// 单个采样点的强度与梯度增量
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiffuseContribution {
    /// 漫散射强度增量
    pub intensity: f64,
    /// ∂/∂γ₁, γ₂, γ₃, ∂/∂σ₁, σ₂, σ₃
    pub gradient: [f64; 6],
}

impl DiffuseContribution {
    pub fn is_zero(&self) -> bool {
        self.intensity == 0.0 && self.gradient.iter().all(|&g| g == 0.0)
    }

    /// 累加到调用方持有的强度与梯度累加器
    pub fn accumulate_into(&self, intensity: &mut f64, gradient: &mut [f64; 6]) {
        *intensity += self.intensity;
        for (acc, g) in gradient.iter_mut().zip(self.gradient.iter()) {
            *acc += g;
        }
    }
}

impl AddAssign for DiffuseContribution {
    fn add_assign(&mut self, rhs: Self) {
        rhs.accumulate_into(&mut self.intensity, &mut self.gradient);
    }
}

/// 单个对称方向上只依赖 H0 的量
#[derive(Debug, Clone, Copy, Default)]
struct DebyeWallerTerm {
    q0: Vec3,
    exparg: f64,
    dwf: f64,
}

/// 漫散射计算器
///
/// 绑定一张图像（一个取向）内只读共享的输入：结构因子网格、对称矩阵集、
/// 模型张量、A⁻¹ 与模板。`evaluate` 不持有也不修改任何跨调用状态，
/// 可在多个线程间共享。
pub struct DiffuseEvaluator<'a> {
    grid: &'a StructureFactorGrid,
    model: &'a DiffuseModel,
    stencil: Stencil,
    /// A⁻¹·M，对每个对称矩阵
    a_inv_laue: Vec<Mat3>,
    /// tr(G⁻¹·∂G/∂γᵢ)
    dg_traces: [f64; 3],
}

impl<'a> DiffuseEvaluator<'a> {
    pub fn new(
        grid: &'a StructureFactorGrid,
        laue_mats: &SymmetryMatrixSet,
        model: &'a DiffuseModel,
        a_inv: Mat3,
        stencil: Stencil,
    ) -> Self {
        let a_inv_laue = laue_mats.iter().map(|m| a_inv * *m).collect();

        let g_inv = model.g_inverse();
        let dg = model.dg_dgamma();
        let dg_traces = [
            (*g_inv * dg[0]).trace(),
            (*g_inv * dg[1]).trace(),
            (*g_inv * dg[2]).trace(),
        ];

        Self {
            grid,
            model,
            stencil,
            a_inv_laue,
            dg_traces,
        }
    }

    pub fn num_laue_mats(&self) -> usize {
        self.a_inv_laue.len()
    }

    /// 计算采样点 `h_vec`（最近格点 `h0`）的漫散射贡献
    ///
    /// `refine` 为 false 时梯度全为零；强度路径与 `refine` 无关。
    pub fn evaluate(&self, h_vec: Vec3, h0: [i32; 3], refine: bool) -> DiffuseContribution {
        let mut total = DiffuseContribution::default();

        let dhh = self.stencil.half_width;
        if !self.grid.bounds().contains_window(h0, dhh) {
            return total;
        }

        let four_mpi_sq = 4.0 * PI * PI;
        let g = self.model.g();
        let u = self.model.u();
        let dg_dgamma = self.model.dg_dgamma();
        let g_det = self.model.g_determinant();

        let num_mats = self.a_inv_laue.len() as f64;
        let num_stencil_points = self.stencil.num_points() as f64;
        let h0_vec = Vec3::from_hkl(h0);
        let f_cell_0 = self.grid.get_unchecked_bounds(h0);

        let mut dw = [DebyeWallerTerm::default(); MAX_LAUE_MATS];
        for (term, a_inv_m) in dw.iter_mut().zip(self.a_inv_laue.iter()) {
            let q0 = *a_inv_m * h0_vec;
            let exparg = four_mpi_sq * q0.dot(&(*u * q0));
            *term = DebyeWallerTerm {
                q0,
                exparg,
                dwf: (-exparg).exp(),
            };
        }

        for hh in -dhh[0]..=dhh[0] {
            for kk in -dhh[1]..=dhh[1] {
                for ll in -dhh[2]..=dhh[2] {
                    let offset = [h0[0] + hh, h0[1] + kk, h0[2] + ll];
                    let f_cell_this = self.grid.get_unchecked_bounds(offset);

                    let mut scale = if f_cell_0 != 0.0 {
                        f_cell_this / f_cell_0
                    } else {
                        1.0
                    };
                    scale *= scale / num_mats / num_stencil_points;

                    let delta_h = h_vec - Vec3::from_hkl(offset);
                    let mut id_this = 0.0;
                    let mut step_this = [0.0; 6];

                    for (a_inv_m, term) in self.a_inv_laue.iter().zip(dw.iter()) {
                        let DebyeWallerTerm { q0, exparg, dwf } = *term;

                        let delta_q = *a_inv_m * delta_h;
                        let g_q = *g * delta_q;
                        let v_dot_v = g_q.dot(&g_q);

                        let mut denom = 1.0 + v_dot_v * four_mpi_sq;
                        denom *= denom;
                        let gamma_portion = 8.0 * PI * g_det / denom;

                        id_this += dwf * exparg * gamma_portion;

                        if refine {
                            for i_gam in 0..3 {
                                let dv = dg_dgamma[i_gam] * delta_q;
                                let v_dot_dv = g_q.dot(&dv);
                                let deriv = self.dg_traces[i_gam]
                                    - 4.0 * four_mpi_sq * v_dot_dv / (1.0 + four_mpi_sq * v_dot_v);
                                step_this[i_gam] += gamma_portion * deriv * dwf * exparg;
                            }

                            let mut du_dsigma = Mat3::zeros();
                            for i_sig in 0..3 {
                                du_dsigma.set(i_sig, i_sig, 2.0 * u.get(i_sig, i_sig).sqrt());
                                let dexparg = four_mpi_sq * q0.dot(&(du_dsigma * q0));
                                du_dsigma.set(i_sig, i_sig, 0.0);
                                step_this[i_sig + 3] +=
                                    gamma_portion * dwf * dexparg * (1.0 - exparg);
                            }
                        }
                    }

                    total.intensity += id_this * scale;
                    for (acc, step) in total.gradient.iter_mut().zip(step_this.iter()) {
                        *acc += step * scale;
                    }
                }
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diffuse::laue::{gen_laue_mats, LaueGroup, PrincipalAxes};
    use crate::models::{nearest_lattice_point, DiffuseParams, HklBounds};

    fn uniform_grid(m: i32, value: f64) -> StructureFactorGrid {
        StructureFactorGrid::new(HklBounds::symmetric(m).unwrap(), vec![value; (2 * m as usize + 1).pow(3)])
            .unwrap()
    }

    fn wilson_grid(m: i32, a_inv: &Mat3) -> StructureFactorGrid {
        StructureFactorGrid::from_fn(HklBounds::symmetric(m).unwrap(), |hkl| {
            let q = *a_inv * Vec3::from_hkl(hkl);
            1.0 + 5.0 * (-2.0 * q.dot(&q)).exp()
        })
        .unwrap()
    }

    fn orthorhombic_a_inv() -> Mat3 {
        Mat3::diag([1.0 / 10.0, 1.0 / 12.0, 1.0 / 15.0])
    }

    fn params() -> DiffuseParams {
        DiffuseParams {
            gamma: [3.0, 4.0, 5.0],
            sigma: [0.3, 0.4, 0.5],
        }
    }

    #[test]
    fn test_single_point_closed_form() {
        let a_inv = Mat3::from_rows([[0.11, 0.01, 0.0], [0.0, 0.09, 0.02], [0.005, 0.0, 0.07]]);
        let g = Mat3::from_rows([[4.0, 0.5, 0.0], [0.5, 3.0, 0.2], [0.0, 0.2, 5.0]]);
        let u = Mat3::from_rows([[0.2, 0.01, 0.0], [0.01, 0.15, 0.0], [0.0, 0.0, 0.3]]);
        let model = DiffuseModel::from_tensors(g, u, [Mat3::identity(); 3]).unwrap();
        let grid = uniform_grid(4, 3.0);
        let laue = gen_laue_mats(1, &Mat3::identity()).unwrap();
        let evaluator = DiffuseEvaluator::new(&grid, &laue, &model, a_inv, Stencil::single_point());

        let h_vec = Vec3::new(2.2, -1.1, 3.4);
        let h0 = [2, -1, 3];
        let result = evaluator.evaluate(h_vec, h0, false);

        let four_mpi_sq = 4.0 * PI * PI;
        let q0 = a_inv * Vec3::from_hkl(h0);
        let x = four_mpi_sq * q0.dot(&(u * q0));
        let dq = a_inv * (h_vec - Vec3::from_hkl(h0));
        let gq = g * dq;
        let denom = (1.0 + four_mpi_sq * gq.dot(&gq)).powi(2);
        let expected = (-x).exp() * x * 8.0 * PI * g.determinant() / denom;

        assert!(expected > 0.0);
        assert!(((result.intensity - expected) / expected).abs() < 1e-12);
        assert_eq!(result.gradient, [0.0; 6]);
    }

    #[test]
    fn test_window_outside_grid_is_zero() {
        let a_inv = orthorhombic_a_inv();
        let model = DiffuseModel::from_params(&params()).unwrap();
        let grid = uniform_grid(2, 1.0);
        let laue = gen_laue_mats(7, &Mat3::identity()).unwrap();
        let stencil = Stencil::new([1, 0, 1]).unwrap();
        let evaluator = DiffuseEvaluator::new(&grid, &laue, &model, a_inv, stencil);

        for h0 in [[2, 0, 0], [0, 0, -2], [-2, 1, 1], [0, 3, 0]] {
            let h_vec = Vec3::from_hkl(h0) + Vec3::new(0.1, 0.1, 0.1);
            assert!(evaluator.evaluate(h_vec, h0, true).is_zero(), "{:?}", h0);
        }

        // 窗口恰好贴边时仍然计算
        let inside = evaluator.evaluate(Vec3::new(1.1, 2.0, -0.9), [1, 2, -1], true);
        assert!(inside.intensity > 0.0);
    }

    #[test]
    fn test_far_sample_near_i32_limits_is_zero() {
        let a_inv = orthorhombic_a_inv();
        let model = DiffuseModel::from_params(&params()).unwrap();
        let grid = uniform_grid(3, 1.0);
        let laue = gen_laue_mats(5, &Mat3::identity()).unwrap();
        let stencil = Stencil::new([1, 0, 0]).unwrap();
        let evaluator = DiffuseEvaluator::new(&grid, &laue, &model, a_inv, stencil);

        // ceil(h - 0.5) 在 i32 处饱和
        let far = Vec3::new(1e12, 0.0, 0.0);
        let h0 = nearest_lattice_point(far);
        assert_eq!(h0, [i32::MAX, 0, 0]);
        assert!(evaluator.evaluate(far, h0, true).is_zero());

        let near_min = Vec3::new(-1e12, 0.0, 0.0);
        assert!(evaluator.evaluate(near_min, [i32::MIN, 0, 0], true).is_zero());
        assert!(evaluator.evaluate(far, [i32::MAX, 0, 0], false).is_zero());
    }

    #[test]
    fn test_summation_order_is_offsets_then_matrices() {
        let a_inv = orthorhombic_a_inv();
        let model = DiffuseModel::from_params(&params()).unwrap();
        let grid = wilson_grid(4, &a_inv);
        let laue = gen_laue_mats(2, &Mat3::identity()).unwrap();
        let stencil = Stencil::new([1, 0, 0]).unwrap();
        let evaluator = DiffuseEvaluator::new(&grid, &laue, &model, a_inv, stencil);

        let h_vec = Vec3::new(1.3, -0.8, 2.2);
        let h0 = [1, -1, 2];
        let got = evaluator.evaluate(h_vec, h0, false).intensity;

        let four_mpi_sq = 4.0 * PI * PI;
        let u = *model.u();
        let g = *model.g();
        let f0 = grid.get(h0).unwrap();
        let mut expected = 0.0;
        for hh in -1..=1 {
            let offset = [h0[0] + hh, h0[1], h0[2]];
            let mut scale = grid.get(offset).unwrap() / f0;
            scale *= scale / 2.0 / 3.0;

            let mut id_this = 0.0;
            for m in laue.iter() {
                let a_inv_m = a_inv * *m;
                let q0 = a_inv_m * Vec3::from_hkl(h0);
                let exparg = four_mpi_sq * q0.dot(&(u * q0));
                let dq = a_inv_m * (h_vec - Vec3::from_hkl(offset));
                let gq = g * dq;
                let mut denom = 1.0 + gq.dot(&gq) * four_mpi_sq;
                denom *= denom;
                id_this += (-exparg).exp() * exparg * (8.0 * PI * model.g_determinant() / denom);
            }
            expected += id_this * scale;
        }

        // 邻点幅值互不相同
        assert_ne!(grid.get([0, -1, 2]), grid.get([2, -1, 2]));
        assert_eq!(got.to_bits(), expected.to_bits());
    }

    #[test]
    fn test_zero_f0_forces_unit_ratio() {
        let a_inv = orthorhombic_a_inv();
        let model = DiffuseModel::from_params(&params()).unwrap();
        let laue = gen_laue_mats(5, &Mat3::identity()).unwrap();
        let stencil = Stencil::new([1, 0, 0]).unwrap();

        let bounds = HklBounds::symmetric(3).unwrap();
        let h0 = [1, 1, 1];
        // F0 = 0，邻点分别为 5 和 0
        let sparse = StructureFactorGrid::from_fn(bounds, |hkl| match hkl {
            [1, 1, 1] => 0.0,
            [2, 1, 1] => 5.0,
            _ => 0.0,
        })
        .unwrap();
        let uniform = uniform_grid(3, 1.0);

        let h_vec = Vec3::new(1.2, 0.9, 1.1);
        let a = DiffuseEvaluator::new(&sparse, &laue, &model, a_inv, stencil).evaluate(h_vec, h0, true);
        let b = DiffuseEvaluator::new(&uniform, &laue, &model, a_inv, stencil).evaluate(h_vec, h0, true);

        assert!(a.intensity > 0.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_ratio_scaling_uses_squared_magnitudes() {
        let a_inv = orthorhombic_a_inv();
        let model = DiffuseModel::from_params(&params()).unwrap();
        let laue = gen_laue_mats(1, &Mat3::identity()).unwrap();
        let stencil = Stencil::new([1, 0, 0]).unwrap();
        let bounds = HklBounds::symmetric(3).unwrap();
        let h0 = [0, 1, 1];
        let h_vec = Vec3::new(0.0, 1.0, 1.0);

        // 邻点 (±1,1,1) 的幅值为 F0 的两倍 → 权重为 4 倍
        let doubled = StructureFactorGrid::from_fn(bounds, |hkl| if hkl == h0 { 1.0 } else { 2.0 }).unwrap();
        let single = uniform_grid(3, 1.0);

        let eval_doubled = DiffuseEvaluator::new(&doubled, &laue, &model, a_inv, stencil);
        let eval_single = DiffuseEvaluator::new(&single, &laue, &model, a_inv, stencil);
        let centre_only = DiffuseEvaluator::new(&single, &laue, &model, a_inv, Stencil::single_point());

        let centre = centre_only.evaluate(h_vec, h0, false).intensity / 3.0;
        let uniform_total = eval_single.evaluate(h_vec, h0, false).intensity;
        let neighbours = uniform_total - centre;
        let expected = centre + 4.0 * neighbours;
        let got = eval_doubled.evaluate(h_vec, h0, false).intensity;
        assert!(((got - expected) / expected).abs() < 1e-12);
    }

    #[test]
    fn test_common_grid_scale_cancels() {
        let a_inv = orthorhombic_a_inv();
        let model = DiffuseModel::from_params(&params()).unwrap();
        let laue = gen_laue_mats(7, &Mat3::identity()).unwrap();
        let stencil = Stencil::new([1, 1, 1]).unwrap();
        let grid = wilson_grid(5, &a_inv);
        let scaled = StructureFactorGrid::new(
            *grid.bounds(),
            grid.values().iter().map(|v| v * 2.0).collect(),
        )
        .unwrap();

        let h_vec = Vec3::new(1.3, -2.1, 2.8);
        let h0 = [1, -2, 3];
        let a = DiffuseEvaluator::new(&grid, &laue, &model, a_inv, stencil).evaluate(h_vec, h0, true);
        let b = DiffuseEvaluator::new(&scaled, &laue, &model, a_inv, stencil).evaluate(h_vec, h0, true);
        assert_eq!(a, b);
    }

    #[test]
    fn test_refine_flag_does_not_touch_intensity() {
        let a_inv = orthorhombic_a_inv();
        let model = DiffuseModel::from_params(&params()).unwrap();
        let grid = wilson_grid(5, &a_inv);
        let stencil = Stencil::new([1, 1, 1]).unwrap();

        for num in [1, 5, 9, 14] {
            let laue = gen_laue_mats(num, &PrincipalAxes::AMinusBAPlusBC.reference_matrix()).unwrap();
            let evaluator = DiffuseEvaluator::new(&grid, &laue, &model, a_inv, stencil);
            let h_vec = Vec3::new(1.4, 2.2, -0.7);
            let h0 = [1, 2, -1];

            let plain = evaluator.evaluate(h_vec, h0, false);
            let refined = evaluator.evaluate(h_vec, h0, true);

            assert_eq!(plain.intensity.to_bits(), refined.intensity.to_bits());
            assert_eq!(plain.gradient, [0.0; 6]);
            assert!(refined.gradient.iter().any(|&g| g != 0.0));
        }
    }

    #[test]
    fn test_evaluate_is_pure() {
        let a_inv = orthorhombic_a_inv();
        let model = DiffuseModel::from_params(&params()).unwrap();
        let grid = wilson_grid(5, &a_inv);
        let laue = gen_laue_mats(12, &Mat3::identity()).unwrap();
        let evaluator = DiffuseEvaluator::new(&grid, &laue, &model, a_inv, Stencil::new([1, 1, 1]).unwrap());

        let h_vec = Vec3::new(-1.2, 0.4, 2.1);
        let first = evaluator.evaluate(h_vec, [-1, 0, 2], true);
        let second = evaluator.evaluate(h_vec, [-1, 0, 2], true);
        assert_eq!(first, second);
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let a_inv = orthorhombic_a_inv();
        let grid = wilson_grid(6, &a_inv);
        let laue = gen_laue_mats(5, &Mat3::identity()).unwrap();
        let stencil = Stencil::new([1, 1, 1]).unwrap();
        let h_vec = Vec3::new(1.2, 1.9, 3.15);
        let h0 = [1, 2, 3];

        let intensity_at = |p: &DiffuseParams| {
            let model = DiffuseModel::from_params(p).unwrap();
            DiffuseEvaluator::new(&grid, &laue, &model, a_inv, stencil)
                .evaluate(h_vec, h0, false)
                .intensity
        };

        let base = params();
        let model = DiffuseModel::from_params(&base).unwrap();
        let analytic = DiffuseEvaluator::new(&grid, &laue, &model, a_inv, stencil).evaluate(h_vec, h0, true);
        assert!(analytic.intensity > 0.0);

        let step = 1e-6;
        for slot in 0..6 {
            let mut plus = base;
            let mut minus = base;
            if slot < 3 {
                plus.gamma[slot] += step;
                minus.gamma[slot] -= step;
            } else {
                plus.sigma[slot - 3] += step;
                minus.sigma[slot - 3] -= step;
            }
            let numeric = (intensity_at(&plus) - intensity_at(&minus)) / (2.0 * step);
            let exact = analytic.gradient[slot];
            let tol = 1e-6 * (exact.abs() + analytic.intensity);
            assert!(
                (numeric - exact).abs() < tol,
                "slot {}: analytic {} vs numeric {}",
                slot,
                exact,
                numeric
            );
        }
    }

    #[test]
    fn test_contribution_accumulates() {
        let mut intensity = 1.0;
        let mut grad = [1.0; 6];
        let c = DiffuseContribution {
            intensity: 0.5,
            gradient: [0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        };
        c.accumulate_into(&mut intensity, &mut grad);
        assert_eq!(intensity, 1.5);
        assert_eq!(grad, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let mut total = DiffuseContribution::default();
        total += c;
        total += c;
        assert_eq!(total.intensity, 1.0);
        assert_eq!(total.gradient[5], 10.0);
    }

    #[test]
    fn test_stencil_validation() {
        assert!(Stencil::new([0, -1, 0]).is_err());
        assert_eq!(Stencil::new([1, 2, 0]).unwrap().num_points(), 15);
        assert_eq!(Stencil::single_point().num_points(), 1);
    }

    #[test]
    fn test_all_groups_give_finite_results() {
        let a_inv = orthorhombic_a_inv();
        let model = DiffuseModel::from_params(&params()).unwrap();
        let grid = wilson_grid(4, &a_inv);
        let stencil = Stencil::new([1, 1, 1]).unwrap();
        for &group in LaueGroup::all() {
            let laue = gen_laue_mats(group.number(), &Mat3::identity()).unwrap();
            let evaluator = DiffuseEvaluator::new(&grid, &laue, &model, a_inv, stencil);
            assert_eq!(evaluator.num_laue_mats(), group.num_mats());
            let c = evaluator.evaluate(Vec3::new(0.8, -1.3, 2.2), [1, -1, 2], true);
            assert!(c.intensity.is_finite() && c.intensity > 0.0, "{}", group);
            assert!(c.gradient.iter().all(|g| g.is_finite()), "{}", group);
        }
    }
}
