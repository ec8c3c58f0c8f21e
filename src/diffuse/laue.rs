//! # Laue 群对称矩阵
//!
//! 为 14 个 Laue 类生成点群旋转矩阵，并右乘参考取向矩阵，
//! 使对称操作表达在样品当前取向坐标系下。
//!
//! ## 三方/六方近似
//! 群 8–12 的 60° 旋转分量使用 1/√2（cos 45°），而不是 cos 60° = 0.5 /
//! sin 60° = √3/2。下游数值与此一致，不可替换为三角学上"正确"的常数。
//! 这些矩阵因此不是正交矩阵（MᵀM − I 的最大元为 0.5）。
//!
//! ## 依赖关系
//! - 被 `diffuse/evaluator.rs`, `commands/laue.rs`, `commands/scan.rs` 使用
//! - 使用 `models/linalg.rs` 的 Mat3

use crate::error::{DiffuseError, Result};
use crate::models::linalg::Mat3;

use std::fmt;

/// 表项编码：±1/√2
const S: i8 = 2;

/// 单个对称操作（编码形式）
#[derive(Debug, Clone, Copy)]
pub struct SymOp {
    /// 坐标变换记号，如 `-y,x-y,z`
    pub label: &'static str,
    rows: [[i8; 3]; 3],
}

impl SymOp {
    const fn new(label: &'static str, rows: [[i8; 3]; 3]) -> Self {
        Self { label, rows }
    }

    /// 展开为实数矩阵
    pub fn matrix(&self) -> Mat3 {
        // 取 1.0 / √2 的运算结果，与 FRAC_1_SQRT_2 在末位不同
        let one_over_root2 = 1.0 / 2.0_f64.sqrt();
        let mut m = Mat3::zeros();
        for (i, row) in self.rows.iter().enumerate() {
            for (j, &code) in row.iter().enumerate() {
                let v = match code {
                    S => one_over_root2,
                    c if c == -S => -one_over_root2,
                    c => c as f64,
                };
                m.set(i, j, v);
            }
        }
        m
    }

    /// 是否含有 1/√2 近似分量
    pub fn is_approximate(&self) -> bool {
        self.rows.iter().flatten().any(|c| c.abs() == S)
    }
}

// ─────────────────────────────────────────────────────────────
// 对称操作表
// ─────────────────────────────────────────────────────────────

const E: SymOp = SymOp::new("x,y,z", [[1, 0, 0], [0, 1, 0], [0, 0, 1]]);

// 二次轴
const C2X: SymOp = SymOp::new("x,-y,-z", [[1, 0, 0], [0, -1, 0], [0, 0, -1]]);
const C2Y: SymOp = SymOp::new("-x,y,-z", [[-1, 0, 0], [0, 1, 0], [0, 0, -1]]);
const C2Z: SymOp = SymOp::new("-x,-y,z", [[-1, 0, 0], [0, -1, 0], [0, 0, 1]]);
const C2XY: SymOp = SymOp::new("y,x,-z", [[0, 1, 0], [1, 0, 0], [0, 0, -1]]);
const C2XMY: SymOp = SymOp::new("-y,-x,-z", [[0, -1, 0], [-1, 0, 0], [0, 0, -1]]);

// 四次轴
const C4Z: SymOp = SymOp::new("-y,x,z", [[0, -1, 0], [1, 0, 0], [0, 0, 1]]);
const C4Z3: SymOp = SymOp::new("y,-x,z", [[0, 1, 0], [-1, 0, 0], [0, 0, 1]]);
const C4X: SymOp = SymOp::new("x,-z,y", [[1, 0, 0], [0, 0, -1], [0, 1, 0]]);
const C4X3: SymOp = SymOp::new("x,z,-y", [[1, 0, 0], [0, 0, 1], [0, -1, 0]]);
const C4Y: SymOp = SymOp::new("z,y,-x", [[0, 0, 1], [0, 1, 0], [-1, 0, 0]]);
const C4Y3: SymOp = SymOp::new("-z,y,x", [[0, 0, -1], [0, 1, 0], [1, 0, 0]]);

// 面对角线二次轴
const C2XZ: SymOp = SymOp::new("z,-y,x", [[0, 0, 1], [0, -1, 0], [1, 0, 0]]);
const C2XMZ: SymOp = SymOp::new("-z,-y,-x", [[0, 0, -1], [0, -1, 0], [-1, 0, 0]]);
const C2YZ: SymOp = SymOp::new("-x,z,y", [[-1, 0, 0], [0, 0, 1], [0, 1, 0]]);
const C2YMZ: SymOp = SymOp::new("-x,-z,-y", [[-1, 0, 0], [0, 0, -1], [0, -1, 0]]);

// 体对角线三次轴
const C3_1: SymOp = SymOp::new("z,x,y", [[0, 0, 1], [1, 0, 0], [0, 1, 0]]);
const C3_2: SymOp = SymOp::new("y,z,x", [[0, 1, 0], [0, 0, 1], [1, 0, 0]]);
const C3_3: SymOp = SymOp::new("-y,-z,x", [[0, -1, 0], [0, 0, -1], [1, 0, 0]]);
const C3_4: SymOp = SymOp::new("z,-x,-y", [[0, 0, 1], [-1, 0, 0], [0, -1, 0]]);
const C3_5: SymOp = SymOp::new("-y,z,-x", [[0, -1, 0], [0, 0, 1], [-1, 0, 0]]);
const C3_6: SymOp = SymOp::new("-z,-x,y", [[0, 0, -1], [-1, 0, 0], [0, 1, 0]]);
const C3_7: SymOp = SymOp::new("-z,x,-y", [[0, 0, -1], [1, 0, 0], [0, -1, 0]]);
const C3_8: SymOp = SymOp::new("y,-z,-x", [[0, 1, 0], [0, 0, -1], [-1, 0, 0]]);

// 三方/六方（1/√2 近似）
const H3Z: SymOp = SymOp::new("-y,x-y,z", [[0, -1, 0], [S, -S, 0], [0, 0, 1]]);
const H3Z2: SymOp = SymOp::new("-x+y,-x,z", [[-S, S, 0], [-1, 0, 0], [0, 0, 1]]);
const H6Z: SymOp = SymOp::new("x-y,x,z", [[S, -S, 0], [1, 0, 0], [0, 0, 1]]);
const H6Z5: SymOp = SymOp::new("y,-x+y,z", [[0, 1, 0], [-S, S, 0], [0, 0, 1]]);
const H2A: SymOp = SymOp::new("x-y,-y,-z", [[S, -S, 0], [0, -1, 0], [0, 0, -1]]);
const H2B: SymOp = SymOp::new("-x,-x+y,-z", [[-1, 0, 0], [-S, S, 0], [0, 0, -1]]);
const H2C: SymOp = SymOp::new("-x+y,y,-z", [[-S, S, 0], [0, 1, 0], [0, 0, -1]]);
const H2D: SymOp = SymOp::new("x,x-y,-z", [[1, 0, 0], [S, -S, 0], [0, 0, -1]]);

// 各群的操作顺序决定求和顺序，不可重排
const OPS_P_1BAR: &[SymOp] = &[E];
const OPS_P112M: &[SymOp] = &[E, C2Z];
const OPS_P12M1: &[SymOp] = &[E, C2Y];
const OPS_P2M11: &[SymOp] = &[E, C2X];
const OPS_PMMM: &[SymOp] = &[E, C2X, C2Y, C2Z];
const OPS_P4M: &[SymOp] = &[E, C4Z, C4Z3, C2Z];
const OPS_P4MMM: &[SymOp] = &[E, C4Z, C4Z3, C2X, C2Y, C2Z, C2XY, C2XMY];
const OPS_P3BAR: &[SymOp] = &[E, H3Z, H3Z2];
const OPS_P3BARM1: &[SymOp] = &[E, H3Z, H3Z2, H2A, H2B, C2XY];
const OPS_P3BAR1M: &[SymOp] = &[E, H3Z, H3Z2, C2XMY, H2C, H2D];
const OPS_P6M: &[SymOp] = &[E, H6Z, H6Z5, H3Z, H3Z2, C2Z];
const OPS_P6MMM: &[SymOp] = &[
    E, H6Z, H6Z5, H3Z, H3Z2, H2A, H2B, C2Z, C2XY, C2XMY, H2C, H2D,
];
const OPS_PM3BAR: &[SymOp] = &[
    E, C3_1, C3_2, C3_3, C3_4, C3_5, C3_6, C3_7, C3_8, C2X, C2Y, C2Z,
];
const OPS_PM3BARM: &[SymOp] = &[
    E, C4X, C4X3, C4Y, C4Y3, C4Z, C4Z3, C3_1, C3_2, C3_3, C3_4, C3_5, C3_6, C3_7, C3_8, C2X,
    C2Y, C2Z, C2XY, C2XMY, C2XZ, C2XMZ, C2YZ, C2YMZ,
];

/// 最大对称矩阵数（m-3m）
pub const MAX_LAUE_MATS: usize = 24;

// ─────────────────────────────────────────────────────────────
// Laue 群
// ─────────────────────────────────────────────────────────────

/// 14 个 Laue 类，编号 1–14
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaueGroup {
    PMinus1,
    P112OverM,
    P12OverM1,
    P2OverM11,
    Pmmm,
    P4OverM,
    P4OverMmm,
    PMinus3,
    PMinus3M1,
    PMinus31M,
    P6OverM,
    P6OverMmm,
    PmMinus3,
    PmMinus3M,
}

impl LaueGroup {
    const ALL: [LaueGroup; 14] = [
        LaueGroup::PMinus1,
        LaueGroup::P112OverM,
        LaueGroup::P12OverM1,
        LaueGroup::P2OverM11,
        LaueGroup::Pmmm,
        LaueGroup::P4OverM,
        LaueGroup::P4OverMmm,
        LaueGroup::PMinus3,
        LaueGroup::PMinus3M1,
        LaueGroup::PMinus31M,
        LaueGroup::P6OverM,
        LaueGroup::P6OverMmm,
        LaueGroup::PmMinus3,
        LaueGroup::PmMinus3M,
    ];

    /// 按编号顺序列出全部群
    pub fn all() -> &'static [LaueGroup; 14] {
        &Self::ALL
    }

    /// 编号 1–14
    pub fn number(self) -> i32 {
        Self::ALL.iter().position(|&g| g == self).unwrap_or(0) as i32 + 1
    }

    /// Hermann–Mauguin 符号
    pub fn symbol(self) -> &'static str {
        match self {
            LaueGroup::PMinus1 => "P -1",
            LaueGroup::P112OverM => "P 1 1 2/m",
            LaueGroup::P12OverM1 => "P 1 2/m 1",
            LaueGroup::P2OverM11 => "P 2/m 1 1",
            LaueGroup::Pmmm => "P m m m",
            LaueGroup::P4OverM => "P 4/m",
            LaueGroup::P4OverMmm => "P 4/m m m",
            LaueGroup::PMinus3 => "P -3",
            LaueGroup::PMinus3M1 => "P -3 m 1",
            LaueGroup::PMinus31M => "P -3 1 m",
            LaueGroup::P6OverM => "P 6/m",
            LaueGroup::P6OverMmm => "P 6/m m m",
            LaueGroup::PmMinus3 => "P m -3",
            LaueGroup::PmMinus3M => "P m -3 m",
        }
    }

    /// 对称操作表
    pub fn operations(self) -> &'static [SymOp] {
        match self {
            LaueGroup::PMinus1 => OPS_P_1BAR,
            LaueGroup::P112OverM => OPS_P112M,
            LaueGroup::P12OverM1 => OPS_P12M1,
            LaueGroup::P2OverM11 => OPS_P2M11,
            LaueGroup::Pmmm => OPS_PMMM,
            LaueGroup::P4OverM => OPS_P4M,
            LaueGroup::P4OverMmm => OPS_P4MMM,
            LaueGroup::PMinus3 => OPS_P3BAR,
            LaueGroup::PMinus3M1 => OPS_P3BARM1,
            LaueGroup::PMinus31M => OPS_P3BAR1M,
            LaueGroup::P6OverM => OPS_P6M,
            LaueGroup::P6OverMmm => OPS_P6MMM,
            LaueGroup::PmMinus3 => OPS_PM3BAR,
            LaueGroup::PmMinus3M => OPS_PM3BARM,
        }
    }

    pub fn num_mats(self) -> usize {
        self.operations().len()
    }

    /// 三方/六方群（8–12）使用 1/√2 近似轴
    pub fn uses_approximate_hexagonal_axes(self) -> bool {
        matches!(
            self,
            LaueGroup::PMinus3
                | LaueGroup::PMinus3M1
                | LaueGroup::PMinus31M
                | LaueGroup::P6OverM
                | LaueGroup::P6OverMmm
        )
    }
}

impl TryFrom<i32> for LaueGroup {
    type Error = DiffuseError;

    fn try_from(num: i32) -> Result<Self> {
        if !(1..=14).contains(&num) {
            return Err(DiffuseError::InvalidLaueGroup(num));
        }
        Ok(Self::ALL[(num - 1) as usize])
    }
}

impl fmt::Display for LaueGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.symbol(), self.number())
    }
}

// ─────────────────────────────────────────────────────────────
// 参考取向
// ─────────────────────────────────────────────────────────────

/// 漫散射模型主轴选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrincipalAxes {
    /// (a, b, c)
    #[default]
    Abc,
    /// (a-b, a+b, c)
    AMinusBAPlusBC,
}

impl PrincipalAxes {
    /// 对应的参考矩阵
    pub fn reference_matrix(self) -> Mat3 {
        match self {
            PrincipalAxes::Abc => Mat3::identity(),
            PrincipalAxes::AMinusBAPlusBC => {
                let r = 1.0 / 2.0_f64.sqrt();
                Mat3::from_rows([[r, -r, 0.0], [r, r, 0.0], [0.0, 0.0, 1.0]])
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 对称矩阵集
// ─────────────────────────────────────────────────────────────

/// 已右乘参考矩阵的对称矩阵集合，取向改变时需重新生成
#[derive(Debug, Clone)]
pub struct SymmetryMatrixSet {
    group: LaueGroup,
    mats: Vec<Mat3>,
}

impl SymmetryMatrixSet {
    /// 生成 `group` 的全部对称矩阵，每个矩阵右乘 `reference`
    pub fn generate(group: LaueGroup, reference: &Mat3) -> Self {
        let mats = group
            .operations()
            .iter()
            .map(|op| op.matrix() * *reference)
            .collect();
        Self { group, mats }
    }

    pub fn group(&self) -> LaueGroup {
        self.group
    }

    pub fn len(&self) -> usize {
        self.mats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mats.is_empty()
    }

    pub fn matrices(&self) -> &[Mat3] {
        &self.mats
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mat3> {
        self.mats.iter()
    }
}

/// 按编号生成对称矩阵集；编号不在 1–14 时返回 `InvalidLaueGroup`
pub fn gen_laue_mats(laue_group_num: i32, reference: &Mat3) -> Result<SymmetryMatrixSet> {
    let group = LaueGroup::try_from(laue_group_num)?;
    Ok(SymmetryMatrixSet::generate(group, reference))
}
