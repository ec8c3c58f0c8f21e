//! # 固定尺寸线性代数
//!
//! 3×3 矩阵与三维向量的值类型，覆盖漫散射计算所需的全部运算：
//! 乘法、求逆、行列式、迹。
//!
//! 矩阵按行存储，`m[i][j]` 为第 i 行第 j 列。
//!
//! ## 依赖关系
//! - 被 `models/`, `diffuse/` 使用
//! - 无外部模块依赖

use std::ops::{Add, Index, Mul, Neg, Sub};

/// 三维向量
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3(pub [f64; 3]);

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3([x, y, z])
    }

    pub const fn zeros() -> Self {
        Vec3([0.0; 3])
    }

    /// 从整数 Miller 指数构造
    pub fn from_hkl(hkl: [i32; 3]) -> Self {
        Vec3([hkl[0] as f64, hkl[1] as f64, hkl[2] as f64])
    }

    /// 点积
    #[inline]
    pub fn dot(&self, other: &Vec3) -> f64 {
        self.0[0] * other.0[0] + self.0[1] * other.0[1] + self.0[2] * other.0[2]
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn to_array(self) -> [f64; 3] {
        self.0
    }
}

impl Index<usize> for Vec3 {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3([self.0[0] + rhs.0[0], self.0[1] + rhs.0[1], self.0[2] + rhs.0[2]])
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3([self.0[0] - rhs.0[0], self.0[1] - rhs.0[1], self.0[2] - rhs.0[2]])
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3([-self.0[0], -self.0[1], -self.0[2]])
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, s: f64) -> Vec3 {
        Vec3([self.0[0] * s, self.0[1] * s, self.0[2] * s])
    }
}

/// 3×3 矩阵（行存储）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3(pub [[f64; 3]; 3]);

impl Default for Mat3 {
    fn default() -> Self {
        Mat3::zeros()
    }
}

impl Mat3 {
    pub const fn zeros() -> Self {
        Mat3([[0.0; 3]; 3])
    }

    pub const fn identity() -> Self {
        Mat3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// 按行构造
    pub const fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Mat3(rows)
    }

    /// 对角矩阵
    pub const fn diag(d: [f64; 3]) -> Self {
        Mat3([[d[0], 0.0, 0.0], [0.0, d[1], 0.0], [0.0, 0.0, d[2]]])
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[row][col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f64) {
        self.0[row][col] = val;
    }

    pub fn row(&self, i: usize) -> Vec3 {
        Vec3(self.0[i])
    }

    pub fn transpose(&self) -> Mat3 {
        let m = &self.0;
        Mat3([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    /// 行列式（按第一行展开）
    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    pub fn trace(&self) -> f64 {
        self.0[0][0] + self.0[1][1] + self.0[2][2]
    }

    /// 逆矩阵（伴随矩阵法），奇异时返回 `None`
    pub fn inverse(&self) -> Option<Mat3> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-300 {
            return None;
        }

        let m = &self.0;
        let inv_det = 1.0 / det;
        let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };

        Some(Mat3([
            [
                cof(1, 2, 1, 2) * inv_det,
                -cof(0, 2, 1, 2) * inv_det,
                cof(0, 1, 1, 2) * inv_det,
            ],
            [
                -cof(1, 2, 0, 2) * inv_det,
                cof(0, 2, 0, 2) * inv_det,
                -cof(0, 1, 0, 2) * inv_det,
            ],
            [
                cof(1, 2, 0, 1) * inv_det,
                -cof(0, 2, 0, 1) * inv_det,
                cof(0, 1, 0, 1) * inv_det,
            ],
        ]))
    }

    /// 正交性残差：max |MᵀM − I|
    pub fn orthogonality_residual(&self) -> f64 {
        let mtm = self.transpose() * *self;
        let id = Mat3::identity();
        let mut worst = 0.0_f64;
        for i in 0..3 {
            for j in 0..3 {
                worst = worst.max((mtm.0[i][j] - id.0[i][j]).abs());
            }
        }
        worst
    }

    /// 逐元素最大绝对差
    pub fn max_abs_diff(&self, other: &Mat3) -> f64 {
        let mut worst = 0.0_f64;
        for i in 0..3 {
            for j in 0..3 {
                worst = worst.max((self.0[i][j] - other.0[i][j]).abs());
            }
        }
        worst
    }
}

impl Mul for Mat3 {
    type Output = Mat3;

    fn mul(self, rhs: Mat3) -> Mat3 {
        let a = &self.0;
        let b = &rhs.0;
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Mat3(out)
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Vec3 {
        let m = &self.0;
        Vec3([
            m[0][0] * v.0[0] + m[0][1] * v.0[1] + m[0][2] * v.0[2],
            m[1][0] * v.0[0] + m[1][1] * v.0[1] + m[1][2] * v.0[2],
            m[2][0] * v.0[0] + m[2][1] * v.0[1] + m[2][2] * v.0[2],
        ])
    }
}
