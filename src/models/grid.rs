//! # 结构因子网格
//!
//! |F(hkl)| 的扁平化存储，覆盖 `[Hmin, Hmax]`（三个轴均含端点），
//! 按 (h, k, l) 行优先展开，l 变化最快。
//!
//! 网格由外部填充，本模块只负责索引与边界判断。
//!
//! ## 依赖关系
//! - 被 `diffuse/evaluator.rs`, `commands/scan.rs` 使用
//! - 无外部模块依赖

use crate::error::{DiffuseError, Result};
use crate::models::linalg::Vec3;

use serde::{Deserialize, Serialize};

/// Miller 指数边界 `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HklBounds {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl HklBounds {
    /// 创建边界；任一轴 max < min，或总点数超出 usize 时报错
    pub fn new(min: [i32; 3], max: [i32; 3]) -> Result<Self> {
        for axis in 0..3 {
            if max[axis] < min[axis] {
                return Err(DiffuseError::InvalidBounds(format!(
                    "axis {}: max {} < min {}",
                    axis, max[axis], min[axis]
                )));
            }
        }
        let bounds = Self { min, max };
        if bounds.checked_len().is_none() {
            return Err(DiffuseError::InvalidBounds(format!(
                "{:?}..={:?} holds more points than fit in memory",
                min, max
            )));
        }
        Ok(bounds)
    }

    /// 以原点为中心的对称边界 `[-m, m]³`
    pub fn symmetric(m: i32) -> Result<Self> {
        Self::new([-m; 3], [m; 3])
    }

    /// 每个轴的点数 Hrange = Hmax - Hmin + 1
    pub fn range(&self) -> [usize; 3] {
        let extent = |i: usize| {
            let r = i64::from(self.max[i]) - i64::from(self.min[i]) + 1;
            usize::try_from(r).unwrap_or(0)
        };
        [extent(0), extent(1), extent(2)]
    }

    /// 总点数，溢出时为 None
    pub fn checked_len(&self) -> Option<usize> {
        let [r0, r1, r2] = self.range();
        r0.checked_mul(r1)?.checked_mul(r2)
    }

    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, hkl: [i32; 3]) -> bool {
        (0..3).all(|i| hkl[i] >= self.min[i] && hkl[i] <= self.max[i])
    }

    /// 整个模板窗口 `[h0 - dhh, h0 + dhh]` 是否都落在边界内
    ///
    /// 在 i64 中比较，h0 接近 i32 极值时不会回绕。
    pub fn contains_window(&self, h0: [i32; 3], dhh: [i32; 3]) -> bool {
        (0..3).all(|i| {
            let (h, d) = (i64::from(h0[i]), i64::from(dhh[i]));
            h + d <= i64::from(self.max[i]) && h - d >= i64::from(self.min[i])
        })
    }

    /// 扁平化索引，调用方保证 `hkl` 在边界内
    #[inline]
    pub fn linear_index(&self, hkl: [i32; 3]) -> usize {
        let [_, r1, r2] = self.range();
        let offset = |i: usize| (i64::from(hkl[i]) - i64::from(self.min[i])) as usize;
        offset(0) * r1 * r2 + offset(1) * r2 + offset(2)
    }
}

/// 结构因子幅值网格（只读）
#[derive(Debug, Clone)]
pub struct StructureFactorGrid {
    bounds: HklBounds,
    values: Vec<f64>,
}

impl StructureFactorGrid {
    /// 从已展开的幅值数组创建
    pub fn new(bounds: HklBounds, values: Vec<f64>) -> Result<Self> {
        let expected = bounds.len();
        if values.len() != expected {
            return Err(DiffuseError::GridSizeMismatch {
                expected,
                actual: values.len(),
            });
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(DiffuseError::InvalidArgument(format!(
                "structure factor magnitude at flat index {} is {}",
                pos, values[pos]
            )));
        }
        Ok(Self { bounds, values })
    }

    /// 按 (h, k, l) 逐点求值填充网格
    pub fn from_fn<F>(bounds: HklBounds, mut f: F) -> Result<Self>
    where
        F: FnMut([i32; 3]) -> f64,
    {
        let mut values = Vec::with_capacity(bounds.len());
        for h in bounds.min[0]..=bounds.max[0] {
            for k in bounds.min[1]..=bounds.max[1] {
                for l in bounds.min[2]..=bounds.max[2] {
                    values.push(f([h, k, l]));
                }
            }
        }
        Self::new(bounds, values)
    }

    pub fn bounds(&self) -> &HklBounds {
        &self.bounds
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, hkl: [i32; 3]) -> Option<f64> {
        if self.bounds.contains(hkl) {
            Some(self.values[self.bounds.linear_index(hkl)])
        } else {
            None
        }
    }

    /// 无边界检查的读取，供已确认窗口在界内的内层循环使用
    #[inline]
    pub(crate) fn get_unchecked_bounds(&self, hkl: [i32; 3]) -> f64 {
        self.values[self.bounds.linear_index(hkl)]
    }
}

/// 离 `h` 最近的整数格点，逐轴取 ceil(h - 0.5)
pub fn nearest_lattice_point(h: Vec3) -> [i32; 3] {
    [
        (h[0] - 0.5).ceil() as i32,
        (h[1] - 0.5).ceil() as i32,
        (h[2] - 0.5).ceil() as i32,
    ]
}
